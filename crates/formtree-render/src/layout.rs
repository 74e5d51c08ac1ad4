#![forbid(unsafe_code)]

//! Layout renderers.
//!
//! A layout turns one [`FieldSpec`] into a [`Node`] subtree. The rules for
//! every element kind are provided methods of [`LayoutRenderer`]; together
//! they are the standard layout. A variant overrides the rules it changes and
//! reaches the standard ones through an explicit [`StandardLayout`] delegate:
//!
//! | Layout | Form class | Overrides |
//! |--------|------------|-----------|
//! | `default` | none | none |
//! | `horizontal` | `form-horizontal` | `input`, `button` (label/control columns) |
//! | `inline` | `form-inline` | `input`, `button` (inline fragments) |
//!
//! Children are rendered through [`render_field`], which resolves each
//! child's own layout from the [`LayoutRegistry`]; a child may use a
//! different layout than its parent.
//!
//! # Failure Modes
//!
//! | Condition | Behavior |
//! |-----------|----------|
//! | unknown type tag | `<span>` with the label, no recursion |
//! | unknown child layout | logged, `<span>` fallback for that child |
//! | leaf with children | logged, children ignored |
//! | unknown click handler | logged, button unwired |

use std::collections::BTreeMap;

use formtree_core::logging::{TARGET_BUILD, trace, warn};
use formtree_core::node::REMOTE_OPTIONS_ATTR;
use formtree_core::{
    Binding, ClickAction, ConfigError, Content, Element, FieldInfo, FieldKind, FieldSpec,
    FormState, Inherited, Node, Rendered, display_value,
};

use crate::handlers::ClickHandlers;
use crate::presenter::attach_errors;

// ---------------------------------------------------------------------------
// RenderContext
// ---------------------------------------------------------------------------

/// Everything a renderer needs besides the field: the form's state and the
/// registries names are resolved against.
pub struct RenderContext<'a> {
    pub state: &'a mut FormState,
    pub layouts: &'a LayoutRegistry,
    pub handlers: &'a ClickHandlers,
}

impl<'a> RenderContext<'a> {
    pub fn new(
        state: &'a mut FormState,
        layouts: &'a LayoutRegistry,
        handlers: &'a ClickHandlers,
    ) -> Self {
        Self {
            state,
            layouts,
            handlers,
        }
    }

    /// Label defaults to the name; an id is generated when absent.
    ///
    /// Safe to call repeatedly: the counter only advances when an id is
    /// generated, so an existing id never changes.
    pub fn fill_defaults(&mut self, field: &mut FieldSpec) {
        if field.label.is_none() {
            field.label = field.name.clone();
        }
        if field.id.is_none() {
            let count = self.state.bump_count();
            field.id = Some(format!(
                "{}-{}-{}",
                field.name_str(),
                self.state.form_id(),
                count
            ));
        }
    }

    fn binding(&self, field: &FieldSpec) -> Binding {
        Binding::new(self.state.model_name(), field.name_str())
    }
}

// ---------------------------------------------------------------------------
// LayoutStyle
// ---------------------------------------------------------------------------

/// Class names a layout applies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutStyle {
    /// Registry name.
    pub name: &'static str,
    /// Class of the form element.
    pub class_name: &'static str,
    /// Class of the wrapper around label and control.
    pub input_group_class: &'static str,
    /// Class of text-like controls.
    pub input_class: &'static str,
    /// Class of buttons.
    pub button_class: &'static str,
}

impl LayoutStyle {
    pub const STANDARD: Self = Self {
        name: "default",
        class_name: "",
        input_group_class: "form-group",
        input_class: "form-control",
        button_class: "btn btn-default",
    };

    pub const HORIZONTAL: Self = Self {
        name: "horizontal",
        class_name: "form-horizontal",
        ..Self::STANDARD
    };

    pub const INLINE: Self = Self {
        name: "inline",
        class_name: "form-inline",
        ..Self::STANDARD
    };
}

// ---------------------------------------------------------------------------
// Attribute helpers
// ---------------------------------------------------------------------------

fn base_attrs(node: &mut Node, field: &FieldSpec) {
    let pairs = [
        ("id", field.id.as_deref()),
        ("name", field.name.as_deref()),
        ("title", field.title.as_deref()),
        ("style", field.style.as_deref()),
    ];
    for (name, value) in pairs {
        if let Some(value) = value {
            node.set_attr(name, value);
        }
    }
}

fn flag_attr(node: &mut Node, name: &str, value: Option<bool>) {
    if value == Some(true) {
        node.set_attr(name, "");
    }
}

fn input_attrs(node: &mut Node, field: &FieldSpec, info: FieldInfo) {
    base_attrs(node, field);
    flag_attr(node, "disabled", field.disabled);
    if info.element == Element::Input {
        if let Some(subtype) = info.subtype {
            node.set_attr("type", subtype);
        }
    }
    if info.text_based && info.element == Element::Input {
        if let Some(value) = &field.value {
            node.set_attr("value", display_value(value));
        }
    }
    if let Some(placeholder) = &field.placeholder {
        node.set_attr("placeholder", placeholder.as_str());
    }
}

fn form_attrs(node: &mut Node, field: &FieldSpec, inherited: &Inherited) {
    base_attrs(node, field);
    let pairs = [
        ("accept-charset", field.accept_charset.as_deref()),
        ("action", field.action.as_deref()),
        ("autocomplete", field.autocomplete.as_deref()),
        ("enctype", field.enctype.as_deref()),
        ("method", field.method.as_deref()),
    ];
    for (name, value) in pairs {
        if let Some(value) = value {
            node.set_attr(name, value);
        }
    }
    flag_attr(node, "novalidate", Some(inherited.novalidate));
    if let Some(target) = &field.target {
        node.set_attr("target", target.as_str());
    }
}

/// Clamp a horizontal label span into `[2, 10]`; zero means the default.
#[must_use]
pub fn clamp_label_span(span: i64) -> i64 {
    let span = if span == 0 { 2 } else { span };
    span.clamp(2, 10)
}

// ---------------------------------------------------------------------------
// LayoutRenderer
// ---------------------------------------------------------------------------

/// Rendering rules of a layout. Provided methods are the standard rules.
pub trait LayoutRenderer {
    /// Class names of this layout.
    fn style(&self) -> &LayoutStyle;

    /// Render `field` and its subtree.
    ///
    /// The type tag selects a rule; unknown tags render the fallback without
    /// recursing. Containers render each child in declared order after the
    /// container node itself.
    fn create_element(
        &self,
        ctx: &mut RenderContext<'_>,
        field: &mut FieldSpec,
        inherited: &Inherited,
    ) -> Rendered {
        let Some(kind) = field.field_kind() else {
            warn!(target: TARGET_BUILD, kind = field.type_tag(), "unsupported field type");
            return self.not_supported(field).into();
        };
        trace!(target: TARGET_BUILD, kind = %kind, name = field.name_str(), layout = self.style().name, "render field");

        let inherited = inherited.resolve(field);
        let info = kind.info();
        let mut rendered: Rendered = match kind {
            FieldKind::Form => self.form(ctx, field, &inherited).into(),
            FieldKind::Fieldset => self.fieldset(ctx, field, &inherited).into(),
            FieldKind::Radio | FieldKind::Checklist => {
                self.choice_group(ctx, field, &inherited, kind).into()
            }
            FieldKind::Select => self.select(ctx, field, &inherited, info),
            FieldKind::Textarea => self.textarea(ctx, field, &inherited, info),
            FieldKind::Checkbox => self.checkbox(ctx, field, &inherited, info).into(),
            FieldKind::Button | FieldKind::Submit | FieldKind::Reset => {
                self.button(ctx, field, &inherited, info)
            }
            FieldKind::Hidden | FieldKind::Image => self.plain_input(ctx, field, info).into(),
            FieldKind::Legend => self.legend(field).into(),
            _ => self.input(ctx, field, &inherited, info),
        };

        if kind.is_container() {
            if let Rendered::Node(container) = &mut rendered {
                if let Some(children) = field.children.as_mut() {
                    for child in children.iter_mut() {
                        container
                            .children_mut()
                            .extend(render_field(ctx, child, &inherited));
                    }
                }
            }
        } else if !field.children().is_empty() {
            let _ = ConfigError::ChildrenOnLeaf {
                field: field.label_text().to_string(),
                kind: field.type_tag().to_string(),
            }
            .report();
        }
        rendered
    }

    /// Inert replacement for fields that cannot be rendered.
    fn not_supported(&self, field: &FieldSpec) -> Node {
        Node::new("span").with_text(field.label.clone().unwrap_or_default())
    }

    /// Form element with the form-level message list.
    fn form(&self, ctx: &mut RenderContext<'_>, field: &mut FieldSpec, inherited: &Inherited) -> Node {
        let mut form = Node::new("form")
            .with_attr("role", "form")
            .with_class(self.style().class_name);
        if let Some(model) = &field.model {
            form.set_attr("data-model", model.as_str());
        }
        form_attrs(&mut form, field, inherited);
        form.push(
            Node::new("p").with_content(Content::Messages(ctx.state.form_key().to_string())),
        );
        form
    }

    /// Fieldset with a legend when labelled.
    fn fieldset(&self, _ctx: &mut RenderContext<'_>, field: &mut FieldSpec, _inherited: &Inherited) -> Node {
        let mut fieldset = Node::new("fieldset");
        base_attrs(&mut fieldset, field);
        if let Some(label) = &field.label {
            fieldset.push(Node::new("legend").with_text(label.as_str()));
        }
        fieldset
    }

    /// Group of radio buttons or checkboxes, one per option.
    fn choice_group(
        &self,
        ctx: &mut RenderContext<'_>,
        field: &mut FieldSpec,
        inherited: &Inherited,
        kind: FieldKind,
    ) -> Node {
        ctx.fill_defaults(field);
        let (input_type, wrapper_class) = match kind {
            FieldKind::Radio => ("radio", "radio"),
            _ => ("checkbox", "checkbox"),
        };
        let mut label = Node::new("label").with_text(field.label_text());
        if !inherited.show_labels {
            label.add_class("sr-only");
        }
        let mut group = Node::new("div")
            .with_class(self.style().input_group_class)
            .with_attr("id", field.id.clone().unwrap_or_default())
            .with_child(label);
        for option in &field.options {
            let mut input = Node::new("input")
                .with_attr("type", input_type)
                .with_attr("name", field.name_str())
                .with_attr("value", option.value.as_str())
                .bound_to(ctx.binding(field));
            flag_attr(&mut input, "disabled", field.disabled);
            group.push(
                Node::new("div").with_class(wrapper_class).with_child(
                    Node::new("label")
                        .with_child(input)
                        .with_child(Node::new("span").with_text(option.display())),
                ),
            );
        }
        if let Some(value) = field.value.clone() {
            ctx.state.seed_value(field.name_str(), value);
        }
        attach_errors(ctx, field, &mut group);
        group
    }

    /// Labelled control with its error node.
    fn input(
        &self,
        ctx: &mut RenderContext<'_>,
        field: &mut FieldSpec,
        inherited: &Inherited,
        info: FieldInfo,
    ) -> Rendered {
        ctx.fill_defaults(field);
        let mut label = Node::new("label")
            .with_attr("for", field.id.clone().unwrap_or_default())
            .with_text(field.label_text());
        if !inherited.show_labels {
            label.add_class("sr-only");
            if field.placeholder.is_none() {
                field.placeholder = field.label.clone();
            }
        }

        let mut control = Node::new(info.element.tag())
            .with_class(self.style().input_class)
            .bound_to(ctx.binding(field));
        input_attrs(&mut control, field, info);
        if field.multiple == Some(true) {
            control.set_attr("multiple", "");
        }
        if let Some(value) = field.value.clone() {
            ctx.state.seed_value(field.name_str(), value);
        }

        let mut group = Node::new("div")
            .with_class(self.style().input_group_class)
            .with_child(label)
            .with_child(control);
        attach_errors(ctx, field, &mut group);
        group.into()
    }

    fn textarea(
        &self,
        ctx: &mut RenderContext<'_>,
        field: &mut FieldSpec,
        inherited: &Inherited,
        info: FieldInfo,
    ) -> Rendered {
        self.input(ctx, field, inherited, info)
    }

    /// Input rule plus one `<option>` per declared choice, in order.
    fn select(
        &self,
        ctx: &mut RenderContext<'_>,
        field: &mut FieldSpec,
        inherited: &Inherited,
        info: FieldInfo,
    ) -> Rendered {
        let mut rendered = self.input(ctx, field, inherited, info);
        let options: Vec<Node> = field
            .options
            .iter()
            .map(|opt| {
                Node::new("option")
                    .with_attr("value", opt.value.as_str())
                    .with_text(opt.display())
            })
            .collect();
        let remote = field.remote_target_name().map(str::to_string);
        if let Rendered::Node(node) = &mut rendered {
            if let Some(select) = node.find_mut(|n| n.tag() == "select") {
                select.children_mut().extend(options);
                if let Some(target) = remote {
                    select.set_attr(REMOTE_OPTIONS_ATTR, target);
                }
            }
        }
        rendered
    }

    /// Checkbox inside its own label.
    fn checkbox(
        &self,
        ctx: &mut RenderContext<'_>,
        field: &mut FieldSpec,
        _inherited: &Inherited,
        info: FieldInfo,
    ) -> Node {
        ctx.fill_defaults(field);
        let mut input = Node::new("input").bound_to(ctx.binding(field));
        input_attrs(&mut input, field, info);
        if let Some(value) = field.value.clone() {
            ctx.state.seed_value(field.name_str(), value);
        }
        let mut wrapper = Node::new("div").with_class("checkbox").with_child(
            Node::new("label")
                .with_child(input)
                .with_child(Node::new("span").with_text(field.label_text())),
        );
        attach_errors(ctx, field, &mut wrapper);
        wrapper
    }

    /// Button wired to a click action.
    fn button(
        &self,
        ctx: &mut RenderContext<'_>,
        field: &mut FieldSpec,
        _inherited: &Inherited,
        info: FieldInfo,
    ) -> Rendered {
        if field.name.is_none() {
            field.name = Some(info.element.tag().to_string());
        }
        if field.label.is_none() {
            field.label = field.name.clone();
        }
        let mut button = Node::new(info.element.tag())
            .with_class(self.style().button_class)
            .with_text(field.label_text());
        base_attrs(&mut button, field);
        flag_attr(&mut button, "disabled", field.disabled);
        if let Some(subtype) = info.subtype {
            button.set_attr("type", subtype);
        }
        self.on_click(ctx, field, &mut button);
        button.into()
    }

    /// Bind `<name>Click` to the named handler or to the default submit.
    fn on_click(&self, ctx: &mut RenderContext<'_>, field: &FieldSpec, button: &mut Node) {
        let slot = format!("{}Click", field.name_str());
        let action = match field.click.as_deref() {
            None => ClickAction::Submit,
            Some(name) if ctx.handlers.contains(name) => ClickAction::Handler(name.to_string()),
            Some(name) => {
                let _ = ConfigError::UnknownClickHandler(name.to_string()).report();
                return;
            }
        };
        ctx.state.bind_click(slot.as_str(), action);
        button.set_attr("data-click", slot);
    }

    /// Unlabelled input (`hidden`, `image`).
    fn plain_input(&self, ctx: &mut RenderContext<'_>, field: &mut FieldSpec, info: FieldInfo) -> Node {
        ctx.fill_defaults(field);
        let mut input = Node::new("input").bound_to(ctx.binding(field));
        input_attrs(&mut input, field, info);
        if let Some(value) = &field.value {
            input.set_attr("value", display_value(value));
            ctx.state.seed_value(field.name_str(), value.clone());
        }
        input
    }

    fn legend(&self, field: &FieldSpec) -> Node {
        Node::new("legend").with_text(field.label_text())
    }
}

// ---------------------------------------------------------------------------
// Layouts
// ---------------------------------------------------------------------------

/// The standard layout: every rule as provided by [`LayoutRenderer`].
#[derive(Debug, Clone)]
pub struct StandardLayout {
    style: LayoutStyle,
}

impl StandardLayout {
    #[must_use]
    pub fn new() -> Self {
        Self {
            style: LayoutStyle::STANDARD,
        }
    }
}

impl Default for StandardLayout {
    fn default() -> Self {
        Self::new()
    }
}

impl LayoutRenderer for StandardLayout {
    fn style(&self) -> &LayoutStyle {
        &self.style
    }
}

/// Bootstrap horizontal form: label and control in grid columns.
#[derive(Debug, Clone, Default)]
pub struct HorizontalLayout {
    standard: StandardLayout,
}

impl HorizontalLayout {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl LayoutRenderer for HorizontalLayout {
    fn style(&self) -> &LayoutStyle {
        &LayoutStyle::HORIZONTAL
    }

    /// Label takes `col-sm-<span>`; everything after it moves into a
    /// `col-sm-<12-span>` column.
    fn input(
        &self,
        ctx: &mut RenderContext<'_>,
        field: &mut FieldSpec,
        inherited: &Inherited,
        info: FieldInfo,
    ) -> Rendered {
        let span = clamp_label_span(inherited.label_span);
        let mut group = match self.standard.input(ctx, field, inherited, info) {
            Rendered::Node(group) => group,
            other => return other,
        };
        let mut children = std::mem::take(group.children_mut()).into_iter();
        if let Some(mut label) = children.next() {
            label.add_class(&format!("control-label col-sm-{span}"));
            group.push(label);
        }
        group.push(
            Node::new("div")
                .with_class(&format!("col-sm-{}", 12 - span))
                .with_children(children),
        );
        group.into()
    }

    /// Button inside an offset column of its own group.
    fn button(
        &self,
        ctx: &mut RenderContext<'_>,
        field: &mut FieldSpec,
        inherited: &Inherited,
        info: FieldInfo,
    ) -> Rendered {
        let span = clamp_label_span(inherited.label_span);
        let wrapper = Node::new("div")
            .with_class(&format!("col-sm-offset-{span} col-sm-{}", 12 - span))
            .with_children(self.standard.button(ctx, field, inherited, info));
        Node::new("div")
            .with_class(self.style().input_group_class)
            .with_child(wrapper)
            .into()
    }
}

/// Bootstrap inline form: screen-reader labels, controls on one line.
#[derive(Debug, Clone, Default)]
pub struct InlineLayout {
    standard: StandardLayout,
}

impl InlineLayout {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl LayoutRenderer for InlineLayout {
    fn style(&self) -> &LayoutStyle {
        &LayoutStyle::INLINE
    }

    /// Inline input fragment: the label is always screen-reader only and
    /// doubles as the placeholder.
    fn input(
        &self,
        ctx: &mut RenderContext<'_>,
        field: &mut FieldSpec,
        inherited: &Inherited,
        info: FieldInfo,
    ) -> Rendered {
        let hidden_labels = Inherited {
            show_labels: false,
            ..inherited.clone()
        };
        self.standard.input(ctx, field, &hidden_labels, info)
    }

    /// Inline button fragment: the button sits in its own group.
    fn button(
        &self,
        ctx: &mut RenderContext<'_>,
        field: &mut FieldSpec,
        inherited: &Inherited,
        info: FieldInfo,
    ) -> Rendered {
        Node::new("div")
            .with_class(self.style().input_group_class)
            .with_children(self.standard.button(ctx, field, inherited, info))
            .into()
    }
}

// ---------------------------------------------------------------------------
// LayoutRegistry
// ---------------------------------------------------------------------------

/// Layout renderers by name.
pub struct LayoutRegistry {
    layouts: BTreeMap<String, Box<dyn LayoutRenderer>>,
}

impl LayoutRegistry {
    /// An empty registry.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            layouts: BTreeMap::new(),
        }
    }

    /// The three built-in layouts.
    #[must_use]
    pub fn standard() -> Self {
        Self::empty()
            .with(StandardLayout::new())
            .with(HorizontalLayout::new())
            .with(InlineLayout::new())
    }

    /// Register a layout under its style name.
    #[must_use]
    pub fn with(mut self, layout: impl LayoutRenderer + 'static) -> Self {
        self.register(layout);
        self
    }

    pub fn register(&mut self, layout: impl LayoutRenderer + 'static) {
        self.layouts
            .insert(layout.style().name.to_string(), Box::new(layout));
    }

    pub fn get(&self, name: &str) -> Option<&dyn LayoutRenderer> {
        self.layouts.get(name).map(|layout| &**layout)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.layouts.keys().map(String::as_str)
    }
}

impl Default for LayoutRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl std::fmt::Debug for LayoutRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayoutRegistry")
            .field("layouts", &self.layouts.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Render `field` with its own layout, inheriting unset options from
/// `parent`.
///
/// An unknown layout is logged and the field renders as the fallback.
pub fn render_field(ctx: &mut RenderContext<'_>, field: &mut FieldSpec, parent: &Inherited) -> Rendered {
    let layouts = ctx.layouts;
    let name = parent.resolve(field).layout;
    match layouts.get(&name) {
        Some(layout) => layout.create_element(ctx, field, parent),
        None => {
            let _ = ConfigError::UnknownLayout(name).report();
            StandardLayout::new().not_supported(field).into()
        }
    }
}
