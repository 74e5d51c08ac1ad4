#![forbid(unsafe_code)]

//! Rendered element tree.
//!
//! A [`Node`] is an owned element: tag, ordered attributes, classes, content
//! and children. Live behaviour is declared on the node rather than executed:
//!
//! - a [`Binding`] ties a control to a data model field,
//! - a [`Condition`] decides whether the subtree is visible,
//! - [`Content::Messages`] repeats the node once per message of a group.
//!
//! [`Node::to_html`] writes the template form (bindings and conditions as
//! `data-*` attributes); [`Node::render_live`] evaluates them against a
//! [`FormState`] and writes only what a user would currently see.

use std::borrow::Cow;
use std::fmt::Write as _;

use serde_json::Value;

use crate::display_value;
use crate::state::FormState;
use crate::validation::{ConstraintKind, is_empty};

/// Elements without closing tags.
const VOID_ELEMENTS: &[&str] = &["input"];

/// Attribute naming the remote option list a `select` shows.
pub const REMOTE_OPTIONS_ATTR: &str = "data-remote-options";

// ---------------------------------------------------------------------------
// Condition, Binding, Content
// ---------------------------------------------------------------------------

/// Visibility rule evaluated against live form state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    /// The field was edited and is invalid.
    DirtyAndInvalid(String),
    /// The field's value violates one declared constraint.
    Violates {
        field: String,
        constraint: ConstraintKind,
    },
    /// The field is invalid, but not because of a declared constraint.
    InvalidOtherwise(String),
}

impl Condition {
    /// Evaluate against `state`.
    #[must_use]
    pub fn holds(&self, state: &FormState) -> bool {
        match self {
            Self::DirtyAndInvalid(field) => state.is_dirty(field) && state.is_invalid(field),
            Self::Violates { field, constraint } => state.violates(field, *constraint),
            Self::InvalidOtherwise(field) => {
                state.is_invalid(field) && state.violations(field).is_empty()
            }
        }
    }

    /// Template expression for the `data-show` attribute.
    #[must_use]
    pub fn expression(&self) -> String {
        match self {
            Self::DirtyAndInvalid(field) => format!("{field}.$dirty && {field}.$invalid"),
            Self::Violates { field, constraint } => format!("{field}.$error.{}", constraint.attr()),
            Self::InvalidOtherwise(field) => format!("{field}.$invalid && !{field}.$error"),
        }
    }
}

/// Two-way binding of a control to the data model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    /// Data model name.
    pub model: String,
    /// Field key within the model.
    pub field: String,
}

impl Binding {
    #[must_use]
    pub fn new(model: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            field: field.into(),
        }
    }

    /// `model.field` path.
    #[must_use]
    pub fn path(&self) -> String {
        format!("{}.{}", self.model, self.field)
    }
}

/// What goes between a node's tags, before its children.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Content {
    #[default]
    Empty,
    /// Literal text.
    Text(String),
    /// Repeat the node for each message of the group.
    Messages(String),
    /// The field's entry in the form error map.
    FieldError(String),
}

// ---------------------------------------------------------------------------
// Node
// ---------------------------------------------------------------------------

/// One element of a rendered form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Node {
    tag: String,
    attrs: Vec<(String, String)>,
    classes: Vec<String>,
    content: Content,
    children: Vec<Node>,
    show: Option<Condition>,
    binding: Option<Binding>,
}

impl Node {
    /// Create an empty element.
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    // --- builders -----------------------------------------------------------

    #[must_use]
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    /// Add one or more space-separated classes.
    #[must_use]
    pub fn with_class(mut self, classes: &str) -> Self {
        self.add_class(classes);
        self
    }

    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.content = Content::Text(text.into());
        self
    }

    #[must_use]
    pub fn with_content(mut self, content: Content) -> Self {
        self.content = content;
        self
    }

    #[must_use]
    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    #[must_use]
    pub fn with_children(mut self, children: impl IntoIterator<Item = Node>) -> Self {
        self.children.extend(children);
        self
    }

    #[must_use]
    pub fn shown_when(mut self, condition: Condition) -> Self {
        self.show = Some(condition);
        self
    }

    #[must_use]
    pub fn bound_to(mut self, binding: Binding) -> Self {
        self.binding = Some(binding);
        self
    }

    // --- accessors ----------------------------------------------------------

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn attrs(&self) -> &[(String, String)] {
        &self.attrs
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    pub fn content(&self) -> &Content {
        &self.content
    }

    /// Literal text content, if any.
    pub fn text(&self) -> Option<&str> {
        match &self.content {
            Content::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub fn children_mut(&mut self) -> &mut Vec<Node> {
        &mut self.children
    }

    pub fn show(&self) -> Option<&Condition> {
        self.show.as_ref()
    }

    pub fn binding(&self) -> Option<&Binding> {
        self.binding.as_ref()
    }

    // --- mutation -----------------------------------------------------------

    pub fn push(&mut self, child: Node) {
        self.children.push(child);
    }

    /// Set an attribute, replacing an existing value in place.
    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attrs.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.attrs.push((name, value)),
        }
    }

    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        let index = self.attrs.iter().position(|(n, _)| n == name)?;
        Some(self.attrs.remove(index).1)
    }

    /// Add space-separated classes, skipping duplicates.
    pub fn add_class(&mut self, classes: &str) {
        for class in classes.split_whitespace() {
            if !self.has_class(class) {
                self.classes.push(class.to_string());
            }
        }
    }

    pub fn remove_class(&mut self, class: &str) {
        self.classes.retain(|c| c != class);
    }

    /// Swap this node for `other`, returning the previous node.
    pub fn replace_with(&mut self, other: Node) -> Node {
        std::mem::replace(self, other)
    }

    // --- traversal ----------------------------------------------------------

    /// Pre-order walk over this node and all descendants.
    pub fn descendants(&self) -> Vec<&Node> {
        let mut out = Vec::new();
        self.collect(&mut out, &|_| true);
        out
    }

    /// First node (pre-order) matching `pred`.
    pub fn find(&self, pred: impl Fn(&Node) -> bool) -> Option<&Node> {
        self.find_dyn(&pred)
    }

    fn find_dyn(&self, pred: &dyn Fn(&Node) -> bool) -> Option<&Node> {
        if pred(self) {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find_dyn(pred))
    }

    /// Mutable variant of [`Node::find`].
    pub fn find_mut(&mut self, pred: impl Fn(&Node) -> bool + Copy) -> Option<&mut Node> {
        if pred(self) {
            return Some(self);
        }
        self.children
            .iter_mut()
            .find_map(|child| child.find_mut(pred))
    }

    /// All nodes (pre-order) matching `pred`.
    pub fn find_all(&self, pred: impl Fn(&Node) -> bool) -> Vec<&Node> {
        let mut out = Vec::new();
        self.collect(&mut out, &pred);
        out
    }

    pub fn find_by_id(&self, id: &str) -> Option<&Node> {
        self.find(|n| n.attr("id") == Some(id))
    }

    /// Nodes visible under `state`; hidden subtrees are skipped whole.
    pub fn visible<'a>(&'a self, state: &FormState) -> Vec<&'a Node> {
        let mut out = Vec::new();
        self.collect_visible(state, &mut out);
        out
    }

    fn collect<'a>(&'a self, out: &mut Vec<&'a Node>, pred: &dyn Fn(&Node) -> bool) {
        if pred(self) {
            out.push(self);
        }
        for child in &self.children {
            child.collect(out, pred);
        }
    }

    fn collect_visible<'a>(&'a self, state: &FormState, out: &mut Vec<&'a Node>) {
        if self.show.as_ref().is_some_and(|c| !c.holds(state)) {
            return;
        }
        out.push(self);
        for child in &self.children {
            child.collect_visible(state, out);
        }
    }

    // --- serialization ------------------------------------------------------

    /// Template markup: bindings and conditions written as attributes.
    #[must_use]
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out, None);
        out
    }

    /// Markup as currently seen under `state`.
    #[must_use]
    pub fn render_live(&self, state: &FormState) -> String {
        let mut out = String::new();
        self.write_html(&mut out, Some(state));
        out
    }

    fn write_html(&self, out: &mut String, state: Option<&FormState>) {
        if let Some(state) = state {
            if self.show.as_ref().is_some_and(|c| !c.holds(state)) {
                return;
            }
            if let Content::Messages(key) = &self.content {
                for message in state.messages(key) {
                    let mut item = self.clone();
                    item.content = Content::Text(message.message.clone());
                    item.add_class(if message.error { "text-danger" } else { "text-info" });
                    item.write_html(out, Some(state));
                }
                return;
            }
        }

        let mut attrs = self.attrs.clone();
        if let Some(binding) = &self.binding {
            match state {
                None => attrs.push(("data-model".into(), binding.path())),
                Some(state) => self.live_value_attrs(&mut attrs, state, binding),
            }
        }
        if state.is_none() {
            if let Some(show) = &self.show {
                attrs.push(("data-show".into(), show.expression()));
            }
            if let Content::Messages(key) = &self.content {
                attrs.push(("data-repeat".into(), key.clone()));
            }
        }

        out.push('<');
        out.push_str(&self.tag);
        if !self.classes.is_empty() {
            let _ = write!(out, " class=\"{}\"", escape(&self.classes.join(" ")));
        }
        for (name, value) in &attrs {
            let _ = write!(out, " {name}=\"{}\"", escape(value));
        }
        out.push('>');
        if VOID_ELEMENTS.contains(&self.tag.as_str()) {
            return;
        }

        match (&self.content, state, &self.binding) {
            (_, Some(state), Some(binding)) if self.tag == "textarea" => {
                let text = state.value(&binding.field).map(display_value).unwrap_or_default();
                out.push_str(&escape(&text));
            }
            (Content::Text(text), _, _) => out.push_str(&escape(text)),
            (Content::Messages(_), None, _) => out.push_str("{{message}}"),
            (Content::FieldError(name), None, _) => {
                let _ = write!(out, "{{{{formErrors.{name}}}}}");
            }
            (Content::FieldError(name), Some(state), _) => {
                out.push_str(&escape(state.error(name).unwrap_or_default()));
            }
            _ => {}
        }

        let mut children = Cow::Borrowed(self.children.as_slice());
        let mut selected = None;
        if let (Some(state), Some(binding)) = (state, &self.binding) {
            if self.tag == "select" {
                selected = state.value(&binding.field).map(display_value);
                if let Some(target) = self.attr(REMOTE_OPTIONS_ATTR) {
                    let mut merged = children.into_owned();
                    merged.extend(state.remote_options(target).iter().map(|opt| {
                        Node::new("option")
                            .with_attr("value", display_value(&opt.id))
                            .with_text(opt.name.clone())
                    }));
                    children = Cow::Owned(merged);
                }
            }
        }
        for child in children.iter() {
            match &selected {
                Some(value) if child.tag == "option" && child.attr("value") == Some(value) => {
                    child.clone().with_attr("selected", "").write_html(out, state);
                }
                _ => child.write_html(out, state),
            }
        }

        let _ = write!(out, "</{}>", self.tag);
    }

    fn live_value_attrs(&self, attrs: &mut Vec<(String, String)>, state: &FormState, binding: &Binding) {
        if self.tag != "input" {
            return;
        }
        let value = state.value(&binding.field);
        let own = self.attr("value");
        let checked = match self.attr("type") {
            Some("radio") => Some(value.map(display_value).as_deref() == own),
            Some("checkbox") => Some(match (value, own) {
                (Some(Value::Array(items)), Some(own)) => {
                    items.iter().any(|item| display_value(item) == own)
                }
                (value, _) => !is_empty(value),
            }),
            _ => None,
        };
        if let Some(checked) = checked {
            attrs.retain(|(n, _)| n != "checked");
            if checked {
                attrs.push(("checked".into(), String::new()));
            }
            return;
        }
        let text = value.map(display_value).unwrap_or_default();
        match attrs.iter_mut().find(|(n, _)| n == "value") {
            Some(slot) => slot.1 = text,
            None => attrs.push(("value".into(), text)),
        }
    }
}

/// Escape text for markup.
#[must_use]
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Rendered
// ---------------------------------------------------------------------------

/// Output of one render call: a single node or a sequence of siblings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rendered {
    Node(Node),
    Nodes(Vec<Node>),
}

impl Rendered {
    /// Flatten into owned nodes.
    #[must_use]
    pub fn into_nodes(self) -> Vec<Node> {
        match self {
            Self::Node(node) => vec![node],
            Self::Nodes(nodes) => nodes,
        }
    }

    /// The single node, or the first of a sequence.
    #[must_use]
    pub fn first(&self) -> Option<&Node> {
        match self {
            Self::Node(node) => Some(node),
            Self::Nodes(nodes) => nodes.first(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Node(_) => 1,
            Self::Nodes(nodes) => nodes.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<Node> for Rendered {
    fn from(node: Node) -> Self {
        Self::Node(node)
    }
}

impl IntoIterator for Rendered {
    type Item = Node;
    type IntoIter = std::vec::IntoIter<Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.into_nodes().into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::FieldKind;
    use crate::state::{FormMessage, RemoteOption};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn state() -> FormState {
        let mut state = FormState::new("form", "formModel", "f0001", "m__form");
        state.register_control(
            "email",
            Some(FieldKind::Email),
            vec![(ConstraintKind::Required, json!(true))],
        );
        state
    }

    #[test]
    fn template_markup() {
        let node = Node::new("div")
            .with_class("form-group")
            .with_child(
                Node::new("input")
                    .with_attr("type", "text")
                    .with_attr("required", "")
                    .bound_to(Binding::new("formModel", "email")),
            )
            .with_child(Node::new("label").with_text("A & B"));
        assert_eq!(
            node.to_html(),
            "<div class=\"form-group\"><input type=\"text\" required=\"\" \
             data-model=\"formModel.email\"><label>A &amp; B</label></div>"
        );
    }

    #[test]
    fn set_attr_replaces_in_place() {
        let mut node = Node::new("input").with_attr("a", "1").with_attr("b", "2");
        node.set_attr("a", "3");
        assert_eq!(node.attrs()[0], ("a".to_string(), "3".to_string()));
        assert_eq!(node.remove_attr("b").as_deref(), Some("2"));
        assert_eq!(node.attr("b"), None);
    }

    #[test]
    fn add_class_dedupes() {
        let node = Node::new("p").with_class("a b").with_class("b c");
        assert_eq!(node.classes(), &["a", "b", "c"]);
    }

    #[test]
    fn hidden_subtrees_are_pruned() {
        let mut state = state();
        let node = Node::new("div").with_child(
            Node::new("p")
                .shown_when(Condition::DirtyAndInvalid("email".into()))
                .with_child(Node::new("span").with_text("This field is required")),
        );
        assert_eq!(node.visible(&state).len(), 1);
        state.mark_dirty("email");
        assert_eq!(node.visible(&state).len(), 3);
        assert_eq!(
            node.render_live(&state),
            "<div><p><span>This field is required</span></p></div>"
        );
    }

    #[test]
    fn invalid_otherwise_ignores_constraint_violations() {
        let mut state = state();
        let cond = Condition::InvalidOtherwise("email".into());
        assert!(!cond.holds(&state));
        state.set_value("email", json!("nope"));
        assert!(cond.holds(&state));
    }

    #[test]
    fn messages_repeat_live() {
        let mut state = state();
        state.set_messages(
            "m__form",
            vec![FormMessage::info("saved"), FormMessage::error("but")],
        );
        let node = Node::new("p").with_content(Content::Messages("m__form".into()));
        assert_eq!(node.to_html(), "<p data-repeat=\"m__form\">{{message}}</p>");
        assert_eq!(
            node.render_live(&state),
            "<p class=\"text-info\">saved</p><p class=\"text-danger\">but</p>"
        );
    }

    #[test]
    fn field_error_reads_the_error_map() {
        let mut state = state();
        let node = Node::new("p").with_content(Content::FieldError("email".into()));
        assert_eq!(node.to_html(), "<p>{{formErrors.email}}</p>");
        assert_eq!(node.render_live(&state), "<p></p>");
        state.set_error("email", "email <is> not valid");
        assert_eq!(node.render_live(&state), "<p>email &lt;is&gt; not valid</p>");
        assert_eq!(node.text(), None);
    }

    #[test]
    fn live_values_follow_the_model() {
        let mut state = state();
        state.seed_value("email", json!("a\"b"));
        state.seed_value("kind", json!("2"));
        let input = Node::new("input").bound_to(Binding::new("m", "email"));
        assert_eq!(input.render_live(&state), "<input value=\"a&quot;b\">");

        let select = Node::new("select")
            .bound_to(Binding::new("m", "kind"))
            .with_child(Node::new("option").with_attr("value", "1"))
            .with_child(Node::new("option").with_attr("value", "2"));
        assert_eq!(
            select.render_live(&state),
            "<select><option value=\"1\"></option><option value=\"2\" selected=\"\"></option></select>"
        );
    }

    #[test]
    fn choice_inputs_reflect_the_model() {
        let mut state = state();
        state.seed_value("size", json!("m"));
        state.seed_value("tags", json!(["a", "c"]));
        let radio = |v: &str| {
            Node::new("input")
                .with_attr("type", "radio")
                .with_attr("value", v)
                .bound_to(Binding::new("m", "size"))
        };
        assert!(radio("m").render_live(&state).contains("checked"));
        assert!(!radio("s").render_live(&state).contains("checked"));

        let check = |v: &str| {
            Node::new("input")
                .with_attr("type", "checkbox")
                .with_attr("value", v)
                .bound_to(Binding::new("m", "tags"))
        };
        assert!(check("c").render_live(&state).contains("checked"));
        assert!(!check("b").render_live(&state).contains("checked"));
    }

    #[test]
    fn remote_options_render_live() {
        let mut state = state();
        state.seed_value("group", json!(7));
        state
            .remote_options_mut("groups")
            .extend([RemoteOption::new("", "Please select..."), RemoteOption::new(7, "Admins")]);
        let select = Node::new("select")
            .with_attr(REMOTE_OPTIONS_ATTR, "groups")
            .bound_to(Binding::new("m", "group"));
        assert_eq!(
            select.render_live(&state),
            "<select data-remote-options=\"groups\"><option value=\"\">Please select...</option>\
             <option value=\"7\" selected=\"\">Admins</option></select>"
        );
    }

    #[test]
    fn find_and_replace() {
        let mut root = Node::new("div").with_child(Node::new("span").with_attr("id", "x"));
        assert!(root.find_by_id("x").is_some());
        assert_eq!(root.descendants().len(), 2);
        let slot = root.find_mut(|n| n.tag() == "span").unwrap();
        let old = slot.replace_with(Node::new("form"));
        assert_eq!(old.tag(), "span");
        assert_eq!(root.children()[0].tag(), "form");
    }

    #[test]
    fn rendered_flattens() {
        let one: Rendered = Node::new("a").into();
        assert_eq!(one.len(), 1);
        let many = Rendered::Nodes(vec![Node::new("a"), Node::new("b")]);
        let tags: Vec<_> = many.into_iter().map(|n| n.tag().to_string()).collect();
        assert_eq!(tags, vec!["a", "b"]);
    }
}
