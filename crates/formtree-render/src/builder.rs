#![forbid(unsafe_code)]

//! Form builder.
//!
//! Turns the serialized field-tree attribute of a host node into live form
//! state and a rendered tree, then swaps the host's placeholder for it:
//!
//! 1. [`FormBuilder::init_state`] parses `{"field": {...}}`, merges the form
//!    defaults into the root spec and creates the [`FormState`].
//! 2. [`FormBuilder::create_form`] renders the root with its layout.
//! 3. [`FormBuilder::mount`] does both and replaces the placeholder node.
//!
//! Any configuration error in steps 1-2 aborts the build; nothing is
//! rendered.

use formtree_core::logging::{TARGET_BUILD, debug, info_span};
use formtree_core::state::next_form_id;
use formtree_core::{
    ConfigError, ConfigResult, FieldSpec, FormAttrs, FormDefaults, FormState, Inherited, Node,
    Rendered,
};
use serde_json::Value;

use crate::handlers::ClickHandlers;
use crate::layout::{LayoutRegistry, LayoutRenderer, RenderContext, render_field};

/// Name given to forms that declare none.
pub const DEFAULT_FORM_NAME: &str = "form";

/// A rendered form with its live state.
#[derive(Debug, Clone)]
pub struct BuiltForm {
    /// Root spec after rendering, with generated ids and defaults filled in.
    pub spec: FieldSpec,
    pub state: FormState,
    pub node: Node,
}

/// Builds forms from field-tree attributes.
#[derive(Debug, Default)]
pub struct FormBuilder {
    defaults: FormDefaults,
    layouts: LayoutRegistry,
    handlers: ClickHandlers,
}

impl FormBuilder {
    /// A builder with stock defaults, the built-in layouts and no handlers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_defaults(mut self, defaults: FormDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    /// Register an extra layout.
    #[must_use]
    pub fn with_layout(mut self, layout: impl LayoutRenderer + 'static) -> Self {
        self.layouts.register(layout);
        self
    }

    /// Register a named click handler.
    #[must_use]
    pub fn with_handler(
        mut self,
        name: impl Into<String>,
        handler: impl Fn(&mut FormState) + 'static,
    ) -> Self {
        self.handlers.register(name, handler);
        self
    }

    /// Register a custom checker for one field.
    #[must_use]
    pub fn with_checker(
        mut self,
        field: impl Into<String>,
        checker: impl Fn(&mut FormState) + 'static,
    ) -> Self {
        self.handlers.register_checker(field, checker);
        self
    }

    pub fn defaults(&self) -> &FormDefaults {
        &self.defaults
    }

    pub fn layouts(&self) -> &LayoutRegistry {
        &self.layouts
    }

    pub fn handlers(&self) -> &ClickHandlers {
        &self.handlers
    }

    /// Parse the field-tree attribute and create the form's state.
    ///
    /// Returns the state and the root spec with defaults merged in: name
    /// (`form`), model (`<name>Model` when it would equal the name), id
    /// (generated), layout and presentation options.
    pub fn init_state(&self, attribute: &str) -> ConfigResult<(FormState, FieldSpec)> {
        let data: Value =
            serde_json::from_str(attribute).map_err(|err| ConfigError::from(err).report())?;
        let field = data
            .get("field")
            .filter(|f| !f.is_null())
            .cloned()
            .ok_or_else(|| ConfigError::MissingField.report())?;
        let mut root: FieldSpec =
            serde_json::from_value(field).map_err(|err| ConfigError::from(err).report())?;
        self.merge_defaults(&mut root);

        let name = root.name.get_or_insert_with(|| DEFAULT_FORM_NAME.to_string()).clone();
        let mut model = root.model.clone().unwrap_or_else(|| name.clone());
        if model == name {
            model = format!("{model}Model");
        }
        root.model = Some(model.clone());
        let form_id = root.id.get_or_insert_with(next_form_id).clone();

        debug!(target: TARGET_BUILD, form = %name, model = %model, id = %form_id, "form state initialized");
        let state = FormState::new(name, model, form_id, self.defaults.form_key.as_str())
            .with_attrs(FormAttrs::from_spec(&root));
        Ok((state, root))
    }

    /// Render the root spec.
    ///
    /// The root's layout must be registered; an unknown one aborts the build.
    pub fn create_form(&self, state: &mut FormState, root: &mut FieldSpec) -> ConfigResult<Node> {
        let inherited = Inherited::from_defaults(&self.defaults).resolve(root);
        if self.layouts.get(&inherited.layout).is_none() {
            return Err(ConfigError::UnknownLayout(inherited.layout).report());
        }
        let span = info_span!(target: TARGET_BUILD, "create_form", form = state.form_name());
        let _guard = span.enter();

        let rendered = {
            let mut ctx = RenderContext::new(state, &self.layouts, &self.handlers);
            render_field(&mut ctx, root, &inherited)
        };
        debug!(target: TARGET_BUILD, fields = state.form_count(), "form rendered");
        Ok(match rendered {
            Rendered::Node(node) => node,
            Rendered::Nodes(nodes) => Node::new("div").with_children(nodes),
        })
    }

    /// Initialize and render a form from its attribute.
    pub fn build(&self, attribute: &str) -> ConfigResult<BuiltForm> {
        let (mut state, mut spec) = self.init_state(attribute)?;
        let node = self.create_form(&mut state, &mut spec)?;
        Ok(BuiltForm { spec, state, node })
    }

    /// Build a form and put it in place of `placeholder`.
    ///
    /// The returned [`BuiltForm::node`] holds the replaced placeholder. On
    /// error the placeholder is left untouched.
    pub fn mount(&self, attribute: &str, placeholder: &mut Node) -> ConfigResult<BuiltForm> {
        let mut built = self.build(attribute)?;
        built.node = placeholder.replace_with(built.node);
        Ok(built)
    }

    fn merge_defaults(&self, root: &mut FieldSpec) {
        if root.kind.is_none() {
            root.kind = Some("form".to_string());
        }
        if root.layout.is_none() {
            root.layout = Some(self.defaults.layout.clone());
        }
        if root.show_labels.is_none() {
            root.show_labels = Some(self.defaults.show_labels);
        }
        if root.label_span.is_none() {
            root.label_span = Some(Value::from(self.defaults.label_span));
        }
        if root.novalidate.is_none() {
            root.novalidate = Some(self.defaults.novalidate);
        }
    }
}
