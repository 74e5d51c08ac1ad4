#![forbid(unsafe_code)]

//! A live form: built tree, state, click handlers and remote loaders.
//!
//! [`FormInstance`] is the event driver a host wires its UI to. Input and
//! blur events update the state synchronously; clicks, submits and remote
//! option loads suspend on the transport.

use serde_json::Value;

use formtree_core::logging::{TARGET_SUBMIT, debug};
use formtree_core::{ClickAction, ConfigError, ConfigResult, FieldSpec, FormState, Node};
use formtree_render::{BuiltForm, ClickHandlers, FormBuilder};

use crate::error::RuntimeResult;
use crate::remote::{RemoteOptionsConfig, RemoteOptionsLoader};
use crate::submit::{SubmitEvent, SubmitOutcome, process_form};
use crate::transport::{ApiDirectory, Transport};

/// What a click did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickOutcome {
    /// The default submission handler ran.
    Submitted(SubmitOutcome),
    /// A registered handler ran.
    Handled(String),
}

/// One rendered form and everything driving it.
#[derive(Debug)]
pub struct FormInstance {
    form: BuiltForm,
    handlers: ClickHandlers,
    loaders: Vec<RemoteOptionsLoader>,
}

impl FormInstance {
    /// Wrap a built form. Remote option loaders are created for every field
    /// declaring them and attached right away; bad configurations are logged
    /// and skipped.
    #[must_use]
    pub fn new(mut form: BuiltForm, handlers: ClickHandlers) -> Self {
        let mut loaders = Vec::new();
        collect_loaders(&form.spec, &mut loaders);
        for loader in &loaders {
            loader.attach(&mut form.state);
        }
        Self {
            form,
            handlers,
            loaders,
        }
    }

    /// Build a form with `builder` and wrap it.
    pub fn from_builder(builder: &FormBuilder, attribute: &str) -> ConfigResult<Self> {
        let form = builder.build(attribute)?;
        Ok(Self::new(form, builder.handlers().clone()))
    }

    #[must_use]
    pub fn state(&self) -> &FormState {
        &self.form.state
    }

    pub fn state_mut(&mut self) -> &mut FormState {
        &mut self.form.state
    }

    #[must_use]
    pub fn node(&self) -> &Node {
        &self.form.node
    }

    #[must_use]
    pub fn spec(&self) -> &FieldSpec {
        &self.form.spec
    }

    /// Markup reflecting the current state.
    #[must_use]
    pub fn render_live(&self) -> String {
        self.form.node.render_live(&self.form.state)
    }

    #[must_use]
    pub fn loaders(&self) -> &[RemoteOptionsLoader] {
        &self.loaders
    }

    /// Loader feeding `field`.
    pub fn loader_mut(&mut self, field: &str) -> Option<&mut RemoteOptionsLoader> {
        self.loaders.iter_mut().find(|l| l.config().field == field)
    }

    // -------------------------------------------------------------------------
    // Events
    // -------------------------------------------------------------------------

    /// The user changed a field. A registered checker for the field runs
    /// instead of the default check.
    pub fn input(&mut self, name: &str, value: Value) {
        self.form.state.set_value(name, value);
        match self.handlers.checker(name) {
            Some(checker) => checker(&mut self.form.state),
            None => self.form.state.check_field(name),
        }
    }

    /// A field lost focus.
    pub fn blur(&mut self, name: &str) {
        self.form.state.mark_touched(name);
    }

    /// A button was clicked. `None` when the button is not wired.
    pub async fn click<T, D>(
        &mut self,
        button: &str,
        transport: &T,
        directory: &D,
    ) -> Option<ClickOutcome>
    where
        T: Transport,
        D: ApiDirectory,
    {
        let slot = format!("{button}Click");
        match self.form.state.click_action(&slot).cloned()? {
            ClickAction::Submit => Some(ClickOutcome::Submitted(
                self.submit(transport, directory).await,
            )),
            ClickAction::Handler(name) => {
                let Some(handler) = self.handlers.get(&name) else {
                    ConfigError::UnknownClickHandler(name).report();
                    return None;
                };
                debug!(target: TARGET_SUBMIT, button, handler = %name, "running click handler");
                handler(&mut self.form.state);
                Some(ClickOutcome::Handled(name))
            }
        }
    }

    /// Run the default submission handler.
    pub async fn submit<T, D>(&mut self, transport: &T, directory: &D) -> SubmitOutcome
    where
        T: Transport,
        D: ApiDirectory,
    {
        let mut event = SubmitEvent::new();
        process_form(&mut self.form.state, &mut event, transport, directory).await
    }

    /// Fetch one more page for the loader feeding `field`.
    pub async fn load_more<D: ApiDirectory>(&mut self, field: &str, directory: &D) -> RuntimeResult<usize> {
        match self.loaders.iter_mut().find(|l| l.config().field == field) {
            Some(loader) => loader.load_more(&mut self.form.state, directory).await,
            None => Ok(0),
        }
    }

    /// Run every remote option loader. All loaders run even when one fails;
    /// the first failure is returned.
    pub async fn load_remote_options<D: ApiDirectory>(&mut self, directory: &D) -> RuntimeResult<usize> {
        let mut added = 0;
        let mut first_error = None;
        for loader in &mut self.loaders {
            match loader.load(&mut self.form.state, directory).await {
                Ok(n) => added += n,
                Err(err) => {
                    first_error.get_or_insert(err);
                }
            }
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(added),
        }
    }
}

fn collect_loaders(field: &FieldSpec, loaders: &mut Vec<RemoteOptionsLoader>) {
    match RemoteOptionsConfig::from_field(field) {
        Ok(Some(config)) => loaders.push(RemoteOptionsLoader::new(config)),
        Ok(None) => {}
        Err(err) => {
            err.report();
        }
    }
    for child in field.children() {
        collect_loaders(child, loaders);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockApi, MockTransport};
    use formtree_core::FormMessage;
    use serde_json::json;
    use tracing_test::traced_test;

    #[test]
    fn input_checks_field() {
        let mut form = FormInstance::from_builder(
            &FormBuilder::new(),
            r#"{"field": {"type": "form", "children": [
                {"type": "email", "name": "email", "required": true}
            ]}}"#,
        )
        .unwrap();
        form.input("email", json!("nope"));
        assert_eq!(form.state().class("email"), Some("has-error"));
        form.input("email", json!("a@b.io"));
        assert_eq!(form.state().class("email"), Some("has-success"));
        form.blur("email");
        assert!(form.state().is_touched("email"));
    }

    #[test]
    fn field_error_shows_in_live_markup() {
        let mut form = FormInstance::from_builder(
            &FormBuilder::new(),
            r#"{"field": {"type": "form", "children": [
                {"type": "number", "name": "age", "min": 5}
            ]}}"#,
        )
        .unwrap();
        assert!(!form.render_live().contains("age is not valid"));
        form.input("age", json!("abc"));
        assert_eq!(form.state().error("age"), Some("age is not valid"));
        assert!(
            form.render_live()
                .contains("<p class=\"text-danger form-error\">age is not valid</p>")
        );
        form.input("age", json!(7));
        assert!(!form.render_live().contains("form-error"));
    }

    #[test]
    fn custom_checker_replaces_default_check() {
        let builder = FormBuilder::new().with_checker("nick", |state: &mut FormState| {
            let taken = state.value("nick") == Some(&json!("root"));
            if taken {
                state.set_error("nick", "nick is taken");
            }
        });
        let mut form = FormInstance::from_builder(
            &builder,
            r#"{"field": {"type": "form", "children": [
                {"type": "text", "name": "nick"},
                {"type": "text", "name": "city"}
            ]}}"#,
        )
        .unwrap();
        form.input("nick", json!("root"));
        assert_eq!(form.state().error("nick"), Some("nick is taken"));
        assert_eq!(form.state().class("nick"), None);
        form.input("city", json!("Oslo"));
        assert_eq!(form.state().class("city"), Some("has-success"));
    }

    #[test]
    fn click_runs_registered_handler() {
        let builder = FormBuilder::new().with_handler("note", |state: &mut FormState| {
            let key = state.form_key().to_string();
            state.set_messages(key, vec![FormMessage::info("clicked")]);
        });
        let mut form = FormInstance::from_builder(
            &builder,
            r#"{"field": {"type": "form", "children": [
                {"type": "button", "name": "ping", "click": "note"}
            ]}}"#,
        )
        .unwrap();
        let outcome = pollster::block_on(form.click("ping", &MockTransport::new(), &MockApi::new()));
        assert_eq!(outcome, Some(ClickOutcome::Handled("note".into())));
        assert_eq!(form.state().messages("m__form"), &[FormMessage::info("clicked")]);
        let unwired = pollster::block_on(form.click("nothing", &MockTransport::new(), &MockApi::new()));
        assert_eq!(unwired, None);
    }

    #[test]
    #[traced_test]
    fn bad_remote_config_is_skipped() {
        let form = FormInstance::from_builder(
            &FormBuilder::new(),
            r#"{"field": {"type": "form", "children": [
                {"type": "select", "name": "a", "remoteOptions": {"url": "/x"}},
                {"type": "select", "name": "b", "remoteOptions": {"name": "bees"}}
            ]}}"#,
        )
        .unwrap();
        assert_eq!(form.loaders().len(), 1);
        assert_eq!(form.loaders()[0].config().field, "b");
        assert!(logs_contain("target has no name"));
    }
}
