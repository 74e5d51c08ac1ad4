#![forbid(unsafe_code)]

//! Live, mutable state of one rendered form.
//!
//! A [`FormState`] is created once per form by the builder and owned by that
//! form alone. It holds the bound data model, the message/error/class maps the
//! rendered tree reads, the control registry used to evaluate validity, the
//! click bindings of buttons, and option lists populated by remote loaders.
//!
//! # Invariants
//!
//! 1. `form_count` only grows; every generated id uses a fresh value.
//! 2. Message and error writes replace the entry for their key; nothing is
//!    merged into a previous entry.
//! 3. Validity is derived from the model on demand; it is never cached.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, Ordering};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::field::FieldSpec;
use crate::registry::FieldKind;
use crate::validation::{ConstraintKind, TypeCheck, Validator};

static NEXT_FORM_ID: AtomicU32 = AtomicU32::new(1);

/// Generate a form id unique within this process: `f` followed by at least
/// four hex digits.
#[must_use]
pub fn next_form_id() -> String {
    format_form_id(NEXT_FORM_ID.fetch_add(1, Ordering::Relaxed))
}

fn format_form_id(n: u32) -> String {
    format!("f{n:04x}")
}

// ---------------------------------------------------------------------------
// FormMessage
// ---------------------------------------------------------------------------

/// One entry of a message group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormMessage {
    pub message: String,
    #[serde(default)]
    pub error: bool,
}

impl FormMessage {
    /// An informational message.
    #[must_use]
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            error: false,
        }
    }

    /// An error message.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            error: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Control, ClickAction, RemoteOption, FormAttrs
// ---------------------------------------------------------------------------

/// Validation state of one editable field.
#[derive(Debug, Clone, PartialEq)]
pub struct Control {
    /// Declared type, when known.
    pub kind: Option<FieldKind>,
    /// Active constraints with their bounds.
    pub constraints: Vec<(ConstraintKind, Value)>,
    /// Edited by the user (or forced by `show_errors`).
    pub dirty: bool,
    /// Focused then left.
    pub touched: bool,
}

/// What a button does when clicked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickAction {
    /// Run the default submission handler.
    Submit,
    /// Run the named registered handler.
    Handler(String),
}

/// An option populated by a remote option loader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteOption {
    pub id: Value,
    pub name: String,
}

impl RemoteOption {
    /// Create an option.
    #[must_use]
    pub fn new(id: impl Into<Value>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Submission-related attributes of the root form spec.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormAttrs {
    /// Explicit submission URL.
    pub action: Option<String>,
    /// HTTP method for URL submissions (default POST).
    pub method: Option<String>,
    /// Content encoding, possibly with parameters (`multipart/form-data; ...`).
    pub enctype: Option<String>,
    /// Named API resource used when there is no URL.
    pub apiname: Option<String>,
}

impl FormAttrs {
    /// Extract the attributes from a root spec.
    #[must_use]
    pub fn from_spec(spec: &FieldSpec) -> Self {
        Self {
            action: spec.action.clone().filter(|s| !s.is_empty()),
            method: spec.method.clone().filter(|s| !s.is_empty()),
            enctype: spec.enctype.clone().filter(|s| !s.is_empty()),
            apiname: spec.apiname.clone().filter(|s| !s.is_empty()),
        }
    }

    /// Media type of `enctype` without parameters, lowercased.
    #[must_use]
    pub fn content_type(&self) -> Option<String> {
        self.enctype
            .as_deref()
            .map(|e| e.split(';').next().unwrap_or_default().trim().to_ascii_lowercase())
            .filter(|ct| !ct.is_empty())
    }
}

// ---------------------------------------------------------------------------
// FormState
// ---------------------------------------------------------------------------

/// Live state of one rendered form.
#[derive(Debug, Clone)]
pub struct FormState {
    form_name: String,
    model_name: String,
    form_id: String,
    form_key: String,
    attrs: FormAttrs,
    model: Map<String, Value>,
    errors: BTreeMap<String, String>,
    messages: BTreeMap<String, Vec<FormMessage>>,
    classes: BTreeMap<String, String>,
    form_count: u32,
    controls: BTreeMap<String, Control>,
    clicks: BTreeMap<String, ClickAction>,
    remote_options: BTreeMap<String, Vec<RemoteOption>>,
}

impl FormState {
    /// Create empty state for a form.
    #[must_use]
    pub fn new(
        form_name: impl Into<String>,
        model_name: impl Into<String>,
        form_id: impl Into<String>,
        form_key: impl Into<String>,
    ) -> Self {
        Self {
            form_name: form_name.into(),
            model_name: model_name.into(),
            form_id: form_id.into(),
            form_key: form_key.into(),
            attrs: FormAttrs::default(),
            model: Map::new(),
            errors: BTreeMap::new(),
            messages: BTreeMap::new(),
            classes: BTreeMap::new(),
            form_count: 0,
            controls: BTreeMap::new(),
            clicks: BTreeMap::new(),
            remote_options: BTreeMap::new(),
        }
    }

    /// Set the submission attributes.
    #[must_use]
    pub fn with_attrs(mut self, attrs: FormAttrs) -> Self {
        self.attrs = attrs;
        self
    }

    pub fn form_name(&self) -> &str {
        &self.form_name
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn form_id(&self) -> &str {
        &self.form_id
    }

    /// Message group for form-level messages.
    pub fn form_key(&self) -> &str {
        &self.form_key
    }

    pub fn attrs(&self) -> &FormAttrs {
        &self.attrs
    }

    /// Current value of the id counter.
    pub fn form_count(&self) -> u32 {
        self.form_count
    }

    /// Advance the id counter and return the new value.
    pub fn bump_count(&mut self) -> u32 {
        self.form_count += 1;
        self.form_count
    }

    // -------------------------------------------------------------------------
    // Data model
    // -------------------------------------------------------------------------

    /// The bound data model.
    pub fn model(&self) -> &Map<String, Value> {
        &self.model
    }

    /// Current value of a field.
    pub fn value(&self, name: &str) -> Option<&Value> {
        self.model.get(name)
    }

    /// Seed a value without marking the field dirty.
    pub fn seed_value(&mut self, name: impl Into<String>, value: Value) {
        self.model.insert(name.into(), value);
    }

    /// Seed a value only when the model has none.
    pub fn seed_default(&mut self, name: &str, value: Value) {
        if self.model.get(name).is_none_or(Value::is_null) {
            self.model.insert(name.to_string(), value);
        }
    }

    /// Apply user input: store the value and mark the field dirty.
    pub fn set_value(&mut self, name: &str, value: Value) {
        self.model.insert(name.to_string(), value);
        self.mark_dirty(name);
    }

    // -------------------------------------------------------------------------
    // Controls
    // -------------------------------------------------------------------------

    /// Register an editable field and its constraints.
    ///
    /// Re-registering keeps the dirty/touched flags.
    pub fn register_control(
        &mut self,
        name: &str,
        kind: Option<FieldKind>,
        constraints: Vec<(ConstraintKind, Value)>,
    ) {
        let control = self.controls.entry(name.to_string()).or_insert(Control {
            kind,
            constraints: Vec::new(),
            dirty: false,
            touched: false,
        });
        control.kind = kind;
        control.constraints = constraints;
    }

    pub fn control(&self, name: &str) -> Option<&Control> {
        self.controls.get(name)
    }

    /// Names of all registered controls.
    pub fn control_names(&self) -> impl Iterator<Item = &str> {
        self.controls.keys().map(String::as_str)
    }

    pub fn mark_dirty(&mut self, name: &str) {
        if let Some(control) = self.controls.get_mut(name) {
            control.dirty = true;
        }
    }

    pub fn mark_touched(&mut self, name: &str) {
        if let Some(control) = self.controls.get_mut(name) {
            control.touched = true;
        }
    }

    pub fn is_dirty(&self, name: &str) -> bool {
        self.controls.get(name).is_some_and(|c| c.dirty)
    }

    pub fn is_touched(&self, name: &str) -> bool {
        self.controls.get(name).is_some_and(|c| c.touched)
    }

    /// Declared constraints the current value violates, in emission order.
    pub fn violations(&self, name: &str) -> Vec<ConstraintKind> {
        let Some(control) = self.controls.get(name) else {
            return Vec::new();
        };
        let value = self.model.get(name);
        control
            .constraints
            .iter()
            .filter(|(kind, bound)| kind.check(bound, value).is_invalid())
            .map(|(kind, _)| *kind)
            .collect()
    }

    /// Whether the current value violates `constraint`.
    pub fn violates(&self, name: &str, constraint: ConstraintKind) -> bool {
        let Some(control) = self.controls.get(name) else {
            return false;
        };
        let value = self.model.get(name);
        control
            .constraints
            .iter()
            .any(|(kind, bound)| *kind == constraint && kind.check(bound, value).is_invalid())
    }

    /// Whether the current value parses as the field's type.
    pub fn type_valid(&self, name: &str) -> bool {
        match self.controls.get(name).and_then(|c| c.kind) {
            Some(kind) => TypeCheck::new(kind).validate(self.model.get(name)).is_valid(),
            None => true,
        }
    }

    /// Whether a field is invalid for any reason.
    pub fn is_invalid(&self, name: &str) -> bool {
        !self.violations(name).is_empty() || !self.type_valid(name)
    }

    /// Whether any registered field is invalid.
    pub fn is_form_invalid(&self) -> bool {
        self.controls.keys().any(|name| self.is_invalid(name))
    }

    /// Mark every control dirty so pending errors become visible.
    pub fn show_errors(&mut self) {
        for control in self.controls.values_mut() {
            control.dirty = true;
        }
    }

    /// Refresh the state class (and error) of one field.
    ///
    /// Valid fields get `has-success`; dirty invalid fields get `has-error`
    /// and a generic error entry. Pristine invalid fields are left alone.
    pub fn check_field(&mut self, name: &str) {
        if !self.is_invalid(name) {
            self.classes.insert(name.to_string(), "has-success".into());
            self.errors.remove(name);
        } else if self.is_dirty(name) {
            self.errors
                .insert(name.to_string(), format!("{name} is not valid"));
            self.classes.insert(name.to_string(), "has-error".into());
        }
    }

    // -------------------------------------------------------------------------
    // Errors, classes, messages
    // -------------------------------------------------------------------------

    pub fn errors(&self) -> &BTreeMap<String, String> {
        &self.errors
    }

    pub fn error(&self, name: &str) -> Option<&str> {
        self.errors.get(name).map(String::as_str)
    }

    pub fn set_error(&mut self, name: impl Into<String>, message: impl Into<String>) {
        self.errors.insert(name.into(), message.into());
    }

    pub fn classes(&self) -> &BTreeMap<String, String> {
        &self.classes
    }

    pub fn class(&self, name: &str) -> Option<&str> {
        self.classes.get(name).map(String::as_str)
    }

    pub fn form_messages(&self) -> &BTreeMap<String, Vec<FormMessage>> {
        &self.messages
    }

    /// Messages of one group, empty when none.
    pub fn messages(&self, key: &str) -> &[FormMessage] {
        self.messages.get(key).map(Vec::as_slice).unwrap_or_default()
    }

    /// Replace the messages of one group.
    pub fn set_messages(&mut self, key: impl Into<String>, messages: Vec<FormMessage>) {
        self.messages.insert(key.into(), messages);
    }

    /// Replace each incoming group; groups not mentioned are kept.
    pub fn add_messages<I, K>(&mut self, incoming: I)
    where
        I: IntoIterator<Item = (K, Vec<FormMessage>)>,
        K: Into<String>,
    {
        for (key, messages) in incoming {
            self.messages.insert(key.into(), messages);
        }
    }

    /// Drop every message group.
    pub fn clear_messages(&mut self) {
        self.messages.clear();
    }

    // -------------------------------------------------------------------------
    // Click bindings
    // -------------------------------------------------------------------------

    /// Bind a click slot (`<button name>Click`) to an action.
    pub fn bind_click(&mut self, slot: impl Into<String>, action: ClickAction) {
        self.clicks.insert(slot.into(), action);
    }

    pub fn click_action(&self, slot: &str) -> Option<&ClickAction> {
        self.clicks.get(slot)
    }

    // -------------------------------------------------------------------------
    // Remote options
    // -------------------------------------------------------------------------

    /// Options populated for a remote target, empty when none.
    pub fn remote_options(&self, target: &str) -> &[RemoteOption] {
        self.remote_options
            .get(target)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Mutable option list for a remote target, created on demand.
    pub fn remote_options_mut(&mut self, target: &str) -> &mut Vec<RemoteOption> {
        self.remote_options.entry(target.to_string()).or_default()
    }
}
