#![forbid(unsafe_code)]

//! Named click handlers for buttons, and custom field checkers.
//!
//! A button spec may name a handler in its `click` entry. Names are resolved
//! against this registry while the button renders; a name with no entry is a
//! configuration error and the button stays unwired.
//!
//! A checker registered for a field runs in place of the default validity
//! check after each input to that field.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use formtree_core::FormState;

/// A click handler. Receives the state of the form the button belongs to.
pub type ClickFn = Rc<dyn Fn(&mut FormState)>;

/// A field checker. Receives the state of the form the field belongs to.
pub type CheckFn = Rc<dyn Fn(&mut FormState)>;

/// Registry of named click handlers and per-field checkers.
#[derive(Clone, Default)]
pub struct ClickHandlers {
    handlers: BTreeMap<String, ClickFn>,
    checkers: BTreeMap<String, CheckFn>,
}

impl ClickHandlers {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler, replacing any previous one of the same name.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, handler: impl Fn(&mut FormState) + 'static) -> Self {
        self.register(name, handler);
        self
    }

    /// Register a handler, replacing any previous one of the same name.
    pub fn register(&mut self, name: impl Into<String>, handler: impl Fn(&mut FormState) + 'static) {
        self.handlers.insert(name.into(), Rc::new(handler));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Look up a handler.
    pub fn get(&self, name: &str) -> Option<ClickFn> {
        self.handlers.get(name).cloned()
    }

    /// Register the checker of `field`, replacing any previous one.
    #[must_use]
    pub fn with_checker(mut self, field: impl Into<String>, checker: impl Fn(&mut FormState) + 'static) -> Self {
        self.register_checker(field, checker);
        self
    }

    pub fn register_checker(&mut self, field: impl Into<String>, checker: impl Fn(&mut FormState) + 'static) {
        self.checkers.insert(field.into(), Rc::new(checker));
    }

    /// Custom checker of `field`, if any.
    pub fn checker(&self, field: &str) -> Option<CheckFn> {
        self.checkers.get(field).cloned()
    }

    /// Number of click handlers.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl fmt::Debug for ClickHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClickHandlers")
            .field("names", &self.handlers.keys().collect::<Vec<_>>())
            .field("checkers", &self.checkers.keys().collect::<Vec<_>>())
            .finish()
    }
}
