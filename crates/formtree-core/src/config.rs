#![forbid(unsafe_code)]

//! Form-wide defaults.
//!
//! Every form starts from a [`FormDefaults`] record. The root field spec
//! overrides it, and containers pass the shared presentation options down to
//! children that leave them unset (see [`crate::field::Inherited`]).

use serde::Deserialize;

use crate::error::ConfigResult;

/// Layout used when neither the form nor its defaults name one.
pub const DEFAULT_LAYOUT: &str = "default";

/// Message group holding messages about the form as a whole.
pub const DEFAULT_FORM_KEY: &str = "m__form";

/// Label column span for horizontal layouts.
pub const DEFAULT_LABEL_SPAN: i64 = 2;

/// Defaults applied to every form built by a builder.
///
/// Deserializes from the same camel-case keys a field spec uses:
///
/// ```rust
/// use formtree_core::FormDefaults;
///
/// let defaults = FormDefaults::from_json(r#"{"layout": "horizontal", "labelSpan": 3}"#).unwrap();
/// assert_eq!(defaults.layout, "horizontal");
/// assert_eq!(defaults.label_span, 3);
/// assert!(defaults.show_labels);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FormDefaults {
    /// Layout renderer name.
    pub layout: String,
    /// Label column span for horizontal layouts.
    pub label_span: i64,
    /// Whether labels are visible (otherwise screen-reader only).
    pub show_labels: bool,
    /// Whether the form element disables native browser validation.
    pub novalidate: bool,
    /// Message group key for form-level messages.
    #[serde(rename = "FORMKEY")]
    pub form_key: String,
}

impl Default for FormDefaults {
    fn default() -> Self {
        Self {
            layout: DEFAULT_LAYOUT.to_string(),
            label_span: DEFAULT_LABEL_SPAN,
            show_labels: true,
            novalidate: true,
            form_key: DEFAULT_FORM_KEY.to_string(),
        }
    }
}

impl FormDefaults {
    /// Create the stock defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse defaults from JSON; missing keys keep their stock values.
    pub fn from_json(text: &str) -> ConfigResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Set the layout name.
    #[must_use]
    pub fn layout(mut self, layout: impl Into<String>) -> Self {
        self.layout = layout.into();
        self
    }

    /// Set the label span.
    #[must_use]
    pub fn label_span(mut self, span: i64) -> Self {
        self.label_span = span;
        self
    }

    /// Show or hide labels.
    #[must_use]
    pub fn show_labels(mut self, show: bool) -> Self {
        self.show_labels = show;
        self
    }

    /// Toggle `novalidate` on form elements.
    #[must_use]
    pub fn novalidate(mut self, novalidate: bool) -> Self {
        self.novalidate = novalidate;
        self
    }

    /// Set the form-level message key.
    #[must_use]
    pub fn form_key(mut self, key: impl Into<String>) -> Self {
        self.form_key = key.into();
        self
    }
}
