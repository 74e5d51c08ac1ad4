#![forbid(unsafe_code)]

//! Constraint validators for bound field values.
//!
//! A field spec declares constraints (`required`, `min`, `max`, `minlength`,
//! `maxlength`); the presenter registers them on the form state, and the state
//! asks these validators whether the current model value satisfies them.
//! Values are JSON values because the data model is JSON-shaped.
//!
//! Empty values only ever fail `required`: every other validator accepts an
//! empty value so a blank optional field is never reported twice.
//!
//! # Example
//!
//! ```rust
//! use formtree_core::validation::{MinLength, Required, Validator};
//! use serde_json::json;
//!
//! assert!(Required::new().validate(Some(&json!("hello"))).is_valid());
//! assert!(!Required::new().validate(Some(&json!("  "))).is_valid());
//! assert!(!MinLength::new(3).validate(Some(&json!("ab"))).is_valid());
//! ```

use std::cmp::Ordering;
use std::fmt;

use serde_json::Value;

use crate::display_value;
use crate::registry::FieldKind;

// ---------------------------------------------------------------------------
// Error Codes
// ---------------------------------------------------------------------------

/// Error code for a missing required value.
pub const ERROR_CODE_REQUIRED: &str = "required";
/// Error code for a value below its minimum.
pub const ERROR_CODE_MIN: &str = "min";
/// Error code for a value above its maximum.
pub const ERROR_CODE_MAX: &str = "max";
/// Error code for a value shorter than its minimum length.
pub const ERROR_CODE_MIN_LENGTH: &str = "minlength";
/// Error code for a value longer than its maximum length.
pub const ERROR_CODE_MAX_LENGTH: &str = "maxlength";
/// Error code for a value that does not parse as its field type.
pub const ERROR_CODE_INVALID: &str = "invalid";

// ---------------------------------------------------------------------------
// ConstraintKind
// ---------------------------------------------------------------------------

/// A declarative validation constraint a field spec may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ConstraintKind {
    Required,
    Min,
    Max,
    MinLength,
    MaxLength,
}

impl ConstraintKind {
    /// All constraints, in the order their message nodes are emitted.
    pub const ALL: [Self; 5] = [
        Self::Required,
        Self::Min,
        Self::Max,
        Self::MinLength,
        Self::MaxLength,
    ];

    /// Attribute name in field specs and markup.
    #[must_use]
    pub const fn attr(self) -> &'static str {
        match self {
            Self::Required => ERROR_CODE_REQUIRED,
            Self::Min => ERROR_CODE_MIN,
            Self::Max => ERROR_CODE_MAX,
            Self::MinLength => ERROR_CODE_MIN_LENGTH,
            Self::MaxLength => ERROR_CODE_MAX_LENGTH,
        }
    }

    /// Default message template; `{<attr>}` is replaced by the bound.
    #[must_use]
    pub const fn template(self) -> &'static str {
        match self {
            Self::Required => "This field is required",
            Self::Min => "Must be greater than {min}",
            Self::Max => "Must be less than {max}",
            Self::MinLength => "Too short, must be more than {minlength}",
            Self::MaxLength => "Too long, must be less than {maxlength}",
        }
    }

    /// Default message for this constraint with the given bound.
    #[must_use]
    pub fn default_message(self, bound: &Value) -> String {
        ValidationError::new(self.attr(), self.template())
            .with_param(self.attr(), display_value(bound))
            .message()
    }

    /// Check `value` against this constraint with the declared `bound`.
    ///
    /// Bounds that cannot be interpreted (a non-numeric `minlength`, say)
    /// never fail.
    #[must_use]
    pub fn check(self, bound: &Value, value: Option<&Value>) -> ValidationResult {
        match self {
            Self::Required => Required::new().validate(value),
            Self::Min => Min::new(bound.clone()).validate(value),
            Self::Max => Max::new(bound.clone()).validate(value),
            Self::MinLength => match as_length(bound) {
                Some(min) => MinLength::new(min).validate(value),
                None => ValidationResult::Valid,
            },
            Self::MaxLength => match as_length(bound) {
                Some(max) => MaxLength::new(max).validate(value),
                None => ValidationResult::Valid,
            },
        }
    }
}

impl fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.attr())
    }
}

// ---------------------------------------------------------------------------
// ValidationError, ValidationResult
// ---------------------------------------------------------------------------

/// A failed constraint: its code, the message template and the bound values
/// the template refers to as `{name}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Constraint attribute, or `invalid` for a type mismatch.
    pub code: &'static str,
    pub template: String,
    /// Template parameters in insertion order.
    pub params: Vec<(&'static str, String)>,
}

impl ValidationError {
    #[must_use]
    pub fn new(code: &'static str, template: impl Into<String>) -> Self {
        Self {
            code,
            template: template.into(),
            params: Vec::new(),
        }
    }

    /// Set a template parameter; a later value for the same name wins.
    #[must_use]
    pub fn with_param(mut self, name: &'static str, value: impl ToString) -> Self {
        let value = value.to_string();
        match self.params.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.params.push((name, value)),
        }
        self
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.as_str())
    }

    /// The template with every known `{name}` filled in.
    #[must_use]
    pub fn message(&self) -> String {
        self.params
            .iter()
            .fold(self.template.clone(), |text, (name, value)| {
                text.replace(&format!("{{{name}}}"), value)
            })
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

impl std::error::Error for ValidationError {}

/// Outcome of checking one value against one validator.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ValidationResult {
    #[default]
    Valid,
    Invalid(ValidationError),
}

impl ValidationResult {
    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    #[must_use]
    pub fn is_invalid(&self) -> bool {
        !self.is_valid()
    }
}

// ---------------------------------------------------------------------------
// Validator Trait
// ---------------------------------------------------------------------------

/// Validates an optional bound model value.
///
/// `None` means the model has no entry for the field yet.
pub trait Validator {
    /// Validate the given value.
    fn validate(&self, value: Option<&Value>) -> ValidationResult;

    /// Default error message template.
    fn error_message(&self) -> &str;
}

// ---------------------------------------------------------------------------
// Value helpers
// ---------------------------------------------------------------------------

/// Whether a model value counts as "not filled in".
///
/// Whitespace-only strings, empty arrays and an unchecked box are empty.
#[must_use]
pub fn is_empty(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) | Some(Value::Bool(false)) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(Value::Array(items)) => items.is_empty(),
        Some(_) => false,
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_length(bound: &Value) -> Option<usize> {
    as_number(bound)
        .filter(|n| n.is_finite() && *n >= 0.0)
        .map(|n| n as usize)
}

/// Order a value against a bound: numerically when both are numbers,
/// otherwise lexicographically when both are strings (ISO dates and times
/// sort correctly that way).
fn compare(value: &Value, bound: &Value) -> Option<Ordering> {
    if let (Some(a), Some(b)) = (as_number(value), as_number(bound)) {
        return a.partial_cmp(&b);
    }
    match (value, bound) {
        (Value::String(a), Value::String(b)) => Some(a.as_str().cmp(b.as_str())),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Built-in Validators
// ---------------------------------------------------------------------------

/// Validates that a value is filled in.
#[derive(Debug, Clone, Copy, Default)]
pub struct Required;

impl Required {
    /// Create a new `Required` validator.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Validator for Required {
    fn validate(&self, value: Option<&Value>) -> ValidationResult {
        if is_empty(value) {
            ValidationResult::Invalid(ValidationError::new(
                ERROR_CODE_REQUIRED,
                ConstraintKind::Required.template(),
            ))
        } else {
            ValidationResult::Valid
        }
    }

    fn error_message(&self) -> &str {
        ConstraintKind::Required.template()
    }
}

/// Validates that a value has at least `min` characters.
#[derive(Debug, Clone, Copy)]
pub struct MinLength {
    /// Minimum number of characters.
    pub min: usize,
}

impl MinLength {
    /// Create a new `MinLength` validator.
    #[must_use]
    pub fn new(min: usize) -> Self {
        Self { min }
    }
}

impl Validator for MinLength {
    fn validate(&self, value: Option<&Value>) -> ValidationResult {
        if is_empty(value) {
            return ValidationResult::Valid;
        }
        let len = value.map_or(0, |v| display_value(v).chars().count());
        if len < self.min {
            ValidationResult::Invalid(
                ValidationError::new(ERROR_CODE_MIN_LENGTH, self.error_message())
                    .with_param("minlength", self.min)
                    .with_param("actual", len),
            )
        } else {
            ValidationResult::Valid
        }
    }

    fn error_message(&self) -> &str {
        ConstraintKind::MinLength.template()
    }
}

/// Validates that a value has at most `max` characters.
#[derive(Debug, Clone, Copy)]
pub struct MaxLength {
    /// Maximum number of characters.
    pub max: usize,
}

impl MaxLength {
    /// Create a new `MaxLength` validator.
    #[must_use]
    pub fn new(max: usize) -> Self {
        Self { max }
    }
}

impl Validator for MaxLength {
    fn validate(&self, value: Option<&Value>) -> ValidationResult {
        if is_empty(value) {
            return ValidationResult::Valid;
        }
        let len = value.map_or(0, |v| display_value(v).chars().count());
        if len > self.max {
            ValidationResult::Invalid(
                ValidationError::new(ERROR_CODE_MAX_LENGTH, self.error_message())
                    .with_param("maxlength", self.max)
                    .with_param("actual", len),
            )
        } else {
            ValidationResult::Valid
        }
    }

    fn error_message(&self) -> &str {
        ConstraintKind::MaxLength.template()
    }
}

/// Validates that a value is not below a bound.
#[derive(Debug, Clone, PartialEq)]
pub struct Min {
    /// Inclusive lower bound.
    pub bound: Value,
}

impl Min {
    /// Create a new `Min` validator.
    #[must_use]
    pub fn new(bound: Value) -> Self {
        Self { bound }
    }
}

impl Validator for Min {
    fn validate(&self, value: Option<&Value>) -> ValidationResult {
        if is_empty(value) {
            return ValidationResult::Valid;
        }
        match value.and_then(|v| compare(v, &self.bound)) {
            Some(Ordering::Less) => ValidationResult::Invalid(
                ValidationError::new(ERROR_CODE_MIN, self.error_message())
                    .with_param("min", display_value(&self.bound)),
            ),
            _ => ValidationResult::Valid,
        }
    }

    fn error_message(&self) -> &str {
        ConstraintKind::Min.template()
    }
}

/// Validates that a value is not above a bound.
#[derive(Debug, Clone, PartialEq)]
pub struct Max {
    /// Inclusive upper bound.
    pub bound: Value,
}

impl Max {
    /// Create a new `Max` validator.
    #[must_use]
    pub fn new(bound: Value) -> Self {
        Self { bound }
    }
}

impl Validator for Max {
    fn validate(&self, value: Option<&Value>) -> ValidationResult {
        if is_empty(value) {
            return ValidationResult::Valid;
        }
        match value.and_then(|v| compare(v, &self.bound)) {
            Some(Ordering::Greater) => ValidationResult::Invalid(
                ValidationError::new(ERROR_CODE_MAX, self.error_message())
                    .with_param("max", display_value(&self.bound)),
            ),
            _ => ValidationResult::Valid,
        }
    }

    fn error_message(&self) -> &str {
        ConstraintKind::Max.template()
    }
}

/// Validates that a value parses as its field type.
///
/// Only `email`, `url` and `number` carry a syntax; every other type accepts
/// any value.
#[derive(Debug, Clone, Copy)]
pub struct TypeCheck {
    /// Field type being checked.
    pub kind: FieldKind,
}

impl TypeCheck {
    /// Create a new `TypeCheck` validator.
    #[must_use]
    pub fn new(kind: FieldKind) -> Self {
        Self { kind }
    }

    fn accepts(&self, text: &str) -> bool {
        match self.kind {
            FieldKind::Email => looks_like_email(text),
            FieldKind::Url => looks_like_url(text),
            FieldKind::Number => text.parse::<f64>().is_ok_and(f64::is_finite),
            _ => true,
        }
    }
}

impl Validator for TypeCheck {
    fn validate(&self, value: Option<&Value>) -> ValidationResult {
        if is_empty(value) {
            return ValidationResult::Valid;
        }
        let text = value.map(display_value).unwrap_or_default();
        if self.accepts(text.trim()) {
            ValidationResult::Valid
        } else {
            ValidationResult::Invalid(
                ValidationError::new(ERROR_CODE_INVALID, self.error_message())
                    .with_param("type", self.kind),
            )
        }
    }

    fn error_message(&self) -> &str {
        "Not a valid {type}"
    }
}

/// Heuristic: text on both sides of a single `@`, dotted domain, TLD of two
/// or more characters.
fn looks_like_email(text: &str) -> bool {
    let Some((local, domain)) = text.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return false;
    }
    let parts: Vec<&str> = domain.split('.').collect();
    parts.len() > 1
        && parts.iter().all(|p| !p.is_empty())
        && parts.last().is_some_and(|tld| tld.len() >= 2)
}

/// Heuristic: `scheme://rest` with an alphabetic scheme and non-empty rest.
fn looks_like_url(text: &str) -> bool {
    let Some((scheme, rest)) = text.split_once("://") else {
        return false;
    };
    !scheme.is_empty()
        && scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        && scheme.starts_with(|c: char| c.is_ascii_alphabetic())
        && !rest.is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // -- ValidationError --

    fn message_of(result: ValidationResult) -> Option<String> {
        match result {
            ValidationResult::Valid => None,
            ValidationResult::Invalid(err) => Some(err.message()),
        }
    }

    #[test]
    fn message_fills_known_params() {
        let err = ValidationError::new("min", "Must be greater than {min}, not {actual}")
            .with_param("min", 5)
            .with_param("min", 6);
        assert_eq!(err.param("min"), Some("6"));
        assert_eq!(err.message(), "Must be greater than 6, not {actual}");
        assert_eq!(format!("{err}"), err.message());
    }

    // -- default messages --

    #[test]
    fn default_messages() {
        assert_eq!(
            ConstraintKind::Required.default_message(&json!(true)),
            "This field is required"
        );
        assert_eq!(
            ConstraintKind::Min.default_message(&json!(3)),
            "Must be greater than 3"
        );
        assert_eq!(
            ConstraintKind::Max.default_message(&json!("2020-01-01")),
            "Must be less than 2020-01-01"
        );
        assert_eq!(
            ConstraintKind::MinLength.default_message(&json!(4)),
            "Too short, must be more than 4"
        );
        assert_eq!(
            ConstraintKind::MaxLength.default_message(&json!(8)),
            "Too long, must be less than 8"
        );
    }

    // -- Required --

    #[test]
    fn required_rejects_empty_values() {
        let v = Required::new();
        assert!(v.validate(None).is_invalid());
        assert!(v.validate(Some(&json!(null))).is_invalid());
        assert!(v.validate(Some(&json!(""))).is_invalid());
        assert!(v.validate(Some(&json!("   "))).is_invalid());
        assert!(v.validate(Some(&json!(false))).is_invalid());
        assert!(v.validate(Some(&json!([]))).is_invalid());
    }

    #[test]
    fn required_accepts_filled_values() {
        let v = Required::new();
        assert!(v.validate(Some(&json!("x"))).is_valid());
        assert!(v.validate(Some(&json!(0))).is_valid());
        assert!(v.validate(Some(&json!(true))).is_valid());
        assert!(v.validate(Some(&json!(["a"]))).is_valid());
    }

    // -- lengths --

    #[test]
    fn lengths_count_characters() {
        assert!(MinLength::new(3).validate(Some(&json!("héé"))).is_valid());
        assert!(MinLength::new(3).validate(Some(&json!("hé"))).is_invalid());
        assert!(MaxLength::new(2).validate(Some(&json!("héé"))).is_invalid());
        assert!(MaxLength::new(3).validate(Some(&json!("héé"))).is_valid());
    }

    #[test]
    fn lengths_ignore_empty() {
        assert!(MinLength::new(3).validate(Some(&json!(""))).is_valid());
        assert!(MinLength::new(3).validate(None).is_valid());
    }

    #[test]
    fn unparsable_length_bound_never_fails() {
        assert!(
            ConstraintKind::MinLength
                .check(&json!("lots"), Some(&json!("a")))
                .is_valid()
        );
    }

    #[test]
    fn length_bound_may_be_numeric_string() {
        assert!(
            ConstraintKind::MaxLength
                .check(&json!("2"), Some(&json!("abc")))
                .is_invalid()
        );
    }

    // -- bounds --

    #[test]
    fn numeric_bounds() {
        assert!(Min::new(json!(5)).validate(Some(&json!(4))).is_invalid());
        assert!(Min::new(json!(5)).validate(Some(&json!("5"))).is_valid());
        assert!(Max::new(json!(5)).validate(Some(&json!(5.5))).is_invalid());
        assert!(Max::new(json!("10")).validate(Some(&json!(9))).is_valid());
    }

    #[test]
    fn date_bounds_compare_lexicographically() {
        let min = Min::new(json!("2020-01-01"));
        assert!(min.validate(Some(&json!("2019-12-31"))).is_invalid());
        assert!(min.validate(Some(&json!("2020-02-01"))).is_valid());
    }

    #[test]
    fn incomparable_bounds_pass() {
        assert!(Min::new(json!(5)).validate(Some(&json!("abc"))).is_valid());
    }

    #[test]
    fn min_error_carries_bound() {
        let result = Min::new(json!(5)).validate(Some(&json!(1)));
        assert_eq!(message_of(result).as_deref(), Some("Must be greater than 5"));
    }

    // -- TypeCheck --

    #[test]
    fn email_type() {
        let v = TypeCheck::new(FieldKind::Email);
        assert!(v.validate(Some(&json!("user@example.com"))).is_valid());
        assert!(v.validate(Some(&json!("user@example"))).is_invalid());
        assert!(v.validate(Some(&json!("@example.com"))).is_invalid());
        assert!(v.validate(Some(&json!("a@b@c.com"))).is_invalid());
        assert!(v.validate(Some(&json!(""))).is_valid());
    }

    #[test]
    fn url_type() {
        let v = TypeCheck::new(FieldKind::Url);
        assert!(v.validate(Some(&json!("https://example.com"))).is_valid());
        assert!(v.validate(Some(&json!("ftp://host/x"))).is_valid());
        assert!(v.validate(Some(&json!("example.com"))).is_invalid());
        assert!(v.validate(Some(&json!("://x"))).is_invalid());
    }

    #[test]
    fn number_type() {
        let v = TypeCheck::new(FieldKind::Number);
        assert!(v.validate(Some(&json!(3))).is_valid());
        assert!(v.validate(Some(&json!("3.5"))).is_valid());
        let err = v.validate(Some(&json!("three")));
        assert_eq!(message_of(err).as_deref(), Some("Not a valid number"));
    }

    #[test]
    fn free_text_types_accept_anything() {
        let v = TypeCheck::new(FieldKind::Text);
        assert!(v.validate(Some(&json!("anything at all"))).is_valid());
    }
}
