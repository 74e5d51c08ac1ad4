#![forbid(unsafe_code)]

//! Declarative field specs.
//!
//! A [`FieldSpec`] is one node of the form tree as it arrives from the host,
//! usually as JSON. Keys follow the wire names (`showLabels`, `labelSpan`,
//! `requiredMessage`, ...). Constraint values are kept as raw JSON because a
//! spec may switch one off with `false` or `null`.

use serde::Deserialize;
use serde_json::Value;

use crate::config::FormDefaults;
use crate::display_value;
use crate::registry::FieldKind;
use crate::validation::ConstraintKind;

// ---------------------------------------------------------------------------
// FieldOption
// ---------------------------------------------------------------------------

/// One choice of a selection field.
///
/// Deserializes from a bare string (`"red"`) or an object
/// (`{"value": "r", "repr": "Red"}`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "RawOption")]
pub struct FieldOption {
    /// Submitted value.
    pub value: String,
    /// Display text; the value is shown when absent.
    pub repr: Option<String>,
}

impl FieldOption {
    /// Create an option whose display text is its value.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            repr: None,
        }
    }

    /// Set the display text.
    #[must_use]
    pub fn with_repr(mut self, repr: impl Into<String>) -> Self {
        self.repr = Some(repr.into());
        self
    }

    /// Text shown to the user.
    #[must_use]
    pub fn display(&self) -> &str {
        self.repr.as_deref().unwrap_or(&self.value)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawOption {
    Plain(String),
    Full {
        #[serde(default)]
        value: Value,
        #[serde(default)]
        repr: Option<String>,
    },
}

impl From<RawOption> for FieldOption {
    fn from(raw: RawOption) -> Self {
        match raw {
            RawOption::Plain(value) => Self::new(value),
            RawOption::Full { value, repr } => Self {
                value: display_value(&value),
                repr,
            },
        }
    }
}

// ---------------------------------------------------------------------------
// FieldSpec
// ---------------------------------------------------------------------------

/// A node in the declarative form tree.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FieldSpec {
    /// Field name, unique within its form; also the data model key.
    pub name: Option<String>,
    /// Type tag, resolved through the field type registry.
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// Markup id; generated on first render when absent.
    pub id: Option<String>,
    pub label: Option<String>,
    pub title: Option<String>,
    pub style: Option<String>,
    /// Data model binding key (forms only).
    pub model: Option<String>,
    /// Layout renderer name; inherited from the parent when unset.
    pub layout: Option<String>,
    /// Label visibility; inherited from the parent when unset.
    pub show_labels: Option<bool>,
    /// Horizontal label column span, number or numeric string.
    pub label_span: Option<Value>,
    pub placeholder: Option<String>,
    /// Initial value, seeded into the data model.
    pub value: Option<Value>,
    pub disabled: Option<bool>,
    /// Name of a registered click handler (buttons only).
    pub click: Option<String>,
    /// Choices for selection fields, in display order.
    pub options: Vec<FieldOption>,
    /// Nested fields (containers only).
    pub children: Option<Vec<FieldSpec>>,
    /// Selection fields accepting several values.
    pub multiple: Option<bool>,

    // Remote option blocks: target `{name, url}`, id key, name derivation,
    // request params.
    pub remote_options: Option<Value>,
    pub remote_options_id: Option<String>,
    pub remote_options_value: Option<Value>,
    pub remote_options_params: Option<Value>,

    // Validation constraints
    pub required: Option<Value>,
    pub min: Option<Value>,
    pub max: Option<Value>,
    pub minlength: Option<Value>,
    pub maxlength: Option<Value>,

    // Message overrides
    pub required_message: Option<String>,
    pub min_message: Option<String>,
    pub max_message: Option<String>,
    pub minlength_message: Option<String>,
    pub maxlength_message: Option<String>,
    pub invalid_message: Option<String>,

    // Form attributes
    pub action: Option<String>,
    pub method: Option<String>,
    pub enctype: Option<String>,
    pub apiname: Option<String>,
    pub target: Option<String>,
    pub autocomplete: Option<String>,
    #[serde(rename = "accept-charset")]
    pub accept_charset: Option<String>,
    pub novalidate: Option<bool>,
}

impl FieldSpec {
    /// Create a spec with a type tag and a name.
    #[must_use]
    pub fn new(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: Some(kind.into()),
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Parse a spec from JSON.
    pub fn from_json(text: &str) -> crate::ConfigResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Resolved field kind, `None` for unknown or missing tags.
    #[must_use]
    pub fn field_kind(&self) -> Option<FieldKind> {
        self.kind.as_deref().and_then(FieldKind::from_tag)
    }

    /// Declared type tag, empty when missing.
    #[must_use]
    pub fn type_tag(&self) -> &str {
        self.kind.as_deref().unwrap_or_default()
    }

    /// Field name, empty when missing.
    #[must_use]
    pub fn name_str(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }

    /// Label text, falling back to the name.
    #[must_use]
    pub fn label_text(&self) -> &str {
        self.label
            .as_deref()
            .or(self.name.as_deref())
            .unwrap_or_default()
    }

    /// Declared bound for a constraint, unless absent, `null` or `false`.
    #[must_use]
    pub fn constraint(&self, kind: ConstraintKind) -> Option<&Value> {
        let value = match kind {
            ConstraintKind::Required => self.required.as_ref(),
            ConstraintKind::Min => self.min.as_ref(),
            ConstraintKind::Max => self.max.as_ref(),
            ConstraintKind::MinLength => self.minlength.as_ref(),
            ConstraintKind::MaxLength => self.maxlength.as_ref(),
        };
        value.filter(|v| !matches!(v, Value::Null | Value::Bool(false)))
    }

    /// Every active constraint with its bound, in emission order.
    #[must_use]
    pub fn constraints(&self) -> Vec<(ConstraintKind, Value)> {
        ConstraintKind::ALL
            .into_iter()
            .filter_map(|kind| self.constraint(kind).map(|bound| (kind, bound.clone())))
            .collect()
    }

    /// Whether the field is required.
    #[must_use]
    pub fn is_required(&self) -> bool {
        self.constraint(ConstraintKind::Required).is_some()
    }

    /// Per-field message override for a constraint.
    #[must_use]
    pub fn constraint_message(&self, kind: ConstraintKind) -> Option<&str> {
        match kind {
            ConstraintKind::Required => self.required_message.as_deref(),
            ConstraintKind::Min => self.min_message.as_deref(),
            ConstraintKind::Max => self.max_message.as_deref(),
            ConstraintKind::MinLength => self.minlength_message.as_deref(),
            ConstraintKind::MaxLength => self.maxlength_message.as_deref(),
        }
    }

    /// Name of the remote option target, when one is attached.
    #[must_use]
    pub fn remote_target_name(&self) -> Option<&str> {
        self.remote_options.as_ref()?.get("name")?.as_str()
    }

    /// Declared label span as a number.
    #[must_use]
    pub fn label_span(&self) -> Option<i64> {
        match self.label_span.as_ref()? {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Nested children, empty for leaves.
    #[must_use]
    pub fn children(&self) -> &[FieldSpec] {
        self.children.as_deref().unwrap_or_default()
    }

    /// Append a child.
    #[must_use]
    pub fn with_child(mut self, child: FieldSpec) -> Self {
        self.children.get_or_insert_with(Vec::new).push(child);
        self
    }

    /// Mark the field required.
    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = Some(Value::Bool(true));
        self
    }

    /// Set the label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

// ---------------------------------------------------------------------------
// Inherited
// ---------------------------------------------------------------------------

/// Presentation options a container hands down to its children.
///
/// Each level resolves its own record from the parent's: values the field
/// declares win, everything else is taken from the parent. The parent record
/// is never modified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inherited {
    pub layout: String,
    pub show_labels: bool,
    pub label_span: i64,
    pub novalidate: bool,
}

impl Inherited {
    /// Root record built from form defaults.
    #[must_use]
    pub fn from_defaults(defaults: &FormDefaults) -> Self {
        Self {
            layout: defaults.layout.clone(),
            show_labels: defaults.show_labels,
            label_span: defaults.label_span,
            novalidate: defaults.novalidate,
        }
    }

    /// Record for `field`: its own options where set, ours otherwise.
    #[must_use]
    pub fn resolve(&self, field: &FieldSpec) -> Self {
        Self {
            layout: field.layout.clone().unwrap_or_else(|| self.layout.clone()),
            show_labels: field.show_labels.unwrap_or(self.show_labels),
            label_span: field.label_span().unwrap_or(self.label_span),
            novalidate: field.novalidate.unwrap_or(self.novalidate),
        }
    }
}

impl Default for Inherited {
    fn default() -> Self {
        Self::from_defaults(&FormDefaults::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn parses_wire_names() {
        let spec = FieldSpec::from_json(
            r#"{
                "type": "text", "name": "email", "showLabels": false, "labelSpan": "3",
                "requiredMessage": "We need this", "minlength": 2, "accept-charset": "utf-8"
            }"#,
        )
        .unwrap();
        assert_eq!(spec.field_kind(), Some(FieldKind::Text));
        assert_eq!(spec.show_labels, Some(false));
        assert_eq!(spec.label_span(), Some(3));
        assert_eq!(
            spec.constraint_message(ConstraintKind::Required),
            Some("We need this")
        );
        assert_eq!(spec.constraint(ConstraintKind::MinLength), Some(&json!(2)));
        assert_eq!(spec.accept_charset.as_deref(), Some("utf-8"));
    }

    #[test]
    fn false_and_null_constraints_are_absent() {
        let spec =
            FieldSpec::from_json(r#"{"type": "text", "required": false, "max": null, "min": 0}"#)
                .unwrap();
        assert!(!spec.is_required());
        assert_eq!(spec.constraint(ConstraintKind::Max), None);
        assert_eq!(spec.constraints(), vec![(ConstraintKind::Min, json!(0))]);
    }

    #[test]
    fn string_options_normalize() {
        let spec = FieldSpec::from_json(
            r#"{"type": "select", "options": ["a", {"value": 2, "repr": "Two"}, {"value": "c"}]}"#,
        )
        .unwrap();
        assert_eq!(
            spec.options,
            vec![
                FieldOption::new("a"),
                FieldOption::new("2").with_repr("Two"),
                FieldOption::new("c"),
            ]
        );
        assert_eq!(spec.options[0].display(), "a");
        assert_eq!(spec.options[1].display(), "Two");
    }

    #[test]
    fn remote_option_blocks() {
        let spec = FieldSpec::from_json(
            r#"{"type": "select", "name": "group", "multiple": true,
                "remoteOptions": {"name": "groups", "url": "/api"},
                "remoteOptionsValue": {"type": "formatString", "source": "{name}"}}"#,
        )
        .unwrap();
        assert_eq!(spec.remote_target_name(), Some("groups"));
        assert_eq!(spec.multiple, Some(true));
        assert!(spec.remote_options_value.is_some());
        assert_eq!(FieldSpec::new("select", "x").remote_target_name(), None);
    }

    #[test]
    fn unknown_type_resolves_to_none() {
        let spec = FieldSpec::new("signature", "sig");
        assert_eq!(spec.field_kind(), None);
        assert_eq!(spec.type_tag(), "signature");
    }

    #[test]
    fn label_falls_back_to_name() {
        assert_eq!(FieldSpec::new("text", "city").label_text(), "city");
        assert_eq!(
            FieldSpec::new("text", "city").with_label("City").label_text(),
            "City"
        );
    }

    #[test]
    fn children_accessors() {
        let spec = FieldSpec::new("fieldset", "fs").with_child(FieldSpec::new("text", "a"));
        assert_eq!(spec.children().len(), 1);
        assert!(FieldSpec::new("text", "a").children().is_empty());
    }

    #[test]
    fn inherited_fills_only_unset_options() {
        let parent = Inherited {
            layout: "horizontal".into(),
            show_labels: false,
            label_span: 4,
            novalidate: true,
        };
        let mut child = FieldSpec::new("text", "a");
        child.show_labels = Some(true);
        let resolved = parent.resolve(&child);
        assert_eq!(resolved.layout, "horizontal");
        assert!(resolved.show_labels);
        assert_eq!(resolved.label_span, 4);
        // the parent record is untouched
        assert!(!parent.show_labels);
    }
}
