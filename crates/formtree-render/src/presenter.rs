#![forbid(unsafe_code)]

//! Validation error presenter.
//!
//! For each editable field the presenter copies the declared constraints onto
//! the bound control, registers them with the form state, and appends one
//! error container holding a message per constraint:
//!
//! ```text
//! <p class="text-danger form-error" data-show="email.$dirty && email.$invalid">
//!   {{formErrors.email}}
//!   <span data-show="email.$error.required">This field is required</span>
//!   ...
//! </p>
//! ```
//!
//! The container shows while the field is dirty and invalid and leads with
//! the field's entry in the form error map; each message shows while its own
//! constraint is violated. When the field declares no
//! constraint other than `required`, a catch-all message ("Not a valid
//! <type>") is added for invalidity that no declared constraint explains.

use formtree_core::node::Condition;
use formtree_core::{ConstraintKind, Content, FieldSpec, Node, display_value};
use serde_json::Value;

use crate::layout::RenderContext;

/// Class of the error container.
pub const ERROR_CLASS: &str = "text-danger form-error";

/// Wire constraints of `field` into `element` and append its error node.
///
/// The control is the first node of `element` bound to the field; the error
/// node is appended to `element` itself. Never fails: a field without a
/// bound control still gets its error node.
pub fn attach_errors(ctx: &mut RenderContext<'_>, field: &FieldSpec, element: &mut Node) {
    let name = field.name_str();
    let constraints = field.constraints();
    ctx.state
        .register_control(name, field.field_kind(), constraints.clone());

    let mut errors = Node::new("p")
        .with_class(ERROR_CLASS)
        .with_content(Content::FieldError(name.to_string()))
        .shown_when(Condition::DirtyAndInvalid(name.to_string()));

    let mut control = element.find_mut(|n| n.binding().is_some_and(|b| b.field == name));
    for (kind, bound) in &constraints {
        if let Some(control) = control.as_deref_mut() {
            control.set_attr(kind.attr(), attr_value(bound));
        }
        errors.push(
            Node::new("span")
                .shown_when(Condition::Violates {
                    field: name.to_string(),
                    constraint: *kind,
                })
                .with_text(error_message(field, *kind, bound)),
        );
    }

    let only_required = usize::from(field.is_required());
    if errors.children().len() == only_required {
        errors.push(
            Node::new("span")
                .shown_when(Condition::InvalidOtherwise(name.to_string()))
                .with_text(invalid_message(field)),
        );
    }
    element.push(errors);
}

/// Message for one violated constraint: override, then type default.
#[must_use]
pub fn error_message(field: &FieldSpec, kind: ConstraintKind, bound: &Value) -> String {
    field
        .constraint_message(kind)
        .map_or_else(|| kind.default_message(bound), str::to_string)
}

/// Message for a value that does not parse as its type.
#[must_use]
pub fn invalid_message(field: &FieldSpec) -> String {
    field
        .invalid_message
        .clone()
        .unwrap_or_else(|| format!("Not a valid {}", field.type_tag()))
}

/// Markup value of a constraint bound; `true` becomes an empty attribute.
fn attr_value(bound: &Value) -> String {
    match bound {
        Value::Bool(true) => String::new(),
        other => display_value(other),
    }
}
