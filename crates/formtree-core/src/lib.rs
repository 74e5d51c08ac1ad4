#![forbid(unsafe_code)]

//! Core: declarative field specs, the field type registry, the rendered node
//! tree, live form state and constraint validators.
//!
//! Nothing in this crate performs I/O. Rendering lives in `formtree-render`,
//! submission and remote option loading in `formtree-runtime`.

pub mod config;
pub mod error;
pub mod field;
pub mod logging;
pub mod node;
pub mod registry;
pub mod state;
pub mod validation;

pub use config::FormDefaults;
pub use error::{ConfigError, ConfigResult};
pub use field::{FieldOption, FieldSpec, Inherited};
pub use node::{Binding, Condition, Content, Node, Rendered};
pub use registry::{Element, FieldInfo, FieldKind, lookup};
pub use state::{ClickAction, Control, FormAttrs, FormMessage, FormState, RemoteOption};
pub use validation::{ConstraintKind, ValidationError, ValidationResult, Validator};

// Re-export tracing macros at crate root for ergonomic use.
pub use logging::{debug, debug_span, error, info, info_span, trace, warn};

/// Render a JSON scalar the way it appears in markup and messages.
///
/// Strings are taken verbatim, `null` becomes the empty string and anything
/// else uses its JSON text.
#[must_use]
pub fn display_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}
