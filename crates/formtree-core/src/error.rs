#![forbid(unsafe_code)]

//! Configuration error taxonomy.
//!
//! Configuration errors are fatal to one form or one field, never to the
//! process. Most call sites log them and degrade (fallback node, unwired
//! button, aborted submit) instead of propagating.
//!
//! # Failure Modes
//!
//! | Error | Cause | Behavior |
//! |-------|-------|----------|
//! | `MalformedAttribute` | field-tree attribute is not JSON | build aborted |
//! | `MissingField` | attribute lacks a `field` entry | build aborted |
//! | `UnknownLayout` | `layout` names no renderer | root: build aborted, child: fallback |
//! | `UnknownClickHandler` | `click` names no handler | button left unwired |
//! | `UnknownApi` | `apiname` cannot be resolved | submit aborted |
//! | `NoSubmitTarget` | neither `action` nor `apiname` | submit aborted |
//! | `ChildrenOnLeaf` | leaf field declares children | children ignored |
//! | `RemoteOptions` | bad remote-options block | loader not attached |

use crate::logging::{TARGET_BUILD, error};

/// A configuration problem in a form description or its collaborators.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// The serialized field-tree attribute could not be parsed.
    #[error("form attribute is not valid JSON: {0}")]
    MalformedAttribute(String),
    /// The field-tree attribute has no `field` entry.
    #[error("Form data does not contain field entry")]
    MissingField,
    /// A field selects a layout with no registered renderer.
    #[error("Layout \"{0}\" not available, cannot render form")]
    UnknownLayout(String),
    /// A button names a click handler that is not registered.
    #[error("Could not locate click function \"{0}\" for button")]
    UnknownClickHandler(String),
    /// A form names an API resource the directory cannot resolve.
    #[error("Could not find api url for {0}")]
    UnknownApi(String),
    /// A form has neither a submission URL nor an API name.
    #[error("Could not process form. No target or api")]
    NoSubmitTarget,
    /// A leaf field type declares children.
    #[error("field \"{field}\" of type \"{kind}\" cannot have children")]
    ChildrenOnLeaf {
        /// Field name (or label when unnamed).
        field: String,
        /// Declared type tag.
        kind: String,
    },
    /// A remote-options configuration block is missing or malformed.
    #[error("remote options: {0}")]
    RemoteOptions(String),
}

impl ConfigError {
    /// Log this error at the point it is swallowed and hand it back.
    pub fn report(self) -> Self {
        error!(target: TARGET_BUILD, error = %self, "configuration error");
        self
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        Self::MalformedAttribute(err.to_string())
    }
}

/// Result type for configuration-level operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    #[test]
    fn messages_match_log_text() {
        assert_eq!(
            ConfigError::NoSubmitTarget.to_string(),
            "Could not process form. No target or api"
        );
        assert_eq!(
            ConfigError::UnknownClickHandler("save".into()).to_string(),
            "Could not locate click function \"save\" for button"
        );
        assert_eq!(
            ConfigError::UnknownApi("users".into()).to_string(),
            "Could not find api url for users"
        );
    }

    #[test]
    fn json_errors_become_malformed_attribute() {
        let err: ConfigError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert!(matches!(err, ConfigError::MalformedAttribute(_)));
    }

    #[traced_test]
    #[test]
    fn report_logs_and_returns_self() {
        let err = ConfigError::MissingField.report();
        assert_eq!(err, ConfigError::MissingField);
        assert!(logs_contain("Form data does not contain field entry"));
    }
}
