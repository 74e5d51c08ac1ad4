#![forbid(unsafe_code)]

//! formtree public facade crate.
//!
//! Re-exports the types most hosts need from the internal crates and offers
//! a prelude. Build a form from its serialized field tree, wire events to a
//! [`FormInstance`], and let the default submission handler talk to your
//! [`Transport`] or [`ApiDirectory`].
//!
//! ```rust
//! use formtree::prelude::*;
//!
//! let built = FormBuilder::new()
//!     .build(r#"{"field": {"type": "form", "layout": "horizontal", "children": [
//!         {"type": "text", "name": "city", "required": true}
//!     ]}}"#)
//!     .unwrap();
//! assert!(built.node.has_class("form-horizontal"));
//! ```

// --- Core re-exports -------------------------------------------------------

pub use formtree_core::{
    Binding, ClickAction, Condition, ConfigError, ConfigResult, ConstraintKind, Content, Element,
    FieldInfo, FieldKind, FieldOption, FieldSpec, FormAttrs, FormDefaults, FormMessage, FormState,
    Inherited, Node, RemoteOption, Rendered, ValidationError, ValidationResult, Validator, lookup,
};

// --- Render re-exports -----------------------------------------------------

pub use formtree_render::{
    BuiltForm, CheckFn, ClickFn, ClickHandlers, FormBuilder, HorizontalLayout, InlineLayout,
    LayoutRegistry, LayoutRenderer, LayoutStyle, RenderContext, StandardLayout,
};

// --- Runtime re-exports ----------------------------------------------------

#[cfg(feature = "runtime")]
pub use formtree_runtime::{
    ApiDirectory, ApiResource, ApiTarget, ClickOutcome, FormInstance, Method, NoApis,
    RemoteOptionsConfig, RemoteOptionsLoader, RequestOptions, Response, RuntimeError,
    SubmitOutcome, Transport, TransportError,
};

#[cfg(feature = "logging")]
pub mod logging;

// --- Errors ---------------------------------------------------------------

/// Top-level error type for formtree hosts.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// The form description or a collaborator is misconfigured.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// A submit or option load failed.
    #[cfg(feature = "runtime")]
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

/// Standard result type for formtree APIs.
pub type Result<T> = std::result::Result<T, Error>;

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        BuiltForm, ConfigError, Error, FieldSpec, FormBuilder, FormDefaults, FormMessage,
        FormState, Node, Result,
    };

    #[cfg(feature = "runtime")]
    pub use crate::{
        ApiDirectory, ApiTarget, ClickOutcome, FormInstance, Response, SubmitOutcome, Transport,
    };

    pub use crate::{core, render};

    #[cfg(feature = "runtime")]
    pub use crate::runtime;
}

pub use formtree_core as core;
pub use formtree_render as render;
#[cfg(feature = "runtime")]
pub use formtree_runtime as runtime;
