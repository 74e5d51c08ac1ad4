#![forbid(unsafe_code)]

//! Runtime error type.

use formtree_core::ConfigError;

use crate::transport::TransportError;

/// Anything a form instance can fail with.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
