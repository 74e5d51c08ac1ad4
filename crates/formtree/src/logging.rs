#![forbid(unsafe_code)]

//! Optional `tracing-subscriber` setup for hosts without one.
//!
//! `RUST_LOG` wins when set; otherwise the configured default directive
//! applies.
//!
//! ```no_run
//! formtree::logging::LoggingConfig::new()
//!     .with_default_directive("formtree=debug")
//!     .install()
//!     .ok();
//! ```

use tracing_subscriber::EnvFilter;

/// Directive used when `RUST_LOG` is unset.
pub const DEFAULT_DIRECTIVE: &str = "formtree=warn";

/// Failure installing the subscriber.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoggingError {
    #[error("invalid filter directive: {0}")]
    Directive(String),
    #[error("a global subscriber is already installed: {0}")]
    AlreadyInstalled(String),
}

/// Subscriber settings.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    default_directive: String,
    show_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default_directive: DEFAULT_DIRECTIVE.into(),
            show_target: true,
        }
    }
}

impl LoggingConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_default_directive(mut self, directive: impl Into<String>) -> Self {
        self.default_directive = directive.into();
        self
    }

    #[must_use]
    pub fn show_target(mut self, show: bool) -> Self {
        self.show_target = show;
        self
    }

    /// The filter this configuration installs.
    pub fn filter(&self) -> Result<EnvFilter, LoggingError> {
        match EnvFilter::try_from_default_env() {
            Ok(filter) => Ok(filter),
            Err(_) => EnvFilter::try_new(&self.default_directive)
                .map_err(|err| LoggingError::Directive(err.to_string())),
        }
    }

    /// Install a global fmt subscriber.
    pub fn install(self) -> Result<(), LoggingError> {
        let filter = self.filter()?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(self.show_target)
            .try_init()
            .map_err(|err| LoggingError::AlreadyInstalled(err.to_string()))
    }
}
