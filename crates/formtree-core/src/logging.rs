#![forbid(unsafe_code)]

//! Logging support.
//!
//! All formtree crates log through `tracing`. This module re-exports the
//! macros so downstream crates only need `formtree-core`, and names the
//! targets used for filtering.

pub use tracing::{debug, debug_span, error, info, info_span, trace, warn};

/// Target for form build events (initialization, layout dispatch, fallbacks).
pub const TARGET_BUILD: &str = "formtree::build";

/// Target for submission events.
pub const TARGET_SUBMIT: &str = "formtree::submit";

/// Target for remote option loading and pagination.
pub const TARGET_REMOTE: &str = "formtree::remote";
