#![forbid(unsafe_code)]

//! Rendering: layouts, the validation error presenter and the form builder.
//!
//! ```rust
//! use formtree_render::FormBuilder;
//!
//! let built = FormBuilder::new()
//!     .build(r#"{"field": {"type": "form", "children": [
//!         {"type": "email", "name": "email", "required": true},
//!         {"type": "submit", "name": "save"}
//!     ]}}"#)
//!     .unwrap();
//! assert_eq!(built.node.tag(), "form");
//! assert!(built.state.is_form_invalid());
//! ```

pub mod builder;
pub mod handlers;
pub mod layout;
pub mod presenter;

pub use builder::{BuiltForm, DEFAULT_FORM_NAME, FormBuilder};
pub use handlers::{CheckFn, ClickFn, ClickHandlers};
pub use layout::{
    HorizontalLayout, InlineLayout, LayoutRegistry, LayoutRenderer, LayoutStyle, RenderContext,
    StandardLayout, clamp_label_span, render_field,
};
pub use presenter::attach_errors;
