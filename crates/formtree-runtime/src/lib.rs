#![forbid(unsafe_code)]

//! Runtime: submission, remote option loading and the form event driver.
//!
//! Network access goes through the [`Transport`] and [`ApiDirectory`]
//! collaborator traits; this crate never opens a connection itself. With the
//! `mock` feature, [`mock`] provides in-memory backends.
//!
//! ```rust
//! # #[cfg(feature = "mock")] {
//! use formtree_runtime::mock::{MockApi, MockTransport};
//! use formtree_runtime::transport::Response;
//! use formtree_runtime::{FormInstance, SubmitOutcome};
//! use formtree_render::FormBuilder;
//!
//! let mut form = FormInstance::from_builder(
//!     &FormBuilder::new(),
//!     r#"{"field": {"type": "form", "action": "/save", "children": [
//!         {"type": "text", "name": "title"}
//!     ]}}"#,
//! )
//! .unwrap();
//! let transport = MockTransport::new().with_response("/save", Ok(Response::from_status(200)));
//! let outcome = pollster::block_on(form.submit(&transport, &MockApi::new()));
//! assert_eq!(outcome, SubmitOutcome::Redirect("/".into()));
//! # }
//! ```

pub mod error;
pub mod instance;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod pagination;
pub mod payload;
pub mod remote;
pub mod submit;
pub mod transport;

pub use error::{RuntimeError, RuntimeResult};
pub use instance::{ClickOutcome, FormInstance};
pub use pagination::{NextLink, PaginationCursor};
pub use payload::{Encoding, Part, Payload};
pub use remote::{
    LoadCallback, LoaderState, NameSource, RemoteOptionsConfig, RemoteOptionsLoader,
    format_string,
};
pub use submit::{SubmitEvent, SubmitOutcome, process_form};
pub use transport::{
    ApiDirectory, ApiResource, ApiTarget, Method, NoApis, RequestOptions, Response, Transport,
    TransportError,
};
