#![forbid(unsafe_code)]

//! Collaborator interfaces for network access.
//!
//! The runtime never opens sockets. It shapes a [`RequestOptions`] for a
//! [`Transport`], or calls a named [`ApiResource`] resolved through an
//! [`ApiDirectory`], and interprets the [`Response`] it gets back. Both
//! success and failure carry a response; a failure without any server answer
//! has neither status nor body.
//!
//! Futures are not required to be `Send`: forms are driven from a single
//! thread.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::payload::Payload;

// ---------------------------------------------------------------------------
// Method
// ---------------------------------------------------------------------------

/// HTTP method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    /// Parse a declared method, case-insensitively.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_ascii_uppercase().as_str() {
            "GET" => Some(Self::Get),
            "POST" => Some(Self::Post),
            "PUT" => Some(Self::Put),
            "PATCH" => Some(Self::Patch),
            "DELETE" => Some(Self::Delete),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// RequestOptions / Response
// ---------------------------------------------------------------------------

/// One request for a [`Transport`].
#[derive(Debug, Clone, PartialEq)]
pub struct RequestOptions {
    pub url: String,
    pub method: Method,
    /// Body, already encoded for its content type.
    pub payload: Payload,
    /// Explicit `content-type` header. `None` leaves the header to the
    /// transport, which must compute it (and any boundary) itself.
    pub content_type: Option<String>,
}

/// A server answer, successful or not.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Response {
    /// HTTP status; `None` when no answer was received.
    pub status: Option<u16>,
    /// Decoded body, if any.
    pub data: Option<Value>,
}

impl Response {
    /// A response with a status and a JSON body.
    #[must_use]
    pub fn new(status: u16, data: Value) -> Self {
        Self {
            status: Some(status),
            data: Some(data),
        }
    }

    /// A response with a status and no body.
    #[must_use]
    pub fn from_status(status: u16) -> Self {
        Self {
            status: Some(status),
            data: None,
        }
    }

    /// A failure with no status and no body.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Body field, if the body is an object holding it.
    #[must_use]
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.data.as_ref()?.get(key)
    }
}

/// A failed request, as seen by callers that only need to know it failed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TransportError {
    /// The server answered with an error status.
    #[error("request failed with status {status}")]
    Status { status: u16, response: Response },
    /// No answer was received.
    #[error("request failed without a response")]
    NoResponse,
}

impl From<Response> for TransportError {
    fn from(response: Response) -> Self {
        match response.status {
            Some(status) => Self::Status { status, response },
            None if response.data.is_some() => Self::Status {
                status: 0,
                response,
            },
            None => Self::NoResponse,
        }
    }
}

// ---------------------------------------------------------------------------
// Collaborator traits
// ---------------------------------------------------------------------------

/// Raw HTTP access.
#[allow(async_fn_in_trait)]
pub trait Transport {
    /// Perform a request. `Err` carries the failure response.
    async fn request(&self, options: RequestOptions) -> Result<Response, Response>;
}

/// Names an API resource: `{name, url}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiTarget {
    pub name: String,
    #[serde(default)]
    pub url: Option<String>,
}

impl ApiTarget {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: None,
        }
    }

    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }
}

/// A named REST resource.
#[allow(async_fn_in_trait)]
pub trait ApiResource {
    /// Fetch `id` (or the collection when `None`) with query parameters.
    async fn get(&self, id: Option<&str>, params: &Map<String, Value>) -> Result<Response, Response>;

    /// Store a model.
    async fn put(&self, model: &Map<String, Value>) -> Result<Response, Response>;
}

/// Resolves API targets to resources.
pub trait ApiDirectory {
    type Resource: ApiResource;

    /// The resource for `target`, `None` when it cannot be resolved.
    fn api(&self, target: &ApiTarget) -> Option<Self::Resource>;
}

/// A directory that resolves nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoApis;

/// Resource type of [`NoApis`]; never constructed.
#[derive(Debug, Clone, Copy)]
pub enum NoResource {}

impl ApiResource for NoResource {
    async fn get(&self, _id: Option<&str>, _params: &Map<String, Value>) -> Result<Response, Response> {
        match *self {}
    }

    async fn put(&self, _model: &Map<String, Value>) -> Result<Response, Response> {
        match *self {}
    }
}

impl ApiDirectory for NoApis {
    type Resource = NoResource;

    fn api(&self, _target: &ApiTarget) -> Option<NoResource> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn method_parse_is_case_insensitive() {
        assert_eq!(Method::parse("post"), Some(Method::Post));
        assert_eq!(Method::parse(" Put "), Some(Method::Put));
        assert_eq!(Method::parse("brew"), None);
        assert_eq!(Method::Delete.to_string(), "DELETE");
    }

    #[test]
    fn transport_error_from_response() {
        assert_eq!(
            TransportError::from(Response::empty()),
            TransportError::NoResponse
        );
        let err = TransportError::from(Response::new(500, json!({"message": "boom"})));
        assert_eq!(err.to_string(), "request failed with status 500");
    }

    #[test]
    fn api_target_deserializes_without_url() {
        let target: ApiTarget = serde_json::from_value(json!({"name": "users"})).unwrap();
        assert_eq!(target, ApiTarget::new("users"));
    }

    #[test]
    fn no_apis_resolves_nothing() {
        assert!(NoApis.api(&ApiTarget::new("users")).is_none());
    }
}
