#![forbid(unsafe_code)]

//! In-memory backends for tests and demos.
//!
//! [`MockTransport`] and [`MockApi`] answer per URL from queued responses and
//! record every request they see. A URL with nothing queued answers `404`.

use std::cell::RefCell;
use std::collections::{BTreeMap, VecDeque};
use std::rc::Rc;

use serde_json::{Map, Value};

use crate::transport::{
    ApiDirectory, ApiResource, ApiTarget, Method, RequestOptions, Response, Transport,
};

type Answer = Result<Response, Response>;

/// Queued answers per URL.
#[derive(Debug, Default)]
struct Routes {
    queued: RefCell<BTreeMap<String, VecDeque<Answer>>>,
}

impl Routes {
    fn push(&self, url: String, answer: Answer) {
        self.queued.borrow_mut().entry(url).or_default().push_back(answer);
    }

    fn answer(&self, url: &str) -> Answer {
        self.queued
            .borrow_mut()
            .get_mut(url)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| Err(Response::from_status(404)))
    }
}

// ---------------------------------------------------------------------------
// MockTransport
// ---------------------------------------------------------------------------

/// A [`Transport`] answering from queued responses.
#[derive(Debug, Default)]
pub struct MockTransport {
    routes: Routes,
    requests: RefCell<Vec<RequestOptions>>,
}

impl MockTransport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an answer for `url`.
    #[must_use]
    pub fn with_response(self, url: impl Into<String>, answer: Answer) -> Self {
        self.routes.push(url.into(), answer);
        self
    }

    /// Requests received so far, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<RequestOptions> {
        self.requests.borrow().clone()
    }
}

impl Transport for MockTransport {
    async fn request(&self, options: RequestOptions) -> Result<Response, Response> {
        let answer = self.routes.answer(&options.url);
        self.requests.borrow_mut().push(options);
        answer
    }
}

// ---------------------------------------------------------------------------
// MockApi
// ---------------------------------------------------------------------------

/// One call made on a [`MockResource`].
#[derive(Debug, Clone, PartialEq)]
pub struct ApiCall {
    pub method: Method,
    pub url: String,
    pub params: Map<String, Value>,
    pub body: Option<Value>,
}

#[derive(Debug, Default)]
struct ApiBackend {
    names: RefCell<BTreeMap<String, String>>,
    routes: Routes,
    calls: RefCell<Vec<ApiCall>>,
}

impl ApiBackend {
    fn call(&self, call: ApiCall) -> Answer {
        let answer = self.routes.answer(&call.url);
        self.calls.borrow_mut().push(call);
        answer
    }
}

/// An [`ApiDirectory`] of named resources with queued answers per URL.
#[derive(Debug, Clone, Default)]
pub struct MockApi {
    backend: Rc<ApiBackend>,
}

impl MockApi {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a resource name at a base URL.
    #[must_use]
    pub fn with_api(self, name: impl Into<String>, url: impl Into<String>) -> Self {
        self.backend.names.borrow_mut().insert(name.into(), url.into());
        self
    }

    /// Queue an answer for `url`.
    #[must_use]
    pub fn with_response(self, url: impl Into<String>, answer: Answer) -> Self {
        self.backend.routes.push(url.into(), answer);
        self
    }

    /// Calls received so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<ApiCall> {
        self.backend.calls.borrow().clone()
    }
}

impl ApiDirectory for MockApi {
    type Resource = MockResource;

    fn api(&self, target: &ApiTarget) -> Option<MockResource> {
        let base = self.backend.names.borrow().get(&target.name).cloned()?;
        Some(MockResource {
            url: target.url.clone().unwrap_or(base),
            backend: Rc::clone(&self.backend),
        })
    }
}

/// A resource handed out by [`MockApi`].
#[derive(Debug, Clone)]
pub struct MockResource {
    url: String,
    backend: Rc<ApiBackend>,
}

impl MockResource {
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl ApiResource for MockResource {
    async fn get(&self, id: Option<&str>, params: &Map<String, Value>) -> Result<Response, Response> {
        let url = match id {
            Some(id) => format!("{}/{id}", self.url.trim_end_matches('/')),
            None => self.url.clone(),
        };
        self.backend.call(ApiCall {
            method: Method::Get,
            url,
            params: params.clone(),
            body: None,
        })
    }

    async fn put(&self, model: &Map<String, Value>) -> Result<Response, Response> {
        self.backend.call(ApiCall {
            method: Method::Put,
            url: self.url.clone(),
            params: Map::new(),
            body: Some(Value::Object(model.clone())),
        })
    }
}
