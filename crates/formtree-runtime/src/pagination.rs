#![forbid(unsafe_code)]

//! Pagination cursor for paged API collections.
//!
//! A paged response body carries `last` and `next` links. The cursor keeps
//! the most recent pair and decides which URL to fetch next:
//!
//! - recursive loading follows `next` until the server reports it exhausted;
//! - a manual "load more" follows `next`, or `last` once `next` is exhausted.
//!
//! A `next` URL already fetched is never handed out again, so a server that
//! keeps pointing back at an earlier page cannot loop the loader.

use std::collections::BTreeSet;

use serde_json::Value;

use formtree_core::display_value;

use crate::transport::ApiTarget;

/// The `next` link of the last page seen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextLink {
    Url(String),
    /// The server sent a falsy `next`.
    Exhausted,
}

/// Tracks page links of one target.
#[derive(Debug, Clone)]
pub struct PaginationCursor {
    target: ApiTarget,
    last: Option<String>,
    next: Option<NextLink>,
    seen: BTreeSet<String>,
    started: bool,
}

impl PaginationCursor {
    #[must_use]
    pub fn new(target: ApiTarget) -> Self {
        Self {
            target,
            last: None,
            next: None,
            seen: BTreeSet::new(),
            started: false,
        }
    }

    /// The target as last fetched.
    #[must_use]
    pub fn target(&self) -> &ApiTarget {
        &self.target
    }

    #[must_use]
    pub fn last(&self) -> Option<&str> {
        self.last.as_deref()
    }

    #[must_use]
    pub fn next(&self) -> Option<&NextLink> {
        self.next.as_ref()
    }

    /// URLs handed out so far.
    #[must_use]
    pub fn seen(&self) -> &BTreeSet<String> {
        &self.seen
    }

    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.next == Some(NextLink::Exhausted)
    }

    /// Record the links of a page body. Bodies without a truthy `last` leave
    /// the cursor untouched; returns whether links were recorded.
    pub fn update(&mut self, body: Option<&Value>) -> bool {
        let Some(body) = body else {
            return false;
        };
        let Some(last) = body.get("last").filter(|v| truthy(v)) else {
            return false;
        };
        self.last = Some(display_value(last));
        self.next = Some(match body.get("next").filter(|v| truthy(v)) {
            Some(next) => NextLink::Url(display_value(next)),
            None => NextLink::Exhausted,
        });
        true
    }

    /// The first page; `None` once it has been handed out.
    pub fn first_page(&mut self) -> Option<ApiTarget> {
        if self.started {
            return None;
        }
        self.started = true;
        if let Some(url) = &self.target.url {
            self.seen.insert(url.clone());
        }
        Some(self.target.clone())
    }

    /// The page a recursive loader fetches next: an unseen `next` URL.
    pub fn recursive_page(&mut self) -> Option<ApiTarget> {
        match self.next.clone()? {
            NextLink::Url(url) => self.visit(url),
            NextLink::Exhausted => None,
        }
    }

    /// The page a manual "load more" fetches: an unseen `next`, or `last`
    /// once `next` is exhausted.
    pub fn manual_page(&mut self) -> Option<ApiTarget> {
        match self.next.clone()? {
            NextLink::Url(url) => self.visit(url),
            NextLink::Exhausted => {
                let last = self.last.clone()?;
                self.target.url = Some(last);
                Some(self.target.clone())
            }
        }
    }

    fn visit(&mut self, url: String) -> Option<ApiTarget> {
        if !self.seen.insert(url.clone()) {
            return None;
        }
        self.target.url = Some(url);
        Some(self.target.clone())
    }
}

/// JavaScript-style truthiness of a JSON value.
#[must_use]
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
