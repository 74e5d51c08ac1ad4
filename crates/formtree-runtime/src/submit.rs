#![forbid(unsafe_code)]

//! Default submission handler.
//!
//! [`process_form`] is what a submit button without a `click` handler runs.
//! It validates, picks a target (explicit `action` URL or named API), sends
//! the model and folds the answer into the form's messages.
//!
//! # Failure Modes
//!
//! | Failure | Behavior |
//! |---------|----------|
//! | form invalid | every control marked dirty, nothing sent |
//! | `apiname` unresolvable | `UnknownApi` logged, submit aborted |
//! | no `action` and no `apiname` | `NoSubmitTarget` logged, submit aborted |
//! | server error | message under the form key, status resolved |
//!
//! There is no re-entrancy guard: two submits in flight both write their
//! outcome, last one wins.

use std::collections::BTreeMap;

use serde_json::Value;

use formtree_core::logging::{TARGET_SUBMIT, debug, warn};
use formtree_core::{ConfigError, FormMessage, FormState, display_value};

use crate::pagination::truthy;
use crate::payload::Encoding;
use crate::transport::{
    ApiDirectory, ApiResource, ApiTarget, Method, RequestOptions, Response, Transport,
};

/// Message set after an API submit answered `201`.
pub const CREATED_MESSAGE: &str = "Succesfully created";

/// Message set after any other successful API submit.
pub const UPDATED_MESSAGE: &str = "Succesfully updated";

/// Status reported when neither the response nor its body carries one.
pub const FALLBACK_STATUS: u16 = 501;

// ---------------------------------------------------------------------------
// SubmitEvent / SubmitOutcome
// ---------------------------------------------------------------------------

/// The DOM-like event that triggered a submit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubmitEvent {
    default_prevented: bool,
    propagation_stopped: bool,
}

impl SubmitEvent {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    #[must_use]
    pub fn is_default_prevented(&self) -> bool {
        self.default_prevented
    }

    #[must_use]
    pub fn is_propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }
}

/// What a submit did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The form was invalid; errors are now visible and nothing was sent.
    Invalid,
    /// Configuration prevented the submit.
    Aborted(ConfigError),
    /// The server answered with messages, now merged into the form.
    Messages,
    /// An API accepted the model.
    Saved { created: bool },
    /// A URL submit succeeded; the host should navigate here.
    Redirect(String),
    /// The server rejected the submit; messages describe why.
    Failed { status: u16 },
}

// ---------------------------------------------------------------------------
// process_form
// ---------------------------------------------------------------------------

enum Target<R> {
    Url(String),
    Api(R),
}

/// Validate and submit the form behind `state`.
pub async fn process_form<T, D>(
    state: &mut FormState,
    event: &mut SubmitEvent,
    transport: &T,
    directory: &D,
) -> SubmitOutcome
where
    T: Transport,
    D: ApiDirectory,
{
    event.prevent_default();
    event.stop_propagation();

    if state.is_form_invalid() {
        debug!(target: TARGET_SUBMIT, form = state.form_name(), "form invalid, showing errors");
        state.show_errors();
        return SubmitOutcome::Invalid;
    }

    let attrs = state.attrs().clone();
    let content_type = attrs.content_type();
    let mut api = None;
    if attrs.action.is_none() {
        if let Some(name) = &attrs.apiname {
            match directory.api(&ApiTarget::new(name.clone())) {
                Some(resource) => api = Some(resource),
                None => {
                    return SubmitOutcome::Aborted(ConfigError::UnknownApi(name.clone()).report());
                }
            }
        }
    }

    state.clear_messages();

    let target = match (attrs.action, api) {
        (Some(url), _) => Target::Url(url),
        (None, Some(resource)) => Target::Api(resource),
        (None, None) => return SubmitOutcome::Aborted(ConfigError::NoSubmitTarget.report()),
    };

    let via_api = matches!(target, Target::Api(_));
    let result = match target {
        Target::Url(url) => {
            let encoding = Encoding::from_content_type(content_type.as_deref());
            let method = attrs
                .method
                .as_deref()
                .and_then(Method::parse)
                .unwrap_or(Method::Post);
            debug!(target: TARGET_SUBMIT, %url, %method, ?encoding, "submitting form");
            transport
                .request(RequestOptions {
                    url,
                    method,
                    payload: encoding.encode(state.model()),
                    content_type: encoding.explicit_content_type().map(str::to_string),
                })
                .await
        }
        Target::Api(resource) => {
            debug!(target: TARGET_SUBMIT, api = attrs.apiname.as_deref(), "submitting form to api");
            resource.put(state.model()).await
        }
    };

    match result {
        Ok(response) => on_success(state, &response, via_api),
        Err(response) => on_failure(state, &response),
    }
}

fn on_success(state: &mut FormState, response: &Response, via_api: bool) -> SubmitOutcome {
    if let Some(messages) = response.field("messages").and_then(parse_messages) {
        state.add_messages(messages);
        return SubmitOutcome::Messages;
    }
    if via_api {
        let created = response.status == Some(201);
        let text = if created { CREATED_MESSAGE } else { UPDATED_MESSAGE };
        let key = state.form_key().to_string();
        state.set_messages(key, vec![FormMessage::info(text)]);
        return SubmitOutcome::Saved { created };
    }
    let redirect = response
        .field("redirect")
        .filter(|v| truthy(v))
        .map(display_value)
        .unwrap_or_else(|| "/".into());
    SubmitOutcome::Redirect(redirect)
}

fn on_failure(state: &mut FormState, response: &Response) -> SubmitOutcome {
    let body_status = response
        .field("status")
        .and_then(Value::as_u64)
        .and_then(|s| u16::try_from(s).ok())
        .filter(|s| *s != 0);
    let status = response
        .status
        .filter(|s| *s != 0)
        .or(body_status)
        .unwrap_or(FALLBACK_STATUS);
    warn!(target: TARGET_SUBMIT, status, "form submit failed");

    if let Some(messages) = response.field("messages").and_then(parse_messages) {
        state.add_messages(messages);
        return SubmitOutcome::Failed { status };
    }
    let message = match response.field("message").filter(|v| truthy(v)) {
        Some(message) => display_value(message),
        None => {
            let shown = response
                .field("status")
                .map(display_value)
                .unwrap_or_else(|| "undefined".into());
            format!("Server error ({shown})")
        }
    };
    let key = state.form_key().to_string();
    state.set_messages(key, vec![FormMessage::error(message)]);
    SubmitOutcome::Failed { status }
}

/// A `messages` body: groups of messages keyed by field name or form key.
fn parse_messages(value: &Value) -> Option<BTreeMap<String, Vec<FormMessage>>> {
    if !truthy(value) {
        return None;
    }
    match serde_json::from_value(value.clone()) {
        Ok(messages) => Some(messages),
        Err(err) => {
            warn!(target: TARGET_SUBMIT, error = %err, "ignoring malformed messages payload");
            None
        }
    }
}
