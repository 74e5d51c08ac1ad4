#![forbid(unsafe_code)]

//! Payload encoding for form submissions.
//!
//! The bound model is encoded according to the form's `enctype`:
//!
//! | enctype | Payload | Explicit header |
//! |---------|---------|-----------------|
//! | none / anything else | JSON object | `application/json` |
//! | `application/x-www-form-urlencoded` | `k=v&...` | none |
//! | `multipart/form-data` | ordered parts | none |
//!
//! For the two form encodings the header is left to the transport so it can
//! add the charset or boundary itself.

use serde_json::{Map, Value};

use formtree_core::display_value;

pub const JSON: &str = "application/json";
pub const URL_ENCODED: &str = "application/x-www-form-urlencoded";
pub const MULTIPART: &str = "multipart/form-data";

/// How a model is put on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Json,
    UrlEncoded,
    Multipart,
}

impl Encoding {
    /// Encoding for a media type (parameters already stripped).
    #[must_use]
    pub fn from_content_type(content_type: Option<&str>) -> Self {
        match content_type {
            Some(URL_ENCODED) => Self::UrlEncoded,
            Some(MULTIPART) => Self::Multipart,
            _ => Self::Json,
        }
    }

    /// Header to send explicitly, if any.
    #[must_use]
    pub fn explicit_content_type(self) -> Option<&'static str> {
        match self {
            Self::Json => Some(JSON),
            Self::UrlEncoded | Self::Multipart => None,
        }
    }

    /// Encode `model`.
    #[must_use]
    pub fn encode(self, model: &Map<String, Value>) -> Payload {
        match self {
            Self::Json => Payload::Json(Value::Object(model.clone())),
            Self::UrlEncoded => {
                let mut form = url::form_urlencoded::Serializer::new(String::new());
                for (name, value) in fields(model) {
                    form.append_pair(&name, &value);
                }
                Payload::UrlEncoded(form.finish())
            }
            Self::Multipart => Payload::Multipart(
                fields(model)
                    .map(|(name, value)| Part { name, value })
                    .collect(),
            ),
        }
    }
}

/// One multipart form part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    pub name: String,
    pub value: String,
}

/// An encoded request body.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Empty,
    Json(Value),
    UrlEncoded(String),
    Multipart(Vec<Part>),
}

impl Payload {
    /// The JSON body, if this is one.
    #[must_use]
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(value) => Some(value),
            _ => None,
        }
    }
}

/// Flatten a model into name/value pairs: arrays repeat their name, `null`
/// is sent empty and nested objects as JSON text.
fn fields(model: &Map<String, Value>) -> impl Iterator<Item = (String, String)> + '_ {
    model.iter().flat_map(|(name, value)| {
        let values: Vec<String> = match value {
            Value::Array(items) => items.iter().map(display_value).collect(),
            other => vec![display_value(other)],
        };
        values.into_iter().map(move |v| (name.clone(), v))
    })
}
