#![forbid(unsafe_code)]

//! Remote option loading for selection fields.
//!
//! A select field may declare that its options come from a paged API
//! collection. The loader owns a [`PaginationCursor`] for the target, appends
//! one [`RemoteOption`] per `result` record to the form's option list for that
//! target, and follows `next` links when configured as recursive.
//!
//! # State machine
//!
//! ```text
//! Idle ──load──▶ Loading ──ok──▶ Populated ──load_more──▶ Loading ...
//!                   │  ▲
//!                   │  └── next page (recursive)
//!                   └──err──▶ Failed
//! ```
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | `RemoteOptions` | target block missing or not JSON | loader not created |
//! | `UnknownApi` | directory cannot resolve the target | `Failed`, logged |
//! | transport error | server error or no answer | `Failed`, callback gets the error, placeholder stays |

use std::fmt;

use serde::Deserialize;
use serde_json::{Map, Value};

use formtree_core::logging::{TARGET_REMOTE, debug, warn};
use formtree_core::{ConfigError, ConfigResult, FieldSpec, FormState, RemoteOption, display_value};

use crate::error::{RuntimeError, RuntimeResult};
use crate::pagination::PaginationCursor;
use crate::transport::{ApiDirectory, ApiResource, ApiTarget, TransportError};

/// Label of the placeholder option while the first page loads.
pub const LOADING_LABEL: &str = "Loading...";

/// Label of the placeholder option of a single-value field once loaded.
pub const SELECT_LABEL: &str = "Please select...";

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// How an option's display name is derived from a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameSource {
    /// Value of one record field.
    Field(String),
    /// A template whose `{key}` placeholders are filled from the record.
    FormatString(String),
}

impl Default for NameSource {
    fn default() -> Self {
        Self::Field("id".into())
    }
}

impl NameSource {
    /// Display name for `record`.
    #[must_use]
    pub fn name_for(&self, record: &Value) -> String {
        match self {
            Self::Field(source) => record.get(source).map(display_value).unwrap_or_default(),
            Self::FormatString(template) => format_string(template, record),
        }
    }
}

#[derive(Deserialize)]
struct RawNameSource {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    source: Option<String>,
}

impl From<RawNameSource> for NameSource {
    fn from(raw: RawNameSource) -> Self {
        let source = raw.source.unwrap_or_else(|| "id".into());
        match raw.kind.as_deref() {
            Some("formatString") => Self::FormatString(source),
            _ => Self::Field(source),
        }
    }
}

#[derive(Deserialize)]
struct RawTarget {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    recursive: bool,
}

/// Parsed remote-options configuration of one field.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteOptionsConfig {
    /// Model key of the field the options feed.
    pub field: String,
    pub target: ApiTarget,
    /// Record key used as option id.
    pub id_key: String,
    pub name: NameSource,
    /// Query parameters of the first request.
    pub params: Map<String, Value>,
    /// Follow `next` links until exhausted.
    pub recursive: bool,
    /// The field accepts several values.
    pub multiple: bool,
}

impl RemoteOptionsConfig {
    /// A configuration with defaults for everything but the target.
    #[must_use]
    pub fn new(field: impl Into<String>, target: ApiTarget) -> Self {
        Self {
            field: field.into(),
            target,
            id_key: "id".into(),
            name: NameSource::default(),
            params: Map::new(),
            recursive: false,
            multiple: false,
        }
    }

    #[must_use]
    pub fn with_id_key(mut self, key: impl Into<String>) -> Self {
        self.id_key = key.into();
        self
    }

    #[must_use]
    pub fn with_name(mut self, name: NameSource) -> Self {
        self.name = name;
        self
    }

    #[must_use]
    pub fn with_params(mut self, params: Map<String, Value>) -> Self {
        self.params = params;
        self
    }

    #[must_use]
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    #[must_use]
    pub fn multiple(mut self, multiple: bool) -> Self {
        self.multiple = multiple;
        self
    }

    /// Parse the serialized blocks of a field: target (required), id key,
    /// name derivation and params. The target block may carry `recursive`.
    /// The id key is plain text; an empty one keeps the default.
    pub fn from_blocks(
        field: impl Into<String>,
        target: &str,
        id_key: Option<&str>,
        name: Option<&str>,
        params: Option<&str>,
    ) -> ConfigResult<Self> {
        let target: Value = parse_block("target", target)?;
        let mut config = Self::from_target(field, &target)?;
        if let Some(key) = id_key.map(str::trim).filter(|k| !k.is_empty()) {
            config.id_key = key.to_string();
        }
        if let Some(name) = name {
            config.name = name_source(&parse_block("name", name)?)?;
        }
        if let Some(params) = params {
            config.params = params_block(parse_block("params", params)?)?;
        }
        Ok(config)
    }

    /// Configuration declared on a field spec, `None` when the field has no
    /// remote options.
    pub fn from_field(field: &FieldSpec) -> ConfigResult<Option<Self>> {
        let Some(target) = &field.remote_options else {
            return Ok(None);
        };
        let mut config = Self::from_target(field.name_str(), target)?;
        if let Some(id) = &field.remote_options_id {
            config.id_key.clone_from(id);
        }
        if let Some(name) = &field.remote_options_value {
            config.name = name_source(name)?;
        }
        if let Some(params) = &field.remote_options_params {
            config.params = params_block(params.clone())?;
        }
        config.multiple = field.multiple.unwrap_or(false);
        Ok(Some(config))
    }

    fn from_target(field: impl Into<String>, target: &Value) -> ConfigResult<Self> {
        let raw: RawTarget = serde_json::from_value(target.clone())
            .map_err(|err| ConfigError::RemoteOptions(format!("target: {err}")))?;
        let name = raw
            .name
            .filter(|n| !n.is_empty())
            .ok_or_else(|| ConfigError::RemoteOptions("target has no name".into()))?;
        let target = ApiTarget {
            name,
            url: raw.url,
        };
        Ok(Self::new(field, target).recursive(raw.recursive))
    }
}

fn parse_block(which: &str, text: &str) -> ConfigResult<Value> {
    serde_json::from_str(text).map_err(|err| ConfigError::RemoteOptions(format!("{which}: {err}")))
}

fn name_source(block: &Value) -> ConfigResult<NameSource> {
    serde_json::from_value::<RawNameSource>(block.clone())
        .map(NameSource::from)
        .map_err(|err| ConfigError::RemoteOptions(format!("name: {err}")))
}

fn params_block(block: Value) -> ConfigResult<Map<String, Value>> {
    match block {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Map::new()),
        other => Err(ConfigError::RemoteOptions(format!(
            "params must be an object, got {other}"
        ))),
    }
}

/// Fill `{key}` placeholders from `record`. Unknown keys are left as written.
#[must_use]
pub fn format_string(template: &str, record: &Value) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find('}') {
            Some(close) => {
                let key = &after[..close];
                match record.get(key) {
                    Some(value) => out.push_str(&display_value(value)),
                    None => {
                        out.push('{');
                        out.push_str(key);
                        out.push('}');
                    }
                }
                rest = &after[close + 1..];
            }
            None => {
                out.push_str(&rest[open..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

// ---------------------------------------------------------------------------
// Loader
// ---------------------------------------------------------------------------

/// Where a loader stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoaderState {
    #[default]
    Idle,
    Loading,
    Populated,
    Failed,
}

/// Called after every page with the options it added, or the error.
pub type LoadCallback = Box<dyn FnMut(Result<&[RemoteOption], &RuntimeError>)>;

/// Loads the options of one select field.
pub struct RemoteOptionsLoader {
    config: RemoteOptionsConfig,
    cursor: PaginationCursor,
    state: LoaderState,
    pages: u32,
    placeholder_settled: bool,
    callback: Option<LoadCallback>,
}

impl fmt::Debug for RemoteOptionsLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteOptionsLoader")
            .field("config", &self.config)
            .field("cursor", &self.cursor)
            .field("state", &self.state)
            .field("pages", &self.pages)
            .finish_non_exhaustive()
    }
}

impl RemoteOptionsLoader {
    #[must_use]
    pub fn new(config: RemoteOptionsConfig) -> Self {
        let cursor = PaginationCursor::new(config.target.clone());
        Self {
            config,
            cursor,
            state: LoaderState::Idle,
            pages: 0,
            placeholder_settled: false,
            callback: None,
        }
    }

    #[must_use]
    pub fn with_callback(
        mut self,
        callback: impl FnMut(Result<&[RemoteOption], &RuntimeError>) + 'static,
    ) -> Self {
        self.callback = Some(Box::new(callback));
        self
    }

    /// Replace the page callback.
    pub fn set_callback(
        &mut self,
        callback: impl FnMut(Result<&[RemoteOption], &RuntimeError>) + 'static,
    ) {
        self.callback = Some(Box::new(callback));
    }

    #[must_use]
    pub fn config(&self) -> &RemoteOptionsConfig {
        &self.config
    }

    #[must_use]
    pub fn state(&self) -> LoaderState {
        self.state
    }

    #[must_use]
    pub fn cursor(&self) -> &PaginationCursor {
        &self.cursor
    }

    /// Pages loaded successfully.
    #[must_use]
    pub fn pages(&self) -> u32 {
        self.pages
    }

    /// Install the placeholder option and seed an empty model value.
    pub fn attach(&self, form: &mut FormState) {
        let options = form.remote_options_mut(&self.config.target.name);
        options.clear();
        options.push(RemoteOption::new("", LOADING_LABEL));
        if form.value(&self.config.field).is_none() {
            form.seed_value(self.config.field.clone(), Value::String(String::new()));
        }
    }

    /// Fetch the first page, then every further page when recursive.
    ///
    /// Returns the number of options added.
    pub async fn load<D: ApiDirectory>(
        &mut self,
        form: &mut FormState,
        directory: &D,
    ) -> RuntimeResult<usize> {
        let Some(target) = self.cursor.first_page() else {
            return Ok(0);
        };
        let params = self.config.params.clone();
        let mut added = self.fetch(target, &params, form, directory).await?;
        if self.config.recursive {
            while let Some(target) = self.cursor.recursive_page() {
                added += self.fetch(target, &Map::new(), form, directory).await?;
            }
        }
        Ok(added)
    }

    /// Fetch one more page on request.
    pub async fn load_more<D: ApiDirectory>(
        &mut self,
        form: &mut FormState,
        directory: &D,
    ) -> RuntimeResult<usize> {
        if let Some(target) = self.cursor.first_page() {
            let params = self.config.params.clone();
            return self.fetch(target, &params, form, directory).await;
        }
        match self.cursor.manual_page() {
            Some(target) => self.fetch(target, &Map::new(), form, directory).await,
            None => Ok(0),
        }
    }

    async fn fetch<D: ApiDirectory>(
        &mut self,
        target: ApiTarget,
        params: &Map<String, Value>,
        form: &mut FormState,
        directory: &D,
    ) -> RuntimeResult<usize> {
        self.state = LoaderState::Loading;
        debug!(target: TARGET_REMOTE, name = %target.name, url = ?target.url, "fetching options page");

        let Some(api) = directory.api(&target) else {
            let err = RuntimeError::from(ConfigError::UnknownApi(target.name.clone()).report());
            return Err(self.fail(err));
        };
        let response = match api.get(None, params).await {
            Ok(response) => response,
            Err(response) => {
                let err = RuntimeError::from(TransportError::from(response));
                warn!(target: TARGET_REMOTE, name = %target.name, error = %err, "options page failed");
                return Err(self.fail(err));
            }
        };

        let records = response
            .field("result")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();
        let fresh: Vec<RemoteOption> = records
            .iter()
            .map(|record| {
                RemoteOption::new(
                    record.get(&self.config.id_key).cloned().unwrap_or(Value::Null),
                    self.config.name.name_for(record),
                )
            })
            .collect();

        let options = form.remote_options_mut(&self.config.target.name);
        if !self.placeholder_settled {
            self.placeholder_settled = true;
            settle_placeholder(options, self.config.multiple);
        }
        options.extend(fresh.iter().cloned());

        self.pages += 1;
        self.state = LoaderState::Populated;
        self.cursor.update(response.data.as_ref());
        debug!(target: TARGET_REMOTE, name = %target.name, added = fresh.len(), "options page loaded");
        if let Some(callback) = self.callback.as_mut() {
            callback(Ok(&fresh));
        }
        Ok(fresh.len())
    }

    fn fail(&mut self, err: RuntimeError) -> RuntimeError {
        self.state = LoaderState::Failed;
        if let Some(callback) = self.callback.as_mut() {
            callback(Err(&err));
        }
        err
    }
}

fn settle_placeholder(options: &mut Vec<RemoteOption>, multiple: bool) {
    let Some(index) = options
        .iter()
        .position(|o| o.id == Value::String(String::new()) && o.name == LOADING_LABEL)
    else {
        return;
    };
    if multiple {
        options.remove(index);
    } else {
        options[index].name = SELECT_LABEL.into();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn format_string_interpolates() {
        let record = json!({"first": "Ada", "last": "Lovelace", "age": 36});
        assert_eq!(format_string("{first} {last} ({age})", &record), "Ada Lovelace (36)");
        assert_eq!(format_string("{missing}!", &record), "{missing}!");
        assert_eq!(format_string("open {brace", &record), "open {brace");
    }

    #[test]
    fn blocks_with_defaults() {
        let config =
            RemoteOptionsConfig::from_blocks("group", r#"{"name": "groups", "url": "/g"}"#, None, None, None)
                .unwrap();
        assert_eq!(config.target, ApiTarget::new("groups").with_url("/g"));
        assert_eq!(config.id_key, "id");
        assert_eq!(config.name, NameSource::Field("id".into()));
        assert!(config.params.is_empty());
        assert!(!config.recursive);
    }

    #[test]
    fn blocks_with_format_and_recursion() {
        let config = RemoteOptionsConfig::from_blocks(
            "group",
            r#"{"name": "groups", "recursive": true}"#,
            None,
            Some(r#"{"type": "formatString", "source": "{name} #{id}"}"#),
            Some(r#"{"limit": 50}"#),
        )
        .unwrap();
        assert!(config.recursive);
        assert_eq!(config.name, NameSource::FormatString("{name} #{id}".into()));
        assert_eq!(config.params["limit"], json!(50));
    }

    #[test]
    fn blocks_with_id_key() {
        let target = r#"{"name": "users"}"#;
        let config = RemoteOptionsConfig::from_blocks("owner", target, Some("uuid"), None, None)
            .unwrap();
        assert_eq!(config.id_key, "uuid");
        let blank = RemoteOptionsConfig::from_blocks("owner", target, Some("  "), None, None)
            .unwrap();
        assert_eq!(blank.id_key, "id");
    }

    #[test]
    fn bad_blocks_are_config_errors() {
        assert!(matches!(
            RemoteOptionsConfig::from_blocks("g", "{", None, None, None),
            Err(ConfigError::RemoteOptions(_))
        ));
        assert!(matches!(
            RemoteOptionsConfig::from_blocks("g", r#"{"url": "/g"}"#, None, None, None),
            Err(ConfigError::RemoteOptions(_))
        ));
        assert!(matches!(
            RemoteOptionsConfig::from_blocks("g", r#"{"name": "g"}"#, None, None, Some("[1]")),
            Err(ConfigError::RemoteOptions(_))
        ));
    }

    #[test]
    fn from_field_reads_spec_blocks() {
        let field: FieldSpec = serde_json::from_value(json!({
            "type": "select", "name": "owner", "multiple": true,
            "remoteOptions": {"name": "users", "url": "/users"},
            "remoteOptionsId": "pk",
            "remoteOptionsValue": {"type": "field", "source": "username"}
        }))
        .unwrap();
        let config = RemoteOptionsConfig::from_field(&field).unwrap().unwrap();
        assert_eq!(config.field, "owner");
        assert_eq!(config.id_key, "pk");
        assert_eq!(config.name, NameSource::Field("username".into()));
        assert!(config.multiple);
        assert_eq!(RemoteOptionsConfig::from_field(&FieldSpec::new("select", "x")).unwrap(), None);
    }

    #[test]
    fn attach_seeds_placeholder_and_model() {
        let mut form = FormState::new("form", "formModel", "f0001", "m__form");
        let loader = RemoteOptionsLoader::new(RemoteOptionsConfig::new("owner", ApiTarget::new("users")));
        loader.attach(&mut form);
        assert_eq!(form.remote_options("users"), &[RemoteOption::new("", LOADING_LABEL)]);
        assert_eq!(form.value("owner"), Some(&json!("")));

        form.seed_value("owner", json!("u7"));
        loader.attach(&mut form);
        assert_eq!(form.value("owner"), Some(&json!("u7")));
        assert_eq!(form.remote_options("users").len(), 1);
    }

    #[test]
    fn placeholder_settles_per_multiplicity() {
        let mut single = vec![RemoteOption::new("", LOADING_LABEL)];
        settle_placeholder(&mut single, false);
        assert_eq!(single, vec![RemoteOption::new("", SELECT_LABEL)]);
        let mut multi = vec![RemoteOption::new("", LOADING_LABEL)];
        settle_placeholder(&mut multi, true);
        assert!(multi.is_empty());
    }
}
