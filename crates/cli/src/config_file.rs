//! Connector config files on disk.
//!
//! Two layouts are accepted: a flat map of config keys, or an envelope with a
//! `name` and a nested `config` map. A flat map drops its `name` entry, and a
//! `config` that is not an object is just another flat key. Values are
//! coerced to strings.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use common::api::ValidationResponse;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::api::ConfigMap;
use crate::pipeline::ApplyResult;

const CONNECTOR_CLASS_KEY: &str = "connector.class";

#[derive(Debug, Clone, Default)]
pub struct ConfigFile {
    pub file_name: PathBuf,
    pub connector_name: String,
    pub connector_class: String,
    /// Last dotted segment of the connector class.
    pub plugin_class: String,
    pub config: ConfigMap,
    pub warnings: Vec<String>,
    /// Read or parse failure; such a file is never sent anywhere.
    pub error: Option<String>,
    pub validation: Option<ValidationResponse>,
    /// Validation could not be performed.
    pub validation_error: Option<String>,
    pub apply: Option<ApplyResult>,
}

impl ConfigFile {
    pub fn read(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(raw) => Self::parse(path, &raw),
            Err(err) => Self::failed(path, format!("failed to read file: {err}")),
        }
    }

    pub fn parse(path: &Path, raw: &str) -> Self {
        let value: Value = match serde_json::from_str(raw) {
            Ok(value) => value,
            Err(err) => return Self::failed(path, format!("invalid JSON: {err}")),
        };
        let Value::Object(mut object) = value else {
            return Self::failed(path, "expected a JSON object".to_string());
        };

        let mut file = ConfigFile {
            file_name: path.to_path_buf(),
            connector_name: name_from_path(path),
            ..ConfigFile::default()
        };

        if let Some(name) = object.get("name").and_then(Value::as_str) {
            if name != file.connector_name {
                file.warn(format!(
                    "connector name [{name}] does not match file name [{}]",
                    file.connector_name
                ));
            }
            file.connector_name = name.to_string();
        }

        let entries = if let Some(Value::Object(nested)) = object.get_mut("config") {
            std::mem::take(nested)
        } else {
            object.remove("name");
            object
        };

        file.config = file.coerce_object(entries);
        file.connector_class = file
            .config
            .get(CONNECTOR_CLASS_KEY)
            .cloned()
            .unwrap_or_default();
        file.plugin_class = plugin_class(&file.connector_class).to_string();
        file
    }

    fn failed(path: &Path, error: String) -> Self {
        warn!(file = %path.display(), %error, "skipping config file");
        ConfigFile {
            file_name: path.to_path_buf(),
            connector_name: name_from_path(path),
            error: Some(error),
            ..ConfigFile::default()
        }
    }

    fn warn(&mut self, message: String) {
        warn!(file = %self.file_name.display(), "{message}");
        self.warnings.push(message);
    }

    fn coerce_object(&mut self, object: Map<String, Value>) -> ConfigMap {
        let mut config = ConfigMap::new();
        for (key, value) in object {
            match coerce_scalar(&value) {
                Some(value) => {
                    config.insert(key, value);
                }
                None => self.warn(format!("omitting key [{key}]: value is not a scalar")),
            }
        }
        config
    }

    pub fn is_readable(&self) -> bool {
        self.error.is_none()
    }

    /// Readable and accepted by the coordinator.
    pub fn is_valid(&self) -> bool {
        self.is_readable()
            && self.validation_error.is_none()
            && self
                .validation
                .as_ref()
                .is_some_and(ValidationResponse::is_valid)
    }
}

/// Part of the file name before the first `.`.
pub fn name_from_path(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy())
        .and_then(|name| name.split('.').next().map(str::to_string))
        .unwrap_or_default()
}

pub fn plugin_class(connector_class: &str) -> &str {
    connector_class.rsplit('.').next().unwrap_or(connector_class)
}

/// Strings pass through, booleans become `true`/`false` and numbers their
/// shortest decimal form (`2.0` becomes `2`). Null, arrays and objects have no
/// string form.
pub(crate) fn coerce_scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) if n.is_f64() => n.as_f64().map(|f| f.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Expands glob patterns in argument order. Patterns that match nothing are
/// reported and skipped.
pub fn expand_paths(patterns: &[String]) -> anyhow::Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for pattern in patterns {
        let matches: Vec<PathBuf> = glob::glob(pattern)
            .with_context(|| format!("invalid path pattern '{pattern}'"))?
            .filter_map(|entry| match entry {
                Ok(path) => Some(path),
                Err(err) => {
                    warn!(%pattern, error = %err, "unreadable path");
                    None
                }
            })
            .collect();

        if matches.is_empty() {
            warn!(%pattern, "no files found for path");
            continue;
        }
        debug!(%pattern, count = matches.len(), "expanded path");
        paths.extend(matches);
    }
    Ok(paths)
}

pub fn read_all(paths: &[PathBuf]) -> Vec<ConfigFile> {
    paths.iter().map(|path| ConfigFile::read(path)).collect()
}
