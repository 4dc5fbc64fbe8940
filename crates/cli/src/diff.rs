//! Key-wise comparison of desired configs against what the coordinator runs.

use std::collections::BTreeMap;

use futures_util::future::join_all;
use serde::Serialize;
use tracing::{debug, warn};

use crate::api::{ConfigMap, DeployedConfig, FleetClient};
use crate::config_file::ConfigFile;

pub const REDACTED: &str = "***redacted***";

const SECRET_KEY_MARKERS: [&str; 4] = [
    "connection.pass",
    "connection.user",
    "connection.url",
    "password",
];

pub fn is_secret_key(key: &str) -> bool {
    SECRET_KEY_MARKERS.iter().any(|marker| key.contains(marker))
}

pub fn redact(key: &str, value: &str) -> String {
    if is_secret_key(key) {
        REDACTED.to_string()
    } else {
        value.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Mismatch {
    pub deployed: String,
    pub file: String,
}

/// Every key of both sides lands in exactly one bucket. Values are already
/// redacted; classification used the raw values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConnectorDiff {
    pub connector: String,
    pub new_keys: BTreeMap<String, String>,
    pub match_keys: BTreeMap<String, String>,
    pub mismatch_keys: BTreeMap<String, Mismatch>,
    pub removed_keys: BTreeMap<String, String>,
}

impl ConnectorDiff {
    pub fn is_unchanged(&self) -> bool {
        self.new_keys.is_empty() && self.mismatch_keys.is_empty() && self.removed_keys.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffOutcome {
    New,
    Compared(ConnectorDiff),
    /// The deployed config could not be read for a reason other than absence.
    Excluded(String),
}

pub fn compare(connector: &str, desired: &ConfigMap, deployed: &ConfigMap) -> ConnectorDiff {
    let mut diff = ConnectorDiff {
        connector: connector.to_string(),
        ..ConnectorDiff::default()
    };

    for (key, file_value) in desired {
        match deployed.get(key) {
            None => {
                diff.new_keys.insert(key.clone(), redact(key, file_value));
            }
            Some(deployed_value) if deployed_value == file_value => {
                diff.match_keys.insert(key.clone(), redact(key, file_value));
            }
            Some(deployed_value) => {
                diff.mismatch_keys.insert(
                    key.clone(),
                    Mismatch {
                        deployed: redact(key, deployed_value),
                        file: redact(key, file_value),
                    },
                );
            }
        }
    }

    for (key, deployed_value) in deployed {
        if !desired.contains_key(key) {
            diff.removed_keys
                .insert(key.clone(), redact(key, deployed_value));
        }
    }

    diff
}

pub fn diff_config(connector: &str, desired: &ConfigMap, deployed: &DeployedConfig) -> DiffOutcome {
    match deployed {
        DeployedConfig::Found(deployed) => DiffOutcome::Compared(compare(connector, desired, deployed)),
        DeployedConfig::Error(body) if body.is_not_found() => DiffOutcome::New,
        DeployedConfig::Error(body) => DiffOutcome::Excluded(body.message.clone()),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExcludedConnector {
    pub connector: String,
    pub file: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DiffResults {
    pub new_connectors: Vec<String>,
    pub changed_connectors: Vec<ConnectorDiff>,
    pub unchanged_connectors: Vec<String>,
    /// Reported separately; never counted as new, changed or unchanged.
    pub excluded: Vec<ExcludedConnector>,
}

impl DiffResults {
    pub fn record(&mut self, connector: &str, outcome: DiffOutcome) {
        match outcome {
            DiffOutcome::New => self.new_connectors.push(connector.to_string()),
            DiffOutcome::Compared(diff) if diff.is_unchanged() => {
                self.unchanged_connectors.push(diff.connector)
            }
            DiffOutcome::Compared(diff) => self.changed_connectors.push(diff),
            DiffOutcome::Excluded(reason) => self.excluded.push(ExcludedConnector {
                connector: connector.to_string(),
                file: String::new(),
                reason,
            }),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.new_connectors.is_empty()
            && self.changed_connectors.is_empty()
            && self.unchanged_connectors.is_empty()
            && self.excluded.is_empty()
    }
}

/// Diffs every file against the coordinator. Lookups run concurrently;
/// results keep file order.
pub async fn diff_files(client: &dyn FleetClient, files: &[ConfigFile]) -> DiffResults {
    let lookups = files.iter().map(|file| async move {
        if let Some(error) = &file.error {
            return DiffOutcome::Excluded(error.clone());
        }
        match client.connector_config(&file.connector_name).await {
            Ok(deployed) => diff_config(&file.connector_name, &file.config, &deployed),
            Err(err) => DiffOutcome::Excluded(err.to_string()),
        }
    });
    let outcomes = join_all(lookups).await;

    let mut results = DiffResults::default();
    for (file, outcome) in files.iter().zip(outcomes) {
        match &outcome {
            DiffOutcome::New => debug!(connector = %file.connector_name, "connector does not exist"),
            DiffOutcome::Excluded(reason) => warn!(
                connector = %file.connector_name,
                file = %file.file_name.display(),
                %reason,
                "could not diff connector"
            ),
            DiffOutcome::Compared(_) => {}
        }
        results.record(&file.connector_name, outcome);
        if let Some(excluded) = results.excluded.last_mut()
            && excluded.connector == file.connector_name
            && excluded.file.is_empty()
        {
            excluded.file = file.file_name.display().to_string();
        }
    }
    results
}
