//! Coordinator REST API DTOs consumed by the fleet client.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle state reported for connectors and tasks.
///
/// The coordinator may report states beyond the recognised ones; those are
/// carried verbatim in [`ConnectorState::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ConnectorState {
    /// Running normally.
    Running,
    /// Paused by an operator.
    Paused,
    /// Failed; tasks usually carry a trace.
    Failed,
    /// Not yet assigned to a worker.
    Unassigned,
    /// Restart in progress.
    Restarting,
    /// Any other coordinator-defined state.
    Other(String),
}

impl ConnectorState {
    /// Returns the canonical uppercase representation.
    pub fn as_str(&self) -> &str {
        match self {
            ConnectorState::Running => "RUNNING",
            ConnectorState::Paused => "PAUSED",
            ConnectorState::Failed => "FAILED",
            ConnectorState::Unassigned => "UNASSIGNED",
            ConnectorState::Restarting => "RESTARTING",
            ConnectorState::Other(raw) => raw.as_str(),
        }
    }

    /// Parses a state string; unknown values are preserved.
    pub fn parse(raw: &str) -> Self {
        match raw {
            "RUNNING" => ConnectorState::Running,
            "PAUSED" => ConnectorState::Paused,
            "FAILED" => ConnectorState::Failed,
            "UNASSIGNED" => ConnectorState::Unassigned,
            "RESTARTING" => ConnectorState::Restarting,
            other => ConnectorState::Other(other.to_string()),
        }
    }
}

impl Default for ConnectorState {
    fn default() -> Self {
        ConnectorState::Other(String::new())
    }
}

impl From<String> for ConnectorState {
    fn from(raw: String) -> Self {
        ConnectorState::parse(&raw)
    }
}

impl From<ConnectorState> for String {
    fn from(state: ConnectorState) -> Self {
        state.as_str().to_string()
    }
}

impl fmt::Display for ConnectorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Response of `GET /connectors/{name}/status`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ConnectorStatusResponse {
    /// Connector name.
    #[serde(default)]
    pub name: String,
    /// Connector-level state.
    #[serde(default)]
    pub connector: ConnectorStateInfo,
    /// Task-level states.
    #[serde(default)]
    pub tasks: Vec<TaskStatusInfo>,
}

/// Connector-level state block of a status response.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ConnectorStateInfo {
    /// Lifecycle state.
    #[serde(default)]
    pub state: ConnectorState,
    /// Worker hosting the connector.
    #[serde(default)]
    pub worker_id: String,
}

/// Task entry of a status response.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TaskStatusInfo {
    /// Task id, unique within its connector.
    pub id: i32,
    /// Lifecycle state.
    #[serde(default)]
    pub state: ConnectorState,
    /// Worker hosting the task.
    #[serde(default)]
    pub worker_id: String,
    /// Stack trace, only present on failed tasks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace: Option<String>,
}

/// Entry of `GET /connectors/{name}/tasks`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskDescriptor {
    /// Composite task identifier.
    pub id: TaskRef,
    /// Effective task configuration.
    #[serde(default)]
    pub config: BTreeMap<String, String>,
}

/// Composite identifier of a task.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskRef {
    /// Owning connector.
    pub connector: String,
    /// Task id.
    pub task: i32,
}

/// Error payload returned by the coordinator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorBody {
    /// HTTP-like error code.
    pub error_code: i64,
    /// Human readable message.
    #[serde(default)]
    pub message: String,
}

impl ErrorBody {
    /// Whether the message reports a missing resource.
    pub fn is_not_found(&self) -> bool {
        self.message.contains("not found")
    }
}

/// Response of `PUT /connector-plugins/{plugin}/config/validate`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ValidationResponse {
    /// Plugin class the config was validated against.
    #[serde(default)]
    pub name: String,
    /// Number of errors across all fields; zero means valid.
    #[serde(default)]
    pub error_count: u32,
    /// Per-field validation entries.
    #[serde(default)]
    pub configs: Vec<ConfigValidation>,
}

impl ValidationResponse {
    /// `error_count == 0` is the sole authority for validity.
    pub fn is_valid(&self) -> bool {
        self.error_count == 0
    }

    /// Fields carrying at least one error, in response order.
    pub fn field_errors(&self) -> impl Iterator<Item = &ConfigValueInfo> {
        self.configs
            .iter()
            .map(|entry| &entry.value)
            .filter(|value| !value.errors.is_empty())
    }
}

/// Wrapper around a validated field.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ConfigValidation {
    /// Field result.
    #[serde(default)]
    pub value: ConfigValueInfo,
}

/// Validation result for one configuration field.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ConfigValueInfo {
    /// Field name.
    #[serde(default)]
    pub name: String,
    /// Errors reported for the field.
    #[serde(default)]
    pub errors: Vec<String>,
}
