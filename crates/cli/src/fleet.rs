//! Point-in-time view of every connector on the coordinator.
//!
//! Connectors are fetched concurrently but ids are assigned from the sorted
//! name list, so ids are stable for an unchanged set of names.

use std::collections::BTreeMap;

use common::api::ConnectorState;
use futures_util::stream::{self, StreamExt};
use serde::Serialize;
use tracing::{debug, warn};

use crate::api::{ApiError, ConfigMap, DeployedConfig, FleetClient};
use crate::view::format::format_poll_interval;

const POLL_INTERVAL_KEY: &str = "poll.interval.ms";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Task {
    pub id: i32,
    pub state: ConnectorState,
    pub worker_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace: Option<String>,
    pub config: ConfigMap,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Connector {
    pub id: usize,
    pub name: String,
    pub state: ConnectorState,
    pub worker_id: String,
    pub config: ConfigMap,
    pub tasks: Vec<Task>,
}

impl Connector {
    pub fn connector_class(&self) -> &str {
        self.config
            .get("connector.class")
            .map(String::as_str)
            .unwrap_or_default()
    }

    /// Human readable `poll.interval.ms`, if the connector sets a numeric one.
    pub fn poll_interval(&self) -> Option<String> {
        let ms = self.config.get(POLL_INTERVAL_KEY)?.trim().parse::<u64>().ok()?;
        Some(format_poll_interval(ms))
    }

    pub fn failed_tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks
            .iter()
            .filter(|task| task.state == ConnectorState::Failed)
    }
}

/// Narrows a snapshot after ids have been assigned.
#[derive(Debug, Clone, Default)]
pub struct FleetFilter {
    pub state: Option<String>,
    pub name: Option<String>,
}

impl FleetFilter {
    pub fn is_empty(&self) -> bool {
        self.state.is_none() && self.name.is_none()
    }

    pub fn matches(&self, connector: &Connector) -> bool {
        if let Some(state) = &self.state
            && !connector.state.as_str().eq_ignore_ascii_case(state)
        {
            return false;
        }
        if let Some(name) = &self.name
            && !connector.name.contains(name.as_str())
        {
            return false;
        }
        true
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FleetSnapshot {
    connectors: BTreeMap<usize, Connector>,
}

impl FleetSnapshot {
    pub fn from_connectors(connectors: impl IntoIterator<Item = Connector>) -> Self {
        Self {
            connectors: connectors.into_iter().map(|c| (c.id, c)).collect(),
        }
    }

    pub fn get(&self, id: usize) -> Option<&Connector> {
        self.connectors.get(&id)
    }

    pub fn by_name(&self, name: &str) -> Option<&Connector> {
        self.connectors.values().find(|c| c.name == name)
    }

    /// Connectors in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Connector> {
        self.connectors.values()
    }

    pub fn len(&self) -> usize {
        self.connectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connectors.is_empty()
    }

    pub fn filtered(&self, filter: &FleetFilter) -> Self {
        if filter.is_empty() {
            return self.clone();
        }
        Self::from_connectors(self.iter().filter(|c| filter.matches(c)).cloned())
    }
}

/// Sorts names lexicographically and numbers them from zero.
pub fn assign_ids(mut names: Vec<String>) -> Vec<(usize, String)> {
    names.sort();
    names.dedup();
    names.into_iter().enumerate().collect()
}

/// Builds a snapshot with at most `concurrency` connectors in flight.
///
/// Only a failure to list names is fatal. A connector whose status, config or
/// tasks cannot be read is still included with whatever was retrieved.
pub async fn fetch_snapshot(
    client: &dyn FleetClient,
    concurrency: usize,
) -> Result<FleetSnapshot, ApiError> {
    let names = client.list_connector_names().await?;
    debug!(count = names.len(), "listing connectors");

    let connectors: Vec<Connector> = stream::iter(assign_ids(names))
        .map(|(id, name)| fetch_connector(client, id, name))
        .buffered(concurrency.max(1))
        .collect()
        .await;

    Ok(FleetSnapshot::from_connectors(connectors))
}

async fn fetch_connector(client: &dyn FleetClient, id: usize, name: String) -> Connector {
    let (status, config, task_configs) = tokio::join!(
        client.connector_status(&name),
        client.connector_config(&name),
        client.connector_tasks(&name),
    );

    let mut connector = Connector {
        id,
        name,
        state: ConnectorState::Other("UNKNOWN".to_string()),
        worker_id: String::new(),
        config: ConfigMap::new(),
        tasks: Vec::new(),
    };

    match config {
        Ok(DeployedConfig::Found(config)) => connector.config = config,
        Ok(DeployedConfig::Error(body)) => {
            warn!(connector = %connector.name, error = %body.message, "config unavailable");
        }
        Err(err) => warn!(connector = %connector.name, error = %err, "config unavailable"),
    }

    let mut task_configs = task_configs.unwrap_or_else(|err| {
        warn!(connector = %connector.name, error = %err, "task configs unavailable");
        BTreeMap::new()
    });

    match status {
        Ok(status) => {
            connector.state = status.connector.state;
            connector.worker_id = status.connector.worker_id;
            let mut tasks: Vec<Task> = status
                .tasks
                .into_iter()
                .map(|task| Task {
                    config: task_configs.remove(&task.id).unwrap_or_default(),
                    id: task.id,
                    state: task.state,
                    worker_id: task.worker_id,
                    trace: task.trace,
                })
                .collect();
            tasks.sort_by_key(|task| task.id);
            connector.tasks = tasks;
        }
        Err(err) => warn!(connector = %connector.name, error = %err, "status unavailable"),
    }

    connector
}
