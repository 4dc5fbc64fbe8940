//! Saving connector states and driving the fleet back to a saved file.
//!
//! The format is one `name,STATE` line per connector. Names are written as is,
//! so a name containing a comma does not survive a round trip.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::Context;
use chrono::{DateTime, SecondsFormat, Utc};
use common::api::ConnectorState;
use reqwest::StatusCode;
use tracing::{debug, info, warn};

use crate::api::{ControlVerb, FleetClient};
use crate::fleet::FleetSnapshot;

pub fn write_snapshot<W: Write + ?Sized>(fleet: &FleetSnapshot, out: &mut W) -> io::Result<()> {
    for connector in fleet.iter() {
        writeln!(out, "{},{}", connector.name, connector.state)?;
    }
    Ok(())
}

pub fn default_snapshot_path(now: DateTime<Utc>) -> PathBuf {
    PathBuf::from(format!(
        "./connctl-state-{}",
        now.to_rfc3339_opts(SecondsFormat::Secs, true)
    ))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileAction {
    Transitioned {
        from: ConnectorState,
        to: ConnectorState,
        result: Result<StatusCode, String>,
    },
    AlreadySatisfied(ConnectorState),
    /// The connector is neither running nor paused.
    NotReconcilable(ConnectorState),
    UnsupportedTarget(String),
    InvalidLine(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileEntry {
    pub line: usize,
    pub connector: Option<String>,
    pub action: ReconcileAction,
}

/// Pauses or resumes connectors until they match `target`. Lines naming
/// unknown connectors are skipped without an entry.
pub async fn reconcile<R: BufRead>(
    client: &dyn FleetClient,
    fleet: &FleetSnapshot,
    target: R,
) -> anyhow::Result<Vec<ReconcileEntry>> {
    let mut entries = Vec::new();

    for (index, line) in target.lines().enumerate() {
        let line_no = index + 1;
        let line = line.with_context(|| format!("failed to read state line {line_no}"))?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let fields: Vec<&str> = trimmed.split(',').map(str::trim).collect();
        let [name, desired] = fields.as_slice() else {
            warn!(
                line = line_no,
                content = trimmed,
                "state line could not be parsed, expected <connector>,<state>"
            );
            entries.push(ReconcileEntry {
                line: line_no,
                connector: None,
                action: ReconcileAction::InvalidLine(trimmed.to_string()),
            });
            continue;
        };

        let Some(connector) = fleet.by_name(name) else {
            debug!(connector = %name, "not in fleet, skipping");
            continue;
        };

        let current = connector.state.clone();
        let desired = ConnectorState::parse(desired);
        let verb = match desired {
            ConnectorState::Paused => Some(ControlVerb::Pause),
            ConnectorState::Running => Some(ControlVerb::Resume),
            _ => None,
        };

        let action = if !matches!(current, ConnectorState::Running | ConnectorState::Paused) {
            warn!(connector = %name, state = %current, "connector is not running or paused, skipping");
            ReconcileAction::NotReconcilable(current)
        } else if current == desired {
            debug!(connector = %name, state = %current, "already in desired state");
            ReconcileAction::AlreadySatisfied(current)
        } else if let Some(verb) = verb {
            transition(client, name, current, desired, verb).await
        } else {
            warn!(
                connector = %name,
                desired = %desired,
                current = %current,
                "unsupported desired state, skipping"
            );
            ReconcileAction::UnsupportedTarget(desired.to_string())
        };

        entries.push(ReconcileEntry {
            line: line_no,
            connector: Some(name.to_string()),
            action,
        });
    }

    Ok(entries)
}

async fn transition(
    client: &dyn FleetClient,
    name: &str,
    from: ConnectorState,
    to: ConnectorState,
    verb: ControlVerb,
) -> ReconcileAction {
    let result = client.control(name, verb).await.map_err(|err| err.to_string());
    match &result {
        Ok(_) => info!(connector = %name, state = %to, "setting connector state"),
        Err(err) => warn!(connector = %name, state = %to, error = %err, "failed to set state"),
    }
    ReconcileAction::Transitioned { from, to, result }
}
