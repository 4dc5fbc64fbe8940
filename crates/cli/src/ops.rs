//! Lifecycle operations over a selection of connectors.

use reqwest::StatusCode;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::api::{ApiError, ControlVerb, FleetClient};
use crate::fleet::{Connector, FleetSnapshot};
use crate::prompt::{Prompt, confirm};
use crate::selector::SelectionIntent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskFilter {
    /// Connector-level call only.
    #[default]
    None,
    Failed,
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TaskFanout {
    pub filter: TaskFilter,
    /// Skip the connector-level call.
    pub tasks_only: bool,
}

impl TaskFanout {
    /// `tasks_only` without a filter restarts failed tasks.
    pub fn from_flags(failed_tasks: bool, all_tasks: bool, tasks_only: bool) -> Self {
        let filter = if all_tasks {
            TaskFilter::All
        } else if failed_tasks || tasks_only {
            TaskFilter::Failed
        } else {
            TaskFilter::None
        };
        Self { filter, tasks_only }
    }

    fn selects(&self, connector: &Connector) -> Vec<i32> {
        match self.filter {
            TaskFilter::None => Vec::new(),
            TaskFilter::Failed => connector.failed_tasks().map(|task| task.id).collect(),
            TaskFilter::All => connector.tasks.iter().map(|task| task.id).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Pause,
    Resume,
    Delete,
    Restart(TaskFanout),
}

impl Operation {
    pub fn verb(&self) -> ControlVerb {
        match self {
            Operation::Pause => ControlVerb::Pause,
            Operation::Resume => ControlVerb::Resume,
            Operation::Delete => ControlVerb::Delete,
            Operation::Restart(_) => ControlVerb::Restart,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Operation::Pause => "pause",
            Operation::Resume => "resume",
            Operation::Delete => "delete",
            Operation::Restart(_) => "restart",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum OutcomeResult {
    Done {
        #[serde(serialize_with = "serialize_status")]
        status: StatusCode,
    },
    Failed {
        error: String,
    },
    NotFound,
}

fn serialize_status<S: serde::Serializer>(status: &StatusCode, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u16(status.as_u16())
}

impl OutcomeResult {
    fn from_call(result: Result<StatusCode, ApiError>) -> Self {
        match result {
            Ok(status) => OutcomeResult::Done { status },
            Err(err) => OutcomeResult::Failed {
                error: err.to_string(),
            },
        }
    }

    pub fn is_failure(&self) -> bool {
        !matches!(self, OutcomeResult::Done { .. })
    }
}

/// One control call, or one unresolved id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationOutcome {
    pub connector_id: usize,
    pub connector: Option<String>,
    pub task_id: Option<i32>,
    #[serde(flatten)]
    pub result: OutcomeResult,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionReport {
    Quit,
    Declined,
    Executed(Vec<OperationOutcome>),
}

/// Runs `op` against the selected connectors of `fleet`, best effort.
///
/// Selecting everything needs confirmation through `prompt`. Ids missing from
/// `fleet` are reported as not found and the rest still run.
pub async fn execute(
    client: &dyn FleetClient,
    op: Operation,
    selection: SelectionIntent,
    fleet: &FleetSnapshot,
    prompt: &mut dyn Prompt,
) -> anyhow::Result<ExecutionReport> {
    let ids: Vec<usize> = match selection {
        SelectionIntent::Quit => {
            debug!("selection quit, nothing to do");
            return Ok(ExecutionReport::Quit);
        }
        SelectionIntent::All => {
            let message = format!("{} all {} listed connector(s)?", op.name(), fleet.len());
            if !confirm(prompt, &message)? {
                return Ok(ExecutionReport::Declined);
            }
            fleet.iter().map(|connector| connector.id).collect()
        }
        SelectionIntent::Ids(ids) => ids,
    };

    let mut outcomes = Vec::new();
    for id in ids {
        match fleet.get(id) {
            Some(connector) => run_on_connector(client, op, connector, &mut outcomes).await,
            None => {
                warn!(id, "connector id not found");
                outcomes.push(OperationOutcome {
                    connector_id: id,
                    connector: None,
                    task_id: None,
                    result: OutcomeResult::NotFound,
                });
            }
        }
    }
    Ok(ExecutionReport::Executed(outcomes))
}

async fn run_on_connector(
    client: &dyn FleetClient,
    op: Operation,
    connector: &Connector,
    outcomes: &mut Vec<OperationOutcome>,
) {
    let verb = op.verb();
    let fanout = match op {
        Operation::Restart(fanout) => fanout,
        _ => TaskFanout::default(),
    };

    if !fanout.tasks_only {
        let result = OutcomeResult::from_call(client.control(&connector.name, verb).await);
        log_outcome(op, connector, None, &result);
        outcomes.push(OperationOutcome {
            connector_id: connector.id,
            connector: Some(connector.name.clone()),
            task_id: None,
            result,
        });
    }

    for task_id in fanout.selects(connector) {
        let result =
            OutcomeResult::from_call(client.control_task(&connector.name, task_id, verb).await);
        log_outcome(op, connector, Some(task_id), &result);
        outcomes.push(OperationOutcome {
            connector_id: connector.id,
            connector: Some(connector.name.clone()),
            task_id: Some(task_id),
            result,
        });
    }
}

fn log_outcome(op: Operation, connector: &Connector, task_id: Option<i32>, result: &OutcomeResult) {
    match result {
        OutcomeResult::Done { status } => info!(
            operation = op.name(),
            connector = %connector.name,
            task = ?task_id,
            %status,
            "operation accepted"
        ),
        OutcomeResult::Failed { error } => warn!(
            operation = op.name(),
            connector = %connector.name,
            task = ?task_id,
            %error,
            "operation failed"
        ),
        OutcomeResult::NotFound => {}
    }
}
