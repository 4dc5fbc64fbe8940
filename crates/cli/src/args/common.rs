use std::path::PathBuf;

use clap::Args;

use crate::fleet::FleetFilter;
use crate::ops::TaskFanout;

#[derive(Debug, Clone, Args)]
pub struct OutputFormatArgs {
    /// Emit JSON instead of a table.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Clone, Args)]
pub struct FilterArgs {
    /// Only connectors in this state (case-insensitive).
    #[arg(long, value_name = "STATE")]
    pub state: Option<String>,
    /// Only connectors whose name contains this text.
    #[arg(long, value_name = "SUBSTR")]
    pub name: Option<String>,
}

impl From<&FilterArgs> for FleetFilter {
    fn from(args: &FilterArgs) -> Self {
        FleetFilter {
            state: args.state.clone(),
            name: args.name.clone(),
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct ListArgs {
    #[command(flatten)]
    pub filter: FilterArgs,
    /// Show extra columns (poll interval).
    #[arg(long)]
    pub wide: bool,
    #[command(flatten)]
    pub output: OutputFormatArgs,
}

#[derive(Debug, Clone, Args)]
pub struct PathArgs {
    /// Config files or glob patterns, e.g. conf/*.json
    #[arg(required = true, value_name = "PATH")]
    pub paths: Vec<String>,
}

#[derive(Debug, Clone, Args)]
pub struct LoadArgs {
    #[command(flatten)]
    pub paths: PathArgs,
    /// Apply without asking for confirmation.
    #[arg(short, long)]
    pub yes: bool,
}

#[derive(Debug, Clone, Args)]
pub struct RestartArgs {
    #[command(flatten)]
    pub filter: FilterArgs,
    /// Also restart tasks in FAILED state.
    #[arg(long, conflicts_with = "all_tasks")]
    pub failed_tasks: bool,
    /// Also restart every task.
    #[arg(long)]
    pub all_tasks: bool,
    /// Restart tasks without restarting the connector itself.
    #[arg(long)]
    pub tasks_only: bool,
}

impl RestartArgs {
    pub fn fanout(&self) -> TaskFanout {
        TaskFanout::from_flags(self.failed_tasks, self.all_tasks, self.tasks_only)
    }
}

#[derive(Debug, Clone, Args)]
pub struct StateSaveArgs {
    /// Destination file (default ./connctl-state-<timestamp>).
    pub file: Option<PathBuf>,
}

#[derive(Debug, Clone, Args)]
pub struct StateSetArgs {
    /// File of `name,state` lines.
    pub file: PathBuf,
}
