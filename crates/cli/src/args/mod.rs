use clap::{Args, Parser, Subcommand};

pub mod common;
pub mod profiles;

pub use self::common::*;
pub use self::profiles::*;

pub const DEFAULT_URL: &str = "http://localhost:8083";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_RETRIES: u32 = 3;
pub const DEFAULT_RETRY_BACKOFF_MS: u64 = 500;
pub const DEFAULT_CONCURRENCY: usize = 8;

#[derive(Debug, Parser)]
#[command(
    name = "connctl",
    version,
    about = "connctl - operate a fleet of Kafka Connect connectors"
)]
pub struct Cli {
    /// Name of the local profile to use (from ~/.config/connctl/config.toml).
    #[arg(long, global = true)]
    pub profile: Option<String>,

    #[command(flatten)]
    pub globals: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Args)]
pub struct GlobalArgs {
    /// Coordinator REST base URL, e.g. http://connect:8083
    #[arg(long, env = "CONNCTL_URL", default_value = DEFAULT_URL, global = true)]
    pub url: String,

    /// Per-request timeout in seconds.
    #[arg(
        long,
        env = "CONNCTL_TIMEOUT_SECS",
        default_value_t = DEFAULT_TIMEOUT_SECS,
        global = true
    )]
    pub timeout_secs: u64,

    /// Attempts per validate/apply call, including the first.
    #[arg(long, env = "CONNCTL_RETRIES", default_value_t = DEFAULT_RETRIES, global = true)]
    pub retries: u32,

    /// Base backoff between attempts in milliseconds.
    #[arg(
        long,
        env = "CONNCTL_RETRY_BACKOFF_MS",
        default_value_t = DEFAULT_RETRY_BACKOFF_MS,
        global = true
    )]
    pub retry_backoff_ms: u64,

    /// Connectors fetched concurrently when building a snapshot.
    #[arg(
        long,
        env = "CONNCTL_CONCURRENCY",
        default_value_t = DEFAULT_CONCURRENCY,
        global = true
    )]
    pub concurrency: usize,

    /// Enable debug logging.
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// Disable colored output.
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List connectors and their tasks.
    List(ListArgs),
    /// Compare config files with the deployed configs.
    Diff(PathArgs),
    /// Validate config files and apply them.
    Load(LoadArgs),
    /// Pause selected connectors.
    Pause(FilterArgs),
    /// Resume selected connectors.
    Resume(FilterArgs),
    /// Delete selected connectors.
    Delete(FilterArgs),
    /// Restart selected connectors and optionally their tasks.
    Restart(RestartArgs),
    /// Save or restore connector states.
    State {
        #[command(subcommand)]
        command: StateCommands,
    },
    /// Local profile management.
    Profile {
        #[command(subcommand)]
        command: ProfileCommands,
    },
}

#[derive(Debug, Subcommand)]
pub enum StateCommands {
    /// Print `name,state` for every connector.
    Show,
    /// Write `name,state` lines to a file.
    Save(StateSaveArgs),
    /// Pause or resume connectors to match a saved file.
    Set(StateSetArgs),
}
