use clap::{Args, Subcommand};

#[derive(Debug, Subcommand)]
pub enum ProfileCommands {
    /// List configured profiles.
    List,
    /// Show a single profile (defaults to the selected/default profile).
    Show(ProfileShowArgs),
    /// Create or update a profile.
    Set(ProfileSetArgs),
    /// Set the default profile name.
    SetDefault(ProfileSetDefaultArgs),
}

#[derive(Debug, Args)]
pub struct ProfileShowArgs {
    /// Profile name (defaults to selected/default profile).
    #[arg(long = "name", value_name = "NAME")]
    pub name: Option<String>,
}

#[derive(Debug, Args)]
pub struct ProfileSetDefaultArgs {
    /// Profile name to set as default.
    #[arg(long = "name", value_name = "NAME")]
    pub name: String,
}

#[derive(Debug, Args)]
pub struct ProfileSetArgs {
    /// Profile name to create/update.
    #[arg(long = "name", value_name = "NAME")]
    pub name: String,

    /// Coordinator REST base URL, e.g. http://connect:8083
    #[arg(long = "profile-url", value_name = "URL")]
    pub url: Option<String>,

    /// Per-request timeout in seconds.
    #[arg(long = "profile-timeout-secs", value_name = "SECS")]
    pub timeout_secs: Option<u64>,

    /// Attempts per validate/apply call.
    #[arg(long = "profile-retries", value_name = "N")]
    pub retries: Option<u32>,

    /// Base backoff between attempts in milliseconds.
    #[arg(long = "profile-retry-backoff-ms", value_name = "MS")]
    pub retry_backoff_ms: Option<u64>,

    /// Snapshot fetch concurrency.
    #[arg(long = "profile-concurrency", value_name = "N")]
    pub concurrency: Option<usize>,
}
