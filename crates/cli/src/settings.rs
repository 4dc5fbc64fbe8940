//! Effective runtime settings after flags, env vars and profiles are merged.

use std::io::{self, IsTerminal};
use std::time::Duration;

use crate::args::GlobalArgs;
use crate::retry::RetryPolicy;

#[derive(Debug, Clone)]
pub struct Settings {
    pub url: String,
    pub timeout: Duration,
    pub retry: RetryPolicy,
    pub concurrency: usize,
    pub color: bool,
    pub debug: bool,
}

impl Settings {
    pub fn from_globals(globals: &GlobalArgs) -> anyhow::Result<Self> {
        validate_positive_u64("--timeout-secs", globals.timeout_secs)?;
        validate_positive_u64("--retries", u64::from(globals.retries))?;
        validate_positive_u64("--concurrency", globals.concurrency as u64)?;
        let url = normalize_url(&globals.url)?;

        Ok(Self {
            url,
            timeout: Duration::from_secs(globals.timeout_secs),
            retry: RetryPolicy {
                max_attempts: globals.retries,
                backoff: Duration::from_millis(globals.retry_backoff_ms),
            },
            concurrency: globals.concurrency,
            color: !globals.no_color && io::stdout().is_terminal(),
            debug: globals.debug,
        })
    }

    pub fn http_client(&self) -> anyhow::Result<reqwest::Client> {
        Ok(reqwest::Client::builder().timeout(self.timeout).build()?)
    }
}

fn validate_positive_u64(field: &str, value: u64) -> anyhow::Result<()> {
    if value == 0 {
        anyhow::bail!("{field} must be greater than zero");
    }
    Ok(())
}

fn normalize_url(raw: &str) -> anyhow::Result<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    let parsed = reqwest::Url::parse(trimmed)
        .map_err(|err| anyhow::anyhow!("invalid coordinator url '{raw}': {err}"))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        anyhow::bail!("coordinator url must use http or https, got '{raw}'");
    }
    Ok(trimmed.to_string())
}
