//! Validate-then-apply for a batch of config files.
//!
//! Unreadable files are reported but never validated or applied. Nothing is
//! applied unless every readable file validated cleanly. Apply failures are
//! isolated per file.

use futures_util::future::join_all;
use reqwest::StatusCode;
use tracing::{debug, info, warn};

use crate::api::FleetClient;
use crate::config_file::ConfigFile;
use crate::prompt::{Prompt, confirm};
use crate::retry::{RetryPolicy, with_retry};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyResult {
    Applied(StatusCode),
    Failed(String),
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LoadOptions {
    pub skip_confirm: bool,
    pub retry: RetryPolicy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    NoFiles,
    /// No file in the batch could be read.
    Unreadable,
    /// At least one readable file failed validation; nothing was applied.
    Invalid,
    Declined,
    Applied,
    /// The readable files were applied; this many others could not be read.
    AppliedWithFileErrors(usize),
}

/// Receives the batch after each stage so the caller can render it.
pub trait LoadReporter {
    fn validated(&mut self, files: &[ConfigFile]) -> anyhow::Result<()>;
    fn applied(&mut self, files: &[ConfigFile]) -> anyhow::Result<()>;
}

/// Validates every readable file concurrently. Returns whether all readable
/// files are valid.
pub async fn validate_all(
    client: &dyn FleetClient,
    files: &mut [ConfigFile],
    retry: &RetryPolicy,
) -> bool {
    let results = join_all(files.iter().map(|file| async move {
        if !file.is_readable() {
            return None;
        }
        if file.plugin_class.is_empty() {
            return Some(Err("config has no connector.class".to_string()));
        }
        let what = format!("validate {}", file.connector_name);
        let result = with_retry(retry, &what, || {
            client.validate_plugin_config(&file.plugin_class, &file.config)
        })
        .await;
        Some(result.map_err(|err| err.to_string()))
    }))
    .await;

    for (file, result) in files.iter_mut().zip(results) {
        match result {
            None => {}
            Some(Ok(validation)) => {
                debug!(
                    connector = %file.connector_name,
                    error_count = validation.error_count,
                    "validated config"
                );
                file.validation = Some(validation);
            }
            Some(Err(err)) => {
                warn!(connector = %file.connector_name, error = %err, "validation failed");
                file.validation_error = Some(err);
            }
        }
    }

    files
        .iter()
        .filter(|file| file.is_readable())
        .all(ConfigFile::is_valid)
}

/// PUTs every valid file. One failure never stops the others.
pub async fn apply_all(client: &dyn FleetClient, files: &mut [ConfigFile], retry: &RetryPolicy) {
    let results = join_all(files.iter().map(|file| async move {
        if !file.is_valid() {
            return None;
        }
        let what = format!("apply {}", file.connector_name);
        let result = with_retry(retry, &what, || {
            client.put_config(&file.connector_name, &file.config)
        })
        .await;
        Some(match result {
            Ok(status) => ApplyResult::Applied(status),
            Err(err) => ApplyResult::Failed(err.to_string()),
        })
    }))
    .await;

    for (file, result) in files.iter_mut().zip(results) {
        match &result {
            Some(ApplyResult::Applied(status)) => {
                info!(connector = %file.connector_name, %status, "applied config");
            }
            Some(ApplyResult::Failed(err)) => {
                warn!(connector = %file.connector_name, error = %err, "apply failed");
            }
            None => {}
        }
        file.apply = result;
    }
}

pub async fn run_load(
    client: &dyn FleetClient,
    files: &mut [ConfigFile],
    options: &LoadOptions,
    prompt: &mut dyn Prompt,
    reporter: &mut dyn LoadReporter,
) -> anyhow::Result<LoadOutcome> {
    if files.is_empty() {
        return Ok(LoadOutcome::NoFiles);
    }

    let unreadable = files.iter().filter(|file| !file.is_readable()).count();
    let valid = validate_all(client, files, &options.retry).await;
    reporter.validated(files)?;
    if unreadable == files.len() {
        return Ok(LoadOutcome::Unreadable);
    }
    if !valid {
        return Ok(LoadOutcome::Invalid);
    }

    if !options.skip_confirm {
        let message = format!(
            "Apply {} connector config(s)?",
            files.len() - unreadable
        );
        if !confirm(prompt, &message)? {
            info!("load declined, nothing applied");
            return Ok(LoadOutcome::Declined);
        }
    }

    apply_all(client, files, &options.retry).await;
    reporter.applied(files)?;
    if unreadable > 0 {
        return Ok(LoadOutcome::AppliedWithFileErrors(unreadable));
    }
    Ok(LoadOutcome::Applied)
}
