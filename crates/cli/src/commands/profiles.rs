use std::io::{self, Write};

use crate::args::{ProfileCommands, ProfileSetArgs, ProfileSetDefaultArgs, ProfileShowArgs};
use crate::profile_store::{Profile, ProfileStore};

pub fn handle_profiles(
    selected_profile: Option<String>,
    command: ProfileCommands,
) -> anyhow::Result<()> {
    let mut store = ProfileStore::load()?;
    let changed = apply_profile_command(&mut store, selected_profile, command, &mut io::stdout())?;
    if changed {
        store.save()?;
    }
    Ok(())
}

/// Runs `command` against `store`. Returns whether the store needs saving.
pub(crate) fn apply_profile_command(
    store: &mut ProfileStore,
    selected_profile: Option<String>,
    command: ProfileCommands,
    out: &mut dyn Write,
) -> anyhow::Result<bool> {
    match command {
        ProfileCommands::List => {
            match store.default_profile.as_deref() {
                Some(default) => writeln!(out, "default_profile: {default}")?,
                None => writeln!(out, "default_profile: <unset>")?,
            }

            if store.profiles.is_empty() {
                writeln!(out, "profiles: <none>")?;
                return Ok(false);
            }

            writeln!(out, "profiles:")?;
            for name in store.profiles.keys() {
                writeln!(out, "- {name}")?;
            }
            Ok(false)
        }
        ProfileCommands::Show(ProfileShowArgs { name }) => {
            let name = name
                .or(selected_profile)
                .or_else(|| store.default_profile.clone())
                .ok_or_else(|| {
                    anyhow::anyhow!("no profile selected and default_profile is unset")
                })?;

            let profile = store
                .profiles
                .get(&name)
                .ok_or_else(|| anyhow::anyhow!("profile '{}' not found", name))?;

            writeln!(out, "name: {name}")?;
            if let Some(url) = profile.url.as_deref() {
                writeln!(out, "url: {url}")?;
            }
            if let Some(timeout) = profile.timeout_secs {
                writeln!(out, "timeout_secs: {timeout}")?;
            }
            if let Some(retries) = profile.retries {
                writeln!(out, "retries: {retries}")?;
            }
            if let Some(backoff) = profile.retry_backoff_ms {
                writeln!(out, "retry_backoff_ms: {backoff}")?;
            }
            if let Some(concurrency) = profile.concurrency {
                writeln!(out, "concurrency: {concurrency}")?;
            }
            Ok(false)
        }
        ProfileCommands::Set(ProfileSetArgs {
            name,
            url,
            timeout_secs,
            retries,
            retry_backoff_ms,
            concurrency,
        }) => {
            let entry = store
                .profiles
                .entry(name.clone())
                .or_insert_with(Profile::default);
            if url.is_some() {
                entry.url = url;
            }
            if timeout_secs.is_some() {
                entry.timeout_secs = timeout_secs;
            }
            if retries.is_some() {
                entry.retries = retries;
            }
            if retry_backoff_ms.is_some() {
                entry.retry_backoff_ms = retry_backoff_ms;
            }
            if concurrency.is_some() {
                entry.concurrency = concurrency;
            }

            if store.default_profile.is_none() {
                store.default_profile = Some(name.clone());
            }
            writeln!(out, "updated profile: {name}")?;
            Ok(true)
        }
        ProfileCommands::SetDefault(ProfileSetDefaultArgs { name }) => {
            if !store.profiles.contains_key(&name) {
                anyhow::bail!(
                    "profile '{}' not found (create it via `connctl profile set`)",
                    name
                );
            }
            store.default_profile = Some(name.clone());
            writeln!(out, "default_profile set to: {name}")?;
            Ok(true)
        }
    }
}
