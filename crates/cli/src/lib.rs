pub mod api;
pub mod args;
pub mod commands;
pub mod config_file;
pub mod diff;
pub mod fleet;
pub mod ops;
pub mod pipeline;
pub mod profile_store;
pub mod prompt;
pub mod retry;
pub mod selector;
pub mod settings;
pub mod state;
pub mod summary;
pub mod telemetry;
#[cfg(test)]
mod test_support;
pub mod view;

pub use api::{ConnectApi, FleetClient};
pub use args::*;
pub use commands::CommandContext;
pub use settings::Settings;

use clap::parser::ValueSource;
use clap::{CommandFactory, FromArgMatches};

use crate::commands::diff::handle_diff;
use crate::commands::list::handle_list;
use crate::commands::load::handle_load;
use crate::commands::ops::{handle_operation, handle_restart};
use crate::commands::profiles::handle_profiles;
use crate::commands::state::handle_state;
use crate::ops::Operation;
use crate::profile_store::ProfileStore;

/// Shared async entrypoint used by the CLI binary.
pub async fn run() -> anyhow::Result<()> {
    let matches = Cli::command().get_matches();
    let mut cli = Cli::from_arg_matches(&matches)?;

    let mut store = ProfileStore::load()?;
    let selected_profile = resolve_profile_name(&cli.profile, &store);
    apply_profile_overrides(
        &matches,
        &cli.command,
        &selected_profile,
        &store,
        &mut cli.globals,
    )?;

    maybe_persist_default_profile(&mut store, &selected_profile)?;

    cli.profile = selected_profile;
    run_parsed(cli).await
}

/// Execute the CLI given a pre-parsed argument struct.
pub async fn run_parsed(cli: Cli) -> anyhow::Result<()> {
    telemetry::init_tracing(cli.globals.debug);

    if let Commands::Profile { command } = cli.command {
        return handle_profiles(cli.profile, command);
    }

    let settings = Settings::from_globals(&cli.globals)?;
    let ctx = CommandContext::connect(settings)?;

    match cli.command {
        Commands::List(args) => handle_list(&ctx, args).await?,
        Commands::Diff(args) => handle_diff(&ctx, args).await?,
        Commands::Load(args) => handle_load(&ctx, args).await?,
        Commands::Pause(filter) => handle_operation(&ctx, Operation::Pause, filter).await?,
        Commands::Resume(filter) => handle_operation(&ctx, Operation::Resume, filter).await?,
        Commands::Delete(filter) => handle_operation(&ctx, Operation::Delete, filter).await?,
        Commands::Restart(args) => handle_restart(&ctx, args).await?,
        Commands::State { command } => handle_state(&ctx, command).await?,
        Commands::Profile { .. } => {}
    }

    Ok(())
}

fn resolve_profile_name(cli_profile: &Option<String>, store: &ProfileStore) -> Option<String> {
    cli_profile
        .clone()
        .or_else(|| store.default_profile.clone())
}

/// Records an explicitly selected profile as the default when none is set yet.
fn maybe_persist_default_profile(
    store: &mut ProfileStore,
    selected_profile: &Option<String>,
) -> anyhow::Result<()> {
    let Some(name) = selected_profile.as_deref() else {
        return Ok(());
    };
    if store.default_profile.is_some() || !store.profiles.contains_key(name) {
        return Ok(());
    }

    store.default_profile = Some(name.to_string());
    store.save()
}

/// Fills globals from the selected profile wherever neither a flag nor an env
/// var supplied a value.
fn apply_profile_overrides(
    matches: &clap::ArgMatches,
    command: &Commands,
    selected_profile: &Option<String>,
    store: &ProfileStore,
    globals: &mut GlobalArgs,
) -> anyhow::Result<()> {
    let Some(name) = selected_profile.as_deref() else {
        return Ok(());
    };

    let Some(profile) = store.profiles.get(name) else {
        if matches!(command, Commands::Profile { .. }) {
            return Ok(());
        }
        anyhow::bail!("profile '{name}' not found (create it via `connctl profile set`)");
    };

    let profile = profile.clone();
    fill_from_profile(matches, "url", &mut globals.url, profile.url);
    fill_from_profile(matches, "timeout_secs", &mut globals.timeout_secs, profile.timeout_secs);
    fill_from_profile(matches, "retries", &mut globals.retries, profile.retries);
    fill_from_profile(
        matches,
        "retry_backoff_ms",
        &mut globals.retry_backoff_ms,
        profile.retry_backoff_ms,
    );
    fill_from_profile(matches, "concurrency", &mut globals.concurrency, profile.concurrency);
    Ok(())
}

fn fill_from_profile<T>(matches: &clap::ArgMatches, arg_id: &str, slot: &mut T, value: Option<T>) {
    let defaulted = matches!(
        matches.value_source(arg_id),
        None | Some(ValueSource::DefaultValue)
    );
    if defaulted && let Some(value) = value {
        *slot = value;
    }
}

#[cfg(test)]
mod profile_tests {
    use super::*;
    use crate::profile_store::Profile;

    const ENV_VARS: [&str; 3] = ["CONNCTL_URL", "CONNCTL_RETRIES", "CONNCTL_CONCURRENCY"];

    fn clear_env() {
        // SAFETY: Tests hold ENV_LOCK to serialize env mutations.
        unsafe {
            for var in ENV_VARS {
                std::env::remove_var(var);
            }
        }
    }

    fn staging_store() -> ProfileStore {
        let mut store = ProfileStore {
            default_profile: Some("staging".into()),
            ..Default::default()
        };
        store.profiles.insert(
            "staging".into(),
            Profile {
                url: Some("http://staging.example:8083".to_string()),
                retries: Some(7),
                concurrency: Some(2),
                ..Default::default()
            },
        );
        store
    }

    fn resolve(argv: &[&str], store: &ProfileStore) -> anyhow::Result<GlobalArgs> {
        let matches = Cli::command().try_get_matches_from(argv)?;
        let Cli {
            mut globals,
            command,
            profile,
        } = Cli::from_arg_matches(&matches)?;
        let selected = resolve_profile_name(&profile, store);
        apply_profile_overrides(&matches, &command, &selected, store, &mut globals)?;
        Ok(globals)
    }

    #[test]
    fn default_profile_fills_unset_globals() {
        let _guard = crate::test_support::ENV_LOCK.lock().expect("lock");
        clear_env();

        let globals = resolve(&["connctl", "list"], &staging_store()).expect("resolve");

        assert_eq!(globals.url, "http://staging.example:8083");
        assert_eq!(globals.retries, 7);
        assert_eq!(globals.concurrency, 2);
        assert_eq!(globals.timeout_secs, DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn flags_and_env_beat_the_profile() {
        let _guard = crate::test_support::ENV_LOCK.lock().expect("lock");
        // SAFETY: Tests hold ENV_LOCK to serialize env mutations.
        unsafe {
            std::env::set_var("CONNCTL_RETRIES", "4");
        }

        let globals = resolve(
            &["connctl", "--url", "http://cli.example:8083", "list"],
            &staging_store(),
        );
        clear_env();
        let globals = globals.expect("resolve");

        assert_eq!(globals.url, "http://cli.example:8083");
        assert_eq!(globals.retries, 4);
        assert_eq!(globals.concurrency, 2);
    }

    #[test]
    fn unknown_profile_only_tolerated_by_profile_commands() {
        let _guard = crate::test_support::ENV_LOCK.lock().expect("lock");
        clear_env();
        let store = ProfileStore::default();

        let err = resolve(&["connctl", "--profile", "ghost", "list"], &store)
            .expect_err("missing profile");
        assert!(err.to_string().contains("profile 'ghost' not found"));

        resolve(&["connctl", "--profile", "ghost", "profile", "list"], &store)
            .expect("profile commands tolerate missing profiles");
    }

    #[test]
    fn default_is_persisted_only_for_existing_profiles() {
        let _guard = crate::test_support::ENV_LOCK.lock().expect("lock");
        let dir = tempfile::tempdir().expect("tempdir");
        // SAFETY: Tests hold ENV_LOCK to serialize env mutations.
        unsafe {
            std::env::set_var("XDG_CONFIG_HOME", dir.path());
        }

        let mut store = ProfileStore::default();
        maybe_persist_default_profile(&mut store, &Some("missing".to_string())).expect("skip");
        assert!(store.default_profile.is_none());
        assert!(!ProfileStore::path().expect("path").exists());

        store.profiles.insert("prod".to_string(), Profile::default());
        maybe_persist_default_profile(&mut store, &Some("prod".to_string())).expect("persist");
        assert_eq!(store.default_profile.as_deref(), Some("prod"));
        assert!(ProfileStore::path().expect("path").exists());
    }
}
