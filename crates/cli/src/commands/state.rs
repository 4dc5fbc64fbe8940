use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::Path;

use anyhow::Context;
use chrono::Utc;
use tracing::info;

use crate::args::{StateCommands, StateSaveArgs, StateSetArgs};
use crate::commands::CommandContext;
use crate::fleet::FleetFilter;
use crate::state::{default_snapshot_path, reconcile, write_snapshot};
use crate::view::state::render_reconcile;

pub async fn handle_state(ctx: &CommandContext, command: StateCommands) -> anyhow::Result<()> {
    let mut out = io::stdout();
    match command {
        StateCommands::Show => show_state(ctx, &mut out).await,
        StateCommands::Save(args) => save_state(ctx, args, &mut out).await,
        StateCommands::Set(args) => set_state(ctx, args, &mut out).await,
    }
}

pub(crate) async fn show_state(ctx: &CommandContext, out: &mut dyn Write) -> anyhow::Result<()> {
    let fleet = ctx.snapshot(&FleetFilter::default()).await?;
    write_snapshot(&fleet, out)?;
    Ok(())
}

pub(crate) async fn save_state(
    ctx: &CommandContext,
    args: StateSaveArgs,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let fleet = ctx.snapshot(&FleetFilter::default()).await?;
    let path = args.file.unwrap_or_else(|| default_snapshot_path(Utc::now()));

    let mut file = File::create(&path)
        .with_context(|| format!("failed to create state file {}", path.display()))?;
    write_snapshot(&fleet, &mut file)
        .with_context(|| format!("failed to write state file {}", path.display()))?;
    file.flush()?;

    info!(path = %path.display(), count = fleet.len(), "saved connector states");
    writeln!(
        out,
        "saved {} connector state(s) to {}",
        fleet.len(),
        path.display()
    )?;
    Ok(())
}

pub(crate) async fn set_state(
    ctx: &CommandContext,
    args: StateSetArgs,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let target = open_state_file(&args.file)?;
    let fleet = ctx.snapshot(&FleetFilter::default()).await?;
    let entries = reconcile(ctx.client(), &fleet, target).await?;
    write!(out, "{}", render_reconcile(&entries))?;
    Ok(())
}

fn open_state_file(path: &Path) -> anyhow::Result<BufReader<File>> {
    let file = File::open(path)
        .with_context(|| format!("failed to open state file {}", path.display()))?;
    Ok(BufReader::new(file))
}
