use std::io::{self, Write};

use tracing::info;

use crate::args::{FilterArgs, RestartArgs};
use crate::commands::CommandContext;
use crate::fleet::FleetFilter;
use crate::ops::{ExecutionReport, Operation, execute};
use crate::prompt::{Prompt, TerminalPrompt};
use crate::selector::parse_selection;
use crate::view::fleet::render_fleet_table;
use crate::view::ops::render_outcomes;

const SELECT_PROMPT: &str = "Select connector id(s), 'all' or 'q': ";

pub async fn handle_operation(
    ctx: &CommandContext,
    op: Operation,
    filter: FilterArgs,
) -> anyhow::Result<()> {
    run_operation(ctx, op, &filter, &mut TerminalPrompt, &mut io::stdout()).await
}

pub async fn handle_restart(ctx: &CommandContext, args: RestartArgs) -> anyhow::Result<()> {
    let op = Operation::Restart(args.fanout());
    handle_operation(ctx, op, args.filter).await
}

pub(crate) async fn run_operation(
    ctx: &CommandContext,
    op: Operation,
    filter: &FilterArgs,
    prompt: &mut dyn Prompt,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let fleet = ctx.snapshot(&FleetFilter::from(filter)).await?;
    if fleet.is_empty() {
        writeln!(out, "no connectors match")?;
        return Ok(());
    }

    write!(
        out,
        "{}",
        render_fleet_table(&fleet, &ctx.summaries, false, ctx.settings.color)
    )?;
    out.flush()?;

    let answer = prompt.ask(SELECT_PROMPT)?;
    let selection = parse_selection(&answer)?;

    match execute(ctx.client(), op, selection, &fleet, prompt).await? {
        ExecutionReport::Quit => writeln!(out, "quitting, nothing done")?,
        ExecutionReport::Declined => writeln!(out, "nothing done")?,
        ExecutionReport::Executed(outcomes) => {
            let failures = outcomes.iter().filter(|o| o.result.is_failure()).count();
            info!(
                operation = op.name(),
                calls = outcomes.len(),
                failures,
                "operation finished"
            );
            write!(out, "{}", render_outcomes(&outcomes, ctx.settings.color))?;
        }
    }
    Ok(())
}
