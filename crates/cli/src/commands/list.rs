use std::io::{self, Write};

use crate::args::ListArgs;
use crate::commands::CommandContext;
use crate::fleet::FleetFilter;
use crate::view::fleet::render_fleet_table;
use crate::view::to_pretty_json;

pub async fn handle_list(ctx: &CommandContext, args: ListArgs) -> anyhow::Result<()> {
    list_connectors(ctx, &args, &mut io::stdout()).await
}

pub(crate) async fn list_connectors(
    ctx: &CommandContext,
    args: &ListArgs,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let fleet = ctx.snapshot(&FleetFilter::from(&args.filter)).await?;

    if args.output.json {
        writeln!(out, "{}", to_pretty_json(&fleet)?)?;
        return Ok(());
    }

    write!(
        out,
        "{}",
        render_fleet_table(&fleet, &ctx.summaries, args.wide, ctx.settings.color)
    )?;
    Ok(())
}
