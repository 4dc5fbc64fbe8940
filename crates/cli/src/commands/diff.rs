use std::io::{self, Write};

use crate::args::PathArgs;
use crate::commands::CommandContext;
use crate::config_file::{expand_paths, read_all};
use crate::diff::diff_files;
use crate::view::diff::render_diff;

pub async fn handle_diff(ctx: &CommandContext, args: PathArgs) -> anyhow::Result<()> {
    diff_paths(ctx, &args, &mut io::stdout()).await
}

pub(crate) async fn diff_paths(
    ctx: &CommandContext,
    args: &PathArgs,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let paths = expand_paths(&args.paths)?;
    if paths.is_empty() {
        writeln!(out, "no config files found")?;
        return Ok(());
    }

    let files = read_all(&paths);
    let results = diff_files(ctx.client(), &files).await;
    write!(out, "{}", render_diff(&results))?;
    Ok(())
}
