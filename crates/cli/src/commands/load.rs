use std::io::{self, Write};

use crate::args::LoadArgs;
use crate::commands::CommandContext;
use crate::config_file::{ConfigFile, expand_paths, read_all};
use crate::pipeline::{LoadOptions, LoadOutcome, LoadReporter, run_load};
use crate::prompt::{Prompt, TerminalPrompt};
use crate::view::load::{render_apply_report, render_validation_report};

/// Prints each stage of the load pipeline.
struct PrintReporter<'a> {
    out: &'a mut dyn Write,
    color: bool,
}

impl LoadReporter for PrintReporter<'_> {
    fn validated(&mut self, files: &[ConfigFile]) -> anyhow::Result<()> {
        write!(self.out, "{}", render_validation_report(files, self.color))?;
        Ok(())
    }

    fn applied(&mut self, files: &[ConfigFile]) -> anyhow::Result<()> {
        write!(self.out, "{}", render_apply_report(files))?;
        Ok(())
    }
}

pub async fn handle_load(ctx: &CommandContext, args: LoadArgs) -> anyhow::Result<()> {
    load_paths(ctx, &args, &mut TerminalPrompt, &mut io::stdout()).await
}

pub(crate) async fn load_paths(
    ctx: &CommandContext,
    args: &LoadArgs,
    prompt: &mut dyn Prompt,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let paths = expand_paths(&args.paths.paths)?;
    let mut files = read_all(&paths);
    let options = LoadOptions {
        skip_confirm: args.yes,
        retry: ctx.settings.retry,
    };

    let mut reporter = PrintReporter {
        out: &mut *out,
        color: ctx.settings.color,
    };
    let outcome = run_load(ctx.client(), &mut files, &options, prompt, &mut reporter).await?;

    match outcome {
        LoadOutcome::NoFiles => writeln!(out, "no config files found")?,
        LoadOutcome::Invalid => {
            anyhow::bail!("validation errors found, nothing was applied")
        }
        LoadOutcome::Declined => writeln!(out, "nothing applied")?,
        LoadOutcome::Applied => {}
        LoadOutcome::Unreadable | LoadOutcome::AppliedWithFileErrors(_) => {}
    }

    let unreadable = files.iter().filter(|file| !file.is_readable()).count();
    if unreadable > 0 {
        anyhow::bail!("{unreadable} config file(s) could not be read");
    }
    Ok(())
}
