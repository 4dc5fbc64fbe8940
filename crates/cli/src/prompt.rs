use std::io::{self, BufRead, Write};

use anyhow::Context;

/// Source of operator answers. Commands read from the terminal; tests script
/// the answers.
pub trait Prompt: Send {
    /// Shows `message` and returns one line of input without its newline.
    /// End of input is an empty answer.
    fn ask(&mut self, message: &str) -> anyhow::Result<String>;
}

pub fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

pub fn confirm(prompt: &mut dyn Prompt, message: &str) -> anyhow::Result<bool> {
    let answer = prompt.ask(&format!("{message} [y/N]: "))?;
    Ok(is_yes(&answer))
}

/// Prompts on stdout and reads stdin.
#[derive(Debug, Default)]
pub struct TerminalPrompt;

impl Prompt for TerminalPrompt {
    fn ask(&mut self, message: &str) -> anyhow::Result<String> {
        let mut stdout = io::stdout().lock();
        write!(stdout, "{message}")?;
        stdout.flush()?;

        let mut line = String::new();
        io::stdin()
            .lock()
            .read_line(&mut line)
            .context("failed to read answer from stdin")?;
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }
}
