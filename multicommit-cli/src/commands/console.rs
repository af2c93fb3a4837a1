//! Operator prompts. Questions go to stderr so stdout stays the report.

use std::io::{self, BufRead, IsTerminal, Write};

use anyhow::{Context, Result};

/// Whether stdin can answer prompts.
pub fn is_interactive() -> bool {
    io::stdin().is_terminal()
}

/// Ask a question; `None` on end of input.
pub fn ask(question: &str) -> Result<Option<String>> {
    eprint!("{question} ");
    io::stderr().flush().context("failed to flush prompt")?;
    let mut line = String::new();
    let read = io::stdin()
        .lock()
        .read_line(&mut line)
        .context("failed to read answer")?;
    if read == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

/// Yes/no question defaulting to no.
pub fn confirm(question: &str) -> Result<bool> {
    let answer = ask(&format!("{question} [y/N]"))?;
    Ok(answer.is_some_and(|a| is_yes(&a)))
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.to_ascii_lowercase().as_str(), "y" | "yes")
}
