//! Interactive input for credential resolution.

use crate::Result;
use crate::error::TableChunkError;
use std::io::{self, BufRead, Write};

/// Source of interactive answers during credential resolution.
///
/// `ask` echoes what the user types, `ask_hidden` does not. Implementations
/// return the answer without its trailing line terminator.
pub trait Prompter {
    /// Asks a question with echoed input.
    fn ask(&mut self, prompt: &str) -> Result<String>;

    /// Asks a question without echoing the answer.
    fn ask_hidden(&mut self, prompt: &str) -> Result<String>;

    /// Displays a message to the user.
    fn show(&mut self, message: &str) -> Result<()>;
}

/// Prompts on the controlling terminal via stdin/stdout.
///
/// Hidden input goes through `rpassword`, which reads from the TTY directly.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn ask(&mut self, prompt: &str) -> Result<String> {
        let mut stdout = io::stdout();
        write!(stdout, "{}", prompt)
            .and_then(|()| stdout.flush())
            .map_err(|e| TableChunkError::prompt("Failed to write prompt", e))?;

        let mut line = String::new();
        io::stdin()
            .lock()
            .read_line(&mut line)
            .map_err(|e| TableChunkError::prompt("Failed to read answer", e))?;
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }

    fn ask_hidden(&mut self, prompt: &str) -> Result<String> {
        rpassword::prompt_password(prompt)
            .map_err(|e| TableChunkError::prompt("Failed to read hidden answer", e))
    }

    fn show(&mut self, message: &str) -> Result<()> {
        writeln!(io::stdout(), "{}", message)
            .map_err(|e| TableChunkError::prompt("Failed to write message", e))
    }
}
