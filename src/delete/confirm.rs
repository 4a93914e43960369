// influxretention/src/delete/confirm.rs
use anyhow::{Context, Result};
use std::io::{BufRead, Write, stdin, stdout};

pub const DELETE_PROMPT: &str =
    "Are you sure you want to proceed with the delete operation? (yes/no): ";

/// Source of the operator's go-ahead before anything is deleted.
pub trait Confirmation {
    fn confirm(&self, prompt: &str) -> Result<bool>;
}

/// Only an exact `yes`, ignoring case and surrounding whitespace, counts.
pub fn is_affirmative(answer: &str) -> bool {
    answer.trim().eq_ignore_ascii_case("yes")
}

/// Prompts on stdout and blocks on one line of stdin.
pub struct StdinConfirmation;

impl Confirmation for StdinConfirmation {
    fn confirm(&self, prompt: &str) -> Result<bool> {
        print!("{}", prompt);
        stdout().flush().context("Failed to flush stdout")?;

        let mut input = String::new();
        stdin()
            .lock()
            .read_line(&mut input)
            .context("Failed to read user input")?;
        Ok(is_affirmative(&input))
    }
}
