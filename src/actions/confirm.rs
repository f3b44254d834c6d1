//! Interactive Y/N confirmation before deleting duplicates.

use std::io::{self, BufRead, Write};

use thiserror::Error;

/// Prompt written before every read.
pub const PROMPT: &str = "Delete this duplicate files? (Y/N): ";

/// Failure to obtain an answer.
#[derive(Debug, Error)]
pub enum ConfirmError {
    /// Input ended before a Y or N was read.
    #[error("confirmation input ended without an answer")]
    Eof,

    /// Reading the answer or writing the prompt failed.
    #[error("confirmation prompt failed: {0}")]
    Io(#[from] io::Error),
}

/// Ask until the user answers `Y` or `N` (any case).
///
/// Answers are whitespace-separated tokens; any other token re-prompts.
///
/// # Errors
///
/// `Eof` when input runs out, `Io` when the reader or writer fails.
///
/// # Example
///
/// ```
/// use fileworker::actions::confirm::prompt_confirmation;
///
/// let mut out = Vec::new();
/// let yes = prompt_confirmation(&b"maybe y\n"[..], &mut out).unwrap();
/// assert!(yes);
/// ```
pub fn prompt_confirmation<R: BufRead, W: Write>(
    mut input: R,
    mut output: W,
) -> Result<bool, ConfirmError> {
    let mut line = String::new();

    write!(output, "{PROMPT}")?;
    output.flush()?;

    loop {
        line.clear();
        if input.read_line(&mut line)? == 0 {
            return Err(ConfirmError::Eof);
        }

        for token in line.split_whitespace() {
            if let Some(answer) = parse_answer(token) {
                log::debug!("Confirmation answer: {}", token);
                return Ok(answer);
            }

            log::debug!("Rejected confirmation token: {:?}", token);
            write!(output, "{PROMPT}")?;
            output.flush()?;
        }
    }
}

fn parse_answer(token: &str) -> Option<bool> {
    if token.eq_ignore_ascii_case("y") {
        Some(true)
    } else if token.eq_ignore_ascii_case("n") {
        Some(false)
    } else {
        None
    }
}
