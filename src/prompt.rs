use colored::*;
use std::io::{BufRead, Write};

/// Interprets a y/n answer. Empty input selects `default`.
pub fn parse_answer(input: &str, default: bool) -> bool {
    let answer = input.trim().to_lowercase();
    if answer.is_empty() {
        return default;
    }
    matches!(answer.as_str(), "y" | "yes" | "true" | "1")
}

/// Asks a yes/no question on `out` and reads the answer from `input`.
///
/// End of input or a read error counts as a refusal.
pub fn confirm_action<R, W>(message: &str, default: bool, input: &mut R, out: &mut W) -> bool
where
    R: BufRead,
    W: Write,
{
    let choices = if default {
        format!("[{}/n]", "Y".green())
    } else {
        format!("[y/{}]", "N".red())
    };
    let _ = write!(out, "{} {} ", message.yellow(), choices);
    let _ = out.flush();

    let mut line = String::new();
    match input.read_line(&mut line) {
        Ok(0) | Err(_) => {
            let _ = writeln!(out, "\n{}", "Operation cancelled.".yellow());
            false
        }
        Ok(_) => parse_answer(&line, default),
    }
}
