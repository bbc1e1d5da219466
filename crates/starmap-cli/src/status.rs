//! User-facing status text.
//!
//! Status lines go to stdout as plain text; diagnostics go through
//! `tracing`. Errors are surfaced as `Error: …` and never terminate the
//! session.

use colored::Colorize;

pub fn status(msg: &str) {
    println!("{msg}");
}

/// Supplementary detail under the previous status line, e.g. the list of
/// names that never resolved.
pub fn detail(msg: &str) {
    println!("  {}", msg.dimmed());
}

pub fn error(msg: &str) {
    eprintln!("{} {msg}", "Error:".red().bold());
}

pub fn plural<'a>(n: usize, one: &'a str, many: &'a str) -> &'a str {
    if n == 1 {
        one
    } else {
        many
    }
}
