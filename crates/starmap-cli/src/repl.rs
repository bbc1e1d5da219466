//! The interactive shell: one catalog shared across import, search and
//! clear, driven by stdin lines or a script.
//!
//! Errors from a line are printed and the loop continues; only I/O on
//! stdin itself ends the session.

use crate::remote::fetch_set;
use crate::session::Session;
use crate::status::{error, status};
use anyhow::{anyhow, Result};
use colored::Colorize;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

enum Control {
    Continue,
    Exit,
}

pub async fn run_interactive(session: &mut Session) -> Result<()> {
    println!("{}", "starmap".green().bold());
    println!("Type `help` for commands. Type `exit` to quit.\n");

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("{}", "starmap> ".cyan().bold());
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            break;
        };
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match dispatch(session, line).await {
            Ok(Control::Continue) => {}
            Ok(Control::Exit) => break,
            Err(e) => {
                tracing::error!(%e, "command failed");
                error(&e.to_string());
            }
        }
    }
    Ok(())
}

/// Run scripted lines: a file (or `-` for stdin) and/or `-c` commands, in
/// that order. With `continue_on_error` failures are printed and the
/// script keeps going, mirroring the interactive loop.
pub async fn run_script(
    session: &mut Session,
    script: Option<&PathBuf>,
    commands: &[String],
    continue_on_error: bool,
) -> Result<()> {
    let mut lines: Vec<String> = Vec::new();
    if let Some(path) = script {
        let text = if path.as_os_str() == "-" {
            let mut buf = String::new();
            io::Read::read_to_string(&mut io::stdin(), &mut buf)?;
            buf
        } else {
            std::fs::read_to_string(path)?
        };
        lines.extend(text.lines().map(str::to_string));
    }
    lines.extend(commands.iter().cloned());

    for (idx, raw) in lines.iter().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        println!("starmap> {line}");
        match dispatch(session, line).await {
            Ok(Control::Continue) => {}
            Ok(Control::Exit) => break,
            Err(e) if continue_on_error => {
                tracing::error!(%e, "command failed");
                error(&e.to_string());
            }
            Err(e) => return Err(anyhow!("script failed at line {}: {e}", idx + 1)),
        }
    }
    Ok(())
}

async fn dispatch(session: &mut Session, line: &str) -> Result<Control> {
    let (cmd, rest) = match line.split_once(char::is_whitespace) {
        Some((cmd, rest)) => (cmd, rest.trim()),
        None => (line, ""),
    };

    match cmd {
        "import" => {
            if rest.is_empty() {
                status("Choose a file first.");
            } else {
                session.import_file(Path::new(rest)).await?;
            }
        }
        "load" => {
            if rest.is_empty() {
                status("Name a system set first.");
            } else {
                status(&format!("Loading set: {rest}…"));
                let text = fetch_set(rest).await?;
                session.import_text(rest, true, &text).await?;
            }
        }
        "search" => session.search(rest).await?,
        "clear" => session.clear().await?,
        "render" => session.render().await?,
        "status" => session.summary(),
        "help" => print_help(),
        "exit" | "quit" => return Ok(Control::Exit),
        other => {
            error(&format!("unknown command `{other}` (try `help`)"));
        }
    }
    Ok(Control::Continue)
}

fn print_help() {
    println!("commands:");
    println!("  import <file>    import a .csv or newline-delimited name list");
    println!("  load <set.csv>   fetch and import a named set from the remote location");
    println!("  search <query>   find a system and center the camera on it");
    println!("  clear            empty the catalog");
    println!("  render           re-render the current catalog");
    println!("  status           show catalog counts");
    println!("  exit             quit");
}
