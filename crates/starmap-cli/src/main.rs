//! Starmap CLI
//!
//! Assembles named star systems from text/CSV files and a remote
//! coordinate service into one deduplicated catalog, and writes renderer
//! payloads for the external viewer:
//! - `import` one batch per file, resolving missing coordinates
//! - `load` a named set from the configured remote location
//! - `search` a system and center the camera on it
//! - `repl` an interactive shell sharing one catalog across commands

use anyhow::Result;
use clap::{Parser, Subcommand};
use starmap_render::{JsonFileSurface, RenderBridge, RenderSurface};
use starmap_resolve::HttpSystemLookup;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod remote;
mod repl;
mod session;
mod status;

use session::Session;
use status::{error, status};

#[derive(Parser)]
#[command(name = "starmap")]
#[command(author, version, about = "Starmap: star-system catalog builder")]
struct Cli {
    /// Where render payloads are written for the external viewer
    #[arg(long, default_value = "starmap-payload.json")]
    out: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import files (one batch each), resolve missing coordinates, render
    Import {
        /// Input files: `.csv` or newline-delimited name lists
        files: Vec<PathBuf>,
    },

    /// Fetch and import a named set from the remote system-set location
    Load {
        /// Bare set file name, e.g. `colonies.csv`
        set: String,
    },

    /// Find a system (in memory first, then externally) and center on it
    Search {
        /// The system name to look for
        query: String,
        /// Files to import before searching
        #[arg(long = "import")]
        imports: Vec<PathBuf>,
    },

    /// Interactive shell sharing one catalog across commands
    Repl {
        /// Run commands from a file (`-` for stdin) instead of a terminal
        #[arg(long)]
        script: Option<PathBuf>,
        /// Run these commands, after the script if both are given
        #[arg(short = 'c', long = "command")]
        commands: Vec<String>,
        /// Keep going when a scripted command fails
        #[arg(long)]
        continue_on_error: bool,
    },
}

fn new_session(out: &std::path::Path) -> Result<Session> {
    let lookup = HttpSystemLookup::from_env()?;
    let out = out.to_path_buf();
    let factory = move |_session: u64| {
        Box::new(JsonFileSurface::new(out.clone())) as Box<dyn RenderSurface>
    };
    Ok(Session::new(Box::new(lookup), RenderBridge::new(Box::new(factory))))
}

async fn run(cli: Cli) -> Result<()> {
    let mut session = new_session(&cli.out)?;

    match cli.command {
        Commands::Import { files } => {
            if files.is_empty() {
                status("Choose a file first.");
                return Ok(());
            }
            for file in &files {
                if let Err(e) = session.import_file(file).await {
                    tracing::error!(%e, file = %file.display(), "import failed");
                    error(&e.to_string());
                }
            }
        }
        Commands::Load { set } => {
            status(&format!("Loading set: {set}…"));
            let text = remote::fetch_set(&set).await?;
            session.import_text(&set, true, &text).await?;
        }
        Commands::Search { query, imports } => {
            for file in &imports {
                if let Err(e) = session.import_file(file).await {
                    tracing::error!(%e, file = %file.display(), "import failed");
                    error(&e.to_string());
                }
            }
            session.search(&query).await?;
        }
        Commands::Repl {
            script,
            commands,
            continue_on_error,
        } => {
            if script.is_some() || !commands.is_empty() {
                repl::run_script(&mut session, script.as_ref(), &commands, continue_on_error)
                    .await?;
            } else {
                repl::run_interactive(&mut session).await?;
            }
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // The pipeline is event-driven and single-threaded; one cooperative
    // runtime thread is the whole concurrency model.
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(run(cli))
}
