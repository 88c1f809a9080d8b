//! CrossClaw CLI: the main entry point.
//!
//! Commands:
//! - `solve`: Solve a puzzle file with the configured backend
//! - `show`: Print a puzzle's blank grid and clues
//! - `tools`: Print the tool catalogue the backend sees
//! - `config`: Print the effective configuration, optionally probing the backend
//!
//! Exit status: 0 when solved, 2 when the solver gave up, 1 on error.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "crossclaw",
    about = "CrossClaw: LLM-driven crossword solver",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve a puzzle
    Solve {
        /// Path to the puzzle JSON file
        puzzle: PathBuf,

        /// Override the iteration budget
        #[arg(long)]
        max_iterations: Option<u32>,

        /// Override the model (deployment name for Azure)
        #[arg(short, long)]
        model: Option<String>,

        /// Print solver events as JSON lines instead of the progress log
        #[arg(long)]
        events: bool,
    },

    /// Show a puzzle's grid and clues
    Show {
        /// Path to the puzzle JSON file
        puzzle: PathBuf,
    },

    /// Print the tool catalogue as JSON
    Tools,

    /// Print the effective configuration (secrets redacted)
    Config {
        /// Print only the config file path
        #[arg(long)]
        path: bool,

        /// Also check that the default backend is reachable
        #[arg(long, conflicts_with = "path")]
        check: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = if cli.verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
    if cli.log_json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }

    match cli.command {
        Commands::Solve {
            puzzle,
            max_iterations,
            model,
            events,
        } => {
            let solved = commands::solve::run(&puzzle, max_iterations, model, events).await?;
            if !solved {
                std::process::exit(2);
            }
        }
        Commands::Show { puzzle } => commands::show::run(&puzzle)?,
        Commands::Tools => commands::tools::run()?,
        Commands::Config { path, check } => {
            if path {
                commands::config_cmd::path()?
            } else {
                commands::config_cmd::show()?;
                if check {
                    commands::config_cmd::check().await?;
                }
            }
        }
    }

    Ok(())
}
