//! Command-line interface for docgate
//!
//! `run` executes the full pipeline; `discover` and `repair` expose single
//! stages for inspection.

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod discover;
mod repair;
mod run;
mod utils;

/// Quality-gate, label and route knowledge files for RAG and SQL ingestion
#[derive(Parser)]
#[command(name = "docgate")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging (sets log level to DEBUG)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every stage over an input root and write the handoff files
    Run(Box<run::RunArgs>),

    /// List the files a run would pick up, by category
    Discover(discover::DiscoverArgs),

    /// Try to recover JSON from a malformed file and print the result
    Repair(repair::RepairArgs),

    /// Print a shell completion script
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG in the environment always takes precedence; --verbose falls back to DEBUG.
    let filter = if cli.verbose {
        EnvFilter::from_default_env().add_directive(Level::DEBUG.into())
    } else {
        EnvFilter::from_default_env().add_directive(Level::WARN.into())
    };
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init();

    match cli.command {
        Commands::Run(args) => run::run(*args),
        Commands::Discover(args) => discover::run(args),
        Commands::Repair(args) => repair::run(args),
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            clap_complete::generate(shell, &mut cmd, name, &mut std::io::stdout());
            Ok(())
        }
    }
}
