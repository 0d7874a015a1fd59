//! Command-line interface for tree-context
//!
//! Provides `export`, `tree`, and `completions` subcommands.

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod completions;
mod export;
mod tree;
mod utils;

/// Render a directory tree and an LLM-ready context document for a project
#[derive(Parser)]
#[command(name = "tree-context")]
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
    /// Write the directory tree and the context document for a project
    Export(Box<export::ExportArgs>),

    /// Print the directory tree to stdout
    Tree(tree::TreeArgs),

    /// Generate shell completion scripts
    Completions(completions::CompletionsArgs),
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
        Commands::Export(args) => export::run(*args),
        Commands::Tree(args) => tree::run(args),
        Commands::Completions(args) => completions::run(args, &mut Cli::command()),
    }
}
