//! Stratus CLI - a compliance-aware service manifest resolver

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    // Parse CLI
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("stratus=debug")
    } else {
        EnvFilter::new("stratus=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    // Execute command
    match cli.command {
        Commands::Plan(args) => commands::plan::execute(args),
        Commands::Validate(args) => commands::validate::execute(args),
        Commands::Matrix(args) => commands::matrix::execute(args),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}
