//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

/// Stratus - a compliance-aware service manifest resolver and deployment planner
#[derive(Parser)]
#[command(name = "stratus")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Produce a deployment plan from the service manifest
    Plan(PlanArgs),

    /// Validate the service manifest without planning
    Validate(ValidateArgs),

    /// Show the binding compatibility matrix
    Matrix(MatrixArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args)]
pub struct PlanArgs {
    /// Manifest path (discovered by walking up when omitted)
    pub manifest: Option<PathBuf>,

    /// Target environment
    #[arg(short, long, env = "STRATUS_ENVIRONMENT")]
    pub environment: Option<String>,

    /// Configuration service base URL
    #[arg(long, env = "STRATUS_CONFIG_SERVICE")]
    pub config_service: Option<String>,

    /// Report every component's config failure instead of the first
    #[arg(long)]
    pub keep_going: bool,

    /// Emit the plan as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct ValidateArgs {
    /// Manifest path (discovered by walking up when omitted)
    pub manifest: Option<PathBuf>,

    /// Target environment (full chain only)
    #[arg(short, long, env = "STRATUS_ENVIRONMENT")]
    pub environment: Option<String>,

    /// Run hydration and semantic checks as well
    #[arg(long)]
    pub full: bool,
}

#[derive(Args)]
pub struct MatrixArgs {
    /// Only show interactions for this source component type
    #[arg(long)]
    pub source: Option<String>,

    /// Emit the matrix as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: Shell,
}
