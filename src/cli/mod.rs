pub mod diff;
pub mod output;
pub mod patch;
pub mod plan;

use std::path::Path;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::config::ShadowConfig;

/// Stage, preview and commit file edits through a shadow workspace
#[derive(Debug, Parser)]
#[command(name = "shadow-edit")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Show a line diff between two files
    Diff(diff::DiffArgs),

    /// Apply a unified diff to a file
    Patch(patch::PatchArgs),

    /// Stage a JSON edit plan, preview it, and optionally commit it
    Plan(plan::PlanArgs),
}

/// Run the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Diff(args) => diff::run(args),
        Commands::Patch(args) => patch::run(args),
        Commands::Plan(args) => plan::run(args),
    }
}

/// Load config for a workspace, falling back to defaults on a bad file
pub(crate) fn load_config(root: &Path) -> ShadowConfig {
    match ShadowConfig::load(root) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(error = %format!("{:#}", e), "Config load failed, using defaults");
            ShadowConfig::default()
        }
    }
}
