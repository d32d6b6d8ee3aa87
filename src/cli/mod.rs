//! Command-line interface for the kais control plane.

pub mod commands;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "kais-operator", version, about = "Reconciles Cell/Formation/Mission custom resources")]
pub struct Cli {
    /// Path to a YAML config file merged under the `KAIS_*` environment
    /// overrides (spec's ambient configuration layer).
    #[arg(long, env = "KAIS_CONFIG_FILE")]
    pub config: Option<std::path::PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Starts the reconcile loops for Cells, Formations, and Missions.
    Run(commands::run::RunArgs),

    /// Loads and validates configuration without starting any reconciler.
    Validate,
}
