//! kais-operator CLI entry point.

use anyhow::Result;
use clap::Parser;
use kais_operator::cli::commands::{run, validate};
use kais_operator::cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => run::handle(cli.config.as_deref(), &args).await,
        Commands::Validate => validate::handle(cli.config.as_deref()),
    }
}
