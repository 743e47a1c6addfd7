//! `postwatch` — duration estimates for proof-of-space-time proving runs.

mod cli;
mod commands;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};

fn main() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Apriori {
            protocol,
            hardware,
            output,
        } => commands::run_apriori_command(&protocol, &hardware, &output),
        Commands::Midpass {
            protocol,
            hardware,
            output,
            batches_remaining,
            gamma,
            good_labels,
        } => commands::run_midpass_command(
            &protocol,
            &hardware,
            &output,
            batches_remaining,
            gamma,
            good_labels,
        ),
    }
}
