//! Troupe CLI — the main entry point.
//!
//! Commands:
//! - `run`     — Run the agent loop against the sandbox environment
//! - `actions` — List the sandbox actions as the model sees them
//! - `check`   — Check configuration and provider reachability

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;
mod config;
mod sandbox;

#[derive(Parser)]
#[command(
    name = "troupe",
    about = "Troupe — character-agent orchestration runtime",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the configuration file
    #[arg(short, long, global = true, default_value = "troupe.toml")]
    config: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the agent loop
    Run {
        /// Goal for this run (overrides the configured goal)
        #[arg(short, long)]
        goal: Option<String>,

        /// Use the offline scripted provider instead of a real backend
        #[arg(long)]
        scripted: bool,

        /// Override the maximum number of steps
        #[arg(long)]
        steps: Option<u64>,
    },

    /// List the sandbox actions as they are rendered into the prompt
    Actions,

    /// Check configuration and provider reachability
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Run {
            goal,
            scripted,
            steps,
        } => commands::run::run(&cli.config, goal, scripted, steps).await?,
        Commands::Actions => commands::actions::run()?,
        Commands::Check => commands::check::run(&cli.config).await?,
    }

    Ok(())
}
