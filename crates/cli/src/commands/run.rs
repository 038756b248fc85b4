//! `troupe run` — run the agent loop against the sandbox environment.

use std::path::Path;
use std::sync::Arc;

use troupe_agent::Agent;
use troupe_core::run::{RunReport, RunStatus};

use crate::config::CliConfig;
use crate::sandbox::{Feed, FeedEnvironment, sandbox_registry};

pub async fn run(
    config_path: &Path,
    goal: Option<String>,
    scripted: bool,
    steps: Option<u64>,
) -> anyhow::Result<()> {
    let mut config = CliConfig::load(config_path)?;
    if scripted {
        config.provider.kind = "scripted".into();
    }
    if let Some(steps) = steps {
        config.run.max_steps = steps;
    }
    let goal = goal.unwrap_or_else(|| config.goal.clone());
    tracing::debug!(?config, "Loaded configuration");

    println!();
    println!("  Provider:  {}", config.provider.kind);
    println!("  Model:     {}", config.run.model);
    println!("  Character: {}", config.character.name);
    println!("  Goal:      {goal}");
    println!();

    let report = execute(config, &goal).await?;

    match &report.status {
        RunStatus::Stopped { reason } => println!("  Run stopped: {reason:?}"),
        RunStatus::Failed { step, cause } => {
            println!("  Run FAILED at step {step}: {cause}")
        }
    }
    println!(
        "  {} step(s) completed, {} history entr(ies) retained",
        report.steps_completed,
        report.history.len()
    );
    println!();
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}

/// Wire up the sandbox and run the loop. Split from [`run`] so tests can
/// drive a whole run without touching stdout.
async fn execute(config: CliConfig, goal: &str) -> anyhow::Result<RunReport> {
    let feed = Arc::new(Feed::default());
    let registry = Arc::new(sandbox_registry(feed.clone(), &config.character.name)?);
    let environment = Arc::new(FeedEnvironment::new(feed));
    let provider = super::build_provider(&config)?;

    let agent = Agent::new(
        provider,
        environment,
        registry,
        config.character.to_profile(),
        config.run.clone(),
    )?;

    Ok(agent.run(goal).await)
}
