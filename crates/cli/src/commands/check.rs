//! `troupe check` — verify configuration and provider reachability.

use std::path::Path;

use crate::config::CliConfig;

pub async fn run(config_path: &Path) -> anyhow::Result<()> {
    let config = CliConfig::load(config_path)?;

    println!();
    if config_path.exists() {
        println!("  Config:    {}", config_path.display());
    } else {
        println!("  Config:    (built-in defaults; no {} found)", config_path.display());
    }
    println!("  Provider:  {}", config.provider.kind);
    println!("  Model:     {}", config.run.model);
    println!("  Character: {}", config.character.name);
    println!(
        "  Limits:    {} steps, {} history entries, {}s provider timeout",
        config.run.max_steps, config.run.max_history, config.run.provider_timeout_secs
    );

    let provider = super::build_provider(&config)?;
    match provider.health_check().await {
        Ok(true) => println!("  Health:    ok"),
        Ok(false) => println!("  Health:    reachable, but authentication failed"),
        Err(e) => println!("  Health:    FAILED: {e}"),
    }
    println!();

    Ok(())
}
