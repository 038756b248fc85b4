//! CLI subcommand implementations.

pub mod actions;
pub mod check;
pub mod run;

use std::sync::Arc;

use anyhow::bail;

use troupe_core::Provider;
use troupe_providers::{AnthropicProvider, OpenAiCompatProvider, ScriptedProvider};

use crate::config::CliConfig;

/// Replies the scripted provider plays back for offline demo runs: one
/// post-and-read step, then a log-off that terminates the run.
const SCRIPTED_DEMO: &[&str] = &[
    r#"{"reasoning":"Introduce myself and look around.","plan":[
        {"reasoning":"Say hello to the feed.","action":"post_update","parameters":{"text":"Hello feed! Settling in for the day."}},
        {"reasoning":"See what the feed looks like now.","action":"read_feed","parameters":{}}
    ]}"#,
    r#"{"reasoning":"The goal is done; time to go.","plan":[
        {"reasoning":"Sign off for the session.","action":"log_off","parameters":{}}
    ]}"#,
];

/// Build the configured provider backend.
pub fn build_provider(config: &CliConfig) -> anyhow::Result<Arc<dyn Provider>> {
    let provider: Arc<dyn Provider> = match config.provider.kind.as_str() {
        "scripted" => Arc::new(ScriptedProvider::new(SCRIPTED_DEMO.iter().copied())),
        "anthropic" => {
            let mut provider = AnthropicProvider::new(require_key(config)?);
            if let Some(base_url) = &config.provider.base_url {
                provider = provider.with_base_url(base_url);
            }
            Arc::new(provider)
        }
        "openai" => Arc::new(OpenAiCompatProvider::openai(require_key(config)?)),
        "openrouter" => Arc::new(OpenAiCompatProvider::openrouter(require_key(config)?)),
        "ollama" => Arc::new(OpenAiCompatProvider::ollama(
            config.provider.base_url.as_deref(),
        )),
        other => bail!(
            "Unknown provider kind '{other}' \
             (expected anthropic, openai, openrouter, ollama, or scripted)"
        ),
    };
    Ok(provider)
}

fn require_key(config: &CliConfig) -> anyhow::Result<&str> {
    match &config.provider.api_key {
        Some(key) => Ok(key),
        None => bail!(
            "No API key configured for provider '{}'.\n\
             Set the TROUPE_API_KEY environment variable or add \
             provider.api_key to troupe.toml.",
            config.provider.kind
        ),
    }
}
