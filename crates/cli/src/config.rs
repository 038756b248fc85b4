//! CLI configuration: `troupe.toml` with environment variable overrides.
//!
//! Every run parameter the loop consults comes from here; a missing file
//! falls back to defaults that work with the scripted provider, so
//! `troupe run --scripted` needs no setup at all.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use troupe_core::CharacterProfile;
use troupe_core::run::RunConfig;

/// The root configuration structure. Maps directly to `troupe.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct CliConfig {
    /// Provider selection and credentials.
    #[serde(default)]
    pub provider: ProviderConfig,

    /// The character the agent plays.
    #[serde(default)]
    pub character: CharacterConfig,

    /// Run parameters handed to the loop.
    #[serde(default = "default_run")]
    pub run: RunConfig,

    /// Default goal when `--goal` is not given.
    #[serde(default = "default_goal")]
    pub goal: String,
}

fn default_run() -> RunConfig {
    let mut run = RunConfig::new(default_model());
    run.terminate_action = Some("log_off".into());
    run
}

fn default_model() -> String {
    "claude-sonnet-4-20250514".into()
}

fn default_goal() -> String {
    "Take a few in-character actions in the sandbox, then log off.".into()
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            provider: ProviderConfig::default(),
            character: CharacterConfig::default(),
            run: default_run(),
            goal: default_goal(),
        }
    }
}

impl CliConfig {
    /// Load from the given path, falling back to defaults when the file
    /// does not exist. The `TROUPE_API_KEY` environment variable overrides
    /// any key from the file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let mut config = if path.exists() {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            toml::from_str(&text)
                .with_context(|| format!("Failed to parse {}", path.display()))?
        } else {
            Self::default()
        };

        if let Ok(key) = std::env::var("TROUPE_API_KEY") {
            if !key.is_empty() {
                config.provider.api_key = Some(key);
            }
        }
        Ok(config)
    }
}

impl std::fmt::Debug for CliConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CliConfig")
            .field("provider", &self.provider)
            .field("character", &self.character)
            .field("run", &self.run)
            .field("goal", &self.goal)
            .finish()
    }
}

/// Which LLM backend to use, and how to reach it.
#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// One of: `anthropic`, `openai`, `openrouter`, `ollama`, `scripted`.
    #[serde(default = "default_kind")]
    pub kind: String,

    /// API key. Overridden by `TROUPE_API_KEY`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Custom base URL (proxies, Ollama hosts).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

fn default_kind() -> String {
    "anthropic".into()
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: default_kind(),
            api_key: None,
            base_url: None,
        }
    }
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("kind", &self.kind)
            .field("api_key", &redact(&self.api_key))
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// The character the agent plays, as written in the config file.
///
/// `name`, `personality`, and `tone` are the usual attributes; anything
/// else in the `[character]` table is carried along as an extra attribute
/// (sorted by key, so the rendered profile stays stable).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CharacterConfig {
    #[serde(default = "default_name")]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub personality: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tone: Option<String>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, String>,
}

fn default_name() -> String {
    "Luna".into()
}

impl Default for CharacterConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            personality: Some("curious and upbeat".into()),
            tone: Some("playful".into()),
            extra: BTreeMap::new(),
        }
    }
}

impl CharacterConfig {
    pub fn to_profile(&self) -> CharacterProfile {
        let mut profile = CharacterProfile::new().with("name", &self.name);
        if let Some(personality) = &self.personality {
            profile = profile.with("personality", personality);
        }
        if let Some(tone) = &self.tone {
            profile = profile.with("tone", tone);
        }
        for (key, value) in &self.extra {
            profile = profile.with(key, value);
        }
        profile
    }
}
