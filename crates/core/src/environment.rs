//! Environment trait, the abstraction over the world the agent acts in.
//!
//! An environment supplies three pieces of prompt text: a world
//! description, the current state, and behavioral guidelines. State may
//! change between steps, so the loop calls these fresh on every prompt
//! cycle and never caches the results.
//!
//! Implementations: in-process sandboxes for demos and tests; anything
//! network-backed (a social platform, a game server) plugs in behind this
//! trait without the loop knowing.

use async_trait::async_trait;

use crate::error::EnvironmentError;

/// The capability interface an environment implements.
#[async_trait]
pub trait Environment: Send + Sync {
    /// A short name for logs (e.g., "sandbox").
    fn name(&self) -> &str;

    /// Static description of the world and what the agent can do in it.
    async fn world_description(&self) -> std::result::Result<String, EnvironmentError>;

    /// Current state of the environment, recomputed per call.
    async fn state_descriptions(&self) -> std::result::Result<String, EnvironmentError>;

    /// Behavioral guidelines the character should follow here.
    async fn guidelines(&self) -> std::result::Result<String, EnvironmentError>;
}

/// An environment with fixed texts. Handy for tests and as a starting
/// point for simple scripted worlds.
#[derive(Debug, Clone)]
pub struct StaticEnvironment {
    pub world: String,
    pub state: String,
    pub guidelines: String,
}

impl StaticEnvironment {
    pub fn new(
        world: impl Into<String>,
        state: impl Into<String>,
        guidelines: impl Into<String>,
    ) -> Self {
        Self {
            world: world.into(),
            state: state.into(),
            guidelines: guidelines.into(),
        }
    }
}

#[async_trait]
impl Environment for StaticEnvironment {
    fn name(&self) -> &str {
        "static"
    }

    async fn world_description(&self) -> std::result::Result<String, EnvironmentError> {
        Ok(self.world.clone())
    }

    async fn state_descriptions(&self) -> std::result::Result<String, EnvironmentError> {
        Ok(self.state.clone())
    }

    async fn guidelines(&self) -> std::result::Result<String, EnvironmentError> {
        Ok(self.guidelines.clone())
    }
}
