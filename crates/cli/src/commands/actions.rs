//! `troupe actions` — show the sandbox actions as the model sees them.

use std::sync::Arc;

use crate::config::CharacterConfig;
use crate::sandbox::{Feed, sandbox_registry};

pub fn run() -> anyhow::Result<()> {
    let feed = Arc::new(Feed::default());
    let registry = sandbox_registry(feed, &CharacterConfig::default().name)?;
    println!("{}", registry.render_for_prompt());
    Ok(())
}
