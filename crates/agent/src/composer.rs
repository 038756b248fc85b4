//! Prompt composition: pure functions from gathered texts to prompts.
//!
//! The composer holds the two templates and fills them. It owns no state
//! and touches no I/O; the loop gathers environment texts and history and
//! passes them in, so composition is trivially testable.

use troupe_core::CharacterProfile;
use troupe_core::error::TemplateError;

use crate::template::{
    DEFAULT_SYSTEM_TEMPLATE, DEFAULT_USER_TEMPLATE, PromptTemplate, SYSTEM_PLACEHOLDERS,
    USER_PLACEHOLDERS,
};

/// Fills the system template (once per run) and the user template (every
/// step).
#[derive(Debug, Clone)]
pub struct PromptComposer {
    system_template: PromptTemplate,
    user_template: PromptTemplate,
}

impl PromptComposer {
    /// Compose with custom templates. Each template must carry the
    /// placeholders its fill method supplies.
    pub fn new(system_template: PromptTemplate, user_template: PromptTemplate) -> Self {
        Self {
            system_template,
            user_template,
        }
    }

    /// Compose with the built-in default templates.
    pub fn with_defaults() -> std::result::Result<Self, TemplateError> {
        Ok(Self::new(
            PromptTemplate::new(DEFAULT_SYSTEM_TEMPLATE, SYSTEM_PLACEHOLDERS)?,
            PromptTemplate::new(DEFAULT_USER_TEMPLATE, USER_PLACEHOLDERS)?,
        ))
    }

    /// Fill the run-level system prompt.
    pub fn system_prompt(
        &self,
        character: &CharacterProfile,
        world_description: &str,
        available_actions: &str,
        guidelines: &str,
    ) -> std::result::Result<String, TemplateError> {
        self.system_template.render(&[
            ("character_info", &character.render()),
            ("world_description", world_description),
            ("available_actions", available_actions),
            ("agent_guidelines", guidelines),
        ])
    }

    /// Fill the per-step user prompt.
    pub fn user_prompt(
        &self,
        state: &str,
        action_history: &str,
        goal: &str,
    ) -> std::result::Result<String, TemplateError> {
        self.user_template.render(&[
            ("state", state),
            ("action_history", action_history),
            ("goal", goal),
        ])
    }
}
