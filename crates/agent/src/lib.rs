//! The troupe execution loop.
//!
//! This crate turns the pieces defined in `troupe-core` into a running
//! agent: it composes prompts from the character, environment, and action
//! registry, sends them through a provider, parses the reply into a plan,
//! dispatches each planned step, and folds the outcomes into the bounded
//! history that feeds the next prompt.

pub mod composer;
pub mod loop_runner;
pub mod parser;
pub mod template;

pub use composer::PromptComposer;
pub use loop_runner::Agent;
pub use template::{
    DEFAULT_SYSTEM_TEMPLATE, DEFAULT_USER_TEMPLATE, PromptTemplate, SYSTEM_PLACEHOLDERS,
    USER_PLACEHOLDERS,
};
