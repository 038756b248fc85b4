//! # Troupe Core
//!
//! Domain types, traits, and error definitions for the troupe
//! character-agent runtime. This crate has **zero framework dependencies**;
//! it defines the domain model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every external collaborator is defined as a trait here: the LLM backend
//! ([`Provider`]), the world the agent acts in ([`Environment`]), and the
//! operations it can take ([`ActionHandler`]). Implementations live in
//! their respective crates, so they swap freely and tests run against
//! in-process fakes.

pub mod action;
pub mod character;
pub mod environment;
pub mod error;
pub mod history;
pub mod plan;
pub mod provider;
pub mod run;

// Re-export key types at crate root for ergonomics
pub use action::{ActionDefinition, ActionHandler, ActionRegistry, Parameters, handler_fn};
pub use character::CharacterProfile;
pub use environment::{Environment, StaticEnvironment};
pub use error::{
    EnvironmentError, Error, HandlerError, ProviderError, RegistryError, Result, StepError,
    TemplateError,
};
pub use history::{History, HistoryEntry, StepOutcome};
pub use plan::{ModelReply, PlannedStep};
pub use provider::{CompletionRequest, CompletionResponse, Provider, Usage};
pub use run::{Phase, RetryPolicy, RunConfig, RunReport, RunStatus, StopReason};
