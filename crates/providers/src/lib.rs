//! LLM Provider implementations for troupe.
//!
//! All providers implement the `troupe_core::Provider` trait; the loop
//! never knows which backend is behind a request.

pub mod anthropic;
pub mod openai_compat;
pub mod scripted;

pub use anthropic::AnthropicProvider;
pub use openai_compat::OpenAiCompatProvider;
pub use scripted::ScriptedProvider;
