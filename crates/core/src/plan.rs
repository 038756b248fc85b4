//! Wire types for the model's structured reply.
//!
//! The only wire contract the loop depends on: one JSON object with a
//! top-level `reasoning` and an ordered `plan` of steps. Decoding is a
//! strict boundary; anything that does not fit this shape is a malformed
//! response, and partially-decoded data never flows past it.

use serde::{Deserialize, Serialize};

use crate::action::Parameters;

/// The decoded model response: overall reasoning plus an ordered plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelReply {
    /// The model's overall strategy for this step.
    #[serde(default)]
    pub reasoning: String,

    /// Ordered actions to execute. Consumed entirely before the next
    /// model call.
    pub plan: Vec<PlannedStep>,
}

/// One proposed action within a plan. Transient: produced fresh each
/// parse cycle, not persisted beyond execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannedStep {
    /// Step-specific reasoning.
    #[serde(default)]
    pub reasoning: String,

    /// Name reference into the action registry.
    pub action: String,

    /// Parameter values for the handler.
    #[serde(default)]
    pub parameters: Parameters,
}
