//! Bounded action history, the agent's short-term memory.
//!
//! Every executed (or failed) planned step appends exactly one entry.
//! The buffer is a FIFO ring: once the configured maximum is exceeded the
//! oldest entry is evicted outright, never summarized. The retained window
//! is rendered oldest-first into each user prompt.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;

use crate::action::Parameters;
use crate::error::StepError;

/// The result of one planned step.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepOutcome {
    /// Handler completed; carries its result value.
    Success(serde_json::Value),
    /// Validation or execution failed; carries the step-local error.
    #[serde(serialize_with = "serialize_step_error")]
    Failed(StepError),
}

fn serialize_step_error<S: serde::Serializer>(
    err: &StepError,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(&err.to_string())
}

impl StepOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, StepOutcome::Success(_))
    }
}

/// One recorded step: what ran, with what, and how it went.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryEntry {
    /// Loop step (model-call cycle) this entry belongs to.
    pub step: u64,

    /// Executed action name. `None` for reply-level parse failures, which
    /// belong to no single action.
    pub action: Option<String>,

    /// Parameters the step was invoked with.
    pub parameters: Parameters,

    /// The model's step-specific reasoning.
    pub reasoning: String,

    pub outcome: StepOutcome,

    pub timestamp: DateTime<Utc>,
}

impl HistoryEntry {
    /// Record an executed action step.
    pub fn action(
        step: u64,
        action: impl Into<String>,
        parameters: Parameters,
        reasoning: impl Into<String>,
        outcome: StepOutcome,
    ) -> Self {
        Self {
            step,
            action: Some(action.into()),
            parameters,
            reasoning: reasoning.into(),
            outcome,
            timestamp: Utc::now(),
        }
    }

    /// Record a reply that could not be decoded at all.
    pub fn parse_failure(step: u64, error: StepError) -> Self {
        Self {
            step,
            action: None,
            parameters: Parameters::new(),
            reasoning: String::new(),
            outcome: StepOutcome::Failed(error),
            timestamp: Utc::now(),
        }
    }
}

/// Bounded FIFO of history entries.
///
/// Owned by one agent for the duration of a run; never shared across
/// concurrent runs.
#[derive(Debug, Serialize)]
pub struct History {
    entries: VecDeque<HistoryEntry>,
    max_len: usize,
}

impl History {
    /// Create a history keeping at most `max_len` entries.
    pub fn new(max_len: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(max_len),
            max_len,
        }
    }

    /// Append an entry, evicting the oldest beyond capacity.
    pub fn push(&mut self, entry: HistoryEntry) {
        self.entries.push_back(entry);
        while self.entries.len() > self.max_len {
            self.entries.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Retained entries, oldest first.
    pub fn entries(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    /// Drain the history into a plain vector (for the final run report).
    pub fn into_entries(self) -> Vec<HistoryEntry> {
        self.entries.into()
    }

    /// Render the retained window for the user prompt, oldest first.
    pub fn render(&self) -> String {
        if self.entries.is_empty() {
            return "No previous actions taken.".into();
        }

        self.entries
            .iter()
            .map(|entry| {
                let name = entry.action.as_deref().unwrap_or("(unparsed reply)");
                let outcome = match &entry.outcome {
                    StepOutcome::Success(value) => format!("ok: {value}"),
                    StepOutcome::Failed(err) => format!("error: {err}"),
                };
                format!(
                    "- {} ({}): {}\n  Result: {}",
                    name,
                    entry.timestamp.to_rfc3339(),
                    entry.reasoning,
                    outcome
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}
