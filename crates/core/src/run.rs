//! Run configuration, retry policy, and the final run report.
//!
//! Every knob the loop consults is an explicit field here; nothing is
//! baked into loop logic as a hidden default.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

use crate::history::HistoryEntry;

/// Configuration for one agent run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Model passed through to the provider.
    pub model: String,

    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Max tokens per provider response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Maximum model-call cycles before the run stops.
    #[serde(default = "default_max_steps")]
    pub max_steps: u64,

    /// Maximum history entries retained and rendered into prompts.
    #[serde(default = "default_max_history")]
    pub max_history: usize,

    /// Timeout for a single provider call, in seconds.
    #[serde(default = "default_provider_timeout")]
    pub provider_timeout_secs: u64,

    /// Timeout for a single action handler, in seconds. One misbehaving
    /// handler must not stall the whole run.
    #[serde(default = "default_action_timeout")]
    pub action_timeout_secs: u64,

    /// Retry policy for provider and environment failures.
    #[serde(default)]
    pub retry: RetryPolicy,

    /// Action whose successful execution ends the run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terminate_action: Option<String>,
}

fn default_temperature() -> f32 {
    0.7
}
fn default_max_steps() -> u64 {
    5
}
fn default_max_history() -> usize {
    5
}
fn default_provider_timeout() -> u64 {
    120
}
fn default_action_timeout() -> u64 {
    30
}

impl RunConfig {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            temperature: default_temperature(),
            max_tokens: None,
            max_steps: default_max_steps(),
            max_history: default_max_history(),
            provider_timeout_secs: default_provider_timeout(),
            action_timeout_secs: default_action_timeout(),
            retry: RetryPolicy::default(),
            terminate_action: None,
        }
    }

    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.provider_timeout_secs)
    }

    pub fn action_timeout(&self) -> Duration {
        Duration::from_secs(self.action_timeout_secs)
    }
}

/// Bounded exponential backoff for step-fatal, run-recoverable failures.
///
/// No jitter: a single agent run has no thundering-herd concern, and
/// deterministic delays keep loop tests reproducible.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Base delay before the first retry, in milliseconds.
    pub base_delay_ms: u64,
    /// Multiplier applied per subsequent retry.
    pub backoff_factor: f64,
    /// Cap on any single delay, in milliseconds.
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1_000,
            backoff_factor: 2.0,
            max_delay_ms: 30_000,
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (1-indexed; 0 means none).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        let delay_ms =
            self.base_delay_ms as f64 * self.backoff_factor.powi((attempt - 1) as i32);
        Duration::from_millis(delay_ms.min(self.max_delay_ms as f64) as u64)
    }

    /// Whether another attempt is allowed after `attempts_made` attempts.
    pub fn should_retry(&self, attempts_made: u32) -> bool {
        attempts_made < self.max_attempts
    }
}

/// Where the loop currently is. Emitted as a structured log field so a
/// run's progress is traceable step by step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Composing,
    AwaitingModel,
    Parsing,
    Executing,
    Stopped,
}

/// Why a run ended normally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The configured step limit was reached.
    StepLimit,
    /// The designated terminate action executed successfully.
    Terminated,
}

/// Terminal status of a run. A run always ends in one of these; never a
/// silent hang or an unexplained partial stop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunStatus {
    /// Normal termination.
    Stopped { reason: StopReason },
    /// A step-fatal failure exhausted its retries. `cause` identifies the
    /// failing subsystem and detail; history up to this point is intact.
    Failed { step: u64, cause: String },
}

/// The complete record of one run.
#[derive(Debug, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Model-call cycles completed.
    pub steps_completed: u64,
    pub status: RunStatus,
    /// The retained history window at the end of the run.
    pub history: Vec<HistoryEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults() {
        let config = RunConfig::new("test-model");
        assert_eq!(config.max_steps, 5);
        assert_eq!(config.max_history, 5);
        assert_eq!(config.provider_timeout_secs, 120);
        assert!(config.terminate_action.is_none());
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let config: RunConfig = serde_json::from_str(r#"{"model": "m"}"#).unwrap();
        assert_eq!(config.model, "m");
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.action_timeout_secs, 30);
    }

    #[test]
    fn backoff_grows_and_caps() {
        let policy = RetryPolicy {
            max_attempts: 5,
            base_delay_ms: 100,
            backoff_factor: 2.0,
            max_delay_ms: 350,
        };
        assert_eq!(policy.delay_for(0), Duration::ZERO);
        assert_eq!(policy.delay_for(1), Duration::from_millis(100));
        assert_eq!(policy.delay_for(2), Duration::from_millis(200));
        // 400ms computed, capped to 350ms.
        assert_eq!(policy.delay_for(3), Duration::from_millis(350));
    }

    #[test]
    fn retry_bound() {
        let policy = RetryPolicy::default();
        assert!(policy.should_retry(1));
        assert!(policy.should_retry(2));
        assert!(!policy.should_retry(3));
    }

    #[test]
    fn run_status_serializes_tagged() {
        let status = RunStatus::Stopped {
            reason: StopReason::StepLimit,
        };
        let json = serde_json::to_string(&status).unwrap();
        assert!(json.contains("stopped"));
        assert!(json.contains("step_limit"));
    }
}
