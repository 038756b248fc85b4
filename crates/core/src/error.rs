//! Error types for the troupe domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error enum; `Error` aggregates them.
//!
//! Two families matter to the run loop:
//! - step-local errors ([`StepError`]) are recorded in history and the loop
//!   continues with the next planned step
//! - run-level errors ([`ProviderError`], [`EnvironmentError`]) are retried
//!   per policy and halt the run when retries exhaust

use thiserror::Error;

/// The top-level error type for all troupe operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Environment error: {0}")]
    Environment(#[from] EnvironmentError),

    #[error("Template error: {0}")]
    Template(#[from] TemplateError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Registration-time errors. Fatal: raised before any run starts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// A second action was registered under an already-taken name.
    /// The first registration always wins; nothing is overwritten.
    #[error("Duplicate action registration: {0}")]
    DuplicateAction(String),
}

/// Step-local errors. Recorded in history with the failing step; the loop
/// proceeds to the next planned step.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StepError {
    #[error("Unknown action: {0}")]
    UnknownAction(String),

    #[error("Action '{action}' missing required parameter '{parameter}'")]
    MissingParameter { action: String, parameter: String },

    #[error("Handler failed: {action}: {reason}")]
    Handler { action: String, reason: String },

    #[error("Handler timed out: {action} after {timeout_secs}s")]
    HandlerTimeout { action: String, timeout_secs: u64 },

    #[error("Malformed model response: {0}")]
    MalformedResponse(String),
}

/// A fault raised by an action handler. Converted to
/// [`StepError::Handler`] at the registry boundary; handlers never leak
/// uncaught faults into the loop.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct HandlerError(pub String);

impl HandlerError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

#[derive(Debug, Clone, Error)]
pub enum EnvironmentError {
    /// The environment could not produce its text. The loop treats this as
    /// step-fatal: no state text means no safe prompt.
    #[error("Environment unavailable: {0}")]
    Unavailable(String),
}

/// Prompt template construction and rendering errors. Fatal: a template
/// with an unfilled placeholder would silently corrupt every prompt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("Template is missing required placeholder '{{{0}}}'")]
    MissingPlaceholder(String),

    #[error("No value supplied for placeholder '{{{0}}}'")]
    UnfilledPlaceholder(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_error_displays_correctly() {
        let err = StepError::MissingParameter {
            action: "post_update".into(),
            parameter: "text".into(),
        };
        assert!(err.to_string().contains("post_update"));
        assert!(err.to_string().contains("text"));
    }

    #[test]
    fn provider_error_displays_correctly() {
        let err = Error::Provider(ProviderError::ApiError {
            status_code: 429,
            message: "Too many requests".into(),
        });
        assert!(err.to_string().contains("429"));
        assert!(err.to_string().contains("Too many requests"));
    }

    #[test]
    fn registry_error_carries_action_name() {
        let err = RegistryError::DuplicateAction("echo".into());
        assert!(err.to_string().contains("echo"));
    }

    #[test]
    fn template_error_shows_placeholder_braces() {
        let err = TemplateError::MissingPlaceholder("world_description".into());
        assert!(err.to_string().contains("{world_description}"));
    }
}
