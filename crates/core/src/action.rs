//! Actions, the operations a character can take in its environment.
//!
//! An action couples a declarative schema (name, description, required
//! parameters, example) with a handler implementing [`ActionHandler`].
//! The registry owns all registered actions and renders them into the
//! prompt block the model plans against.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;

use crate::error::{HandlerError, RegistryError, StepError};

/// Parameter values for one action invocation, as decoded from the model.
pub type Parameters = serde_json::Map<String, Value>;

/// The capability interface every action handler implements.
///
/// Handlers may perform I/O against the environment. Any fault must be
/// returned as a [`HandlerError`]; nothing unstructured crosses this
/// boundary.
#[async_trait]
pub trait ActionHandler: Send + Sync {
    /// Execute the action with the given parameters.
    ///
    /// Parameters beyond the declared schema may be present; handlers are
    /// free to use or ignore them.
    async fn execute(&self, parameters: &Parameters) -> std::result::Result<Value, HandlerError>;
}

struct FnHandler<F>(F);

#[async_trait]
impl<F, Fut> ActionHandler for FnHandler<F>
where
    F: Fn(Parameters) -> Fut + Send + Sync,
    Fut: Future<Output = std::result::Result<Value, HandlerError>> + Send,
{
    async fn execute(&self, parameters: &Parameters) -> std::result::Result<Value, HandlerError> {
        (self.0)(parameters.clone()).await
    }
}

/// Wrap an async closure as an [`ActionHandler`].
///
/// Registration-site ergonomics for demos and tests; long-lived actions
/// usually implement the trait on a named type.
pub fn handler_fn<F, Fut>(f: F) -> Box<dyn ActionHandler>
where
    F: Fn(Parameters) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = std::result::Result<Value, HandlerError>> + Send + 'static,
{
    Box::new(FnHandler(f))
}

/// A declared parameter: name plus the description shown to the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamSpec {
    pub name: String,
    pub description: String,
}

/// One registered action: schema plus handler.
///
/// Invariant: `required_params` must name exactly the parameters the
/// handler expects; the registry validates presence against this list
/// before dispatch.
pub struct ActionDefinition {
    pub name: String,
    pub description: String,
    pub required_params: Vec<ParamSpec>,
    /// A sample invocation rendered into the prompt (parameters object).
    pub example: Value,
    handler: Box<dyn ActionHandler>,
}

impl ActionDefinition {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        handler: Box<dyn ActionHandler>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            required_params: Vec::new(),
            example: Value::Null,
            handler,
        }
    }

    /// Declare a required parameter.
    pub fn with_param(mut self, name: impl Into<String>, description: impl Into<String>) -> Self {
        self.required_params.push(ParamSpec {
            name: name.into(),
            description: description.into(),
        });
        self
    }

    /// Attach a sample parameters object for the prompt.
    pub fn with_example(mut self, example: Value) -> Self {
        self.example = example;
        self
    }

    /// Check that every declared parameter is present.
    ///
    /// Extra, undeclared parameters are tolerated and passed through.
    pub fn validate(&self, parameters: &Parameters) -> std::result::Result<(), StepError> {
        for param in &self.required_params {
            if !parameters.contains_key(&param.name) {
                return Err(StepError::MissingParameter {
                    action: self.name.clone(),
                    parameter: param.name.clone(),
                });
            }
        }
        Ok(())
    }

    /// Run the handler.
    pub async fn execute(
        &self,
        parameters: &Parameters,
    ) -> std::result::Result<Value, HandlerError> {
        self.handler.execute(parameters).await
    }
}

impl std::fmt::Debug for ActionDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionDefinition")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("required_params", &self.required_params)
            .field("example", &self.example)
            .finish_non_exhaustive()
    }
}

/// A registry of the actions available to one agent.
///
/// Insertion order is preserved so [`ActionRegistry::render_for_prompt`]
/// is byte-stable for a given registry state. Registration completes
/// before a run starts; afterwards the registry is read-only and safe to
/// share across agents behind an `Arc`.
#[derive(Default)]
pub struct ActionRegistry {
    actions: Vec<ActionDefinition>,
    index: HashMap<String, usize>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an action.
    ///
    /// Rejects a duplicate name outright; the first registration's handler
    /// is never replaced. Silent overwrites would let the prompt and the
    /// dispatched behavior drift apart.
    pub fn register(
        &mut self,
        definition: ActionDefinition,
    ) -> std::result::Result<(), RegistryError> {
        if self.index.contains_key(&definition.name) {
            return Err(RegistryError::DuplicateAction(definition.name));
        }
        self.index
            .insert(definition.name.clone(), self.actions.len());
        self.actions.push(definition);
        Ok(())
    }

    /// Look up an action by name.
    pub fn get(&self, name: &str) -> std::result::Result<&ActionDefinition, StepError> {
        self.index
            .get(name)
            .map(|&i| &self.actions[i])
            .ok_or_else(|| StepError::UnknownAction(name.to_string()))
    }

    /// All registered action names, in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.actions.iter().map(|a| a.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Render every action as a prompt-ready text block.
    ///
    /// Deterministic and ordered: this text is part of the composed
    /// prompt's debug surface, so two renders of the same registry must be
    /// byte-identical.
    pub fn render_for_prompt(&self) -> String {
        if self.actions.is_empty() {
            return "(no actions registered)".into();
        }

        let mut out = String::new();
        for action in &self.actions {
            out.push_str(&format!("### {}\n{}\n", action.name, action.description));
            if action.required_params.is_empty() {
                out.push_str("Required parameters: (none)\n");
            } else {
                out.push_str("Required parameters:\n");
                for param in &action.required_params {
                    out.push_str(&format!("  - {}: {}\n", param.name, param.description));
                }
            }
            if !action.example.is_null() {
                // serde_json sorts object keys, so this line is stable too.
                out.push_str(&format!(
                    "Example: {{\"action\":\"{}\",\"parameters\":{}}}\n",
                    action.name,
                    serde_json::to_string(&action.example).unwrap_or_else(|_| "{}".into())
                ));
            }
            out.push('\n');
        }
        out.trim_end().to_string()
    }
}
