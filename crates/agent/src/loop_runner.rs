//! The agent execution loop.
//!
//! One step is a full compose, call, parse, execute cycle:
//!
//! `Idle -> Composing -> AwaitingModel -> Parsing -> Executing -> Idle`
//!
//! with a terminal `Stopped` on step-limit exhaustion, a successful
//! terminate action, or an exhausted retry budget. Steps within one plan
//! execute strictly in the order the model emitted them; actions may have
//! side effects with sequential dependencies the model assumed.
//!
//! History entries are appended only after a planned step has been
//! validated and executed, so cancelling an in-flight provider call never
//! leaves a partial entry behind.

use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use troupe_core::action::ActionRegistry;
use troupe_core::character::CharacterProfile;
use troupe_core::environment::Environment;
use troupe_core::error::{EnvironmentError, Error, ProviderError, StepError};
use troupe_core::history::{History, HistoryEntry, StepOutcome};
use troupe_core::plan::{ModelReply, PlannedStep};
use troupe_core::provider::{CompletionRequest, Provider};
use troupe_core::run::{Phase, RunConfig, RunReport, RunStatus, StopReason};

use crate::composer::PromptComposer;
use crate::parser;

/// A character agent: everything one run needs, wired together.
///
/// The registry is read-only once a run starts and may be shared across
/// agents; the history is created per run and never shared.
pub struct Agent {
    provider: Arc<dyn Provider>,
    environment: Arc<dyn Environment>,
    registry: Arc<ActionRegistry>,
    character: CharacterProfile,
    composer: PromptComposer,
    config: RunConfig,
}

impl Agent {
    /// Create an agent with the default prompt templates.
    pub fn new(
        provider: Arc<dyn Provider>,
        environment: Arc<dyn Environment>,
        registry: Arc<ActionRegistry>,
        character: CharacterProfile,
        config: RunConfig,
    ) -> Result<Self, Error> {
        Ok(Self {
            provider,
            environment,
            registry,
            character,
            composer: PromptComposer::with_defaults()?,
            config,
        })
    }

    /// Replace the prompt composer (custom templates).
    pub fn with_composer(mut self, composer: PromptComposer) -> Self {
        self.composer = composer;
        self
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Run the loop until a stop condition or a fatal failure.
    ///
    /// Always returns a report: either a normal stop or a surfaced fatal
    /// error naming the step and cause, with the retained history intact
    /// either way.
    pub async fn run(&self, goal: &str) -> RunReport {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let mut history = History::new(self.config.max_history);
        let mut steps_completed = 0u64;

        info!(
            %run_id,
            environment = self.environment.name(),
            provider = self.provider.name(),
            model = %self.config.model,
            max_steps = self.config.max_steps,
            "Starting agent run"
        );

        // Character info and the action block are static for the life of
        // the run, so the system prompt is composed exactly once.
        let system_prompt = match self.compose_system_prompt().await {
            Ok(prompt) => prompt,
            Err(cause) => {
                return self.finish(run_id, started_at, 0, RunStatus::Failed { step: 0, cause }, history);
            }
        };

        for step in 0..self.config.max_steps {
            self.trace_phase(run_id, step, Phase::Composing);
            let user_prompt = match self.compose_user_prompt(&history, goal).await {
                Ok(prompt) => prompt,
                Err(cause) => {
                    return self.finish(
                        run_id,
                        started_at,
                        steps_completed,
                        RunStatus::Failed { step, cause },
                        history,
                    );
                }
            };

            self.trace_phase(run_id, step, Phase::AwaitingModel);
            let content = match self.call_provider(&system_prompt, &user_prompt).await {
                Ok(content) => content,
                Err(cause) => {
                    return self.finish(
                        run_id,
                        started_at,
                        steps_completed,
                        RunStatus::Failed { step, cause },
                        history,
                    );
                }
            };

            self.trace_phase(run_id, step, Phase::Parsing);
            let reply = match parser::parse_reply(&content) {
                Ok(reply) => reply,
                Err(err) => {
                    // One bad model reply is an empty plan, not a crash.
                    warn!(step, error = %err, "Model reply did not decode");
                    history.push(HistoryEntry::parse_failure(step, err));
                    steps_completed = step + 1;
                    continue;
                }
            };

            self.trace_phase(run_id, step, Phase::Executing);
            let terminated = self.execute_plan(step, &reply, &mut history).await;
            steps_completed = step + 1;

            if terminated {
                return self.finish(
                    run_id,
                    started_at,
                    steps_completed,
                    RunStatus::Stopped {
                        reason: StopReason::Terminated,
                    },
                    history,
                );
            }
            self.trace_phase(run_id, step, Phase::Idle);
        }

        self.finish(
            run_id,
            started_at,
            steps_completed,
            RunStatus::Stopped {
                reason: StopReason::StepLimit,
            },
            history,
        )
    }

    /// Execute every planned step in order, recording one history entry
    /// each. Returns true when the terminate action fired.
    async fn execute_plan(&self, step: u64, reply: &ModelReply, history: &mut History) -> bool {
        debug!(step, planned = reply.plan.len(), "Executing plan");

        for planned in &reply.plan {
            let outcome = self.execute_step(planned).await;
            let succeeded = outcome.is_success();

            history.push(HistoryEntry::action(
                step,
                planned.action.clone(),
                planned.parameters.clone(),
                planned.reasoning.clone(),
                outcome,
            ));

            if succeeded && self.config.terminate_action.as_deref() == Some(planned.action.as_str())
            {
                info!(step, action = %planned.action, "Terminate action executed, stopping run");
                return true;
            }
        }
        false
    }

    /// Validate and dispatch one planned step. All failures come back as a
    /// recorded outcome; nothing propagates to abort sibling steps.
    async fn execute_step(&self, planned: &PlannedStep) -> StepOutcome {
        let definition = match parser::validate_step(&self.registry, planned) {
            Ok(definition) => definition,
            Err(err) => {
                warn!(action = %planned.action, error = %err, "Planned step rejected");
                return StepOutcome::Failed(err);
            }
        };

        let timeout = self.config.action_timeout();
        match tokio::time::timeout(timeout, definition.execute(&planned.parameters)).await {
            Ok(Ok(value)) => {
                debug!(action = %planned.action, "Action executed");
                StepOutcome::Success(value)
            }
            Ok(Err(err)) => {
                warn!(action = %planned.action, error = %err, "Action handler failed");
                StepOutcome::Failed(StepError::Handler {
                    action: planned.action.clone(),
                    reason: err.to_string(),
                })
            }
            Err(_) => {
                warn!(action = %planned.action, timeout_secs = self.config.action_timeout_secs, "Action handler timed out");
                StepOutcome::Failed(StepError::HandlerTimeout {
                    action: planned.action.clone(),
                    timeout_secs: self.config.action_timeout_secs,
                })
            }
        }
    }

    async fn compose_system_prompt(&self) -> Result<String, String> {
        let world = self
            .env_text("world_description", || self.environment.world_description())
            .await?;
        let guidelines = self
            .env_text("guidelines", || self.environment.guidelines())
            .await?;
        let actions = self.registry.render_for_prompt();

        self.composer
            .system_prompt(&self.character, &world, &actions, &guidelines)
            .map_err(|e| format!("system template: {e}"))
    }

    async fn compose_user_prompt(&self, history: &History, goal: &str) -> Result<String, String> {
        let state = self
            .env_text("state_descriptions", || {
                self.environment.state_descriptions()
            })
            .await?;

        self.composer
            .user_prompt(&state, &history.render(), goal)
            .map_err(|e| format!("user template: {e}"))
    }

    /// Fetch one environment text, retrying per policy. Exhaustion is
    /// fatal for the run: no state text means no safe prompt.
    async fn env_text<F, Fut>(&self, what: &str, fetch: F) -> Result<String, String>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = std::result::Result<String, EnvironmentError>>,
    {
        let mut attempts = 0u32;
        loop {
            attempts += 1;
            match fetch().await {
                Ok(text) => return Ok(text),
                Err(err) => {
                    if self.config.retry.should_retry(attempts) {
                        let delay = self.config.retry.delay_for(attempts);
                        warn!(
                            what,
                            attempt = attempts,
                            delay_ms = delay.as_millis() as u64,
                            error = %err,
                            "Environment call failed, retrying"
                        );
                        tokio::time::sleep(delay).await;
                    } else {
                        return Err(format!(
                            "environment {what} failed after {attempts} attempts: {err}"
                        ));
                    }
                }
            }
        }
    }

    /// Call the provider under the configured timeout, retrying with
    /// backoff. An abandoned attempt leaves no history entry.
    async fn call_provider(&self, system_prompt: &str, user_prompt: &str) -> Result<String, String> {
        let mut attempts = 0u32;
        loop {
            attempts += 1;
            let request = CompletionRequest {
                model: self.config.model.clone(),
                system_prompt: system_prompt.into(),
                user_prompt: user_prompt.into(),
                temperature: self.config.temperature,
                max_tokens: self.config.max_tokens,
            };

            let outcome =
                tokio::time::timeout(self.config.provider_timeout(), self.provider.complete(request))
                    .await;

            let err = match outcome {
                Ok(Ok(response)) => {
                    if let Some(usage) = &response.usage {
                        debug!(
                            prompt_tokens = usage.prompt_tokens,
                            completion_tokens = usage.completion_tokens,
                            "Provider usage"
                        );
                    }
                    return Ok(response.content);
                }
                Ok(Err(err)) => err,
                Err(_) => ProviderError::Timeout(format!(
                    "Provider '{}' timed out after {}s",
                    self.provider.name(),
                    self.config.provider_timeout_secs
                )),
            };

            if self.config.retry.should_retry(attempts) {
                let delay = self.config.retry.delay_for(attempts);
                warn!(
                    attempt = attempts,
                    max = self.config.retry.max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "Provider call failed, retrying"
                );
                tokio::time::sleep(delay).await;
            } else {
                return Err(format!(
                    "provider '{}' failed after {attempts} attempts: {err}",
                    self.provider.name()
                ));
            }
        }
    }

    fn trace_phase(&self, run_id: Uuid, step: u64, phase: Phase) {
        debug!(%run_id, step, phase = ?phase, "Loop phase");
    }

    fn finish(
        &self,
        run_id: Uuid,
        started_at: chrono::DateTime<Utc>,
        steps_completed: u64,
        status: RunStatus,
        history: History,
    ) -> RunReport {
        match &status {
            RunStatus::Stopped { reason } => {
                info!(%run_id, steps_completed, reason = ?reason, "Run stopped")
            }
            RunStatus::Failed { step, cause } => {
                warn!(%run_id, step, cause = %cause, "Run failed")
            }
        }
        self.trace_phase(run_id, steps_completed, Phase::Stopped);

        RunReport {
            run_id,
            started_at,
            finished_at: Utc::now(),
            steps_completed,
            status,
            history: history.into_entries(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use troupe_core::action::{ActionDefinition, Parameters, handler_fn};
    use troupe_core::environment::StaticEnvironment;
    use troupe_core::provider::CompletionResponse;
    use troupe_providers::ScriptedProvider;

    /// Records every user prompt it sees, then delegates to a script.
    struct RecordingProvider {
        inner: ScriptedProvider,
        prompts: Mutex<Vec<String>>,
    }

    impl RecordingProvider {
        fn new(replies: impl IntoIterator<Item = impl Into<String>>) -> Self {
            Self {
                inner: ScriptedProvider::new(replies),
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn prompts(&self) -> Vec<String> {
            self.prompts.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl Provider for RecordingProvider {
        fn name(&self) -> &str {
            "recording"
        }

        async fn complete(
            &self,
            request: CompletionRequest,
        ) -> std::result::Result<CompletionResponse, ProviderError> {
            self.prompts.lock().unwrap().push(request.user_prompt.clone());
            self.inner.complete(request).await
        }
    }

    /// Fails a fixed number of times, then delegates to a script.
    struct FlakyProvider {
        failures_left: Mutex<usize>,
        inner: ScriptedProvider,
    }

    #[async_trait::async_trait]
    impl Provider for FlakyProvider {
        fn name(&self) -> &str {
            "flaky"
        }

        async fn complete(
            &self,
            request: CompletionRequest,
        ) -> std::result::Result<CompletionResponse, ProviderError> {
            let should_fail = {
                let mut left = self.failures_left.lock().unwrap();
                if *left > 0 {
                    *left -= 1;
                    true
                } else {
                    false
                }
            };
            if should_fail {
                return Err(ProviderError::Network("connection reset".into()));
            }
            self.inner.complete(request).await
        }
    }

    struct FailingStateEnvironment;

    #[async_trait::async_trait]
    impl Environment for FailingStateEnvironment {
        fn name(&self) -> &str {
            "failing"
        }
        async fn world_description(&self) -> std::result::Result<String, EnvironmentError> {
            Ok("a world".into())
        }
        async fn state_descriptions(&self) -> std::result::Result<String, EnvironmentError> {
            Err(EnvironmentError::Unavailable("state store down".into()))
        }
        async fn guidelines(&self) -> std::result::Result<String, EnvironmentError> {
            Ok("- none".into())
        }
    }

    fn environment() -> Arc<StaticEnvironment> {
        Arc::new(StaticEnvironment::new(
            "a small test world",
            "all quiet",
            "- stay in character",
        ))
    }

    fn character() -> CharacterProfile {
        CharacterProfile::new().with("name", "Luna")
    }

    /// Registry with an `echo` action that counts invocations and records
    /// the parameters it saw.
    fn echo_registry() -> (Arc<ActionRegistry>, Arc<AtomicUsize>, Arc<Mutex<Vec<Parameters>>>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let handler_calls = calls.clone();
        let handler_seen = seen.clone();

        let mut registry = ActionRegistry::new();
        registry
            .register(
                ActionDefinition::new(
                    "echo",
                    "Echoes back the input",
                    handler_fn(move |params: Parameters| {
                        let calls = handler_calls.clone();
                        let seen = handler_seen.clone();
                        async move {
                            calls.fetch_add(1, Ordering::SeqCst);
                            let text = params
                                .get("text")
                                .and_then(Value::as_str)
                                .unwrap_or_default()
                                .to_string();
                            seen.lock().unwrap().push(params);
                            Ok(Value::String(text))
                        }
                    }),
                )
                .with_param("text", "the text to echo"),
            )
            .unwrap();

        (Arc::new(registry), calls, seen)
    }

    fn test_config() -> RunConfig {
        let mut config = RunConfig::new("test-model");
        config.max_steps = 1;
        config.retry.base_delay_ms = 1;
        config
    }

    fn agent(provider: Arc<dyn Provider>, registry: Arc<ActionRegistry>, config: RunConfig) -> Agent {
        Agent::new(provider, environment(), registry, character(), config).unwrap()
    }

    fn echo_reply(text: &str) -> String {
        format!(
            r#"{{"reasoning":"r","plan":[{{"reasoning":"r2","action":"echo","parameters":{{"text":"{text}"}}}}]}}"#
        )
    }

    const EMPTY_PLAN: &str = r#"{"reasoning":"nothing to do","plan":[]}"#;

    #[tokio::test]
    async fn echo_plan_executes_and_records_success() {
        let (registry, calls, seen) = echo_registry();
        let provider = Arc::new(ScriptedProvider::new([echo_reply("hi")]));
        let report = agent(provider, registry, test_config()).run("say hi").await;

        assert_eq!(
            report.status,
            RunStatus::Stopped {
                reason: StopReason::StepLimit
            }
        );
        assert_eq!(report.steps_completed, 1);
        assert_eq!(report.history.len(), 1);
        assert!(report.history[0].outcome.is_success());
        assert_eq!(report.history[0].action.as_deref(), Some("echo"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(seen.lock().unwrap()[0]["text"], json!("hi"));
    }

    #[tokio::test]
    async fn unknown_action_is_recorded_without_dispatch() {
        let (registry, calls, _) = echo_registry();
        let provider = Arc::new(ScriptedProvider::new([
            r#"{"reasoning":"r","plan":[{"reasoning":"r2","action":"noop_unregistered","parameters":{}}]}"#,
        ]));
        let report = agent(provider, registry, test_config()).run("goal").await;

        assert_eq!(report.history.len(), 1);
        match &report.history[0].outcome {
            StepOutcome::Failed(StepError::UnknownAction(name)) => {
                assert_eq!(name, "noop_unregistered")
            }
            other => panic!("Expected UnknownAction, got: {other:?}"),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn missing_parameter_is_recorded_without_dispatch() {
        let (registry, calls, _) = echo_registry();
        let provider = Arc::new(ScriptedProvider::new([
            r#"{"reasoning":"r","plan":[{"reasoning":"r2","action":"echo","parameters":{}}]}"#,
        ]));
        let report = agent(provider, registry, test_config()).run("goal").await;

        match &report.history[0].outcome {
            StepOutcome::Failed(StepError::MissingParameter { action, parameter }) => {
                assert_eq!(action, "echo");
                assert_eq!(parameter, "text");
            }
            other => panic!("Expected MissingParameter, got: {other:?}"),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn extra_parameters_reach_the_handler() {
        let (registry, _, seen) = echo_registry();
        let provider = Arc::new(ScriptedProvider::new([
            r#"{"reasoning":"r","plan":[{"action":"echo","parameters":{"text":"hi","mood":"upbeat"}}]}"#,
        ]));
        let report = agent(provider, registry, test_config()).run("goal").await;

        assert!(report.history[0].outcome.is_success());
        assert_eq!(seen.lock().unwrap()[0]["mood"], json!("upbeat"));
    }

    #[tokio::test]
    async fn plan_of_three_appends_three_entries_in_order() {
        let (registry, _, _) = echo_registry();
        let provider = Arc::new(ScriptedProvider::new([
            r#"{"reasoning":"r","plan":[
                {"action":"echo","parameters":{"text":"one"}},
                {"action":"vanish","parameters":{}},
                {"action":"echo","parameters":{"text":"three"}}
            ]}"#,
        ]));
        let report = agent(provider, registry, test_config()).run("goal").await;

        assert_eq!(report.history.len(), 3);
        assert_eq!(report.history[0].parameters["text"], json!("one"));
        assert!(matches!(
            report.history[1].outcome,
            StepOutcome::Failed(StepError::UnknownAction(_))
        ));
        assert_eq!(report.history[2].parameters["text"], json!("three"));
        assert!(report.history[2].outcome.is_success());
    }

    #[tokio::test]
    async fn malformed_reply_records_parse_failure_and_continues() {
        let (registry, _, _) = echo_registry();
        let provider = Arc::new(ScriptedProvider::new([
            "I refuse to answer in JSON.",
            EMPTY_PLAN,
        ]));
        let mut config = test_config();
        config.max_steps = 2;
        let report = agent(provider, registry, config).run("goal").await;

        assert_eq!(
            report.status,
            RunStatus::Stopped {
                reason: StopReason::StepLimit
            }
        );
        assert_eq!(report.steps_completed, 2);
        assert_eq!(report.history.len(), 1);
        assert!(report.history[0].action.is_none());
        assert!(matches!(
            report.history[0].outcome,
            StepOutcome::Failed(StepError::MalformedResponse(_))
        ));
    }

    #[tokio::test]
    async fn prompt_carries_only_the_retained_history_window() {
        let (registry, _, _) = echo_registry();
        let provider = Arc::new(RecordingProvider::new([
            echo_reply("m0"),
            echo_reply("m1"),
            echo_reply("m2"),
            echo_reply("m3"),
        ]));
        let mut config = test_config();
        config.max_steps = 4;
        config.max_history = 2;

        let report = agent(provider.clone(), registry, config).run("goal").await;
        assert_eq!(report.steps_completed, 4);

        let prompts = provider.prompts();
        assert_eq!(prompts.len(), 4);
        // Before any step the placeholder line renders.
        assert!(prompts[0].contains("No previous actions taken."));
        // Prompt for step 3 sees steps 1 and 2; step 0 was evicted.
        assert!(!prompts[3].contains("ok: \"m0\""));
        assert!(prompts[3].contains("ok: \"m1\""));
        assert!(prompts[3].contains("ok: \"m2\""));
        // Oldest retained entry renders first.
        assert!(prompts[3].find("m1").unwrap() < prompts[3].find("m2").unwrap());
    }

    #[tokio::test]
    async fn terminate_action_stops_run_and_skips_remaining_steps() {
        let echo_calls = Arc::new(AtomicUsize::new(0));
        let counter = echo_calls.clone();

        let mut registry = ActionRegistry::new();
        registry
            .register(ActionDefinition::new(
                "log_off",
                "End the session",
                handler_fn(|_| async { Ok(Value::Null) }),
            ))
            .unwrap();
        registry
            .register(ActionDefinition::new(
                "echo",
                "Echoes back the input",
                handler_fn(move |_| {
                    let counter = counter.clone();
                    async move {
                        counter.fetch_add(1, Ordering::SeqCst);
                        Ok(Value::Null)
                    }
                }),
            ))
            .unwrap();
        let registry = Arc::new(registry);

        let provider = Arc::new(ScriptedProvider::new([
            r#"{"reasoning":"r","plan":[
                {"action":"log_off","parameters":{}},
                {"action":"echo","parameters":{"text":"never"}}
            ]}"#,
        ]));
        let mut config = test_config();
        config.max_steps = 5;
        config.terminate_action = Some("log_off".into());

        let report = agent(provider, registry, config).run("goal").await;

        assert_eq!(
            report.status,
            RunStatus::Stopped {
                reason: StopReason::Terminated
            }
        );
        assert_eq!(report.steps_completed, 1);
        assert_eq!(report.history.len(), 1);
        assert_eq!(report.history[0].action.as_deref(), Some("log_off"));
        assert_eq!(echo_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn provider_flakiness_is_retried_to_success() {
        let (registry, calls, _) = echo_registry();
        let provider = Arc::new(FlakyProvider {
            failures_left: Mutex::new(1),
            inner: ScriptedProvider::new([echo_reply("hi")]),
        });
        let report = agent(provider, registry, test_config()).run("goal").await;

        assert_eq!(
            report.status,
            RunStatus::Stopped {
                reason: StopReason::StepLimit
            }
        );
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn provider_exhaustion_halts_with_history_intact() {
        let (registry, _, _) = echo_registry();
        // One good scripted reply; once it is consumed every further call
        // fails, so step 1 exhausts its retry budget.
        let provider = Arc::new(ScriptedProvider::new([echo_reply("kept")]));
        let mut config = test_config();
        config.max_steps = 3;
        config.retry.max_attempts = 2;

        let report = agent(provider, registry, config).run("goal").await;

        match &report.status {
            RunStatus::Failed { step, cause } => {
                assert_eq!(*step, 1);
                assert!(cause.contains("failed after 2 attempts"), "cause: {cause}");
            }
            other => panic!("Expected Failed, got: {other:?}"),
        }
        // The successful first step survives in history.
        assert_eq!(report.history.len(), 1);
        assert_eq!(report.history[0].parameters["text"], json!("kept"));
    }

    #[tokio::test]
    async fn environment_failure_halts_after_retries() {
        let (registry, _, _) = echo_registry();
        let provider = Arc::new(ScriptedProvider::new([EMPTY_PLAN]));
        let config = test_config();
        let agent = Agent::new(
            provider,
            Arc::new(FailingStateEnvironment),
            registry,
            character(),
            config,
        )
        .unwrap();

        let report = agent.run("goal").await;
        match &report.status {
            RunStatus::Failed { step, cause } => {
                assert_eq!(*step, 0);
                assert!(cause.contains("state_descriptions"), "cause: {cause}");
                assert!(cause.contains("state store down"), "cause: {cause}");
            }
            other => panic!("Expected Failed, got: {other:?}"),
        }
        assert!(report.history.is_empty());
    }

    #[tokio::test]
    async fn empty_plans_run_to_the_step_limit() {
        let (registry, calls, _) = echo_registry();
        let provider = Arc::new(ScriptedProvider::new([EMPTY_PLAN, EMPTY_PLAN]));
        let mut config = test_config();
        config.max_steps = 2;
        let report = agent(provider, registry, config).run("goal").await;

        assert_eq!(
            report.status,
            RunStatus::Stopped {
                reason: StopReason::StepLimit
            }
        );
        assert_eq!(report.steps_completed, 2);
        assert!(report.history.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn handler_failure_is_step_local() {
        let mut registry = ActionRegistry::new();
        registry
            .register(ActionDefinition::new(
                "unstable",
                "Always fails",
                handler_fn(|_| async {
                    Err(troupe_core::error::HandlerError::new("disk on fire"))
                }),
            ))
            .unwrap();
        registry
            .register(ActionDefinition::new(
                "steady",
                "Always works",
                handler_fn(|_| async { Ok(json!("fine")) }),
            ))
            .unwrap();

        let provider = Arc::new(ScriptedProvider::new([
            r#"{"reasoning":"r","plan":[
                {"action":"unstable","parameters":{}},
                {"action":"steady","parameters":{}}
            ]}"#,
        ]));
        let report = agent(provider, Arc::new(registry), test_config())
            .run("goal")
            .await;

        assert_eq!(report.history.len(), 2);
        match &report.history[0].outcome {
            StepOutcome::Failed(StepError::Handler { action, reason }) => {
                assert_eq!(action, "unstable");
                assert!(reason.contains("disk on fire"));
            }
            other => panic!("Expected Handler failure, got: {other:?}"),
        }
        assert!(report.history[1].outcome.is_success());
    }

    #[tokio::test(start_paused = true)]
    async fn hung_handler_times_out_as_a_step_failure() {
        let mut registry = ActionRegistry::new();
        registry
            .register(ActionDefinition::new(
                "hang",
                "Never returns",
                handler_fn(|_| async {
                    tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
                    Ok(Value::Null)
                }),
            ))
            .unwrap();

        let provider = Arc::new(ScriptedProvider::new([
            r#"{"reasoning":"r","plan":[{"action":"hang","parameters":{}}]}"#,
        ]));
        let mut config = test_config();
        config.action_timeout_secs = 1;

        let report = agent(provider, Arc::new(registry), config).run("goal").await;

        assert_eq!(report.history.len(), 1);
        assert!(matches!(
            report.history[0].outcome,
            StepOutcome::Failed(StepError::HandlerTimeout { timeout_secs: 1, .. })
        ));
        // The run itself carries on to its normal stop.
        assert_eq!(
            report.status,
            RunStatus::Stopped {
                reason: StopReason::StepLimit
            }
        );
    }
}
