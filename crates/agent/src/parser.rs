//! Response parsing and per-step validation.
//!
//! Parsing is a strict decode-and-validate boundary: raw provider text
//! either becomes a typed [`ModelReply`] or a
//! [`StepError::MalformedResponse`]. Partially-decoded data never flows
//! past this point.
//!
//! Models routinely wrap their JSON in markdown fences or a sentence of
//! prose, so the decoder first slices out the outermost JSON object and
//! decodes strictly from there.

use troupe_core::action::{ActionDefinition, ActionRegistry};
use troupe_core::error::StepError;
use troupe_core::plan::{ModelReply, PlannedStep};

/// Slice the outermost `{...}` out of fences and surrounding prose.
fn extract_json(raw: &str) -> &str {
    let trimmed = raw.trim();
    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) {
        if start < end {
            return &trimmed[start..=end];
        }
    }
    trimmed
}

/// Decode raw provider text into a reply.
pub fn parse_reply(raw: &str) -> std::result::Result<ModelReply, StepError> {
    serde_json::from_str(extract_json(raw))
        .map_err(|e| StepError::MalformedResponse(e.to_string()))
}

/// Resolve a planned step against the registry and check its parameters.
///
/// Failures are step-local: the caller records them and moves on to the
/// next step; one bad step never aborts the plan.
pub fn validate_step<'a>(
    registry: &'a ActionRegistry,
    step: &PlannedStep,
) -> std::result::Result<&'a ActionDefinition, StepError> {
    let definition = registry.get(&step.action)?;
    definition.validate(&step.parameters)?;
    Ok(definition)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};
    use troupe_core::action::{ActionDefinition, Parameters, handler_fn};

    fn registry_with_echo() -> ActionRegistry {
        let mut registry = ActionRegistry::new();
        registry
            .register(
                ActionDefinition::new("echo", "echoes", handler_fn(|_| async { Ok(Value::Null) }))
                    .with_param("text", "text to echo"),
            )
            .unwrap();
        registry
    }

    #[test]
    fn parses_plain_json() {
        let reply = parse_reply(
            r#"{"reasoning":"r","plan":[{"reasoning":"r2","action":"echo","parameters":{"text":"hi"}}]}"#,
        )
        .unwrap();
        assert_eq!(reply.plan.len(), 1);
        assert_eq!(reply.plan[0].action, "echo");
    }

    #[test]
    fn parses_fenced_json() {
        let raw = "```json\n{\"reasoning\": \"r\", \"plan\": []}\n```";
        let reply = parse_reply(raw).unwrap();
        assert!(reply.plan.is_empty());
        assert_eq!(reply.reasoning, "r");
    }

    #[test]
    fn parses_json_wrapped_in_prose() {
        let raw = "Here is my plan:\n{\"plan\": [{\"action\": \"echo\"}]}\nLet me know!";
        let reply = parse_reply(raw).unwrap();
        assert_eq!(reply.plan[0].action, "echo");
    }

    #[test]
    fn garbage_is_malformed() {
        let err = parse_reply("I cannot comply with that request.").unwrap_err();
        assert!(matches!(err, StepError::MalformedResponse(_)));
    }

    #[test]
    fn wrong_shape_is_malformed() {
        // Decodable JSON, wrong shape: plan must be a sequence.
        let err = parse_reply(r#"{"reasoning": "r", "plan": "do something"}"#).unwrap_err();
        assert!(matches!(err, StepError::MalformedResponse(_)));
    }

    #[test]
    fn validate_resolves_known_action() {
        let registry = registry_with_echo();
        let mut parameters = Parameters::new();
        parameters.insert("text".into(), json!("hi"));
        let step = PlannedStep {
            reasoning: String::new(),
            action: "echo".into(),
            parameters,
        };
        assert_eq!(validate_step(&registry, &step).unwrap().name, "echo");
    }

    #[test]
    fn validate_rejects_unknown_action() {
        let registry = registry_with_echo();
        let step = PlannedStep {
            reasoning: String::new(),
            action: "noop_unregistered".into(),
            parameters: Parameters::new(),
        };
        assert!(matches!(
            validate_step(&registry, &step).unwrap_err(),
            StepError::UnknownAction(_)
        ));
    }

    #[test]
    fn validate_rejects_missing_parameter() {
        let registry = registry_with_echo();
        let step = PlannedStep {
            reasoning: String::new(),
            action: "echo".into(),
            parameters: Parameters::new(),
        };
        assert!(matches!(
            validate_step(&registry, &step).unwrap_err(),
            StepError::MissingParameter { .. }
        ));
    }
}
