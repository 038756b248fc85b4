//! Prompt templates with named placeholders.
//!
//! A template is fixed text containing `{placeholder}` markers. Two rules
//! keep prompts honest:
//! - construction fails if a required placeholder is absent from the text
//! - rendering fails if a placeholder in the text has no supplied value
//!
//! A silently blank field would cause prompt regressions nobody notices
//! until the model misbehaves, so both are hard errors.
//!
//! Brace sequences that are not placeholder identifiers (JSON examples,
//! empty `{}`) pass through as literal text.

use troupe_core::error::TemplateError;

/// A fixed prompt template with `{named}` placeholders.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    template: String,
    placeholders: Vec<String>,
}

/// If `text[open..]` starts a placeholder, return (byte index past the
/// closing brace, placeholder name). Identifiers are lowercase ascii and
/// underscores; anything else is literal text.
fn placeholder_at(text: &str, open: usize) -> Option<(usize, &str)> {
    let rest = &text[open + 1..];
    let close = rest.find('}')?;
    let name = &rest[..close];
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c == '_');
    valid.then_some((open + 1 + close + 1, name))
}

impl PromptTemplate {
    /// Create a template, checking that every `required` placeholder
    /// occurs in the text.
    pub fn new(
        template: impl Into<String>,
        required: &[&str],
    ) -> std::result::Result<Self, TemplateError> {
        let template = template.into();
        let placeholders = Self::scan(&template);
        for name in required {
            if !placeholders.iter().any(|p| p == name) {
                return Err(TemplateError::MissingPlaceholder((*name).into()));
            }
        }
        Ok(Self {
            template,
            placeholders,
        })
    }

    /// Placeholders found in the template, in order of first occurrence.
    pub fn placeholders(&self) -> &[String] {
        &self.placeholders
    }

    fn scan(template: &str) -> Vec<String> {
        let mut found: Vec<String> = Vec::new();
        let mut i = 0;
        while let Some(off) = template[i..].find('{') {
            let open = i + off;
            match placeholder_at(template, open) {
                Some((next, name)) => {
                    if !found.iter().any(|f| f == name) {
                        found.push(name.to_string());
                    }
                    i = next;
                }
                None => i = open + 1,
            }
        }
        found
    }

    /// Substitute every placeholder in a single pass.
    ///
    /// Values are emitted verbatim; braces inside a value are never
    /// re-scanned.
    pub fn render(
        &self,
        values: &[(&str, &str)],
    ) -> std::result::Result<String, TemplateError> {
        let mut out = String::with_capacity(self.template.len());
        let mut i = 0;
        while let Some(off) = self.template[i..].find('{') {
            let open = i + off;
            out.push_str(&self.template[i..open]);
            match placeholder_at(&self.template, open) {
                Some((next, name)) => {
                    let value = values
                        .iter()
                        .find(|(k, _)| *k == name)
                        .map(|(_, v)| *v)
                        .ok_or_else(|| TemplateError::UnfilledPlaceholder(name.into()))?;
                    out.push_str(value);
                    i = next;
                }
                None => {
                    out.push('{');
                    i = open + 1;
                }
            }
        }
        out.push_str(&self.template[i..]);
        Ok(out)
    }
}

/// Default system template. Filled once per run.
///
/// The JSON skeleton below is the response encoding contract the parser
/// depends on; keep the two in sync.
pub const DEFAULT_SYSTEM_TEMPLATE: &str = r#"You are an agent playing the following character:
{character_info}

Environment description:
{world_description}

You will also be provided with a history of actions you have previously taken, with their outcomes.

You have access to these actions:
{available_actions}

Follow these guidelines:
{agent_guidelines}

When planning actions:
1. Analyze the current state and your action history
2. Think through what needs to be accomplished within the environment's constraints
3. Plan a sequence of actions toward your goal
4. Explain your reasoning and strategy

Respond with a single JSON object in exactly this shape:
{
    "reasoning": "overall strategy for this step",
    "plan": [
        {
            "reasoning": "specific reasoning for this action",
            "action": "name_of_action",
            "parameters": {"parameter_name": "value"}
        }
    ]
}

Respond with the JSON object only."#;

/// Placeholders the system template must carry.
pub const SYSTEM_PLACEHOLDERS: &[&str] = &[
    "character_info",
    "world_description",
    "available_actions",
    "agent_guidelines",
];

/// Default user template. Filled fresh every step.
pub const DEFAULT_USER_TEMPLATE: &str = r#"Current state:
{state}

Action history:
{action_history}

Goal:
{goal}

Given this, think through what needs to be accomplished and produce your plan. Explain your overall strategy, then break it down into specific steps."#;

/// Placeholders the user template must carry.
pub const USER_PLACEHOLDERS: &[&str] = &["state", "action_history", "goal"];
