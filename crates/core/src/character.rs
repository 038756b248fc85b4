//! Character profile, the persona the agent plays.
//!
//! A profile is an immutable, insertion-ordered set of attribute pairs
//! (name, personality, tone, ...). It is supplied once at agent
//! construction and rendered verbatim into the system prompt, so the
//! rendering must be byte-stable for a given profile.

use serde::{Deserialize, Serialize};

/// An immutable mapping of character attributes.
///
/// Attributes keep their insertion order; rendering the same profile twice
/// produces identical text.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CharacterProfile {
    attributes: Vec<(String, String)>,
}

impl CharacterProfile {
    /// Create an empty profile.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an attribute. Later values for the same key are appended as-is;
    /// profiles are built once and never mutated afterwards.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((key.into(), value.into()));
        self
    }

    /// Look up an attribute by key (first match wins).
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Render the profile as an ordered attribute block for the prompt.
    pub fn render(&self) -> String {
        if self.attributes.is_empty() {
            return "(no character attributes set)".into();
        }
        self.attributes
            .iter()
            .map(|(k, v)| format!("- {k}: {v}"))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
