//! Scripted provider, an in-process backend replaying canned replies.
//!
//! Used by loop tests and the offline CLI demo: each `complete()` call
//! pops the next reply off the script. No network, no keys, fully
//! deterministic.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use troupe_core::error::ProviderError;
use troupe_core::provider::{CompletionRequest, CompletionResponse};

/// A provider that returns pre-scripted replies in order.
pub struct ScriptedProvider {
    name: String,
    replies: Mutex<VecDeque<String>>,
    calls: Mutex<usize>,
}

impl ScriptedProvider {
    /// Create a provider from an ordered reply script.
    pub fn new(replies: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            name: "scripted".into(),
            replies: Mutex::new(replies.into_iter().map(Into::into).collect()),
            calls: Mutex::new(0),
        }
    }

    /// How many completions have been served.
    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }

    /// How many scripted replies remain.
    pub fn remaining(&self) -> usize {
        self.replies.lock().unwrap().len()
    }
}

#[async_trait]
impl troupe_core::Provider for ScriptedProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(
        &self,
        _request: CompletionRequest,
    ) -> std::result::Result<CompletionResponse, ProviderError> {
        *self.calls.lock().unwrap() += 1;
        let next = self.replies.lock().unwrap().pop_front();
        match next {
            Some(content) => Ok(CompletionResponse {
                content,
                model: self.name.clone(),
                usage: None,
            }),
            None => Err(ProviderError::NotConfigured(
                "Scripted provider has no replies left".into(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use troupe_core::Provider;

    fn request() -> CompletionRequest {
        CompletionRequest {
            model: "scripted".into(),
            system_prompt: String::new(),
            user_prompt: String::new(),
            temperature: 0.0,
            max_tokens: None,
        }
    }

    #[tokio::test]
    async fn replays_in_order_then_errors() {
        let provider = ScriptedProvider::new(["first", "second"]);

        assert_eq!(provider.complete(request()).await.unwrap().content, "first");
        assert_eq!(
            provider.complete(request()).await.unwrap().content,
            "second"
        );
        assert!(matches!(
            provider.complete(request()).await.unwrap_err(),
            ProviderError::NotConfigured(_)
        ));
        assert_eq!(provider.calls(), 3);
        assert_eq!(provider.remaining(), 0);
    }
}
