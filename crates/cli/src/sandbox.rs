//! Offline sandbox: an in-process social feed for demo runs.
//!
//! The sandbox gives `troupe run --scripted` a complete world with no
//! network or keys: a shared feed the agent posts to and reads from, plus
//! the three demo actions wired into a registry. Concrete social-media
//! protocols stay out of scope; this is the smallest environment that
//! exercises the whole loop.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Value, json};

use troupe_core::action::{ActionDefinition, ActionRegistry, Parameters, handler_fn};
use troupe_core::environment::Environment;
use troupe_core::error::{EnvironmentError, HandlerError, RegistryError};

/// One post in the sandbox feed.
#[derive(Debug, Clone)]
pub struct Post {
    pub author: String,
    pub text: String,
    pub posted_at: DateTime<Utc>,
}

/// The shared feed state. Cloned handles all see the same posts.
#[derive(Default)]
pub struct Feed {
    posts: Mutex<Vec<Post>>,
}

impl Feed {
    pub fn post(&self, author: &str, text: &str) {
        self.posts.lock().unwrap().push(Post {
            author: author.into(),
            text: text.into(),
            posted_at: Utc::now(),
        });
    }

    pub fn len(&self) -> usize {
        self.posts.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.lock().unwrap().is_empty()
    }

    /// The most recent `count` posts, newest last.
    pub fn recent(&self, count: usize) -> Vec<Post> {
        let posts = self.posts.lock().unwrap();
        let skip = posts.len().saturating_sub(count);
        posts[skip..].to_vec()
    }
}

/// The sandbox environment over a [`Feed`].
pub struct FeedEnvironment {
    feed: Arc<Feed>,
}

impl FeedEnvironment {
    pub fn new(feed: Arc<Feed>) -> Self {
        Self { feed }
    }
}

#[async_trait]
impl Environment for FeedEnvironment {
    fn name(&self) -> &str {
        "sandbox"
    }

    async fn world_description(&self) -> std::result::Result<String, EnvironmentError> {
        Ok("A small social feed where short text posts appear in order. \
            You can post updates, read the recent feed, and log off when \
            you are done for the session."
            .into())
    }

    async fn state_descriptions(&self) -> std::result::Result<String, EnvironmentError> {
        let recent = self.feed.recent(3);
        let mut state = format!("The feed holds {} post(s).", self.feed.len());
        if !recent.is_empty() {
            state.push_str("\nMost recent posts:");
            for post in &recent {
                state.push_str(&format!("\n- {}: {}", post.author, post.text));
            }
        }
        Ok(state)
    }

    async fn guidelines(&self) -> std::result::Result<String, EnvironmentError> {
        Ok("- Stay in character at all times.\n\
            - Keep posts short and self-contained.\n\
            - Log off once your goal is accomplished."
            .into())
    }
}

/// Build the demo action registry over the given feed.
///
/// Actions: `post_update`, `read_feed`, `log_off`. The `log_off` action is
/// the designated terminate action in the default configuration.
pub fn sandbox_registry(
    feed: Arc<Feed>,
    author: &str,
) -> std::result::Result<ActionRegistry, RegistryError> {
    let mut registry = ActionRegistry::new();

    let post_feed = feed.clone();
    let post_author = author.to_string();
    registry.register(
        ActionDefinition::new(
            "post_update",
            "Post a short text update to the feed",
            handler_fn(move |params: Parameters| {
                let feed = post_feed.clone();
                let author = post_author.clone();
                async move {
                    let text = params
                        .get("text")
                        .and_then(Value::as_str)
                        .ok_or_else(|| HandlerError::new("'text' must be a string"))?;
                    if text.trim().is_empty() {
                        return Err(HandlerError::new("'text' must not be empty"));
                    }
                    feed.post(&author, text);
                    Ok(json!({"posted": text, "feed_len": feed.len()}))
                }
            }),
        )
        .with_param("text", "the text to post")
        .with_example(json!({"text": "Hello, feed!"})),
    )?;

    let read_feed = feed.clone();
    registry.register(
        ActionDefinition::new(
            "read_feed",
            "Read the most recent posts from the feed",
            handler_fn(move |params: Parameters| {
                let feed = read_feed.clone();
                async move {
                    let count = params
                        .get("count")
                        .and_then(Value::as_u64)
                        .unwrap_or(5) as usize;
                    let posts: Vec<Value> = feed
                        .recent(count)
                        .iter()
                        .map(|p| json!({"author": p.author, "text": p.text}))
                        .collect();
                    Ok(json!({"posts": posts}))
                }
            }),
        )
        .with_example(json!({"count": 5})),
    )?;

    registry.register(
        ActionDefinition::new(
            "log_off",
            "End the session once the goal is accomplished",
            handler_fn(|_| async { Ok(json!({"logged_off": true})) }),
        )
        .with_example(json!({})),
    )?;

    Ok(registry)
}
