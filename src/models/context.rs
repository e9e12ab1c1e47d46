//! Conversation context handed to fallback strategies.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Optional conversation context passed through to fallback strategies.
///
/// The guard and processor never inspect it. Strategies that call out to a
/// generator can use it to steer the rephrasing.
///
/// # Example
///
/// ```rust
/// use echoguard::ConversationContext;
///
/// let context = ConversationContext::default()
///     .with_topic("rust")
///     .with_history_entry("What is ownership?");
///
/// assert_eq!(context.recent_topics, vec!["rust".to_string()]);
/// assert_eq!(context.conversation_history.len(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConversationContext {
    /// Topics extracted from the recent conversation.
    pub recent_topics: Vec<String>,
    /// Free-form user preferences (tone, verbosity, ...).
    pub user_preferences: HashMap<String, serde_json::Value>,
    /// Previously emitted messages, oldest first.
    pub conversation_history: Vec<String>,
}

impl ConversationContext {
    /// Creates an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a recent topic.
    #[must_use]
    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.recent_topics.push(topic.into());
        self
    }

    /// Sets a user preference.
    #[must_use]
    pub fn with_preference(
        mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.user_preferences.insert(key.into(), value.into());
        self
    }

    /// Appends a message to the conversation history.
    #[must_use]
    pub fn with_history_entry(mut self, message: impl Into<String>) -> Self {
        self.conversation_history.push(message.into());
        self
    }

    /// Returns a user preference as a string, if present and a string.
    #[must_use]
    pub fn preference_str(&self, key: &str) -> Option<&str> {
        self.user_preferences.get(key).and_then(|v| v.as_str())
    }
}
