//! Accepted response entries.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A response that was accepted into the history window.
///
/// Entries are created by the guard on commit and never mutated afterwards.
///
/// # Example
///
/// ```rust
/// use echoguard::Response;
///
/// let response = Response::new("Hello there!", 1_700_000_000_000);
/// assert_eq!(response.content, "Hello there!");
/// assert_eq!(response.timestamp, 1_700_000_000_000);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    /// The response text.
    pub content: String,
    /// Acceptance time (Unix epoch milliseconds).
    pub timestamp: u64,
}

impl Response {
    /// Creates a response with an explicit timestamp.
    #[must_use]
    pub fn new(content: impl Into<String>, timestamp: u64) -> Self {
        Self {
            content: content.into(),
            timestamp,
        }
    }

    /// Creates a response stamped with the current time.
    #[must_use]
    pub fn now(content: impl Into<String>) -> Self {
        Self::new(content, crate::current_timestamp_ms())
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.content)
    }
}
