//! Bounded response history.

use crate::models::Response;
use std::collections::VecDeque;
use std::num::NonZeroUsize;

/// FIFO window of recently accepted responses.
///
/// Holds at most `window` entries in insertion order. Appending past the
/// window evicts from the head, oldest first.
///
/// # Example
///
/// ```rust
/// use echoguard::ResponseHistory;
/// use std::num::NonZeroUsize;
///
/// let mut history = ResponseHistory::new(NonZeroUsize::new(2).unwrap_or(NonZeroUsize::MIN));
/// history.append("one");
/// history.append("two");
/// history.append("three");
///
/// let contents: Vec<_> = history.iter().map(|r| r.content.as_str()).collect();
/// assert_eq!(contents, ["two", "three"]);
/// ```
#[derive(Debug, Clone)]
pub struct ResponseHistory {
    entries: VecDeque<Response>,
    window: NonZeroUsize,
}

impl ResponseHistory {
    /// Creates an empty history with the given window size.
    #[must_use]
    pub fn new(window: NonZeroUsize) -> Self {
        Self {
            entries: VecDeque::with_capacity(window.get().min(1024) + 1),
            window,
        }
    }

    /// Appends a response stamped with the current time, then evicts the
    /// oldest entries until the window is respected.
    pub fn append(&mut self, content: impl Into<String>) {
        self.push(Response::now(content));
    }

    /// Appends an already-built response, then evicts as in [`Self::append`].
    pub fn push(&mut self, response: Response) {
        self.entries.push_back(response);
        self.truncate_to_window();
    }

    /// Drops the oldest entries until at most `window` remain.
    ///
    /// Returns the number of evicted entries.
    pub fn truncate_to_window(&mut self) -> usize {
        let excess = self.entries.len().saturating_sub(self.window.get());
        self.entries.drain(..excess);
        excess
    }

    /// Returns a copy of the current entries, oldest first.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Response> {
        self.entries.iter().cloned().collect()
    }

    /// Removes every entry. Idempotent.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Iterates over the entries, oldest first.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Response> + ExactSizeIterator {
        self.entries.iter()
    }

    /// The most recently appended entry.
    #[must_use]
    pub fn last(&self) -> Option<&Response> {
        self.entries.back()
    }

    /// Number of entries currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the history is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of entries retained.
    #[must_use]
    pub const fn window(&self) -> NonZeroUsize {
        self.window
    }
}
