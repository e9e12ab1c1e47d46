//! Data models for echoguard.
//!
//! Plain data carried between the guard, the fallback pipeline, and callers.

mod context;
mod response;

pub use context::ConversationContext;
pub use response::Response;
