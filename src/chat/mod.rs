//! Chat routing and orchestration of user messages.
//!
//! Submodules:
//! - `intent`: Command Router (switch model / list models / chat)
//! - `handler`: per-message orchestration over an injected backend
//! - `attachments`: image attachments and multimodal content
//! - `replies`: reply types and the fixed texts shown to the user
//! - `errors`: chat-level error types

pub mod attachments;
pub mod errors;
pub mod handler;
pub mod intent;
pub mod replies;

// Re-exports for convenience
pub use attachments::Attachment;
pub use errors::ChatError;
pub use handler::{ChatHandler, UserInput};
pub use intent::{classify, Intent};
pub use replies::{Reply, ReplyKind};
