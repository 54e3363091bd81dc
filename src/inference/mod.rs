//! Inference Client: OpenAI-compatible API client for LLM7.io.
//!
//! This module handles all communication with the remote endpoint:
//! - Streaming and non-streaming chat completions
//! - SSE stream parsing
//! - Endpoint and credential resolution from the environment
//!
//! The client speaks the OpenAI Chat Completions API, so pointing
//! `LLM7_BASE_URL` at any compatible server works without code changes.

pub mod client;
pub mod config;
pub mod errors;
pub mod streaming;
pub mod types;

// Re-exports for convenience
pub use client::{CompletionBackend, FragmentStream, InferenceClient};
pub use config::ClientSettings;
pub use errors::InferenceError;
pub use types::{ChatCompletionRequest, ChatMessage, Completion, ContentPart, ImageUrl, MessageContent, Role};
