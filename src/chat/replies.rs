//! Rendered replies and the fixed texts the chat shows.

use crate::catalog::{ModelCatalog, ModelDescriptor};

/// Provider groups shown by the list-models reply.
pub const MAX_LISTED_PROVIDERS: usize = 5;

/// Models shown per provider by the list-models reply.
pub const MAX_LISTED_MODELS_PER_PROVIDER: usize = 5;

/// Shown when the endpoint answered without assistant text.
pub const NO_RESPONSE_FALLBACK: &str = "No response received";

/// How a reply should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyKind {
    /// The model's answer.
    Assistant,
    /// Secondary status line (model, tokens, temperature).
    Info,
    /// Output of a local command (switch, list, welcome).
    Notice,
    Error,
}

/// One message for the UI to render.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub kind: ReplyKind,
    pub content: String,
}

impl Reply {
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            kind: ReplyKind::Assistant,
            content: content.into(),
        }
    }

    pub fn info(content: impl Into<String>) -> Self {
        Self {
            kind: ReplyKind::Info,
            content: content.into(),
        }
    }

    pub fn notice(content: impl Into<String>) -> Self {
        Self {
            kind: ReplyKind::Notice,
            content: content.into(),
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self {
            kind: ReplyKind::Error,
            content: content.into(),
        }
    }
}

// ─── Texts ───────────────────────────────────────────────────────────────────

pub fn welcome(model: &str, catalog: &ModelCatalog) -> String {
    let vision = catalog
        .find(model)
        .map(|m| m.supports(crate::catalog::Modality::Image))
        .unwrap_or(false);
    let vision_note = if vision { " (supports images)" } else { "" };

    format!(
        "Welcome to LLM7.io chat\n\
         \n\
         Current model: {model}{vision_note}\n\
         Catalog: {} models from {}\n\
         \n\
         - Type any question or message\n\
         - Attach an image with /attach <path>, then send your question\n\
         - Change models: \"use [model-name]\" or \"switch to [model-name]\"\n\
         - View models: \"show available models\"\n\
         - Leave with /quit",
        catalog.len(),
        catalog.source(),
    )
}

pub fn model_switched(model: &ModelDescriptor) -> String {
    format!(
        "Model changed successfully!\n\
         \n\
         - Current model: {}\n\
         - Provider: {}\n\
         - Modalities: {}\n\
         \n\
         You can now continue chatting with the new model.",
        model.id,
        model.owned_by,
        model.modalities_label(),
    )
}

pub fn model_not_found() -> String {
    "Model not found\n\
     \n\
     I couldn't find a model matching your request.\n\
     Try saying \"show available models\" to see all options.\n\
     \n\
     Popular models you can try:\n\
     - use gemini\n\
     - use mistral-large-2411\n\
     - use codestral-2501\n\
     - use gpt-4o-mini-2024-07-18"
        .to_string()
}

/// Provider-grouped model overview, truncated for display.
pub fn available_models(catalog: &ModelCatalog) -> String {
    let mut content = String::from("Available models\n");

    for (provider, models) in catalog
        .grouped_by_provider()
        .into_iter()
        .take(MAX_LISTED_PROVIDERS)
    {
        content.push_str(&format!("\n{}\n", title_case(provider)));
        for model in models.into_iter().take(MAX_LISTED_MODELS_PER_PROVIDER) {
            content.push_str(&format!("- {} - {}\n", model.id, model.modalities_label()));
        }
    }

    content.push_str("\nTo switch models, just say: \"use [model-name]\"\n");
    content.push_str("For the complete list run: llm7-chat models");
    content
}

/// Status line shown after each answer.
pub fn usage_line(model: &str, total_tokens: Option<u32>, temperature: f32) -> String {
    let tokens = total_tokens
        .map(|t| t.to_string())
        .unwrap_or_else(|| "unknown".to_string());
    format!("Model: {model} | Tokens: {tokens} | Temp: {temperature}")
}

/// Guidance shown when the inference client could not be built.
pub fn client_init_failed(reason: &str) -> String {
    format!(
        "Error initializing client: {reason}\n\
         \n\
         Please check:\n\
         1. LLM7_API_KEY is set (or unset for anonymous access)\n\
         2. The API key is valid and active\n\
         3. LLM7_BASE_URL, if set, is a valid URL\n\
         4. Your internet connection is working"
    )
}

/// Shown after the endpoint rejects our credentials.
pub fn auth_hint() -> String {
    format!(
        "The API rejected the credentials. Check LLM7_API_KEY, or unset it to use \
         anonymous access. Free tokens: {}",
        crate::inference::config::TOKEN_URL
    )
}

pub fn client_not_initialized() -> String {
    "Client not initialized. Please restart the chat.".to_string()
}

/// `"api.navy"` → `"Api.Navy"`, `"mistral"` → `"Mistral"`.
fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut at_word_start = true;
    for ch in s.chars() {
        if ch.is_alphanumeric() {
            if at_word_start {
                out.extend(ch.to_uppercase());
            } else {
                out.extend(ch.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(ch);
            at_word_start = true;
        }
    }
    out
}

// ─── Tests ───────────────────────────────────────────────────────────────────
