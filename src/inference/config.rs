//! Client settings resolution.
//!
//! The API key and base URL come from explicit values, then the environment
//! (`LLM7_API_KEY`, `LLM7_BASE_URL`), then the public defaults.

use std::time::Duration;

// ─── Constants ───────────────────────────────────────────────────────────────

/// Public LLM7.io endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.llm7.io/v1";

/// Sentinel key LLM7.io accepts for anonymous, rate-limited access.
pub const ANONYMOUS_API_KEY: &str = "unused";

pub const API_KEY_ENV: &str = "LLM7_API_KEY";
pub const BASE_URL_ENV: &str = "LLM7_BASE_URL";

/// Where anonymous users can get a free token with higher limits.
pub const TOKEN_URL: &str = "https://token.llm7.io";

/// TCP connection timeout.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Total request timeout for non-streaming calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Total request timeout for streaming calls.
const STREAM_REQUEST_TIMEOUT: Duration = Duration::from_secs(180);

// ─── ClientSettings ──────────────────────────────────────────────────────────

/// Connection settings for [`super::InferenceClient`].
#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub api_key: String,
    pub base_url: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub stream_timeout: Duration,
}

impl ClientSettings {
    /// Resolve settings, preferring explicit values over the environment.
    pub fn resolve(api_key: Option<String>, base_url: Option<String>) -> Self {
        let api_key = api_key
            .or_else(|| non_empty_env(API_KEY_ENV))
            .unwrap_or_else(|| ANONYMOUS_API_KEY.to_string());
        let base_url = base_url
            .or_else(|| non_empty_env(BASE_URL_ENV))
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            connect_timeout: CONNECT_TIMEOUT,
            request_timeout: REQUEST_TIMEOUT,
            stream_timeout: STREAM_REQUEST_TIMEOUT,
        }
    }

    /// Whether the sentinel anonymous key is in use.
    pub fn is_anonymous(&self) -> bool {
        self.api_key == ANONYMOUS_API_KEY
    }

    pub fn chat_completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    pub fn models_url(&self) -> String {
        format!("{}/models", self.base_url)
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

// ─── Tests ───────────────────────────────────────────────────────────────────
