//! OpenAI-compatible inference client for LLM7.io.
//!
//! Sends chat completion requests to the configured endpoint and returns
//! either a normalized [`Completion`] or a stream of text fragments. Every
//! transport fault comes back as an [`InferenceError`] value.

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use reqwest::Client as HttpClient;

use super::config::{ClientSettings, TOKEN_URL};
use super::errors::InferenceError;
use super::streaming::{into_display_fragments, parse_sse_stream};
use super::types::{ChatCompletionRequest, ChatCompletionResponse, Completion, RemoteModel, RemoteModelList};

/// Lazily produced text deltas of a streaming completion.
pub type FragmentStream = BoxStream<'static, Result<String, InferenceError>>;

// ─── CompletionBackend ───────────────────────────────────────────────────────

/// The chat-completion seam the orchestrator depends on.
///
/// [`InferenceClient`] is the production implementation; tests inject a
/// scripted one.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Single-shot completion.
    async fn complete(&self, request: ChatCompletionRequest) -> Result<Completion, InferenceError>;

    /// Streaming completion. The request's `stream` flag is forced on.
    async fn stream(&self, request: ChatCompletionRequest) -> Result<FragmentStream, InferenceError>;
}

// ─── InferenceClient ─────────────────────────────────────────────────────────

/// HTTP client for the LLM7.io endpoint.
///
/// Cheap to clone; the underlying connection pools are shared.
#[derive(Clone)]
pub struct InferenceClient {
    /// HTTP client for non-streaming requests.
    http: HttpClient,
    /// HTTP client for streaming requests (longer total timeout).
    http_stream: HttpClient,
    settings: ClientSettings,
}

impl InferenceClient {
    /// Build a client from resolved settings.
    ///
    /// Does NOT check connectivity; that happens on the first request.
    pub fn new(settings: ClientSettings) -> Result<Self, InferenceError> {
        if settings.base_url.is_empty() {
            return Err(InferenceError::ConfigError {
                reason: "base URL is empty".into(),
            });
        }

        let http = HttpClient::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|e| InferenceError::ConfigError {
                reason: format!("failed to build HTTP client: {e}"),
            })?;

        let http_stream = HttpClient::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.stream_timeout)
            .build()
            .map_err(|e| InferenceError::ConfigError {
                reason: format!("failed to build streaming HTTP client: {e}"),
            })?;

        if settings.is_anonymous() {
            tracing::info!(
                token_url = TOKEN_URL,
                "using LLM7.io basic access (no token); get a free token for higher limits"
            );
        }

        tracing::info!(base_url = %settings.base_url, "inference client ready");

        Ok(Self {
            http,
            http_stream,
            settings,
        })
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    /// Stream a completion as display strings.
    ///
    /// Lazy and finite: nothing is sent until the first poll. Any fault,
    /// including a failed request, shows up as a single `Error: …` fragment
    /// that ends the sequence.
    pub fn stream_fragments(&self, request: ChatCompletionRequest) -> BoxStream<'static, String> {
        let client = self.clone();
        let fragments = stream::once(async move { client.stream(request).await }).flat_map(
            |result| match result {
                Ok(fragments) => fragments,
                Err(e) => stream::once(async move { Err(e) }).boxed(),
            },
        );
        into_display_fragments(fragments).boxed()
    }

    /// `GET /models`: the endpoint's own model listing.
    pub async fn list_remote_models(&self) -> Result<Vec<RemoteModel>, InferenceError> {
        let url = self.settings.models_url();
        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.settings.api_key)
            .send()
            .await
            .map_err(|e| {
                InferenceError::from_send(&url, self.settings.request_timeout.as_secs(), e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(InferenceError::HttpError {
                status: status.as_u16(),
                body: body_text,
            });
        }

        let list: RemoteModelList =
            response
                .json()
                .await
                .map_err(|e| InferenceError::MalformedResponse {
                    reason: format!("failed to parse model list: {e}"),
                })?;
        Ok(list.data)
    }

    fn log_request(url: &str, request: &ChatCompletionRequest) {
        let image_count: usize = request
            .messages
            .iter()
            .map(|m| m.content.image_count())
            .sum();
        tracing::info!(
            url = %url,
            model = %request.model,
            message_count = request.messages.len(),
            image_count,
            temperature = request.temperature,
            max_tokens = ?request.max_tokens,
            stream = request.stream,
            "chat completion request"
        );
    }
}

#[async_trait]
impl CompletionBackend for InferenceClient {
    async fn complete(
        &self,
        mut request: ChatCompletionRequest,
    ) -> Result<Completion, InferenceError> {
        request.stream = false;
        let url = self.settings.chat_completions_url();
        Self::log_request(&url, &request);

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.settings.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                InferenceError::from_send(&url, self.settings.request_timeout.as_secs(), e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), model = %request.model, "completion rejected");
            return Err(InferenceError::HttpError {
                status: status.as_u16(),
                body: body_text,
            });
        }

        let body_text = response.text().await.map_err(|e| InferenceError::StreamError {
            reason: format!("failed to read response body: {e}"),
        })?;

        let completion = parse_completion_body(&body_text)?;
        tracing::debug!(
            model = %request.model,
            total_tokens = ?completion.total_tokens,
            has_content = completion.content.is_some(),
            "completion received"
        );
        Ok(completion)
    }

    async fn stream(
        &self,
        mut request: ChatCompletionRequest,
    ) -> Result<FragmentStream, InferenceError> {
        request.stream = true;
        let url = self.settings.chat_completions_url();
        Self::log_request(&url, &request);

        let response = self
            .http_stream
            .post(&url)
            .bearer_auth(&self.settings.api_key)
            .header("Accept", "text/event-stream")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                InferenceError::from_send(&url, self.settings.stream_timeout.as_secs(), e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(InferenceError::HttpError {
                status: status.as_u16(),
                body: body_text,
            });
        }

        Ok(parse_sse_stream(response.bytes_stream()).boxed())
    }
}

/// Parse a non-streaming response body.
pub fn parse_completion_body(body: &str) -> Result<Completion, InferenceError> {
    let resp: ChatCompletionResponse =
        serde_json::from_str(body).map_err(|e| InferenceError::MalformedResponse {
            reason: format!("failed to parse completion: {e}"),
        })?;
    Ok(Completion::from(resp))
}

// ─── Tests ───────────────────────────────────────────────────────────────────
