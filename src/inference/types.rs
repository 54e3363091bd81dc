//! Shared types for the inference client.
//!
//! These mirror the OpenAI Chat Completions API types, used for both
//! request building and response parsing.

use serde::{Deserialize, Serialize};

// ─── Request Types ───────────────────────────────────────────────────────────

/// A single message in the conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: MessageContent,
}

impl ChatMessage {
    /// A user turn with the given content.
    pub fn user(content: impl Into<MessageContent>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// An assistant turn with plain text content.
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: MessageContent::Text(text.into()),
        }
    }
}

/// Message role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// Message content: a plain string, or an ordered list of parts for
/// multimodal turns.
///
/// Serialized untagged so both shapes match the OpenAI wire format:
/// `"content": "hi"` or `"content": [{"type": "text", ...}, ...]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

impl MessageContent {
    /// Number of image parts carried by this content.
    pub fn image_count(&self) -> usize {
        match self {
            MessageContent::Text(_) => 0,
            MessageContent::Parts(parts) => parts
                .iter()
                .filter(|p| matches!(p, ContentPart::ImageUrl { .. }))
                .count(),
        }
    }
}

impl From<String> for MessageContent {
    fn from(text: String) -> Self {
        MessageContent::Text(text)
    }
}

impl From<&str> for MessageContent {
    fn from(text: &str) -> Self {
        MessageContent::Text(text.to_string())
    }
}

/// One part of a multimodal message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

/// Image reference inside a content part. Always a `data:` URI here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageUrl {
    pub url: String,
}

/// Request body for `POST /v1/chat/completions`.
#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    pub stream: bool,
}

// ─── Response Types ──────────────────────────────────────────────────────────

/// Non-streaming response body.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionResponse {
    /// Some gateways send `"choices": null` on empty answers.
    #[serde(default)]
    pub choices: Option<Vec<ResponseChoice>>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

/// A single choice in a non-streaming response.
#[derive(Debug, Clone, Deserialize)]
pub struct ResponseChoice {
    #[serde(default)]
    pub message: Option<ResponseMessage>,
    #[serde(default)]
    #[allow(dead_code)]
    pub finish_reason: Option<String>,
}

/// The assistant message inside a choice.
#[derive(Debug, Clone, Deserialize)]
pub struct ResponseMessage {
    #[serde(default)]
    pub content: Option<String>,
}

/// Token accounting, when the endpoint reports it.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub total_tokens: Option<u32>,
}

/// Normalized result of a single-shot completion.
///
/// `content` is `None` when the endpoint answered without any assistant text
/// (empty or `null` `choices`, a choice without `message`, `null` content). Callers decide what to show instead.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Completion {
    pub content: Option<String>,
    pub total_tokens: Option<u32>,
}

impl From<ChatCompletionResponse> for Completion {
    fn from(resp: ChatCompletionResponse) -> Self {
        let content = resp
            .choices
            .unwrap_or_default()
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content);
        Self {
            content,
            total_tokens: resp.usage.and_then(|u| u.total_tokens),
        }
    }
}

/// Raw SSE chunk from the OpenAI API.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionChunk {
    #[serde(default)]
    pub choices: Vec<ChunkChoice>,
}

/// A single choice within a streaming chunk.
#[derive(Debug, Clone, Deserialize)]
pub struct ChunkChoice {
    pub delta: ChunkDelta,
    #[serde(default)]
    #[allow(dead_code)]
    pub finish_reason: Option<String>,
}

/// The delta (incremental update) within a chunk choice.
#[derive(Debug, Clone, Deserialize)]
pub struct ChunkDelta {
    #[serde(default)]
    pub content: Option<String>,
}

/// Entry in the `GET /models` listing.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteModel {
    pub id: String,
    #[serde(default)]
    pub owned_by: Option<String>,
}

/// Body of `GET /models`.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteModelList {
    #[serde(default)]
    pub data: Vec<RemoteModel>,
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_message_serializes_as_string() {
        let msg = ChatMessage::user("hello");
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json, serde_json::json!({"role": "user", "content": "hello"}));
    }

    #[test]
    fn test_multimodal_message_wire_shape() {
        let msg = ChatMessage::user(MessageContent::Parts(vec![
            ContentPart::Text {
                text: "what is this?".to_string(),
            },
            ContentPart::ImageUrl {
                image_url: ImageUrl {
                    url: "data:image/png;base64,AAAA".to_string(),
                },
            },
        ]));
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "role": "user",
                "content": [
                    {"type": "text", "text": "what is this?"},
                    {"type": "image_url", "image_url": {"url": "data:image/png;base64,AAAA"}}
                ]
            })
        );
        assert_eq!(msg.content.image_count(), 1);
    }

    #[test]
    fn test_max_tokens_omitted_when_none() {
        let req = ChatCompletionRequest {
            model: "gemini".to_string(),
            messages: vec![],
            temperature: 0.7,
            max_tokens: None,
            stream: false,
        };
        let json = serde_json::to_string(&req).unwrap();
        assert!(!json.contains("max_tokens"), "max_tokens should be omitted when None");
        assert!(json.contains("\"stream\":false"));
    }

    #[test]
    fn test_completion_from_response_with_usage() {
        let body = r#"{
            "choices": [{"message": {"role": "assistant", "content": "Madrid"}, "finish_reason": "stop"}],
            "usage": {"prompt_tokens": 8, "completion_tokens": 4, "total_tokens": 12}
        }"#;
        let resp: ChatCompletionResponse = serde_json::from_str(body).unwrap();
        let completion = Completion::from(resp);
        assert_eq!(completion.content.as_deref(), Some("Madrid"));
        assert_eq!(completion.total_tokens, Some(12));
    }

    #[test]
    fn test_completion_from_response_without_choices() {
        let resp: ChatCompletionResponse = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        let completion = Completion::from(resp);
        assert!(completion.content.is_none());
        assert!(completion.total_tokens.is_none());
    }

    #[test]
    fn test_choice_without_message_has_no_content() {
        let resp: ChatCompletionResponse = serde_json::from_str(
            r#"{"choices":[{"index":0,"finish_reason":"stop"}],"usage":{"total_tokens":3}}"#,
        )
        .unwrap();
        let completion = Completion::from(resp);
        assert_eq!(completion.content, None);
        assert_eq!(completion.total_tokens, Some(3));
    }

    #[test]
    fn test_null_choices_has_no_content() {
        let resp: ChatCompletionResponse = serde_json::from_str(r#"{"choices":null}"#).unwrap();
        assert_eq!(Completion::from(resp), Completion::default());
    }
}
