//! Chat Orchestrator: turns one user message into session updates and replies.
//!
//! Flow per message:
//! 1. Classify the text ([`classify`])
//! 2. Switch model / list models locally, or
//! 3. Build the user turn, call the backend once, record the answer
//!
//! Failures never escape: they become error replies.

use std::sync::Arc;

use futures::StreamExt;

use super::attachments::{build_user_content, Attachment};
use super::intent::{classify, Intent};
use super::replies::{self, Reply, NO_RESPONSE_FALLBACK};
use crate::catalog::{ModelCatalog, ModelDescriptor};
use crate::inference::types::{ChatCompletionRequest, ChatMessage};
use crate::inference::CompletionBackend;
use crate::session::Session;

/// One incoming chat message.
#[derive(Debug, Clone, Default)]
pub struct UserInput {
    pub text: String,
    pub attachments: Vec<Attachment>,
}

impl UserInput {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            attachments: Vec::new(),
        }
    }

    pub fn with_attachments(text: impl Into<String>, attachments: Vec<Attachment>) -> Self {
        Self {
            text: text.into(),
            attachments,
        }
    }
}

/// Receives streamed text as it arrives.
pub type FragmentSink<'a> = &'a mut (dyn FnMut(&str) + Send);

/// Handles chat messages for any number of sessions.
///
/// Holds no per-session state; the caller passes the session in.
pub struct ChatHandler {
    catalog: Arc<ModelCatalog>,
    /// `None` when the inference client failed to initialize.
    backend: Option<Arc<dyn CompletionBackend>>,
}

impl ChatHandler {
    pub fn new(catalog: Arc<ModelCatalog>, backend: Arc<dyn CompletionBackend>) -> Self {
        Self {
            catalog,
            backend: Some(backend),
        }
    }

    /// A handler whose client could not be built. Every message is refused.
    pub fn uninitialized(catalog: Arc<ModelCatalog>) -> Self {
        Self {
            catalog,
            backend: None,
        }
    }

    pub fn catalog(&self) -> &ModelCatalog {
        &self.catalog
    }

    pub fn is_ready(&self) -> bool {
        self.backend.is_some()
    }

    /// Handle one message; the whole answer comes back as a reply.
    pub async fn handle(&self, session: &mut Session, input: UserInput) -> Vec<Reply> {
        self.dispatch(session, input, None).await
    }

    /// Handle one message, forwarding answer text to `sink` while it streams.
    ///
    /// The returned replies do not repeat the streamed answer.
    pub async fn handle_streaming(
        &self,
        session: &mut Session,
        input: UserInput,
        sink: FragmentSink<'_>,
    ) -> Vec<Reply> {
        self.dispatch(session, input, Some(sink)).await
    }

    async fn dispatch(
        &self,
        session: &mut Session,
        input: UserInput,
        sink: Option<FragmentSink<'_>>,
    ) -> Vec<Reply> {
        let Some(backend) = self.backend.as_deref() else {
            return vec![Reply::error(replies::client_not_initialized())];
        };

        let intent = classify(&input.text);
        tracing::debug!(session_id = %session.id, ?intent, "routing message");

        if intent != Intent::Chat && !input.attachments.is_empty() {
            tracing::info!(
                count = input.attachments.len(),
                "attachments ignored for command message"
            );
        }

        match intent {
            Intent::SwitchModel => vec![self.switch_model(session, &input.text)],
            Intent::ListModels => vec![self.list_models()],
            Intent::Chat => match sink {
                None => self.chat(backend, session, input).await,
                Some(sink) => self.chat_streaming(backend, session, input, sink).await,
            },
        }
    }

    // ─── Model commands ──────────────────────────────────────────────────

    /// Switch the session to the first catalog model named in `text`.
    ///
    /// Catalog order decides between several matches: with both `mistral-large`
    /// and `mistral-large-2411` listed, whichever comes first wins.
    pub fn switch_model(&self, session: &mut Session, text: &str) -> Reply {
        match find_model_in_text(&self.catalog, text) {
            Some(model) => {
                tracing::info!(
                    session_id = %session.id,
                    from = %session.current_model,
                    to = %model.id,
                    "model switched"
                );
                session.current_model = model.id.clone();
                Reply::notice(replies::model_switched(model))
            }
            None => {
                tracing::info!(session_id = %session.id, "no catalog model named in switch request");
                Reply::notice(replies::model_not_found())
            }
        }
    }

    pub fn list_models(&self) -> Reply {
        Reply::notice(replies::available_models(&self.catalog))
    }

    // ─── Chat completion ─────────────────────────────────────────────────

    /// Append the user turn and build the request for the full history.
    ///
    /// Returns `Err` with a rendered reply when an attachment can't be
    /// encoded; the session is untouched in that case.
    async fn prepare_turn(
        session: &mut Session,
        input: UserInput,
        stream: bool,
    ) -> Result<ChatCompletionRequest, Reply> {
        let content = build_user_content(&input.text, &input.attachments)
            .await
            .map_err(|e| {
                tracing::warn!(session_id = %session.id, error = %e, "failed to encode attachments");
                Reply::error(format!("Unexpected error: {e}"))
            })?;

        session.push(ChatMessage::user(content));

        Ok(ChatCompletionRequest {
            model: session.current_model.clone(),
            messages: session.history().to_vec(),
            temperature: session.temperature,
            max_tokens: Some(session.max_tokens),
            stream,
        })
    }

    async fn chat(
        &self,
        backend: &dyn CompletionBackend,
        session: &mut Session,
        input: UserInput,
    ) -> Vec<Reply> {
        let request = match Self::prepare_turn(session, input, false).await {
            Ok(request) => request,
            Err(reply) => return vec![reply],
        };

        match backend.complete(request).await {
            Ok(completion) => {
                let text = completion
                    .content
                    .unwrap_or_else(|| NO_RESPONSE_FALLBACK.to_string());
                session.push(ChatMessage::assistant(text.clone()));
                vec![
                    Reply::assistant(text),
                    Reply::info(replies::usage_line(
                        &session.current_model,
                        completion.total_tokens,
                        session.temperature,
                    )),
                ]
            }
            Err(e) => {
                tracing::warn!(
                    session_id = %session.id,
                    model = %session.current_model,
                    error = %e,
                    "chat completion failed"
                );
                let mut out = vec![Reply::error(format!("Error: {e}"))];
                if e.is_auth_error() {
                    out.push(Reply::notice(replies::auth_hint()));
                }
                out
            }
        }
    }

    async fn chat_streaming(
        &self,
        backend: &dyn CompletionBackend,
        session: &mut Session,
        input: UserInput,
        sink: FragmentSink<'_>,
    ) -> Vec<Reply> {
        let request = match Self::prepare_turn(session, input, true).await {
            Ok(request) => request,
            Err(reply) => return vec![reply],
        };

        let mut fragments = match backend.stream(request).await {
            Ok(fragments) => fragments,
            Err(e) => {
                tracing::warn!(session_id = %session.id, error = %e, "streaming request failed");
                return vec![Reply::error(format!("Error: {e}"))];
            }
        };

        let mut answer = String::new();
        while let Some(fragment) = fragments.next().await {
            match fragment {
                Ok(text) => {
                    sink(&text);
                    answer.push_str(&text);
                }
                Err(e) => {
                    // Partial answers are not recorded
                    tracing::warn!(
                        session_id = %session.id,
                        received_chars = answer.len(),
                        error = %e,
                        "stream interrupted"
                    );
                    return vec![Reply::error(format!("Error: {e}"))];
                }
            }
        }

        if answer.is_empty() {
            answer = NO_RESPONSE_FALLBACK.to_string();
            sink(&answer);
        }
        session.push(ChatMessage::assistant(answer));

        vec![Reply::info(replies::usage_line(
            &session.current_model,
            None,
            session.temperature,
        ))]
    }
}

/// First catalog entry whose id appears (case-insensitively) anywhere in `text`.
pub fn find_model_in_text<'a>(catalog: &'a ModelCatalog, text: &str) -> Option<&'a ModelDescriptor> {
    let lower = text.to_lowercase();
    catalog
        .models()
        .iter()
        .find(|m| lower.contains(&m.id.to_lowercase()))
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Modality;
    use crate::chat::replies::ReplyKind;
    use crate::inference::types::{Completion, MessageContent, Role};
    use crate::inference::{FragmentStream, InferenceError};
    use crate::TokioMutex;
    use async_trait::async_trait;
    use futures::stream;

    /// Backend that replays one scripted outcome and records requests.
    struct ScriptedBackend {
        outcome: fn() -> Result<Completion, InferenceError>,
        fragments: Vec<Result<String, InferenceError>>,
        requests: TokioMutex<Vec<ChatCompletionRequest>>,
    }

    impl ScriptedBackend {
        fn completing(outcome: fn() -> Result<Completion, InferenceError>) -> Arc<Self> {
            Arc::new(Self {
                outcome,
                fragments: Vec::new(),
                requests: TokioMutex::new(Vec::new()),
            })
        }

        fn streaming(fragments: Vec<Result<String, InferenceError>>) -> Arc<Self> {
            Arc::new(Self {
                outcome: || Ok(Completion::default()),
                fragments,
                requests: TokioMutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl CompletionBackend for ScriptedBackend {
        async fn complete(
            &self,
            request: ChatCompletionRequest,
        ) -> Result<Completion, InferenceError> {
            self.requests.lock().await.push(request);
            (self.outcome)()
        }

        async fn stream(
            &self,
            request: ChatCompletionRequest,
        ) -> Result<FragmentStream, InferenceError> {
            self.requests.lock().await.push(request);
            let items: Vec<Result<String, InferenceError>> = self
                .fragments
                .iter()
                .map(|f| match f {
                    Ok(t) => Ok(t.clone()),
                    Err(e) => Err(InferenceError::StreamError {
                        reason: e.to_string(),
                    }),
                })
                .collect();
            Ok(stream::iter(items).boxed())
        }
    }

    fn madrid() -> Result<Completion, InferenceError> {
        Ok(Completion {
            content: Some("Madrid".into()),
            total_tokens: Some(12),
        })
    }

    fn unauthorized() -> Result<Completion, InferenceError> {
        Err(InferenceError::HttpError {
            status: 401,
            body: "invalid api key".into(),
        })
    }

    fn two_model_catalog() -> Arc<ModelCatalog> {
        Arc::new(ModelCatalog::from_models(vec![
            ModelDescriptor {
                id: "gemini".into(),
                owned_by: "api.navy".into(),
                modalities: vec![Modality::Text],
            },
            ModelDescriptor {
                id: "codestral-2501".into(),
                owned_by: "mistral".into(),
                modalities: vec![Modality::Text],
            },
        ]))
    }

    #[tokio::test]
    async fn test_success_appends_assistant_and_reports_usage() {
        let backend = ScriptedBackend::completing(madrid);
        let handler = ChatHandler::new(Arc::new(ModelCatalog::builtin()), backend.clone());
        let mut session = Session::new();

        let replies = handler
            .handle(&mut session, UserInput::text("What is the capital of Spain?"))
            .await;

        assert_eq!(session.history().len(), 2);
        assert_eq!(session.last_message(), Some(&ChatMessage::assistant("Madrid")));
        assert_eq!(replies[0], Reply::assistant("Madrid"));
        assert_eq!(replies[1].kind, ReplyKind::Info);
        assert!(replies[1].content.contains("12"));
        assert!(replies[1].content.contains("gpt-4.1-nano-2025-04-14"));

        let requests = backend.requests.lock().await;
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].model, "gpt-4.1-nano-2025-04-14");
        assert_eq!(requests[0].max_tokens, Some(1000));
        assert!(!requests[0].stream);
    }

    #[tokio::test]
    async fn test_failure_keeps_only_user_turn() {
        let handler = ChatHandler::new(
            Arc::new(ModelCatalog::builtin()),
            ScriptedBackend::completing(unauthorized),
        );
        let mut session = Session::new();
        let before = session.history().len();

        let replies = handler.handle(&mut session, UserInput::text("hello")).await;

        assert_eq!(session.history().len(), before + 1);
        assert_eq!(session.last_message().map(|m| m.role), Some(Role::User));
        assert_eq!(replies[0].kind, ReplyKind::Error);
        assert!(replies[0].content.contains("invalid api key"));
        assert!(replies[1].content.contains("LLM7_API_KEY"), "401 adds a credentials hint");
    }

    #[tokio::test]
    async fn test_missing_content_uses_fallback_text() {
        let handler = ChatHandler::new(
            Arc::new(ModelCatalog::builtin()),
            ScriptedBackend::completing(|| Ok(Completion::default())),
        );
        let mut session = Session::new();

        let replies = handler.handle(&mut session, UserInput::text("hi")).await;

        assert_eq!(replies[0], Reply::assistant(NO_RESPONSE_FALLBACK));
        assert!(replies[1].content.contains("Tokens: unknown"));
        assert_eq!(
            session.last_message(),
            Some(&ChatMessage::assistant(NO_RESPONSE_FALLBACK))
        );
    }

    #[tokio::test]
    async fn test_full_history_sent_each_turn() {
        let backend = ScriptedBackend::completing(madrid);
        let handler = ChatHandler::new(Arc::new(ModelCatalog::builtin()), backend.clone());
        let mut session = Session::new();

        handler.handle(&mut session, UserInput::text("first")).await;
        handler.handle(&mut session, UserInput::text("second")).await;

        let requests = backend.requests.lock().await;
        assert_eq!(requests[1].messages.len(), 3);
        assert_eq!(requests[1].messages[0], ChatMessage::user("first"));
    }

    #[tokio::test]
    async fn test_image_attachment_builds_multimodal_turn() {
        let backend = ScriptedBackend::completing(madrid);
        let handler = ChatHandler::new(Arc::new(ModelCatalog::builtin()), backend.clone());
        let mut session = Session::new();

        let input = UserInput::with_attachments(
            "describe this",
            vec![Attachment::bytes("shot.png", vec![1, 2, 3])],
        );
        handler.handle(&mut session, input).await;

        let first = &session.history()[0];
        let MessageContent::Parts(parts) = &first.content else {
            panic!("expected multimodal user turn");
        };
        assert_eq!(parts.len(), 2);
        assert_eq!(first.content.image_count(), 1);
    }

    #[tokio::test]
    async fn test_unreadable_attachment_leaves_session_untouched() {
        let backend = ScriptedBackend::completing(madrid);
        let handler = ChatHandler::new(Arc::new(ModelCatalog::builtin()), backend.clone());
        let mut session = Session::new();

        let input = UserInput::with_attachments(
            "describe this",
            vec![Attachment::file("/no/such/image.png")],
        );
        let replies = handler.handle(&mut session, input).await;

        assert!(session.history().is_empty());
        assert_eq!(replies[0].kind, ReplyKind::Error);
        assert!(replies[0].content.starts_with("Unexpected error"));
        assert!(backend.requests.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_switch_model_by_substring() {
        let handler = ChatHandler::new(two_model_catalog(), ScriptedBackend::completing(madrid));
        let mut session = Session::new();

        let replies = handler
            .handle(&mut session, UserInput::text("please switch to codestral-2501 now"))
            .await;

        assert_eq!(session.current_model, "codestral-2501");
        assert_eq!(replies[0].kind, ReplyKind::Notice);
        assert!(replies[0].content.contains("Provider: mistral"));
        assert!(session.history().is_empty(), "commands are not recorded");
    }

    #[tokio::test]
    async fn test_switch_to_unknown_model_is_noop() {
        let handler = ChatHandler::new(two_model_catalog(), ScriptedBackend::completing(madrid));
        let mut session = Session::new();

        let replies = handler
            .handle(&mut session, UserInput::text("use unknown-xyz"))
            .await;

        assert_eq!(session.current_model, "gpt-4.1-nano-2025-04-14");
        assert!(replies[0].content.starts_with("Model not found"));
    }

    #[test]
    fn test_first_catalog_match_wins() {
        // "codestral-2405" is listed before "codestral-2501"; the input names both
        let catalog = ModelCatalog::builtin();
        let found = find_model_in_text(&catalog, "use codestral-2501 not codestral-2405");
        assert_eq!(found.map(|m| m.id.as_str()), Some("codestral-2405"));
    }

    #[test]
    fn test_substring_quirk_matches_shorter_id() {
        // "deepseek-r1-0528" is listed before "deepseek-r1"
        let catalog = ModelCatalog::builtin();
        let found = find_model_in_text(&catalog, "use deepseek-r1-0528");
        assert_eq!(found.map(|m| m.id.as_str()), Some("deepseek-r1-0528"));
        let found = find_model_in_text(&catalog, "use DeepSeek-R1");
        assert_eq!(found.map(|m| m.id.as_str()), Some("deepseek-r1"));
    }

    #[tokio::test]
    async fn test_list_models_reply() {
        let handler = ChatHandler::new(
            Arc::new(ModelCatalog::builtin()),
            ScriptedBackend::completing(madrid),
        );
        let mut session = Session::new();

        let replies = handler
            .handle(&mut session, UserInput::text("show available models"))
            .await;

        assert_eq!(replies.len(), 1);
        assert!(replies[0].content.starts_with("Available models"));
        assert!(session.history().is_empty());
    }

    #[tokio::test]
    async fn test_uninitialized_refuses_everything() {
        let handler = ChatHandler::uninitialized(Arc::new(ModelCatalog::builtin()));
        let mut session = Session::new();

        let replies = handler.handle(&mut session, UserInput::text("hello")).await;

        assert!(!handler.is_ready());
        assert_eq!(replies[0].kind, ReplyKind::Error);
        assert!(session.history().is_empty());
    }

    #[tokio::test]
    async fn test_streaming_success_records_full_answer() {
        let backend = ScriptedBackend::streaming(vec![Ok("Mad".into()), Ok("rid".into())]);
        let handler = ChatHandler::new(Arc::new(ModelCatalog::builtin()), backend.clone());
        let mut session = Session::new();
        let mut seen = Vec::new();
        let mut sink = |t: &str| seen.push(t.to_string());

        let replies = handler
            .handle_streaming(&mut session, UserInput::text("capital of Spain?"), &mut sink)
            .await;

        assert_eq!(seen, vec!["Mad".to_string(), "rid".to_string()]);
        assert_eq!(session.last_message(), Some(&ChatMessage::assistant("Madrid")));
        assert_eq!(replies.len(), 1);
        assert!(replies[0].content.contains("Tokens: unknown"));
        assert!(backend.requests.lock().await[0].stream);
    }

    #[tokio::test]
    async fn test_streaming_interruption_discards_partial_answer() {
        let backend = ScriptedBackend::streaming(vec![
            Ok("Mad".into()),
            Err(InferenceError::StreamError {
                reason: "connection reset".into(),
            }),
        ]);
        let handler = ChatHandler::new(Arc::new(ModelCatalog::builtin()), backend);
        let mut session = Session::new();
        let mut sink = |_: &str| {};

        let replies = handler
            .handle_streaming(&mut session, UserInput::text("capital of Spain?"), &mut sink)
            .await;

        assert_eq!(session.history().len(), 1);
        assert_eq!(replies[0].kind, ReplyKind::Error);
        assert!(replies[0].content.contains("connection reset"));
    }
}
