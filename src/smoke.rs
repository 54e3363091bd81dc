//! Ad hoc smoke test of the remote API.
//!
//! Asks a fixed question of each candidate model in turn and stops at the
//! first one that answers.

use std::fmt::Write as _;

use futures::StreamExt;

use crate::inference::types::{ChatCompletionRequest, ChatMessage};
use crate::inference::{CompletionBackend, InferenceError};

/// Models tried when none are given, in order.
pub const DEFAULT_SMOKE_MODELS: &[&str] = &[
    "gpt-4.1-nano-2025-04-14",
    "gemini",
    "mistral-large-2411",
    "gpt-4",
];

pub const SMOKE_PROMPT: &str = "What is the capital of Spain?";

/// Outcome for one model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmokeAttempt {
    pub model: String,
    /// Answer text on success, error message on failure.
    pub result: Result<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SmokeReport {
    pub attempts: Vec<SmokeAttempt>,
}

impl SmokeReport {
    /// The model that answered, if any.
    pub fn working_model(&self) -> Option<&str> {
        self.attempts
            .iter()
            .find(|a| a.result.is_ok())
            .map(|a| a.model.as_str())
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        for attempt in &self.attempts {
            match &attempt.result {
                Ok(answer) => {
                    let _ = writeln!(out, "OK   {}: {}", attempt.model, answer.trim());
                }
                Err(reason) => {
                    let _ = writeln!(out, "FAIL {}: {}", attempt.model, reason);
                }
            }
        }
        match self.working_model() {
            Some(model) => {
                let _ = write!(out, "API reachable, {model} answered.");
            }
            None => out.push_str("No model answered."),
        }
        out
    }
}

fn smoke_request(model: &str, stream: bool) -> ChatCompletionRequest {
    ChatCompletionRequest {
        model: model.to_string(),
        messages: vec![ChatMessage::user(SMOKE_PROMPT)],
        temperature: crate::session::DEFAULT_TEMPERATURE,
        max_tokens: None,
        stream,
    }
}

/// Try each model until one answers.
pub async fn run(backend: &dyn CompletionBackend, models: &[String]) -> SmokeReport {
    let mut report = SmokeReport::default();

    for model in models {
        tracing::info!(model = %model, "smoke testing model");
        let request = smoke_request(model, false);

        let result = match backend.complete(request).await {
            Ok(completion) => completion
                .content
                .ok_or_else(|| "empty response".to_string()),
            Err(e) => Err(e.to_string()),
        };

        let answered = result.is_ok();
        if let Err(ref reason) = result {
            tracing::warn!(model = %model, reason = %reason, "smoke test model failed");
        }
        report.attempts.push(SmokeAttempt {
            model: model.clone(),
            result,
        });
        if answered {
            break;
        }
    }

    report
}

/// Stream the smoke prompt from one model, handing each fragment to `sink`.
///
/// Returns the full answer, or the first fault. Fragments already handed
/// over before a fault stay with the sink.
pub async fn stream_answer(
    backend: &dyn CompletionBackend,
    model: &str,
    sink: &mut (dyn FnMut(&str) + Send),
) -> Result<String, InferenceError> {
    tracing::info!(model = %model, "smoke testing model (streaming)");
    let mut fragments = backend.stream(smoke_request(model, true)).await?;
    let mut answer = String::new();
    while let Some(fragment) = fragments.next().await {
        let fragment = fragment.inspect_err(|e| {
            tracing::warn!(model = %model, error = %e, "smoke stream failed");
        })?;
        sink(&fragment);
        answer.push_str(&fragment);
    }
    if answer.is_empty() {
        return Err(InferenceError::StreamError {
            reason: "stream ended without any text".into(),
        });
    }
    Ok(answer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::types::Completion;
    use crate::inference::FragmentStream;
    use async_trait::async_trait;
    use futures::stream;

    /// Answers only for one model id.
    struct OnlyModel(&'static str);

    #[async_trait]
    impl CompletionBackend for OnlyModel {
        async fn complete(
            &self,
            request: ChatCompletionRequest,
        ) -> Result<Completion, InferenceError> {
            if request.model == self.0 {
                Ok(Completion {
                    content: Some("Madrid".into()),
                    total_tokens: Some(20),
                })
            } else {
                Err(InferenceError::HttpError {
                    status: 404,
                    body: format!("model '{}' not found", request.model),
                })
            }
        }

        async fn stream(
            &self,
            request: ChatCompletionRequest,
        ) -> Result<FragmentStream, InferenceError> {
            let items = if request.model == self.0 {
                vec![Ok("Mad".to_string()), Ok("rid".to_string())]
            } else {
                vec![
                    Ok("Mad".to_string()),
                    Err(InferenceError::StreamError {
                        reason: "connection reset".into(),
                    }),
                ]
            };
            Ok(stream::iter(items).boxed())
        }
    }

    fn defaults() -> Vec<String> {
        DEFAULT_SMOKE_MODELS.iter().map(|m| m.to_string()).collect()
    }

    #[tokio::test]
    async fn test_stops_at_first_working_model() {
        let report = run(&OnlyModel("gemini"), &defaults()).await;
        assert_eq!(report.attempts.len(), 2);
        assert_eq!(report.working_model(), Some("gemini"));
        assert!(report.render().contains("OK   gemini: Madrid"));
    }

    #[tokio::test]
    async fn test_all_fail() {
        let report = run(&OnlyModel("none"), &defaults()).await;
        assert_eq!(report.attempts.len(), 4);
        assert!(report.working_model().is_none());
        assert!(report.render().ends_with("No model answered."));
    }

    #[tokio::test]
    async fn test_stream_answer_collects_fragments() {
        let mut shown = Vec::new();
        let answer = stream_answer(&OnlyModel("gemini"), "gemini", &mut |f: &str| {
            shown.push(f.to_string())
        })
        .await
        .unwrap();
        assert_eq!(answer, "Madrid");
        assert_eq!(shown, vec!["Mad", "rid"]);
    }

    #[tokio::test]
    async fn test_stream_answer_reports_mid_stream_fault() {
        let mut shown = Vec::new();
        let result = stream_answer(&OnlyModel("gemini"), "gpt-4", &mut |f: &str| {
            shown.push(f.to_string())
        })
        .await;
        assert!(matches!(result, Err(InferenceError::StreamError { .. })));
        assert_eq!(shown, vec!["Mad"]);
    }
}
