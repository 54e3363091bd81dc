//! SSE streaming response parser for OpenAI-compatible chat completions.
//!
//! Reads a response body as a byte stream, splits on SSE boundaries
//! (`data: …\n\n`), parses each chunk as JSON, and yields the text deltas
//! in arrival order.

use std::fmt::Display;

use futures::stream::{self, Stream, StreamExt};

use super::errors::InferenceError;
use super::types::ChatCompletionChunk;

// ─── SSE line parser ─────────────────────────────────────────────────────────

/// What a single SSE event carried.
#[derive(Debug, PartialEq, Eq)]
enum SseEvent {
    /// A non-empty text delta.
    Fragment(String),
    /// `data: [DONE]`: the server finished the response.
    Done,
    /// Keep-alive, comment, role-only delta, or empty content.
    Skip,
}

/// Parse a raw SSE byte stream into text fragments.
///
/// The stream is finite and not restartable. It ends after `[DONE]`, at the
/// end of the body, or right after yielding the first error.
pub fn parse_sse_stream<S, B, E>(
    byte_stream: S,
) -> impl Stream<Item = Result<String, InferenceError>>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: Display,
{
    let byte_stream = Box::pin(byte_stream);

    stream::unfold(
        (byte_stream, Vec::<u8>::new(), false),
        |(mut byte_stream, mut buffer, finished)| async move {
            if finished {
                return None;
            }
            loop {
                // Drain every complete event already buffered
                if let Some(event_end) = find_event_end(&buffer) {
                    let raw: Vec<u8> = buffer.drain(..event_end + 2).take(event_end).collect();

                    match decode_event(raw).and_then(|event| process_event(&event)) {
                        Ok(SseEvent::Fragment(text)) => {
                            return Some((Ok(text), (byte_stream, buffer, false)))
                        }
                        Ok(SseEvent::Done) => return None,
                        Ok(SseEvent::Skip) => continue,
                        Err(e) => return Some((Err(e), (byte_stream, buffer, true))),
                    }
                }

                match byte_stream.next().await {
                    Some(Ok(bytes)) => append_normalized(&mut buffer, bytes.as_ref()),
                    Some(Err(e)) => {
                        return Some((
                            Err(InferenceError::StreamError {
                                reason: format!("stream read error: {e}"),
                            }),
                            (byte_stream, buffer, true),
                        ));
                    }
                    None => {
                        // Body ended without a trailing blank line
                        let rest = std::mem::take(&mut buffer);
                        let event = match decode_event(rest) {
                            Ok(event) => event,
                            Err(e) => return Some((Err(e), (byte_stream, buffer, true))),
                        };
                        if event.trim().is_empty() {
                            return None;
                        }
                        return match process_event(event.trim()) {
                            Ok(SseEvent::Fragment(text)) => {
                                Some((Ok(text), (byte_stream, buffer, true)))
                            }
                            Ok(_) => None,
                            Err(e) => Some((Err(e), (byte_stream, buffer, true))),
                        };
                    }
                }
            }
        },
    )
}

/// Offset of the first `\n\n` event boundary in the buffer.
fn find_event_end(buffer: &[u8]) -> Option<usize> {
    buffer.windows(2).position(|w| w == b"\n\n")
}

/// Append raw bytes, dropping the `\r` of CRLF pairs so the boundary search
/// works. A `\r` at the end of a chunk is kept until the next byte arrives.
fn append_normalized(buffer: &mut Vec<u8>, bytes: &[u8]) {
    for &b in bytes {
        if b == b'\n' && buffer.last() == Some(&b'\r') {
            buffer.pop();
        }
        buffer.push(b);
    }
}

/// Decode one complete event. Multi-byte characters never straddle events,
/// so invalid UTF-8 here means the server sent garbage.
fn decode_event(raw: Vec<u8>) -> Result<String, InferenceError> {
    String::from_utf8(raw).map_err(|e| InferenceError::StreamError {
        reason: format!("invalid UTF-8 in SSE event: {e}"),
    })
}

/// Process a single SSE event string (may contain multiple `data:` lines).
fn process_event(event: &str) -> Result<SseEvent, InferenceError> {
    let mut data_content = String::new();

    for line in event.lines() {
        if let Some(data) = line.strip_prefix("data: ").or_else(|| line.strip_prefix("data:")) {
            let data = data.trim();
            if data == "[DONE]" {
                return Ok(SseEvent::Done);
            }
            data_content.push_str(data);
        }
    }

    if data_content.is_empty() {
        return Ok(SseEvent::Skip);
    }

    let chunk: ChatCompletionChunk =
        serde_json::from_str(&data_content).map_err(|e| InferenceError::StreamError {
            reason: format!("failed to parse SSE chunk: {e} (data: {data_content})"),
        })?;

    let text = chunk
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.delta.content)
        .filter(|c| !c.is_empty());

    Ok(match text {
        Some(t) => SseEvent::Fragment(t),
        None => SseEvent::Skip,
    })
}

/// Collapse a fallible fragment stream into plain strings.
///
/// A fault becomes one `Error: …` fragment and terminates the sequence.
pub fn into_display_fragments<S>(fragments: S) -> impl Stream<Item = String>
where
    S: Stream<Item = Result<String, InferenceError>>,
{
    let fragments = Box::pin(fragments);
    stream::unfold((fragments, false), |(mut fragments, failed)| async move {
        if failed {
            return None;
        }
        match fragments.next().await? {
            Ok(text) => Some((text, (fragments, false))),
            Err(e) => Some((format!("Error: {e}"), (fragments, true))),
        }
    })
}

// ─── Tests ───────────────────────────────────────────────────────────────────
