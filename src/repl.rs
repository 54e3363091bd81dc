//! Terminal front-end: reads lines, renders replies.
//!
//! Lines starting with `/` are front-end commands and never reach the
//! Command Router:
//! - `/attach <path>` queues an image for the next message
//! - `/quit` or `/exit` ends the chat
//!
//! The session lives in a [`SessionStore`] and is fetched and written back
//! around every message.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::chat::replies::{self, Reply, ReplyKind};
use crate::chat::{Attachment, ChatHandler, UserInput};
use crate::session::{Session, SessionStore};

const PROMPT: &str = "you> ";

/// Options for one interactive chat.
#[derive(Debug, Clone)]
pub struct ReplOptions {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Print answers as they stream in.
    pub stream: bool,
}

/// Run the chat loop until EOF or `/quit`.
pub async fn run<R, W>(
    handler: &ChatHandler,
    store: Arc<dyn SessionStore>,
    options: &ReplOptions,
    input: R,
    out: &mut W,
) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write + Send,
{
    let session = Session::with_settings(&options.model, options.temperature, options.max_tokens);
    let session_id = session.id;
    tracing::info!(
        session_id = %session_id,
        model = %session.current_model,
        stream = options.stream,
        "chat session started"
    );

    render(out, &Reply::notice(replies::welcome(&session.current_model, handler.catalog())))?;
    store.set(session).await;

    let mut pending: Vec<Attachment> = Vec::new();
    let mut lines = input.lines();

    loop {
        write!(out, "{PROMPT}")?;
        out.flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match front_end_command(line) {
            Some(FrontEndCommand::Quit) => break,
            Some(FrontEndCommand::Attach(path)) => {
                if path.as_os_str().is_empty() {
                    render(out, &Reply::error("Usage: /attach <path-to-image>"))?;
                } else {
                    render(out, &Reply::notice(format!("Attached {}", path.display())))?;
                    pending.push(Attachment::File(path));
                }
                continue;
            }
            None => {}
        }

        let mut session = match store.get(session_id).await {
            Some(session) => session,
            None => {
                tracing::warn!(session_id = %session_id, "session missing from store, starting over");
                Session::with_settings(&options.model, options.temperature, options.max_tokens)
            }
        };

        let message = UserInput::with_attachments(line, std::mem::take(&mut pending));
        let replies = if options.stream {
            writeln!(out, "assistant>")?;
            let mut write_failed = false;
            let replies = {
                let mut sink = |fragment: &str| {
                    if out.write_all(fragment.as_bytes()).and_then(|_| out.flush()).is_err() {
                        write_failed = true;
                    }
                };
                handler.handle_streaming(&mut session, message, &mut sink).await
            };
            writeln!(out)?;
            if write_failed {
                tracing::warn!("failed to write streamed output");
            }
            replies
        } else {
            handler.handle(&mut session, message).await
        };

        store.set(session).await;

        for reply in &replies {
            render(out, reply)?;
        }
    }

    if let Some(session) = store.remove(session_id).await {
        tracing::info!(
            session_id = %session_id,
            turns = session.history().len(),
            "chat session ended"
        );
    }
    Ok(())
}

#[derive(Debug, PartialEq, Eq)]
enum FrontEndCommand {
    Quit,
    Attach(PathBuf),
}

fn front_end_command(line: &str) -> Option<FrontEndCommand> {
    if line == "/quit" || line == "/exit" {
        return Some(FrontEndCommand::Quit);
    }
    if line == "/attach" {
        return Some(FrontEndCommand::Attach(PathBuf::new()));
    }
    line.strip_prefix("/attach ")
        .map(|rest| FrontEndCommand::Attach(PathBuf::from(rest.trim())))
}

/// Write one reply to the terminal.
pub fn render<W: Write>(out: &mut W, reply: &Reply) -> std::io::Result<()> {
    match reply.kind {
        ReplyKind::Assistant => writeln!(out, "assistant> {}", reply.content),
        ReplyKind::Info => writeln!(out, "  [{}]", reply.content),
        ReplyKind::Notice => writeln!(out, "{}\n", reply.content),
        ReplyKind::Error => writeln!(out, "! {}", reply.content),
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
