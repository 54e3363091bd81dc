//! Image attachments and multimodal message assembly.

use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

use super::errors::ChatError;
use crate::inference::types::{ContentPart, ImageUrl, MessageContent};

/// MIME type used when the file name does not identify an image format.
const DEFAULT_IMAGE_MIME: &str = "image/jpeg";

/// An image the user attached to a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attachment {
    /// A file on disk, read when the message is sent.
    File(PathBuf),
    /// Bytes already in memory.
    Bytes { name: String, bytes: Vec<u8> },
}

impl Attachment {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Attachment::File(path.into())
    }

    pub fn bytes(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Attachment::Bytes {
            name: name.into(),
            bytes,
        }
    }

    /// Display name (file name or the given name).
    pub fn name(&self) -> String {
        match self {
            Attachment::File(path) => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string()),
            Attachment::Bytes { name, .. } => name.clone(),
        }
    }

    /// Encode as a `data:<mime>;base64,<payload>` URI.
    pub async fn to_data_uri(&self) -> Result<String, ChatError> {
        let (mime, bytes) = match self {
            Attachment::File(path) => {
                let bytes = tokio::fs::read(path)
                    .await
                    .map_err(|e| ChatError::AttachmentRead {
                        path: path.clone(),
                        reason: e.to_string(),
                    })?;
                (image_mime_for(path), bytes)
            }
            Attachment::Bytes { name, bytes } => (image_mime_for(Path::new(name)), bytes.clone()),
        };

        if bytes.is_empty() {
            return Err(ChatError::EmptyAttachment { name: self.name() });
        }

        Ok(data_uri(mime, &bytes))
    }
}

/// Build a data URI from raw bytes.
pub fn data_uri(mime: &str, bytes: &[u8]) -> String {
    format!("data:{mime};base64,{}", BASE64.encode(bytes))
}

/// Guess an image MIME type from a file name.
fn image_mime_for(path: &Path) -> &'static str {
    mime_guess::from_path(path)
        .first_raw()
        .filter(|m| m.starts_with("image/"))
        .unwrap_or(DEFAULT_IMAGE_MIME)
}

/// Build the content of a user turn.
///
/// Without attachments this is the plain text. With attachments it is one
/// text part followed by one image part per attachment, in order.
pub async fn build_user_content(
    text: &str,
    attachments: &[Attachment],
) -> Result<MessageContent, ChatError> {
    if attachments.is_empty() {
        return Ok(MessageContent::Text(text.to_string()));
    }

    let mut parts = Vec::with_capacity(attachments.len() + 1);
    parts.push(ContentPart::Text {
        text: text.to_string(),
    });
    for attachment in attachments {
        let url = attachment.to_data_uri().await?;
        parts.push(ContentPart::ImageUrl {
            image_url: ImageUrl { url },
        });
    }

    Ok(MessageContent::Parts(parts))
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_text_only_content() {
        let content = build_user_content("hello", &[]).await.unwrap();
        assert_eq!(content, MessageContent::Text("hello".into()));
    }

    #[tokio::test]
    async fn test_single_image_gives_text_then_image() {
        let bytes = vec![0xFF, 0xD8, 0xFF, 0xE0];
        let content = build_user_content("what is this?", &[Attachment::bytes("cat.png", bytes.clone())])
            .await
            .unwrap();

        let MessageContent::Parts(parts) = content else {
            panic!("expected multimodal content");
        };
        assert_eq!(parts.len(), 2);
        assert_eq!(
            parts[0],
            ContentPart::Text {
                text: "what is this?".into()
            }
        );
        let expected = format!("data:image/png;base64,{}", BASE64.encode(&bytes));
        assert_eq!(
            parts[1],
            ContentPart::ImageUrl {
                image_url: ImageUrl { url: expected }
            }
        );
    }

    #[tokio::test]
    async fn test_unknown_extension_defaults_to_jpeg() {
        let uri = Attachment::bytes("upload", vec![1, 2, 3]).to_data_uri().await.unwrap();
        assert!(uri.starts_with("data:image/jpeg;base64,"));
        assert_eq!(uri, "data:image/jpeg;base64,AQID");
    }

    #[tokio::test]
    async fn test_file_attachment_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("photo.jpg");
        std::fs::write(&path, b"jpegdata").unwrap();

        let uri = Attachment::file(&path).to_data_uri().await.unwrap();
        assert_eq!(uri, data_uri("image/jpeg", b"jpegdata"));
    }

    #[tokio::test]
    async fn test_missing_file_is_error() {
        let result = Attachment::file("/definitely/not/here.png").to_data_uri().await;
        assert!(matches!(result, Err(ChatError::AttachmentRead { .. })));
    }

    #[tokio::test]
    async fn test_empty_attachment_is_error() {
        let result = Attachment::bytes("blank.png", Vec::new()).to_data_uri().await;
        assert!(matches!(result, Err(ChatError::EmptyAttachment { .. })));
    }
}
