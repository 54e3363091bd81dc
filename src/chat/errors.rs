//! Chat-layer error types.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChatError {
    /// An attached file could not be read.
    #[error("failed to read attachment {}: {reason}", path.display())]
    AttachmentRead { path: PathBuf, reason: String },

    /// An attachment had no bytes.
    #[error("attachment '{name}' is empty")]
    EmptyAttachment { name: String },
}
