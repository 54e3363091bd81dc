//! Catalog loading errors.
//!
//! These never escape [`super::ModelCatalog::load`]; they are logged and the
//! built-in list is used instead.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    /// The catalog file could not be read.
    #[error("failed to read {}: {reason}", path.display())]
    Io { path: PathBuf, reason: String },

    /// The file was read but is not a valid catalog.
    #[error("failed to parse {}: {reason}", path.display())]
    Parse { path: PathBuf, reason: String },

    /// The file parsed but lists no models.
    #[error("{} lists no models", path.display())]
    Empty { path: PathBuf },

    /// No catalog file could be located.
    #[error("no catalog file found (searched for {searched})")]
    NotFound { searched: String },
}
