//! Model Catalog: static metadata about the models the endpoint serves.
//!
//! Reads `config/config.yaml` (or the file named by `LLM7_CONFIG`). Any
//! problem with that file falls back to the built-in list, so loading a
//! catalog never fails and never produces an empty one.
//!
//! Lookups are first-match in file order; duplicate ids are not rejected.

mod defaults;
pub mod errors;

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use errors::CatalogError;

/// Env var naming an explicit catalog file.
pub const CONFIG_PATH_ENV: &str = "LLM7_CONFIG";

/// Relative location searched for when walking up from the working directory.
const CONFIG_RELATIVE_PATH: &str = "config/config.yaml";

// ─── Public Types ────────────────────────────────────────────────────────────

/// A content type a model accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modality {
    Text,
    Image,
}

impl Modality {
    pub fn as_str(self) -> &'static str {
        match self {
            Modality::Text => "text",
            Modality::Image => "image",
        }
    }
}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Modality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(Modality::Text),
            "image" => Ok(Modality::Image),
            other => Err(format!("unknown modality '{other}' (expected text or image)")),
        }
    }
}

/// One model the endpoint serves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    pub id: String,
    /// Provider backing this model (e.g. `"mistral"`).
    pub owned_by: String,
    #[serde(default)]
    pub modalities: Vec<Modality>,
}

impl ModelDescriptor {
    pub fn supports(&self, modality: Modality) -> bool {
        self.modalities.contains(&modality)
    }

    /// Modalities joined for display: `"text, image"`.
    pub fn modalities_label(&self) -> String {
        self.modalities
            .iter()
            .map(|m| m.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Where a catalog's entries came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogSource {
    File(PathBuf),
    Builtin,
}

impl fmt::Display for CatalogSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogSource::File(path) => write!(f, "{}", path.display()),
            CatalogSource::Builtin => f.write_str("built-in list"),
        }
    }
}

/// On-disk shape of the catalog file.
#[derive(Debug, Deserialize)]
struct CatalogFile {
    models: Vec<ModelDescriptor>,
}

/// Read-only model list for the lifetime of the process.
#[derive(Debug, Clone)]
pub struct ModelCatalog {
    models: Vec<ModelDescriptor>,
    source: CatalogSource,
}

// ─── Loading ─────────────────────────────────────────────────────────────────

impl ModelCatalog {
    /// Load from `source`, falling back to the built-in list on any failure.
    ///
    /// `None` means "no file configured" and goes straight to the built-in list.
    pub fn load(source: Option<&Path>) -> Self {
        let Some(path) = source else {
            tracing::info!("no catalog file configured, using built-in model list");
            return Self::builtin();
        };

        match read_catalog_file(path) {
            Ok(models) => {
                tracing::info!(
                    path = %path.display(),
                    model_count = models.len(),
                    "loaded model catalog"
                );
                Self {
                    models,
                    source: CatalogSource::File(path.to_path_buf()),
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "catalog file unusable, using built-in model list");
                Self::builtin()
            }
        }
    }

    /// Resolve the catalog location (see [`resolve_catalog_path`]) and load it.
    pub fn discover(explicit: Option<&Path>, start: &Path) -> Self {
        match resolve_catalog_path(explicit, start) {
            Ok(path) => Self::load(Some(&path)),
            Err(e) => {
                tracing::info!(reason = %e, "using built-in model list");
                Self::builtin()
            }
        }
    }

    /// The built-in model list.
    pub fn builtin() -> Self {
        Self {
            models: defaults::builtin_models(),
            source: CatalogSource::Builtin,
        }
    }

    /// Build a catalog from explicit entries (callers own non-emptiness).
    pub fn from_models(models: Vec<ModelDescriptor>) -> Self {
        Self {
            models,
            source: CatalogSource::Builtin,
        }
    }

    pub fn source(&self) -> &CatalogSource {
        &self.source
    }

    // ─── Queries ─────────────────────────────────────────────────────────

    pub fn models(&self) -> &[ModelDescriptor] {
        &self.models
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Model ids in catalog order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.models.iter().map(|m| m.id.as_str())
    }

    /// First entry with exactly this id.
    pub fn find(&self, id: &str) -> Option<&ModelDescriptor> {
        self.models.iter().find(|m| m.id == id)
    }

    pub fn filter_by_provider(&self, provider: &str) -> Vec<&ModelDescriptor> {
        self.models.iter().filter(|m| m.owned_by == provider).collect()
    }

    pub fn filter_by_modality(&self, modality: Modality) -> Vec<&ModelDescriptor> {
        self.models.iter().filter(|m| m.supports(modality)).collect()
    }

    /// Models that accept text.
    pub fn text_models(&self) -> Vec<&ModelDescriptor> {
        self.filter_by_modality(Modality::Text)
    }

    /// Models that also accept images.
    pub fn multimodal_models(&self) -> Vec<&ModelDescriptor> {
        self.filter_by_modality(Modality::Image)
    }

    /// Providers in first-seen order, without duplicates.
    pub fn distinct_providers(&self) -> Vec<&str> {
        let mut providers: Vec<&str> = Vec::new();
        for model in &self.models {
            if !providers.contains(&model.owned_by.as_str()) {
                providers.push(&model.owned_by);
            }
        }
        providers
    }

    /// Entries grouped by provider, both levels in first-seen order.
    pub fn grouped_by_provider(&self) -> Vec<(&str, Vec<&ModelDescriptor>)> {
        self.distinct_providers()
            .into_iter()
            .map(|p| (p, self.filter_by_provider(p)))
            .collect()
    }
}

/// Read and validate a catalog file.
fn read_catalog_file(path: &Path) -> Result<Vec<ModelDescriptor>, CatalogError> {
    let raw = std::fs::read_to_string(path).map_err(|e| CatalogError::Io {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let file: CatalogFile = serde_yaml::from_str(&raw).map_err(|e| CatalogError::Parse {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    if file.models.is_empty() {
        return Err(CatalogError::Empty {
            path: path.to_path_buf(),
        });
    }

    Ok(file.models)
}

/// Locate the catalog file.
///
/// 1. `explicit`, when given (even if it does not exist; loading then falls back)
/// 2. the `LLM7_CONFIG` env var
/// 3. `config/config.yaml` in `start` or any ancestor
pub fn resolve_catalog_path(explicit: Option<&Path>, start: &Path) -> Result<PathBuf, CatalogError> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        if !path.trim().is_empty() {
            return Ok(PathBuf::from(path));
        }
    }

    let mut dir = start.to_path_buf();
    loop {
        let candidate = dir.join(CONFIG_RELATIVE_PATH);
        if candidate.exists() {
            return Ok(candidate);
        }
        if !dir.pop() {
            break;
        }
    }

    Err(CatalogError::NotFound {
        searched: CONFIG_RELATIVE_PATH.into(),
    })
}

// ─── Tests ───────────────────────────────────────────────────────────────────
