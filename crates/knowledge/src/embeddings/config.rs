//! Record of which embedding model built an index.
//!
//! Vectors from different models are not comparable, so the provider, model
//! and dimensions are written next to the index on first use and checked
//! every time the index is opened again.

use super::EmbeddingProvider;
use pdfchat_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const MANIFEST_FILE: &str = "embedding.json";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EmbeddingManifest {
    pub provider: String,
    pub model: String,
    pub dimensions: usize,
}

impl EmbeddingManifest {
    pub fn describe(provider: &dyn EmbeddingProvider) -> Self {
        Self {
            provider: provider.provider_name().to_string(),
            model: provider.model_name().to_string(),
            dimensions: provider.dimensions(),
        }
    }

    pub fn path(index_dir: &Path) -> PathBuf {
        index_dir.join(MANIFEST_FILE)
    }

    /// Read the manifest stored in `index_dir`, if any.
    pub fn load(index_dir: &Path) -> AppResult<Option<Self>> {
        let path = Self::path(index_dir);
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path).map_err(|e| {
            AppError::Storage(format!("Failed to read embedding manifest {:?}: {}", path, e))
        })?;
        let manifest = serde_json::from_str(&content)?;
        Ok(Some(manifest))
    }

    pub fn save(&self, index_dir: &Path) -> AppResult<()> {
        fs::create_dir_all(index_dir)?;
        let path = Self::path(index_dir);
        fs::write(&path, serde_json::to_string_pretty(self)?).map_err(|e| {
            AppError::Storage(format!("Failed to write embedding manifest {:?}: {}", path, e))
        })?;
        tracing::debug!("Saved embedding manifest to {:?}", path);
        Ok(())
    }

    /// Fail if `other` would produce vectors incompatible with this one.
    pub fn validate_consistency(&self, other: &Self) -> AppResult<()> {
        if self.provider != other.provider || self.model != other.model {
            return Err(AppError::Config(format!(
                "Index was built with {}/{} but {}/{} is configured; clear the index or switch back",
                self.provider, self.model, other.provider, other.model
            )));
        }

        if self.dimensions != other.dimensions {
            return Err(AppError::Config(format!(
                "Dimension mismatch: index has {}, provider yields {}",
                self.dimensions, other.dimensions
            )));
        }

        Ok(())
    }
}
