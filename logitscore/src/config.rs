//! Scorer configuration

use serde::Deserialize;
use std::path::Path;

use crate::{Error, Result};

/// Embedding block width used when a config file does not set one.
pub const DEFAULT_EMBEDDING_BLOCK_WIDTH: usize = 5;

/// Deployment constants shared between the logits producer and the scorer.
///
/// Usually parsed from a small JSON file shipped next to the model.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ScorerConfig {
    /// Sequence positions occupied by one embedding block. Must match the
    /// layout the logits buffer was generated with.
    #[serde(default = "default_embedding_block_width")]
    pub embedding_block_width: usize,
}

fn default_embedding_block_width() -> usize {
    DEFAULT_EMBEDDING_BLOCK_WIDTH
}

impl Default for ScorerConfig {
    fn default() -> Self {
        Self {
            embedding_block_width: DEFAULT_EMBEDDING_BLOCK_WIDTH,
        }
    }
}

impl ScorerConfig {
    #[must_use]
    pub fn with_embedding_block_width(embedding_block_width: usize) -> Self {
        Self {
            embedding_block_width,
        }
    }

    /// Load configuration from a JSON file
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed, or if the
    /// parsed values fail [`ScorerConfig::validate`].
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    /// Returns [`Error::InvalidEmbeddingWidth`] if the block width is zero.
    pub fn validate(&self) -> Result<()> {
        if self.embedding_block_width == 0 {
            return Err(Error::InvalidEmbeddingWidth(self.embedding_block_width));
        }
        Ok(())
    }
}
