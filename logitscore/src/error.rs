//! Error types for logitscore

use thiserror::Error;

/// Result type alias using logitscore's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for scoring operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("chunk layout needs {required_rows} logit rows, buffer has {available_rows}")]
    LayoutOverrun {
        required_rows: usize,
        available_rows: usize,
    },

    #[error("token {token} at position {position} is outside vocabulary of size {vocab_size}")]
    TokenOutOfRange {
        token: u32,
        position: usize,
        vocab_size: usize,
    },

    #[error("logits buffer of length {len} is not a whole number of rows of width {vocab_size}")]
    BufferShape { len: usize, vocab_size: usize },

    #[error("vocabulary size must be positive, got {0}")]
    InvalidVocabSize(usize),

    #[error("embedding block width must be positive, got {0}")]
    InvalidEmbeddingWidth(usize),

    #[error("Unsupported dtype: {0}")]
    UnsupportedDtype(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The logits buffer and the chunk description disagree. Not retryable.
    ContractViolation,
    /// Vocabulary size, block width or dtype is unusable.
    Configuration,
    /// Reading or parsing external input failed.
    Io,
}

impl Error {
    /// Which part of the error taxonomy this error belongs to.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::LayoutOverrun { .. }
            | Self::TokenOutOfRange { .. }
            | Self::BufferShape { .. } => ErrorKind::ContractViolation,
            Self::InvalidVocabSize(_)
            | Self::InvalidEmbeddingWidth(_)
            | Self::UnsupportedDtype(_) => ErrorKind::Configuration,
            Self::Io(_) | Self::Json(_) => ErrorKind::Io,
        }
    }

    #[must_use]
    pub fn is_contract_violation(&self) -> bool {
        self.kind() == ErrorKind::ContractViolation
    }
}
