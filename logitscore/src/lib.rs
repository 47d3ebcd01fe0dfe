//! logitscore: per-token log-probabilities for mixed text / embedding input
//!
//! Given the logits a model emitted for every position of an input sequence
//! that interleaves text tokens with fixed-width embedding blocks (image
//! patches, audio frames), compute the log-probability the model assigned to
//! each text token. Token `p` is scored against the row emitted at position
//! `p - 1`.
//!
//! Model execution, tokenization and anything that produces the logits live
//! elsewhere; this crate only reads a flat buffer.
//!
//! # Example
//!
//! ```
//! use logitscore::{LogitScorer, LogitsBuffer, ScorerConfig, SequenceChunks};
//!
//! # fn main() -> logitscore::Result<()> {
//! let logits = [10.0f32, 20.0, 10.0, 10.0, 10.0, 20.0, 0.0, 0.0, 0.0];
//! let buffer = LogitsBuffer::new(&logits, 3)?;
//!
//! let mut chunks = SequenceChunks::new();
//! chunks.push_tokens([0, 1, 2]);
//!
//! let scorer = LogitScorer::new(ScorerConfig::default())?;
//! let logprobs = scorer.score(&buffer, &chunks)?;
//! assert_eq!(logprobs.len(), 3);
//! assert_eq!(logprobs.as_slice()[0], 0.0);
//! assert!(logprobs.has_context_free_head());
//! # Ok(())
//! # }
//! ```

#![allow(clippy::module_name_repetitions)]

pub mod chunk;
pub mod config;
pub mod dtype;
pub mod error;
pub mod logits;
pub mod scorer;
pub mod sequence;

pub use chunk::{Segment, SequenceChunks};
pub use config::{ScorerConfig, DEFAULT_EMBEDDING_BLOCK_WIDTH};
pub use dtype::{DType, LogitElement};
pub use error::{Error, ErrorKind, Result};
pub use logits::LogitsBuffer;
pub use scorer::{log_sum_exp, score, LogitScorer};
pub use sequence::{LogprobSequence, CONTEXT_FREE_SENTINEL};
