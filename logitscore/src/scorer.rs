//! Input-token log-probabilities.
//!
//! Position `p` of the sequence is scored with the logit row emitted at
//! position `p - 1`: the distribution the model produced after consuming the
//! previous position. Embedding blocks advance the position cursor without
//! producing output. The token at global position 0 has no predecessor and
//! receives [`CONTEXT_FREE_SENTINEL`].
//!
//! Scoring runs in two passes. The cursor walk validates the whole layout
//! against the buffer and records which row scores which token; only then
//! are the log-softmax values computed. A bad layout therefore fails before
//! any row is read.

use rayon::prelude::*;
use tracing::{debug, trace};

use crate::chunk::{Segment, SequenceChunks};
use crate::config::ScorerConfig;
use crate::dtype::LogitElement;
use crate::logits::LogitsBuffer;
use crate::sequence::{LogprobSequence, CONTEXT_FREE_SENTINEL};
use crate::{Error, Result};

/// `log(Σ exp(row[j]))`, computed with the max-subtraction trick.
///
/// Shifting and summing happen in `f64`; the result is rounded to `f32`
/// once. Returns `f32::NEG_INFINITY` for an empty row. A row whose maximum
/// is not finite returns that maximum unchanged.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn log_sum_exp<T: LogitElement>(row: &[T]) -> f32 {
    log_sum_exp_f64(row) as f32
}

fn log_sum_exp_f64<T: LogitElement>(row: &[T]) -> f64 {
    let max = row
        .iter()
        .map(|v| v.to_f64())
        .fold(f64::NEG_INFINITY, f64::max);
    if !max.is_finite() {
        return max;
    }
    let sum: f64 = row.iter().map(|v| (v.to_f64() - max).exp()).sum();
    sum.ln() + max
}

/// Log-softmax of `row` evaluated at `token`.
///
/// Callers check `token < row.len()` first; the scorer's plan and
/// [`LogitsBuffer::logprob`] both do.
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn token_logprob<T: LogitElement>(row: &[T], token: usize) -> f32 {
    (row[token].to_f64() - log_sum_exp_f64(row)) as f32
}

/// What the cursor walk decided for one token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    /// Token at global position 0.
    ContextFree,
    /// Score `token` against logit row `row`.
    Row { row: usize, token: u32 },
}

/// Scores every text token of a mixed text / embedding sequence.
#[derive(Debug, Clone, Default)]
pub struct LogitScorer {
    config: ScorerConfig,
}

impl LogitScorer {
    /// # Errors
    /// Returns an error if `config` fails validation.
    pub fn new(config: ScorerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    #[must_use]
    pub fn config(&self) -> &ScorerConfig {
        &self.config
    }

    /// One log-probability per text token, in encounter order.
    ///
    /// # Errors
    /// Returns [`Error::LayoutOverrun`] if the chunks describe more positions
    /// than the buffer has rows for, or [`Error::TokenOutOfRange`] if a token
    /// id is not below the vocabulary size. Nothing is scored in either case.
    pub fn score<T: LogitElement>(
        &self,
        logits: &LogitsBuffer<'_, T>,
        chunks: &SequenceChunks,
    ) -> Result<LogprobSequence> {
        let slots = self.plan(logits, chunks)?;
        let values = slots
            .iter()
            .map(|&slot| evaluate(logits, slot))
            .collect::<Result<Vec<_>>>()?;
        Ok(finish(values, &slots))
    }

    /// Same as [`Self::score`], with the per-token log-softmax spread over
    /// the rayon thread pool. Output is bit-identical to [`Self::score`].
    ///
    /// # Errors
    /// See [`Self::score`].
    pub fn score_parallel<T: LogitElement>(
        &self,
        logits: &LogitsBuffer<'_, T>,
        chunks: &SequenceChunks,
    ) -> Result<LogprobSequence> {
        let slots = self.plan(logits, chunks)?;
        let values = slots
            .par_iter()
            .map(|&slot| evaluate(logits, slot))
            .collect::<Result<Vec<_>>>()?;
        Ok(finish(values, &slots))
    }

    /// Walk the layout with an absolute position cursor.
    fn plan<T: LogitElement>(
        &self,
        logits: &LogitsBuffer<'_, T>,
        chunks: &SequenceChunks,
    ) -> Result<Vec<Slot>> {
        let width = self.config.embedding_block_width;
        let vocab_size = logits.vocab_size();
        let available_rows = logits.rows();

        // The last position's own row predicts past the end and is never read.
        let required_rows = chunks.positions(width).saturating_sub(1);
        if required_rows > available_rows {
            return Err(Error::LayoutOverrun {
                required_rows,
                available_rows,
            });
        }

        let mut slots = Vec::with_capacity(chunks.token_count());
        let mut pos = 0usize;
        for segment in chunks.segments() {
            match segment {
                Segment::Embedding => {
                    trace!(pos, width, "embedding block");
                    pos += width;
                }
                Segment::Tokens(ids) => {
                    trace!(pos, tokens = ids.len(), "token run");
                    for &token in ids {
                        if token as usize >= vocab_size {
                            return Err(Error::TokenOutOfRange {
                                token,
                                position: pos,
                                vocab_size,
                            });
                        }
                        slots.push(if pos == 0 {
                            Slot::ContextFree
                        } else {
                            Slot::Row {
                                row: pos - 1,
                                token,
                            }
                        });
                        pos += 1;
                    }
                }
            }
        }

        debug!(
            segments = chunks.segments().len(),
            tokens = slots.len(),
            positions = pos,
            rows = available_rows,
            vocab_size,
            dtype = %logits.dtype(),
            "planned scoring pass"
        );
        Ok(slots)
    }
}

fn evaluate<T: LogitElement>(logits: &LogitsBuffer<'_, T>, slot: Slot) -> Result<f32> {
    match slot {
        Slot::ContextFree => Ok(CONTEXT_FREE_SENTINEL),
        Slot::Row { row, token } => logits.logprob(row, token),
    }
}

fn finish(values: Vec<f32>, slots: &[Slot]) -> LogprobSequence {
    let context_free_head = slots.first() == Some(&Slot::ContextFree);
    LogprobSequence::new(values, context_free_head)
}

/// Score a flat row-major buffer of `positions × vocab_size` logits.
///
/// # Errors
/// Returns a configuration error for a zero `vocab_size` or block width,
/// [`Error::BufferShape`] for a ragged buffer, and the errors of
/// [`LogitScorer::score`].
pub fn score<T: LogitElement>(
    logits: &[T],
    chunks: &SequenceChunks,
    vocab_size: usize,
    config: &ScorerConfig,
) -> Result<LogprobSequence> {
    let buffer = LogitsBuffer::new(logits, vocab_size)?;
    LogitScorer::new(config.clone())?.score(&buffer, chunks)
}
