//! Borrowed view over a flat, row-major logits buffer.
//!
//! The model-execution layer produces one logit vector per sequence
//! position and hands them over as a single contiguous slice of
//! `positions × vocab_size` elements. Row `i` occupies
//! `[i * vocab_size, (i + 1) * vocab_size)`.

use crate::dtype::{DType, LogitElement};
use crate::scorer::token_logprob;
use crate::{Error, Result};

/// Read-only logits for every evaluated position of a sequence.
#[derive(Debug, Clone, Copy)]
pub struct LogitsBuffer<'a, T: LogitElement = f32> {
    data: &'a [T],
    vocab_size: usize,
}

impl<'a, T: LogitElement> LogitsBuffer<'a, T> {
    /// Wrap a flat buffer.
    ///
    /// # Errors
    /// Returns [`Error::InvalidVocabSize`] if `vocab_size` is zero, or
    /// [`Error::BufferShape`] if `data` is not a whole number of rows.
    pub fn new(data: &'a [T], vocab_size: usize) -> Result<Self> {
        if vocab_size == 0 {
            return Err(Error::InvalidVocabSize(vocab_size));
        }
        if data.len() % vocab_size != 0 {
            return Err(Error::BufferShape {
                len: data.len(),
                vocab_size,
            });
        }
        Ok(Self { data, vocab_size })
    }

    /// Number of logit values per row.
    #[must_use]
    pub fn vocab_size(&self) -> usize {
        self.vocab_size
    }

    /// Number of rows (sequence positions) held by the buffer.
    #[must_use]
    pub fn rows(&self) -> usize {
        self.data.len() / self.vocab_size
    }

    /// Element type of the buffer.
    #[must_use]
    pub fn dtype(&self) -> DType {
        T::DTYPE
    }

    /// The logit vector emitted at sequence position `index`.
    ///
    /// # Errors
    /// Returns [`Error::LayoutOverrun`] if the buffer has no such row.
    pub fn row(&self, index: usize) -> Result<&'a [T]> {
        self.data
            .chunks_exact(self.vocab_size)
            .nth(index)
            .ok_or(Error::LayoutOverrun {
                required_rows: index.saturating_add(1),
                available_rows: self.rows(),
            })
    }

    /// Log-probability of `token` under the distribution in row `row`.
    ///
    /// Row `row` predicts the token at sequence position `row + 1`, which is
    /// the position reported if `token` is out of range.
    ///
    /// # Errors
    /// Returns [`Error::LayoutOverrun`] if the buffer has no such row, or
    /// [`Error::TokenOutOfRange`] if `token` is not below the vocabulary size.
    pub fn logprob(&self, row: usize, token: u32) -> Result<f32> {
        let logits = self.row(row)?;
        if token as usize >= self.vocab_size {
            return Err(Error::TokenOutOfRange {
                token,
                position: row.saturating_add(1),
                vocab_size: self.vocab_size,
            });
        }
        Ok(token_logprob(logits, token as usize))
    }

    /// The whole flat buffer.
    #[must_use]
    pub fn as_slice(&self) -> &'a [T] {
        self.data
    }
}
