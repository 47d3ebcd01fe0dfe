//! Layout of a mixed text / embedding input sequence.
//!
//! A sequence is an ordered list of [`Segment`]s. Token runs occupy one
//! position per token; an embedding block (an image, an audio clip) occupies
//! a fixed number of positions agreed with whoever produced the logits.

use serde::{Deserialize, Serialize};

/// One run of same-kind content in the input sequence.
///
/// JSON form: `{"type": "tokens", "ids": [1, 2]}` or `{"type": "embedding"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "ids", rename_all = "snake_case")]
pub enum Segment {
    /// Discrete text token ids, one position each.
    Tokens(Vec<u32>),
    /// Opaque non-text block of `embedding_block_width` positions.
    Embedding,
}

impl Segment {
    /// Positions this segment consumes given the configured block width.
    #[must_use]
    pub fn positions(&self, embedding_width: usize) -> usize {
        match self {
            Self::Tokens(ids) => ids.len(),
            Self::Embedding => embedding_width,
        }
    }
}

/// Ordered description of the whole input sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SequenceChunks {
    segments: Vec<Segment>,
}

impl SequenceChunks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a run of text tokens.
    pub fn push_tokens(&mut self, ids: impl IntoIterator<Item = u32>) -> &mut Self {
        self.segments.push(Segment::Tokens(ids.into_iter().collect()));
        self
    }

    /// Append one embedding block.
    pub fn push_embedding(&mut self) -> &mut Self {
        self.segments.push(Segment::Embedding);
        self
    }

    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Total number of text tokens across all token runs.
    #[must_use]
    pub fn token_count(&self) -> usize {
        self.token_ids().count()
    }

    /// Text token ids in sequence order, skipping embedding blocks.
    ///
    /// This is the identity sequence parallel to the scorer's output.
    pub fn token_ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.segments
            .iter()
            .flat_map(|segment| match segment {
                Segment::Tokens(ids) => ids.as_slice(),
                Segment::Embedding => &[][..],
            })
            .copied()
    }

    /// Total sequence positions consumed by all segments, saturating at
    /// `usize::MAX`.
    #[must_use]
    pub fn positions(&self, embedding_width: usize) -> usize {
        self.segments
            .iter()
            .map(|segment| segment.positions(embedding_width))
            .fold(0, usize::saturating_add)
    }
}

impl From<Vec<Segment>> for SequenceChunks {
    fn from(segments: Vec<Segment>) -> Self {
        Self { segments }
    }
}

impl FromIterator<Segment> for SequenceChunks {
    fn from_iter<I: IntoIterator<Item = Segment>>(iter: I) -> Self {
        Self {
            segments: iter.into_iter().collect(),
        }
    }
}
