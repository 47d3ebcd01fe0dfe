//! Scorer output.

use serde::Serialize;

/// Value emitted for the token at global position 0.
///
/// No earlier position exists to have predicted that token, so this is a
/// placeholder and not a log-probability.
pub const CONTEXT_FREE_SENTINEL: f32 = 0.0;

/// One log-probability per text token, in sequence order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogprobSequence {
    values: Vec<f32>,
    context_free_head: bool,
}

impl LogprobSequence {
    pub(crate) fn new(values: Vec<f32>, context_free_head: bool) -> Self {
        debug_assert!(!context_free_head || !values.is_empty());
        Self {
            values,
            context_free_head,
        }
    }

    /// Raw values, including the position-0 sentinel if present.
    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<f32> {
        self.values
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Whether `values[0]` is [`CONTEXT_FREE_SENTINEL`] rather than a real
    /// log-probability.
    #[must_use]
    pub fn has_context_free_head(&self) -> bool {
        self.context_free_head
    }

    /// Log-probabilities that were actually computed from a logit row.
    #[must_use]
    pub fn scored(&self) -> &[f32] {
        if self.context_free_head {
            &self.values[1..]
        } else {
            &self.values
        }
    }

    /// Mean of [`Self::scored`], or `None` if nothing was scored.
    #[must_use]
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    pub fn mean_logprob(&self) -> Option<f32> {
        let scored = self.scored();
        if scored.is_empty() {
            return None;
        }
        let sum: f64 = scored.iter().map(|&v| f64::from(v)).sum();
        Some((sum / scored.len() as f64) as f32)
    }

    /// `exp(-mean_logprob)`.
    #[must_use]
    pub fn perplexity(&self) -> Option<f32> {
        self.mean_logprob().map(|mean| (-mean).exp())
    }
}

impl AsRef<[f32]> for LogprobSequence {
    fn as_ref(&self) -> &[f32] {
        &self.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scored_skips_sentinel() {
        let seq = LogprobSequence::new(vec![CONTEXT_FREE_SENTINEL, -1.0, -3.0], true);
        assert_eq!(seq.len(), 3);
        assert_eq!(seq.scored(), &[-1.0, -3.0]);
        assert_eq!(seq.mean_logprob(), Some(-2.0));
        let ppl = seq.perplexity().unwrap();
        assert!((ppl - 2.0f32.exp()).abs() < 1e-4);
    }

    #[test]
    fn test_no_sentinel_uses_all_values() {
        let seq = LogprobSequence::new(vec![-1.0, -3.0], false);
        assert_eq!(seq.scored(), &[-1.0, -3.0]);
        assert_eq!(seq.mean_logprob(), Some(-2.0));
    }

    #[test]
    fn test_single_sentinel_has_no_statistics() {
        let seq = LogprobSequence::new(vec![CONTEXT_FREE_SENTINEL], true);
        assert!(seq.scored().is_empty());
        assert_eq!(seq.mean_logprob(), None);
        assert_eq!(seq.perplexity(), None);
    }

    #[test]
    fn test_empty() {
        let seq = LogprobSequence::new(Vec::new(), false);
        assert!(seq.is_empty());
        assert_eq!(seq.mean_logprob(), None);
    }

    #[test]
    fn test_serializes_flag() {
        let seq = LogprobSequence::new(vec![0.0, -0.5], true);
        let json = serde_json::to_value(&seq).unwrap();
        assert_eq!(json["context_free_head"], true);
        assert_eq!(json["values"][1], -0.5);
    }
}
