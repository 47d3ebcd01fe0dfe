//! JSON request / response types for the command-line scorer.

use std::io::Read;

use half::{bf16, f16};
use serde::{Deserialize, Serialize};

use logitscore::{DType, LogitElement, LogitScorer, LogitsBuffer, Result, SequenceChunks};

/// Scoring request.
///
/// ```json
/// {
///   "vocab_size": 3,
///   "logits": [10, 20, 10, 10, 10, 20],
///   "chunks": [{"type": "tokens", "ids": [0, 1, 2]}]
/// }
/// ```
#[derive(Debug, Deserialize)]
pub struct ScoreRequest {
    pub vocab_size: usize,
    pub logits: Vec<f32>,
    pub chunks: SequenceChunks,
}

/// Scoring result, with the token ids alongside their log-probabilities.
#[derive(Debug, Serialize)]
pub struct ScoreReport {
    pub tokens: Vec<u32>,
    pub logprobs: Vec<f32>,
    /// `logprobs[0]` is a placeholder, not a log-probability.
    pub context_free_head: bool,
    pub mean_logprob: Option<f32>,
    pub perplexity: Option<f32>,
}

impl ScoreRequest {
    /// # Errors
    /// Returns an error if the input is not a valid request.
    pub fn from_reader(reader: impl Read) -> Result<Self> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Score after narrowing the logits to `dtype`.
    ///
    /// # Errors
    /// Propagates buffer and scoring errors.
    pub fn score_as(
        &self,
        scorer: &LogitScorer,
        dtype: DType,
        parallel: bool,
    ) -> Result<ScoreReport> {
        match dtype {
            DType::F32 => self.score_with(scorer, &self.logits, parallel),
            DType::F16 => {
                let narrowed: Vec<f16> =
                    self.logits.iter().map(|&v| f16::from_f32(v)).collect();
                self.score_with(scorer, &narrowed, parallel)
            }
            DType::BF16 => {
                let narrowed: Vec<bf16> =
                    self.logits.iter().map(|&v| bf16::from_f32(v)).collect();
                self.score_with(scorer, &narrowed, parallel)
            }
        }
    }

    fn score_with<T: LogitElement>(
        &self,
        scorer: &LogitScorer,
        logits: &[T],
        parallel: bool,
    ) -> Result<ScoreReport> {
        let buffer = LogitsBuffer::new(logits, self.vocab_size)?;
        let scored = if parallel {
            scorer.score_parallel(&buffer, &self.chunks)?
        } else {
            scorer.score(&buffer, &self.chunks)?
        };
        Ok(ScoreReport {
            tokens: self.chunks.token_ids().collect(),
            context_free_head: scored.has_context_free_head(),
            mean_logprob: scored.mean_logprob(),
            perplexity: scored.perplexity(),
            logprobs: scored.into_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use logitscore::{Error, ScorerConfig};

    const REQUEST: &str = r#"{
        "vocab_size": 3,
        "logits": [10, 20, 10, 10, 10, 20, 0, 0, 0],
        "chunks": [{"type": "tokens", "ids": [0, 1, 2]}]
    }"#;

    #[test]
    fn test_parse_and_score() {
        let request = ScoreRequest::from_reader(REQUEST.as_bytes()).unwrap();
        let report = request
            .score_as(&LogitScorer::default(), DType::F32, false)
            .unwrap();
        assert_eq!(report.tokens, vec![0, 1, 2]);
        assert_eq!(report.logprobs.len(), 3);
        assert!(report.context_free_head);
        assert!(report.mean_logprob.unwrap().abs() < 1e-4);
        assert!((report.perplexity.unwrap() - 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_dtypes_agree_on_exact_values() {
        let request = ScoreRequest::from_reader(REQUEST.as_bytes()).unwrap();
        let scorer = LogitScorer::default();
        let full = request.score_as(&scorer, DType::F32, false).unwrap();
        let f16 = request.score_as(&scorer, DType::F16, true).unwrap();
        let bf16 = request.score_as(&scorer, DType::BF16, false).unwrap();
        // Small integers survive narrowing exactly.
        assert_eq!(full.logprobs, f16.logprobs);
        assert_eq!(full.logprobs, bf16.logprobs);
    }

    #[test]
    fn test_embedding_request() {
        let json = r#"{
            "vocab_size": 2,
            "logits": [0, 0, 0, 0, 0, 0],
            "chunks": [
                {"type": "embedding"},
                {"type": "tokens", "ids": [1]}
            ]
        }"#;
        let request = ScoreRequest::from_reader(json.as_bytes()).unwrap();
        let scorer = LogitScorer::new(ScorerConfig::with_embedding_block_width(3)).unwrap();
        let report = request.score_as(&scorer, DType::F32, false).unwrap();
        assert_eq!(report.tokens, vec![1]);
        assert!(!report.context_free_head);
        assert!((report.logprobs[0] + 2.0f32.ln()).abs() < 1e-6);
    }

    #[test]
    fn test_malformed_request() {
        let err = ScoreRequest::from_reader(r#"{"vocab_size": 3}"#.as_bytes()).unwrap_err();
        assert!(matches!(err, Error::Json(_)));
    }

    #[test]
    fn test_report_serializes_missing_statistics_as_null() {
        let json = r#"{
            "vocab_size": 2,
            "logits": [0, 0],
            "chunks": [{"type": "tokens", "ids": [1]}]
        }"#;
        let request = ScoreRequest::from_reader(json.as_bytes()).unwrap();
        let report = request
            .score_as(&LogitScorer::default(), DType::F32, false)
            .unwrap();
        let value = serde_json::to_value(&report).unwrap();
        assert!(value["mean_logprob"].is_null());
        assert!(value["perplexity"].is_null());
        assert_eq!(value["logprobs"][0], 0.0);
    }
}
