//! Score the input tokens of a mixed text / embedding sequence
//!
//! Usage:
//!   # Request from a file, embedding width from a config file:
//!   logitscore -i request.json -c scorer.json
//!   # Request on stdin, half-precision logits, parallel scoring:
//!   cat request.json | logitscore --dtype bf16 --parallel --pretty
//!   # Override the embedding block width:
//!   logitscore -i request.json -w 64
//!
//! Set `RUST_LOG=logitscore=debug` to see the scoring plan.

use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use logitscore::{DType, LogitScorer, Result, ScorerConfig};

mod request;

use request::ScoreRequest;

/// Per-token log-probabilities from model logits
///
/// Reads `{"vocab_size", "logits", "chunks"}` as JSON and prints one
/// log-probability per text token. The first token of a sequence that
/// starts with text has no context and is reported as 0.0; mean and
/// perplexity leave it out.
#[derive(Parser)]
#[command(name = "logitscore", version)]
struct Cli {
    /// Scoring request file (reads stdin when omitted)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Scorer config file (JSON)
    #[arg(short, long, env = "LOGITSCORE_CONFIG")]
    config: Option<PathBuf>,

    /// Positions per embedding block (overrides the config file)
    #[arg(short = 'w', long)]
    embedding_width: Option<usize>,

    /// Precision the logits are narrowed to before scoring
    #[arg(long, default_value_t = DType::F32)]
    dtype: DType,

    /// Spread per-token work over all cores
    #[arg(long)]
    parallel: bool,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("logitscore=info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    run(&cli).map_err(|e| {
        error!(kind = ?e.kind(), "{e}");
        e
    })
}

fn run(cli: &Cli) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => ScorerConfig::from_file(path)?,
        None => ScorerConfig::default(),
    };
    if let Some(width) = cli.embedding_width {
        config.embedding_block_width = width;
    }
    let scorer = LogitScorer::new(config)?;

    let request = match &cli.input {
        Some(path) => ScoreRequest::from_reader(BufReader::new(File::open(path)?))?,
        None => ScoreRequest::from_reader(io::stdin().lock())?,
    };

    let report = request.score_as(&scorer, cli.dtype, cli.parallel)?;
    info!(
        tokens = report.tokens.len(),
        embedding_block_width = scorer.config().embedding_block_width,
        dtype = %cli.dtype,
        mean_logprob = ?report.mean_logprob,
        perplexity = ?report.perplexity,
        "scored"
    );

    let out = if cli.pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    println!("{out}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use logitscore::{Error, ErrorKind};

    #[test]
    fn test_cli_parses_flags() {
        let cli = Cli::try_parse_from([
            "logitscore",
            "-i",
            "request.json",
            "-w",
            "64",
            "--dtype",
            "bf16",
            "--parallel",
        ])
        .unwrap();
        assert_eq!(cli.input, Some(PathBuf::from("request.json")));
        assert_eq!(cli.embedding_width, Some(64));
        assert_eq!(cli.dtype, DType::BF16);
        assert!(cli.parallel);
        assert!(!cli.pretty);
    }

    #[test]
    fn test_cli_rejects_unknown_dtype() {
        assert!(Cli::try_parse_from(["logitscore", "--dtype", "i8"]).is_err());
    }

    #[test]
    fn test_run_missing_input_is_io_error() {
        let cli = Cli::try_parse_from(["logitscore", "-i", "/nonexistent/request.json"]).unwrap();
        let err = run(&cli).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_run_zero_width_is_configuration_error() {
        let cli = Cli::try_parse_from(["logitscore", "-w", "0"]).unwrap();
        let err = run(&cli).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_run_scores_request_file() {
        let path = std::env::temp_dir().join(format!(
            "logitscore-request-{}.json",
            std::process::id()
        ));
        std::fs::write(
            &path,
            r#"{"vocab_size": 2, "logits": [0, 0], "chunks": [{"type": "tokens", "ids": [0, 1]}]}"#,
        )
        .unwrap();
        let cli = Cli::try_parse_from(["logitscore", "-i", path.to_str().unwrap()]).unwrap();
        let result = run(&cli);
        std::fs::remove_file(&path).unwrap();
        assert!(result.is_ok());
    }
}
