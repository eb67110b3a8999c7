//! The fit-then-stream loop.
//!
//! Input is one observation per line (blank lines skipped). The first
//! `--train` observations form the calibration batch; everything after is
//! streamed through the detector, one JSONL record per observation.

use std::io::{BufRead, Write};
use std::path::PathBuf;

use clap::Parser;
use thiserror::Error;

use spotbridge_core::{BridgeError, Outcome, Spot, SpotConfig, SpotEngine};

use crate::record::{Emitter, StepRecord, SummaryRecord, finite};

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("line {line}: not a number: {text:?}")]
    Parse { line: usize, text: String },
    #[error(transparent)]
    Bridge(#[from] BridgeError),
    #[error("need at least {want} training observations, got {got}")]
    ShortTrain { want: usize, got: usize },
}

/// Stream observations through a libspot detector.
#[derive(Debug, Parser)]
#[command(name = "spot-harness", version)]
pub struct Args {
    /// Path to the compiled engine image (libspot.wasm).
    #[arg(long)]
    pub engine: PathBuf,

    /// Observations file, one per line; stdin when omitted.
    #[arg(long)]
    pub input: Option<PathBuf>,

    /// Write the JSONL records to this file instead of stdout.
    #[arg(long)]
    pub log: Option<PathBuf>,

    /// Number of leading observations used for batch calibration.
    #[arg(long, default_value_t = 1000)]
    pub train: usize,

    /// Target exceedance probability in (0, 1 - level).
    #[arg(long, default_value_t = 5e-4)]
    pub q: f64,

    /// High quantile delimiting the tail.
    #[arg(long, default_value_t = 0.98)]
    pub level: f64,

    /// Capacity of the peaks container.
    #[arg(long, default_value_t = 500)]
    pub max_excess: i32,

    /// Analyze the lower tail instead of the upper one.
    #[arg(long)]
    pub low_tail: bool,

    /// Keep flagged anomalies in the model updates.
    #[arg(long)]
    pub keep_anomalies: bool,
}

impl Args {
    fn config(&self) -> SpotConfig {
        SpotConfig {
            q: self.q,
            level: self.level,
            max_excess: self.max_excess,
            low_tail: self.low_tail,
            discard_anomalies: !self.keep_anomalies,
        }
    }
}

/// Parses one observation per non-blank line.
pub fn parse_observations(input: impl BufRead) -> Result<Vec<f64>, HarnessError> {
    let mut values = Vec::new();
    for (i, line) in input.lines().enumerate() {
        let line = line?;
        let text = line.trim();
        if text.is_empty() {
            continue;
        }
        let value: f64 = text
            .parse()
            .map_err(|_| HarnessError::Parse { line: i + 1, text: text.to_owned() })?;
        values.push(value);
    }
    Ok(values)
}

/// Runs the whole harness: load, construct, fit, stream, summarize.
pub fn run(args: &Args, input: impl BufRead, out: impl Write) -> Result<(), HarnessError> {
    let engine = SpotEngine::load_file(&args.engine)?;
    let observations = parse_observations(input)?;
    if observations.len() < args.train {
        return Err(HarnessError::ShortTrain { want: args.train, got: observations.len() });
    }

    let mut detector = Spot::new(&engine, &args.config())?;
    let (batch, stream) = observations.split_at(args.train);
    detector.fit(batch)?;

    let mut emitter = Emitter::new(out);
    let (mut normal, mut excess, mut anomaly) = (0u64, 0u64, 0u64);
    for (seq, &value) in stream.iter().enumerate() {
        let outcome = detector.step(value)?;
        match outcome {
            Outcome::Normal => normal += 1,
            Outcome::Excess => excess += 1,
            Outcome::Anomaly => anomaly += 1,
        }
        emitter.emit(&StepRecord {
            seq: seq as u64,
            value,
            outcome,
            anomaly_threshold: finite(detector.anomaly_threshold()?),
            excess_threshold: finite(detector.excess_threshold()?),
        })?;
    }

    emitter.emit(&SummaryRecord {
        engine_version: engine.version()?,
        trained: batch.len(),
        streamed: stream.len() as u64,
        normal,
        excess,
        anomaly,
        anomaly_threshold: finite(detector.anomaly_threshold()?),
        excess_threshold: finite(detector.excess_threshold()?),
    })?;
    emitter.into_inner()?;

    detector.dispose()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn args_parse_with_defaults() {
        let args = Args::try_parse_from(["spot-harness", "--engine", "libspot.wasm"])
            .expect("parses");
        assert_eq!(args.train, 1000);
        assert_eq!(args.q, 5e-4);
        assert_eq!(args.level, 0.98);
        assert_eq!(args.max_excess, 500);
        assert!(!args.low_tail);
        assert!(args.config().discard_anomalies);
    }

    #[test]
    fn keep_anomalies_flips_the_discard_flag() {
        let args = Args::try_parse_from([
            "spot-harness",
            "--engine",
            "libspot.wasm",
            "--keep-anomalies",
            "--low-tail",
        ])
        .expect("parses");
        let config = args.config();
        assert!(!config.discard_anomalies);
        assert!(config.low_tail);
    }

    #[test]
    fn observations_parse_and_skip_blanks() {
        let input = "1.0\n\n  2.5 \n-3e-2\n";
        let values = parse_observations(input.as_bytes()).expect("parses");
        assert_eq!(values, vec![1.0, 2.5, -0.03]);
    }

    #[test]
    fn garbage_lines_are_reported_with_position() {
        let err = parse_observations("1.0\npotato\n".as_bytes()).unwrap_err();
        match err {
            HarnessError::Parse { line, text } => {
                assert_eq!(line, 2);
                assert_eq!(text, "potato");
            }
            other => panic!("expected Parse, got {other:?}"),
        }
    }
}
