//! JSONL record types for harness output.
//!
//! One line per observation, one summary line at the end. Thresholds are
//! serialized as `Option<f64>` because JSON has no NaN and the detector
//! legitimately reports non-finite thresholds before calibration.

use std::io::Write;

use serde::Serialize;
use spotbridge_abi::Outcome;

/// Per-observation record.
#[derive(Debug, Clone, Serialize)]
pub struct StepRecord {
    /// 0-based index of the observation within the streamed phase.
    pub seq: u64,
    pub value: f64,
    pub outcome: Outcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anomaly_threshold: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excess_threshold: Option<f64>,
}

/// End-of-run record.
#[derive(Debug, Clone, Serialize)]
pub struct SummaryRecord {
    pub engine_version: String,
    pub trained: usize,
    pub streamed: u64,
    pub normal: u64,
    pub excess: u64,
    pub anomaly: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anomaly_threshold: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excess_threshold: Option<f64>,
}

/// Serializes a threshold, mapping non-finite values to `None`.
#[must_use]
pub fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

/// Writes JSONL lines to any sink.
pub struct Emitter<W: Write> {
    out: W,
}

impl<W: Write> Emitter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Emits one record as a single JSON line.
    pub fn emit<T: Serialize>(&mut self, record: &T) -> std::io::Result<()> {
        serde_json::to_writer(&mut self.out, record)?;
        self.out.write_all(b"\n")
    }

    /// Flushes and returns the underlying sink.
    pub fn into_inner(mut self) -> std::io::Result<W> {
        self.out.flush()?;
        Ok(self.out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_records_serialize_with_lowercase_outcomes() {
        let record = StepRecord {
            seq: 3,
            value: 0.5,
            outcome: Outcome::Excess,
            anomaly_threshold: Some(9.9),
            excess_threshold: Some(0.98),
        };
        let line = serde_json::to_string(&record).expect("serializes");
        assert!(line.contains("\"outcome\":\"excess\""));
        assert!(line.contains("\"seq\":3"));
    }

    #[test]
    fn non_finite_thresholds_are_omitted() {
        let record = StepRecord {
            seq: 0,
            value: 1.0,
            outcome: Outcome::Normal,
            anomaly_threshold: finite(f64::NAN),
            excess_threshold: finite(f64::INFINITY),
        };
        let line = serde_json::to_string(&record).expect("serializes");
        assert!(!line.contains("threshold"));
    }

    #[test]
    fn emitter_writes_one_line_per_record() {
        let mut emitter = Emitter::new(Vec::new());
        emitter
            .emit(&SummaryRecord {
                engine_version: "2.0b".into(),
                trained: 100,
                streamed: 2,
                normal: 1,
                excess: 1,
                anomaly: 0,
                anomaly_threshold: Some(4.2),
                excess_threshold: Some(1.1),
            })
            .expect("emits");
        let buf = emitter.into_inner().expect("flushes");
        let text = String::from_utf8(buf).expect("utf-8");
        assert_eq!(text.lines().count(), 1);
        assert!(text.contains("\"engine_version\":\"2.0b\""));
    }
}
