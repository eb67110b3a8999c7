//! Streaming harness around the libspot WASM bridge.
//!
//! Provides:
//! - [`Args`]: CLI surface (engine image, detector parameters, train split).
//! - [`record`]: JSONL record types emitted per observation and at the end
//!   of a run.
//! - [`runner`]: the fit-then-stream loop.

pub mod record;
pub mod runner;

pub use record::{Emitter, StepRecord, SummaryRecord};
pub use runner::{Args, HarnessError, run};
