//! Host-side bridge to the libspot WASM anomaly-detection engine.
//!
//! The engine is a streaming extreme-value detector (SPOT: Peaks-Over-
//! Threshold tail modeling with online classification) compiled to
//! WebAssembly, treated here as an opaque computational unit behind a flat
//! ABI. This crate does the systems work around it:
//!
//! - [`SpotEngine`]: instantiation, one-time startup, typed export table,
//!   struct-size verification against the compiled-in layout.
//! - heap management over the shared linear memory, including growth when an
//!   engine allocation extends past the mapped length.
//! - byte-exact decoding of the detector struct into [`StateSnapshot`].
//! - translation of native error codes through the engine's own message
//!   table into the [`BridgeError`] taxonomy.
//! - [`Spot`]: the detector facade owning one struct allocation, with
//!   deterministic release on `dispose()` or drop.
//!
//! ```no_run
//! use spotbridge_core::{Spot, SpotConfig, SpotEngine};
//!
//! # fn main() -> Result<(), spotbridge_core::BridgeError> {
//! let engine = SpotEngine::load_file("libspot.wasm")?;
//! let mut detector = Spot::new(&engine, &SpotConfig { q: 1e-4, ..Default::default() })?;
//! detector.fit(&[1.0, 2.0, 3.0, 4.0, 5.0])?;
//! let outcome = detector.step(42.0)?;
//! println!("{outcome:?} at threshold {}", detector.anomaly_threshold()?);
//! # Ok(())
//! # }
//! ```

mod detector;
mod errmsg;
mod error;
mod heap;
mod runtime;
mod state;

pub use detector::{Spot, SpotConfig};
pub use error::BridgeError;
pub use runtime::SpotEngine;
pub use state::{PeaksSnapshot, StateSnapshot};

pub use spotbridge_abi::Outcome;
