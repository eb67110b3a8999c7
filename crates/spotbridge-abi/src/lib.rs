//! ABI description of the libspot WASM engine.
//!
//! Everything in this crate is compiled-in knowledge about the engine's
//! boundary: export names and signatures, the byte layout of the detector
//! struct, and the classification codes returned by the streaming step.
//!
//! This crate holds no runtime. It exists so that the layout table can be
//! validated and unit-tested in isolation from any instantiated module, the
//! same way the bridge must validate it before trusting a single offset.

pub mod exports;
pub mod layout;
pub mod outcome;

pub use layout::{FIELDS, FieldKind, FieldSpec, LayoutError, SPOT_STRUCT_SIZE, WASM_PAGE_SIZE};
pub use outcome::Outcome;
