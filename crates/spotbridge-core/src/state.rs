//! Typed decoding of the detector struct from linear memory.
//!
//! One decode routine, driven by the descriptor table in `spotbridge-abi`.
//! Callers get typed values ([`StateSnapshot`]) and never a raw byte range.
//! Every read goes through a view taken at call time, so a memory growth
//! between two reads can never serve stale bytes.

use spotbridge_abi::layout::{FieldKind, FieldSpec, offsets};

use crate::error::BridgeError;
use crate::runtime::EngineRuntime;

/// Decoded value of a single field.
#[derive(Debug, Clone, Copy, PartialEq)]
enum FieldValue {
    F64(f64),
    U32(u32),
    Flag(bool),
}

/// Decodes one field at `base` according to its descriptor. The only place
/// in the bridge that turns struct bytes into values.
fn decode(view: &[u8], base: i32, field: &FieldSpec) -> Result<FieldValue, BridgeError> {
    let addr = base as usize + field.offset;
    let bytes = view
        .get(addr..addr + field.kind.width())
        .ok_or(BridgeError::OutOfBounds { field: field.name, addr })?;
    // wasm linear memory is little-endian by definition.
    Ok(match field.kind {
        FieldKind::F64 => {
            let mut raw = [0u8; 8];
            raw.copy_from_slice(bytes);
            FieldValue::F64(f64::from_le_bytes(raw))
        }
        FieldKind::U32 | FieldKind::Ptr => {
            let mut raw = [0u8; 4];
            raw.copy_from_slice(bytes);
            FieldValue::U32(u32::from_le_bytes(raw))
        }
        FieldKind::Flag => {
            let mut raw = [0u8; 4];
            raw.copy_from_slice(bytes);
            FieldValue::Flag(i32::from_le_bytes(raw) != 0)
        }
    })
}

fn spec(offset: usize) -> &'static FieldSpec {
    // The table is compile-time data validated at load; a miss here is a
    // bridge bug, not an engine condition.
    spotbridge_abi::FIELDS
        .iter()
        .find(|f| f.offset == offset)
        .unwrap_or_else(|| panic!("no field descriptor at offset {offset}"))
}

/// State of the bounded peaks container used for tail re-estimation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeaksSnapshot {
    /// Running first moment accumulator over retained excesses.
    pub e: f64,
    /// Running second moment accumulator.
    pub e2: f64,
    pub min: f64,
    pub max: f64,
    /// Write position inside the circular buffer. Equals the number of
    /// retained peaks until the buffer wraps for the first time.
    pub cursor: u32,
    /// Fixed capacity of the circular buffer (`max_excess` at construction).
    pub capacity: u32,
    /// Whether the buffer has wrapped; once set, older peaks are overwritten.
    pub filled: bool,
}

/// Full decoded detector state.
///
/// A value snapshot: it does not track the struct after the read.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StateSnapshot {
    pub q: f64,
    pub level: f64,
    pub low_tail: bool,
    pub discard_anomalies: bool,
    pub anomaly_threshold: f64,
    pub excess_threshold: f64,
    /// Count of observations that fell in the tail.
    pub nt: u32,
    /// Count of all observations seen.
    pub n: u32,
    /// Fitted shape parameter of the tail model.
    pub gamma: f64,
    /// Fitted scale parameter of the tail model.
    pub sigma: f64,
    pub peaks: PeaksSnapshot,
}

impl EngineRuntime {
    pub(crate) fn read_f64_field(&self, base: i32, offset: usize) -> Result<f64, BridgeError> {
        match decode(self.view(), base, spec(offset))? {
            FieldValue::F64(v) => Ok(v),
            _ => unreachable!("descriptor at {offset} is not an f64"),
        }
    }

    fn read_u32_field(&self, base: i32, offset: usize) -> Result<u32, BridgeError> {
        match decode(self.view(), base, spec(offset))? {
            FieldValue::U32(v) => Ok(v),
            _ => unreachable!("descriptor at {offset} is not a u32"),
        }
    }

    fn read_flag_field(&self, base: i32, offset: usize) -> Result<bool, BridgeError> {
        match decode(self.view(), base, spec(offset))? {
            FieldValue::Flag(v) => Ok(v),
            _ => unreachable!("descriptor at {offset} is not a flag"),
        }
    }

    /// Decodes the whole struct at `base` into a typed snapshot.
    pub(crate) fn snapshot(&self, base: i32) -> Result<StateSnapshot, BridgeError> {
        Ok(StateSnapshot {
            q: self.read_f64_field(base, offsets::Q)?,
            level: self.read_f64_field(base, offsets::LEVEL)?,
            low_tail: self.read_flag_field(base, offsets::LOW)?,
            discard_anomalies: self.read_flag_field(base, offsets::DISCARD_ANOMALIES)?,
            anomaly_threshold: self.read_f64_field(base, offsets::ANOMALY_THRESHOLD)?,
            excess_threshold: self.read_f64_field(base, offsets::EXCESS_THRESHOLD)?,
            nt: self.read_u32_field(base, offsets::NT)?,
            n: self.read_u32_field(base, offsets::N)?,
            gamma: self.read_f64_field(base, offsets::TAIL_GAMMA)?,
            sigma: self.read_f64_field(base, offsets::TAIL_SIGMA)?,
            peaks: PeaksSnapshot {
                e: self.read_f64_field(base, offsets::PEAKS_E)?,
                e2: self.read_f64_field(base, offsets::PEAKS_E2)?,
                min: self.read_f64_field(base, offsets::PEAKS_MIN)?,
                max: self.read_f64_field(base, offsets::PEAKS_MAX)?,
                cursor: self.read_u32_field(base, offsets::CONTAINER_CURSOR)?,
                capacity: self.read_u32_field(base, offsets::CONTAINER_CAPACITY)?,
                filled: self.read_flag_field(base, offsets::CONTAINER_FILLED)?,
            },
        })
    }
}
