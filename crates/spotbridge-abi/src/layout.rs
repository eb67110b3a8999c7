//! Byte layout of the engine-side detector struct.
//!
//! The engine compiles for wasm32: `double` is 8 bytes, `int`/`size_t`/
//! pointers are 4 bytes, little-endian. The struct totals 128 bytes and the
//! engine reports that size at runtime through `spot_size()`; the bridge must
//! refuse to read or write a single field until the reported size matches
//! [`SPOT_STRUCT_SIZE`].
//!
//! All decoding goes through this one descriptor table. No consumer outside
//! the bridge ever sees a raw byte range.

use thiserror::Error;

/// Expected `spot_size()` for the layout described by [`FIELDS`].
pub const SPOT_STRUCT_SIZE: u32 = 128;

/// WASM linear memory page size in bytes.
pub const WASM_PAGE_SIZE: u64 = 65_536;

/// Numeric encoding of a struct field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// IEEE-754 double, little-endian.
    F64,
    /// Unsigned 32-bit counter, little-endian.
    U32,
    /// C `int` used as a boolean (wasm32: 4 bytes).
    Flag,
    /// wasm32 pointer into linear memory (4 bytes).
    Ptr,
}

impl FieldKind {
    /// Width of the encoded field in bytes.
    #[must_use]
    pub const fn width(self) -> usize {
        match self {
            Self::F64 => 8,
            Self::U32 | Self::Flag | Self::Ptr => 4,
        }
    }
}

/// A single entry of the layout descriptor table.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub offset: usize,
    pub kind: FieldKind,
}

/// Field offsets, kept alongside the table so call sites read symbolically.
pub mod offsets {
    pub const Q: usize = 0;
    pub const LEVEL: usize = 8;
    pub const DISCARD_ANOMALIES: usize = 16;
    pub const LOW: usize = 20;
    pub const UP_DOWN: usize = 24;
    pub const ANOMALY_THRESHOLD: usize = 32;
    pub const EXCESS_THRESHOLD: usize = 40;
    pub const NT: usize = 48;
    pub const N: usize = 52;
    pub const TAIL_GAMMA: usize = 56;
    pub const TAIL_SIGMA: usize = 64;
    pub const PEAKS_E: usize = 72;
    pub const PEAKS_E2: usize = 80;
    pub const PEAKS_MIN: usize = 88;
    pub const PEAKS_MAX: usize = 96;
    pub const CONTAINER_CURSOR: usize = 104;
    pub const CONTAINER_CAPACITY: usize = 108;
    pub const CONTAINER_LAST_ERASED: usize = 112;
    pub const CONTAINER_FILLED: usize = 120;
    pub const CONTAINER_DATA: usize = 124;
}

/// The full descriptor table for the 128-byte detector struct.
pub const FIELDS: &[FieldSpec] = &[
    FieldSpec { name: "q", offset: offsets::Q, kind: FieldKind::F64 },
    FieldSpec { name: "level", offset: offsets::LEVEL, kind: FieldKind::F64 },
    FieldSpec { name: "discard_anomalies", offset: offsets::DISCARD_ANOMALIES, kind: FieldKind::Flag },
    FieldSpec { name: "low", offset: offsets::LOW, kind: FieldKind::Flag },
    FieldSpec { name: "__up_down", offset: offsets::UP_DOWN, kind: FieldKind::F64 },
    FieldSpec { name: "anomaly_threshold", offset: offsets::ANOMALY_THRESHOLD, kind: FieldKind::F64 },
    FieldSpec { name: "excess_threshold", offset: offsets::EXCESS_THRESHOLD, kind: FieldKind::F64 },
    FieldSpec { name: "Nt", offset: offsets::NT, kind: FieldKind::U32 },
    FieldSpec { name: "n", offset: offsets::N, kind: FieldKind::U32 },
    FieldSpec { name: "tail.gamma", offset: offsets::TAIL_GAMMA, kind: FieldKind::F64 },
    FieldSpec { name: "tail.sigma", offset: offsets::TAIL_SIGMA, kind: FieldKind::F64 },
    FieldSpec { name: "peaks.e", offset: offsets::PEAKS_E, kind: FieldKind::F64 },
    FieldSpec { name: "peaks.e2", offset: offsets::PEAKS_E2, kind: FieldKind::F64 },
    FieldSpec { name: "peaks.min", offset: offsets::PEAKS_MIN, kind: FieldKind::F64 },
    FieldSpec { name: "peaks.max", offset: offsets::PEAKS_MAX, kind: FieldKind::F64 },
    FieldSpec { name: "container.cursor", offset: offsets::CONTAINER_CURSOR, kind: FieldKind::U32 },
    FieldSpec { name: "container.capacity", offset: offsets::CONTAINER_CAPACITY, kind: FieldKind::U32 },
    FieldSpec { name: "container.last_erased", offset: offsets::CONTAINER_LAST_ERASED, kind: FieldKind::F64 },
    FieldSpec { name: "container.filled", offset: offsets::CONTAINER_FILLED, kind: FieldKind::Flag },
    FieldSpec { name: "container.data", offset: offsets::CONTAINER_DATA, kind: FieldKind::Ptr },
];

/// Defects a layout table can exhibit.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LayoutError {
    #[error("field `{name}` at {offset}+{width} extends past struct size {size}")]
    OutOfBounds { name: &'static str, offset: usize, width: usize, size: u32 },
    #[error("fields `{first}` and `{second}` overlap")]
    Overlap { first: &'static str, second: &'static str },
    #[error("field `{name}` at offset {offset} is misaligned for its width {width}")]
    Misaligned { name: &'static str, offset: usize, width: usize },
}

/// Validates [`FIELDS`] against [`SPOT_STRUCT_SIZE`].
///
/// The bridge runs this once at engine load, before any struct access. It is
/// a guard against the table itself being edited inconsistently, complementing
/// the runtime `spot_size()` check that guards against a drifted engine build.
pub fn validate() -> Result<(), LayoutError> {
    for (i, field) in FIELDS.iter().enumerate() {
        let width = field.kind.width();
        if field.offset + width > SPOT_STRUCT_SIZE as usize {
            return Err(LayoutError::OutOfBounds {
                name: field.name,
                offset: field.offset,
                width,
                size: SPOT_STRUCT_SIZE,
            });
        }
        if field.offset % width != 0 {
            return Err(LayoutError::Misaligned { name: field.name, offset: field.offset, width });
        }
        if let Some(next) = FIELDS.get(i + 1)
            && field.offset + width > next.offset
        {
            return Err(LayoutError::Overlap { first: field.name, second: next.name });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_consistent() {
        assert_eq!(validate(), Ok(()));
    }

    #[test]
    fn table_spans_the_whole_struct() {
        let last = FIELDS.last().expect("table is non-empty");
        assert_eq!(last.offset + last.kind.width(), SPOT_STRUCT_SIZE as usize);
    }

    #[test]
    fn thresholds_sit_where_the_engine_puts_them() {
        // These two offsets are read on the hot path without a native call;
        // pin them explicitly.
        assert_eq!(offsets::ANOMALY_THRESHOLD, 32);
        assert_eq!(offsets::EXCESS_THRESHOLD, 40);
    }

    #[test]
    fn counters_are_packed_after_thresholds() {
        assert_eq!(offsets::NT, 48);
        assert_eq!(offsets::N, 52);
        assert_eq!(offsets::TAIL_GAMMA, 56);
    }

    #[test]
    fn container_members_follow_the_engine_declaration_order() {
        // The circular container declares cursor first, then capacity, then
        // the last erased value, then the fill flag, then the data pointer.
        assert_eq!(offsets::CONTAINER_CURSOR, 104);
        assert_eq!(offsets::CONTAINER_CAPACITY, 108);
        assert_eq!(offsets::CONTAINER_LAST_ERASED, 112);
        assert_eq!(offsets::CONTAINER_FILLED, 120);
        assert_eq!(offsets::CONTAINER_DATA, 124);
    }

    #[test]
    fn container_fill_status_is_a_flag_not_a_count() {
        let filled = FIELDS
            .iter()
            .find(|f| f.name == "container.filled")
            .expect("field present");
        assert_eq!(filled.kind, FieldKind::Flag);
    }

    #[test]
    fn flags_are_wasm32_ints_not_bytes() {
        let discard = FIELDS
            .iter()
            .find(|f| f.name == "discard_anomalies")
            .expect("field present");
        assert_eq!(discard.kind.width(), 4);
    }
}
