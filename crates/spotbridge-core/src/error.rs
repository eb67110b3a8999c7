//! Bridge failure taxonomy.
//!
//! Two families of failure cross the boundary and they are kept apart:
//! allocator exhaustion is signalled by a non-positive pointer and surfaced
//! by the allocator itself; every other native failure is a negative return
//! code that the facade pairs with the engine's own translated message. The
//! bridge never invents message text for an engine code.

use spotbridge_abi::LayoutError;
use thiserror::Error;

/// Any failure the bridge can produce.
///
/// Variants carrying `code` hold the raw (negative) native return value and
/// `message` holds the text from the engine's error table, which is empty
/// when the engine has no message registered for that code.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The engine binary image could not be instantiated, or is missing a
    /// required export.
    #[error("engine instantiation failed: {0}")]
    Load(wasmtime::Error),

    /// `spot_size()` disagrees with the compiled-in layout. Fatal: no handle
    /// may be constructed against an engine with an unknown layout.
    #[error("engine reports struct size {reported}, bridge expects {expected}")]
    AbiMismatch { reported: u32, expected: u32 },

    /// The compiled-in layout table is internally inconsistent.
    #[error("layout table invalid: {0}")]
    Layout(#[from] LayoutError),

    /// The engine allocator returned a non-positive pointer.
    #[error("engine allocator could not provide {size} bytes")]
    Allocation { size: usize },

    /// `spot_init` rejected the construction parameters.
    #[error("detector initialization failed (code {code}): {message}")]
    Init { code: i32, message: String },

    /// Batch calibration failed, typically because a threshold came out
    /// non-finite on degenerate input.
    #[error("fit failed (code {code}): {message}")]
    Fit { code: i32, message: String },

    /// The streaming update reported an internal invariant violation, or
    /// returned a classification outside the documented set.
    #[error("step failed (code {code}): {message}")]
    Step { code: i32, message: String },

    /// A native call trapped inside the engine.
    #[error("native call trapped: {0}")]
    Call(wasmtime::Error),

    /// A struct read fell outside the mapped linear memory.
    #[error("out-of-bounds read of `{field}` at {addr:#x}")]
    OutOfBounds { field: &'static str, addr: usize },

    /// The detector handle was already disposed.
    #[error("detector used after dispose")]
    Disposed,

    /// The engine image could not be read from disk.
    #[error("failed to read engine image: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_and_message_both_appear_in_display() {
        let err = BridgeError::Init { code: -1002, message: "q out of bounds".into() };
        let text = err.to_string();
        assert!(text.contains("-1002"));
        assert!(text.contains("q out of bounds"));
    }

    #[test]
    fn abi_mismatch_reports_both_sizes() {
        let err = BridgeError::AbiMismatch { reported: 64, expected: 128 };
        let text = err.to_string();
        assert!(text.contains("64") && text.contains("128"));
    }
}
