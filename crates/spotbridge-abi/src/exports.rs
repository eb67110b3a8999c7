//! Names of the engine exports the bridge consumes.
//!
//! The engine's ABI is flat: every parameter and return value is a machine
//! word (pointer/integer) or an IEEE-754 double, never a structured value.
//! Strings travel through caller-provided `(ptr, len)` buffers and are
//! NUL-terminated by the engine.

/// The shared linear memory export.
pub const MEMORY: &str = "memory";

/// One-time engine startup routine. Installs the engine's internal
/// allocator callbacks; must run before any other call.
pub const STARTUP: &str = "libspot_init";

/// `spot_size() -> i32`: size in bytes of the detector struct layout.
pub const SPOT_SIZE: &str = "spot_size";

/// `spot_init(ptr, q, low, discard_anomalies, level, max_excess) -> i32`.
pub const SPOT_INIT: &str = "spot_init";

/// `spot_fit(ptr, array_ptr, count) -> i32`.
pub const SPOT_FIT: &str = "spot_fit";

/// `spot_step(ptr, x) -> i32`.
pub const SPOT_STEP: &str = "spot_step";

/// `spot_quantile(ptr, q) -> f64`.
pub const SPOT_QUANTILE: &str = "spot_quantile";

/// `spot_probability(ptr, z) -> f64`.
pub const SPOT_PROBABILITY: &str = "spot_probability";

/// `spot_free(ptr)`: releases engine-internal state (the peaks backing
/// array), not the struct allocation itself.
pub const SPOT_FREE: &str = "spot_free";

/// `libspot_error(code, out_ptr, out_size)`: writes a NUL-terminated
/// message, truncated to `out_size`. Unregistered codes write nothing.
pub const ERROR_MESSAGE: &str = "libspot_error";

/// `libspot_version(out_ptr, out_size)`: writes a NUL-terminated version
/// string.
pub const VERSION: &str = "libspot_version";

/// `malloc(size) -> i32`: the engine's own allocator. A non-positive
/// pointer signals exhaustion.
pub const MALLOC: &str = "malloc";

/// `free(ptr)`: returns a region to the engine allocator.
pub const FREE: &str = "free";

/// Sufficient capacity for any message in the engine's error table.
pub const ERROR_BUF_SIZE: usize = 256;

/// Sufficient capacity for the engine version string (e.g. `"2.0b"`).
pub const VERSION_BUF_SIZE: usize = 24;
