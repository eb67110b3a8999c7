//! Translation of native error codes and retrieval of the engine version.
//!
//! Both exports carry text across a boundary that only understands numbers
//! and pointers: the bridge passes a fixed-capacity output buffer by pointer
//! and length, the engine writes a NUL-terminated string into it, and the
//! bridge trims at the first terminator. The buffers are engine-heap
//! allocations and are released unconditionally, including when the native
//! call traps.

use spotbridge_abi::exports::{ERROR_BUF_SIZE, VERSION_BUF_SIZE};

use crate::error::BridgeError;
use crate::runtime::EngineRuntime;

impl EngineRuntime {
    /// Looks up the engine's message for a (positive) error code.
    ///
    /// An unregistered code leaves the zero-filled buffer untouched and
    /// yields the empty string, which is a normal outcome, not a failure.
    /// The message table itself lives in the engine; the bridge neither
    /// duplicates it nor assumes where it ends.
    pub(crate) fn error_message(&mut self, code: i32) -> Result<String, BridgeError> {
        let buf = self.alloc(ERROR_BUF_SIZE)?;
        self.zero_bytes(buf, ERROR_BUF_SIZE)?;
        let called = self
            .exports
            .error_message
            .call(&mut self.store, (code, buf, ERROR_BUF_SIZE as i32))
            .map_err(BridgeError::Call);
        let message = match &called {
            Ok(()) => self.read_cstring(buf, ERROR_BUF_SIZE),
            Err(_) => Ok(String::new()),
        };
        self.release(buf)?;
        called?;
        message
    }

    /// Reads the engine's version string.
    pub(crate) fn version_string(&mut self) -> Result<String, BridgeError> {
        let buf = self.alloc(VERSION_BUF_SIZE)?;
        self.zero_bytes(buf, VERSION_BUF_SIZE)?;
        let called = self
            .exports
            .version
            .call(&mut self.store, (buf, VERSION_BUF_SIZE as i32))
            .map_err(BridgeError::Call);
        let version = match &called {
            Ok(()) => self.read_cstring(buf, VERSION_BUF_SIZE),
            Err(_) => Ok(String::new()),
        };
        self.release(buf)?;
        called?;
        version
    }

    /// Best-effort message lookup for embedding into a structured failure:
    /// translation problems collapse to an empty string rather than masking
    /// the original error code.
    pub(crate) fn message_or_empty(&mut self, code: i32) -> String {
        self.error_message(code).unwrap_or_default()
    }
}
