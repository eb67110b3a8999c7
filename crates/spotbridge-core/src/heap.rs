//! Allocation and growth management for the shared linear memory.
//!
//! The engine brings its own `malloc`/`free`, but its allocator does not know
//! how much memory the host has actually mapped: a returned region can extend
//! past the current memory length. The bridge detects that and grows the
//! memory by the smallest whole number of pages covering the shortfall.
//! Growth never moves already-allocated regions, but it does invalidate every
//! raw byte view taken before it, which is why no view is ever held across an
//! allocation here or anywhere else in the crate.

use spotbridge_abi::WASM_PAGE_SIZE;

use crate::error::BridgeError;
use crate::runtime::EngineRuntime;

impl EngineRuntime {
    /// Requests `size` bytes from the engine allocator, growing the shared
    /// memory if the returned region is not fully mapped yet.
    ///
    /// A non-positive pointer from the engine is allocator exhaustion and is
    /// surfaced immediately as [`BridgeError::Allocation`]; it is never
    /// forwarded into another native call.
    pub(crate) fn alloc(&mut self, size: usize) -> Result<i32, BridgeError> {
        let requested = i32::try_from(size).map_err(|_| BridgeError::Allocation { size })?;
        let ptr = self
            .exports
            .malloc
            .call(&mut self.store, requested)
            .map_err(BridgeError::Call)?;
        if ptr <= 0 {
            return Err(BridgeError::Allocation { size });
        }

        let end = ptr as u64 + size as u64;
        let mapped = self.memory.data_size(&self.store) as u64;
        if end > mapped {
            let pages = (end - mapped).div_ceil(WASM_PAGE_SIZE);
            self.memory
                .grow(&mut self.store, pages)
                .map_err(BridgeError::Call)?;
        }
        Ok(ptr)
    }

    /// Returns a region to the engine allocator.
    ///
    /// The engine does not detect double release; callers guard against it
    /// (see the facade's dispose policy).
    pub(crate) fn release(&mut self, ptr: i32) -> Result<(), BridgeError> {
        self.exports
            .free
            .call(&mut self.store, ptr)
            .map_err(BridgeError::Call)
    }

    /// Live view over the current state of memory. Taken fresh per access;
    /// stale after any subsequent allocation.
    pub(crate) fn view(&self) -> &[u8] {
        self.memory.data(&self.store)
    }

    /// Mutable live view, same staleness rule as [`Self::view`].
    pub(crate) fn view_mut(&mut self) -> &mut [u8] {
        self.memory.data_mut(&mut self.store)
    }

    /// Copies `bytes` into memory at `ptr` through a fresh view.
    pub(crate) fn write_bytes(&mut self, ptr: i32, bytes: &[u8]) -> Result<(), BridgeError> {
        let start = ptr as usize;
        let region = self
            .view_mut()
            .get_mut(start..start + bytes.len())
            .ok_or(BridgeError::OutOfBounds { field: "raw write", addr: start })?;
        region.copy_from_slice(bytes);
        Ok(())
    }

    /// Zero-fills `len` bytes at `ptr` through a fresh view.
    pub(crate) fn zero_bytes(&mut self, ptr: i32, len: usize) -> Result<(), BridgeError> {
        let start = ptr as usize;
        let region = self
            .view_mut()
            .get_mut(start..start + len)
            .ok_or(BridgeError::OutOfBounds { field: "zero fill", addr: start })?;
        region.fill(0);
        Ok(())
    }

    /// Reads `len` bytes at `ptr` and returns them up to the first NUL,
    /// lossily decoded as UTF-8. Used for the string-bearing exports, which
    /// write NUL-terminated text into caller-provided buffers.
    pub(crate) fn read_cstring(&self, ptr: i32, len: usize) -> Result<String, BridgeError> {
        let start = ptr as usize;
        let region = self
            .view()
            .get(start..start + len)
            .ok_or(BridgeError::OutOfBounds { field: "string read", addr: start })?;
        let text = match region.iter().position(|&b| b == 0) {
            Some(nul) => &region[..nul],
            None => region,
        };
        Ok(String::from_utf8_lossy(text).into_owned())
    }
}
