//! The detector facade: one handle, one struct allocation, one lifecycle.
//!
//! Construction is two-phase (allocate, then native init); if init rejects
//! the parameters the allocation is released before the error surfaces, so a
//! failed construction never leaks. Once `Ready`, the handle drives the
//! fit / step / quantile / probability operations and reads the decision
//! thresholds straight from struct bytes without a native call.
//!
//! Disposal is explicit or happens on drop; a disposed handle rejects every
//! further operation with [`BridgeError::Disposed`], and a second `dispose`
//! is a guarded no-op rather than a double release.

use spotbridge_abi::Outcome;
use spotbridge_abi::layout::offsets;

use crate::error::BridgeError;
use crate::runtime::SpotEngine;
use crate::state::StateSnapshot;

/// Construction parameters for a detector.
///
/// Defaults mirror the reference host: `q = 5e-4`, upper tail, anomalies
/// discarded from model updates, `level = 0.98`, at most 500 retained
/// excesses.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpotConfig {
    /// Target exceedance probability, in the open interval (0, 1 - level).
    /// Observations rarer than this are flagged as anomalies.
    pub q: f64,
    /// Analyze the lower tail instead of the upper one.
    pub low_tail: bool,
    /// Exclude flagged anomalies from ongoing model updates.
    pub discard_anomalies: bool,
    /// High quantile delimiting the tail used to calibrate the model.
    pub level: f64,
    /// Capacity of the bounded peaks container. The engine rejects
    /// non-positive values.
    pub max_excess: i32,
}

impl Default for SpotConfig {
    fn default() -> Self {
        Self { q: 5e-4, low_tail: false, discard_anomalies: true, level: 0.98, max_excess: 500 }
    }
}

/// A ready detector bound to one struct-sized allocation inside the engine.
pub struct Spot {
    engine: SpotEngine,
    ptr: i32,
    disposed: bool,
}

impl std::fmt::Debug for Spot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Spot")
            .field("ptr", &self.ptr)
            .field("disposed", &self.disposed)
            .finish_non_exhaustive()
    }
}

impl Spot {
    /// Allocates and initializes a detector on the given engine.
    ///
    /// Fails with [`BridgeError::Init`] when the engine rejects the
    /// parameters (`q` or `level` out of bounds, non-positive `max_excess`),
    /// carrying the engine's own message for the code.
    pub fn new(engine: &SpotEngine, config: &SpotConfig) -> Result<Self, BridgeError> {
        let mut guard = engine.inner.lock();
        let rt = &mut *guard;
        let size = rt.struct_size as usize;
        let ptr = rt.alloc(size)?;
        // The struct must not read as leftover heap bytes if init bails
        // partway through.
        rt.zero_bytes(ptr, size)?;

        let code = rt
            .exports
            .spot_init
            .call(
                &mut rt.store,
                (
                    ptr,
                    config.q,
                    i32::from(config.low_tail),
                    i32::from(config.discard_anomalies),
                    config.level,
                    config.max_excess,
                ),
            )
            .map_err(BridgeError::Call);
        // On any construction failure the struct allocation is returned
        // best-effort; the init error itself is what surfaces.
        let code = match code {
            Ok(code) => code,
            Err(err) => {
                let _ = rt.release(ptr);
                return Err(err);
            }
        };
        if code < 0 {
            let message = rt.message_or_empty(-code);
            let _ = rt.release(ptr);
            return Err(BridgeError::Init { code, message });
        }

        drop(guard);
        Ok(Self { engine: engine.clone(), ptr, disposed: false })
    }

    fn ready(&self) -> Result<(), BridgeError> {
        if self.disposed { Err(BridgeError::Disposed) } else { Ok(()) }
    }

    /// Recalibrates the model from a batch of historical observations.
    ///
    /// The batch is marshaled into a temporary engine-heap region which is
    /// released unconditionally, on success and on failure alike.
    pub fn fit(&mut self, data: &[f64]) -> Result<(), BridgeError> {
        self.ready()?;
        let mut guard = self.engine.inner.lock();
        let rt = &mut *guard;

        let byte_len = data.len() * 8;
        let array = rt.alloc(byte_len)?;
        let copied = {
            // Fresh view: the alloc above may have grown the memory.
            let start = array as usize;
            match rt.view_mut().get_mut(start..start + byte_len) {
                Some(region) => {
                    for (slot, x) in region.chunks_exact_mut(8).zip(data) {
                        slot.copy_from_slice(&x.to_le_bytes());
                    }
                    Ok(())
                }
                None => Err(BridgeError::OutOfBounds { field: "fit batch", addr: start }),
            }
        };
        if let Err(err) = copied {
            let _ = rt.release(array);
            return Err(err);
        }

        let called = rt
            .exports
            .spot_fit
            .call(&mut rt.store, (self.ptr, array, data.len() as i32))
            .map_err(BridgeError::Call);
        // The native outcome outranks a failure of the buffer release.
        let released = rt.release(array);
        let code = called?;
        if code < 0 {
            let message = rt.message_or_empty(-code);
            return Err(BridgeError::Fit { code, message });
        }
        released?;
        Ok(())
    }

    /// Feeds one observation and classifies it.
    ///
    /// Updates `n`, possibly `Nt` and the thresholds, as a side effect.
    pub fn step(&mut self, x: f64) -> Result<Outcome, BridgeError> {
        self.ready()?;
        let mut guard = self.engine.inner.lock();
        let rt = &mut *guard;
        let code = rt
            .exports
            .spot_step
            .call(&mut rt.store, (self.ptr, x))
            .map_err(BridgeError::Call)?;
        if code < 0 {
            let message = rt.message_or_empty(-code);
            return Err(BridgeError::Step { code, message });
        }
        Outcome::from_code(code).ok_or(BridgeError::Step { code, message: String::new() })
    }

    /// Value `z` such that `P(X > z) = q` under the current tail model.
    ///
    /// For `q` outside the tail's valid domain the engine answers with a
    /// non-finite sentinel, which is passed through unmodified.
    pub fn quantile(&self, q: f64) -> Result<f64, BridgeError> {
        self.ready()?;
        let mut guard = self.engine.inner.lock();
        let rt = &mut *guard;
        rt.exports
            .spot_quantile
            .call(&mut rt.store, (self.ptr, q))
            .map_err(BridgeError::Call)
    }

    /// Probability `p` such that `P(X > z) = p` under the current tail
    /// model. Same sentinel pass-through as [`Self::quantile`].
    pub fn probability(&self, z: f64) -> Result<f64, BridgeError> {
        self.ready()?;
        let mut guard = self.engine.inner.lock();
        let rt = &mut *guard;
        rt.exports
            .spot_probability
            .call(&mut rt.store, (self.ptr, z))
            .map_err(BridgeError::Call)
    }

    /// Current anomaly decision boundary, read straight from struct bytes.
    /// Non-finite before the first successful fit.
    pub fn anomaly_threshold(&self) -> Result<f64, BridgeError> {
        self.ready()?;
        let rt = self.engine.inner.lock();
        rt.read_f64_field(self.ptr, offsets::ANOMALY_THRESHOLD)
    }

    /// Current tail boundary, read straight from struct bytes. Non-finite
    /// before the first successful fit.
    pub fn excess_threshold(&self) -> Result<f64, BridgeError> {
        self.ready()?;
        let rt = self.engine.inner.lock();
        rt.read_f64_field(self.ptr, offsets::EXCESS_THRESHOLD)
    }

    /// Decodes the full detector state into a typed snapshot.
    pub fn snapshot(&self) -> Result<StateSnapshot, BridgeError> {
        self.ready()?;
        let rt = self.engine.inner.lock();
        rt.snapshot(self.ptr)
    }

    /// Releases the engine-internal state and the struct allocation.
    ///
    /// Idempotent at this boundary: the first call releases, later calls are
    /// no-ops. The handle is inert afterwards; every other operation fails
    /// with [`BridgeError::Disposed`].
    pub fn dispose(&mut self) -> Result<(), BridgeError> {
        if self.disposed {
            return Ok(());
        }
        // Mark first: even a trapped teardown must not leave the pointer
        // reachable for a second release.
        self.disposed = true;
        let mut guard = self.engine.inner.lock();
        let rt = &mut *guard;
        let freed = rt
            .exports
            .spot_free
            .call(&mut rt.store, self.ptr)
            .map_err(BridgeError::Call);
        let released = rt.release(self.ptr);
        freed.and(released)
    }
}

impl Drop for Spot {
    fn drop(&mut self) {
        // Deterministic release on scope exit; errors have nowhere to go.
        let _ = self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_mirror_the_reference_host() {
        let config = SpotConfig::default();
        assert_eq!(config.q, 5e-4);
        assert_eq!(config.level, 0.98);
        assert_eq!(config.max_excess, 500);
        assert!(!config.low_tail);
        assert!(config.discard_anomalies);
    }
}
