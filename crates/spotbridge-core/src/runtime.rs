//! Engine instantiation and the typed export table.
//!
//! One [`SpotEngine`] owns one instantiated module with one linear memory.
//! The original host ran single-threaded against a single module instance;
//! here every allocator and struct access serializes through one
//! `parking_lot::Mutex` so the bridge stays sound on a multi-threaded host.
//! Detectors that must not contend can each load their own engine, since
//! instances own disjoint memories.

use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use wasmtime::{Engine, Instance, Memory, Module, Store, TypedFunc};

use spotbridge_abi::exports::{
    ERROR_MESSAGE, FREE, MALLOC, MEMORY, SPOT_FIT, SPOT_FREE, SPOT_INIT, SPOT_PROBABILITY,
    SPOT_QUANTILE, SPOT_SIZE, SPOT_STEP, STARTUP, VERSION,
};
use spotbridge_abi::{SPOT_STRUCT_SIZE, layout};

use crate::error::BridgeError;

/// Typed handles to every engine export the bridge consumes.
///
/// Resolution fails at load time if an export is missing or its signature
/// drifted, so no call site ever deals with an untyped function.
pub(crate) struct EngineExports {
    pub(crate) spot_size: TypedFunc<(), i32>,
    pub(crate) spot_init: TypedFunc<(i32, f64, i32, i32, f64, i32), i32>,
    pub(crate) spot_fit: TypedFunc<(i32, i32, i32), i32>,
    pub(crate) spot_step: TypedFunc<(i32, f64), i32>,
    pub(crate) spot_quantile: TypedFunc<(i32, f64), f64>,
    pub(crate) spot_probability: TypedFunc<(i32, f64), f64>,
    pub(crate) spot_free: TypedFunc<i32, ()>,
    pub(crate) error_message: TypedFunc<(i32, i32, i32), ()>,
    pub(crate) version: TypedFunc<(i32, i32), ()>,
    pub(crate) malloc: TypedFunc<i32, i32>,
    pub(crate) free: TypedFunc<i32, ()>,
}

impl EngineExports {
    fn resolve(store: &mut Store<()>, instance: &Instance) -> Result<Self, BridgeError> {
        Ok(Self {
            spot_size: instance
                .get_typed_func(&mut *store, SPOT_SIZE)
                .map_err(BridgeError::Load)?,
            spot_init: instance
                .get_typed_func(&mut *store, SPOT_INIT)
                .map_err(BridgeError::Load)?,
            spot_fit: instance
                .get_typed_func(&mut *store, SPOT_FIT)
                .map_err(BridgeError::Load)?,
            spot_step: instance
                .get_typed_func(&mut *store, SPOT_STEP)
                .map_err(BridgeError::Load)?,
            spot_quantile: instance
                .get_typed_func(&mut *store, SPOT_QUANTILE)
                .map_err(BridgeError::Load)?,
            spot_probability: instance
                .get_typed_func(&mut *store, SPOT_PROBABILITY)
                .map_err(BridgeError::Load)?,
            spot_free: instance
                .get_typed_func(&mut *store, SPOT_FREE)
                .map_err(BridgeError::Load)?,
            error_message: instance
                .get_typed_func(&mut *store, ERROR_MESSAGE)
                .map_err(BridgeError::Load)?,
            version: instance
                .get_typed_func(&mut *store, VERSION)
                .map_err(BridgeError::Load)?,
            malloc: instance
                .get_typed_func(&mut *store, MALLOC)
                .map_err(BridgeError::Load)?,
            free: instance
                .get_typed_func(&mut *store, FREE)
                .map_err(BridgeError::Load)?,
        })
    }
}

/// The instantiated engine: store, memory, and typed exports.
///
/// Not public API; everything reaches it through [`SpotEngine`], which holds
/// it behind a mutex. Raw byte views over the memory are re-acquired from
/// `self.memory` on every access and never cached across an allocation.
pub(crate) struct EngineRuntime {
    pub(crate) store: Store<()>,
    pub(crate) memory: Memory,
    pub(crate) exports: EngineExports,
    pub(crate) struct_size: u32,
}

impl EngineRuntime {
    pub(crate) fn instantiate(image: &[u8]) -> Result<Self, BridgeError> {
        layout::validate()?;

        let engine = Engine::default();
        let module = Module::new(&engine, image).map_err(BridgeError::Load)?;
        let mut store = Store::new(&engine, ());
        let instance = Instance::new(&mut store, &module, &[]).map_err(BridgeError::Load)?;

        let memory = instance.get_memory(&mut store, MEMORY).ok_or_else(|| {
            BridgeError::Load(wasmtime::Error::msg("engine does not export `memory`"))
        })?;
        let exports = EngineExports::resolve(&mut store, &instance)?;

        // One-time engine startup: installs the engine-internal allocator
        // hooks. Runs exactly once per instance, before any other call.
        let startup: TypedFunc<(), ()> = instance
            .get_typed_func(&mut store, STARTUP)
            .map_err(BridgeError::Load)?;
        startup.call(&mut store, ()).map_err(BridgeError::Call)?;

        // The layout table is only trusted if the engine build agrees on the
        // total size. Anything else would silently misread memory.
        let reported = exports.spot_size.call(&mut store, ()).map_err(BridgeError::Call)?;
        if reported as u32 != SPOT_STRUCT_SIZE {
            return Err(BridgeError::AbiMismatch {
                reported: reported as u32,
                expected: SPOT_STRUCT_SIZE,
            });
        }

        Ok(Self { store, memory, exports, struct_size: reported as u32 })
    }
}

/// Shared, thread-safe handle to one loaded engine.
///
/// Cloning is cheap; clones refer to the same instance and linear memory.
#[derive(Clone)]
pub struct SpotEngine {
    pub(crate) inner: Arc<Mutex<EngineRuntime>>,
}

impl std::fmt::Debug for SpotEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpotEngine").finish_non_exhaustive()
    }
}

impl SpotEngine {
    /// Instantiates the engine from its binary image and runs its one-time
    /// startup routine.
    ///
    /// Fails with [`BridgeError::Load`] on a malformed image or missing
    /// export, and with [`BridgeError::AbiMismatch`] if the engine's reported
    /// struct size disagrees with the compiled-in layout.
    pub fn load(image: impl AsRef<[u8]>) -> Result<Self, BridgeError> {
        let runtime = EngineRuntime::instantiate(image.as_ref())?;
        Ok(Self { inner: Arc::new(Mutex::new(runtime)) })
    }

    /// Reads the engine image from disk and loads it.
    pub fn load_file(path: impl AsRef<Path>) -> Result<Self, BridgeError> {
        let image = std::fs::read(path)?;
        Self::load(image)
    }

    /// Struct size the engine reported at load (always equals
    /// [`SPOT_STRUCT_SIZE`] once loading succeeded).
    #[must_use]
    pub fn struct_size(&self) -> u32 {
        self.inner.lock().struct_size
    }

    /// Version string baked into the engine, e.g. `"2.0b"`.
    pub fn version(&self) -> Result<String, BridgeError> {
        self.inner.lock().version_string()
    }

    /// Message registered by the engine for a (positive) error code.
    ///
    /// Codes without a registered message yield `Ok("")`; the boundary of
    /// the registered range is engine-owned and never assumed here.
    pub fn error_message(&self, code: i32) -> Result<String, BridgeError> {
        self.inner.lock().error_message(code)
    }
}
