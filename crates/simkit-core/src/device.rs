//! Device scope.
//!
//! A device scope names *where* an engine call runs: synchronously on the
//! caller's thread, on an owned fork-join thread pool, or on a GPU
//! executor. A per-call
//! `rayon::ThreadPoolBuilder::new().num_threads(n).build()` pattern is
//! generalized here so the pool is built once at scope construction and
//! owned for the scope's lifetime, with the scope — not the kernel call —
//! owning it.

use std::sync::Arc;

use crate::capability::CapabilityMask;
use crate::error::SimkitError;

/// A GPU executor, implemented by `simkit-gpu`. Kept as a trait here so
/// `simkit-core` stays dependency-free with respect to any concrete GPU
/// binding — real GPU driver bindings are out of scope for this core.
pub trait GpuExecutor: Send + Sync {
    /// The device index this executor is bound to.
    fn device_id(&self) -> usize;

    /// The GPU capability tier this specific device was detected at
    /// (one of `cuda`, `kepler`, `hopper`).
    fn capability(&self) -> CapabilityMask;

    /// Runs `work(i)` for every `i` in `0..count` using whatever
    /// device-parallel mechanism this executor wraps, blocking until every
    /// invocation completes ("a single kernel invocation blocks
    /// the caller until the device completes"). Kernels in `simkit-kernels`
    /// are otherwise device-agnostic; this is the one seam they cross into
    /// GPU-specific code.
    fn dispatch(&self, count: usize, work: &(dyn Fn(usize) + Sync));
}

/// Caller-chosen execution context ("Device scope").
#[derive(Clone)]
pub enum DeviceScope {
    /// No executor; the caller's own thread runs the work synchronously.
    Default,
    /// An owned fork-join thread pool of `n >= 2` workers.
    CpuCores(Arc<rayon::ThreadPool>),
    /// An owned GPU executor bound to a specific device index.
    GpuDevice {
        id: usize,
        executor: Arc<dyn GpuExecutor>,
    },
}

impl DeviceScope {
    /// The process-global default scope: single-threaded, synchronous.
    pub fn default_scope() -> Self {
        DeviceScope::Default
    }

    /// A CPU thread pool scope. `n == 0` resolves to "all cores"; `n == 1`
    /// collapses to [`DeviceScope::Default`].
    pub fn cpu_cores(n: usize) -> Result<Self, SimkitError> {
        let resolved = if n == 0 {
            std::thread::available_parallelism()
                .map(|p| p.get())
                .unwrap_or(1)
        } else {
            n
        };

        if resolved <= 1 {
            return Ok(DeviceScope::Default);
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(resolved)
            .build()
            .map_err(|e| SimkitError::Unknown(e.to_string()))?;

        log::debug!("constructed cpu_cores({resolved}) device scope");
        Ok(DeviceScope::CpuCores(Arc::new(pool)))
    }

    /// A GPU device scope. The caller (`simkit-gpu`) is responsible for
    /// only constructing an executor when the `cuda` capability is present.
    pub fn gpu_device(id: usize, executor: Arc<dyn GpuExecutor>) -> Self {
        DeviceScope::GpuDevice { id, executor }
    }

    pub fn is_gpu(&self) -> bool {
        matches!(self, DeviceScope::GpuDevice { .. })
    }

    pub fn is_cpu_pool(&self) -> bool {
        matches!(self, DeviceScope::CpuCores(_))
    }

    pub fn cpu_pool(&self) -> Option<&rayon::ThreadPool> {
        match self {
            DeviceScope::CpuCores(pool) => Some(pool),
            _ => None,
        }
    }

    pub fn gpu_executor(&self) -> Option<&Arc<dyn GpuExecutor>> {
        match self {
            DeviceScope::GpuDevice { executor, .. } => Some(executor),
            _ => None,
        }
    }
}

/// Whether a scope/capability pairing is allowed, per the compatibility
/// matrix: any engine may run on the default scope, a CPU thread pool
/// never accepts a GPU-capable engine, and a GPU scope only accepts one.
pub fn scope_compatible(engine_capability: CapabilityMask, scope: &DeviceScope) -> bool {
    let engine_is_gpu = engine_capability.is_gpu();
    match scope {
        DeviceScope::Default => true,
        DeviceScope::CpuCores(_) => !engine_is_gpu,
        DeviceScope::GpuDevice { .. } => engine_is_gpu,
    }
}
