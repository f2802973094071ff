//! Rayon-backed [`simkit_core::GpuExecutor`] stand-in.
//!
//! Shaped after a typical `dispatch_kernel` call (device handle plus
//! command queue, one blocking call per kernel launch), but fans work out
//! across a CPU thread pool instead of a command queue, since this crate
//! carries no driver binding.

use std::sync::Arc;

use rayon::prelude::*;
use simkit_core::{CapabilityMask, GpuExecutor};

/// A "device" backed by an owned rayon thread pool. Satisfies every
/// contractual guarantee a real driver executor must (thread-safe
/// concurrent dispatch, blocking completion per call) without binding to
/// an actual GPU.
pub struct RayonGpuExecutor {
    id: usize,
    capability: CapabilityMask,
    pool: Arc<rayon::ThreadPool>,
}

impl RayonGpuExecutor {
    pub fn new(id: usize, capability: CapabilityMask) -> Self {
        let workers = std::thread::available_parallelism()
            .map(|p| p.get())
            .unwrap_or(1);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .build()
            .expect("thread pool construction should not fail");
        log::debug!("constructed rayon-backed gpu executor for device {id} ({capability})");
        Self {
            id,
            capability,
            pool: Arc::new(pool),
        }
    }
}

impl GpuExecutor for RayonGpuExecutor {
    fn device_id(&self) -> usize {
        self.id
    }

    fn capability(&self) -> CapabilityMask {
        self.capability
    }

    fn dispatch(&self, count: usize, work: &(dyn Fn(usize) + Sync)) {
        self.pool.install(|| (0..count).into_par_iter().for_each(work));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn dispatch_runs_every_index_exactly_once() {
        let executor = RayonGpuExecutor::new(0, CapabilityMask::CUDA);
        let hits = (0..16).map(|_| AtomicUsize::new(0)).collect::<Vec<_>>();
        executor.dispatch(16, &|i| {
            hits[i].fetch_add(1, Ordering::SeqCst);
        });
        assert!(hits.iter().all(|h| h.load(Ordering::SeqCst) == 1));
    }

    #[test]
    fn reports_constructed_device_id_and_capability() {
        let executor = RayonGpuExecutor::new(3, CapabilityMask::KEPLER);
        assert_eq!(executor.device_id(), 3);
        assert_eq!(executor.capability(), CapabilityMask::KEPLER);
    }
}
