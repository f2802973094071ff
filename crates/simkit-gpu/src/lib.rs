//! Unified-memory helpers and a GPU device-scope stand-in for simkit.
//!
//! Real GPU driver bindings are explicitly out of scope here: the
//! core specifies what a GPU backend must *guarantee* (thread-safe
//! dispatch, blocking completion, unified-memory inputs), not how it talks
//! to a driver. This crate supplies that guarantee with a real,
//! rayon-backed executor rather than a driver binding — any concrete
//! driver integration (Metal, CUDA) would implement the same
//! `simkit_core::GpuExecutor` trait and drop in unchanged.

pub mod allocator;
pub mod sequence;

#[cfg(feature = "gpu")]
pub mod executor;
#[cfg(feature = "gpu")]
pub mod probe;

pub use allocator::unified_allocator;
pub use sequence::Unified;

#[cfg(feature = "gpu")]
pub use executor::RayonGpuExecutor;
#[cfg(feature = "gpu")]
pub use probe::{detect_gpu_capability, gpu_device};
