//! Capability detection, dispatch table, and engine scaffolding.
//!
//! This is the dependency-free foundation crate: everything here is pure
//! computation over bytes plus process-wide memoized detection. Nothing in
//! this crate knows how to reach a GPU driver — `simkit-gpu` supplies a
//! concrete [`device::GpuExecutor`], and `simkit-kernels` builds engines on
//! top of the types exported here.

pub mod alloc;
pub mod capability;
pub mod device;
pub mod dispatch;
pub mod error;
pub mod sequence;

pub use alloc::{default_allocator, scratch_row, unified_allocator, AllocVec, Allocator, Api2Alloc};
pub use capability::{detect_capabilities, CapabilityMask};
pub use device::{scope_compatible, DeviceScope, GpuExecutor};
pub use dispatch::{dispatch_table, ByteSet, DispatchTable, StreamingHash};
pub use error::{SimkitError, StatusCode};
pub use sequence::{CallbackSequence, PackedTape, SequenceView, SliceSequence, Tape32, Tape64};
