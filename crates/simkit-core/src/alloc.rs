//! Allocator interface.
//!
//! Pluggable allocation is expressed as a three-field record (two
//! function pointers plus captured state), not by inheritance. The idiomatic-Rust
//! equivalent of a C function pointer plus an opaque `handle` argument is a
//! pair of boxed closures that already capture whatever state the C
//! version would thread through `handle` — so this record carries two
//! `Arc<dyn Fn>` fields and no separate handle field.

use std::alloc::{alloc as std_alloc, dealloc as std_dealloc, Layout};
use std::ptr::NonNull;
use std::sync::{Arc, OnceLock};

use allocator_api2::alloc::{AllocError, Allocator as Api2AllocatorTrait};

/// Cache-line alignment used for the default allocator — a reasonable
/// choice for buffers later read by vectorized kernels.
const DEFAULT_ALIGN: usize = 64;

/// Pluggable allocate/free pair ("Allocator").
#[derive(Clone)]
pub struct Allocator {
    allocate_fn: Arc<dyn Fn(usize) -> Option<NonNull<u8>> + Send + Sync>,
    free_fn: Arc<dyn Fn(NonNull<u8>, usize) + Send + Sync>,
}

impl Allocator {
    pub fn new(
        allocate: impl Fn(usize) -> Option<NonNull<u8>> + Send + Sync + 'static,
        free: impl Fn(NonNull<u8>, usize) + Send + Sync + 'static,
    ) -> Self {
        Self {
            allocate_fn: Arc::new(allocate),
            free_fn: Arc::new(free),
        }
    }

    /// Returns `None` on allocation failure, mirroring a C-style
    /// `allocate(...) -> pointer | null` contract.
    pub fn allocate(&self, size: usize) -> Option<NonNull<u8>> {
        if size == 0 {
            return NonNull::new(DEFAULT_ALIGN as *mut u8);
        }
        (self.allocate_fn)(size)
    }

    pub fn free(&self, ptr: NonNull<u8>, size: usize) {
        if size == 0 {
            return;
        }
        (self.free_fn)(ptr, size)
    }
}

fn host_heap_allocate(size: usize) -> Option<NonNull<u8>> {
    let layout = Layout::from_size_align(size, DEFAULT_ALIGN).ok()?;
    let ptr = unsafe { std_alloc(layout) };
    NonNull::new(ptr)
}

fn host_heap_free(ptr: NonNull<u8>, size: usize) {
    if let Ok(layout) = Layout::from_size_align(size, DEFAULT_ALIGN) {
        unsafe { std_dealloc(ptr.as_ptr(), layout) };
    }
}

static DEFAULT_ALLOCATOR: OnceLock<Allocator> = OnceLock::new();

/// The default (host heap) allocator instance, shared process-wide as one
/// of the two named allocator instances.
pub fn default_allocator() -> Allocator {
    DEFAULT_ALLOCATOR
        .get_or_init(|| Allocator::new(host_heap_allocate, host_heap_free))
        .clone()
}

/// The unified (device-reachable) allocator instance.
///
/// This crate has no GPU backend compiled in, so it delegates
/// to [`default_allocator`]. `simkit-gpu`'s `gpu` feature supplies its own
/// unified allocator that engines select instead when they require
/// unified memory ("Unified-memory opt-in").
pub fn unified_allocator() -> Allocator {
    default_allocator()
}

/// Adapts an [`Allocator`] to `allocator_api2::alloc::Allocator`, the same
/// trait the StringZilla Rust bindings' `UnifiedAlloc` implements, so
/// kernel scratch buffers can be grown as an [`AllocVec`] instead of going
/// straight to the global heap.
#[derive(Clone)]
pub struct Api2Alloc(Allocator);

impl Api2Alloc {
    pub fn new(inner: Allocator) -> Self {
        Self(inner)
    }
}

unsafe impl Api2AllocatorTrait for Api2Alloc {
    fn allocate(&self, layout: Layout) -> Result<NonNull<[u8]>, AllocError> {
        let size = layout.size();
        let ptr = self.0.allocate(size).ok_or(AllocError)?;
        Ok(NonNull::slice_from_raw_parts(ptr, size))
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        self.0.free(ptr, layout.size());
    }
}

/// A growable buffer backed by a kernel-supplied [`Allocator`] rather than
/// the global heap, used for per-call DP scratch rows ("Allocations during
/// the kernel use the supplied allocator").
pub type AllocVec<T> = allocator_api2::vec::Vec<T, Api2Alloc>;

/// Builds a length-`len` scratch row of `fill`, allocated through
/// `allocator` end to end.
pub fn scratch_row(allocator: &Allocator, len: usize, fill: i64) -> AllocVec<i64> {
    let mut row = allocator_api2::vec::Vec::with_capacity_in(len, Api2Alloc::new(allocator.clone()));
    row.resize(len, fill);
    row
}
