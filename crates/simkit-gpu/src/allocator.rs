//! Unified-memory allocator ("Unified-memory opt-in").
//!
//! Without a real device binding compiled in, "unified" memory is ordinary
//! host memory: any real driver backend that replaces this crate's
//! executor would also replace this allocator with one backed by its
//! device's shared-memory API (e.g. Metal's `MTLResourceStorageModeShared`,
//! allocated via a `create_buffer`/`StorageModeShared`-style call), while
//! keeping the same `simkit_core::Allocator` shape.

use simkit_core::Allocator;

/// The unified allocator instance GPU-capable engines should request,
/// one of two named allocator instances. Delegates to the host heap
/// allocator here; a real device backend would override both closures
/// to allocate from device-visible shared memory instead.
pub fn unified_allocator() -> Allocator {
    simkit_core::unified_allocator()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unified_allocator_roundtrips() {
        let alloc = unified_allocator();
        let ptr = alloc.allocate(128).expect("allocation should succeed");
        unsafe {
            std::ptr::write_bytes(ptr.as_ptr(), 0x11, 128);
            assert_eq!(*ptr.as_ptr(), 0x11);
        }
        alloc.free(ptr, 128);
    }
}
