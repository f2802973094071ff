//! Unified-memory sequence view wrapper.

use simkit_core::SequenceView;

/// Marks any [`SequenceView`] as backed by unified memory, satisfying the
/// `is_unified_memory()` check a GPU-capability engine runs before compute:
/// both input views must be backed by unified-memory storage. A real
/// driver backend would instead return this from a view whose buffer was
/// allocated via [`crate::unified_allocator`]; this wrapper lets
/// CPU-resident test fixtures exercise that code path.
pub struct Unified<V> {
    inner: V,
}

impl<V: SequenceView> Unified<V> {
    pub fn new(inner: V) -> Self {
        Self { inner }
    }
}

impl<V: SequenceView> SequenceView for Unified<V> {
    fn len(&self) -> usize {
        self.inner.len()
    }

    fn get(&self, i: usize) -> &[u8] {
        self.inner.get(i)
    }

    fn is_unified_memory(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use simkit_core::SliceSequence;

    #[test]
    fn wrapped_view_reports_unified_memory() {
        let items = vec!["abc".to_string()];
        let view = Unified::new(SliceSequence::new(&items));
        assert!(view.is_unified_memory());
        assert_eq!(view.get(0), b"abc");
        assert_eq!(view.len(), 1);
    }
}
