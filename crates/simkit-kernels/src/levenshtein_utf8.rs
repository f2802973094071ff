//! UTF-8 Levenshtein distance engine: identical semantics to
//! [`crate::levenshtein::LevenshteinEngine`], but operating on decoded
//! Unicode code points instead of raw bytes.

use std::sync::Mutex;

use rayon::prelude::*;
use simkit_core::{scope_compatible, CapabilityMask, DeviceScope, SequenceView, SimkitError};

use crate::cost::{GapCosts, UniformCosts};
use crate::engine::{
    detect_full_capability, effective_scope, requires_unified_memory, resolve_capability,
    select_variant, BackendVariant,
};
use crate::strided::StridedWriter;
use crate::wagner_fischer::affine_edit_distance;

pub struct LevenshteinUtf8Engine {
    costs: UniformCosts,
    gap: GapCosts,
    variant: BackendVariant,
    capability: CapabilityMask,
    description: String,
}

fn decode(bytes: &[u8]) -> Result<Vec<char>, SimkitError> {
    std::str::from_utf8(bytes)
        .map(|s| s.chars().collect())
        .map_err(|e| SimkitError::InvalidUtf8(e.valid_up_to()))
}

impl LevenshteinUtf8Engine {
    pub fn new(
        costs: UniformCosts,
        gap: GapCosts,
        requested_capability: Option<CapabilityMask>,
    ) -> Self {
        let detected = detect_full_capability();
        let capability = resolve_capability(requested_capability, detected);
        let variant = select_variant(&gap, capability);
        let description = format!(
            "levenshtein_utf8(match={}, mismatch={}, gap={:?}, tier={:?})",
            costs.match_cost, costs.mismatch_cost, gap, variant.tier
        );
        log::debug!("constructed levenshtein_utf8 engine: {description}");
        Self {
            costs,
            gap,
            variant,
            capability,
            description,
        }
    }

    pub fn capability(&self) -> CapabilityMask {
        self.capability
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn run(
        &self,
        scope: &DeviceScope,
        a: &dyn SequenceView,
        b: &dyn SequenceView,
        out: &StridedWriter<u64>,
    ) -> Result<(), SimkitError> {
        if a.len() != b.len() {
            return Err(SimkitError::ValueError(
                "a_view.count must equal b_view.count".into(),
            ));
        }
        let count = a.len();
        if out.len() < count {
            return Err(SimkitError::ValueError(
                "output buffer shorter than input count".into(),
            ));
        }
        if !scope_compatible(self.capability, scope) {
            return Err(SimkitError::DeviceCodeMismatch);
        }
        if requires_unified_memory(self.capability)
            && !(a.is_unified_memory() && b.is_unified_memory())
        {
            return Err(SimkitError::DeviceMemoryMismatch);
        }

        let allocator = if requires_unified_memory(self.capability) {
            simkit_core::unified_allocator()
        } else {
            simkit_core::default_allocator()
        };
        let failure: Mutex<Option<SimkitError>> = Mutex::new(None);
        let compute = |i: usize| {
            let result = decode(a.get(i)).and_then(|a_chars| {
                decode(b.get(i)).and_then(|b_chars| {
                    affine_edit_distance(&a_chars, &b_chars, &self.costs, &self.gap, &allocator)
                })
            });
            match result {
                Ok(dist) => out.write(i, dist),
                Err(e) => *failure.lock().unwrap() = Some(e),
            }
        };

        let scope = effective_scope(self.capability, scope);
        match &scope {
            DeviceScope::GpuDevice { executor, .. } => executor.dispatch(count, &compute),
            DeviceScope::CpuCores(pool) => {
                pool.install(|| (0..count).into_par_iter().for_each(compute));
            }
            DeviceScope::Default => (0..count).for_each(compute),
        }
        match failure.into_inner().unwrap() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use simkit_core::SliceSequence;

    fn writer_for(buf: &mut [u64]) -> StridedWriter<u64> {
        unsafe {
            StridedWriter::new(
                buf.as_mut_ptr() as *mut u8,
                std::mem::size_of::<u64>(),
                buf.len(),
            )
        }
    }

    #[test]
    fn multibyte_code_points_count_as_one_edit() {
        let engine = LevenshteinUtf8Engine::new(
            UniformCosts::new(0, 1).unwrap(),
            GapCosts::linear(1).unwrap(),
            None,
        );
        // "café" vs "cafe": one code-point substitution (é -> e), even
        // though é is 2 bytes — a byte-level kernel would see more.
        let a = vec!["café".to_string()];
        let b = vec!["cafe".to_string()];
        let a_view = SliceSequence::new(&a);
        let b_view = SliceSequence::new(&b);
        let mut buf = [0u64; 1];
        let writer = writer_for(&mut buf);
        engine
            .run(&DeviceScope::default_scope(), &a_view, &b_view, &writer)
            .unwrap();
        assert_eq!(buf[0], 1);
    }

    #[test]
    fn invalid_utf8_is_rejected() {
        let engine = LevenshteinUtf8Engine::new(
            UniformCosts::new(0, 1).unwrap(),
            GapCosts::linear(1).unwrap(),
            None,
        );
        let invalid: &[u8] = &[0xff, 0xfe];
        let valid: &[u8] = b"ok";
        let a_view = simkit_core::CallbackSequence::new(1, |_| invalid);
        let b_view = simkit_core::CallbackSequence::new(1, |_| valid);
        let mut buf = [0u64; 1];
        let writer = writer_for(&mut buf);
        let result = engine.run(&DeviceScope::default_scope(), &a_view, &b_view, &writer);
        assert!(matches!(result, Err(SimkitError::InvalidUtf8(_))));
    }
}
