//! Byte-level Levenshtein distance engine.

use rayon::prelude::*;
use simkit_core::{scope_compatible, CapabilityMask, DeviceScope, SequenceView, SimkitError};

use crate::cost::{GapCosts, UniformCosts};
use crate::engine::{
    detect_full_capability, effective_scope, requires_unified_memory, resolve_capability,
    select_variant, BackendVariant,
};
use crate::strided::StridedWriter;
use crate::wagner_fischer::affine_edit_distance;

/// A constructed byte-Levenshtein engine ("Engine"): immutable cost
/// parameters, a chosen backend variant, and the capability mask used to
/// select it.
pub struct LevenshteinEngine {
    costs: UniformCosts,
    gap: GapCosts,
    variant: BackendVariant,
    capability: CapabilityMask,
    description: String,
}

impl LevenshteinEngine {
    /// Factory contract: resolves capability, validates costs
    /// (already done by the `UniformCosts`/`GapCosts` constructors), picks
    /// a variant, and records the resolved mask.
    pub fn new(
        costs: UniformCosts,
        gap: GapCosts,
        requested_capability: Option<CapabilityMask>,
    ) -> Self {
        let detected = detect_full_capability();
        let capability = resolve_capability(requested_capability, detected);
        let variant = select_variant(&gap, capability);
        let description = format!(
            "levenshtein(match={}, mismatch={}, gap={:?}, tier={:?})",
            costs.match_cost, costs.mismatch_cost, gap, variant.tier
        );
        log::debug!("constructed levenshtein engine: {description}");
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

    /// Batched kernel contract: one distance per aligned pair
    /// `(a[i], b[i])`, written through `out`.
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
        let failure: std::sync::Mutex<Option<SimkitError>> = std::sync::Mutex::new(None);
        let compute = |i: usize| {
            match affine_edit_distance(a.get(i), b.get(i), &self.costs, &self.gap, &allocator) {
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
    fn scenario_2_linear_levenshtein_byte() {
        let engine = LevenshteinEngine::new(
            UniformCosts::new(0, 1).unwrap(),
            GapCosts::linear(1).unwrap(),
            None,
        );
        let a = vec!["kitten".to_string(), "flaw".to_string()];
        let b = vec!["sitting".to_string(), "lawn".to_string()];
        let a_view = SliceSequence::new(&a);
        let b_view = SliceSequence::new(&b);
        let mut buf = [0u64; 2];
        let writer = writer_for(&mut buf);
        engine
            .run(&DeviceScope::default_scope(), &a_view, &b_view, &writer)
            .unwrap();
        assert_eq!(buf, [3, 2]);
    }

    #[test]
    fn scenario_3_affine_levenshtein_byte() {
        let engine = LevenshteinEngine::new(
            UniformCosts::new(0, 1).unwrap(),
            GapCosts::affine(2, 1).unwrap(),
            None,
        );
        let a = vec!["AAA".to_string(), "".to_string()];
        let b = vec!["A".to_string(), "ABCD".to_string()];
        let a_view = SliceSequence::new(&a);
        let b_view = SliceSequence::new(&b);
        let mut buf = [0u64; 2];
        let writer = writer_for(&mut buf);
        engine
            .run(&DeviceScope::default_scope(), &a_view, &b_view, &writer)
            .unwrap();
        assert_eq!(buf, [3, 5]);
    }

    #[test]
    fn scenario_8_gpu_capable_engine_on_cpu_pool_is_device_code_mismatch() {
        let engine = LevenshteinEngine::new(
            UniformCosts::new(0, 1).unwrap(),
            GapCosts::linear(1).unwrap(),
            Some(CapabilityMask::CUDA),
        );
        assert!(engine.capability().contains(CapabilityMask::CUDA));
        let a = vec!["a".to_string()];
        let b = vec!["b".to_string()];
        let a_view = SliceSequence::new(&a);
        let b_view = SliceSequence::new(&b);
        let mut buf = [0u64; 1];
        let writer = writer_for(&mut buf);
        let pool_scope = DeviceScope::cpu_cores(4).unwrap();
        let result = engine.run(&pool_scope, &a_view, &b_view, &writer);
        assert!(matches!(result, Err(SimkitError::DeviceCodeMismatch)));
    }

    #[test]
    fn mismatched_view_lengths_is_value_error() {
        let engine =
            LevenshteinEngine::new(UniformCosts::new(0, 1).unwrap(), GapCosts::linear(1).unwrap(), None);
        let a = vec!["a".to_string()];
        let b = vec!["a".to_string(), "b".to_string()];
        let a_view = SliceSequence::new(&a);
        let b_view = SliceSequence::new(&b);
        let mut buf = [0u64; 2];
        let writer = writer_for(&mut buf);
        let result = engine.run(&DeviceScope::default_scope(), &a_view, &b_view, &writer);
        assert!(matches!(result, Err(SimkitError::ValueError(_))));
    }

    #[test]
    fn cpu_cores_scope_matches_default_scope() {
        let engine =
            LevenshteinEngine::new(UniformCosts::new(0, 1).unwrap(), GapCosts::linear(1).unwrap(), None);
        let a = vec!["kitten".to_string(), "flaw".to_string(), "abc".to_string()];
        let b = vec!["sitting".to_string(), "lawn".to_string(), "abc".to_string()];
        let a_view = SliceSequence::new(&a);
        let b_view = SliceSequence::new(&b);

        let mut buf_default = [0u64; 3];
        let writer_default = writer_for(&mut buf_default);
        engine
            .run(&DeviceScope::default_scope(), &a_view, &b_view, &writer_default)
            .unwrap();

        let pool_scope = DeviceScope::cpu_cores(2).unwrap();
        let mut buf_pool = [0u64; 3];
        let writer_pool = writer_for(&mut buf_pool);
        engine
            .run(&pool_scope, &a_view, &b_view, &writer_pool)
            .unwrap();

        assert_eq!(buf_default, buf_pool);
    }

    #[test]
    fn deterministic_across_repeated_runs() {
        let engine =
            LevenshteinEngine::new(UniformCosts::new(0, 1).unwrap(), GapCosts::linear(1).unwrap(), None);
        let a = vec!["kitten".to_string()];
        let b = vec!["sitting".to_string()];
        let a_view = SliceSequence::new(&a);
        let b_view = SliceSequence::new(&b);

        let mut buf1 = [0u64; 1];
        let w1 = writer_for(&mut buf1);
        engine.run(&DeviceScope::default_scope(), &a_view, &b_view, &w1).unwrap();

        let mut buf2 = [0u64; 1];
        let w2 = writer_for(&mut buf2);
        engine.run(&DeviceScope::default_scope(), &a_view, &b_view, &w2).unwrap();

        assert_eq!(buf1, buf2);
    }
}
