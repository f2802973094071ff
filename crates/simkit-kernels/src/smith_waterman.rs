//! Smith-Waterman local alignment scoring engine.

use rayon::prelude::*;
use simkit_core::{scope_compatible, CapabilityMask, DeviceScope, SequenceView, SimkitError};

use crate::cost::{GapCosts, SubstitutionMatrix};
use crate::engine::{
    detect_full_capability, effective_scope, requires_unified_memory, resolve_capability,
    select_variant, BackendVariant,
};
use crate::gotoh::gotoh_score;
use crate::strided::StridedWriter;

pub struct SmithWatermanEngine {
    matrix: SubstitutionMatrix,
    gap: GapCosts,
    variant: BackendVariant,
    capability: CapabilityMask,
    description: String,
}

impl SmithWatermanEngine {
    pub fn new(
        matrix: SubstitutionMatrix,
        gap: GapCosts,
        requested_capability: Option<CapabilityMask>,
    ) -> Self {
        let detected = detect_full_capability();
        let capability = resolve_capability(requested_capability, detected);
        let variant = select_variant(&gap, capability);
        let description = format!("smith_waterman(gap={gap:?}, tier={:?})", variant.tier);
        log::debug!("constructed smith_waterman engine: {description}");
        Self {
            matrix,
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

    /// One non-negative local alignment score per aligned pair:
    /// `i64` per entry, never negative.
    pub fn run(
        &self,
        scope: &DeviceScope,
        a: &dyn SequenceView,
        b: &dyn SequenceView,
        out: &StridedWriter<i64>,
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
        let compute = |i: usize| {
            let score = gotoh_score(a.get(i), b.get(i), &self.matrix, &self.gap, true, &allocator);
            out.write(i, score);
        };

        let scope = effective_scope(self.capability, scope);
        match &scope {
            DeviceScope::GpuDevice { executor, .. } => executor.dispatch(count, &compute),
            DeviceScope::CpuCores(pool) => {
                pool.install(|| (0..count).into_par_iter().for_each(compute));
            }
            DeviceScope::Default => (0..count).for_each(compute),
        }
        Ok(())
    }
}
