//! Needleman-Wunsch global alignment scoring engine.

use rayon::prelude::*;
use simkit_core::{scope_compatible, CapabilityMask, DeviceScope, SequenceView, SimkitError};

use crate::cost::{GapCosts, SubstitutionMatrix};
use crate::engine::{
    detect_full_capability, effective_scope, requires_unified_memory, resolve_capability,
    select_variant, BackendVariant,
};
use crate::gotoh::gotoh_score;
use crate::strided::StridedWriter;

pub struct NeedlemanWunschEngine {
    matrix: SubstitutionMatrix,
    gap: GapCosts,
    variant: BackendVariant,
    capability: CapabilityMask,
    description: String,
}

impl NeedlemanWunschEngine {
    pub fn new(
        matrix: SubstitutionMatrix,
        gap: GapCosts,
        requested_capability: Option<CapabilityMask>,
    ) -> Self {
        let detected = detect_full_capability();
        let capability = resolve_capability(requested_capability, detected);
        let variant = select_variant(&gap, capability);
        let description = format!("needleman_wunsch(gap={gap:?}, tier={:?})", variant.tier);
        log::debug!("constructed needleman_wunsch engine: {description}");
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

    /// One signed global alignment score per aligned pair: `i64` per
    /// entry.
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
            let score = gotoh_score(a.get(i), b.get(i), &self.matrix, &self.gap, false, &allocator);
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

#[cfg(test)]
mod tests {
    use super::*;
    use simkit_core::SliceSequence;

    fn writer_for(buf: &mut [i64]) -> StridedWriter<i64> {
        unsafe {
            StridedWriter::new(
                buf.as_mut_ptr() as *mut u8,
                std::mem::size_of::<i64>(),
                buf.len(),
            )
        }
    }

    #[test]
    fn scenario_4_identity_matrix() {
        let engine = NeedlemanWunschEngine::new(
            SubstitutionMatrix::identity(1, -1).unwrap(),
            GapCosts::affine(-1, -1).unwrap(),
            None,
        );
        let a = vec!["GATTACA".to_string()];
        let b = vec!["GCATGCU".to_string()];
        let a_view = SliceSequence::new(&a);
        let b_view = SliceSequence::new(&b);
        let mut buf = [0i64; 1];
        let writer = writer_for(&mut buf);
        engine
            .run(&DeviceScope::default_scope(), &a_view, &b_view, &writer)
            .unwrap();
        assert_eq!(buf[0], 0);
    }

    #[test]
    fn identical_sequences_score_is_maximal() {
        let engine = NeedlemanWunschEngine::new(
            SubstitutionMatrix::identity(2, -1).unwrap(),
            GapCosts::linear(-2).unwrap(),
            None,
        );
        let a = vec!["ACGTACGT".to_string()];
        let b = vec!["ACGTACGT".to_string()];
        let a_view = SliceSequence::new(&a);
        let b_view = SliceSequence::new(&b);
        let mut buf = [0i64; 1];
        let writer = writer_for(&mut buf);
        engine
            .run(&DeviceScope::default_scope(), &a_view, &b_view, &writer)
            .unwrap();
        assert_eq!(buf[0], 16);
    }

    #[test]
    fn batch_independence() {
        let engine = NeedlemanWunschEngine::new(
            SubstitutionMatrix::identity(1, -1).unwrap(),
            GapCosts::affine(-1, -1).unwrap(),
            None,
        );
        let a = vec!["GATTACA".to_string(), "ACGT".to_string()];
        let b = vec!["GCATGCU".to_string(), "ACGT".to_string()];
        let a_view = SliceSequence::new(&a);
        let b_view = SliceSequence::new(&b);
        let mut buf = [0i64; 2];
        let writer = writer_for(&mut buf);
        engine
            .run(&DeviceScope::default_scope(), &a_view, &b_view, &writer)
            .unwrap();
        assert_eq!(buf[0], 0);
        assert_eq!(buf[1], 4);
    }
}
