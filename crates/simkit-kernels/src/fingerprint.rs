//! MinHash fingerprint kernel: rolling polynomial hashes over a
//! fixed window per dimension, keeping the minimum observed hash and the
//! count of windows that achieved it.
//!
//! A k-mer rolling hash shape is generalized here from a single fixed
//! k-mer size to an arbitrary list of per-dimension window widths, and
//! from "keep the N smallest hashes" to "keep the minimum and its
//! multiplicity per dimension", for a batched fingerprint contract.

use rayon::prelude::*;
use simkit_core::{scope_compatible, CapabilityMask, DeviceScope, SequenceView, SimkitError};

use crate::engine::{detect_full_capability, effective_scope, resolve_capability};
use crate::strided::StridedMatrixWriter;

const DEFAULT_WINDOW_WIDTHS: [usize; 8] = [3, 4, 5, 7, 9, 11, 15, 31];

fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9E3779B97F4A7C15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}

/// One rolling-hash dimension: a window width and the precomputed
/// coefficients of its independently-seeded polynomial recurrence.
struct HashDimension {
    width: usize,
    base: u64,
    pow_w_minus_1: u64,
}

impl HashDimension {
    fn new(index: u64, width: usize, alphabet_size: u32) -> Self {
        let mut state = index ^ ((width as u64) << 32) ^ (alphabet_size as u64);
        let base = splitmix64(&mut state) | 1;
        let pow_w_minus_1 = base.wrapping_pow((width - 1) as u32);
        Self {
            width,
            base,
            pow_w_minus_1,
        }
    }

    /// Returns `(min_hash_low32, count_of_minimum)` over every length-`width`
    /// window of `text`, or `(u32::MAX, 0)` as a sentinel when `text` is
    /// shorter than the window.
    fn min_and_count(&self, text: &[u8]) -> (u32, u32) {
        let w = self.width;
        if text.len() < w {
            return (u32::MAX, 0);
        }

        let mut h: u64 = 0;
        for &byte in &text[0..w] {
            h = h.wrapping_mul(self.base).wrapping_add(byte as u64);
        }

        let mut min_hash = h;
        let mut count: u32 = 1;

        for i in w..text.len() {
            let leaving = text[i - w] as u64;
            let entering = text[i] as u64;
            h = h
                .wrapping_sub(leaving.wrapping_mul(self.pow_w_minus_1))
                .wrapping_mul(self.base)
                .wrapping_add(entering);
            match h.cmp(&min_hash) {
                std::cmp::Ordering::Less => {
                    min_hash = h;
                    count = 1;
                }
                std::cmp::Ordering::Equal => count += 1,
                std::cmp::Ordering::Greater => {}
            }
        }

        (min_hash as u32, count)
    }
}

/// A constructed fingerprint engine: `ndim` independently-seeded rolling
/// hashers, round-robin assigned to the supplied (or default) window widths.
pub struct FingerprintsEngine {
    dimensions: Vec<HashDimension>,
    alphabet_size: u32,
    sliced: bool,
    capability: CapabilityMask,
    description: String,
}

impl FingerprintsEngine {
    pub fn new(
        ndim: usize,
        window_widths: Option<Vec<usize>>,
        alphabet_size: Option<u32>,
        requested_capability: Option<CapabilityMask>,
    ) -> Result<Self, SimkitError> {
        if ndim == 0 {
            return Err(SimkitError::UnexpectedDimensions(
                "ndim must be greater than zero".into(),
            ));
        }
        let widths = window_widths.unwrap_or_else(|| DEFAULT_WINDOW_WIDTHS.to_vec());
        if widths.is_empty() {
            return Err(SimkitError::UnexpectedDimensions(
                "window_widths must not be empty".into(),
            ));
        }
        if widths.iter().any(|&w| w == 0) {
            return Err(SimkitError::ValueError(
                "every window width must be greater than zero".into(),
            ));
        }
        let alphabet_size = alphabet_size.unwrap_or(256);

        let dimensions = (0..ndim)
            .map(|d| HashDimension::new(d as u64, widths[d % widths.len()], alphabet_size))
            .collect();

        let detected = detect_full_capability();
        let capability = resolve_capability(requested_capability, detected);
        let sliced = ndim % 64 == 0;
        let description = format!(
            "fingerprints(ndim={ndim}, alphabet_size={alphabet_size}, sliced={sliced})"
        );
        log::debug!("constructed fingerprints engine: {description}");

        Ok(Self {
            dimensions,
            alphabet_size,
            sliced,
            capability,
            description,
        })
    }

    pub fn ndim(&self) -> usize {
        self.dimensions.len()
    }

    pub fn alphabet_size(&self) -> u32 {
        self.alphabet_size
    }

    /// Whether this engine qualifies for the slice-parallel vectorized
    /// variant (`ndim` a multiple of 64). This crate's serial
    /// fallback handles both cases identically; the flag is retained for
    /// callers that report the selected variant.
    pub fn is_sliced(&self) -> bool {
        self.sliced
    }

    pub fn capability(&self) -> CapabilityMask {
        self.capability
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Writes `(count, ndim)` minimum-hash and matching-count matrices for
    /// every text in `texts`. Empty input is valid and performs
    /// no compute.
    pub fn run(
        &self,
        scope: &DeviceScope,
        texts: &dyn SequenceView,
        hashes: &StridedMatrixWriter<u32>,
        counts: &StridedMatrixWriter<u32>,
    ) -> Result<(), SimkitError> {
        let count = texts.len();
        if hashes.rows() < count || counts.rows() < count {
            return Err(SimkitError::ValueError(
                "output matrices shorter than input count".into(),
            ));
        }
        if hashes.cols() != self.ndim() || counts.cols() != self.ndim() {
            return Err(SimkitError::UnexpectedDimensions(
                "output matrix column count must equal ndim".into(),
            ));
        }
        if !scope_compatible(self.capability, scope) {
            return Err(SimkitError::DeviceCodeMismatch);
        }
        if count == 0 {
            return Ok(());
        }

        let compute = |t: usize| {
            let text = texts.get(t);
            for (d, dim) in self.dimensions.iter().enumerate() {
                let (min_hash, n) = dim.min_and_count(text);
                hashes.write_cell(t, d, min_hash);
                counts.write_cell(t, d, n);
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
        Ok(())
    }
}
