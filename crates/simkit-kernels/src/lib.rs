//! Engine objects and batched similarity/fingerprint kernels.
//!
//! Each engine owns its resolved cost parameters and selected backend
//! variant, and exposes a `run` method matching the batched
//! kernel contract for its algorithm.

pub mod cost;
pub mod engine;
pub mod fingerprint;
pub mod gotoh;
pub mod levenshtein;
pub mod levenshtein_utf8;
pub mod needleman_wunsch;
pub mod smith_waterman;
pub mod strided;
pub mod wagner_fischer;

pub use cost::{GapCosts, SubstitutionMatrix, UniformCosts};
pub use engine::{
    detect_full_capability, effective_scope, requires_unified_memory, resolve_capability,
    select_variant, BackendVariant, Tier,
};
pub use fingerprint::FingerprintsEngine;
pub use gotoh::gotoh_score;
pub use levenshtein::LevenshteinEngine;
pub use levenshtein_utf8::LevenshteinUtf8Engine;
pub use needleman_wunsch::NeedlemanWunschEngine;
pub use smith_waterman::SmithWatermanEngine;
pub use strided::{StridedMatrixWriter, StridedWriter};
pub use wagner_fischer::affine_edit_distance;
