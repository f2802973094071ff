//! Affine-gap alignment scoring (Needleman-Wunsch / Smith-Waterman).
//!
//! One Gotoh three-matrix recurrence serves both: global alignment takes
//! the score at the final cell, local alignment clamps every cell at zero
//! and tracks the running maximum — score is `max(0, DP cell)`
//! everywhere, and the final answer is the maximum over the whole matrix.

use simkit_core::Allocator;

use crate::cost::{GapCosts, SubstitutionMatrix};

const NEG_INF: i64 = i64::MIN / 4;

/// `local = false` computes the Needleman-Wunsch global score; `local =
/// true` computes the Smith-Waterman local score. DP scratch rows are
/// allocated through `allocator` rather than the global heap.
pub fn gotoh_score(
    a: &[u8],
    b: &[u8],
    matrix: &SubstitutionMatrix,
    gap: &GapCosts,
    local: bool,
    allocator: &Allocator,
) -> i64 {
    let m = a.len();
    let n = b.len();
    let open = gap.open_cost() as i64;
    let extend = gap.extend_cost() as i64;
    let clamp = |v: i64| if local { v.max(0) } else { v };

    let mut prev_m = simkit_core::scratch_row(allocator, n + 1, NEG_INF);
    let mut prev_ix = simkit_core::scratch_row(allocator, n + 1, NEG_INF);
    let mut prev_iy = simkit_core::scratch_row(allocator, n + 1, NEG_INF);

    prev_m[0] = 0;
    for j in 1..=n {
        prev_ix[j] = clamp(open + extend * (j as i64 - 1));
    }

    let mut best = clamp(0);
    for &v in prev_ix.iter() {
        if local {
            best = best.max(v);
        }
    }

    let mut curr_m = simkit_core::scratch_row(allocator, n + 1, NEG_INF);
    let mut curr_ix = simkit_core::scratch_row(allocator, n + 1, NEG_INF);
    let mut curr_iy = simkit_core::scratch_row(allocator, n + 1, NEG_INF);

    for i in 1..=m {
        curr_m[0] = NEG_INF;
        curr_ix[0] = NEG_INF;
        curr_iy[0] = clamp(open + extend * (i as i64 - 1));
        if local {
            best = best.max(curr_iy[0]);
        }

        for j in 1..=n {
            let score = matrix.score(a[i - 1], b[j - 1]) as i64;
            let diag = prev_m[j - 1].max(prev_ix[j - 1]).max(prev_iy[j - 1]);
            let m_val = clamp(diag + score);
            let ix_val = clamp((curr_m[j - 1] + open).max(curr_ix[j - 1] + extend));
            let iy_val = clamp((prev_m[j] + open).max(prev_iy[j] + extend));

            curr_m[j] = m_val;
            curr_ix[j] = ix_val;
            curr_iy[j] = iy_val;

            if local {
                best = best.max(m_val).max(ix_val).max(iy_val);
            }
        }

        std::mem::swap(&mut prev_m, &mut curr_m);
        std::mem::swap(&mut prev_ix, &mut curr_ix);
        std::mem::swap(&mut prev_iy, &mut curr_iy);
    }

    if local {
        best
    } else {
        prev_m[n].max(prev_ix[n]).max(prev_iy[n])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host_allocator() -> Allocator {
        simkit_core::default_allocator()
    }

    #[test]
    fn global_alignment_blast_tutorial_example() {
        // Scenario 4
        let matrix = SubstitutionMatrix::identity(1, -1).unwrap();
        let gap = GapCosts::affine(-1, -1).unwrap();
        let score = gotoh_score(b"GATTACA", b"GCATGCU", &matrix, &gap, false, &host_allocator());
        assert_eq!(score, 0);
    }

    #[test]
    fn local_alignment_peak() {
        // Scenario 5
        let matrix = SubstitutionMatrix::identity(1, -1).unwrap();
        let gap = GapCosts::affine(-2, -2).unwrap();
        let score = gotoh_score(b"ACACACTA", b"AGCACACA", &matrix, &gap, true, &host_allocator());
        assert_eq!(score, 12);
    }

    #[test]
    fn local_score_is_never_negative() {
        let matrix = SubstitutionMatrix::identity(1, -5).unwrap();
        let gap = GapCosts::affine(-5, -5).unwrap();
        let score = gotoh_score(b"AAAA", b"TTTT", &matrix, &gap, true, &host_allocator());
        assert!(score >= 0);
    }

    #[test]
    fn local_at_least_global_with_nonnegative_diagonal() {
        let matrix = SubstitutionMatrix::identity(1, -1).unwrap();
        let gap = GapCosts::affine(-1, -1).unwrap();
        let alloc = host_allocator();
        let global = gotoh_score(b"ACGTACGT", b"ACGGACGT", &matrix, &gap, false, &alloc);
        let local = gotoh_score(b"ACGTACGT", b"ACGGACGT", &matrix, &gap, true, &alloc);
        assert!(local >= global);
    }

    #[test]
    fn identical_sequences_score_full_length_globally() {
        let matrix = SubstitutionMatrix::identity(2, -1).unwrap();
        let gap = GapCosts::linear(-2).unwrap();
        let score = gotoh_score(b"ACGT", b"ACGT", &matrix, &gap, false, &host_allocator());
        assert_eq!(score, 8);
    }
}
