//! Cost parameters shared by every similarity kernel.
//!
//! Validation happens once, at engine construction: every field here is
//! already a valid signed byte by the time it reaches a kernel, so the hot
//! loops never re-check ranges.

use simkit_core::SimkitError;

fn validate_i8(value: i32, what: &str) -> Result<i8, SimkitError> {
    i8::try_from(value).map_err(|_| {
        SimkitError::ValueError(format!(
            "{what} must fit in a signed 8-bit integer, got {value}"
        ))
    })
}

/// Uniform substitution cost: `(match_cost, mismatch_cost)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniformCosts {
    pub match_cost: i8,
    pub mismatch_cost: i8,
}

impl UniformCosts {
    pub fn new(match_cost: i32, mismatch_cost: i32) -> Result<Self, SimkitError> {
        Ok(Self {
            match_cost: validate_i8(match_cost, "match_cost")?,
            mismatch_cost: validate_i8(mismatch_cost, "mismatch_cost")?,
        })
    }

    pub fn cost(&self, a: u8, b: u8) -> i32 {
        self.cost_for(a == b)
    }

    /// Generalization of [`UniformCosts::cost`] over any symbol's equality
    /// test, used by the UTF-8 kernel which compares decoded code points
    /// rather than raw bytes.
    pub fn cost_for(&self, equal: bool) -> i32 {
        if equal {
            self.match_cost as i32
        } else {
            self.mismatch_cost as i32
        }
    }
}

/// A 256x256 row-major substitution matrix: `matrix[i*256 + j]`
/// is the cost of aligning byte `i` in the first string against byte `j` in
/// the second. Boxed because 65536 bytes is too large to carry by value
/// comfortably through `Engine` construction and cloning.
#[derive(Clone)]
pub struct SubstitutionMatrix {
    entries: Box<[i8; 65536]>,
}

impl SubstitutionMatrix {
    /// Builds a matrix from a flat, row-major 65536-entry buffer of `i32`
    /// values, validating each fits a signed byte.
    pub fn from_flat(values: &[i32]) -> Result<Self, SimkitError> {
        if values.len() != 65536 {
            return Err(SimkitError::ValueError(format!(
                "substitution matrix must have exactly 65536 entries, got {}",
                values.len()
            )));
        }
        let mut entries = Box::new([0i8; 65536]);
        for (dst, &v) in entries.iter_mut().zip(values.iter()) {
            *dst = validate_i8(v, "substitution matrix entry")?;
        }
        Ok(Self { entries })
    }

    /// An identity-style matrix: `diagonal` on the diagonal, `off_diagonal`
    /// elsewhere — the shape used by scenarios 4/5.
    pub fn identity(diagonal: i32, off_diagonal: i32) -> Result<Self, SimkitError> {
        let diagonal = validate_i8(diagonal, "diagonal score")?;
        let off_diagonal = validate_i8(off_diagonal, "off-diagonal score")?;
        let mut entries = Box::new([off_diagonal; 65536]);
        for i in 0..256usize {
            entries[i * 256 + i] = diagonal;
        }
        Ok(Self { entries })
    }

    pub fn score(&self, a: u8, b: u8) -> i32 {
        self.entries[a as usize * 256 + b as usize] as i32
    }
}

/// Gap cost model: linear `gap = extend`, or affine `open,
/// extend`. Collapsed from caller-supplied values at construction time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GapCosts {
    Linear { gap: i8 },
    Affine { open: i8, extend: i8 },
}

impl GapCosts {
    /// Builds a linear gap model.
    pub fn linear(gap: i32) -> Result<Self, SimkitError> {
        Ok(GapCosts::Linear {
            gap: validate_i8(gap, "gap")?,
        })
    }

    /// Builds a gap model from `(open, extend)`. If `open == extend`, the
    /// engine must select a linear-cost backend variant for memory
    /// efficiency, so equal values collapse to `Linear` here, before the
    /// cost model ever reaches variant selection.
    pub fn affine(open: i32, extend: i32) -> Result<Self, SimkitError> {
        let open = validate_i8(open, "open")?;
        let extend = validate_i8(extend, "extend")?;
        if open == extend {
            Ok(GapCosts::Linear { gap: extend })
        } else {
            Ok(GapCosts::Affine { open, extend })
        }
    }

    pub fn is_linear(&self) -> bool {
        matches!(self, GapCosts::Linear { .. })
    }

    /// Cost of opening a new gap run of length >= 1.
    pub fn open_cost(&self) -> i32 {
        match self {
            GapCosts::Linear { gap } => *gap as i32,
            GapCosts::Affine { open, .. } => *open as i32,
        }
    }

    /// Cost of extending an already-open gap run by one more position.
    pub fn extend_cost(&self) -> i32 {
        match self {
            GapCosts::Linear { gap } => *gap as i32,
            GapCosts::Affine { extend, .. } => *extend as i32,
        }
    }

    /// Total cost of a gap run of `len` positions (`len >= 1`), matching
    /// the edge-case formula `open + (len-1)*extend`.
    pub fn run_cost(&self, len: usize) -> i32 {
        assert!(len >= 1, "gap run length must be at least 1");
        self.open_cost() + self.extend_cost() * (len as i32 - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_costs_reject_out_of_range() {
        assert!(UniformCosts::new(200, 1).is_err());
        assert!(UniformCosts::new(0, 1).is_ok());
    }

    #[test]
    fn matrix_rejects_wrong_length() {
        assert!(SubstitutionMatrix::from_flat(&[0; 10]).is_err());
    }

    #[test]
    fn matrix_identity_scores() {
        let m = SubstitutionMatrix::identity(1, -1).unwrap();
        assert_eq!(m.score(b'A', b'A'), 1);
        assert_eq!(m.score(b'A', b'G'), -1);
    }

    #[test]
    fn affine_with_equal_open_extend_collapses_to_linear() {
        let gap = GapCosts::affine(1, 1).unwrap();
        assert!(gap.is_linear());
    }

    #[test]
    fn affine_run_cost_matches_formula() {
        let gap = GapCosts::affine(2, 1).unwrap();
        assert_eq!(gap.run_cost(1), 2);
        assert_eq!(gap.run_cost(4), 2 + 3);
    }

    #[test]
    fn linear_run_cost_is_gap_times_len() {
        let gap = GapCosts::linear(1).unwrap();
        assert_eq!(gap.run_cost(4), 4);
    }
}
