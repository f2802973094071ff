//! Runtime capability model.
//!
//! A [`CapabilityMask`] is a bitmask over a fixed, ordered set of named
//! hardware/software capabilities. Detection runs at most once per process
//! and the result is cached in a [`std::sync::OnceLock`] — new releases may
//! add tiers but the set never shrinks, so the mask only ever grows wider
//! over time, never narrower for a given binary.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use crate::error::SimkitError;

/// Bitmask over the fixed, ordered capability set.
///
/// Every named bit is documented on its associated constant. `ANY` is the
/// union of every bit the crate knows how to name; it is not itself
/// detected, only used as a wildcard when requesting capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
pub struct CapabilityMask(u32);

macro_rules! bit {
    ($n:expr) => {
        1u32 << $n
    };
}

impl CapabilityMask {
    pub const SERIAL: Self = Self(bit!(0));
    pub const PARALLEL: Self = Self(bit!(1));
    pub const HASWELL: Self = Self(bit!(2));
    pub const SKYLAKE: Self = Self(bit!(3));
    pub const ICE: Self = Self(bit!(4));
    pub const NEON: Self = Self(bit!(5));
    pub const NEON_AES: Self = Self(bit!(6));
    pub const SVE: Self = Self(bit!(7));
    pub const SVE2: Self = Self(bit!(8));
    pub const SVE2_AES: Self = Self(bit!(9));
    pub const CUDA: Self = Self(bit!(10));
    pub const KEPLER: Self = Self(bit!(11));
    pub const HOPPER: Self = Self(bit!(12));

    /// Every named capability bit this build knows about.
    pub const ANY: Self = Self(
        Self::SERIAL.0
            | Self::PARALLEL.0
            | Self::HASWELL.0
            | Self::SKYLAKE.0
            | Self::ICE.0
            | Self::NEON.0
            | Self::NEON_AES.0
            | Self::SVE.0
            | Self::SVE2.0
            | Self::SVE2_AES.0
            | Self::CUDA.0
            | Self::KEPLER.0
            | Self::HOPPER.0,
    );

    /// `serial | parallel |` every CPU-vector tier.
    pub const CPUS: Self = Self(
        Self::SERIAL.0
            | Self::PARALLEL.0
            | Self::HASWELL.0
            | Self::SKYLAKE.0
            | Self::ICE.0
            | Self::NEON.0
            | Self::NEON_AES.0
            | Self::SVE.0
            | Self::SVE2.0
            | Self::SVE2_AES.0,
    );

    /// `cuda | kepler | hopper`.
    pub const CKH: Self = Self(Self::CUDA.0 | Self::KEPLER.0 | Self::HOPPER.0);

    /// `cuda | kepler`.
    pub const CK: Self = Self(Self::CUDA.0 | Self::KEPLER.0);

    pub const EMPTY: Self = Self(0);

    /// Ordered (name, bit) table used for both stringification and parsing.
    /// Order matters: it is the canonical order used by [`CapabilityMask::to_string`].
    const NAMES: &'static [(&'static str, CapabilityMask)] = &[
        ("serial", CapabilityMask::SERIAL),
        ("parallel", CapabilityMask::PARALLEL),
        ("haswell", CapabilityMask::HASWELL),
        ("skylake", CapabilityMask::SKYLAKE),
        ("ice", CapabilityMask::ICE),
        ("neon", CapabilityMask::NEON),
        ("neon_aes", CapabilityMask::NEON_AES),
        ("sve", CapabilityMask::SVE),
        ("sve2", CapabilityMask::SVE2),
        ("sve2_aes", CapabilityMask::SVE2_AES),
        ("cuda", CapabilityMask::CUDA),
        ("kepler", CapabilityMask::KEPLER),
        ("hopper", CapabilityMask::HOPPER),
    ];

    pub fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub fn intersection(self, other: Self) -> Self {
        Self(self.0 & other.0)
    }

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    /// Raw bit value, exposed for FFI-shaped callers.
    pub fn bits(self) -> u32 {
        self.0
    }

    pub fn from_bits(bits: u32) -> Self {
        Self(bits & Self::ANY.0)
    }

    /// Is this mask GPU-capable (requires unified memory)?
    pub fn is_gpu(self) -> bool {
        self.intersects(Self::CKH)
    }
}

impl fmt::Display for CapabilityMask {
    /// Comma-joined, in canonical `NAMES` order — round-trips through
    /// [`CapabilityMask::from_str`].
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = Self::NAMES
            .iter()
            .filter(|(_, bit)| self.contains(*bit))
            .map(|(name, _)| *name)
            .collect();
        write!(f, "{}", names.join(","))
    }
}

impl FromStr for CapabilityMask {
    type Err = SimkitError;

    /// Parses a comma-joined capability string. Case-sensitive; `"any"`
    /// expands to [`CapabilityMask::ANY`]; any unknown token is a
    /// `value-error`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut mask = Self::EMPTY;
        for token in s.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            if token == "any" {
                mask = mask.union(Self::ANY);
                continue;
            }
            let found = Self::NAMES.iter().find(|(name, _)| *name == token);
            match found {
                Some((_, bit)) => mask = mask.union(*bit),
                None => {
                    return Err(SimkitError::ValueError(format!(
                        "unknown capability name: {token}"
                    )))
                }
            }
        }
        Ok(mask)
    }
}

static DETECTED: OnceLock<CapabilityMask> = OnceLock::new();

/// Probe the host once and cache the result for the rest of the process
/// lifetime; capability detection runs once, at load.
///
/// Always includes [`CapabilityMask::SERIAL`]. Any probe that cannot prove
/// a feature present is simply treated as absent — detection never fails
/// the process.
pub fn detect_capabilities() -> CapabilityMask {
    *DETECTED.get_or_init(|| {
        let mask = detect_uncached();
        log::info!("detected capabilities: {mask}");
        mask
    })
}

fn detect_uncached() -> CapabilityMask {
    let mut mask = CapabilityMask::SERIAL | CapabilityMask::PARALLEL;

    #[cfg(target_arch = "x86_64")]
    {
        if std::is_x86_feature_detected!("avx2") {
            mask = mask.union(CapabilityMask::HASWELL);
        }
        if std::is_x86_feature_detected!("avx512f")
            && std::is_x86_feature_detected!("avx512bw")
            && std::is_x86_feature_detected!("avx512vl")
            && std::is_x86_feature_detected!("vaes")
        {
            mask = mask.union(CapabilityMask::SKYLAKE);
        }
        if std::is_x86_feature_detected!("avx512vbmi") && std::is_x86_feature_detected!("avx512vbmi2")
        {
            mask = mask.union(CapabilityMask::ICE);
        }
    }

    #[cfg(target_arch = "aarch64")]
    {
        // NEON is mandatory on every AArch64 and Apple-Silicon target.
        mask = mask.union(CapabilityMask::NEON);
        if std::arch::is_aarch64_feature_detected!("aes") {
            mask = mask.union(CapabilityMask::NEON_AES);
        }
        if std::arch::is_aarch64_feature_detected!("sve") {
            mask = mask.union(CapabilityMask::SVE);
        }
        if std::arch::is_aarch64_feature_detected!("sve2") {
            mask = mask.union(CapabilityMask::SVE2);
            if std::arch::is_aarch64_feature_detected!("aes") {
                mask = mask.union(CapabilityMask::SVE2_AES);
            }
        }
    }

    mask
}

impl std::ops::BitOr for CapabilityMask {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

impl std::ops::BitAnd for CapabilityMask {
    type Output = Self;
    fn bitand(self, rhs: Self) -> Self {
        self.intersection(rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detect_always_includes_serial() {
        let mask = detect_capabilities();
        assert!(mask.contains(CapabilityMask::SERIAL));
    }

    #[test]
    fn detect_is_memoized() {
        let a = detect_capabilities();
        let b = detect_capabilities();
        assert_eq!(a, b);
    }

    #[test]
    fn roundtrip_capability_string() {
        let mask = CapabilityMask::SERIAL | CapabilityMask::HASWELL | CapabilityMask::CUDA;
        let s = mask.to_string();
        let parsed: CapabilityMask = s.parse().unwrap();
        assert_eq!(mask, parsed);
    }

    #[test]
    fn any_expands_to_full_mask() {
        let parsed: CapabilityMask = "any".parse().unwrap();
        assert_eq!(parsed, CapabilityMask::ANY);
    }

    #[test]
    fn unknown_name_is_value_error() {
        let result: Result<CapabilityMask, _> = "bogus".parse();
        assert!(matches!(result, Err(SimkitError::ValueError(_))));
    }

    #[test]
    fn case_sensitive_parsing() {
        let result: Result<CapabilityMask, _> = "SERIAL".parse();
        assert!(result.is_err());
    }

    #[test]
    fn aliases_are_correct_unions() {
        assert!(CapabilityMask::CPUS.contains(CapabilityMask::SERIAL));
        assert!(CapabilityMask::CPUS.contains(CapabilityMask::SVE2_AES));
        assert!(!CapabilityMask::CPUS.contains(CapabilityMask::CUDA));

        assert!(CapabilityMask::CKH.contains(CapabilityMask::HOPPER));
        assert!(!CapabilityMask::CKH.contains(CapabilityMask::HASWELL));

        assert!(CapabilityMask::CK.contains(CapabilityMask::KEPLER));
        assert!(!CapabilityMask::CK.contains(CapabilityMask::HOPPER));
    }

    #[test]
    fn is_gpu_detection() {
        assert!(CapabilityMask::CUDA.is_gpu());
        assert!(!CapabilityMask::HASWELL.is_gpu());
    }

    #[test]
    fn intersection_fallback_scenario() {
        // Scenario 1: detector returns {serial, haswell},
        // requested {skylake, ice}; resolved intersection is empty, so the
        // caller must fall back to serial.
        let detected = CapabilityMask::SERIAL | CapabilityMask::HASWELL;
        let requested = CapabilityMask::SKYLAKE | CapabilityMask::ICE;
        let intersected = detected.intersection(requested);
        assert!(intersected.is_empty());
    }
}
