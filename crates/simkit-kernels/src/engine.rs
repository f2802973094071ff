//! Common engine-factory contract.
//!
//! A trait that picks one of several concrete backend methods
//! (`execute_naive`/`execute_neon`/`execute_parallel`/`execute_amx`) per
//! call is generalized here so the choice is made once, at construction,
//! and stored on the engine as a [`BackendVariant`] — a one-shot factory
//! contract rather than per-call re-selection.

use std::sync::Arc;
use std::sync::OnceLock;

use simkit_core::{CapabilityMask, DeviceScope};
#[cfg(feature = "gpu")]
use simkit_core::GpuExecutor;

use crate::cost::GapCosts;

/// One of the five backend tiers named in the precedence list.
/// `IceVector` stands for "the best compiled CPU-vector tier" generalized
/// across platforms (see DESIGN.md for why this reading was chosen over
/// the literal single `ice` x86 tier).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Serial,
    IceVector,
    Cuda,
    KeplerCuda,
    HopperCuda,
}

impl Tier {
    /// Whether this tier offers an affine-gap variant at all — some tiers
    /// offer only linear, and selection falls through to the next
    /// candidate. The base `cuda` tier is linear-only here; `kepler` and
    /// `hopper` (its higher-SM-version successors) add affine support.
    pub fn supports_affine(self) -> bool {
        !matches!(self, Tier::Cuda)
    }

    pub fn is_gpu(self) -> bool {
        matches!(self, Tier::Cuda | Tier::KeplerCuda | Tier::HopperCuda)
    }
}

/// A chosen backend variant: a tagged value whose tag identifies one of
/// (linear-cost, affine-cost) x (serial, ice-vector, cuda, kepler-tier-cuda,
/// hopper-tier-cuda).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackendVariant {
    pub is_affine: bool,
    pub tier: Tier,
}

/// Highest CPU-vector capability present in `mask`, in descending
/// preference, standing in for the `ice-vector` precedence slot on every
/// platform this crate builds for.
fn best_cpu_vector_capability(mask: CapabilityMask) -> Option<CapabilityMask> {
    const CANDIDATES: [CapabilityMask; 6] = [
        CapabilityMask::ICE,
        CapabilityMask::SKYLAKE,
        CapabilityMask::HASWELL,
        CapabilityMask::SVE2,
        CapabilityMask::SVE,
        CapabilityMask::NEON,
    ];
    CANDIDATES.into_iter().find(|&bit| mask.contains(bit))
}

/// Step 3 of the factory contract: picks the highest-tier
/// variant whose required capability bits are a subset of `capability`,
/// among tiers that support the requested gap-cost shape.
pub fn select_variant(gap: &GapCosts, capability: CapabilityMask) -> BackendVariant {
    const PRECEDENCE: [Tier; 5] = [
        Tier::IceVector,
        Tier::Cuda,
        Tier::KeplerCuda,
        Tier::HopperCuda,
        Tier::Serial,
    ];
    let is_affine = !gap.is_linear();

    for tier in PRECEDENCE {
        if is_affine && !tier.supports_affine() {
            continue;
        }
        let available = match tier {
            Tier::IceVector => best_cpu_vector_capability(capability).is_some(),
            Tier::Cuda => capability.contains(CapabilityMask::CUDA),
            Tier::KeplerCuda => capability.contains(CapabilityMask::KEPLER),
            Tier::HopperCuda => capability.contains(CapabilityMask::HOPPER),
            Tier::Serial => true,
        };
        if available {
            return BackendVariant { is_affine, tier };
        }
    }
    BackendVariant {
        is_affine,
        tier: Tier::Serial,
    }
}

/// The capability every engine factory should resolve against: CPU-vector
/// bits from `simkit_core`'s detector, merged with whatever GPU tier
/// `simkit_gpu`'s detector reports when this crate is built with the `gpu`
/// feature. `simkit-core` stays driver-free by design, so GPU capability
/// can only be folded in here, one layer up, not inside
/// `simkit_core::detect_capabilities` itself.
pub fn detect_full_capability() -> CapabilityMask {
    let cpu = simkit_core::detect_capabilities();
    #[cfg(feature = "gpu")]
    {
        if let Some(gpu) = simkit_gpu::detect_gpu_capability() {
            return cpu.union(gpu);
        }
    }
    cpu
}

/// Step 1 of the factory contract: intersect requested CPU-vector bits
/// with detected, falling back to `serial` when the intersection is
/// empty — except any GPU tier (`cuda`/`kepler`/`hopper`) named in
/// `requested` passes through unconditionally. `detected` only ever
/// reflects hardware this process actually probed (or the optional GPU
/// probe actually found); a caller that explicitly asks for a GPU tier
/// it knows it wants — including to exercise `device_code_mismatch`
/// against a non-GPU scope without any accelerator present — must not
/// have that request silently erased by intersecting it against a
/// narrower detector.
pub fn resolve_capability(
    requested: Option<CapabilityMask>,
    detected: CapabilityMask,
) -> CapabilityMask {
    let requested = match requested {
        Some(requested) => requested,
        None => {
            return if detected.is_empty() {
                CapabilityMask::SERIAL
            } else {
                detected
            };
        }
    };
    let gpu_bits = requested.intersection(CapabilityMask::CKH);
    let cpu_bits = requested.intersection(detected);
    let resolved = cpu_bits.union(gpu_bits);
    if resolved.is_empty() {
        CapabilityMask::SERIAL
    } else {
        resolved
    }
}

/// Whether an engine with this resolved capability requires unified-memory
/// backed inputs. Required iff the engine's capability tag is one of
/// cuda, kepler, hopper — tested here as "contains cuda", since
/// kepler/hopper detection always also sets cuda under the additive
/// SM-threshold comparison.
pub fn requires_unified_memory(capability: CapabilityMask) -> bool {
    capability.contains(CapabilityMask::CUDA)
}

#[cfg(feature = "gpu")]
static DEFAULT_GPU_EXECUTOR: OnceLock<Option<Arc<dyn GpuExecutor>>> = OnceLock::new();

/// Lazily acquires a GPU executor bound to device 0 the first time any
/// GPU-capable engine needs one, and reuses it for the rest of the
/// process. `None` once probing found no GPU present, cached the same way
/// so repeated default-scope calls don't re-probe.
#[cfg(feature = "gpu")]
fn default_gpu_executor() -> Option<Arc<dyn GpuExecutor>> {
    DEFAULT_GPU_EXECUTOR
        .get_or_init(|| {
            simkit_gpu::detect_gpu_capability().map(|capability| {
                Arc::new(simkit_gpu::RayonGpuExecutor::new(0, capability)) as Arc<dyn GpuExecutor>
            })
        })
        .clone()
}

/// Resolves the scope an engine call should actually dispatch through. A
/// GPU-capable engine handed the default scope transparently acquires (and,
/// for the rest of the process, reuses) a GPU executor bound to device 0,
/// rather than running synchronously on the caller's thread.
pub fn effective_scope(capability: CapabilityMask, scope: &DeviceScope) -> DeviceScope {
    #[cfg(feature = "gpu")]
    {
        if capability.is_gpu() && matches!(scope, DeviceScope::Default) {
            if let Some(executor) = default_gpu_executor() {
                return DeviceScope::gpu_device(0, executor);
            }
        }
    }
    scope.clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_prefers_ice_vector_when_present() {
        let gap = GapCosts::linear(1).unwrap();
        let cap = CapabilityMask::SERIAL | CapabilityMask::HASWELL;
        let variant = select_variant(&gap, cap);
        assert_eq!(variant.tier, Tier::IceVector);
        assert!(!variant.is_affine);
    }

    #[test]
    fn falls_back_to_serial_without_any_tier() {
        let gap = GapCosts::linear(1).unwrap();
        let variant = select_variant(&gap, CapabilityMask::SERIAL);
        assert_eq!(variant.tier, Tier::Serial);
    }

    #[test]
    fn affine_skips_cuda_base_tier() {
        let gap = GapCosts::affine(2, 1).unwrap();
        let cap = CapabilityMask::SERIAL | CapabilityMask::CUDA;
        let variant = select_variant(&gap, cap);
        // cuda-base doesn't support affine; no kepler/hopper present either,
        // so this must fall all the way back to serial.
        assert_eq!(variant.tier, Tier::Serial);
    }

    #[test]
    fn affine_selects_kepler_when_cuda_alone_is_insufficient() {
        let gap = GapCosts::affine(2, 1).unwrap();
        let cap = CapabilityMask::SERIAL | CapabilityMask::CUDA | CapabilityMask::KEPLER;
        let variant = select_variant(&gap, cap);
        assert_eq!(variant.tier, Tier::KeplerCuda);
    }

    #[test]
    fn resolve_capability_falls_back_on_empty_intersection() {
        // Scenario 1
        let detected = CapabilityMask::SERIAL | CapabilityMask::HASWELL;
        let requested = CapabilityMask::SKYLAKE | CapabilityMask::ICE;
        let resolved = resolve_capability(Some(requested), detected);
        assert_eq!(resolved, CapabilityMask::SERIAL);
    }

    #[test]
    fn requires_unified_memory_tracks_cuda_bit() {
        assert!(requires_unified_memory(CapabilityMask::CUDA));
        assert!(!requires_unified_memory(CapabilityMask::HASWELL));
    }

    #[test]
    fn resolve_capability_honors_explicit_gpu_request() {
        // A caller explicitly requesting `cuda` gets it even though the
        // detector passed in (standing in for the CPU-only detector) never
        // reports GPU bits itself.
        let detected = CapabilityMask::SERIAL | CapabilityMask::HASWELL;
        let resolved = resolve_capability(Some(CapabilityMask::CUDA), detected);
        assert_eq!(resolved, CapabilityMask::CUDA);
    }

    #[test]
    fn resolve_capability_merges_requested_cpu_and_gpu_bits() {
        let detected = CapabilityMask::SERIAL | CapabilityMask::HASWELL;
        let requested = CapabilityMask::HASWELL | CapabilityMask::CUDA;
        let resolved = resolve_capability(Some(requested), detected);
        assert_eq!(resolved, CapabilityMask::HASWELL | CapabilityMask::CUDA);
    }

    #[test]
    fn effective_scope_leaves_non_gpu_capability_default_scope_unchanged() {
        let scope = DeviceScope::Default;
        let resolved = effective_scope(CapabilityMask::HASWELL, &scope);
        assert!(matches!(resolved, DeviceScope::Default));
    }

    #[test]
    fn effective_scope_leaves_non_default_scope_unchanged() {
        let pool_scope = DeviceScope::cpu_cores(2).unwrap();
        let resolved = effective_scope(CapabilityMask::SERIAL, &pool_scope);
        assert!(resolved.is_cpu_pool());
    }
}
