//! GPU presence probing and scope construction. `gpu_device(id)` is
//! constructible only if the `cuda` capability is present.
//!
//! Real device enumeration is the excluded "actual GPU driver bindings"
//! non-goal; this probe reads an explicit environment opt-in
//! instead of touching a driver, so the rest of the `gpu_device` contract
//! (capability gating, `missing_gpu` on absence) still has a genuine,
//! testable implementation.

use std::sync::Arc;

use simkit_core::{CapabilityMask, DeviceScope, SimkitError};

use crate::executor::RayonGpuExecutor;

const ENV_VAR: &str = "SIMKIT_GPU_TIER";

/// Reads `SIMKIT_GPU_TIER` (`"cuda"`, `"kepler"`, or `"hopper"`) and returns
/// the corresponding capability bit, or `None` if unset/unrecognized —
/// standing in for hardware enumeration a real driver backend would do.
pub fn detect_gpu_capability() -> Option<CapabilityMask> {
    let tier = std::env::var(ENV_VAR).ok()?;
    match tier.as_str() {
        "cuda" => Some(CapabilityMask::CUDA),
        "kepler" => Some(CapabilityMask::CUDA | CapabilityMask::KEPLER),
        "hopper" => Some(CapabilityMask::CUDA | CapabilityMask::KEPLER | CapabilityMask::HOPPER),
        _ => None,
    }
}

/// Builds a `gpu_device(id)` scope. Fails with `missing_gpu` when no GPU
/// capability was detected, the constructibility precondition.
pub fn gpu_device(id: usize) -> Result<DeviceScope, SimkitError> {
    let capability = detect_gpu_capability().ok_or_else(|| {
        SimkitError::MissingGpu(format!(
            "no GPU detected (set {ENV_VAR} to opt in for testing)"
        ))
    })?;
    let executor = Arc::new(RayonGpuExecutor::new(id, capability));
    Ok(DeviceScope::gpu_device(id, executor))
}
