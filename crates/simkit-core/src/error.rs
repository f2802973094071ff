//! Status codes and error reporting.
//!
//! A C ABI boundary returns a numeric status code plus an optional
//! diagnostic string pointer. In safe Rust that collapses to a
//! single `Result<T, SimkitError>` — each variant below carries its own
//! default diagnostic via `Display`, which kernels are free to override
//! with a more specific message.

use thiserror::Error;

/// Every failure mode a factory or kernel call can report.
///
/// There is deliberately no `Success` variant: success is `Ok(_)`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SimkitError {
    #[error("allocation failed")]
    BadAlloc,

    #[error("invalid UTF-8 in input at byte offset {0}")]
    InvalidUtf8(usize),

    #[error("input contains duplicate entries: {0}")]
    ContainsDuplicates(String),

    #[error("computation would overflow its output type")]
    OverflowRisk,

    #[error("requested dimension count is invalid: {0}")]
    UnexpectedDimensions(String),

    #[error("no GPU backend is available: {0}")]
    MissingGpu(String),

    #[error("device-code mismatch: engine capability does not match device scope")]
    DeviceCodeMismatch,

    #[error("device-memory mismatch: engine requires unified-memory-backed input")]
    DeviceMemoryMismatch,

    #[error("invalid value: {0}")]
    ValueError(String),

    #[error("unknown error: {0}")]
    Unknown(String),
}

/// Numeric status code, stable across a process's lifetime. Values are
/// implementation-defined but each variant's code is distinct and never
/// reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum StatusCode {
    Success = 0,
    BadAlloc = 1,
    InvalidUtf8 = 2,
    ContainsDuplicates = 3,
    OverflowRisk = 4,
    UnexpectedDimensions = 5,
    MissingGpu = 6,
    DeviceCodeMismatch = 7,
    DeviceMemoryMismatch = 8,
    ValueError = 9,
    Unknown = 10,
}

impl SimkitError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            SimkitError::BadAlloc => StatusCode::BadAlloc,
            SimkitError::InvalidUtf8(_) => StatusCode::InvalidUtf8,
            SimkitError::ContainsDuplicates(_) => StatusCode::ContainsDuplicates,
            SimkitError::OverflowRisk => StatusCode::OverflowRisk,
            SimkitError::UnexpectedDimensions(_) => StatusCode::UnexpectedDimensions,
            SimkitError::MissingGpu(_) => StatusCode::MissingGpu,
            SimkitError::DeviceCodeMismatch => StatusCode::DeviceCodeMismatch,
            SimkitError::DeviceMemoryMismatch => StatusCode::DeviceMemoryMismatch,
            SimkitError::ValueError(_) => StatusCode::ValueError,
            SimkitError::Unknown(_) => StatusCode::Unknown,
        }
    }
}
