//! Error Types
//!
//! Failures are confined to construction time: once [`crate::DualKawaseBlur`]
//! exists, per-frame operation never returns an error — a frame is either
//! processed or skipped wholesale.

use thiserror::Error;

/// The error type for kernel construction.
#[derive(Error, Debug)]
pub enum BlurError {
    /// The WGSL kernel source failed to parse.
    #[error("Failed to parse blur kernel WGSL: {0}")]
    KernelParse(String),

    /// The kernel source parsed but failed module validation.
    #[error("Blur kernel validation failed: {0}")]
    KernelValidation(String),
}

/// Alias for `Result<T, BlurError>`.
pub type Result<T> = std::result::Result<T, BlurError>;
