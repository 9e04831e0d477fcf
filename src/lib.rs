#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

//! Dual-Kawase blur and depth-of-field post-processing for wgpu.
//!
//! The pipeline blurs the frame's color image with a chain of half-resolution
//! downsample passes followed by upsample passes (dual-Kawase), then either
//! resolves the blurred result back into the color target or blends it with
//! the sharp original according to per-pixel scene depth.
//!
//! Two execution backends are supported behind one narrow interface:
//!
//! - [`backend::ImmediateBackend`] issues GPU commands in program order and
//!   releases each level texture explicitly.
//! - [`backend::FrameGraph`] records passes with their read/write resource
//!   usage, then schedules, allocates and releases on its own.
//!
//! The entry point is [`DualKawaseBlur`], driven once per frame by the host
//! renderer.

pub mod backend;
pub mod dof;
pub mod errors;
pub mod executor;
pub mod frame;
pub mod kernel;
pub mod pyramid;
pub mod sequencer;
pub mod settings;

pub use backend::{
    AccessFlags, FrameGraph, GraphExecuteContext, ImmediateBackend, ImmediateTargets, LevelDesc,
    PassBackend, PassDesc, TransientTexturePool,
};
pub use errors::{BlurError, Result};
pub use frame::{CameraKind, FrameCamera, FrameDesc};
pub use kernel::{BlurKernels, KernelTag, KernelUniforms};
pub use pyramid::{LevelExtent, MAX_PYRAMID_LEVELS};
pub use sequencer::DualKawaseBlur;
pub use settings::{DepthOfFieldSettings, DualKawaseSettings};
