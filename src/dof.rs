//! Depth-of-Field Compositor
//!
//! Supplies the depth-blend kernel with everything it needs to turn a raw
//! depth-buffer sample into a sharp/blurred mix: the camera linearization
//! constants, the focus parameters, and a pristine copy of the source image
//! captured before the blur overwrites it in place.

use glam::Vec4;
use smallvec::smallvec;

use crate::backend::{LevelDesc, PassBackend, PassDesc};
use crate::frame::FrameCamera;
use crate::kernel::{KernelTag, KernelUniforms};
use crate::settings::DepthOfFieldSettings;

/// Constants for linearizing a depth-buffer sample into view distance:
/// `(near, far, far − near, 1 / far)`.
///
/// The far plane is clamped away from zero so the reciprocal stays finite.
#[must_use]
pub fn camera_linearization_params(near: f32, far: f32) -> Vec4 {
    let far = far.max(1e-6);
    Vec4::new(near, far, far - near, 1.0 / far)
}

/// CPU reference for the kernel's focus ramp: 1.0 at the focus plane,
/// falling to 0.0 over `near_range` in front of it and `far_range` behind,
/// via smoothstep. Keep in sync with `sharpness_weight` in the WGSL module.
#[must_use]
pub fn sharpness_weight(distance: f32, focus: f32, near_range: f32, far_range: f32) -> f32 {
    if distance < focus {
        1.0 - smoothstep(0.0, near_range, focus - distance)
    } else {
        1.0 - smoothstep(0.0, far_range, distance - focus)
    }
}

fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Uniforms for the depth-blend pass.
#[must_use]
pub fn blend_uniforms(camera: &FrameCamera, settings: &DepthOfFieldSettings) -> KernelUniforms {
    KernelUniforms {
        camera_params: camera_linearization_params(camera.near, camera.far).to_array(),
        focus_distance: settings.focus_distance(),
        near_range: settings.near_range(),
        far_range: settings.far_range(),
        ..Default::default()
    }
}

/// Captures the untouched source image into a dedicated texture. Must run
/// before the first downsample reads (and the resolve overwrites) the color
/// target.
pub(crate) fn record_copy_original<B: PassBackend>(
    backend: &mut B,
    color: B::Handle,
    width: u32,
    height: u32,
) -> B::Handle {
    let original = backend.allocate(&LevelDesc {
        label: "blur_original",
        width,
        height,
    });
    backend.issue(PassDesc {
        label: "Copy Original",
        kernel: KernelTag::Copy,
        reads: smallvec![color],
        write: original,
        uniforms: KernelUniforms::default(),
    });
    original
}

/// Issues the fused blend: `{original, blurred, depth}` → destination.
pub(crate) fn record_depth_blend<B: PassBackend>(
    backend: &mut B,
    original: B::Handle,
    blurred: B::Handle,
    depth: B::Handle,
    destination: B::Handle,
    camera: &FrameCamera,
    settings: &DepthOfFieldSettings,
) {
    backend.issue(PassDesc {
        label: "Depth of Field Blend",
        kernel: KernelTag::DepthBlend,
        reads: smallvec![original, blurred, depth],
        write: destination,
        uniforms: blend_uniforms(camera, settings),
    });
}
