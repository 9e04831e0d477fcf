//! Dual-Kawase Blur Pass Sequencer
//!
//! [`DualKawaseBlur`] is the feature object a host renderer keeps for the
//! lifetime of its pipeline and drives once per frame, through either the
//! immediate path ([`execute`](DualKawaseBlur::execute)) or the frame-graph
//! path ([`record`](DualKawaseBlur::record)). Both funnel into [`sequence`],
//! which walks the three phases — downsample, upsample, resolve — against
//! whatever [`PassBackend`] it is handed.
//!
//! A frame is processed completely or not at all: construction failure,
//! a non-game camera, or a missing color target skip the whole sequence and
//! leave the host's buffers untouched.

use smallvec::{SmallVec, smallvec};

use crate::backend::{
    FrameGraph, ImmediateBackend, ImmediateTargets, LevelDesc, PassBackend, PassDesc,
    TransientTexturePool,
};
use crate::dof;
use crate::frame::FrameDesc;
use crate::kernel::{BlurKernels, KernelTag, KernelUniforms};
use crate::pyramid::{self, MAX_PYRAMID_LEVELS, PYRAMID_LEVELS};
use crate::settings::DualKawaseSettings;

/// Dual-Kawase blur + depth-of-field feature.
pub struct DualKawaseBlur {
    settings: DualKawaseSettings,
    /// `None` when kernel construction failed; the feature is then inert for
    /// its whole lifetime.
    kernels: Option<BlurKernels>,
    /// Level textures for the immediate path. The frame-graph path brings
    /// its own pool.
    pool: TransientTexturePool,
}

impl DualKawaseBlur {
    /// Builds the feature, compiling the kernel program for `color_format`.
    ///
    /// Kernel failure is not fatal: the instance is created anyway and every
    /// per-frame call becomes a no-op, so the host renders without the
    /// effect instead of crashing.
    #[must_use]
    pub fn new(
        device: &wgpu::Device,
        color_format: wgpu::TextureFormat,
        settings: DualKawaseSettings,
    ) -> Self {
        let kernels = match BlurKernels::new(device, color_format) {
            Ok(kernels) => Some(kernels),
            Err(err) => {
                log::warn!("blur kernels unavailable, effect disabled: {err}");
                None
            }
        };
        Self {
            settings,
            kernels,
            pool: TransientTexturePool::new(),
        }
    }

    /// Builds a permanently inert instance, exactly as if kernel
    /// construction had failed: every per-frame call is a no-op.
    #[must_use]
    pub fn inert(settings: DualKawaseSettings) -> Self {
        Self {
            settings,
            kernels: None,
            pool: TransientTexturePool::new(),
        }
    }

    /// Whether the kernel program is available.
    #[inline]
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.kernels.is_some()
    }

    /// The compiled kernel program, needed by [`FrameGraph::execute`].
    #[inline]
    #[must_use]
    pub fn kernels(&self) -> Option<&BlurKernels> {
        self.kernels.as_ref()
    }

    /// Read access to the settings.
    #[inline]
    #[must_use]
    pub fn settings(&self) -> &DualKawaseSettings {
        &self.settings
    }

    /// Mutable access to the settings.
    #[inline]
    pub fn settings_mut(&mut self) -> &mut DualKawaseSettings {
        &mut self.settings
    }

    /// Drops pooled immediate-path textures idle for more than
    /// `max_idle_frames`; call after resolution changes.
    pub fn trim(&mut self, max_idle_frames: u32) {
        self.pool.trim(max_idle_frames);
    }

    /// Immediate path: encodes the whole frame's pass sequence into the
    /// host's command encoder, in program order.
    pub fn execute(&mut self, frame: &FrameDesc, targets: ImmediateTargets<'_>) {
        let Some(kernels) = self.kernels.as_ref() else {
            log::trace!("blur kernels unavailable; frame untouched");
            return;
        };
        let mut backend = ImmediateBackend::new(targets, kernels, &mut self.pool);
        sequence(&self.settings, frame, &mut backend);
    }

    /// Frame-graph path: records the frame's passes and their resource
    /// usage into `graph`. The host executes the graph afterwards with
    /// [`FrameGraph::execute`], passing [`Self::kernels`].
    pub fn record(&self, frame: &FrameDesc, graph: &mut FrameGraph) {
        if self.kernels.is_none() {
            log::trace!("blur kernels unavailable; nothing recorded");
            return;
        }
        sequence(&self.settings, frame, graph);
    }
}

/// Drives one frame's pass sequence against a backend.
///
/// Pass structure for `iterations = n` (depth of field on):
///
/// ```text
/// Copy Original:  color                   → original
/// Downsample i:   color | down[i-1]       → down[i]      (i = 0..n)
/// Upsample i:     down[n-1] | up[i+1]     → up[i]        (i = n-2..=0)
/// Depth Blend:    original, up[0], depth  → color
/// ```
///
/// With depth of field off the final pass is a same-size upsample resolve of
/// the blurred result into the color target. With `iterations = 1` there are
/// no up levels; the single down output feeds the resolve directly.
pub fn sequence<B: PassBackend>(
    settings: &DualKawaseSettings,
    frame: &FrameDesc,
    backend: &mut B,
) {
    if !frame.camera.kind.is_game() {
        log::trace!("skipping {:?} camera frame", frame.camera.kind);
        return;
    }
    let Some(color) = backend.color_target() else {
        log::trace!("skipping frame without a color target");
        return;
    };

    let iterations = pyramid::clamp_iterations(settings.iterations());
    let levels = pyramid::plan(frame.width, frame.height, settings.downscale(), iterations);
    let offset = settings.blur_radius();

    let depth = backend.scene_depth();
    let dof_active = settings.depth_of_field.enabled && depth.is_some();
    if settings.depth_of_field.enabled && depth.is_none() {
        log::trace!("depth of field enabled but the frame has no depth image");
    }

    // The blur overwrites the color image in place; the blend needs the
    // sharp version too, so capture it before the first downsample.
    let original = dof_active
        .then(|| dof::record_copy_original(backend, color, frame.width, frame.height));

    // =====================================================================
    // Phase 1: Downsample — color → down[0] → … → down[n-1]
    // =====================================================================
    let mut down_levels: SmallVec<[B::Handle; MAX_PYRAMID_LEVELS]> = SmallVec::new();
    let mut up_levels: SmallVec<[B::Handle; MAX_PYRAMID_LEVELS]> = SmallVec::new();
    let mut last_down = color;

    for (i, extent) in levels.iter().enumerate() {
        let slot = &PYRAMID_LEVELS[i];
        let down = backend.allocate(&LevelDesc {
            label: slot.down,
            width: extent.width,
            height: extent.height,
        });
        backend.issue(PassDesc {
            label: slot.down,
            kernel: KernelTag::Downsample,
            reads: smallvec![last_down],
            write: down,
            uniforms: KernelUniforms::for_blur(offset),
        });
        last_down = down;

        // The matching up level is declared here, before the next level's
        // pass dependencies are recorded.
        if i + 1 < iterations {
            up_levels.push(backend.allocate(&LevelDesc {
                label: slot.up,
                width: extent.width,
                height: extent.height,
            }));
        }
        down_levels.push(down);
    }

    // =====================================================================
    // Phase 2: Upsample — walk back up, seeded by the deepest down output
    // =====================================================================
    let mut last_up = last_down;
    for i in (0..iterations - 1).rev() {
        let up = up_levels[i];
        backend.issue(PassDesc {
            label: PYRAMID_LEVELS[i].up,
            kernel: KernelTag::Upsample,
            reads: smallvec![last_up],
            write: up,
            uniforms: KernelUniforms::for_blur(offset),
        });
        last_up = up;
    }

    // =====================================================================
    // Phase 3: Resolve — back into the color target, in place
    // =====================================================================
    match original {
        Some(original) => {
            let depth = depth.expect("depth image present while depth of field is active");
            dof::record_depth_blend(
                backend,
                original,
                last_up,
                depth,
                color,
                &frame.camera,
                &settings.depth_of_field,
            );
        }
        None => {
            backend.issue(PassDesc {
                label: "Dual Kawase Resolve",
                kernel: KernelTag::Upsample,
                reads: smallvec![last_up],
                write: color,
                uniforms: KernelUniforms::for_blur(offset),
            });
        }
    }

    // Release in downsample order. `last_up` is what the resolve just read,
    // so it must outlive every other level and goes last.
    for &down in &down_levels {
        if down != last_up {
            backend.release(down);
        }
    }
    for &up in &up_levels {
        if up != last_up {
            backend.release(up);
        }
    }
    if let Some(original) = original {
        backend.release(original);
    }
    backend.release(last_up);
}
