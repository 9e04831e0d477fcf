//! Immediate Execution Backend
//!
//! Encodes each pass into the frame's command encoder the moment it is
//! issued, in exact program order. Level textures are allocated from the
//! recycling pool on demand and handed back explicitly; the backend never
//! reorders or defers anything.

use smallvec::SmallVec;

use super::transient_pool::{TransientTextureDesc, TransientTextureId, TransientTexturePool};
use super::{LevelDesc, PassBackend, PassDesc};
use crate::executor::{self, PassInvocation};
use crate::kernel::BlurKernels;

/// The frame resources the host hands over for immediate execution.
pub struct ImmediateTargets<'f> {
    pub device: &'f wgpu::Device,
    pub encoder: &'f mut wgpu::CommandEncoder,
    /// The frame's color image; read at the start of the sequence and
    /// overwritten in place by the final resolve.
    pub color: &'f wgpu::TextureView,
    /// Scene depth, required only for the depth-of-field blend.
    pub depth: Option<&'f wgpu::TextureView>,
    /// Format of `color`; level textures mirror it.
    pub color_format: wgpu::TextureFormat,
}

/// Handle type of the immediate backend.
///
/// Imported frame targets and pooled level textures are distinct at the type
/// level, which is what lets [`ImmediateBackend::release`] refuse to recycle
/// an image the frame's output still lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImmediateHandle {
    /// The imported color target.
    Color,
    /// The imported depth target.
    Depth,
    /// A pooled level texture.
    Level(TransientTextureId),
}

/// Immediate command-encoder backend.
pub struct ImmediateBackend<'f> {
    targets: ImmediateTargets<'f>,
    kernels: &'f BlurKernels,
    pool: &'f mut TransientTexturePool,
}

impl<'f> ImmediateBackend<'f> {
    /// Wraps the frame's targets for immediate execution.
    pub fn new(
        targets: ImmediateTargets<'f>,
        kernels: &'f BlurKernels,
        pool: &'f mut TransientTexturePool,
    ) -> Self {
        Self {
            targets,
            kernels,
            pool,
        }
    }
}

fn resolve<'v>(
    handle: ImmediateHandle,
    color: &'v wgpu::TextureView,
    depth: Option<&'v wgpu::TextureView>,
    pool: &'v TransientTexturePool,
) -> &'v wgpu::TextureView {
    match handle {
        ImmediateHandle::Color => color,
        ImmediateHandle::Depth => depth.expect("depth handle issued without a depth target"),
        ImmediateHandle::Level(id) => pool.view(id),
    }
}

impl PassBackend for ImmediateBackend<'_> {
    type Handle = ImmediateHandle;

    fn color_target(&self) -> Option<ImmediateHandle> {
        Some(ImmediateHandle::Color)
    }

    fn scene_depth(&self) -> Option<ImmediateHandle> {
        self.targets.depth.map(|_| ImmediateHandle::Depth)
    }

    fn allocate(&mut self, desc: &LevelDesc) -> ImmediateHandle {
        let id = self.pool.allocate(
            self.targets.device,
            &TransientTextureDesc {
                width: desc.width,
                height: desc.height,
                format: self.targets.color_format,
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
                label: desc.label,
            },
        );
        ImmediateHandle::Level(id)
    }

    fn issue(&mut self, pass: PassDesc<ImmediateHandle>) {
        let Self {
            targets,
            kernels,
            pool,
        } = self;
        let color: &wgpu::TextureView = targets.color;
        let depth = targets.depth;

        let reads: SmallVec<[&wgpu::TextureView; 3]> = pass
            .reads
            .iter()
            .map(|h| resolve(*h, color, depth, pool))
            .collect();
        let target = resolve(pass.write, color, depth, pool);

        executor::execute_pass(
            targets.device,
            targets.encoder,
            kernels,
            &PassInvocation {
                label: pass.label,
                kernel: pass.kernel,
                reads: &reads,
                target,
                uniforms: pass.uniforms,
            },
        );
    }

    fn release(&mut self, handle: ImmediateHandle) {
        match handle {
            ImmediateHandle::Level(id) => self.pool.release(id),
            // The color target carries the frame's output and the depth
            // target belongs to the host; neither is ours to recycle.
            ImmediateHandle::Color | ImmediateHandle::Depth => {
                log::debug!("ignoring release of imported frame target {handle:?}");
            }
        }
    }
}
