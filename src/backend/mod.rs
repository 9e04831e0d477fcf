//! Execution Backends
//!
//! The pass sequencer describes a frame as a series of texture allocations,
//! kernel passes and releases against the narrow [`PassBackend`] interface.
//! The two implementations resolve ordering and resource lifetime at
//! different times:
//!
//! - [`ImmediateBackend`]: encodes GPU commands the moment a pass is issued,
//!   with allocation and release interleaved in program order.
//! - [`FrameGraph`]: records passes and their read/write usage, then
//!   schedules, allocates and releases when executed. Declaration order is a
//!   tie-break, never an assumption.

pub mod graph;
pub mod immediate;
pub mod transient_pool;

pub use graph::{FrameGraph, GraphExecuteContext, GraphHandle, Schedule};
pub use immediate::{ImmediateBackend, ImmediateHandle, ImmediateTargets};
pub use transient_pool::{TransientTextureDesc, TransientTextureId, TransientTexturePool};

use smallvec::SmallVec;

use crate::kernel::{KernelTag, KernelUniforms};

bitflags::bitflags! {
    /// How a pass touches a resource.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct AccessFlags: u8 {
        const READ = 1 << 0;
        const WRITE = 1 << 1;
    }
}

/// Size and label of one frame-scoped level texture.
///
/// Format and usage are not part of the request: the backend derives them
/// from the frame's color target, forcing single-sample, single-mip, no
/// depth bits and no random write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelDesc {
    pub label: &'static str,
    pub width: u32,
    pub height: u32,
}

/// One kernel pass: what it reads, what it writes, and its uniforms.
#[derive(Debug, Clone)]
pub struct PassDesc<H> {
    pub label: &'static str,
    pub kernel: KernelTag,
    /// Inputs in kernel order; each is declared as a read.
    pub reads: SmallVec<[H; 3]>,
    /// The single output image; declared as a write.
    pub write: H,
    pub uniforms: KernelUniforms,
}

/// The contract between the pass sequencer and an execution backend.
///
/// A backend exposes the frame's imported images, creates frame-scoped level
/// textures, accepts passes with their access declarations, and handles
/// release according to its lifetime model. All handles are invalidated at
/// the frame boundary; nothing allocated here outlives the frame.
pub trait PassBackend {
    type Handle: Copy + Eq + std::fmt::Debug;

    /// The frame's color image. Read by the first downsample (and the
    /// depth-of-field copy), overwritten in place by the resolve.
    ///
    /// `None` means the frame has no usable color target and the whole
    /// sequence must be skipped.
    fn color_target(&self) -> Option<Self::Handle>;

    /// The frame's depth image, if the host supplied one. Read-only.
    fn scene_depth(&self) -> Option<Self::Handle>;

    /// Creates a level texture valid for the remainder of the frame.
    fn allocate(&mut self, desc: &LevelDesc) -> Self::Handle;

    /// Issues one pass. Inputs are declared [`AccessFlags::READ`], the
    /// output [`AccessFlags::WRITE`]; each level texture has exactly one
    /// writer across the frame.
    fn issue(&mut self, pass: PassDesc<Self::Handle>);

    /// Releases a level texture after its last use.
    ///
    /// The immediate backend recycles the memory right away and refuses to
    /// recycle imported frame targets; the frame graph ignores the call
    /// entirely because its scheduler owns lifetimes.
    fn release(&mut self, handle: Self::Handle);
}
