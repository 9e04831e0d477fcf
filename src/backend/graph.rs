//! Declarative Frame-Graph Backend
//!
//! Recording and execution are split: during recording the graph only
//! collects passes and their read/write resource usage; at execution it
//! derives a dependency-valid pass order, opens each transient texture's
//! lifetime at its first scheduled use and closes it at the last, and encodes
//! the passes. Declaration order is never assumed to be execution order — it
//! only breaks ties between independent passes so schedules stay
//! deterministic.
//!
//! ```text
//! import_color / import_depth        (host, once per frame)
//!        │
//!        ▼
//! allocate / issue                   (recording, via PassBackend)
//!        │
//!        ▼
//! compile → topological order + lifetimes
//!        │
//!        ▼
//! execute → pooled allocation, pass encoding, release
//! ```

use smallvec::SmallVec;

use super::transient_pool::{TransientTextureDesc, TransientTextureId, TransientTexturePool};
use super::{AccessFlags, LevelDesc, PassBackend, PassDesc};
use crate::executor::{self, PassInvocation};
use crate::kernel::BlurKernels;

/// Logical handle to a graph resource. Valid for the frame being recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GraphHandle(u32);

#[derive(Debug, Clone, Copy)]
enum GraphResource {
    /// The frame's color image, bound at execution time.
    ImportedColor,
    /// The frame's depth image, bound at execution time.
    ImportedDepth,
    /// A level texture the scheduler materializes from the pool.
    Transient(LevelDesc),
}

/// Everything execution needs from the host.
pub struct GraphExecuteContext<'f> {
    pub device: &'f wgpu::Device,
    pub encoder: &'f mut wgpu::CommandEncoder,
    pub kernels: &'f BlurKernels,
    /// The view backing the imported color handle.
    pub color: &'f wgpu::TextureView,
    /// The view backing the imported depth handle, if one was imported.
    pub depth: Option<&'f wgpu::TextureView>,
    /// Format of `color`; transient textures mirror it.
    pub color_format: wgpu::TextureFormat,
}

/// A compiled execution plan: pass order plus per-resource lifetimes.
pub struct Schedule {
    order: Vec<usize>,
    /// Per-resource `(first_use, last_use)` positions within `order`;
    /// `None` for imported or unused resources.
    lifetimes: Vec<Option<(usize, usize)>>,
}

impl Schedule {
    /// Pass indices in execution order.
    #[must_use]
    pub fn order(&self) -> &[usize] {
        &self.order
    }

    /// Scheduled lifetime of a transient resource, as positions into
    /// [`order`](Self::order).
    #[must_use]
    pub fn lifetime(&self, handle: GraphHandle) -> Option<(usize, usize)> {
        self.lifetimes.get(handle.0 as usize).copied().flatten()
    }
}

/// Frame graph that schedules passes and owns transient texture lifetimes.
///
/// The graph is reusable: frame state (imports, resources, passes) is
/// cleared by [`execute`](Self::execute) or [`reset`](Self::reset), while the
/// texture pool persists so levels are recycled across frames.
pub struct FrameGraph {
    resources: Vec<GraphResource>,
    passes: Vec<PassDesc<GraphHandle>>,
    color: Option<GraphHandle>,
    depth: Option<GraphHandle>,
    pool: TransientTexturePool,
}

impl FrameGraph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self {
            resources: Vec::new(),
            passes: Vec::new(),
            color: None,
            depth: None,
            pool: TransientTexturePool::new(),
        }
    }

    fn push_resource(&mut self, resource: GraphResource) -> GraphHandle {
        let handle = GraphHandle(self.resources.len() as u32);
        self.resources.push(resource);
        handle
    }

    /// Imports the frame's color image. Must be called before recording;
    /// without it the sequencer sees no color target and skips the frame.
    pub fn import_color(&mut self) -> GraphHandle {
        let handle = self.push_resource(GraphResource::ImportedColor);
        self.color = Some(handle);
        handle
    }

    /// Imports the frame's depth image.
    pub fn import_depth(&mut self) -> GraphHandle {
        let handle = self.push_resource(GraphResource::ImportedDepth);
        self.depth = Some(handle);
        handle
    }

    /// Number of recorded passes.
    #[must_use]
    pub fn pass_count(&self) -> usize {
        self.passes.len()
    }

    /// Discards all frame state without executing. The texture pool is kept.
    pub fn reset(&mut self) {
        self.resources.clear();
        self.passes.clear();
        self.color = None;
        self.depth = None;
        self.pool.reset();
    }

    /// Drops pooled textures idle for more than `max_idle_frames`; call
    /// after resolution changes.
    pub fn trim(&mut self, max_idle_frames: u32) {
        self.pool.trim(max_idle_frames);
    }

    /// Derives a dependency-valid execution order and resource lifetimes
    /// from the recorded read/write declarations.
    #[must_use]
    pub fn compile(&self) -> Schedule {
        let n = self.passes.len();
        let mut succ: Vec<SmallVec<[usize; 4]>> = vec![SmallVec::new(); n];
        let mut indegree = vec![0usize; n];

        fn add_edge(
            succ: &mut [SmallVec<[usize; 4]>],
            indegree: &mut [usize],
            from: usize,
            to: usize,
        ) {
            if from != to && !succ[from].contains(&to) {
                succ[from].push(to);
                indegree[to] += 1;
            }
        }

        // Replay the declarations to recover the dataflow: a read depends on
        // the resource's writer, a write waits for the previous version's
        // readers (and writer).
        struct ResourceState {
            last_writer: Option<usize>,
            readers_since_write: SmallVec<[usize; 4]>,
        }
        let mut states: Vec<ResourceState> = (0..self.resources.len())
            .map(|_| ResourceState {
                last_writer: None,
                readers_since_write: SmallVec::new(),
            })
            .collect();

        for (p, pass) in self.passes.iter().enumerate() {
            for (handle, access) in pass_accesses(pass) {
                let state = &mut states[handle.0 as usize];
                if access.contains(AccessFlags::READ) {
                    if let Some(w) = state.last_writer {
                        add_edge(&mut succ, &mut indegree, w, p);
                    }
                    state.readers_since_write.push(p);
                }
                if access.contains(AccessFlags::WRITE) {
                    if let Some(w) = state.last_writer {
                        add_edge(&mut succ, &mut indegree, w, p);
                        if matches!(
                            self.resources[handle.0 as usize],
                            GraphResource::Transient(_)
                        ) {
                            log::warn!(
                                "transient resource {handle:?} has more than one writer"
                            );
                        }
                    }
                    for i in 0..state.readers_since_write.len() {
                        let r = state.readers_since_write[i];
                        add_edge(&mut succ, &mut indegree, r, p);
                    }
                    state.last_writer = Some(p);
                    state.readers_since_write.clear();
                }
            }
        }

        // Kahn's algorithm; among ready passes the lowest declaration index
        // runs first, keeping schedules deterministic.
        let mut order = Vec::with_capacity(n);
        let mut ready: Vec<usize> = (0..n).filter(|&i| indegree[i] == 0).collect();
        while !ready.is_empty() {
            let (slot, _) = ready
                .iter()
                .enumerate()
                .min_by_key(|&(_, &idx)| idx)
                .expect("ready set is non-empty");
            let next = ready.swap_remove(slot);
            order.push(next);
            for i in 0..succ[next].len() {
                let s = succ[next][i];
                indegree[s] -= 1;
                if indegree[s] == 0 {
                    ready.push(s);
                }
            }
        }

        if order.len() != n {
            log::error!("recorded passes form a dependency cycle; using declaration order");
            order = (0..n).collect();
        }

        // Lifetimes in scheduled positions: first touch opens, last closes.
        let mut lifetimes: Vec<Option<(usize, usize)>> = vec![None; self.resources.len()];
        for (pos, &pass_idx) in order.iter().enumerate() {
            for (handle, _) in pass_accesses(&self.passes[pass_idx]) {
                if !matches!(
                    self.resources[handle.0 as usize],
                    GraphResource::Transient(_)
                ) {
                    continue;
                }
                let entry = &mut lifetimes[handle.0 as usize];
                *entry = match *entry {
                    None => Some((pos, pos)),
                    Some((first, last)) => Some((first.min(pos), last.max(pos))),
                };
            }
        }

        Schedule { order, lifetimes }
    }

    /// Compiles and encodes the recorded frame, then clears frame state.
    ///
    /// Transient textures are taken from the pool when their scheduled
    /// lifetime opens and returned when it closes, so two levels with
    /// disjoint lifetimes and matching descriptors share physical memory.
    pub fn execute(&mut self, ctx: GraphExecuteContext<'_>) {
        let schedule = self.compile();
        let mut physical: Vec<Option<TransientTextureId>> = vec![None; self.resources.len()];

        for (pos, &pass_idx) in schedule.order.iter().enumerate() {
            // Open lifetimes starting at this position.
            for (res_idx, lifetime) in schedule.lifetimes.iter().enumerate() {
                if let (Some((first, _)), GraphResource::Transient(desc)) =
                    (lifetime, self.resources[res_idx])
                {
                    if *first == pos {
                        physical[res_idx] = Some(self.pool.allocate(
                            ctx.device,
                            &TransientTextureDesc {
                                width: desc.width,
                                height: desc.height,
                                format: ctx.color_format,
                                usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                                    | wgpu::TextureUsages::TEXTURE_BINDING,
                                label: desc.label,
                            },
                        ));
                    }
                }
            }

            let pass = &self.passes[pass_idx];
            let reads: Option<SmallVec<[&wgpu::TextureView; 3]>> = pass
                .reads
                .iter()
                .map(|h| {
                    resolve_view(*h, &self.resources, &physical, &self.pool, ctx.color, ctx.depth)
                })
                .collect();
            let target = resolve_view(
                pass.write,
                &self.resources,
                &physical,
                &self.pool,
                ctx.color,
                ctx.depth,
            );

            if let (Some(reads), Some(target)) = (reads, target) {
                ctx.encoder.push_debug_group(pass.label);
                executor::execute_pass(
                    ctx.device,
                    ctx.encoder,
                    ctx.kernels,
                    &PassInvocation {
                        label: pass.label,
                        kernel: pass.kernel,
                        reads: &reads,
                        target,
                        uniforms: pass.uniforms,
                    },
                );
                ctx.encoder.pop_debug_group();
            } else {
                log::error!("pass '{}' references an unbound frame image; skipped", pass.label);
            }

            // Close lifetimes ending at this position.
            for (res_idx, lifetime) in schedule.lifetimes.iter().enumerate() {
                if let Some((_, last)) = lifetime {
                    if *last == pos {
                        if let Some(id) = physical[res_idx].take() {
                            self.pool.release(id);
                        }
                    }
                }
            }
        }

        self.reset();
    }
}

impl Default for FrameGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl PassBackend for FrameGraph {
    type Handle = GraphHandle;

    fn color_target(&self) -> Option<GraphHandle> {
        self.color
    }

    fn scene_depth(&self) -> Option<GraphHandle> {
        self.depth
    }

    fn allocate(&mut self, desc: &LevelDesc) -> GraphHandle {
        self.push_resource(GraphResource::Transient(*desc))
    }

    fn issue(&mut self, pass: PassDesc<GraphHandle>) {
        self.passes.push(pass);
    }

    fn release(&mut self, _handle: GraphHandle) {
        // Lifetimes belong to the scheduler; an explicit release carries no
        // information it does not already have.
    }
}

fn resolve_view<'v>(
    handle: GraphHandle,
    resources: &'v [GraphResource],
    physical: &'v [Option<TransientTextureId>],
    pool: &'v TransientTexturePool,
    color: &'v wgpu::TextureView,
    depth: Option<&'v wgpu::TextureView>,
) -> Option<&'v wgpu::TextureView> {
    match resources[handle.0 as usize] {
        GraphResource::ImportedColor => Some(color),
        GraphResource::ImportedDepth => depth,
        GraphResource::Transient(_) => physical[handle.0 as usize].map(|id| pool.view(id)),
    }
}

/// Per-resource access set of a pass: reads flagged `READ`, the output
/// flagged `WRITE`, duplicates merged.
fn pass_accesses(pass: &PassDesc<GraphHandle>) -> SmallVec<[(GraphHandle, AccessFlags); 4]> {
    let mut uses: SmallVec<[(GraphHandle, AccessFlags); 4]> = SmallVec::new();
    let mut merge = |handle: GraphHandle, flags: AccessFlags| {
        if let Some(entry) = uses.iter_mut().find(|(h, _)| *h == handle) {
            entry.1 |= flags;
        } else {
            uses.push((handle, flags));
        }
    };
    for &read in &pass.reads {
        merge(read, AccessFlags::READ);
    }
    merge(pass.write, AccessFlags::WRITE);
    uses
}
