//! Transient Texture Pool
//!
//! Recycling allocator for the pyramid's frame-scoped level textures.
//! Allocations are valid until released (or until the end-of-frame
//! [`reset`](TransientTexturePool::reset) sweep); released textures return to
//! a free list keyed by their descriptor and are handed back out on the next
//! compatible request instead of being recreated.
//!
//! Level textures are always 2-D, single-sample and single-mip — the pool
//! does not take a sample count or mip count, so a multisampled or mipped
//! level cannot be expressed at all.

use rustc_hash::FxHashMap;

/// Handle to a pooled texture. Valid until released or until the pool is
/// reset at the frame boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransientTextureId(u32);

/// Descriptor for requesting a transient texture.
#[derive(Debug, Clone, Copy)]
pub struct TransientTextureDesc {
    pub width: u32,
    pub height: u32,
    pub format: wgpu::TextureFormat,
    pub usage: wgpu::TextureUsages,
    pub label: &'static str,
}

/// Key for texture recycling. Usage participates deliberately: handing a
/// texture to a pass with usages it was not created with is a GPU validation
/// error.
#[derive(Clone, PartialEq, Eq, Hash)]
struct PoolKey {
    width: u32,
    height: u32,
    format: wgpu::TextureFormat,
    usage: wgpu::TextureUsages,
}

impl PoolKey {
    fn from_desc(desc: &TransientTextureDesc) -> Self {
        Self {
            width: desc.width,
            height: desc.height,
            format: desc.format,
            usage: desc.usage,
        }
    }
}

struct PooledTexture {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    /// Frames spent in the free list without reuse; see [`TransientTexturePool::trim`].
    idle_frames: u32,
}

impl PooledTexture {
    fn new(device: &wgpu::Device, desc: &TransientTextureDesc) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(desc.label),
            size: wgpu::Extent3d {
                width: desc.width,
                height: desc.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: desc.format,
            usage: desc.usage,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            texture,
            view,
            idle_frames: 0,
        }
    }
}

/// GPU texture pool for transient per-frame allocations.
///
/// Slots of released handles are reused, so a handle is only meaningful
/// between its `allocate` and the matching `release`/`reset`.
pub struct TransientTexturePool {
    slots: Vec<Option<PooledTexture>>,
    vacant: Vec<u32>,
    free: FxHashMap<PoolKey, Vec<PooledTexture>>,
}

impl TransientTexturePool {
    /// Creates an empty pool.
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            vacant: Vec::new(),
            free: FxHashMap::default(),
        }
    }

    /// Allocates a texture matching `desc`, reusing a compatible free
    /// texture when one exists.
    pub fn allocate(
        &mut self,
        device: &wgpu::Device,
        desc: &TransientTextureDesc,
    ) -> TransientTextureId {
        let key = PoolKey::from_desc(desc);

        let pooled = match self.free.get_mut(&key).and_then(Vec::pop) {
            Some(mut t) => {
                t.idle_frames = 0;
                t
            }
            None => PooledTexture::new(device, desc),
        };

        if let Some(slot) = self.vacant.pop() {
            self.slots[slot as usize] = Some(pooled);
            TransientTextureId(slot)
        } else {
            let id = TransientTextureId(self.slots.len() as u32);
            self.slots.push(Some(pooled));
            id
        }
    }

    /// The default (full-texture) view of an active allocation.
    ///
    /// # Panics
    ///
    /// Panics if the handle was already released.
    #[must_use]
    #[inline]
    pub fn view(&self, id: TransientTextureId) -> &wgpu::TextureView {
        &self.slots[id.0 as usize]
            .as_ref()
            .expect("transient texture used after release")
            .view
    }

    /// The raw texture of an active allocation.
    #[must_use]
    #[inline]
    pub fn texture(&self, id: TransientTextureId) -> &wgpu::Texture {
        &self.slots[id.0 as usize]
            .as_ref()
            .expect("transient texture used after release")
            .texture
    }

    /// Returns a texture to the free list. Double releases are ignored with
    /// a log message rather than corrupting the free list.
    pub fn release(&mut self, id: TransientTextureId) {
        let Some(pooled) = self.slots[id.0 as usize].take() else {
            log::debug!("transient texture {id:?} released twice");
            return;
        };
        let key = PoolKey {
            width: pooled.texture.width(),
            height: pooled.texture.height(),
            format: pooled.texture.format(),
            usage: pooled.texture.usage(),
        };
        self.free.entry(key).or_default().push(pooled);
        self.vacant.push(id.0);
    }

    /// End-of-frame sweep: anything still active goes back to the free list
    /// and every outstanding handle becomes invalid.
    pub fn reset(&mut self) {
        for slot in 0..self.slots.len() as u32 {
            if self.slots[slot as usize].is_some() {
                self.release(TransientTextureId(slot));
            }
        }
    }

    /// Drops free textures idle for more than `max_idle_frames`. Call after
    /// resolution changes so stale sizes do not pin GPU memory.
    pub fn trim(&mut self, max_idle_frames: u32) {
        for bucket in self.free.values_mut() {
            for t in bucket.iter_mut() {
                t.idle_frames += 1;
            }
            bucket.retain(|t| t.idle_frames <= max_idle_frames);
        }
        self.free.retain(|_, bucket| !bucket.is_empty());
    }

    /// Number of live allocations.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Total textures managed (active and free).
    #[must_use]
    pub fn total_texture_count(&self) -> usize {
        self.active_count() + self.free.values().map(Vec::len).sum::<usize>()
    }
}

impl Default for TransientTexturePool {
    fn default() -> Self {
        Self::new()
    }
}
