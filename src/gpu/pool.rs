//! Offscreen texture pool for mask/matte sub-passes.
//!
//! Unlike the teacher's `TransientTexturePool` (which never destroys
//! textures and only trims idle ones on request), this pool enforces a
//! hard size cap: mask/matte nesting depth is attacker-influenced (an
//! animation with deep precomp/matte chains), so an unbounded pool would
//! let a malformed scene exhaust GPU memory. Eviction is true
//! least-recently-used once the cap is reached, not idle-frame based.

use rustc_hash::FxHashMap;

/// Identifies one texture checked out of the pool. Valid until
/// [`TexturePool::release`] is called with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PooledTextureId(u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct PoolKey {
    width: u32,
    height: u32,
    format: wgpu::TextureFormat,
}

struct Entry {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    key: PoolKey,
    last_used: u64,
}

/// Acquire/release-by-`(width, height, format)` texture pool with a hard
/// capacity and LRU eviction. All releases are synchronous: every executor
/// pass is a synchronous command-buffer submission, so a texture handed
/// back after `release` is immediately safe to reissue (see §5,
/// Shared-resource policy).
pub struct TexturePool {
    capacity: usize,
    clock: u64,
    active: FxHashMap<u32, Entry>,
    free: FxHashMap<PoolKey, Vec<Entry>>,
    next_id: u32,
}

impl TexturePool {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self { capacity, clock: 0, active: FxHashMap::default(), free: FxHashMap::default(), next_id: 0 }
    }

    /// Acquires a texture of the given size/format, reusing a freed one
    /// when available. `usage` must match what the caller will bind it
    /// for (render target + sampled, or storage + sampled).
    pub fn acquire(&mut self, device: &wgpu::Device, label: &'static str, width: u32, height: u32, format: wgpu::TextureFormat, usage: wgpu::TextureUsages) -> PooledTextureId {
        let key = PoolKey { width, height, format };
        self.clock += 1;

        let entry = if let Some(bucket) = self.free.get_mut(&key) {
            bucket.pop()
        } else {
            None
        };

        let entry = entry.unwrap_or_else(|| {
            self.evict_if_over_capacity(device);
            let texture = device.create_texture(&wgpu::TextureDescriptor {
                label: Some(label),
                size: wgpu::Extent3d { width, height, depth_or_array_layers: 1 },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format,
                usage,
                view_formats: &[],
            });
            let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
            Entry { texture, view, key, last_used: self.clock }
        });

        let id = self.next_id;
        self.next_id += 1;
        self.active.insert(id, entry);
        PooledTextureId(id)
    }

    #[must_use]
    pub fn texture(&self, id: PooledTextureId) -> &wgpu::Texture {
        &self.active[&id.0].texture
    }

    #[must_use]
    pub fn view(&self, id: PooledTextureId) -> &wgpu::TextureView {
        &self.active[&id.0].view
    }

    /// Returns the texture to the free pool, tagged with the current
    /// acquisition clock so the next cap-driven eviction prefers it.
    pub fn release(&mut self, id: PooledTextureId) {
        if let Some(mut entry) = self.active.remove(&id.0) {
            entry.last_used = self.clock;
            self.free.entry(entry.key).or_default().push(entry);
        }
    }

    fn evict_if_over_capacity(&mut self, _device: &wgpu::Device) {
        let total = self.active.len() + self.free.values().map(Vec::len).sum::<usize>();
        if total < self.capacity {
            return;
        }
        // Evict the single least-recently-used free entry across all
        // buckets. Active textures are never evicted mid-pass.
        let mut lru: Option<(PoolKey, usize, u64)> = None;
        for (key, bucket) in &self.free {
            for (i, entry) in bucket.iter().enumerate() {
                if lru.is_none_or(|(_, _, t)| entry.last_used < t) {
                    lru = Some((*key, i, entry.last_used));
                }
            }
        }
        if let Some((key, idx, _)) = lru {
            if let Some(bucket) = self.free.get_mut(&key) {
                bucket.remove(idx);
                if bucket.is_empty() {
                    self.free.remove(&key);
                }
            }
        }
    }

    #[must_use]
    pub fn total_texture_count(&self) -> usize {
        self.active.len() + self.free.values().map(Vec::len).sum::<usize>()
    }
}
