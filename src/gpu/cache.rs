//! GPU-side path caches (§4.9): one immutable index buffer per [`PathId`]
//! with vertex data re-uploaded from a reusable ring each sample (paths
//! can be keyframed), and an LRU rasterization cache keyed by a path +
//! transform fingerprint.

use std::num::NonZeroU64;

use rustc_hash::FxHashMap;
use xxhash_rust::xxh3::xxh3_64;

use crate::math::Mat2D;
use crate::path::{PathId, PathRegistry};

struct PathGpuEntry {
    index_buffer: wgpu::Buffer,
    index_count: u32,
    vertex_buffer: wgpu::Buffer,
    vertex_capacity: u64,
}

/// One immutable index buffer plus a resizable vertex buffer per
/// [`PathId`], built lazily on first reference and reused across frames.
/// Vertex contents are rewritten via `queue.write_buffer` every time the
/// path is sampled at a new frame; only a resize allocates.
pub struct PathGpuCache {
    entries: FxHashMap<PathId, PathGpuEntry>,
}

impl PathGpuCache {
    #[must_use]
    pub fn new() -> Self {
        Self { entries: FxHashMap::default() }
    }

    /// Ensures a GPU-side entry exists for `id`, uploads `positions`
    /// (flattened `[x,y,...]`, already sampled for the current frame) into
    /// its vertex buffer, and returns `(vertex_buffer, index_buffer,
    /// index_count)`.
    pub fn upload(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, registry: &PathRegistry, id: PathId, positions: &[f32]) -> (&wgpu::Buffer, &wgpu::Buffer, u32) {
        let needed_bytes = (positions.len() * std::mem::size_of::<f32>()) as u64;

        let entry = self.entries.entry(id).or_insert_with(|| {
            let resource = registry.lookup(id).expect("path referenced by a command must be registered");
            let indices = resource.indices();
            let index_buffer = device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("motif-path-index"),
                size: (indices.len() * std::mem::size_of::<u32>()) as u64,
                usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });
            queue.write_buffer(&index_buffer, 0, bytemuck::cast_slice(indices));

            let vertex_capacity = needed_bytes.max(64);
            let vertex_buffer = device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("motif-path-vertex"),
                size: vertex_capacity,
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });

            PathGpuEntry { index_buffer, index_count: indices.len() as u32, vertex_buffer, vertex_capacity }
        });

        if needed_bytes > entry.vertex_capacity {
            entry.vertex_buffer = device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("motif-path-vertex"),
                size: needed_bytes,
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });
            entry.vertex_capacity = needed_bytes;
        }
        queue.write_buffer(&entry.vertex_buffer, 0, bytemuck::cast_slice(positions));

        (&entry.vertex_buffer, &entry.index_buffer, entry.index_count)
    }
}

impl Default for PathGpuCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Key for the rasterization cache: a path content fingerprint plus a
/// transform fingerprint rounded to a fixed precision, so that
/// sub-pixel-jittering transforms across frames still hit the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct RasterKey {
    path_fingerprint: u64,
    transform_fingerprint: u64,
}

const TRANSFORM_ROUNDING: f32 = 256.0;

fn fingerprint_transform(m: Mat2D) -> u64 {
    let rounded = [m.a, m.b, m.c, m.d, m.tx, m.ty].map(|v| (v * TRANSFORM_ROUNDING).round() as i64);
    xxh3_64(bytemuck::cast_slice(&rounded))
}

fn fingerprint_positions(positions: &[f32]) -> u64 {
    xxh3_64(bytemuck::cast_slice(positions))
}

struct RasterEntry<V> {
    value: V,
    last_used: u64,
}

/// LRU cache for rasterized mask/shape coverage, capped by entry count
/// (not by memory size: entries are cheap handles, e.g. a
/// [`super::pool::PooledTextureId`], not the texture data itself).
pub struct RasterCache<V> {
    capacity: usize,
    clock: u64,
    entries: FxHashMap<RasterKey, RasterEntry<V>>,
}

impl<V> RasterCache<V> {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self { capacity, clock: 0, entries: FxHashMap::default() }
    }

    pub fn get(&mut self, path_positions: &[f32], transform: Mat2D) -> Option<&V> {
        self.clock += 1;
        let key = RasterKey { path_fingerprint: fingerprint_positions(path_positions), transform_fingerprint: fingerprint_transform(transform) };
        let clock = self.clock;
        if let Some(entry) = self.entries.get_mut(&key) {
            entry.last_used = clock;
            Some(&entry.value)
        } else {
            None
        }
    }

    pub fn insert(&mut self, path_positions: &[f32], transform: Mat2D, value: V) {
        if self.entries.len() >= self.capacity {
            if let Some(lru_key) = self.entries.iter().min_by_key(|(_, e)| e.last_used).map(|(k, _)| *k) {
                self.entries.remove(&lru_key);
            }
        }
        let key = RasterKey { path_fingerprint: fingerprint_positions(path_positions), transform_fingerprint: fingerprint_transform(transform) };
        self.entries.insert(key, RasterEntry { value, last_used: self.clock });
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Minimum alignment wgpu requires for buffer offsets; used when packing
/// multiple op parameter blocks into one uniform buffer for the mask
/// ping-pong loop.
pub const UNIFORM_ALIGNMENT: NonZeroU64 = NonZeroU64::new(256).unwrap();
