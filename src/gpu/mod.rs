//! GPU interpretation of the render command stream (§4.6-4.9): the
//! executor's transform/clip stacks, mask-group and track-matte scope
//! compositing, the offscreen texture pool, and the per-path GPU caches.
//!
//! The platform supplies a [`wgpu::Device`]/[`wgpu::Queue`] pair, a
//! [`provider::TextureProvider`] resolving asset ids to already-uploaded
//! textures, and a [`target::RenderTarget`] to draw into; this module
//! owns everything from there to submitted command buffers.

mod cache;
mod executor;
mod mask_scope;
mod matte_scope;
mod pipelines;
mod pool;
pub mod provider;
mod target;

pub use cache::{PathGpuCache, RasterCache};
pub use executor::{Executor, DEFAULT_MAX_OFFSCREEN_DEPTH};
pub use pipelines::Pipelines;
pub use pool::{PooledTextureId, TexturePool};
pub use target::RenderTarget;
