//! The texture-provider boundary: the platform-specific asset loader and
//! user-media decoder live outside this crate and are reached only
//! through this trait.

/// Resolves a namespaced asset id (or an injected user-media slot) to an
/// already-uploaded GPU texture view.
///
/// Implementations own the decode pipeline (image formats, video frame
/// extraction); this crate only ever asks for a view by id.
pub trait TextureProvider {
    fn texture_view(&self, namespaced_asset_id: &str) -> Option<&wgpu::TextureView>;
}
