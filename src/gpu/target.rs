//! The render target the executor draws into, and the
//! animation-space → viewport-pixel-space mapping it carries.

use crate::math::{Mat2D, Rect, Vec2};

/// Destination for one top-level `draw`: a color attachment plus the
/// metadata needed to map animation-space coordinates onto its pixels.
///
/// `drawable_scale` is the platform's backing-store scale factor (e.g. 2.0
/// on a Retina display); `animation_size` is the scene canvas size in
/// animation-space units, used only to build `anim_to_viewport`.
pub struct RenderTarget<'a> {
    pub view: &'a wgpu::TextureView,
    pub pixel_size: (u32, u32),
    pub drawable_scale: f32,
    pub animation_size: (u32, u32),
}

impl<'a> RenderTarget<'a> {
    #[must_use]
    pub fn new(view: &'a wgpu::TextureView, pixel_size: (u32, u32), drawable_scale: f32, animation_size: (u32, u32)) -> Self {
        Self { view, pixel_size, drawable_scale, animation_size }
    }

    /// Animation space to viewport pixel space. Block placement and
    /// contain-fit are already baked into the command stream's
    /// `PushTransform`s upstream; this only accounts for backing-store
    /// scale.
    #[must_use]
    pub fn anim_to_viewport(&self) -> Mat2D {
        Mat2D::scale(Vec2::new(self.drawable_scale, self.drawable_scale))
    }

    #[must_use]
    pub fn viewport_to_ndc(&self) -> Mat2D {
        Mat2D::viewport_to_ndc(self.pixel_size)
    }

    #[must_use]
    pub fn full_scissor(&self) -> Rect {
        Rect::new(0.0, 0.0, self.pixel_size.0 as f32, self.pixel_size.1 as f32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anim_to_viewport_applies_drawable_scale_only() {
        // Constructed without a real wgpu::TextureView; exercised through
        // the pure-math helpers only.
        let scale = 2.0_f32;
        let m = Mat2D::scale(Vec2::new(scale, scale));
        let p = m.apply_point(Vec2::new(10.0, 10.0));
        assert_eq!(p, Vec2::new(20.0, 20.0));
    }
}
