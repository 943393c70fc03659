use crate::math::{Mat2D, Rect, Vec2};

/// The contain-fit mapping from an animation's native frame to a block's
/// canvas-space rectangle: identity when `anim_size == canvas_size`,
/// otherwise uniform scale plus centering. Shared verbatim by the render
/// plan emitter, hit-testing, and overlay geometry.
#[must_use]
pub fn block_transform(anim_size: (u32, u32), block_rect: Rect, canvas_size: (u32, u32)) -> Mat2D {
    let (anim_w, anim_h) = (anim_size.0 as f32, anim_size.1 as f32);
    let (canvas_w, canvas_h) = (canvas_size.0 as f32, canvas_size.1 as f32);

    if (anim_w - canvas_w).abs() < f32::EPSILON && (anim_h - canvas_h).abs() < f32::EPSILON {
        return Mat2D::IDENTITY;
    }

    let scale = (block_rect.width / anim_w).min(block_rect.height / anim_h);
    let scaled_w = anim_w * scale;
    let scaled_h = anim_h * scale;
    let offset_x = block_rect.x + (block_rect.width - scaled_w) / 2.0;
    let offset_y = block_rect.y + (block_rect.height - scaled_h) / 2.0;

    Mat2D::translation(Vec2::new(offset_x, offset_y)).mul(Mat2D::scale(Vec2::new(scale, scale)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_when_sizes_match() {
        let m = block_transform((1080, 1920), Rect::new(0.0, 0.0, 1080.0, 1920.0), (1080, 1920));
        assert_eq!(m, Mat2D::IDENTITY);
    }

    #[test]
    fn centers_and_scales_down() {
        let m = block_transform((1000, 1000), Rect::new(0.0, 0.0, 540.0, 960.0), (1080, 1920));
        let top_left = m.apply_point(Vec2::new(0.0, 0.0));
        let bottom_right = m.apply_point(Vec2::new(1000.0, 1000.0));
        assert!(top_left.x > 0.0 && top_left.y >= 0.0);
        assert!((bottom_right.x - top_left.x - (bottom_right.y - top_left.y)).abs() < 1e-3);
    }
}
