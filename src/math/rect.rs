use super::{Mat2D, Vec2};

/// An axis-aligned rectangle, `(x, y)` at the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    #[must_use]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    #[must_use]
    pub fn min(self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    #[must_use]
    pub fn max(self) -> Vec2 {
        Vec2::new(self.x + self.width, self.y + self.height)
    }

    #[must_use]
    pub fn center(self) -> Vec2 {
        Vec2::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    #[must_use]
    pub fn contains_point(self, p: Vec2) -> bool {
        p.x >= self.x && p.x < self.x + self.width && p.y >= self.y && p.y < self.y + self.height
    }

    /// Maps the rect's four corners through `m`, and returns the
    /// axis-aligned bounding box of the result with `mins` floored and
    /// `maxes` ceiled.
    #[must_use]
    pub fn transformed_aabb_rounded(self, m: Mat2D) -> Self {
        let corners = [
            m.apply_point(Vec2::new(self.x, self.y)),
            m.apply_point(Vec2::new(self.x + self.width, self.y)),
            m.apply_point(Vec2::new(self.x, self.y + self.height)),
            m.apply_point(Vec2::new(self.x + self.width, self.y + self.height)),
        ];
        let mut min_x = f32::INFINITY;
        let mut min_y = f32::INFINITY;
        let mut max_x = f32::NEG_INFINITY;
        let mut max_y = f32::NEG_INFINITY;
        for c in corners {
            min_x = min_x.min(c.x);
            min_y = min_y.min(c.y);
            max_x = max_x.max(c.x);
            max_y = max_y.max(c.y);
        }
        let min_x = min_x.floor();
        let min_y = min_y.floor();
        let max_x = max_x.ceil();
        let max_y = max_y.ceil();
        Self::new(min_x, min_y, (max_x - min_x).max(0.0), (max_y - min_y).max(0.0))
    }

    /// Intersection of two rects; zero-size if they do not overlap.
    #[must_use]
    pub fn intersect(self, other: Self) -> Self {
        let min_x = self.x.max(other.x);
        let min_y = self.y.max(other.y);
        let max_x = (self.x + self.width).min(other.x + other.width);
        let max_y = (self.y + self.height).min(other.y + other.height);
        Self::new(min_x, min_y, (max_x - min_x).max(0.0), (max_y - min_y).max(0.0))
    }

    #[must_use]
    pub fn is_empty(self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    #[must_use]
    pub fn expanded(self, amount: f32) -> Self {
        Self::new(self.x - amount, self.y - amount, self.width + amount * 2.0, self.height + amount * 2.0)
    }

    #[must_use]
    pub fn clamped_to(self, bounds: Self) -> Self {
        self.intersect(bounds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn min_max_center_and_contains_point() {
        let r = Rect::new(10.0, 20.0, 100.0, 50.0);
        assert_eq!(r.min(), Vec2::new(10.0, 20.0));
        assert_eq!(r.max(), Vec2::new(110.0, 70.0));
        assert_eq!(r.center(), Vec2::new(60.0, 45.0));
        assert!(r.contains_point(Vec2::new(10.0, 20.0)));
        assert!(!r.contains_point(Vec2::new(110.0, 70.0)));
        assert!(!r.contains_point(Vec2::new(9.9, 20.0)));
    }

    #[test]
    fn transformed_aabb_rounded_expands_a_rotated_rect_to_axis_aligned_bounds() {
        let r = Rect::new(0.0, 0.0, 10.0, 10.0);
        let m = Mat2D::rotation_degrees(45.0);
        let aabb = r.transformed_aabb_rounded(m);
        assert!(aabb.width > 10.0);
        assert!(aabb.height > 10.0);
        assert!(aabb.contains_point(Vec2::new(0.0, 0.0)));
    }

    #[test]
    fn intersect_of_disjoint_rects_is_empty() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(20.0, 20.0, 10.0, 10.0);
        assert!(a.intersect(b).is_empty());
    }

    #[test]
    fn intersect_of_overlapping_rects_is_the_shared_region() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(5.0, 5.0, 10.0, 10.0);
        let i = a.intersect(b);
        assert_eq!(i, Rect::new(5.0, 5.0, 5.0, 5.0));
    }

    #[test]
    fn expanded_grows_the_rect_symmetrically() {
        let r = Rect::new(10.0, 10.0, 20.0, 20.0);
        let e = r.expanded(5.0);
        assert_eq!(e, Rect::new(5.0, 5.0, 30.0, 30.0));
    }

    #[test]
    fn clamped_to_is_an_alias_for_intersect() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let bounds = Rect::new(5.0, 5.0, 10.0, 10.0);
        assert_eq!(a.clamped_to(bounds), a.intersect(bounds));
    }
}
