use super::Vec2;

/// A single cubic Bézier segment between two on-curve points, with the two
/// off-curve control points stored as tangent handles relative to their
/// endpoint (the Lottie/AE convention).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CubicBezier {
    pub p0: Vec2,
    pub out_tangent: Vec2,
    pub in_tangent: Vec2,
    pub p1: Vec2,
}

impl CubicBezier {
    #[must_use]
    pub const fn new(p0: Vec2, out_tangent: Vec2, in_tangent: Vec2, p1: Vec2) -> Self {
        Self { p0, out_tangent, in_tangent, p1 }
    }

    /// Evaluates the curve at `t` in `[0, 1]` using the absolute control
    /// points `p0 + out_tangent` and `p1 + in_tangent`.
    #[must_use]
    pub fn evaluate(self, t: f32) -> Vec2 {
        let c1 = self.p0 + self.out_tangent;
        let c2 = self.p1 + self.in_tangent;
        let mt = 1.0 - t;
        let a = mt * mt * mt;
        let b = 3.0 * mt * mt * t;
        let c = 3.0 * mt * t * t;
        let d = t * t * t;
        Vec2::new(
            a * self.p0.x + b * c1.x + c * c2.x + d * self.p1.x,
            a * self.p0.y + b * c1.y + c * c2.y + d * self.p1.y,
        )
    }

    /// Flattens the segment into `steps + 1` points (inclusive of both
    /// endpoints) suitable for ear-clipping triangulation.
    #[must_use]
    pub fn flatten(self, steps: u32) -> Vec<Vec2> {
        let steps = steps.max(1);
        (0..=steps)
            .map(|i| self.evaluate(i as f32 / steps as f32))
            .collect()
    }
}

/// Flattens a closed sequence of cubic segments into a single outline,
/// sharing endpoints between consecutive segments (the last point of one
/// segment equals the first point of the next, so it is skipped).
#[must_use]
pub fn flatten_outline(segments: &[CubicBezier], steps_per_segment: u32) -> Vec<Vec2> {
    let mut out = Vec::with_capacity(segments.len() * steps_per_segment as usize);
    for (i, seg) in segments.iter().enumerate() {
        let points = seg.flatten(steps_per_segment);
        if i == 0 {
            out.extend(points);
        } else {
            out.extend(points.into_iter().skip(1));
        }
    }
    out
}
