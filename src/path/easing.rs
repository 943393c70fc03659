/// The easing applied across one keyframe segment: either a hard step
/// (`hold`) or a cubic Bézier ease curve over normalized time/value space,
/// described by its two tangent handles `(out_x, out_y, in_x, in_y)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Easing {
    Hold,
    Bezier { out_x: f32, out_y: f32, in_x: f32, in_y: f32 },
}

impl Easing {
    /// Remaps a linear `0..1` progress through this easing's curve. For
    /// `Hold` the value never advances until the segment boundary: callers
    /// sampling a hold segment should use the start value directly rather
    /// than calling this, since the boundary jump is not representable as
    /// a continuous remap.
    #[must_use]
    pub fn remap(self, t: f32) -> f32 {
        match self {
            Easing::Hold => 0.0,
            Easing::Bezier { out_x, out_y, in_x, in_y } => cubic_ease(out_x, out_y, in_x, in_y, t),
        }
    }
}

/// Solves the cubic Bézier easing curve `(0,0) -> (out_x,out_y) -> (1+in_x,1+in_y) -> (1,1)`
/// for the `y` value at parametric `x = t`, via bisection on the curve's
/// `x(u)` to find `u` such that `x(u) == t`, then evaluating `y(u)`.
///
/// Lottie/AE store `in`/`out` handles as offsets from `(0,0)` and `(1,1)`
/// respectively; the handle coordinates are in normalized time/value space,
/// not animation space.
fn cubic_ease(out_x: f32, out_y: f32, in_x: f32, in_y: f32, t: f32) -> f32 {
    if t <= 0.0 {
        return 0.0;
    }
    if t >= 1.0 {
        return 1.0;
    }
    let c1x = out_x;
    let c1y = out_y;
    let c2x = 1.0 + in_x;
    let c2y = 1.0 + in_y;

    let bezier_x = |u: f32| {
        let mu = 1.0 - u;
        3.0 * mu * mu * u * c1x + 3.0 * mu * u * u * c2x + u * u * u
    };
    let bezier_y = |u: f32| {
        let mu = 1.0 - u;
        3.0 * mu * mu * u * c1y + 3.0 * mu * u * u * c2y + u * u * u
    };

    let mut lo = 0.0_f32;
    let mut hi = 1.0_f32;
    let mut u = t;
    for _ in 0..32 {
        let x = bezier_x(u);
        if (x - t).abs() < 1e-6 {
            break;
        }
        if x < t {
            lo = u;
        } else {
            hi = u;
        }
        u = (lo + hi) * 0.5;
    }
    bezier_y(u).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_handles_are_identity() {
        let e = Easing::Bezier { out_x: 1.0 / 3.0, out_y: 1.0 / 3.0, in_x: -1.0 / 3.0, in_y: -1.0 / 3.0 };
        for i in 0..=10 {
            let t = i as f32 / 10.0;
            assert!((e.remap(t) - t).abs() < 1e-3);
        }
    }

    #[test]
    fn bezier_endpoints_are_zero_and_one() {
        let e = Easing::Bezier { out_x: 0.2, out_y: 0.0, in_x: -0.2, in_y: 0.0 };
        assert!((e.remap(0.0) - 0.0).abs() < 1e-6);
        assert!((e.remap(1.0) - 1.0).abs() < 1e-6);
    }
}
