//! Even-odd point-in-polygon test (§4.10, `mask` hit-test mode).

use crate::math::Vec2;

/// Ray-casting even-odd test against a closed polygon (the last vertex is
/// implicitly connected back to the first). Fewer than 3 vertices never
/// contain a point.
#[must_use]
pub fn point_in_polygon(point: Vec2, polygon: &[Vec2]) -> bool {
    let n = polygon.len();
    if n < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let pi = polygon[i];
        let pj = polygon[j];
        if (pi.y > point.y) != (pj.y > point.y) {
            let x_at_y = (pj.x - pi.x) * (point.y - pi.y) / (pj.y - pi.y) + pi.x;
            if point.x < x_at_y {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Vec<Vec2> {
        vec![Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0), Vec2::new(10.0, 10.0), Vec2::new(0.0, 10.0)]
    }

    #[test]
    fn center_point_is_inside() {
        assert!(point_in_polygon(Vec2::new(5.0, 5.0), &square()));
    }

    #[test]
    fn point_outside_bbox_is_outside() {
        assert!(!point_in_polygon(Vec2::new(15.0, 5.0), &square()));
    }

    #[test]
    fn point_just_past_an_edge_is_outside() {
        assert!(!point_in_polygon(Vec2::new(10.001, 5.0), &square()));
    }

    fn concave_notch() -> Vec<Vec2> {
        // A "C" shape: a square with a notch cut from its right edge.
        vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(10.0, 0.0),
            Vec2::new(10.0, 4.0),
            Vec2::new(5.0, 4.0),
            Vec2::new(5.0, 6.0),
            Vec2::new(10.0, 6.0),
            Vec2::new(10.0, 10.0),
            Vec2::new(0.0, 10.0),
        ]
    }

    #[test]
    fn notch_excludes_points_inside_its_bbox_but_outside_the_fill() {
        assert!(!point_in_polygon(Vec2::new(7.0, 5.0), &concave_notch()));
        assert!(point_in_polygon(Vec2::new(2.0, 5.0), &concave_notch()));
    }

    #[test]
    fn fewer_than_three_vertices_never_hits() {
        assert!(!point_in_polygon(Vec2::new(0.0, 0.0), &[Vec2::new(0.0, 0.0), Vec2::new(1.0, 1.0)]));
    }
}
