use crate::math::Vec2;

/// Triangulates a simple polygon outline via ear clipping. Returns
/// flattened triangle indices (three per triangle) into `outline`.
///
/// Fails (returns `None`) when fewer than 3 vertices are given or no ear
/// can be found (self-intersecting or degenerate outline); callers surface
/// this as a fatal `MASK_PATH_BUILD_FAILED` / `MATTE_PATH_BUILD_FAILED`.
#[must_use]
pub fn ear_clip(outline: &[Vec2]) -> Option<Vec<u32>> {
    if outline.len() < 3 {
        return None;
    }

    let signed_area = signed_area(outline);
    let ccw = signed_area > 0.0;

    let mut remaining: Vec<u32> = (0..outline.len() as u32).collect();
    let mut triangles = Vec::with_capacity((outline.len() - 2) * 3);

    let mut guard = 0usize;
    let max_iterations = outline.len() * outline.len() + 8;

    while remaining.len() > 3 {
        guard += 1;
        if guard > max_iterations {
            return None;
        }

        let n = remaining.len();
        let mut ear_found = false;
        for i in 0..n {
            let prev = remaining[(i + n - 1) % n];
            let cur = remaining[i];
            let next = remaining[(i + 1) % n];

            if !is_convex(outline[prev as usize], outline[cur as usize], outline[next as usize], ccw) {
                continue;
            }

            let mut contains_other = false;
            for &p in &remaining {
                if p == prev || p == cur || p == next {
                    continue;
                }
                if point_in_triangle(outline[p as usize], outline[prev as usize], outline[cur as usize], outline[next as usize]) {
                    contains_other = true;
                    break;
                }
            }
            if contains_other {
                continue;
            }

            triangles.push(prev);
            triangles.push(cur);
            triangles.push(next);
            remaining.remove(i);
            ear_found = true;
            break;
        }

        if !ear_found {
            return None;
        }
    }

    if remaining.len() == 3 {
        triangles.push(remaining[0]);
        triangles.push(remaining[1]);
        triangles.push(remaining[2]);
    }

    Some(triangles)
}

fn signed_area(outline: &[Vec2]) -> f32 {
    let mut area = 0.0;
    for i in 0..outline.len() {
        let a = outline[i];
        let b = outline[(i + 1) % outline.len()];
        area += a.x * b.y - b.x * a.y;
    }
    area * 0.5
}

fn is_convex(prev: Vec2, cur: Vec2, next: Vec2, ccw: bool) -> bool {
    let cross = (cur.x - prev.x) * (next.y - prev.y) - (cur.y - prev.y) * (next.x - prev.x);
    if ccw {
        cross > 0.0
    } else {
        cross < 0.0
    }
}

fn point_in_triangle(p: Vec2, a: Vec2, b: Vec2, c: Vec2) -> bool {
    let d1 = cross_sign(p, a, b);
    let d2 = cross_sign(p, b, c);
    let d3 = cross_sign(p, c, a);
    let has_neg = d1 < 0.0 || d2 < 0.0 || d3 < 0.0;
    let has_pos = d1 > 0.0 || d2 > 0.0 || d3 > 0.0;
    !(has_neg && has_pos)
}

fn cross_sign(p: Vec2, a: Vec2, b: Vec2) -> f32 {
    (p.x - b.x) * (a.y - b.y) - (a.x - b.x) * (p.y - b.y)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn triangulates_a_square() {
        let square = [Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0), Vec2::new(1.0, 1.0), Vec2::new(0.0, 1.0)];
        let tris = ear_clip(&square).expect("square triangulates");
        assert_eq!(tris.len(), 6);
    }

    #[test]
    fn rejects_degenerate_input() {
        let line = [Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0)];
        assert!(ear_clip(&line).is_none());
    }

    #[test]
    fn triangulates_an_l_shape() {
        let l_shape = [
            Vec2::new(0.0, 0.0),
            Vec2::new(2.0, 0.0),
            Vec2::new(2.0, 1.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(1.0, 2.0),
            Vec2::new(0.0, 2.0),
        ];
        let tris = ear_clip(&l_shape).expect("L shape triangulates");
        assert_eq!(tris.len(), (l_shape.len() - 2) * 3);
    }
}
