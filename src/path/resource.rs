use super::easing::Easing;
use super::triangulate::ear_clip;
use crate::math::Vec2;

/// One keyframe of a path's outline: a flattened `[x0,y0,x1,y1,...]`
/// vertex array. Topology (vertex count) must match across all keyframes
/// of the same [`PathResource`].
#[derive(Debug, Clone, PartialEq)]
pub struct PathKeyframe {
    pub time: f32,
    pub positions: Vec<f32>,
}

/// A scene-wide triangulated path, addressed by [`super::PathId`]. Stores
/// one flattened vertex array per keyframe (all sharing one triangle index
/// array, since topology cannot change across keyframes), plus the easing
/// applied between each pair of consecutive keyframes.
#[derive(Debug, Clone, PartialEq)]
pub struct PathResource {
    keyframes: Vec<PathKeyframe>,
    indices: Vec<u32>,
    segment_easing: Vec<Easing>,
}

/// Failure building a [`PathResource`]: either the flattened outline had
/// fewer than 3 vertices, keyframe topology didn't match, or ear clipping
/// could not find a valid triangulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathBuildError;

impl PathResource {
    /// Builds a path resource from a static (non-keyframed) outline.
    pub fn from_static_outline(outline: &[Vec2]) -> Result<Self, PathBuildError> {
        Self::from_keyframed_outlines(&[(0.0, outline.to_vec())], &[])
    }

    /// Builds a path resource from multiple keyframed outlines, each of
    /// which must have identical vertex counts. `segment_easing` has
    /// `keyframes.len() - 1` entries (empty when there's a single
    /// keyframe).
    pub fn from_keyframed_outlines(
        keyframed: &[(f32, Vec<Vec2>)],
        segment_easing: &[Easing],
    ) -> Result<Self, PathBuildError> {
        if keyframed.is_empty() {
            return Err(PathBuildError);
        }
        let vertex_count = keyframed[0].1.len();
        if vertex_count < 3 {
            return Err(PathBuildError);
        }
        if keyframed.iter().any(|(_, outline)| outline.len() != vertex_count) {
            return Err(PathBuildError);
        }
        if keyframed.len() > 1 && segment_easing.len() != keyframed.len() - 1 {
            return Err(PathBuildError);
        }

        let indices = ear_clip(&keyframed[0].1).ok_or(PathBuildError)?;

        let keyframes = keyframed
            .iter()
            .map(|(time, outline)| PathKeyframe {
                time: *time,
                positions: outline.iter().flat_map(|v| [v.x, v.y]).collect(),
            })
            .collect();

        Ok(Self { keyframes, indices, segment_easing: segment_easing.to_vec() })
    }

    #[must_use]
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.keyframes[0].positions.len() / 2
    }

    #[must_use]
    pub fn keyframe_times(&self) -> impl Iterator<Item = f32> + '_ {
        self.keyframes.iter().map(|k| k.time)
    }

    /// Samples the outline at `frame`, writing `vertex_count() * 2` floats
    /// into `out`. `out` is reused, not reallocated, to keep this
    /// allocation-free in steady state; callers must resize it once ahead
    /// of a sampling loop.
    pub fn sample_positions(&self, frame: f32, out: &mut Vec<f32>) {
        out.clear();

        if self.keyframes.len() == 1 {
            out.extend_from_slice(&self.keyframes[0].positions);
            return;
        }

        if frame <= self.keyframes[0].time {
            out.extend_from_slice(&self.keyframes[0].positions);
            return;
        }
        let last = self.keyframes.len() - 1;
        if frame >= self.keyframes[last].time {
            out.extend_from_slice(&self.keyframes[last].positions);
            return;
        }

        let segment = self
            .keyframes
            .windows(2)
            .position(|w| frame >= w[0].time && frame < w[1].time)
            .unwrap_or(last - 1);

        let from = &self.keyframes[segment];
        let to = &self.keyframes[segment + 1];
        let easing = self.segment_easing.get(segment).copied().unwrap_or(Easing::Hold);

        if matches!(easing, Easing::Hold) {
            out.extend_from_slice(&from.positions);
            return;
        }

        let span = (to.time - from.time).max(f32::EPSILON);
        let linear_t = ((frame - from.time) / span).clamp(0.0, 1.0);
        let t = easing.remap(linear_t);

        out.extend(from.positions.iter().zip(to.positions.iter()).map(|(a, b)| a + (b - a) * t));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Vec<Vec2> {
        vec![Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0), Vec2::new(1.0, 1.0), Vec2::new(0.0, 1.0)]
    }

    #[test]
    fn static_resource_samples_constant() {
        let res = PathResource::from_static_outline(&square()).unwrap();
        let mut out = Vec::new();
        res.sample_positions(0.0, &mut out);
        assert_eq!(out.len(), 8);
        res.sample_positions(500.0, &mut out);
        assert_eq!(out.len(), 8);
    }

    #[test]
    fn clamps_before_first_and_after_last_keyframe() {
        let mut shifted = square();
        for v in &mut shifted {
            v.x += 10.0;
        }
        let res = PathResource::from_keyframed_outlines(
            &[(0.0, square()), (10.0, shifted)],
            &[Easing::Bezier { out_x: 1.0 / 3.0, out_y: 1.0 / 3.0, in_x: -1.0 / 3.0, in_y: -1.0 / 3.0 }],
        )
        .unwrap();
        let mut out = Vec::new();
        res.sample_positions(-5.0, &mut out);
        assert_eq!(out[0], 0.0);
        res.sample_positions(50.0, &mut out);
        assert_eq!(out[0], 10.0);
    }

    #[test]
    fn rejects_mismatched_topology() {
        let triangle = vec![Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0), Vec2::new(0.0, 1.0)];
        let err = PathResource::from_keyframed_outlines(&[(0.0, square()), (1.0, triangle)], &[Easing::Hold]);
        assert!(err.is_err());
    }
}
