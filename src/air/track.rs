use crate::math::Vec2;
use crate::path::Easing;

/// A value type usable in a [`Track`]. Implemented for the scalar and 2D
/// vector quantities carried by Lottie transform properties.
pub trait Interpolatable: Copy {
    fn lerp(self, other: Self, t: f32) -> Self;
}

impl Interpolatable for f32 {
    fn lerp(self, other: Self, t: f32) -> Self {
        self + (other - self) * t
    }
}

impl Interpolatable for Vec2 {
    fn lerp(self, other: Self, t: f32) -> Self {
        Vec2::lerp(self, other, t)
    }
}

/// One keyframe: a time (in frames) and a value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keyframe<T> {
    pub time: f32,
    pub value: T,
}

/// A transform property track: position, scale, rotation, opacity, or
/// anchor. Either a single static value, or a keyframed sequence where
/// each segment between two consecutive keyframes carries its own easing
/// descriptor (hold or cubic Bézier).
///
/// Sampling uses inclusive-left / exclusive-right segments: at an exact
/// keyframe boundary, the later segment's start value wins.
#[derive(Debug, Clone, PartialEq)]
pub enum Track<T> {
    Static(T),
    Keyframed { keyframes: Vec<Keyframe<T>>, segment_easing: Vec<Easing> },
}

impl<T: Interpolatable> Track<T> {
    #[must_use]
    pub fn static_value(value: T) -> Self {
        Self::Static(value)
    }

    /// `segment_easing.len()` must equal `keyframes.len() - 1`.
    #[must_use]
    pub fn keyframed(keyframes: Vec<Keyframe<T>>, segment_easing: Vec<Easing>) -> Self {
        debug_assert_eq!(segment_easing.len() + 1, keyframes.len().max(1));
        Self::Keyframed { keyframes, segment_easing }
    }

    #[must_use]
    pub fn sample(&self, frame: f32) -> T {
        match self {
            Track::Static(v) => *v,
            Track::Keyframed { keyframes, segment_easing } => sample_keyframed(keyframes, segment_easing, frame),
        }
    }
}

fn sample_keyframed<T: Interpolatable>(keyframes: &[Keyframe<T>], segment_easing: &[Easing], frame: f32) -> T {
    debug_assert!(!keyframes.is_empty());
    if keyframes.len() == 1 {
        return keyframes[0].value;
    }

    if frame < keyframes[0].time {
        return keyframes[0].value;
    }
    let last = keyframes.len() - 1;
    if frame >= keyframes[last].time {
        return keyframes[last].value;
    }

    // Inclusive-left / exclusive-right: find the segment whose start time
    // is <= frame and whose end time is > frame.
    let segment = keyframes
        .windows(2)
        .position(|w| frame >= w[0].time && frame < w[1].time)
        .unwrap_or(last - 1);

    let from = &keyframes[segment];
    let to = &keyframes[segment + 1];
    let easing = segment_easing.get(segment).copied().unwrap_or(Easing::Hold);

    if matches!(easing, Easing::Hold) {
        return from.value;
    }

    let span = (to.time - from.time).max(f32::EPSILON);
    let linear_t = ((frame - from.time) / span).clamp(0.0, 1.0);
    let t = easing.remap(linear_t);
    from.value.lerp(to.value, t)
}
