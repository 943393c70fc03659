//! Scene-wide path registry: translates declarative Bézier outlines into
//! GPU-friendly triangle meshes and serves them by [`PathId`].

mod easing;
mod registry;
mod resource;
mod triangulate;

pub use easing::Easing;
pub use registry::{PathId, PathRegistry};
pub use resource::{PathBuildError, PathKeyframe, PathResource};
pub use triangulate::ear_clip;
