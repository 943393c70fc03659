//! Animation Intermediate Representation: the compiled form of one vector
//! animation document — composition tree, layers, transform tracks,
//! masks, matte relationships, and the binding descriptor.

mod asset_index;
mod binding;
mod mask;
mod matte;
mod model;
mod track;

pub use asset_index::{AssetEntry, AssetIndex};
pub use binding::Binding;
pub use mask::{Mask, MaskMode};
pub use matte::{Matte, MatteMode};
pub use model::{Air, AirMeta, CompId, Composition, Layer, LayerContent, LayerId, Stroke, StrokeCap, StrokeJoin, Timing, MEDIA_INPUT_LAYER_NAME};
pub use track::{Interpolatable, Keyframe, Track};
