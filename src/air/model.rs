use rustc_hash::FxHashMap;

use super::asset_index::AssetIndex;
use super::binding::Binding;
use super::mask::Mask;
use super::matte::Matte;
use super::track::Track;
use crate::math::Vec2;
use crate::path::PathId;

/// Identifies a composition within one animation. The root composition
/// uses the reserved id [`CompId::ROOT`]; precomps use their Lottie asset
/// `id` string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CompId {
    Root,
    Named(String),
}

impl CompId {
    #[must_use]
    pub fn named(id: impl Into<String>) -> Self {
        Self::Named(id.into())
    }
}

/// A layer's identity within its composition, taken directly from the
/// Lottie `ind` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayerId(pub i64);

/// `{ ip, op, st }`: in-point, out-point, and start-time offset. `st` is
/// used when entering a precomp: `child_frame = parent_frame - st`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Timing {
    pub in_point: f32,
    pub out_point: f32,
    pub start_time: f32,
}

impl Timing {
    #[must_use]
    pub fn contains(self, frame: f32) -> bool {
        frame >= self.in_point && frame < self.out_point
    }
}

/// Optional stroke parameters accompanying a shape-matte source's fill.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke {
    pub color: [f32; 4],
    pub opacity: f32,
    pub width: f32,
    pub cap: StrokeCap,
    pub join: StrokeJoin,
    pub miter_limit: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrokeCap {
    Butt,
    Round,
    Square,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrokeJoin {
    Miter,
    Round,
    Bevel,
}

/// The drawable content a layer carries, tagged by Lottie layer type.
#[derive(Debug, Clone, PartialEq)]
pub enum LayerContent {
    /// `ty = 0`: descend into another composition.
    Precomp { ref_comp: CompId, width: u32, height: u32 },
    /// `ty = 2`: draw an image asset scaled to its declared size.
    Image { namespaced_asset_id: String, width: u32, height: u32 },
    /// `ty = 3`: no draw; only propagates transform/opacity to children.
    Null,
    /// `ty = 4`, used only as a matte source: a filled (and optionally
    /// stroked) shape.
    ShapeMatte { path_id: PathId, fill_color: [f32; 4], fill_opacity: Track<f32>, stroke: Option<Stroke> },
}

/// One layer within a composition.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    pub id: LayerId,
    pub name: String,
    pub content: LayerContent,
    pub timing: Timing,
    pub parent_id: Option<LayerId>,
    pub position: Track<Vec2>,
    pub scale: Track<Vec2>,
    pub rotation: Track<f32>,
    pub opacity: Track<f32>,
    pub anchor: Track<Vec2>,
    pub masks: Vec<Mask>,
    pub matte: Option<Matte>,
    /// `explicit(td=1) ∨ referenced by any consumer's tp`.
    pub is_matte_source: bool,
    pub hidden: bool,
}

impl Layer {
    #[must_use]
    pub fn visible_at(&self, frame: f32) -> bool {
        !self.hidden && self.timing.contains(frame)
    }
}

/// A container of layers within an animation: the root composition or a
/// precomp asset.
#[derive(Debug, Clone, PartialEq)]
pub struct Composition {
    pub id: CompId,
    pub width: u32,
    pub height: u32,
    pub layers: Vec<Layer>,
}

/// Reserved layer name marking the shape that defines both the binding
/// layer's input-clip mask (§4.5) and the `mask` hit-test outline (§4.10).
pub const MEDIA_INPUT_LAYER_NAME: &str = "mediaInput";

impl Composition {
    #[must_use]
    pub fn layer(&self, id: LayerId) -> Option<&Layer> {
        self.layers.iter().find(|l| l.id == id)
    }

    /// The layer named [`MEDIA_INPUT_LAYER_NAME`] with shape-matte
    /// content, if this composition declares one.
    #[must_use]
    pub fn media_input_layer(&self) -> Option<&Layer> {
        self.layers.iter().find(|l| l.name == MEDIA_INPUT_LAYER_NAME && matches!(l.content, LayerContent::ShapeMatte { .. }))
    }
}

/// Top-level metadata for one vector animation document.
#[derive(Debug, Clone, PartialEq)]
pub struct AirMeta {
    pub width: u32,
    pub height: u32,
    pub fps: f32,
    pub in_point: f32,
    pub out_point: f32,
    pub source_anim_ref: String,
}

/// The compiled Animation Intermediate Representation for one vector
/// animation document.
#[derive(Debug, Clone, PartialEq)]
pub struct Air {
    pub meta: AirMeta,
    pub compositions: FxHashMap<CompId, Composition>,
    pub binding: Binding,
    pub asset_index: AssetIndex,
}

impl Air {
    #[must_use]
    pub fn root(&self) -> &Composition {
        self.compositions.get(&CompId::Root).expect("AIR always has a root composition")
    }

    #[must_use]
    pub fn composition(&self, id: &CompId) -> Option<&Composition> {
        self.compositions.get(id)
    }
}
