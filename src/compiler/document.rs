//! Serde document model for the supported Lottie subset (§6, "Vector
//! animation JSON contract"). This module only decodes JSON into a typed
//! tree; [`super::lower`] interprets it into AIR.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Document {
    pub w: u32,
    pub h: u32,
    pub fr: f32,
    pub ip: f32,
    pub op: f32,
    #[serde(default)]
    pub assets: Vec<AssetDoc>,
    pub layers: Vec<LayerDoc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssetDoc {
    pub id: String,
    #[serde(default)]
    pub w: Option<u32>,
    #[serde(default)]
    pub h: Option<u32>,
    #[serde(default)]
    pub u: Option<String>,
    #[serde(default)]
    pub p: Option<String>,
    #[serde(default)]
    pub layers: Option<Vec<LayerDoc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LayerDoc {
    pub ty: u8,
    pub ind: i64,
    #[serde(default)]
    pub nm: String,
    #[serde(default)]
    pub parent: Option<i64>,
    pub ip: f32,
    pub op: f32,
    #[serde(default)]
    pub st: f32,
    pub ks: TransformDoc,
    #[serde(default)]
    #[serde(rename = "refId")]
    pub ref_id: Option<String>,
    #[serde(default)]
    pub w: Option<u32>,
    #[serde(default)]
    pub h: Option<u32>,
    #[serde(default)]
    #[serde(rename = "masksProperties")]
    pub masks_properties: Vec<MaskDoc>,
    #[serde(default)]
    pub tt: Option<u8>,
    #[serde(default)]
    pub tp: Option<i64>,
    #[serde(default)]
    pub td: Option<u8>,
    #[serde(default)]
    pub shapes: Vec<ShapeItemDoc>,
    #[serde(default)]
    #[serde(rename = "hd")]
    pub hidden: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransformDoc {
    pub p: PropertyDoc,
    pub s: PropertyDoc,
    pub r: PropertyDoc,
    pub o: PropertyDoc,
    pub a: PropertyDoc,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PropertyDoc {
    pub a: u8,
    pub k: PropertyValue,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Number(f32),
    Array(Vec<f32>),
    Keyframed(Vec<KeyframeDoc>),
}

#[derive(Debug, Clone, Deserialize)]
pub struct KeyframeDoc {
    pub t: f32,
    #[serde(default)]
    pub s: Vec<f32>,
    #[serde(default)]
    pub h: u8,
    #[serde(default)]
    pub o: Option<EasingHandleDoc>,
    #[serde(default)]
    pub i: Option<EasingHandleDoc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum EasingComponent {
    Scalar(f32),
    PerAxis(Vec<f32>),
}

impl EasingComponent {
    /// All per-dimension easing curves in this crate's mask/track model are
    /// collapsed to a single curve per segment; when Lottie gives per-axis
    /// handles (one fraction per property dimension), the first dimension
    /// is taken.
    #[must_use]
    pub fn value(&self) -> f32 {
        match self {
            EasingComponent::Scalar(v) => *v,
            EasingComponent::PerAxis(values) => values.first().copied().unwrap_or(0.0),
        }
    }
}

/// A Lottie easing handle object, e.g. `"o": {"x": 0.167, "y": 0.167}`.
/// `x` is the time-fraction component, `y` the value-fraction component of
/// the cubic Bézier control point.
#[derive(Debug, Clone, Deserialize)]
pub struct EasingHandleDoc {
    pub x: EasingComponent,
    pub y: EasingComponent,
}

/// A single Bézier vertex: `v` on-curve, `i`/`o` relative in/out tangents.
#[derive(Debug, Clone, Deserialize)]
pub struct ShapeValue {
    #[serde(default)]
    pub i: Vec<[f32; 2]>,
    #[serde(default)]
    pub o: Vec<[f32; 2]>,
    #[serde(default)]
    pub v: Vec<[f32; 2]>,
    #[serde(default)]
    pub c: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ShapeKeyframeDoc {
    pub t: f32,
    #[serde(default)]
    pub s: Vec<ShapeValue>,
    #[serde(default)]
    pub h: u8,
    #[serde(default)]
    pub o: Option<EasingHandleDoc>,
    #[serde(default)]
    pub i: Option<EasingHandleDoc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ShapePropertyValue {
    Static(ShapeValue),
    Keyframed(Vec<ShapeKeyframeDoc>),
}

#[derive(Debug, Clone, Deserialize)]
pub struct ShapePropertyDoc {
    pub a: u8,
    pub k: ShapePropertyValue,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MaskDoc {
    pub mode: String,
    #[serde(default)]
    pub inv: bool,
    pub o: PropertyDoc,
    pub pt: ShapePropertyDoc,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ShapeItemDoc {
    pub ty: String,
    #[serde(default)]
    pub nm: String,
    #[serde(default)]
    pub it: Vec<ShapeItemDoc>,
    #[serde(default)]
    pub ks: Option<ShapePropertyDoc>,
    #[serde(default)]
    pub c: Option<PropertyDoc>,
    #[serde(default)]
    pub o: Option<PropertyDoc>,
}

pub const SUPPORTED_SHAPE_ITEM_TYPES: &[&str] = &["gr", "sh", "fl", "tr"];
