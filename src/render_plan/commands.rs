use crate::air::{MaskMode, MatteMode};
use crate::air::{StrokeCap, StrokeJoin};
use crate::math::{Mat2D, Rect};
use crate::path::PathId;

/// The render byte-code stream. Produced by the block and AIR emitters,
/// consumed by the GPU executor. See §6, "Render command byte-code".
#[derive(Debug, Clone, PartialEq)]
pub enum RenderCommand {
    BeginGroup(String),
    EndGroup,
    PushTransform(Mat2D),
    PopTransform,
    PushClipRect(Rect),
    PopClipRect,
    DrawImage { asset_id: String, opacity: f32 },
    DrawShape { path_id: PathId, fill_color: [f32; 4], fill_opacity: f32, layer_opacity: f32, frame: f32 },
    DrawStroke {
        path_id: PathId,
        color: [f32; 4],
        opacity: f32,
        width: f32,
        cap: StrokeCap,
        join: StrokeJoin,
        miter_limit: f32,
        layer_opacity: f32,
        frame: f32,
    },
    BeginMask { mode: MaskMode, inverted: bool, path_id: PathId, opacity: f32, frame: f32 },
    EndMask,
    BeginMatte(MatteMode),
    EndMatte,
}

impl RenderCommand {
    /// Builds the legacy `BeginMaskAdd` form, normalized to
    /// `BeginMask(mode=add, inverted=false, ...)`.
    #[must_use]
    pub fn begin_mask_add(path_id: PathId, opacity: f32, frame: f32) -> Self {
        Self::BeginMask { mode: MaskMode::Add, inverted: false, path_id, opacity, frame }
    }
}
