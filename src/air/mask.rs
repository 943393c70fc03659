use crate::path::PathId;

/// Boolean combination mode for a mask path, from the Lottie `mode` field
/// (`"a"`, `"s"`, `"i"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaskMode {
    Add,
    Subtract,
    Intersect,
}

/// One mask entry on a layer. Path animation (`pt.a == 1`) is currently
/// rejected by the validator; `animated` is still recorded so enabling it
/// later needs no model change.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mask {
    pub mode: MaskMode,
    pub inverted: bool,
    pub static_opacity: f32,
    pub path_id: PathId,
    pub animated: bool,
}
