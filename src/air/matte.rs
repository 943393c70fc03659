use super::model::LayerId;

/// Track matte mode, from the Lottie `tt` field (`1..4`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatteMode {
    Alpha,
    AlphaInverted,
    Luma,
    LumaInverted,
}

impl MatteMode {
    /// Maps a Lottie `tt` value to a mode. `tt` is validated to be in
    /// `1..=4` before this is called.
    #[must_use]
    pub fn from_tt(tt: u8) -> Option<Self> {
        match tt {
            1 => Some(Self::Alpha),
            2 => Some(Self::AlphaInverted),
            3 => Some(Self::Luma),
            4 => Some(Self::LumaInverted),
            _ => None,
        }
    }
}

/// A resolved matte relationship: the consumer layer references its
/// source by id. The source layer is separately flagged
/// `is_matte_source` on its own [`super::model::Layer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Matte {
    pub mode: MatteMode,
    pub source_layer_id: LayerId,
}
