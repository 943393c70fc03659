use super::model::{CompId, LayerId};

/// Names the single user-replaceable image layer within an animation: the
/// layer whose name equals the scene block's `bindingKey`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub key: String,
    pub bound_layer_id: LayerId,
    pub bound_asset_id: String,
    pub bound_comp_id: CompId,
}
