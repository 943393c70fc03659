use rustc_hash::{FxHashMap, FxHashSet};

use crate::air::{Air, AssetIndex};
use crate::math::{Mat2D, Rect};
use crate::path::PathRegistry;

/// A block's stable identifier, taken verbatim from the scene JSON.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(pub String);

/// A variant's stable identifier within its block.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VariantId(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerClip {
    None,
    SlotRect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitTestMode {
    Mask,
    Rect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaType {
    Photo,
    Video,
    Color,
}

impl MediaType {
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "photo" => Some(Self::Photo),
            "video" => Some(Self::Video),
            "color" => Some(Self::Color),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UserTransformsAllowed {
    pub pan: bool,
    pub zoom: bool,
    pub rotate: bool,
}

/// One compiled variant: its AIR and the overlap/trim policy that derives
/// a variant-local frame index from the scene frame index.
#[derive(Debug, Clone)]
pub struct VariantRuntime {
    pub variant_id: VariantId,
    pub anim_ref: String,
    pub air: Air,
    pub default_duration_frames: Option<u32>,
    pub loop_range: Option<(u32, u32)>,
}

impl VariantRuntime {
    /// The default Part-1 overlap policy: clamp the scene frame to the
    /// variant's `[inPoint, outPoint)` range.
    #[must_use]
    pub fn local_frame_index(&self, scene_frame: f32) -> f32 {
        let in_point = self.air.meta.in_point;
        let out_point = (self.air.meta.out_point - 1.0).max(in_point);
        scene_frame.clamp(in_point, out_point)
    }
}

/// A compiled placeholder block: geometry, timing, policy flags, and every
/// compiled variant sharing the scene-wide path registry.
#[derive(Debug, Clone)]
pub struct BlockRuntime {
    pub block_id: BlockId,
    pub z_index: i32,
    pub order_index: u32,
    pub rect_canvas: Rect,
    pub input_rect: Rect,
    pub timing: (u32, u32),
    pub container_clip: ContainerClip,
    pub hit_test_mode: HitTestMode,
    pub allowed_media: Vec<MediaType>,
    pub user_transforms_allowed: UserTransformsAllowed,
    pub variants: Vec<VariantRuntime>,
    pub selected_variant_id: VariantId,
    pub edit_variant_id: VariantId,
}

impl BlockRuntime {
    #[must_use]
    pub fn variant(&self, id: &VariantId) -> Option<&VariantRuntime> {
        self.variants.iter().find(|v| &v.variant_id == id)
    }

    #[must_use]
    pub fn visible_at(&self, scene_frame: u32) -> bool {
        scene_frame >= self.timing.0 && scene_frame < self.timing.1
    }
}

/// Canvas-level constants: pixel size, frame rate, and total duration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub duration_frames: u32,
}

/// The assembled, immutable-after-compile scene, plus the mutable
/// scene-player state (user transforms, variant overrides, user-media
/// presence).
#[derive(Debug, Clone)]
pub struct SceneRuntime {
    pub canvas: Canvas,
    pub blocks: Vec<BlockRuntime>,
    pub path_registry: PathRegistry,
    pub asset_index: AssetIndex,
    pub binding_asset_ids: FxHashSet<String>,

    user_transforms: FxHashMap<BlockId, Mat2D>,
    variant_overrides: FxHashMap<BlockId, VariantId>,
    user_media_present: FxHashMap<BlockId, bool>,
}

impl SceneRuntime {
    #[must_use]
    pub fn new(
        canvas: Canvas,
        blocks: Vec<BlockRuntime>,
        path_registry: PathRegistry,
        asset_index: AssetIndex,
        binding_asset_ids: FxHashSet<String>,
    ) -> Self {
        Self {
            canvas,
            blocks,
            path_registry,
            asset_index,
            binding_asset_ids,
            user_transforms: FxHashMap::default(),
            variant_overrides: FxHashMap::default(),
            user_media_present: FxHashMap::default(),
        }
    }

    #[must_use]
    pub fn block(&self, id: &BlockId) -> Option<&BlockRuntime> {
        self.blocks.iter().find(|b| &b.block_id == id)
    }

    pub fn set_user_transform(&mut self, block_id: BlockId, transform: Mat2D) {
        self.user_transforms.insert(block_id, transform);
    }

    #[must_use]
    pub fn user_transform(&self, block_id: &BlockId) -> Mat2D {
        self.user_transforms.get(block_id).copied().unwrap_or(Mat2D::IDENTITY)
    }

    pub fn set_variant_override(&mut self, block_id: BlockId, variant_id: VariantId) {
        self.variant_overrides.insert(block_id, variant_id);
    }

    pub fn clear_variant_override(&mut self, block_id: &BlockId) {
        self.variant_overrides.remove(block_id);
    }

    pub fn set_user_media_present(&mut self, block_id: BlockId, present: bool) {
        self.user_media_present.insert(block_id, present);
    }

    #[must_use]
    pub fn user_media_present(&self, block_id: &BlockId) -> bool {
        self.user_media_present.get(block_id).copied().unwrap_or(false)
    }

    /// Resolves a block's active variant: `overrides[blockId] ∨
    /// block.selectedVariantId ∨ firstVariant`.
    #[must_use]
    pub fn active_variant<'a>(&'a self, block: &'a BlockRuntime) -> &'a VariantRuntime {
        if let Some(id) = self.variant_overrides.get(&block.block_id) {
            if let Some(v) = block.variant(id) {
                return v;
            }
        }
        block
            .variant(&block.selected_variant_id)
            .or_else(|| block.variants.first())
            .expect("every block has at least one compiled variant")
    }
}
