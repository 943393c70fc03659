//! Edit-mode hit-testing and overlay geometry (§4.10): reuses
//! [`crate::render_plan::block_transform`] so tap targets and outline
//! overlays stay pixel-identical to what the executor actually draws.

mod even_odd;

use rustc_hash::FxHashMap;

use crate::air::LayerContent;
use crate::math::{Rect, Vec2};
use crate::render_plan::{block_transform, resolve_variant, RenderMode};
use crate::scene::{BlockId, BlockRuntime, HitTestMode, SceneRuntime};

pub use even_odd::point_in_polygon;

/// A block's interactive/selection state for overlay rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionState {
    Inactive,
    Hover,
    Selected,
}

/// One visible block's overlay: its canvas-space hit outline (only for
/// `mask`-mode blocks whose outline could be resolved), its placeholder
/// rectangle, and its current selection state.
#[derive(Debug, Clone)]
pub struct BlockOverlay {
    pub block_id: BlockId,
    pub rect_canvas: Rect,
    pub hit_path: Option<Vec<Vec2>>,
    pub selection_state: SelectionState,
}

/// Returns the canvas-space outline of `block`'s media-input shape at
/// `scene_frame_index`, transformed exactly the way `mask` hit-testing
/// evaluates it, or `None` if the block's active variant has no
/// `mediaInput` shape layer (a `rect`-mode block, or one whose `no-anim`
/// variant never declared one).
fn mask_outline(scene: &SceneRuntime, block: &BlockRuntime, scene_frame_index: u32, mode: RenderMode) -> Option<Vec<Vec2>> {
    let variant = resolve_variant(scene, block, mode);
    let local_frame = variant.local_frame_index(scene_frame_index as f32);
    let anim_size = (variant.air.meta.width, variant.air.meta.height);
    let canvas_size = (scene.canvas.width, scene.canvas.height);

    let root = variant.air.root();
    let media_input = root.media_input_layer()?;
    let LayerContent::ShapeMatte { path_id, .. } = media_input.content else {
        return None;
    };
    let resource = scene.path_registry.lookup(path_id)?;

    let mut resolved = FxHashMap::default();
    let media_input_world = crate::air_emit::resolve_local_world(root, media_input.id, local_frame, &mut resolved);
    let to_canvas = block_transform(anim_size, block.rect_canvas, canvas_size).mul(media_input_world);

    let mut positions = Vec::with_capacity(resource.vertex_count() * 2);
    resource.sample_positions(local_frame, &mut positions);
    Some(positions.chunks_exact(2).map(|c| to_canvas.apply_point(Vec2::new(c[0], c[1]))).collect())
}

/// Blocks visible at `scene_frame_index`, ordered topmost-first:
/// descending `(zIndex, orderIndex)`, per §4.10's reverse-paint order.
fn visible_topmost_first(scene: &SceneRuntime, scene_frame_index: u32) -> Vec<&BlockRuntime> {
    let mut blocks: Vec<&BlockRuntime> = scene.blocks.iter().filter(|b| b.visible_at(scene_frame_index)).collect();
    blocks.sort_by(|a, b| (b.z_index, b.order_index).cmp(&(a.z_index, a.order_index)));
    blocks
}

/// Finds the topmost visible block whose hit geometry contains `point`
/// (canvas space), or `None` if nothing was hit.
#[must_use]
pub fn hit_test(scene: &SceneRuntime, point: Vec2, scene_frame_index: u32, mode: RenderMode) -> Option<BlockId> {
    for block in visible_topmost_first(scene, scene_frame_index) {
        let hit = match block.hit_test_mode {
            HitTestMode::Rect => block.rect_canvas.contains_point(point),
            HitTestMode::Mask => match mask_outline(scene, block, scene_frame_index, mode) {
                Some(outline) => point_in_polygon(point, &outline),
                None => {
                    log::debug!("block {:?} declares mask hit-test mode but has no resolvable mediaInput outline; falling back to rect", block.block_id);
                    block.rect_canvas.contains_point(point)
                }
            },
        };
        if hit {
            return Some(block.block_id.clone());
        }
    }
    None
}

/// Builds one overlay entry per visible block, in the same topmost-first
/// order [`hit_test`] walks. `hovered`/`selected` mark at most one block
/// each; a block matching both is reported `Selected`.
#[must_use]
pub fn overlays(scene: &SceneRuntime, scene_frame_index: u32, mode: RenderMode, hovered: Option<&BlockId>, selected: Option<&BlockId>) -> Vec<BlockOverlay> {
    visible_topmost_first(scene, scene_frame_index)
        .into_iter()
        .map(|block| {
            let hit_path = match block.hit_test_mode {
                HitTestMode::Rect => None,
                HitTestMode::Mask => mask_outline(scene, block, scene_frame_index, mode),
            };
            let selection_state = if selected == Some(&block.block_id) {
                SelectionState::Selected
            } else if hovered == Some(&block.block_id) {
                SelectionState::Hover
            } else {
                SelectionState::Inactive
            };
            BlockOverlay { block_id: block.block_id.clone(), rect_canvas: block.rect_canvas, hit_path, selection_state }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::air::{Air, AirMeta, Binding, CompId, Composition, Layer, LayerId, Timing, Track};
    use crate::path::{PathRegistry, PathResource};
    use crate::scene::{Canvas, ContainerClip, MediaType, UserTransformsAllowed, VariantId, VariantRuntime};
    use rustc_hash::FxHashSet;

    fn null_layer(id: i64, name: &str) -> Layer {
        Layer {
            id: LayerId(id),
            name: name.to_string(),
            content: crate::air::LayerContent::Null,
            timing: Timing { in_point: 0.0, out_point: 100.0, start_time: 0.0 },
            parent_id: None,
            position: Track::Static(Vec2::ZERO),
            scale: Track::Static(Vec2::ONE),
            rotation: Track::Static(0.0),
            opacity: Track::Static(1.0),
            anchor: Track::Static(Vec2::ZERO),
            masks: Vec::new(),
            matte: None,
            is_matte_source: false,
            hidden: false,
        }
    }

    fn rect_only_block() -> BlockRuntime {
        let air = Air {
            meta: AirMeta { width: 200, height: 200, fps: 30.0, in_point: 0.0, out_point: 100.0, source_anim_ref: "anim-1.json".into() },
            compositions: {
                let mut m = FxHashMap::default();
                m.insert(CompId::Root, Composition { id: CompId::Root, width: 200, height: 200, layers: vec![null_layer(1, "layer")] });
                m
            },
            binding: Binding { key: "media".into(), bound_layer_id: LayerId(1), bound_asset_id: "anim-1.json|img".into(), bound_comp_id: CompId::Root },
            asset_index: crate::air::AssetIndex::default(),
        };
        let variant = VariantRuntime { variant_id: VariantId("v1".into()), anim_ref: "anim-1.json".into(), air, default_duration_frames: None, loop_range: None };
        BlockRuntime {
            block_id: BlockId("block-a".into()),
            z_index: 0,
            order_index: 0,
            rect_canvas: Rect::new(0.0, 0.0, 100.0, 100.0),
            input_rect: Rect::new(0.0, 0.0, 100.0, 100.0),
            timing: (0, 100),
            container_clip: ContainerClip::None,
            hit_test_mode: HitTestMode::Rect,
            allowed_media: vec![MediaType::Photo],
            user_transforms_allowed: UserTransformsAllowed::default(),
            variants: vec![variant.clone()],
            selected_variant_id: VariantId("v1".into()),
            edit_variant_id: VariantId("v1".into()),
        }
    }

    fn scene_with(blocks: Vec<BlockRuntime>) -> SceneRuntime {
        SceneRuntime::new(Canvas { width: 1080, height: 1920, fps: 30, duration_frames: 100 }, blocks, PathRegistry::new(), crate::air::AssetIndex::default(), FxHashSet::default())
    }

    #[test]
    fn rect_mode_hits_inside_its_rect() {
        let scene = scene_with(vec![rect_only_block()]);
        let hit = hit_test(&scene, Vec2::new(50.0, 50.0), 0, RenderMode::Preview);
        assert_eq!(hit, Some(BlockId("block-a".into())));
    }

    #[test]
    fn rect_mode_misses_outside_its_rect() {
        let scene = scene_with(vec![rect_only_block()]);
        assert_eq!(hit_test(&scene, Vec2::new(500.0, 500.0), 0, RenderMode::Preview), None);
    }

    #[test]
    fn topmost_zindex_wins_when_rects_overlap() {
        let mut back = rect_only_block();
        back.block_id = BlockId("back".into());
        back.z_index = 0;
        let mut front = rect_only_block();
        front.block_id = BlockId("front".into());
        front.z_index = 1;
        let scene = scene_with(vec![back, front]);
        assert_eq!(hit_test(&scene, Vec2::new(50.0, 50.0), 0, RenderMode::Preview), Some(BlockId("front".into())));
    }

    #[test]
    fn mask_mode_without_media_input_falls_back_to_rect() {
        let mut block = rect_only_block();
        block.hit_test_mode = HitTestMode::Mask;
        let scene = scene_with(vec![block]);
        assert_eq!(hit_test(&scene, Vec2::new(50.0, 50.0), 0, RenderMode::Preview), Some(BlockId("block-a".into())));
    }

    #[test]
    fn overlays_report_selection_state() {
        let block = rect_only_block();
        let id = block.block_id.clone();
        let scene = scene_with(vec![block]);
        let result = overlays(&scene, 0, RenderMode::Preview, None, Some(&id));
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].selection_state, SelectionState::Selected);
        assert!(result[0].hit_path.is_none());
    }

    #[test]
    fn mask_mode_resolves_media_input_outline_in_canvas_space() {
        let mut registry = PathRegistry::new();
        let square = vec![Vec2::new(0.0, 0.0), Vec2::new(100.0, 0.0), Vec2::new(100.0, 100.0), Vec2::new(0.0, 100.0)];
        let path_id = registry.register(PathResource::from_static_outline(&square).unwrap());

        let mut layers = vec![null_layer(1, "layer")];
        let mut media_input = null_layer(2, "mediaInput");
        media_input.content = crate::air::LayerContent::ShapeMatte { path_id, fill_color: [1.0, 1.0, 1.0, 1.0], fill_opacity: Track::Static(1.0), stroke: None };
        layers.push(media_input);

        let air = Air {
            meta: AirMeta { width: 200, height: 200, fps: 30.0, in_point: 0.0, out_point: 100.0, source_anim_ref: "anim-1.json".into() },
            compositions: {
                let mut m = FxHashMap::default();
                m.insert(CompId::Root, Composition { id: CompId::Root, width: 200, height: 200, layers });
                m
            },
            binding: Binding { key: "media".into(), bound_layer_id: LayerId(1), bound_asset_id: "anim-1.json|img".into(), bound_comp_id: CompId::Root },
            asset_index: crate::air::AssetIndex::default(),
        };
        let variant = VariantRuntime { variant_id: VariantId("v1".into()), anim_ref: "anim-1.json".into(), air, default_duration_frames: None, loop_range: None };
        let mut block = rect_only_block();
        block.hit_test_mode = HitTestMode::Mask;
        block.variants = vec![variant];

        let scene = SceneRuntime::new(Canvas { width: 200, height: 200, fps: 30, duration_frames: 100 }, vec![block], registry, crate::air::AssetIndex::default(), FxHashSet::default());

        assert_eq!(hit_test(&scene, Vec2::new(50.0, 50.0), 0, RenderMode::Preview), Some(BlockId("block-a".into())));
        assert_eq!(hit_test(&scene, Vec2::new(150.0, 150.0), 0, RenderMode::Preview), None);
    }
}
