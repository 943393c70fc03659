//! Render plan emitter (§4.4): wraps each visible block's AIR commands in
//! group/clip/transform scopes in stable `(zIndex, orderIndex)` order.

use super::block_transform::block_transform;
use super::commands::RenderCommand;
use crate::error::DiagnosticReport;
use crate::scene::{BlockRuntime, ContainerClip, SceneRuntime, VariantRuntime};

/// Selects whether a block emits its scene-chosen variant or is forced to
/// its `no-anim` edit variant regardless of any override.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    Preview,
    Edit,
}

/// Produces the full command stream for one scene frame, reading the
/// scene's stored user transforms, variant overrides, and user-media
/// presence flags. Deterministic: identical scene state and frame always
/// yield byte-identical output.
#[must_use]
pub fn render_commands(scene: &SceneRuntime, scene_frame_index: u32, mode: RenderMode) -> (Vec<RenderCommand>, DiagnosticReport) {
    let mut out = Vec::new();
    let mut diagnostics = DiagnosticReport::new();
    let canvas_size = (scene.canvas.width, scene.canvas.height);

    for block in &scene.blocks {
        if !block.visible_at(scene_frame_index) {
            continue;
        }

        let variant = resolve_variant(scene, block, mode);
        let local_frame = variant.local_frame_index(scene_frame_index as f32);
        let user_transform = scene.user_transform(&block.block_id);
        let binding_layer_visible = scene.user_media_present(&block.block_id);
        let anim_size = (variant.air.meta.width, variant.air.meta.height);

        out.push(RenderCommand::BeginGroup(format!("Block:{}", block.block_id.0)));

        let has_clip = matches!(block.container_clip, ContainerClip::SlotRect);
        if has_clip {
            out.push(RenderCommand::PushClipRect(block.rect_canvas));
        }

        out.push(RenderCommand::PushTransform(block_transform(anim_size, block.rect_canvas, canvas_size)));

        crate::air_emit::emit(&variant.air, local_frame, user_transform, binding_layer_visible, &mut out, &mut diagnostics);

        out.push(RenderCommand::PopTransform);
        if has_clip {
            out.push(RenderCommand::PopClipRect);
        }
        out.push(RenderCommand::EndGroup);
    }

    (out, diagnostics)
}

pub(crate) fn resolve_variant<'a>(scene: &'a SceneRuntime, block: &'a BlockRuntime, mode: RenderMode) -> &'a VariantRuntime {
    if mode == RenderMode::Edit {
        return block.variant(&block.edit_variant_id).expect("edit variant was validated at compile time");
    }
    scene.active_variant(block)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::air::{Air, AirMeta, AssetIndex, Binding, CompId, Composition, Layer, LayerContent, LayerId, Timing, Track};
    use crate::math::{Rect, Vec2};
    use crate::path::PathRegistry;
    use crate::scene::{BlockId, Canvas, HitTestMode, MediaType, UserTransformsAllowed, VariantId};
    use rustc_hash::{FxHashMap, FxHashSet};

    fn image_variant(variant_id: &str, anim_ref: &str, asset_id: &str) -> VariantRuntime {
        let binding_layer = Layer {
            id: LayerId(1),
            name: "image".to_string(),
            content: LayerContent::Image { namespaced_asset_id: asset_id.to_string(), width: 100, height: 100 },
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
        };
        let air = Air {
            meta: AirMeta { width: 540, height: 960, fps: 30.0, in_point: 0.0, out_point: 100.0, source_anim_ref: anim_ref.to_string() },
            compositions: {
                let mut m = FxHashMap::default();
                m.insert(CompId::Root, Composition { id: CompId::Root, width: 540, height: 960, layers: vec![binding_layer] });
                m
            },
            binding: Binding { key: "media".into(), bound_layer_id: LayerId(1), bound_asset_id: asset_id.to_string(), bound_comp_id: CompId::Root },
            asset_index: AssetIndex::default(),
        };
        VariantRuntime { variant_id: VariantId(variant_id.to_string()), anim_ref: anim_ref.to_string(), air, default_duration_frames: None, loop_range: None }
    }

    fn block(id: &str, variants: Vec<VariantRuntime>, selected: &str, edit: &str) -> BlockRuntime {
        BlockRuntime {
            block_id: BlockId(id.to_string()),
            z_index: 0,
            order_index: 0,
            rect_canvas: Rect::new(0.0, 0.0, 540.0, 960.0),
            input_rect: Rect::new(0.0, 0.0, 540.0, 960.0),
            timing: (0, 100),
            container_clip: ContainerClip::None,
            hit_test_mode: HitTestMode::Rect,
            allowed_media: vec![MediaType::Photo],
            user_transforms_allowed: UserTransformsAllowed::default(),
            variants,
            selected_variant_id: VariantId(selected.to_string()),
            edit_variant_id: VariantId(edit.to_string()),
        }
    }

    fn draw_asset_ids(commands: &[RenderCommand]) -> Vec<&str> {
        commands.iter().filter_map(|c| match c { RenderCommand::DrawImage { asset_id, .. } => Some(asset_id.as_str()), _ => None }).collect()
    }

    // Scenario E: overriding a block's selected variant changes which
    // asset it draws; edit mode always uses the `no-anim` variant.
    #[test]
    fn variant_override_selects_the_overridden_variant_and_edit_mode_ignores_it() {
        let block_01 = block(
            "block_01",
            vec![
                image_variant("v1", "anim-v1.json", "anim-v1.json|image_0"),
                image_variant("v2", "anim-v2.json", "anim-v2.json|image_0"),
                image_variant("no-anim", "anim-v1.json", "anim-noanim-1.json|image_0"),
            ],
            "v1",
            "no-anim",
        );
        let block_02 = block("block_02", vec![image_variant("v1", "anim-b2.json", "anim-b2.json|image_0"), image_variant("no-anim", "anim-b2.json", "anim-noanim-2.json|image_0")], "v1", "no-anim");

        let mut scene = SceneRuntime::new(Canvas { width: 540, height: 960, fps: 30, duration_frames: 100 }, vec![block_01, block_02], PathRegistry::new(), AssetIndex::default(), FxHashSet::default());
        scene.set_user_media_present(BlockId("block_01".into()), true);
        scene.set_user_media_present(BlockId("block_02".into()), true);

        scene.set_variant_override(BlockId("block_01".into()), VariantId("v2".into()));

        let (commands, _diagnostics) = render_commands(&scene, 0, RenderMode::Preview);
        let drawn = draw_asset_ids(&commands);
        assert!(drawn.contains(&"anim-v2.json|image_0"));
        assert!(drawn.contains(&"anim-b2.json|image_0"));

        let (edit_commands, _diagnostics) = render_commands(&scene, 0, RenderMode::Edit);
        let edit_drawn = draw_asset_ids(&edit_commands);
        assert!(edit_drawn.contains(&"anim-noanim-1.json|image_0"));
        assert!(edit_drawn.contains(&"anim-noanim-2.json|image_0"));
        assert!(!edit_drawn.contains(&"anim-v2.json|image_0"));
    }
}
