//! Scene compiler (§4.3): assembles per-block runtimes, merges asset
//! indices, and validates the mandatory `no-anim` edit variant.

use rustc_hash::{FxHashMap, FxHashSet};

use super::runtime::{
    BlockId, BlockRuntime, Canvas, ContainerClip, HitTestMode, MediaType, UserTransformsAllowed, VariantId,
    VariantRuntime,
};
use super::schema::{BlockDoc, SceneDocument};
use super::validate;
use crate::air::AssetIndex;
use crate::assets::AssetResolver;
use crate::compiler::{self, Document};
use crate::error::{CompileError, Diagnostic, DiagnosticReport, MotifError};
use crate::math::Rect;
use crate::path::PathRegistry;
use crate::scene::SceneRuntime;

const EDIT_VARIANT_ID: &str = "no-anim";
const MEDIA_INPUT_LAYER_NAME: &str = "mediaInput";

/// Compiles a full scene: runs the structural validator, then compiles
/// every block's variants into AIR sharing one scene-wide path registry.
///
/// Returns the assembled runtime plus a report of non-fatal warnings
/// (e.g. `slotRectAfterSettle` aliasing, asset-size mismatches across a
/// block's variants). An error return means either the structural
/// validator rejected the scene, or a fatal compile error aborted
/// assembly; no runtime is produced in either case.
pub fn compile_scene(
    doc: &SceneDocument,
    anim_documents: &FxHashMap<String, Document>,
    resolver: &AssetResolver,
) -> Result<(SceneRuntime, DiagnosticReport), MotifError> {
    let mut report = validate::validate_scene(doc);
    if report.has_errors() {
        return Err(MotifError::Validation(report));
    }

    let mut registry = PathRegistry::new();
    let mut merged_asset_index = AssetIndex::new();
    let mut binding_asset_ids: FxHashSet<String> = FxHashSet::default();
    let mut blocks = Vec::with_capacity(doc.media_blocks.len());

    for (order_index, block_doc) in doc.media_blocks.iter().enumerate() {
        let block = compile_block(block_doc, order_index as u32, doc.canvas.fps, anim_documents, &mut registry, &mut report)?;

        for variant in &block.variants {
            merged_asset_index.merge(variant.air.asset_index.clone());
            binding_asset_ids.insert(variant.air.binding.bound_asset_id.clone());
        }

        blocks.push(block);
    }

    check_asset_resolvability(&merged_asset_index, &binding_asset_ids, resolver, &mut report);

    if report.has_errors() {
        return Err(MotifError::Validation(report));
    }

    blocks.sort_by_key(|b| (b.z_index, b.order_index));

    let canvas = Canvas { width: doc.canvas.width, height: doc.canvas.height, fps: doc.canvas.fps, duration_frames: doc.canvas.duration_frames };
    let runtime = SceneRuntime::new(canvas, blocks, registry, merged_asset_index, binding_asset_ids);
    Ok((runtime, report))
}

fn compile_block(
    block_doc: &BlockDoc,
    order_index: u32,
    canvas_fps: u32,
    anim_documents: &FxHashMap<String, Document>,
    registry: &mut PathRegistry,
    report: &mut DiagnosticReport,
) -> Result<BlockRuntime, CompileError> {
    let block_id = BlockId(block_doc.block_id.clone());
    let mut variants = Vec::with_capacity(block_doc.variants.len());
    let mut reference_anim_size: Option<(u32, u32)> = None;

    for variant_doc in &block_doc.variants {
        let document = anim_documents.get(&variant_doc.anim_ref).ok_or_else(|| {
            CompileError::new("ANIM_DOCUMENT_MISSING", format!("variants[{}].animRef", variant_doc.variant_id), format!("no animation document loaded for animRef '{}'", variant_doc.anim_ref))
                .with_block_id(block_id.0.clone())
                .with_anim_ref(variant_doc.anim_ref.clone())
        })?;

        if document.w == 0 || document.h == 0 {
            return Err(CompileError::new("ANIM_ROOT_INVALID", format!("anim({}).w/h", variant_doc.anim_ref), "root composition has zero size")
                .with_block_id(block_id.0.clone())
                .with_anim_ref(variant_doc.anim_ref.clone()));
        }

        let air = compiler::compile(document, &variant_doc.anim_ref, &block_doc.input.binding_key, registry)?;

        if air.meta.fps as u32 != canvas_fps {
            return Err(CompileError::new("ANIM_FPS_MISMATCH", format!("anim({}).fr", variant_doc.anim_ref), format!("animation fps {} does not match canvas fps {canvas_fps}", air.meta.fps))
                .with_block_id(block_id.0.clone())
                .with_anim_ref(variant_doc.anim_ref.clone()));
        }

        let anim_size = (air.meta.width, air.meta.height);
        match reference_anim_size {
            None => reference_anim_size = Some(anim_size),
            Some(first) if first != anim_size => {
                report.push(Diagnostic::warning(
                    "WARNING_ANIM_SIZE_MISMATCH",
                    format!("variants[{}]", variant_doc.variant_id),
                    format!("variant animation size {anim_size:?} differs from block's first variant size {first:?}"),
                ));
            }
            _ => {}
        }

        variants.push(VariantRuntime {
            variant_id: VariantId(variant_doc.variant_id.clone()),
            anim_ref: variant_doc.anim_ref.clone(),
            air,
            default_duration_frames: variant_doc.default_duration_frames,
            loop_range: variant_doc.loop_range.map(|r| (r.start_frame, r.end_frame)),
        });
    }

    let edit_variant_id = VariantId(EDIT_VARIANT_ID.to_string());
    let edit_variant = variants
        .iter()
        .find(|v| v.variant_id == edit_variant_id)
        .ok_or_else(|| CompileError::new("EDIT_VARIANT_MISSING", "variants[]", "block has no 'no-anim' variant").with_block_id(block_id.0.clone()))?;

    validate_edit_variant(edit_variant, &block_id.0)?;

    let selected_variant_id = variants[0].variant_id.clone();

    Ok(BlockRuntime {
        block_id,
        z_index: block_doc.z_index,
        order_index,
        rect_canvas: Rect::new(block_doc.rect.x, block_doc.rect.y, block_doc.rect.width, block_doc.rect.height),
        input_rect: Rect::new(block_doc.input.rect.x, block_doc.input.rect.y, block_doc.input.rect.width, block_doc.input.rect.height),
        timing: resolve_timing(block_doc),
        container_clip: resolve_container_clip(block_doc),
        hit_test_mode: if block_doc.input.hit_test == "mask" { HitTestMode::Mask } else { HitTestMode::Rect },
        allowed_media: block_doc.input.allowed_media.iter().filter_map(|m| MediaType::parse(m)).collect(),
        user_transforms_allowed: block_doc
            .input
            .user_transforms_allowed
            .map(|u| UserTransformsAllowed { pan: u.pan, zoom: u.zoom, rotate: u.rotate })
            .unwrap_or_default(),
        variants,
        selected_variant_id,
        edit_variant_id,
    })
}

fn validate_edit_variant(variant: &VariantRuntime, block_id: &str) -> Result<(), CompileError> {
    let root = variant.air.root();
    let has_media_input = root.layers.iter().any(|l| l.name == MEDIA_INPUT_LAYER_NAME);
    if !has_media_input {
        return Err(CompileError::new("EDIT_VARIANT_NO_MEDIA_INPUT", "layers[]", format!("'no-anim' variant has no '{MEDIA_INPUT_LAYER_NAME}' shape layer")).with_block_id(block_id.to_string()));
    }

    let binding_comp = variant.air.composition(&variant.air.binding.bound_comp_id).ok_or_else(|| {
        CompileError::new("BINDING_LAYER_NOT_FOUND", "layers[]", "binding layer's composition not found").with_block_id(block_id.to_string())
    })?;
    let binding_layer = binding_comp.layer(variant.air.binding.bound_layer_id).ok_or_else(|| {
        CompileError::new("BINDING_LAYER_NOT_FOUND", "layers[]", "binding layer not found in its composition").with_block_id(block_id.to_string())
    })?;
    if !binding_layer.visible_at(0.0) {
        return Err(CompileError::new("EDIT_VARIANT_BINDING_NOT_VISIBLE", format!("layers[ind={}]", binding_layer.id.0), "binding layer is not visible at the edit frame (0)").with_block_id(block_id.to_string()));
    }

    Ok(())
}

fn resolve_timing(block_doc: &BlockDoc) -> (u32, u32) {
    match block_doc.timing {
        Some(t) => (t.start_frame.min(t.end_frame), t.end_frame),
        None => (0, u32::MAX),
    }
}

fn resolve_container_clip(block_doc: &BlockDoc) -> ContainerClip {
    match block_doc.container_clip.as_deref() {
        Some("slotRect" | "slotRectAfterSettle") => ContainerClip::SlotRect,
        _ => ContainerClip::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{AssetCatalog, AssetResolver};
    use crate::compiler::Document;

    /// A single-layer animation: an image layer named `media` (the default
    /// binding key) plus a `mediaInput` shape layer providing the
    /// input-clip outline, as every `no-anim` variant must.
    fn anim_document(fr: f32) -> Document {
        let json = serde_json::json!({
            "w": 540, "h": 960, "fr": fr, "ip": 0, "op": 100,
            "assets": [],
            "layers": [
                {
                    "ty": 2, "ind": 1, "nm": "media", "ip": 0, "op": 100, "st": 0,
                    "refId": "img_0", "w": 100, "h": 100,
                    "ks": {
                        "p": {"a": 0, "k": [0.0, 0.0]},
                        "s": {"a": 0, "k": [100.0, 100.0]},
                        "r": {"a": 0, "k": 0.0},
                        "o": {"a": 0, "k": 100.0},
                        "a": {"a": 0, "k": [0.0, 0.0]}
                    }
                },
                {
                    "ty": 4, "ind": 2, "nm": "mediaInput", "ip": 0, "op": 100, "st": 0,
                    "ks": {
                        "p": {"a": 0, "k": [0.0, 0.0]},
                        "s": {"a": 0, "k": [100.0, 100.0]},
                        "r": {"a": 0, "k": 0.0},
                        "o": {"a": 0, "k": 100.0},
                        "a": {"a": 0, "k": [0.0, 0.0]}
                    },
                    "shapes": [
                        {
                            "ty": "gr",
                            "it": [
                                {
                                    "ty": "sh",
                                    "ks": {
                                        "a": 0,
                                        "k": { "v": [[0.0, 0.0], [100.0, 0.0], [100.0, 100.0], [0.0, 100.0]], "i": [[0.0,0.0],[0.0,0.0],[0.0,0.0],[0.0,0.0]], "o": [[0.0,0.0],[0.0,0.0],[0.0,0.0],[0.0,0.0]], "c": true }
                                    }
                                },
                                { "ty": "fl", "c": {"a": 0, "k": [1.0, 1.0, 1.0, 1.0]}, "o": {"a": 0, "k": 100.0} }
                            ]
                        }
                    ]
                }
            ]
        });
        serde_json::from_value(json).expect("fixture anim document must parse")
    }

    /// Like [`anim_document`] but with an extra, non-binding image layer
    /// whose asset is never whitelisted as a binding placeholder, so it
    /// must actually resolve through the asset resolver.
    fn anim_document_with_unresolvable_extra_asset(fr: f32) -> Document {
        let json = serde_json::json!({
            "w": 540, "h": 960, "fr": fr, "ip": 0, "op": 100,
            "assets": [],
            "layers": [
                {
                    "ty": 2, "ind": 1, "nm": "media", "ip": 0, "op": 100, "st": 0,
                    "refId": "img_0", "w": 100, "h": 100,
                    "ks": {
                        "p": {"a": 0, "k": [0.0, 0.0]},
                        "s": {"a": 0, "k": [100.0, 100.0]},
                        "r": {"a": 0, "k": 0.0},
                        "o": {"a": 0, "k": 100.0},
                        "a": {"a": 0, "k": [0.0, 0.0]}
                    }
                },
                {
                    "ty": 2, "ind": 2, "nm": "backgroundPlate", "ip": 0, "op": 100, "st": 0,
                    "refId": "img_missing", "w": 100, "h": 100,
                    "ks": {
                        "p": {"a": 0, "k": [0.0, 0.0]},
                        "s": {"a": 0, "k": [100.0, 100.0]},
                        "r": {"a": 0, "k": 0.0},
                        "o": {"a": 0, "k": 100.0},
                        "a": {"a": 0, "k": [0.0, 0.0]}
                    }
                },
                {
                    "ty": 4, "ind": 3, "nm": "mediaInput", "ip": 0, "op": 100, "st": 0,
                    "ks": {
                        "p": {"a": 0, "k": [0.0, 0.0]},
                        "s": {"a": 0, "k": [100.0, 100.0]},
                        "r": {"a": 0, "k": 0.0},
                        "o": {"a": 0, "k": 100.0},
                        "a": {"a": 0, "k": [0.0, 0.0]}
                    },
                    "shapes": [
                        {
                            "ty": "gr",
                            "it": [
                                {
                                    "ty": "sh",
                                    "ks": {
                                        "a": 0,
                                        "k": { "v": [[0.0, 0.0], [100.0, 0.0], [100.0, 100.0], [0.0, 100.0]], "i": [[0.0,0.0],[0.0,0.0],[0.0,0.0],[0.0,0.0]], "o": [[0.0,0.0],[0.0,0.0],[0.0,0.0],[0.0,0.0]], "c": true }
                                    }
                                },
                                { "ty": "fl", "c": {"a": 0, "k": [1.0, 1.0, 1.0, 1.0]}, "o": {"a": 0, "k": 100.0} }
                            ]
                        }
                    ]
                }
            ]
        });
        serde_json::from_value(json).expect("fixture anim document must parse")
    }

    fn scene_document(variants_json: &str) -> SceneDocument {
        let json = format!(
            r#"{{
                "schemaVersion": "0.1",
                "sceneId": "scene-1",
                "canvas": {{ "width": 540, "height": 960, "fps": 30, "durationFrames": 100 }},
                "mediaBlocks": [
                    {{
                        "blockId": "block_01",
                        "zIndex": 0,
                        "rect": {{ "x": 0, "y": 0, "width": 540, "height": 960 }},
                        "input": {{ "rect": {{ "x": 0, "y": 0, "width": 540, "height": 960 }}, "allowedMedia": ["photo"] }},
                        "variants": [{variants_json}]
                    }}
                ]
            }}"#
        );
        serde_json::from_str(&json).expect("fixture scene document must parse")
    }

    fn resolver_with_image_asset() -> AssetResolver {
        let mut local = AssetCatalog::new();
        local.insert("img_0", "images/img_0.png");
        AssetResolver::new(local, AssetCatalog::new())
    }

    #[test]
    fn compiles_a_minimal_scene_with_its_no_anim_variant() {
        let scene = scene_document(r#"{"variantId": "no-anim", "animRef": "anim-1.json"}"#);
        let mut anim_documents = FxHashMap::default();
        anim_documents.insert("anim-1.json".to_string(), anim_document(30.0));
        let resolver = resolver_with_image_asset();

        let (runtime, report) = compile_scene(&scene, &anim_documents, &resolver).expect("scene should compile");
        assert!(!report.has_errors());
        assert_eq!(runtime.blocks.len(), 1);
        assert_eq!(runtime.blocks[0].edit_variant_id, VariantId("no-anim".to_string()));
    }

    #[test]
    fn missing_no_anim_variant_is_fatal() {
        let scene = scene_document(r#"{"variantId": "v1", "animRef": "anim-1.json"}"#);
        let mut anim_documents = FxHashMap::default();
        anim_documents.insert("anim-1.json".to_string(), anim_document(30.0));
        let resolver = resolver_with_image_asset();

        let err = compile_scene(&scene, &anim_documents, &resolver).unwrap_err();
        match err {
            MotifError::Compile(e) => assert_eq!(e.code, "EDIT_VARIANT_MISSING"),
            other => panic!("expected a compile error, got {other:?}"),
        }
    }

    #[test]
    fn canvas_fps_mismatch_with_animation_fps_is_fatal() {
        let scene = scene_document(r#"{"variantId": "no-anim", "animRef": "anim-1.json"}"#);
        let mut anim_documents = FxHashMap::default();
        anim_documents.insert("anim-1.json".to_string(), anim_document(24.0));
        let resolver = resolver_with_image_asset();

        let err = compile_scene(&scene, &anim_documents, &resolver).unwrap_err();
        match err {
            MotifError::Compile(e) => assert_eq!(e.code, "ANIM_FPS_MISMATCH"),
            other => panic!("expected a compile error, got {other:?}"),
        }
    }

    #[test]
    fn missing_asset_without_a_local_or_shared_catalog_entry_is_an_error() {
        let scene = scene_document(r#"{"variantId": "no-anim", "animRef": "anim-1.json"}"#);
        let mut anim_documents = FxHashMap::default();
        anim_documents.insert("anim-1.json".to_string(), anim_document_with_unresolvable_extra_asset(30.0));

        let err = compile_scene(&scene, &anim_documents, &resolver_with_image_asset()).unwrap_err();
        match err {
            MotifError::Validation(report) => assert!(report.diagnostics.iter().any(|d| d.code == "ASSET_MISSING")),
            other => panic!("expected a validation error, got {other:?}"),
        }
    }

    #[test]
    fn structurally_invalid_scene_is_rejected_before_compiling_any_animation() {
        let mut scene = scene_document(r#"{"variantId": "no-anim", "animRef": "anim-1.json"}"#);
        scene.canvas.width = 0;
        let anim_documents = FxHashMap::default();
        let err = compile_scene(&scene, &anim_documents, &AssetResolver::default()).unwrap_err();
        match err {
            MotifError::Validation(report) => assert!(report.diagnostics.iter().any(|d| d.code == "CANVAS_INVALID_WIDTH")),
            other => panic!("expected a validation error, got {other:?}"),
        }
    }
}

fn check_asset_resolvability(
    asset_index: &AssetIndex,
    binding_asset_ids: &FxHashSet<String>,
    resolver: &AssetResolver,
    report: &mut DiagnosticReport,
) {
    for (namespaced_id, entry) in asset_index.iter() {
        if binding_asset_ids.contains(namespaced_id) {
            continue;
        }
        if resolver.resolve(&entry.basename).is_none() {
            report.push(Diagnostic::error("ASSET_MISSING", namespaced_id.to_string(), format!("asset '{}' could not be resolved", entry.basename)));
        }
    }
}
