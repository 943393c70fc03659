//! Scene JSON structural validator. Produces a [`DiagnosticReport`]; the
//! caller decides whether to reject a package whose report has errors.
//! Warnings (e.g. the `slotRectAfterSettle` container-clip alias) never
//! block compilation.

use rustc_hash::FxHashSet;

use super::schema::{BlockDoc, SceneDocument};
use crate::error::{Diagnostic, DiagnosticReport};

const SUPPORTED_SCHEMA_VERSION: &str = "0.1";
const KNOWN_MEDIA_TYPES: &[&str] = &["photo", "video", "color"];

#[must_use]
pub fn validate_scene(doc: &SceneDocument) -> DiagnosticReport {
    let mut report = DiagnosticReport::new();

    if doc.schema_version != SUPPORTED_SCHEMA_VERSION {
        report.push(Diagnostic::error("SCENE_UNSUPPORTED_VERSION", "schemaVersion", format!("unsupported schema version '{}'", doc.schema_version)));
    }

    if doc.canvas.width == 0 {
        report.push(Diagnostic::error("CANVAS_INVALID_WIDTH", "canvas.width", "canvas width must be > 0"));
    }
    if doc.canvas.height == 0 {
        report.push(Diagnostic::error("CANVAS_INVALID_HEIGHT", "canvas.height", "canvas height must be > 0"));
    }
    if doc.canvas.fps == 0 {
        report.push(Diagnostic::error("CANVAS_INVALID_FPS", "canvas.fps", "canvas fps must be > 0"));
    }
    if doc.canvas.duration_frames == 0 {
        report.push(Diagnostic::error("CANVAS_INVALID_DURATION", "canvas.durationFrames", "canvas durationFrames must be > 0"));
    }

    if doc.media_blocks.is_empty() {
        report.push(Diagnostic::error("BLOCKS_EMPTY", "mediaBlocks", "scene must declare at least one block"));
    }

    let mut seen_block_ids = FxHashSet::default();
    for (index, block) in doc.media_blocks.iter().enumerate() {
        let path = format!("mediaBlocks[{index}]");
        if !seen_block_ids.insert(block.block_id.clone()) {
            report.push(Diagnostic::error("BLOCK_ID_DUPLICATE", format!("{path}.blockId"), format!("duplicate blockId '{}'", block.block_id)));
        }
        validate_block(block, &path, doc.canvas.duration_frames, &mut report);
    }

    report
}

fn validate_block(block: &BlockDoc, path: &str, duration_frames: u32, report: &mut DiagnosticReport) {
    if block.rect.width <= 0.0 || block.rect.height <= 0.0 {
        report.push(Diagnostic::error("RECT_INVALID", format!("{path}.rect"), "block rect must have positive width and height"));
    }
    if block.input.rect.width <= 0.0 || block.input.rect.height <= 0.0 {
        report.push(Diagnostic::error("RECT_INVALID", format!("{path}.input.rect"), "input rect must have positive width and height"));
    }

    if let Some(clip) = &block.container_clip {
        match clip.as_str() {
            "none" | "slotRect" => {}
            "slotRectAfterSettle" => {
                report.push(Diagnostic::warning("W_CLIP_SETTLE_UNSUPPORTED", format!("{path}.containerClip"), "slotRectAfterSettle is treated as slotRect"));
            }
            other => {
                report.push(Diagnostic::error("CONTAINERCLIP_UNSUPPORTED", format!("{path}.containerClip"), format!("unsupported containerClip '{other}'")));
            }
        }
    }

    if let Some(timing) = block.timing {
        if timing.start_frame >= timing.end_frame || timing.end_frame > duration_frames {
            report.push(Diagnostic::error("TIMING_INVALID_RANGE", format!("{path}.timing"), "timing range must satisfy startFrame < endFrame <= canvas duration"));
        }
    }

    if block.input.binding_key.is_empty() {
        report.push(Diagnostic::error("INPUT_BINDINGKEY_EMPTY", format!("{path}.input.bindingKey"), "bindingKey must not be empty"));
    }

    if block.input.allowed_media.is_empty() {
        report.push(Diagnostic::error("ALLOWEDMEDIA_EMPTY", format!("{path}.input.allowedMedia"), "allowedMedia must not be empty"));
    } else {
        let mut seen = FxHashSet::default();
        for media in &block.input.allowed_media {
            if !KNOWN_MEDIA_TYPES.contains(&media.as_str()) {
                report.push(Diagnostic::error("ALLOWEDMEDIA_INVALID", format!("{path}.input.allowedMedia"), format!("unknown media type '{media}'")));
            }
            if !seen.insert(media.clone()) {
                report.push(Diagnostic::error("ALLOWEDMEDIA_DUPLICATE", format!("{path}.input.allowedMedia"), format!("duplicate media type '{media}'")));
            }
        }
    }

    if block.variants.is_empty() {
        report.push(Diagnostic::error("VARIANTS_EMPTY", format!("{path}.variants"), "block must declare at least one variant"));
    }

    let mut seen_variant_ids = FxHashSet::default();
    for (vi, variant) in block.variants.iter().enumerate() {
        let vpath = format!("{path}.variants[{vi}]");
        if variant.variant_id.is_empty() {
            report.push(Diagnostic::error("VARIANT_ID_EMPTY", format!("{vpath}.variantId"), "variantId must not be empty"));
        } else if !seen_variant_ids.insert(variant.variant_id.clone()) {
            report.push(Diagnostic::error("VARIANT_ID_DUPLICATE", format!("{vpath}.variantId"), format!("duplicate variantId '{}'", variant.variant_id)));
        }
        if variant.anim_ref.is_empty() {
            report.push(Diagnostic::error("VARIANT_ANIMREF_EMPTY", format!("{vpath}.animRef"), "animRef must not be empty"));
        }
        if let Some(loop_range) = variant.loop_range {
            if loop_range.start_frame >= loop_range.end_frame {
                report.push(Diagnostic::error("TIMING_INVALID_RANGE", format!("{vpath}.loopRange"), "loopRange must satisfy startFrame < endFrame"));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_scene(overrides: &str) -> SceneDocument {
        let json = format!(
            r#"{{
                "schemaVersion": "0.1",
                "sceneId": "scene-1",
                "canvas": {{ "width": 1080, "height": 1920, "fps": 30, "durationFrames": 300 }},
                "mediaBlocks": [
                    {{
                        "blockId": "block_01",
                        "zIndex": 0,
                        "rect": {{ "x": 0, "y": 0, "width": 540, "height": 960 }},
                        "input": {{
                            "rect": {{ "x": 0, "y": 0, "width": 540, "height": 960 }},
                            "allowedMedia": ["photo"]
                        }},
                        "variants": [ {{ "variantId": "v1", "animRef": "anim-1.json" }} ]
                        {overrides}
                    }}
                ]
            }}"#
        );
        serde_json::from_str(&json).expect("fixture must parse")
    }

    #[test]
    fn well_formed_minimal_scene_has_no_errors() {
        let doc = minimal_scene("");
        let report = validate_scene(&doc);
        assert!(!report.has_errors(), "{:?}", report.diagnostics);
    }

    #[test]
    fn unsupported_schema_version_is_an_error() {
        let mut doc = minimal_scene("");
        doc.schema_version = "9.9".to_string();
        let report = validate_scene(&doc);
        assert!(report.diagnostics.iter().any(|d| d.code == "SCENE_UNSUPPORTED_VERSION"));
    }

    #[test]
    fn zero_sized_canvas_dimensions_are_errors() {
        let mut doc = minimal_scene("");
        doc.canvas.width = 0;
        doc.canvas.fps = 0;
        let report = validate_scene(&doc);
        assert!(report.diagnostics.iter().any(|d| d.code == "CANVAS_INVALID_WIDTH"));
        assert!(report.diagnostics.iter().any(|d| d.code == "CANVAS_INVALID_FPS"));
    }

    #[test]
    fn empty_media_blocks_is_an_error() {
        let mut doc = minimal_scene("");
        doc.media_blocks.clear();
        let report = validate_scene(&doc);
        assert!(report.diagnostics.iter().any(|d| d.code == "BLOCKS_EMPTY"));
    }

    #[test]
    fn duplicate_block_ids_are_flagged() {
        let mut doc = minimal_scene("");
        let mut second = doc.media_blocks[0].clone();
        second.z_index = 1;
        doc.media_blocks.push(second);
        let report = validate_scene(&doc);
        assert!(report.diagnostics.iter().any(|d| d.code == "BLOCK_ID_DUPLICATE"));
    }

    #[test]
    fn slot_rect_after_settle_is_a_warning_not_an_error() {
        let doc = minimal_scene(r#", "containerClip": "slotRectAfterSettle""#);
        let report = validate_scene(&doc);
        assert!(!report.has_errors());
        assert!(report.warnings().any(|d| d.code == "W_CLIP_SETTLE_UNSUPPORTED"));
    }

    #[test]
    fn unknown_container_clip_value_is_an_error() {
        let doc = minimal_scene(r#", "containerClip": "bogus""#);
        let report = validate_scene(&doc);
        assert!(report.diagnostics.iter().any(|d| d.code == "CONTAINERCLIP_UNSUPPORTED"));
    }

    #[test]
    fn duplicate_and_unknown_allowed_media_are_flagged() {
        let mut doc = minimal_scene("");
        doc.media_blocks[0].input.allowed_media = vec!["photo".to_string(), "photo".to_string(), "carrier-pigeon".to_string()];
        let report = validate_scene(&doc);
        assert!(report.diagnostics.iter().any(|d| d.code == "ALLOWEDMEDIA_DUPLICATE"));
        assert!(report.diagnostics.iter().any(|d| d.code == "ALLOWEDMEDIA_INVALID"));
    }

    #[test]
    fn timing_range_must_be_ordered_and_within_canvas_duration() {
        let mut doc = minimal_scene("");
        doc.media_blocks[0].timing = Some(super::schema::TimingDoc { start_frame: 50, end_frame: 400 });
        let report = validate_scene(&doc);
        assert!(report.diagnostics.iter().any(|d| d.code == "TIMING_INVALID_RANGE"));
    }

    #[test]
    fn duplicate_variant_ids_are_flagged() {
        let mut doc = minimal_scene("");
        let variant = doc.media_blocks[0].variants[0].clone();
        doc.media_blocks[0].variants.push(variant);
        let report = validate_scene(&doc);
        assert!(report.diagnostics.iter().any(|d| d.code == "VARIANT_ID_DUPLICATE"));
    }
}
