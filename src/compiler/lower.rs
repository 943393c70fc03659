//! Lowers a decoded [`Document`] into [`Air`]: layer compilation, path
//! registration for masks and shape-matte sources, and asset namespacing.
//! Matte pairing and binding discovery are separate passes (§4.2).

use rustc_hash::FxHashMap;

use super::document::{
    Document, KeyframeDoc, LayerDoc, MaskDoc, PropertyDoc, PropertyValue, ShapeItemDoc, ShapePropertyValue,
    ShapeValue, SUPPORTED_SHAPE_ITEM_TYPES,
};
use super::matte_resolve::RawMatteInfo;
use crate::air::{
    AirMeta, AssetEntry, AssetIndex, CompId, Composition, Layer, LayerContent, LayerId, Mask, MaskMode, Track,
    Keyframe as AirKeyframe, Timing,
};
use crate::error::CompileError;
use crate::math::{CubicBezier, Vec2};
use crate::path::{Easing, PathRegistry, PathResource};

/// Everything [`lower_document`] can produce before matte pairing and
/// binding discovery run as later passes over the same compositions.
pub struct LoweredDocument {
    pub meta: AirMeta,
    pub compositions: FxHashMap<CompId, Composition>,
    pub raw_matte_info: FxHashMap<CompId, Vec<RawMatteInfo>>,
    pub asset_index: AssetIndex,
}

/// Lowers `document` (the vector animation JSON for `anim_ref`) into a
/// partially built AIR, registering every mask and shape-matte path into
/// `registry`. Matte pairing ([`super::matte_resolve`]) and binding
/// discovery ([`super::binding_discovery`]) run afterward.
pub fn lower_document(document: &Document, anim_ref: &str, registry: &mut PathRegistry) -> Result<LoweredDocument, CompileError> {
    let mut compositions = FxHashMap::default();
    let mut raw_matte_info = FxHashMap::default();
    let mut asset_index = AssetIndex::new();

    let (root_layers, root_raw) = compile_layers(&document.layers, anim_ref, registry, &mut asset_index)?;
    compositions.insert(CompId::Root, Composition { id: CompId::Root, width: document.w, height: document.h, layers: root_layers });
    raw_matte_info.insert(CompId::Root, root_raw);

    for asset in &document.assets {
        let Some(precomp_layers) = &asset.layers else { continue };
        let id = CompId::named(asset.id.clone());
        let (layers, raw) = compile_layers(precomp_layers, anim_ref, registry, &mut asset_index)?;
        let width = asset.w.unwrap_or(document.w);
        let height = asset.h.unwrap_or(document.h);
        compositions.insert(id.clone(), Composition { id: id.clone(), width, height, layers });
        raw_matte_info.insert(id, raw);
    }

    let meta = AirMeta {
        width: document.w,
        height: document.h,
        fps: document.fr,
        in_point: document.ip,
        out_point: document.op,
        source_anim_ref: anim_ref.to_string(),
    };

    Ok(LoweredDocument { meta, compositions, raw_matte_info, asset_index })
}

fn compile_layers(
    docs: &[LayerDoc],
    anim_ref: &str,
    registry: &mut PathRegistry,
    asset_index: &mut AssetIndex,
) -> Result<(Vec<Layer>, Vec<RawMatteInfo>), CompileError> {
    let layers = docs.iter().map(|doc| compile_layer(doc, anim_ref, registry, asset_index)).collect::<Result<Vec<_>, _>>()?;
    let raw = docs.iter().map(|doc| RawMatteInfo { ind: doc.ind, tt: doc.tt, tp: doc.tp }).collect();
    Ok((layers, raw))
}

fn compile_layer(
    doc: &LayerDoc,
    anim_ref: &str,
    registry: &mut PathRegistry,
    asset_index: &mut AssetIndex,
) -> Result<Layer, CompileError> {
    let content = match doc.ty {
        0 => {
            let ref_id = doc.ref_id.clone().ok_or_else(|| {
                CompileError::new("PRECOMP_REF_MISSING", format!("layers[ind={}]", doc.ind), "precomp layer missing refId")
                    .with_anim_ref(anim_ref)
            })?;
            LayerContent::Precomp {
                ref_comp: CompId::named(ref_id),
                width: doc.w.unwrap_or(0),
                height: doc.h.unwrap_or(0),
            }
        }
        2 => {
            let ref_id = doc.ref_id.clone().unwrap_or_default();
            let namespaced = AssetIndex::namespace(anim_ref, &ref_id);
            let basename = ref_id.rsplit('/').next().unwrap_or(&ref_id).to_string();
            asset_index.insert(namespaced.clone(), AssetEntry { relative_path: ref_id, size: None, basename });
            LayerContent::Image { namespaced_asset_id: namespaced, width: doc.w.unwrap_or(0), height: doc.h.unwrap_or(0) }
        }
        3 => LayerContent::Null,
        4 => {
            let (path_id, fill_color, fill_opacity) = compile_shape_matte_source(&doc.shapes, registry)
                .ok_or_else(|| {
                    CompileError::new("MATTE_PATH_BUILD_FAILED", format!("layers[ind={}].shapes", doc.ind), "shape-matte source has no usable path/fill")
                        .with_anim_ref(anim_ref)
                })?;
            LayerContent::ShapeMatte { path_id, fill_color, fill_opacity, stroke: None }
        }
        other => {
            return Err(CompileError::new(
                "UNSUPPORTED_LAYER_TYPE",
                format!("layers[ind={}].ty", doc.ind),
                format!("layer type {other} is not supported"),
            )
            .with_anim_ref(anim_ref));
        }
    };

    for item in unsupported_shape_items(&doc.shapes) {
        return Err(CompileError::new("UNSUPPORTED_SHAPE_ITEM", format!("layers[ind={}].shapes", doc.ind), format!("shape item type '{item}' is not supported")).with_anim_ref(anim_ref));
    }

    let masks = doc
        .masks_properties
        .iter()
        .map(|mask_doc| compile_mask(mask_doc, registry))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|err: &'static str| CompileError::new(err, format!("layers[ind={}].masksProperties", doc.ind), "mask compilation failed").with_anim_ref(anim_ref))?;

    Ok(Layer {
        id: LayerId(doc.ind),
        name: doc.nm.clone(),
        content,
        timing: Timing { in_point: doc.ip, out_point: doc.op, start_time: doc.st },
        parent_id: doc.parent.map(LayerId),
        position: track_vec2(&doc.ks.p),
        scale: track_vec2(&doc.ks.s),
        rotation: track_f32(&doc.ks.r),
        opacity: track_f32(&doc.ks.o),
        anchor: track_vec2(&doc.ks.a),
        masks,
        matte: None,
        is_matte_source: doc.td == Some(1),
        hidden: doc.hidden,
    })
}

fn unsupported_shape_items(items: &[ShapeItemDoc]) -> Vec<String> {
    let mut out = Vec::new();
    for item in items {
        if !SUPPORTED_SHAPE_ITEM_TYPES.contains(&item.ty.as_str()) {
            out.push(item.ty.clone());
        }
        out.extend(unsupported_shape_items(&item.it));
    }
    out
}

fn compile_mask(doc: &MaskDoc, registry: &mut PathRegistry) -> Result<Mask, &'static str> {
    let mode = match doc.mode.as_str() {
        "a" => MaskMode::Add,
        "s" => MaskMode::Subtract,
        "i" => MaskMode::Intersect,
        _ => return Err("UNSUPPORTED_MASK_MODE"),
    };
    // Inversion is supported by the GPU executor's mask scope directly, so
    // `doc.inv` needs no validator rejection here.

    let (animated, outline) = match &doc.pt.k {
        ShapePropertyValue::Static(shape) => (false, shape_outline(shape)),
        ShapePropertyValue::Keyframed(keyframes) => {
            if keyframes.len() > 1 {
                return Err("UNSUPPORTED_MASK_PATH_ANIMATED");
            }
            (true, keyframes.first().and_then(|k| k.s.first()).map(shape_outline).unwrap_or_default())
        }
    };

    let resource = PathResource::from_static_outline(&outline).map_err(|_| "MASK_PATH_BUILD_FAILED")?;
    let path_id = registry.register(resource);

    let static_opacity = match &doc.o.k {
        PropertyValue::Number(n) => *n / 100.0,
        PropertyValue::Array(arr) => arr.first().copied().unwrap_or(100.0) / 100.0,
        PropertyValue::Keyframed(kfs) => kfs.first().and_then(|k| k.s.first()).copied().unwrap_or(100.0) / 100.0,
    };

    Ok(Mask { mode, inverted: doc.inv, static_opacity, path_id, animated })
}

fn compile_shape_matte_source(
    items: &[ShapeItemDoc],
    registry: &mut PathRegistry,
) -> Option<(crate::path::PathId, [f32; 4], Track<f32>)> {
    let shape_value = find_path_value(items)?;
    let outline = shape_outline(shape_value);
    let resource = PathResource::from_static_outline(&outline).ok()?;
    let path_id = registry.register(resource);
    let (color, opacity) = find_fill(items).unwrap_or(([1.0, 1.0, 1.0, 1.0], Track::static_value(1.0)));
    Some((path_id, color, opacity))
}

fn find_path_value(items: &[ShapeItemDoc]) -> Option<&ShapeValue> {
    for item in items {
        if item.ty == "sh" {
            if let Some(ks) = &item.ks {
                match &ks.k {
                    ShapePropertyValue::Static(v) => return Some(v),
                    ShapePropertyValue::Keyframed(kfs) => return kfs.first().and_then(|k| k.s.first()),
                }
            }
        }
        if item.ty == "gr" {
            if let Some(found) = find_path_value(&item.it) {
                return Some(found);
            }
        }
    }
    None
}

fn find_fill(items: &[ShapeItemDoc]) -> Option<([f32; 4], Track<f32>)> {
    for item in items {
        if item.ty == "fl" {
            let color = item
                .c
                .as_ref()
                .map(|c| property_to_rgba(c))
                .unwrap_or([1.0, 1.0, 1.0, 1.0]);
            let opacity = item.o.as_ref().map(track_f32_normalized).unwrap_or_else(|| Track::static_value(1.0));
            return Some((color, opacity));
        }
        if item.ty == "gr" {
            if let Some(found) = find_fill(&item.it) {
                return Some(found);
            }
        }
    }
    None
}

fn property_to_rgba(prop: &PropertyDoc) -> [f32; 4] {
    let values = match &prop.k {
        PropertyValue::Array(arr) => arr.clone(),
        PropertyValue::Keyframed(kfs) => kfs.first().map(|k| k.s.clone()).unwrap_or_default(),
        PropertyValue::Number(n) => vec![*n],
    };
    [
        values.first().copied().unwrap_or(1.0),
        values.get(1).copied().unwrap_or(1.0),
        values.get(2).copied().unwrap_or(1.0),
        values.get(3).copied().unwrap_or(1.0),
    ]
}

/// Like [`track_f32`] but normalizes a `0..100` opacity property to `0..1`.
fn track_f32_normalized(prop: &PropertyDoc) -> Track<f32> {
    match track_f32(prop) {
        Track::Static(v) => Track::static_value(v / 100.0),
        Track::Keyframed { keyframes, segment_easing } => Track::Keyframed {
            keyframes: keyframes.into_iter().map(|k| AirKeyframe { time: k.time, value: k.value / 100.0 }).collect(),
            segment_easing,
        },
    }
}

fn shape_outline(shape: &ShapeValue) -> Vec<Vec2> {
    let vertex_count = shape.v.len();
    if vertex_count < 2 {
        return shape.v.iter().map(|v| Vec2::new(v[0], v[1])).collect();
    }
    let segment_count = if shape.c { vertex_count } else { vertex_count - 1 };
    let mut segments = Vec::with_capacity(segment_count);
    for i in 0..segment_count {
        let next = (i + 1) % vertex_count;
        let p0 = Vec2::new(shape.v[i][0], shape.v[i][1]);
        let p1 = Vec2::new(shape.v[next][0], shape.v[next][1]);
        let out_tangent = shape.o.get(i).map(|t| Vec2::new(t[0], t[1]) - p0).unwrap_or(Vec2::ZERO);
        let in_tangent = shape.i.get(next).map(|t| Vec2::new(t[0], t[1]) - p1).unwrap_or(Vec2::ZERO);
        segments.push(CubicBezier::new(p0, out_tangent, in_tangent, p1));
    }
    crate::math::flatten_outline(&segments, 8)
}

fn track_f32(prop: &PropertyDoc) -> Track<f32> {
    match &prop.k {
        PropertyValue::Number(n) => Track::static_value(*n),
        PropertyValue::Array(arr) => Track::static_value(arr.first().copied().unwrap_or(0.0)),
        PropertyValue::Keyframed(kfs) => {
            let keyframes = kfs.iter().map(|k| AirKeyframe { time: k.t, value: k.s.first().copied().unwrap_or(0.0) }).collect();
            Track::keyframed(keyframes, build_segment_easing(kfs))
        }
    }
}

fn track_vec2(prop: &PropertyDoc) -> Track<Vec2> {
    match &prop.k {
        PropertyValue::Number(n) => Track::static_value(Vec2::new(*n, *n)),
        PropertyValue::Array(arr) => {
            Track::static_value(Vec2::new(arr.first().copied().unwrap_or(0.0), arr.get(1).copied().unwrap_or(0.0)))
        }
        PropertyValue::Keyframed(kfs) => {
            let keyframes = kfs
                .iter()
                .map(|k| AirKeyframe { time: k.t, value: Vec2::new(k.s.first().copied().unwrap_or(0.0), k.s.get(1).copied().unwrap_or(0.0)) })
                .collect();
            Track::keyframed(keyframes, build_segment_easing(kfs))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prop(json: &str) -> PropertyDoc {
        serde_json::from_str(json).expect("fixture must parse")
    }

    fn mask_doc(json: &str) -> MaskDoc {
        serde_json::from_str(json).expect("fixture must parse")
    }

    fn shape_item(json: &str) -> ShapeItemDoc {
        serde_json::from_str(json).expect("fixture must parse")
    }

    #[test]
    fn track_f32_from_a_plain_number_is_static() {
        let track = track_f32(&prop(r#"{"a": 0, "k": 42.0}"#));
        assert_eq!(track, Track::static_value(42.0));
    }

    #[test]
    fn track_f32_from_a_single_element_array_is_static() {
        let track = track_f32(&prop(r#"{"a": 0, "k": [15.0]}"#));
        assert_eq!(track, Track::static_value(15.0));
    }

    #[test]
    fn track_vec2_reads_the_first_two_array_components() {
        let track = track_vec2(&prop(r#"{"a": 0, "k": [10.0, 20.0]}"#));
        assert_eq!(track, Track::static_value(Vec2::new(10.0, 20.0)));
    }

    #[test]
    fn track_f32_keyframed_produces_one_keyframe_per_entry() {
        let track = track_f32(&prop(r#"{"a": 1, "k": [{"t": 0, "s": [0.0]}, {"t": 30, "s": [100.0]}]}"#));
        match track {
            Track::Keyframed { keyframes, segment_easing } => {
                assert_eq!(keyframes.len(), 2);
                assert_eq!(keyframes[0].time, 0.0);
                assert_eq!(keyframes[1].value, 100.0);
                assert_eq!(segment_easing.len(), 1);
            }
            Track::Static(_) => panic!("expected a keyframed track"),
        }
    }

    #[test]
    fn build_segment_easing_uses_hold_when_the_outgoing_keyframe_is_a_hold() {
        let kfs: Vec<KeyframeDoc> = serde_json::from_str(r#"[{"t": 0, "s": [0.0], "h": 1}, {"t": 30, "s": [1.0]}]"#).unwrap();
        let easing = build_segment_easing(&kfs);
        assert_eq!(easing.len(), 1);
        assert!(matches!(easing[0], Easing::Hold));
    }

    #[test]
    fn build_segment_easing_falls_back_to_a_default_bezier_when_handles_are_missing() {
        let kfs: Vec<KeyframeDoc> = serde_json::from_str(r#"[{"t": 0, "s": [0.0]}, {"t": 30, "s": [1.0]}]"#).unwrap();
        let easing = build_segment_easing(&kfs);
        match easing[0] {
            Easing::Bezier { out_x, out_y, .. } => {
                assert!((out_x - 1.0 / 3.0).abs() < 1e-6);
                assert!((out_y - 1.0 / 3.0).abs() < 1e-6);
            }
            Easing::Hold => panic!("expected a bezier default"),
        }
    }

    #[test]
    fn build_segment_easing_reads_explicit_out_and_in_handles() {
        let kfs: Vec<KeyframeDoc> = serde_json::from_str(
            r#"[{"t": 0, "s": [0.0], "o": {"x": 0.167, "y": 0.167}}, {"t": 30, "s": [1.0], "i": {"x": 0.833, "y": 1.0}}]"#,
        )
        .unwrap();
        let easing = build_segment_easing(&kfs);
        match easing[0] {
            Easing::Bezier { out_x, out_y, in_x, in_y } => {
                assert!((out_x - 0.167).abs() < 1e-6);
                assert!((out_y - 0.167).abs() < 1e-6);
                assert!((in_x - (-0.167)).abs() < 1e-6);
                assert!((in_y - 0.0).abs() < 1e-6);
            }
            Easing::Hold => panic!("expected a bezier"),
        }
    }

    #[test]
    fn shape_outline_of_an_open_two_vertex_path_has_one_segment() {
        let shape: ShapeValue = serde_json::from_str(r#"{"v": [[0.0, 0.0], [10.0, 0.0]], "i": [[0.0,0.0],[0.0,0.0]], "o": [[0.0,0.0],[0.0,0.0]], "c": false}"#).unwrap();
        let outline = shape_outline(&shape);
        assert!(!outline.is_empty());
        assert!((outline[0].x - 0.0).abs() < 1e-6);
    }

    #[test]
    fn shape_outline_of_a_degenerate_single_vertex_path_returns_it_verbatim() {
        let shape: ShapeValue = serde_json::from_str(r#"{"v": [[5.0, 5.0]]}"#).unwrap();
        let outline = shape_outline(&shape);
        assert_eq!(outline, vec![Vec2::new(5.0, 5.0)]);
    }

    #[test]
    fn compile_mask_rejects_an_unsupported_mode() {
        let mut registry = PathRegistry::new();
        let doc = mask_doc(r#"{"mode": "x", "o": {"a": 0, "k": 100.0}, "pt": {"a": 0, "k": {"v": [[0.0,0.0],[10.0,0.0],[10.0,10.0]], "c": true}}}"#);
        let err = compile_mask(&doc, &mut registry).unwrap_err();
        assert_eq!(err, "UNSUPPORTED_MASK_MODE");
    }

    #[test]
    fn compile_mask_rejects_an_animated_path_with_more_than_one_keyframe() {
        let mut registry = PathRegistry::new();
        let doc = mask_doc(
            r#"{"mode": "a", "o": {"a": 0, "k": 100.0}, "pt": {"a": 1, "k": [
                {"t": 0, "s": [{"v": [[0.0,0.0],[10.0,0.0],[10.0,10.0]], "c": true}]},
                {"t": 30, "s": [{"v": [[0.0,0.0],[20.0,0.0],[20.0,20.0]], "c": true}]}
            ]}}"#,
        );
        let err = compile_mask(&doc, &mut registry).unwrap_err();
        assert_eq!(err, "UNSUPPORTED_MASK_PATH_ANIMATED");
    }

    #[test]
    fn compile_mask_accepts_a_static_add_mask_and_normalizes_opacity() {
        let mut registry = PathRegistry::new();
        let doc = mask_doc(r#"{"mode": "a", "inv": true, "o": {"a": 0, "k": 50.0}, "pt": {"a": 0, "k": {"v": [[0.0,0.0],[10.0,0.0],[10.0,10.0]], "c": true}}}"#);
        let mask = compile_mask(&doc, &mut registry).unwrap();
        assert!(matches!(mask.mode, MaskMode::Add));
        assert!(mask.inverted);
        assert!((mask.static_opacity - 0.5).abs() < 1e-6);
        assert!(!mask.animated);
    }

    #[test]
    fn find_path_value_descends_into_nested_groups() {
        let items: Vec<ShapeItemDoc> = serde_json::from_str(
            r#"[{"ty": "gr", "it": [{"ty": "sh", "ks": {"a": 0, "k": {"v": [[0.0,0.0],[1.0,0.0]]}}}]}]"#,
        )
        .unwrap();
        assert!(find_path_value(&items).is_some());
    }

    #[test]
    fn find_fill_returns_color_and_opacity_from_a_nested_fill_item() {
        let items: Vec<ShapeItemDoc> = vec![shape_item(
            r#"{"ty": "gr", "it": [{"ty": "fl", "c": {"a": 0, "k": [0.2, 0.4, 0.6, 1.0]}, "o": {"a": 0, "k": 80.0}}]}"#,
        )];
        let (color, opacity) = find_fill(&items).unwrap();
        assert_eq!(color, [0.2, 0.4, 0.6, 1.0]);
        assert_eq!(opacity, Track::static_value(0.8));
    }

    #[test]
    fn find_fill_returns_none_when_there_is_no_fill_item() {
        let items: Vec<ShapeItemDoc> = vec![shape_item(r#"{"ty": "sh"}"#)];
        assert!(find_fill(&items).is_none());
    }
}

fn build_segment_easing(keyframes: &[KeyframeDoc]) -> Vec<Easing> {
    (0..keyframes.len().saturating_sub(1))
        .map(|i| {
            if keyframes[i].h == 1 {
                return Easing::Hold;
            }
            let out = keyframes[i].o.as_ref();
            let inh = keyframes[i + 1].i.as_ref();
            match (out, inh) {
                (Some(o), Some(inh)) => Easing::Bezier {
                    out_x: o.x.value(),
                    out_y: o.y.value(),
                    in_x: inh.x.value() - 1.0,
                    in_y: inh.y.value() - 1.0,
                },
                _ => Easing::Bezier { out_x: 1.0 / 3.0, out_y: 1.0 / 3.0, in_x: -1.0 / 3.0, in_y: -1.0 / 3.0 },
            }
        })
        .collect()
}
