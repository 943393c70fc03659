//! Binding-layer discovery (§4.2): finds the unique, uniquely named image
//! layer that the scene's `bindingKey` resolves to.

use rustc_hash::FxHashMap;

use crate::air::{Binding, CompId, Composition, LayerContent};
use crate::error::CompileError;

/// Searches the root composition first, then precomps in sorted id order,
/// for a layer whose name equals `binding_key`. It must be an image layer
/// with an asset reference; any other outcome is a fatal error.
pub fn discover(compositions: &FxHashMap<CompId, Composition>, binding_key: &str, anim_ref: &str) -> Result<Binding, CompileError> {
    let mut precomp_ids: Vec<&CompId> = compositions.keys().filter(|id| !matches!(id, CompId::Root)).collect();
    precomp_ids.sort_by_key(|id| match id {
        CompId::Named(name) => name.clone(),
        CompId::Root => String::new(),
    });

    let mut search_order = vec![&CompId::Root];
    search_order.extend(precomp_ids);

    let mut found: Option<Binding> = None;

    for comp_id in search_order {
        let Some(comp) = compositions.get(comp_id) else { continue };
        for layer in &comp.layers {
            if layer.name != binding_key {
                continue;
            }
            if found.is_some() {
                return Err(CompileError::new("BINDING_LAYER_AMBIGUOUS", "layers[]", format!("more than one layer named '{binding_key}'")).with_anim_ref(anim_ref));
            }
            let LayerContent::Image { namespaced_asset_id, .. } = &layer.content else {
                return Err(CompileError::new("BINDING_LAYER_NOT_IMAGE", format!("layers[ind={}]", layer.id.0), format!("binding layer '{binding_key}' is not an image layer")).with_anim_ref(anim_ref));
            };
            if namespaced_asset_id.is_empty() {
                return Err(CompileError::new("BINDING_LAYER_NO_ASSET", format!("layers[ind={}]", layer.id.0), "binding layer has no asset reference").with_anim_ref(anim_ref));
            }
            found = Some(Binding {
                key: binding_key.to_string(),
                bound_layer_id: layer.id,
                bound_asset_id: namespaced_asset_id.clone(),
                bound_comp_id: comp_id.clone(),
            });
        }
    }

    found.ok_or_else(|| CompileError::new("BINDING_LAYER_NOT_FOUND", "layers[]", format!("no layer named '{binding_key}' found")).with_anim_ref(anim_ref))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::air::{Layer, LayerId, Timing, Track};
    use crate::math::Vec2;

    fn layer(id: i64, name: &str, content: LayerContent) -> Layer {
        Layer {
            id: LayerId(id),
            name: name.to_string(),
            content,
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

    fn image(asset_id: &str) -> LayerContent {
        LayerContent::Image { namespaced_asset_id: asset_id.to_string(), width: 10, height: 10 }
    }

    fn comps(root_layers: Vec<Layer>) -> FxHashMap<CompId, Composition> {
        let mut m = FxHashMap::default();
        m.insert(CompId::Root, Composition { id: CompId::Root, width: 10, height: 10, layers: root_layers });
        m
    }

    #[test]
    fn finds_binding_layer_in_root() {
        let compositions = comps(vec![layer(1, "media", image("anim-1.json|img_0"))]);
        let binding = discover(&compositions, "media", "anim-1.json").unwrap();
        assert_eq!(binding.bound_layer_id, LayerId(1));
        assert_eq!(binding.bound_asset_id, "anim-1.json|img_0");
        assert_eq!(binding.bound_comp_id, CompId::Root);
    }

    #[test]
    fn searches_precomps_in_sorted_id_order_after_root() {
        let mut compositions = comps(vec![layer(1, "other", LayerContent::Null)]);
        compositions.insert(CompId::named("b_comp"), Composition { id: CompId::named("b_comp"), width: 10, height: 10, layers: vec![layer(2, "media", image("anim-1.json|img_1"))] });
        compositions.insert(CompId::named("a_comp"), Composition { id: CompId::named("a_comp"), width: 10, height: 10, layers: vec![] });
        let binding = discover(&compositions, "media", "anim-1.json").unwrap();
        assert_eq!(binding.bound_comp_id, CompId::named("b_comp"));
    }

    #[test]
    fn missing_binding_layer_is_fatal() {
        let compositions = comps(vec![layer(1, "other", image("anim-1.json|img_0"))]);
        let err = discover(&compositions, "media", "anim-1.json").unwrap_err();
        assert_eq!(err.code, "BINDING_LAYER_NOT_FOUND");
    }

    #[test]
    fn multiple_layers_named_the_binding_key_is_fatal() {
        let compositions = comps(vec![layer(1, "media", image("anim-1.json|img_0")), layer(2, "media", image("anim-1.json|img_1"))]);
        let err = discover(&compositions, "media", "anim-1.json").unwrap_err();
        assert_eq!(err.code, "BINDING_LAYER_AMBIGUOUS");
    }

    #[test]
    fn non_image_binding_layer_is_fatal() {
        let compositions = comps(vec![layer(1, "media", LayerContent::Null)]);
        let err = discover(&compositions, "media", "anim-1.json").unwrap_err();
        assert_eq!(err.code, "BINDING_LAYER_NOT_IMAGE");
    }

    #[test]
    fn image_layer_with_empty_asset_id_is_fatal() {
        let compositions = comps(vec![layer(1, "media", image(""))]);
        let err = discover(&compositions, "media", "anim-1.json").unwrap_err();
        assert_eq!(err.code, "BINDING_LAYER_NO_ASSET");
    }
}
