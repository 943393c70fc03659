//! Matte pairing (§4.2): resolves each consumer layer's track-matte target
//! and computes the final `isMatteSource` flag for every layer in a
//! composition.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::air::{Composition, LayerId, Matte, MatteMode};
use crate::error::CompileError;

/// The matte-relevant fields read straight off the source document, kept
/// alongside the compiled [`crate::air::Layer`] (which only stores the
/// resolved [`Matte`], not the raw `tt`/`tp`/`td` tags).
#[derive(Debug, Clone, Copy)]
pub struct RawMatteInfo {
    pub ind: i64,
    pub tt: Option<u8>,
    pub tp: Option<i64>,
}

/// Resolves matte pairings for every layer in `comp`, in place.
/// `raw` must be parallel to `comp.layers` (same order, same length).
pub fn resolve(comp: &mut Composition, raw: &[RawMatteInfo], anim_ref: &str) -> Result<(), CompileError> {
    debug_assert_eq!(raw.len(), comp.layers.len());

    let ind_to_index: FxHashMap<i64, usize> = raw.iter().enumerate().map(|(i, r)| (r.ind, i)).collect();

    let mut implicit_sources: FxHashSet<LayerId> = FxHashSet::default();

    for (index, info) in raw.iter().enumerate() {
        let Some(tt) = info.tt else { continue };
        let Some(mode) = MatteMode::from_tt(tt) else {
            return Err(CompileError::new(
                "UNSUPPORTED_MATTE_TYPE",
                format!("layers[ind={}].tt", info.ind),
                format!("track matte type {tt} is not supported"),
            )
            .with_anim_ref(anim_ref));
        };

        let source_index = if let Some(tp) = info.tp {
            let Some(&resolved) = ind_to_index.get(&tp) else {
                return Err(CompileError::new(
                    "MATTE_TARGET_NOT_FOUND",
                    format!("layers[ind={}].tp", info.ind),
                    format!("matte target ind={tp} not found in this composition"),
                )
                .with_anim_ref(anim_ref));
            };
            if resolved >= index {
                return Err(CompileError::new(
                    "MATTE_TARGET_INVALID_ORDER",
                    format!("layers[ind={}].tp", info.ind),
                    "matte target must precede its consumer in array order",
                )
                .with_anim_ref(anim_ref));
            }
            Some(resolved)
        } else if index > 0 && comp.layers[index - 1].is_matte_source {
            Some(index - 1)
        } else {
            None
        };

        if let Some(source_index) = source_index {
            let source_id = comp.layers[source_index].id;
            implicit_sources.insert(source_id);
            comp.layers[index].matte = Some(Matte { mode, source_layer_id: source_id });
        }
    }

    for layer in &mut comp.layers {
        if implicit_sources.contains(&layer.id) {
            layer.is_matte_source = true;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::air::{Layer, LayerContent, StrokeCap, StrokeJoin, Timing, Track};
    use crate::math::Vec2;
    use crate::path::PathId;

    fn layer(id: i64, name: &str, is_matte_source: bool) -> Layer {
        let _ = (StrokeCap::Butt, StrokeJoin::Miter);
        Layer {
            id: LayerId(id),
            name: name.to_string(),
            content: LayerContent::Null,
            timing: Timing { in_point: 0.0, out_point: 100.0, start_time: 0.0 },
            parent_id: None,
            position: Track::Static(Vec2::ZERO),
            scale: Track::Static(Vec2::ONE),
            rotation: Track::Static(0.0),
            opacity: Track::Static(1.0),
            anchor: Track::Static(Vec2::ZERO),
            masks: Vec::new(),
            matte: None,
            is_matte_source,
            hidden: false,
        }
    }

    fn comp(layers: Vec<Layer>) -> Composition {
        Composition { id: crate::air::CompId::Root, width: 10, height: 10, layers }
    }

    fn raw(ind: i64, tt: Option<u8>, tp: Option<i64>) -> RawMatteInfo {
        RawMatteInfo { ind, tt, tp }
    }

    #[test]
    fn legacy_binds_to_immediately_preceding_explicit_source() {
        let mut c = comp(vec![layer(1, "source", true), layer(2, "consumer", false)]);
        let raw = vec![raw(1, None, None), raw(2, Some(1), None)];
        resolve(&mut c, &raw, "anim-1.json").unwrap();
        assert_eq!(c.layers[1].matte.map(|m| m.mode), Some(MatteMode::Alpha));
        assert_eq!(c.layers[1].matte.unwrap().source_layer_id, LayerId(1));
    }

    #[test]
    fn legacy_binding_is_skipped_when_preceding_layer_is_not_an_explicit_source() {
        let mut c = comp(vec![layer(1, "plain", false), layer(2, "consumer", false)]);
        let raw = vec![raw(1, None, None), raw(2, Some(1), None)];
        resolve(&mut c, &raw, "anim-1.json").unwrap();
        assert!(c.layers[1].matte.is_none());
    }

    #[test]
    fn explicit_target_reference_does_not_require_td_and_becomes_implicit_source() {
        let mut c = comp(vec![layer(1, "plain", false), layer(2, "consumer", false)]);
        let raw = vec![raw(1, None, None), raw(2, Some(2), Some(1))];
        resolve(&mut c, &raw, "anim-1.json").unwrap();
        assert_eq!(c.layers[1].matte.unwrap().source_layer_id, LayerId(1));
        assert!(c.layers[0].is_matte_source, "tp-referenced layer becomes an implicit matte source");
    }

    #[test]
    fn unresolvable_target_reference_is_fatal() {
        let mut c = comp(vec![layer(1, "plain", false), layer(2, "consumer", false)]);
        let raw = vec![raw(1, None, None), raw(2, Some(2), Some(99))];
        let err = resolve(&mut c, &raw, "anim-1.json").unwrap_err();
        assert_eq!(err.code, "MATTE_TARGET_NOT_FOUND");
    }

    #[test]
    fn target_reference_must_precede_consumer_in_array_order() {
        let mut c = comp(vec![layer(1, "consumer", false), layer(2, "later", false)]);
        let raw = vec![raw(1, Some(2), Some(2)), raw(2, None, None)];
        let err = resolve(&mut c, &raw, "anim-1.json").unwrap_err();
        assert_eq!(err.code, "MATTE_TARGET_INVALID_ORDER");
    }

    #[test]
    fn unsupported_track_matte_type_is_fatal() {
        let mut c = comp(vec![layer(1, "plain", false), layer(2, "consumer", false)]);
        let raw = vec![raw(1, None, None), raw(2, Some(9), None)];
        let err = resolve(&mut c, &raw, "anim-1.json").unwrap_err();
        assert_eq!(err.code, "UNSUPPORTED_MATTE_TYPE");
    }
}
