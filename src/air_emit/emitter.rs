//! AIR command emitter (§4.5): walks a composition tree at a fixed local
//! frame and appends the corresponding [`RenderCommand`]s.

use rustc_hash::FxHashMap;

use super::cycle_guard::VisitGuard;
use crate::air::{Air, CompId, Composition, Layer, LayerContent, LayerId};
use crate::error::{Diagnostic, DiagnosticReport};
use crate::math::{Mat2D, Vec2};
use crate::render_plan::RenderCommand;

/// Emits the command stream for one variant's AIR at `local_frame`.
///
/// `user_transform` is applied only to the binding layer's own draw (not
/// to the input-clip mask, which must stay fixed). `binding_layer_visible`
/// mirrors `userMediaPresent[blockId]`: when false the binding layer is
/// skipped outright rather than drawn with a missing texture.
pub fn emit(air: &Air, local_frame: f32, user_transform: Mat2D, binding_layer_visible: bool, out: &mut Vec<RenderCommand>, diagnostics: &mut DiagnosticReport) {
    let mut comp_guard = VisitGuard::new();
    emit_composition(air, &CompId::Root, local_frame, 1.0, user_transform, binding_layer_visible, &mut comp_guard, out, diagnostics);
}

#[allow(clippy::too_many_arguments)]
fn emit_composition(
    air: &Air,
    comp_id: &CompId,
    frame: f32,
    container_opacity: f32,
    user_transform: Mat2D,
    binding_layer_visible: bool,
    comp_guard: &mut VisitGuard<CompId>,
    out: &mut Vec<RenderCommand>,
    diagnostics: &mut DiagnosticReport,
) {
    if !comp_guard.enter(comp_id.clone()) {
        diagnostics.push(Diagnostic::error("PRECOMP_CYCLE", format!("{comp_id:?}"), "composition re-entered during descent; subtree skipped"));
        return;
    }

    if let Some(comp) = air.composition(comp_id) {
        let worlds = local_world_transforms(comp, frame);
        let media_input = comp.media_input_layer();

        for layer in &comp.layers {
            if layer.is_matte_source || layer.hidden {
                continue;
            }
            let is_binding_layer = *comp_id == air.binding.bound_comp_id && layer.id == air.binding.bound_layer_id;
            if is_binding_layer && !binding_layer_visible {
                continue;
            }
            if !layer.visible_at(frame) {
                continue;
            }

            let world = worlds[&layer.id];
            let opacity = container_opacity * layer.opacity.sample(frame);

            if let Some(matte) = layer.matte {
                let mut matte_guard = VisitGuard::new();
                emit_matte_scope(air, comp, layer, matte.mode, matte.source_layer_id, frame, world, opacity, container_opacity, &worlds, user_transform, binding_layer_visible, is_binding_layer, media_input, comp_guard, &mut matte_guard, out, diagnostics);
                continue;
            }

            emit_layer(air, comp, layer, frame, world, opacity, user_transform, binding_layer_visible, is_binding_layer, media_input, comp_guard, out, diagnostics);
        }
    }

    comp_guard.leave(comp_id);
}

/// Computes each layer's transform relative to its composition's own
/// coordinate space (the parent chain within `comp` only). The ancestor
/// precomp's transform is realized separately, as the `PushTransform` that
/// already wraps this composition's recursive descent.
pub(crate) fn local_world_transforms(comp: &Composition, frame: f32) -> FxHashMap<LayerId, Mat2D> {
    let mut resolved = FxHashMap::default();
    for layer in &comp.layers {
        resolve_local_world(comp, layer.id, frame, &mut resolved);
    }
    resolved
}

pub(crate) fn resolve_local_world(comp: &Composition, layer_id: LayerId, frame: f32, resolved: &mut FxHashMap<LayerId, Mat2D>) -> Mat2D {
    if let Some(m) = resolved.get(&layer_id) {
        return *m;
    }
    let Some(layer) = comp.layer(layer_id) else {
        return Mat2D::IDENTITY;
    };
    let local = Mat2D::layer_local(layer.position.sample(frame), layer.rotation.sample(frame), layer.scale.sample(frame), layer.anchor.sample(frame));
    let world = match layer.parent_id {
        Some(parent_id) if parent_id != layer_id => resolve_local_world(comp, parent_id, frame, resolved).mul(local),
        _ => local,
    };
    resolved.insert(layer_id, world);
    world
}

#[allow(clippy::too_many_arguments)]
fn emit_layer(
    air: &Air,
    comp: &Composition,
    layer: &Layer,
    frame: f32,
    world: Mat2D,
    opacity: f32,
    user_transform: Mat2D,
    binding_layer_visible: bool,
    is_binding_layer: bool,
    media_input: Option<&Layer>,
    comp_guard: &mut VisitGuard<CompId>,
    out: &mut Vec<RenderCommand>,
    diagnostics: &mut DiagnosticReport,
) {
    if is_binding_layer {
        if let (LayerContent::Image { .. }, Some(media_input)) = (&layer.content, media_input) {
            emit_binding_with_input_clip(air, comp, layer, media_input, frame, world, opacity, user_transform, out);
            return;
        }
        let world = world.mul(user_transform);
        out.push(RenderCommand::PushTransform(world));
        emit_masks_and_draw(air, layer, frame, world, opacity, user_transform, binding_layer_visible, comp_guard, out, diagnostics);
        out.push(RenderCommand::PopTransform);
        return;
    }

    out.push(RenderCommand::PushTransform(world));
    emit_masks_and_draw(air, layer, frame, world, opacity, user_transform, binding_layer_visible, comp_guard, out, diagnostics);
    out.push(RenderCommand::PopTransform);
}

#[allow(clippy::too_many_arguments)]
fn emit_masks_and_draw(air: &Air, layer: &Layer, frame: f32, world: Mat2D, opacity: f32, user_transform: Mat2D, binding_layer_visible: bool, comp_guard: &mut VisitGuard<CompId>, out: &mut Vec<RenderCommand>, diagnostics: &mut DiagnosticReport) {
    for mask in layer.masks.iter().rev() {
        out.push(RenderCommand::BeginMask { mode: mask.mode, inverted: mask.inverted, path_id: mask.path_id, opacity: mask.static_opacity, frame });
    }

    emit_content(air, layer, frame, world, opacity, user_transform, binding_layer_visible, comp_guard, out, diagnostics);

    for _ in &layer.masks {
        out.push(RenderCommand::EndMask);
    }
}

#[allow(clippy::too_many_arguments)]
fn emit_content(air: &Air, layer: &Layer, frame: f32, world: Mat2D, opacity: f32, user_transform: Mat2D, binding_layer_visible: bool, comp_guard: &mut VisitGuard<CompId>, out: &mut Vec<RenderCommand>, diagnostics: &mut DiagnosticReport) {
    match &layer.content {
        LayerContent::Image { namespaced_asset_id, width, height } => {
            let quad_scale = Mat2D::scale(Vec2::new(*width as f32, *height as f32));
            out.push(RenderCommand::PushTransform(quad_scale));
            out.push(RenderCommand::DrawImage { asset_id: namespaced_asset_id.clone(), opacity });
            out.push(RenderCommand::PopTransform);
        }
        LayerContent::ShapeMatte { path_id, fill_color, fill_opacity, stroke } => {
            let fo = fill_opacity.sample(frame);
            out.push(RenderCommand::DrawShape { path_id: *path_id, fill_color: *fill_color, fill_opacity: fo, layer_opacity: opacity, frame });
            if let Some(stroke) = stroke {
                out.push(RenderCommand::DrawStroke {
                    path_id: *path_id,
                    color: stroke.color,
                    opacity: stroke.opacity,
                    width: stroke.width,
                    cap: stroke.cap,
                    join: stroke.join,
                    miter_limit: stroke.miter_limit,
                    layer_opacity: opacity,
                    frame,
                });
            }
        }
        LayerContent::Precomp { ref_comp, .. } => {
            let child_frame = frame - layer.timing.start_time;
            emit_composition(air, ref_comp, child_frame, opacity, user_transform, binding_layer_visible, comp_guard, out, diagnostics);
        }
        LayerContent::Null => {}
    }
}

#[allow(clippy::too_many_arguments)]
fn emit_binding_with_input_clip(air: &Air, comp: &Composition, binding_layer: &Layer, media_input: &Layer, frame: f32, binding_world: Mat2D, binding_opacity: f32, user_transform: Mat2D, out: &mut Vec<RenderCommand>) {
    let LayerContent::ShapeMatte { path_id: media_input_path, .. } = media_input.content else {
        return;
    };
    let LayerContent::Image { namespaced_asset_id, width, height } = &binding_layer.content else {
        return;
    };

    let media_input_world = resolve_local_world(comp, media_input.id, frame, &mut local_world_transforms(comp, frame));

    out.push(RenderCommand::PushTransform(media_input_world));
    out.push(RenderCommand::BeginMask { mode: crate::air::MaskMode::Intersect, inverted: false, path_id: media_input_path, opacity: 1.0, frame });
    out.push(RenderCommand::PopTransform);

    let world_with_user = binding_world.mul(user_transform);
    out.push(RenderCommand::PushTransform(world_with_user));
    for mask in binding_layer.masks.iter().rev() {
        out.push(RenderCommand::BeginMask { mode: mask.mode, inverted: mask.inverted, path_id: mask.path_id, opacity: mask.static_opacity, frame });
    }
    let quad_scale = Mat2D::scale(Vec2::new(*width as f32, *height as f32));
    out.push(RenderCommand::PushTransform(quad_scale));
    out.push(RenderCommand::DrawImage { asset_id: namespaced_asset_id.clone(), opacity: binding_opacity });
    out.push(RenderCommand::PopTransform);
    for _ in &binding_layer.masks {
        out.push(RenderCommand::EndMask);
    }
    out.push(RenderCommand::PopTransform);

    out.push(RenderCommand::EndMask);
}

#[allow(clippy::too_many_arguments)]
fn emit_matte_scope(
    air: &Air,
    comp: &Composition,
    consumer: &Layer,
    mode: crate::air::MatteMode,
    source_id: LayerId,
    frame: f32,
    consumer_world: Mat2D,
    consumer_opacity: f32,
    container_opacity: f32,
    worlds: &FxHashMap<LayerId, Mat2D>,
    user_transform: Mat2D,
    binding_layer_visible: bool,
    is_binding_layer: bool,
    media_input: Option<&Layer>,
    comp_guard: &mut VisitGuard<CompId>,
    matte_guard: &mut VisitGuard<LayerId>,
    out: &mut Vec<RenderCommand>,
    diagnostics: &mut DiagnosticReport,
) {
    out.push(RenderCommand::BeginMatte(mode));

    out.push(RenderCommand::BeginGroup("MatteSource".to_string()));
    if matte_guard.enter(source_id) {
        if let Some(source) = comp.layer(source_id) {
            let source_world = worlds.get(&source_id).copied().unwrap_or(Mat2D::IDENTITY);
            let source_opacity = container_opacity * source.opacity.sample(frame);
            emit_layer(air, comp, source, frame, source_world, source_opacity, user_transform, binding_layer_visible, false, media_input, comp_guard, out, diagnostics);
        } else {
            diagnostics.push(Diagnostic::error("MATTE_TARGET_NOT_FOUND", format!("{source_id:?}"), "matte source layer missing at emission time"));
        }
        matte_guard.leave(&source_id);
    } else {
        diagnostics.push(Diagnostic::error("MATTE_CHAIN_CYCLE", format!("{source_id:?}"), "matte source chain re-entered its own consumer; source omitted"));
    }
    out.push(RenderCommand::EndGroup);

    out.push(RenderCommand::BeginGroup("MatteConsumer".to_string()));
    emit_layer(air, comp, consumer, frame, consumer_world, consumer_opacity, user_transform, binding_layer_visible, is_binding_layer, media_input, comp_guard, out, diagnostics);
    out.push(RenderCommand::EndGroup);

    out.push(RenderCommand::EndMatte);
}
