//! GPU executor core loop (§4.6): interprets a command slice against a
//! render target, maintaining transform/clip stacks and segmenting the
//! stream at each `BeginMask*`/`BeginMatte` into its own offscreen pass.

use crate::air::{MaskMode, StrokeCap, StrokeJoin};
use crate::error::RuntimeError;
use crate::math::{Mat2D, Rect, Vec2};
use crate::path::PathRegistry;
use crate::render_plan::RenderCommand;

use super::cache::PathGpuCache;
use super::pipelines::Pipelines;
use super::pool::TexturePool;
use super::provider::TextureProvider;
use super::target::RenderTarget;

/// Runtime guard on nested mask/matte offscreen passes (§4.9). Exceeding
/// it raises `INVALID_COMMAND_STACK` rather than recursing without bound.
pub const DEFAULT_MAX_OFFSCREEN_DEPTH: u32 = 12;

/// The four stacks the executor keeps balanced across one `draw`: the
/// transform stack (seeded with identity), the clip/scissor stack (seeded
/// with the full target), and group/mask/matte depth counters.
pub(super) struct ExecState {
    pub transform_stack: Vec<Mat2D>,
    pub clip_stack: Vec<Rect>,
    pub group_depth: u32,
    pub mask_depth: u32,
    pub matte_depth: u32,
}

impl ExecState {
    fn new(initial_scissor: Rect) -> Self {
        Self { transform_stack: vec![Mat2D::IDENTITY], clip_stack: vec![initial_scissor], group_depth: 0, mask_depth: 0, matte_depth: 0 }
    }

    /// A sub-pass's state: scissor reset to the sub-target's own bounds,
    /// but starting from the caller's current transform stack rather than
    /// identity (the caller overwrites it via
    /// [`Self::transform_stack_mut`]).
    pub(super) fn for_sub_pass(initial_scissor: Rect) -> Self {
        Self::new(initial_scissor)
    }

    pub(super) fn transform_stack_mut(&mut self) -> &mut Vec<Mat2D> {
        &mut self.transform_stack
    }

    pub(super) fn current_transform(&self) -> Mat2D {
        *self.transform_stack.last().expect("transform stack seeded with identity")
    }

    pub(super) fn current_scissor(&self) -> Rect {
        *self.clip_stack.last().expect("clip stack seeded with the target scissor")
    }

    fn balanced(&self) -> bool {
        self.transform_stack.len() == 1 && self.clip_stack.len() == 1 && self.group_depth == 0 && self.mask_depth == 0 && self.matte_depth == 0
    }
}

/// One offscreen or on-screen color attachment the executor can draw
/// into, plus the coordinate mapping that applies while drawing into it.
/// Mask/matte sub-passes recompute `anim_to_viewport` relative to a
/// bbox-local or full-target-local pixel space; the top-level draw uses
/// the [`RenderTarget`]'s own mapping.
pub(super) struct Attachment<'a> {
    pub view: &'a wgpu::TextureView,
    pub pixel_size: (u32, u32),
    pub anim_to_viewport: Mat2D,
    pub viewport_to_ndc: Mat2D,
}

impl<'a> Attachment<'a> {
    pub(super) fn from_target(target: &'a RenderTarget<'a>) -> Self {
        Self { view: target.view, pixel_size: target.pixel_size, anim_to_viewport: target.anim_to_viewport(), viewport_to_ndc: target.viewport_to_ndc() }
    }
}

pub struct Executor<'a> {
    pub device: &'a wgpu::Device,
    pub queue: &'a wgpu::Queue,
    pub pipelines: &'a Pipelines,
    pub path_registry: &'a PathRegistry,
    pub pool: &'a mut TexturePool,
    pub path_cache: &'a mut PathGpuCache,
    pub max_offscreen_depth: u32,
}

impl<'a> Executor<'a> {
    #[must_use]
    pub fn new(device: &'a wgpu::Device, queue: &'a wgpu::Queue, pipelines: &'a Pipelines, path_registry: &'a PathRegistry, pool: &'a mut TexturePool, path_cache: &'a mut PathGpuCache) -> Self {
        Self { device, queue, pipelines, path_registry, pool, path_cache, max_offscreen_depth: DEFAULT_MAX_OFFSCREEN_DEPTH }
    }

    /// Interprets `commands` against `target`. `clear_color` is the load
    /// action for the very first segment; every subsequent segment within
    /// this draw (and every sub-pass's later segments) loads the
    /// previously drawn pixels.
    pub fn draw(&mut self, commands: &[RenderCommand], target: &RenderTarget<'_>, provider: &dyn TextureProvider, clear_color: Option<wgpu::Color>) -> Result<(), RuntimeError> {
        let mut state = ExecState::new(target.full_scissor());
        let attachment = Attachment::from_target(target);
        self.execute(commands, &mut state, &attachment, provider, clear_color)?;
        if !state.balanced() {
            return Err(RuntimeError::StackUnderflow("transform/clip/group/mask/matte stacks not balanced at end of draw"));
        }
        Ok(())
    }

    /// Segments `commands` at each top-level `BeginMask*`/`BeginMatte`,
    /// executing plain runs directly and delegating scopes to
    /// [`super::mask_scope`]/[`super::matte_scope`].
    pub(super) fn execute(&mut self, commands: &[RenderCommand], state: &mut ExecState, attachment: &Attachment<'_>, provider: &dyn TextureProvider, mut load_action: Option<wgpu::Color>) -> Result<(), RuntimeError> {
        let mut i = 0;
        while i < commands.len() {
            let scope_start = commands[i..].iter().position(|c| matches!(c, RenderCommand::BeginMask { .. } | RenderCommand::BeginMatte(_))).map(|p| i + p);

            let plain_end = scope_start.unwrap_or(commands.len());
            if plain_end > i {
                self.execute_plain_segment(&commands[i..plain_end], state, attachment, provider, load_action.take())?;
            }

            let Some(scope_start) = scope_start else { break };

            if state.mask_depth + state.matte_depth >= self.max_offscreen_depth {
                return Err(RuntimeError::InvalidCommandStack { depth: state.mask_depth + state.matte_depth + 1, limit: self.max_offscreen_depth });
            }

            let (consumed, result) = match &commands[scope_start] {
                RenderCommand::BeginMask { .. } => {
                    let scope = super::mask_scope::extract(&commands[scope_start..]);
                    (scope.end + 1, self.run_mask_scope(&scope, state, attachment, provider))
                }
                RenderCommand::BeginMatte(_) => {
                    let scope = super::matte_scope::extract(&commands[scope_start..])?;
                    (scope.end + 1, self.run_matte_scope(&scope, state, attachment, provider))
                }
                _ => unreachable!("scope_start only ever points at a scope-opening command"),
            };
            result?;
            i = scope_start + consumed;
        }
        Ok(())
    }

    fn execute_plain_segment(&mut self, commands: &[RenderCommand], state: &mut ExecState, attachment: &Attachment<'_>, provider: &dyn TextureProvider, load_action: Option<wgpu::Color>) -> Result<(), RuntimeError> {
        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some("motif-plain-segment") });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("motif-plain-segment-pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: attachment.view,
                    resolve_target: None,
                    ops: wgpu::Operations { load: load_action.map_or(wgpu::LoadOp::Load, wgpu::LoadOp::Clear), store: wgpu::StoreOp::Store },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            apply_scissor(&mut pass, state.current_scissor(), attachment.pixel_size);

            for command in commands {
                match command {
                    RenderCommand::BeginGroup(_) => state.group_depth += 1,
                    RenderCommand::EndGroup => {
                        state.group_depth = state.group_depth.checked_sub(1).ok_or(RuntimeError::StackUnderflow("EndGroup"))?;
                    }
                    RenderCommand::PushTransform(m) => {
                        let top = state.current_transform();
                        state.transform_stack.push(top.mul(*m));
                    }
                    RenderCommand::PopTransform => {
                        if state.transform_stack.len() <= 1 {
                            return Err(RuntimeError::StackUnderflow("PopTransform"));
                        }
                        state.transform_stack.pop();
                    }
                    RenderCommand::PushClipRect(rect) => {
                        let projected = rect.transformed_aabb_rounded(attachment.anim_to_viewport);
                        let clamped = projected.clamped_to(Rect::new(0.0, 0.0, attachment.pixel_size.0 as f32, attachment.pixel_size.1 as f32)).intersect(state.current_scissor());
                        state.clip_stack.push(clamped);
                        apply_scissor(&mut pass, clamped, attachment.pixel_size);
                    }
                    RenderCommand::PopClipRect => {
                        if state.clip_stack.len() <= 1 {
                            return Err(RuntimeError::StackUnderflow("PopClipRect"));
                        }
                        state.clip_stack.pop();
                        apply_scissor(&mut pass, state.current_scissor(), attachment.pixel_size);
                    }
                    RenderCommand::DrawImage { asset_id, opacity } => {
                        self.draw_image(&mut pass, state.current_transform(), attachment, asset_id, *opacity, provider)?;
                    }
                    RenderCommand::DrawShape { path_id, fill_color, fill_opacity, layer_opacity, frame } => {
                        self.draw_shape(&mut pass, state.current_transform(), attachment, *path_id, *fill_color, *fill_opacity * *layer_opacity, *frame)?;
                    }
                    RenderCommand::DrawStroke { path_id, color, opacity, layer_opacity, frame, .. } => {
                        // Stroke geometry shares the shape fill pipeline: the
                        // path registry stores the stroke outline already
                        // triangulated by the compiler (no separate stroke
                        // tessellation at draw time, per §1 non-goals).
                        self.draw_shape(&mut pass, state.current_transform(), attachment, *path_id, *color, *opacity * *layer_opacity, *frame)?;
                    }
                    RenderCommand::BeginMask { .. } | RenderCommand::EndMask | RenderCommand::BeginMatte(_) | RenderCommand::EndMatte => {
                        unreachable!("scope commands are never part of a plain segment")
                    }
                }
            }
        }
        self.queue.submit(std::iter::once(encoder.finish()));
        Ok(())
    }

    pub(super) fn draw_image(&mut self, pass: &mut wgpu::RenderPass<'_>, current_transform: Mat2D, attachment: &Attachment<'_>, asset_id: &str, opacity: f32, provider: &dyn TextureProvider) -> Result<(), RuntimeError> {
        let Some(texture_view) = provider.texture_view(asset_id) else {
            return Err(RuntimeError::NoTextureForAsset(asset_id.to_string()));
        };

        let mvp = attachment.viewport_to_ndc.mul(attachment.anim_to_viewport).mul(current_transform);
        let params = ImageDrawParams { mvp: mvp.to_mat4_cols(), opacity, _pad: [0.0; 3] };
        let uniform = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor { label: Some("motif-image-params"), contents: bytemuck::bytes_of(&params), usage: wgpu::BufferUsages::UNIFORM });

        let (vertex_buffer, _) = unit_quad_buffers(self.device);
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("motif-image-bind-group"),
            layout: &self.pipelines.image_bgl,
            entries: &[
                wgpu::BindGroupEntry { binding: 0, resource: uniform.as_entire_binding() },
                wgpu::BindGroupEntry { binding: 1, resource: wgpu::BindingResource::TextureView(texture_view) },
                wgpu::BindGroupEntry { binding: 2, resource: wgpu::BindingResource::Sampler(&self.pipelines.sampler) },
            ],
        });

        pass.set_pipeline(&self.pipelines.image);
        pass.set_bind_group(0, &bind_group, &[]);
        pass.set_vertex_buffer(0, vertex_buffer.slice(..));
        pass.draw(0..4, 0..1);
        Ok(())
    }

    /// Samples `path_id` at `frame` and uploads it to the GPU path cache,
    /// returning the vertex/index buffers to draw with. Shared by
    /// [`Self::draw_shape`] and the mask-group coverage pass.
    pub(super) fn upload_sampled_path(&mut self, path_id: crate::path::PathId, frame: f32) -> Result<(&wgpu::Buffer, &wgpu::Buffer, u32), RuntimeError> {
        let resource = self.path_registry.lookup(path_id).ok_or(RuntimeError::MissingPathResource(path_id))?;
        let mut positions = Vec::with_capacity(resource.vertex_count() * 2);
        resource.sample_positions(frame, &mut positions);
        Ok(self.path_cache.upload(self.device, self.queue, self.path_registry, path_id, &positions))
    }

    /// The sampled world-space vertices of `path_id` at `frame`, as
    /// `Vec2`s, for bbox computation ahead of a mask-group pass.
    pub(super) fn sampled_path_vertices(&self, path_id: crate::path::PathId, frame: f32) -> Result<Vec<Vec2>, RuntimeError> {
        let resource = self.path_registry.lookup(path_id).ok_or(RuntimeError::MissingPathResource(path_id))?;
        let mut positions = Vec::with_capacity(resource.vertex_count() * 2);
        resource.sample_positions(frame, &mut positions);
        Ok(positions.chunks_exact(2).map(|c| Vec2::new(c[0], c[1])).collect())
    }

    pub(super) fn draw_shape(&mut self, pass: &mut wgpu::RenderPass<'_>, current_transform: Mat2D, attachment: &Attachment<'_>, path_id: crate::path::PathId, color: [f32; 4], opacity: f32, frame: f32) -> Result<(), RuntimeError> {
        let (vertex_buffer, index_buffer, index_count) = self.upload_sampled_path(path_id, frame)?;

        let mvp = attachment.viewport_to_ndc.mul(attachment.anim_to_viewport).mul(current_transform);
        let premultiplied = [color[0] * color[3] * opacity, color[1] * color[3] * opacity, color[2] * color[3] * opacity, color[3] * opacity];
        let params = ShapeDrawParams { mvp: mvp.to_mat4_cols(), color: premultiplied };
        let uniform = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor { label: Some("motif-shape-params"), contents: bytemuck::bytes_of(&params), usage: wgpu::BufferUsages::UNIFORM });
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor { label: Some("motif-shape-bind-group"), layout: &self.pipelines.shape_bgl, entries: &[wgpu::BindGroupEntry { binding: 0, resource: uniform.as_entire_binding() }] });

        pass.set_pipeline(&self.pipelines.shape_fill);
        pass.set_bind_group(0, &bind_group, &[]);
        pass.set_vertex_buffer(0, vertex_buffer.slice(..));
        pass.set_index_buffer(index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        pass.draw_indexed(0..index_count, 0, 0..1);
        Ok(())
    }
}

fn apply_scissor(pass: &mut wgpu::RenderPass<'_>, rect: Rect, pixel_size: (u32, u32)) {
    if rect.is_empty() {
        pass.set_scissor_rect(0, 0, 0, 0);
        return;
    }
    let x = rect.x.max(0.0) as u32;
    let y = rect.y.max(0.0) as u32;
    let w = (rect.width as u32).min(pixel_size.0.saturating_sub(x));
    let h = (rect.height as u32).min(pixel_size.1.saturating_sub(y));
    pass.set_scissor_rect(x, y, w.max(1), h.max(1));
}

#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct ImageDrawParams {
    mvp: [f32; 16],
    opacity: f32,
    _pad: [f32; 3],
}

#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub(super) struct ShapeDrawParams {
    pub mvp: [f32; 16],
    pub color: [f32; 4],
}

/// The unit quad (two triangles as a strip) that every `DrawImage` scales
/// to the asset's declared size via its own `PushTransform`.
fn unit_quad_buffers(device: &wgpu::Device) -> (wgpu::Buffer, ()) {
    #[rustfmt::skip]
    let vertices: [f32; 16] = [
        0.0, 0.0, 0.0, 0.0,
        1.0, 0.0, 1.0, 0.0,
        0.0, 1.0, 0.0, 1.0,
        1.0, 1.0, 1.0, 1.0,
    ];
    let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor { label: Some("motif-unit-quad"), contents: bytemuck::cast_slice(&vertices), usage: wgpu::BufferUsages::VERTEX });
    (buffer, ())
}

#[allow(dead_code)]
const fn stroke_cap_index(cap: StrokeCap) -> u32 {
    match cap {
        StrokeCap::Butt => 0,
        StrokeCap::Round => 1,
        StrokeCap::Square => 2,
    }
}

#[allow(dead_code)]
const fn stroke_join_index(join: StrokeJoin) -> u32 {
    match join {
        StrokeJoin::Miter => 0,
        StrokeJoin::Round => 1,
        StrokeJoin::Bevel => 2,
    }
}

#[allow(dead_code)]
const fn mask_mode_index(mode: MaskMode) -> u32 {
    match mode {
        MaskMode::Add => 0,
        MaskMode::Subtract => 1,
        MaskMode::Intersect => 2,
    }
}

use wgpu::util::DeviceExt;
