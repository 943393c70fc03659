//! Mask-group scope (§4.7): boolean compositing of add/subtract/intersect
//! mask ops via an offscreen ping-pong accumulator over triangulated path
//! coverage.

use crate::air::MaskMode;
use crate::error::RuntimeError;
use crate::math::{Mat2D, Rect, Vec2};
use crate::path::PathId;
use crate::render_plan::RenderCommand;

use super::executor::{Attachment, ExecState, Executor, ShapeDrawParams};
use super::pool::PooledTextureId;
use super::provider::TextureProvider;

/// One mask op in AE application order, extracted from a `BeginMask`
/// command.
pub(super) struct MaskOp {
    pub mode: MaskMode,
    pub inverted: bool,
    pub path_id: PathId,
    pub opacity: f32,
    pub frame: f32,
}

/// The extracted mask-group scope: its ops in AE order, the inner command
/// span, and whether extraction found the stream malformed (in which case
/// the safe fallback is to render `inner` without masking at all).
pub(super) struct MaskScope<'a> {
    pub ops: Vec<MaskOp>,
    pub inner: &'a [RenderCommand],
    pub malformed: bool,
    /// Index of the last command (inclusive) belonging to this scope,
    /// relative to the slice passed to [`extract`].
    pub end: usize,
}

/// Extracts the mask-group scope starting at `commands[0]` (which must be
/// a `BeginMask`). Masks are emitted LIFO (innermost begin first); this
/// reverses the opening prefix to AE application order, per §4.7.
pub(super) fn extract(commands: &[RenderCommand]) -> MaskScope<'_> {
    let mut n = 0;
    while let Some(RenderCommand::BeginMask { .. }) = commands.get(n) {
        n += 1;
    }

    let mut ops: Vec<MaskOp> = commands[..n]
        .iter()
        .map(|c| {
            let RenderCommand::BeginMask { mode, inverted, path_id, opacity, frame } = c else { unreachable!() };
            MaskOp { mode: *mode, inverted: *inverted, path_id: *path_id, opacity: *opacity, frame: *frame }
        })
        .collect();
    ops.reverse();

    let mut depth = n;
    let mut i = n;
    let mut malformed = false;
    let mut first_end_mask = None;

    while i < commands.len() && depth > 0 {
        match &commands[i] {
            RenderCommand::BeginMask { .. } => {
                malformed = true;
                i += 1;
            }
            RenderCommand::EndMask => {
                if first_end_mask.is_none() {
                    first_end_mask = Some(i);
                }
                depth -= 1;
                i += 1;
            }
            RenderCommand::BeginMatte(_) => {
                i += 1;
                let mut matte_depth = 1;
                while i < commands.len() && matte_depth > 0 {
                    match &commands[i] {
                        RenderCommand::BeginMatte(_) => matte_depth += 1,
                        RenderCommand::EndMatte => matte_depth -= 1,
                        _ => {}
                    }
                    i += 1;
                }
            }
            _ => i += 1,
        }
    }

    let end = i.saturating_sub(1);
    let inner_end = first_end_mask.unwrap_or(commands.len());
    MaskScope { ops, inner: &commands[n..inner_end], malformed, end }
}

/// `initAcc([add, ...]) = 0`; `initAcc([subtract|intersect, ...]) = 1`.
fn init_acc(ops: &[MaskOp]) -> f32 {
    match ops.first().map(|op| op.mode) {
        Some(MaskMode::Add) | None => 0.0,
        Some(MaskMode::Subtract | MaskMode::Intersect) => 1.0,
    }
}

impl<'a> Executor<'a> {
    pub(super) fn run_mask_scope(&mut self, scope: &MaskScope<'_>, state: &mut ExecState, attachment: &Attachment<'_>, provider: &dyn TextureProvider) -> Result<(), RuntimeError> {
        state.mask_depth += 1;
        let result = self.run_mask_scope_inner(scope, state, attachment, provider);
        state.mask_depth -= 1;
        result
    }

    fn run_mask_scope_inner(&mut self, scope: &MaskScope<'_>, state: &mut ExecState, attachment: &Attachment<'_>, provider: &dyn TextureProvider) -> Result<(), RuntimeError> {
        if scope.malformed {
            return self.execute(scope.inner, state, attachment, provider, None);
        }

        let path_to_viewport = attachment.anim_to_viewport.mul(state.current_transform());

        let mut bbox: Option<Rect> = None;
        for op in &scope.ops {
            let vertices = self.sampled_path_vertices(op.path_id, op.frame)?;
            for v in vertices {
                let p = path_to_viewport.apply_point(v);
                bbox = Some(match bbox {
                    None => Rect::new(p.x, p.y, 0.0, 0.0),
                    Some(b) => union_point(b, p),
                });
            }
        }
        let Some(bbox) = bbox else {
            return self.execute(scope.inner, state, attachment, provider, None);
        };

        let floored_min_x = bbox.x.floor();
        let floored_min_y = bbox.y.floor();
        let ceiled_max_x = (bbox.x + bbox.width).ceil();
        let ceiled_max_y = (bbox.y + bbox.height).ceil();
        let rounded = Rect::new(floored_min_x, floored_min_y, ceiled_max_x - floored_min_x, ceiled_max_y - floored_min_y).expanded(2.0);
        let clamped = rounded.clamped_to(Rect::new(0.0, 0.0, attachment.pixel_size.0 as f32, attachment.pixel_size.1 as f32)).intersect(state.current_scissor());
        if clamped.is_empty() {
            return Ok(());
        }

        let bbox_w = clamped.width.max(1.0) as u32;
        let bbox_h = clamped.height.max(1.0) as u32;

        let coverage = self.pool.acquire(self.device, "motif-mask-coverage", bbox_w, bbox_h, wgpu::TextureFormat::R8Unorm, wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING);
        let mut acc_a = self.pool.acquire(self.device, "motif-mask-acc-a", bbox_w, bbox_h, wgpu::TextureFormat::R8Unorm, wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::STORAGE_BINDING);
        let mut acc_b = self.pool.acquire(self.device, "motif-mask-acc-b", bbox_w, bbox_h, wgpu::TextureFormat::R8Unorm, wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::STORAGE_BINDING);
        let content = self.pool.acquire(self.device, "motif-mask-content", bbox_w, bbox_h, target_color_format(), wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING);

        self.clear_texture(self.pool.view(acc_a), init_acc(&scope.ops));

        let viewport_to_bbox = Mat2D::translation(Vec2::new(-clamped.x, -clamped.y));
        let bbox_to_ndc = Mat2D::viewport_to_ndc((bbox_w, bbox_h));

        let mut acc_in = acc_a;
        let mut acc_out = acc_b;
        for op in &scope.ops {
            self.clear_texture(self.pool.view(coverage), 0.0);
            self.render_coverage(coverage, op.path_id, op.frame, path_to_viewport, viewport_to_bbox, bbox_to_ndc)?;
            self.dispatch_mask_compose(coverage, acc_in, acc_out, op, bbox_w, bbox_h);
            std::mem::swap(&mut acc_in, &mut acc_out);
        }
        let final_mask = acc_in;

        let content_attachment = Attachment { view: self.pool.view(content), pixel_size: (bbox_w, bbox_h), anim_to_viewport: viewport_to_bbox.mul(attachment.anim_to_viewport), viewport_to_ndc: bbox_to_ndc };
        let mut inner_state = ExecState::for_sub_pass(Rect::new(0.0, 0.0, bbox_w as f32, bbox_h as f32));
        *inner_state.transform_stack_mut() = state.transform_stack.clone();
        self.execute(scope.inner, &mut inner_state, &content_attachment, provider, Some(wgpu::Color::TRANSPARENT))?;

        self.composite_mask(attachment, clamped, content, final_mask);

        self.pool.release(coverage);
        self.pool.release(acc_a);
        self.pool.release(acc_b);
        self.pool.release(content);

        Ok(())
    }

    fn clear_texture(&self, view: &wgpu::TextureView, value: f32) {
        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some("motif-clear") });
        {
            let _pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("motif-clear-pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations { load: wgpu::LoadOp::Clear(wgpu::Color { r: f64::from(value), g: 0.0, b: 0.0, a: 1.0 }), store: wgpu::StoreOp::Store },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
        }
        self.queue.submit(std::iter::once(encoder.finish()));
    }

    fn render_coverage(&mut self, coverage: PooledTextureId, path_id: PathId, frame: f32, path_to_viewport: Mat2D, viewport_to_bbox: Mat2D, bbox_to_ndc: Mat2D) -> Result<(), RuntimeError> {
        let (vertex_buffer, index_buffer, index_count) = self.upload_sampled_path(path_id, frame)?;
        let mvp = bbox_to_ndc.mul(viewport_to_bbox).mul(path_to_viewport);
        let params = ShapeDrawParams { mvp: mvp.to_mat4_cols(), color: [1.0, 0.0, 0.0, 1.0] };
        let uniform = wgpu::util::DeviceExt::create_buffer_init(self.device, &wgpu::util::BufferInitDescriptor { label: Some("motif-coverage-params"), contents: bytemuck::bytes_of(&params), usage: wgpu::BufferUsages::UNIFORM });
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor { label: Some("motif-coverage-bind-group"), layout: &self.pipelines.shape_bgl, entries: &[wgpu::BindGroupEntry { binding: 0, resource: uniform.as_entire_binding() }] });

        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some("motif-coverage") });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("motif-coverage-pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment { view: self.pool.view(coverage), resolve_target: None, ops: wgpu::Operations { load: wgpu::LoadOp::Load, store: wgpu::StoreOp::Store }, depth_slice: None })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_pipeline(&self.pipelines.shape_coverage);
            pass.set_bind_group(0, &bind_group, &[]);
            pass.set_vertex_buffer(0, vertex_buffer.slice(..));
            pass.set_index_buffer(index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            pass.draw_indexed(0..index_count, 0, 0..1);
        }
        self.queue.submit(std::iter::once(encoder.finish()));
        Ok(())
    }

    fn dispatch_mask_compose(&self, coverage: PooledTextureId, acc_in: PooledTextureId, acc_out: PooledTextureId, op: &MaskOp, width: u32, height: u32) {
        #[repr(C)]
        #[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
        struct MaskOpParams {
            mode: u32,
            inverted: u32,
            opacity: f32,
            _pad: f32,
        }
        let params = MaskOpParams { mode: mask_mode_code(op.mode), inverted: u32::from(op.inverted), opacity: op.opacity, _pad: 0.0 };
        let uniform = wgpu::util::DeviceExt::create_buffer_init(self.device, &wgpu::util::BufferInitDescriptor { label: Some("motif-mask-op-params"), contents: bytemuck::bytes_of(&params), usage: wgpu::BufferUsages::UNIFORM });

        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("motif-mask-compose-bind-group"),
            layout: &self.pipelines.mask_compose_bgl,
            entries: &[
                wgpu::BindGroupEntry { binding: 0, resource: uniform.as_entire_binding() },
                wgpu::BindGroupEntry { binding: 1, resource: wgpu::BindingResource::TextureView(self.pool.view(coverage)) },
                wgpu::BindGroupEntry { binding: 2, resource: wgpu::BindingResource::TextureView(self.pool.view(acc_in)) },
                wgpu::BindGroupEntry { binding: 3, resource: wgpu::BindingResource::TextureView(self.pool.view(acc_out)) },
            ],
        });

        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some("motif-mask-compose") });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor { label: Some("motif-mask-compose-pass"), timestamp_writes: None });
            pass.set_pipeline(&self.pipelines.mask_compose);
            pass.set_bind_group(0, &bind_group, &[]);
            pass.dispatch_workgroups(width.div_ceil(8), height.div_ceil(8), 1);
        }
        self.queue.submit(std::iter::once(encoder.finish()));
    }

    fn composite_mask(&self, parent: &Attachment<'_>, bbox: Rect, content: PooledTextureId, mask: PooledTextureId) {
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("motif-composite-mask-bind-group"),
            layout: &self.pipelines.composite_mask_bgl,
            entries: &[
                wgpu::BindGroupEntry { binding: 0, resource: wgpu::BindingResource::TextureView(self.pool.view(content)) },
                wgpu::BindGroupEntry { binding: 1, resource: wgpu::BindingResource::TextureView(self.pool.view(mask)) },
                wgpu::BindGroupEntry { binding: 2, resource: wgpu::BindingResource::Sampler(&self.pipelines.sampler) },
            ],
        });

        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some("motif-composite-mask") });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("motif-composite-mask-pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment { view: parent.view, resolve_target: None, ops: wgpu::Operations { load: wgpu::LoadOp::Load, store: wgpu::StoreOp::Store }, depth_slice: None })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_scissor_rect(bbox.x.max(0.0) as u32, bbox.y.max(0.0) as u32, bbox.width.max(1.0) as u32, bbox.height.max(1.0) as u32);
            pass.set_pipeline(&self.pipelines.composite_mask);
            pass.set_bind_group(0, &bind_group, &[]);
            pass.draw(0..4, 0..1);
        }
        self.queue.submit(std::iter::once(encoder.finish()));
    }
}

fn union_point(rect: Rect, p: Vec2) -> Rect {
    let min_x = rect.x.min(p.x);
    let min_y = rect.y.min(p.y);
    let max_x = (rect.x + rect.width).max(p.x);
    let max_y = (rect.y + rect.height).max(p.y);
    Rect::new(min_x, min_y, max_x - min_x, max_y - min_y)
}

const fn mask_mode_code(mode: MaskMode) -> u32 {
    match mode {
        MaskMode::Add => 0,
        MaskMode::Subtract => 1,
        MaskMode::Intersect => 2,
    }
}

fn target_color_format() -> wgpu::TextureFormat {
    wgpu::TextureFormat::Bgra8UnormSrgb
}
