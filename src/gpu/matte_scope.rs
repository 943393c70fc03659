//! Track-matte scope (§4.8): composites a `MatteConsumer` group through a
//! per-pixel factor derived from a `MatteSource` group, both rendered
//! offscreen at the target's full size. Unlike a mask-group scope, a
//! malformed matte scope is a fatal executor error rather than a
//! render-without-masking fallback, since there is no well-defined
//! "unmatted" rendering of a matte consumer layer.

use crate::air::MatteMode;
use crate::error::RuntimeError;
use crate::math::Rect;
use crate::render_plan::RenderCommand;

use super::executor::{Attachment, ExecState, Executor};
use super::pool::PooledTextureId;
use super::provider::TextureProvider;

/// The extracted matte scope: its mode, the two child group command spans
/// (source then consumer, in that fixed order per §4.8), and the index of
/// its closing `EndMatte`.
pub(super) struct MatteScope<'a> {
    pub mode: MatteMode,
    pub source: &'a [RenderCommand],
    pub consumer: &'a [RenderCommand],
    pub end: usize,
}

/// Parses a `BeginMatte(mode) BeginGroup("MatteSource") ... EndGroup
/// BeginGroup("MatteConsumer") ... EndGroup EndMatte` span starting at
/// `commands[0]`. Any deviation from that exact shape is
/// `MalformedMatteScope`.
pub(super) fn extract(commands: &[RenderCommand]) -> Result<MatteScope<'_>, RuntimeError> {
    let RenderCommand::BeginMatte(mode) = commands[0] else {
        unreachable!("extract is only called when commands[0] is BeginMatte");
    };

    let source_open = 1;
    match commands.get(source_open) {
        Some(RenderCommand::BeginGroup(name)) if name == "MatteSource" => {}
        _ => return Err(RuntimeError::MalformedMatteScope("expected BeginGroup(\"MatteSource\") after BeginMatte")),
    }
    let source_start = source_open + 1;
    let source_close = find_matching_end(commands, source_start)?;

    let consumer_open = source_close + 1;
    match commands.get(consumer_open) {
        Some(RenderCommand::BeginGroup(name)) if name == "MatteConsumer" => {}
        _ => return Err(RuntimeError::MalformedMatteScope("expected BeginGroup(\"MatteConsumer\") after matte source group")),
    }
    let consumer_start = consumer_open + 1;
    let consumer_close = find_matching_end(commands, consumer_start)?;

    let end_matte = consumer_close + 1;
    if !matches!(commands.get(end_matte), Some(RenderCommand::EndMatte)) {
        return Err(RuntimeError::MalformedMatteScope("matte scope missing its closing EndMatte"));
    }

    Ok(MatteScope { mode, source: &commands[source_start..source_close], consumer: &commands[consumer_start..consumer_close], end: end_matte })
}

/// Scans forward from `start` (just past an opening bracket) for the
/// index of the bracket that returns nesting to the caller's level.
/// `BeginGroup`/`BeginMask`/`BeginMatte` all nest the same way as far as
/// balance is concerned; a matte scope's children are well-formed render
/// command trees, so a single depth counter suffices.
fn find_matching_end(commands: &[RenderCommand], start: usize) -> Result<usize, RuntimeError> {
    let mut depth = 1i32;
    let mut i = start;
    while i < commands.len() {
        match &commands[i] {
            RenderCommand::BeginGroup(_) | RenderCommand::BeginMask { .. } | RenderCommand::BeginMatte(_) => depth += 1,
            RenderCommand::EndGroup | RenderCommand::EndMask | RenderCommand::EndMatte => {
                depth -= 1;
                if depth == 0 {
                    return Ok(i);
                }
            }
            _ => {}
        }
        i += 1;
    }
    Err(RuntimeError::MalformedMatteScope("matte scope group did not close before the end of the command stream"))
}

const fn matte_mode_code(mode: MatteMode) -> u32 {
    match mode {
        MatteMode::Alpha => 0,
        MatteMode::AlphaInverted => 1,
        MatteMode::Luma => 2,
        MatteMode::LumaInverted => 3,
    }
}

impl<'a> Executor<'a> {
    pub(super) fn run_matte_scope(&mut self, scope: &MatteScope<'_>, state: &mut ExecState, attachment: &Attachment<'_>, provider: &dyn TextureProvider) -> Result<(), RuntimeError> {
        state.matte_depth += 1;
        let result = self.run_matte_scope_inner(scope, state, attachment, provider);
        state.matte_depth -= 1;
        result
    }

    fn run_matte_scope_inner(&mut self, scope: &MatteScope<'_>, state: &mut ExecState, attachment: &Attachment<'_>, provider: &dyn TextureProvider) -> Result<(), RuntimeError> {
        let (w, h) = attachment.pixel_size;
        let color_format = attachment_color_format();

        let matte_tex = self.pool.acquire(self.device, "motif-matte-source", w, h, color_format, wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING);
        let consumer_tex = self.pool.acquire(self.device, "motif-matte-consumer", w, h, color_format, wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING);

        let sub_attachment = Attachment { view: self.pool.view(matte_tex), pixel_size: (w, h), anim_to_viewport: attachment.anim_to_viewport, viewport_to_ndc: attachment.viewport_to_ndc };
        let mut source_state = ExecState::for_sub_pass(Rect::new(0.0, 0.0, w as f32, h as f32));
        *source_state.transform_stack_mut() = state.transform_stack.clone();
        self.execute(scope.source, &mut source_state, &sub_attachment, provider, Some(wgpu::Color::TRANSPARENT))?;

        let consumer_attachment = Attachment { view: self.pool.view(consumer_tex), pixel_size: (w, h), anim_to_viewport: attachment.anim_to_viewport, viewport_to_ndc: attachment.viewport_to_ndc };
        let mut consumer_state = ExecState::for_sub_pass(Rect::new(0.0, 0.0, w as f32, h as f32));
        *consumer_state.transform_stack_mut() = state.transform_stack.clone();
        self.execute(scope.consumer, &mut consumer_state, &consumer_attachment, provider, Some(wgpu::Color::TRANSPARENT))?;

        self.composite_matte(attachment, state.current_scissor(), scope.mode, matte_tex, consumer_tex);

        self.pool.release(matte_tex);
        self.pool.release(consumer_tex);
        Ok(())
    }

    fn composite_matte(&self, parent: &Attachment<'_>, scissor: Rect, mode: MatteMode, matte_tex: PooledTextureId, consumer_tex: PooledTextureId) {
        #[repr(C)]
        #[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
        struct MatteParams {
            mode: u32,
            _pad0: u32,
            _pad1: u32,
            _pad2: u32,
        }
        let params = MatteParams { mode: matte_mode_code(mode), _pad0: 0, _pad1: 0, _pad2: 0 };
        let uniform = wgpu::util::DeviceExt::create_buffer_init(self.device, &wgpu::util::BufferInitDescriptor { label: Some("motif-matte-params"), contents: bytemuck::bytes_of(&params), usage: wgpu::BufferUsages::UNIFORM });

        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("motif-composite-matte-bind-group"),
            layout: &self.pipelines.composite_matte_bgl,
            entries: &[
                wgpu::BindGroupEntry { binding: 0, resource: uniform.as_entire_binding() },
                wgpu::BindGroupEntry { binding: 1, resource: wgpu::BindingResource::TextureView(self.pool.view(matte_tex)) },
                wgpu::BindGroupEntry { binding: 2, resource: wgpu::BindingResource::TextureView(self.pool.view(consumer_tex)) },
                wgpu::BindGroupEntry { binding: 3, resource: wgpu::BindingResource::Sampler(&self.pipelines.sampler) },
            ],
        });

        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some("motif-composite-matte") });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("motif-composite-matte-pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment { view: parent.view, resolve_target: None, ops: wgpu::Operations { load: wgpu::LoadOp::Load, store: wgpu::StoreOp::Store }, depth_slice: None })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_scissor_rect(scissor.x.max(0.0) as u32, scissor.y.max(0.0) as u32, scissor.width.max(1.0) as u32, scissor.height.max(1.0) as u32);
            pass.set_pipeline(&self.pipelines.composite_matte);
            pass.set_bind_group(0, &bind_group, &[]);
            pass.draw(0..4, 0..1);
        }
        self.queue.submit(std::iter::once(encoder.finish()));
    }
}

fn attachment_color_format() -> wgpu::TextureFormat {
    wgpu::TextureFormat::Bgra8UnormSrgb
}
