//! Render plan emission: the block-level command wrapper (§4.4) built on
//! top of the AIR command emitter (§4.5).

mod block_transform;
mod commands;
mod emitter;

pub use block_transform::block_transform;
pub use commands::RenderCommand;
pub use emitter::{render_commands, RenderMode};
pub(crate) use emitter::resolve_variant;
