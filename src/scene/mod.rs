//! Scene package compilation and runtime state (§4.3, §6).

pub mod compiler;
pub mod runtime;
pub mod schema;
pub mod validate;

pub use compiler::compile_scene;
pub use runtime::{
    BlockId, BlockRuntime, Canvas, ContainerClip, HitTestMode, MediaType, SceneRuntime, UserTransformsAllowed, VariantId,
    VariantRuntime,
};
pub use schema::SceneDocument;
