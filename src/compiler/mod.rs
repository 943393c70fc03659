//! Animation compiler: lowers a validated vector animation document into
//! AIR, resolving matte pairs and the binding layer (§4.2).

pub mod binding_discovery;
pub mod document;
mod lower;
pub mod matte_resolve;

pub use document::Document;
pub use lower::LoweredDocument;

use crate::air::Air;
use crate::error::CompileError;
use crate::path::PathRegistry;

/// Compiles one vector animation document into AIR.
///
/// `anim_ref` is the key this animation is loaded under (used to namespace
/// asset ids and to tag diagnostics). `binding_key` names the
/// user-replaceable layer, taken from the scene block's `input.bindingKey`.
pub fn compile(document: &Document, anim_ref: &str, binding_key: &str, registry: &mut PathRegistry) -> Result<Air, CompileError> {
    let LoweredDocument { meta, mut compositions, raw_matte_info, asset_index } = lower::lower_document(document, anim_ref, registry)?;

    for (comp_id, comp) in &mut compositions {
        let raw = raw_matte_info.get(comp_id).map(Vec::as_slice).unwrap_or(&[]);
        matte_resolve::resolve(comp, raw, anim_ref)?;
    }

    let binding = binding_discovery::discover(&compositions, binding_key, anim_ref)?;

    Ok(Air { meta, compositions, binding, asset_index })
}
