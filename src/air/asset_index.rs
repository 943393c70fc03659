use rustc_hash::FxHashMap;

/// One entry in an [`AssetIndex`]: where the asset lives relative to its
/// package, its pixel size if known up front, and its basename (used by
/// the shared-catalog fallback resolver).
#[derive(Debug, Clone, PartialEq)]
pub struct AssetEntry {
    pub relative_path: String,
    pub size: Option<(u32, u32)>,
    pub basename: String,
}

/// Maps namespaced asset ids (`"<animRef>|<originalAssetId>"`) to their
/// entry. One index is built per animation during compilation and merged
/// into a scene-wide index by the scene compiler.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssetIndex {
    entries: FxHashMap<String, AssetEntry>,
}

impl AssetIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, namespaced_id: impl Into<String>, entry: AssetEntry) {
        self.entries.insert(namespaced_id.into(), entry);
    }

    #[must_use]
    pub fn get(&self, namespaced_id: &str) -> Option<&AssetEntry> {
        self.entries.get(namespaced_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AssetEntry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Merges `other` into `self`. Namespacing already guarantees no key
    /// collisions across animations, so this is a plain extend.
    pub fn merge(&mut self, other: AssetIndex) {
        self.entries.extend(other.entries);
    }

    /// Builds the namespaced key `"<anim_ref>|<original_asset_id>"`.
    #[must_use]
    pub fn namespace(anim_ref: &str, original_asset_id: &str) -> String {
        format!("{anim_ref}|{original_asset_id}")
    }
}
