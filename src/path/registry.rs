use super::resource::PathResource;

/// A scene-wide, sequential identifier for a registered [`PathResource`].
/// IDs are globally unique across the scene; switching variants never
/// re-registers an already-compiled path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PathId(u32);

impl PathId {
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Append-only during compilation; read-only once the scene compiler
/// finishes. Mirrors the single-threaded, no-lock sharing model: held as
/// `&mut PathRegistry` during compile, `&PathRegistry` thereafter.
#[derive(Debug, Clone, Default)]
pub struct PathRegistry {
    entries: Vec<PathResource>,
}

impl PathRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `resource` and returns its newly assigned sequential id.
    pub fn register(&mut self, resource: PathResource) -> PathId {
        let id = PathId(self.entries.len() as u32);
        self.entries.push(resource);
        id
    }

    #[must_use]
    pub fn lookup(&self, id: PathId) -> Option<&PathResource> {
        self.entries.get(id.index())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (PathId, &PathResource)> {
        self.entries.iter().enumerate().map(|(i, r)| (PathId(i as u32), r))
    }
}
