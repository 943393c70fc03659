use super::catalog::AssetCatalog;

/// Composes a package-local catalog with a process-scoped shared catalog:
/// local entries win, shared is the fallback.
#[derive(Debug, Clone, Default)]
pub struct AssetResolver {
    pub local: AssetCatalog,
    pub shared: AssetCatalog,
}

impl AssetResolver {
    #[must_use]
    pub fn new(local: AssetCatalog, shared: AssetCatalog) -> Self {
        Self { local, shared }
    }

    #[must_use]
    pub fn resolve(&self, basename: &str) -> Option<&str> {
        self.local.get(basename).or_else(|| self.shared.get(basename))
    }
}
