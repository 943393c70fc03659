use rustc_hash::FxHashMap;

/// A flat basename-keyed catalog of asset locations, scoped either to one
/// package or to the process-wide shared bundle.
#[derive(Debug, Clone, Default)]
pub struct AssetCatalog {
    by_basename: FxHashMap<String, String>,
}

impl AssetCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, basename: impl Into<String>, path: impl Into<String>) {
        self.by_basename.insert(basename.into(), path.into());
    }

    #[must_use]
    pub fn get(&self, basename: &str) -> Option<&str> {
        self.by_basename.get(basename).map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_basename.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_basename.is_empty()
    }
}

impl FromIterator<(String, String)> for AssetCatalog {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self { by_basename: iter.into_iter().collect() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_catalog_is_empty() {
        let catalog = AssetCatalog::new();
        assert!(catalog.is_empty());
        assert_eq!(catalog.len(), 0);
        assert_eq!(catalog.get("logo"), None);
    }

    #[test]
    fn insert_then_get_round_trips() {
        let mut catalog = AssetCatalog::new();
        catalog.insert("logo", "package/images/logo.png");
        assert_eq!(catalog.get("logo"), Some("package/images/logo.png"));
        assert_eq!(catalog.len(), 1);
        assert!(!catalog.is_empty());
    }

    #[test]
    fn insert_overwrites_an_existing_basename() {
        let mut catalog = AssetCatalog::new();
        catalog.insert("logo", "v1/logo.png");
        catalog.insert("logo", "v2/logo.png");
        assert_eq!(catalog.get("logo"), Some("v2/logo.png"));
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn from_iter_builds_a_catalog_from_pairs() {
        let catalog: AssetCatalog = vec![("a".to_string(), "path/a.png".to_string()), ("b".to_string(), "path/b.png".to_string())].into_iter().collect();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get("a"), Some("path/a.png"));
        assert_eq!(catalog.get("b"), Some("path/b.png"));
    }
}
