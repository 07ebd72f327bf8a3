//! Change events flowing from the watcher to the scheduler.

use std::path::{Path, PathBuf};

/// A batch of filesystem changes delivered in one watcher callback.
///
/// Paths are deduplicated: the scheduler only needs to know that
/// something changed, not how many times. What actually gets synced is
/// decided by discovery, so deletes and renames need no special
/// representation here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeBatch {
    paths: Vec<PathBuf>,
}

impl ChangeBatch {
    /// Create an empty batch.
    #[must_use]
    pub const fn new() -> Self {
        Self { paths: Vec::new() }
    }

    /// Add a changed path, ignoring duplicates.
    pub fn add(&mut self, path: PathBuf) {
        if !self.paths.contains(&path) {
            self.paths.push(path);
        }
    }

    /// The changed paths, in arrival order.
    #[must_use]
    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// Whether any of the changed paths passes the given predicate.
    pub fn any_path<F: Fn(&Path) -> bool>(&self, predicate: F) -> bool {
        self.paths.iter().any(|p| predicate(p))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.paths.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_batch_is_empty() {
        let batch = ChangeBatch::new();
        assert!(batch.is_empty());
        assert_eq!(batch.len(), 0);
    }

    #[test]
    fn test_add_deduplicates() {
        let mut batch = ChangeBatch::new();
        batch.add(PathBuf::from("/docs/a.md"));
        batch.add(PathBuf::from("/docs/b.md"));
        batch.add(PathBuf::from("/docs/a.md"));

        assert_eq!(batch.len(), 2);
        assert_eq!(
            batch.paths(),
            &[PathBuf::from("/docs/a.md"), PathBuf::from("/docs/b.md")]
        );
    }

    #[test]
    fn test_any_path() {
        let mut batch = ChangeBatch::new();
        batch.add(PathBuf::from("/docs/a.md"));
        batch.add(PathBuf::from("/elsewhere/b.txt"));

        assert!(batch.any_path(|p| p.starts_with("/docs")));
        assert!(!batch.any_path(|p| p.starts_with("/nowhere")));
    }
}
