use super::{same_entry, ExternalStore};
use crate::error::{DipError, Result, StoreOp};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Entry {
    Dir,
    File(String),
}

/// In-memory store for testing.
///
/// Entries are keyed by full path. Individual operations can be made to fail
/// with [`MemStore::set_failing`] to exercise error paths.
#[derive(Debug, Default, Clone)]
pub struct MemStore {
    entries: BTreeMap<PathBuf, Entry>,
    failing: HashSet<StoreOp>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable failure simulation for one operation.
    pub fn set_failing(&mut self, op: StoreOp, failing: bool) {
        if failing {
            self.failing.insert(op);
        } else {
            self.failing.remove(&op);
        }
    }

    /// Test helper: creates a directory and all missing ancestors.
    pub fn mkdir_all(&mut self, path: impl AsRef<Path>) {
        for ancestor in path.as_ref().ancestors() {
            if ancestor.as_os_str().is_empty() {
                continue;
            }
            self.entries
                .entry(ancestor.to_path_buf())
                .or_insert(Entry::Dir);
        }
    }

    /// Test helper: writes a file, creating its ancestors.
    pub fn put_file(&mut self, path: impl AsRef<Path>, content: &str) {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            self.mkdir_all(parent);
        }
        self.entries
            .insert(path.to_path_buf(), Entry::File(content.to_string()));
    }

    /// All paths below `root` (inclusive), for assertions.
    pub fn paths_under(&self, root: impl AsRef<Path>) -> Vec<PathBuf> {
        let root = root.as_ref();
        self.entries
            .keys()
            .filter(|p| p.starts_with(root))
            .cloned()
            .collect()
    }

    fn check(&self, op: StoreOp, path: &Path) -> Result<()> {
        if self.failing.contains(&op) {
            return Err(DipError::storage(op, path, "simulated failure"));
        }
        Ok(())
    }

    fn require_dir(&self, op: StoreOp, path: &Path) -> Result<()> {
        match self.entries.get(path) {
            Some(Entry::Dir) => Ok(()),
            Some(Entry::File(_)) => Err(DipError::storage(op, path, "not a directory")),
            None => Err(DipError::storage(op, path, "directory does not exist")),
        }
    }

    fn require_absent(&self, op: StoreOp, path: &Path) -> Result<()> {
        if self.entries.contains_key(path) {
            return Err(DipError::storage(op, path, "entry already exists"));
        }
        Ok(())
    }

    fn subtree(&self, root: &Path) -> Vec<(PathBuf, Entry)> {
        self.entries
            .iter()
            .filter(|(p, _)| p.starts_with(root))
            .map(|(p, e)| (p.clone(), e.clone()))
            .collect()
    }

    fn rebase(path: &Path, from: &Path, to: &Path) -> PathBuf {
        match path.strip_prefix(from) {
            Ok(rest) if rest.as_os_str().is_empty() => to.to_path_buf(),
            Ok(rest) => to.join(rest),
            Err(_) => path.to_path_buf(),
        }
    }
}

impl ExternalStore for MemStore {
    fn exists(&self, path: &Path) -> bool {
        self.entries.contains_key(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        matches!(self.entries.get(path), Some(Entry::Dir))
    }

    fn list_children(&self, path: &Path) -> Result<Vec<String>> {
        self.check(StoreOp::List, path)?;
        self.require_dir(StoreOp::List, path)?;
        Ok(self
            .entries
            .keys()
            .filter(|p| p.parent() == Some(path))
            .filter_map(|p| p.file_name().and_then(|n| n.to_str()).map(str::to_string))
            .collect())
    }

    fn read_text(&self, path: &Path) -> Result<String> {
        self.check(StoreOp::Read, path)?;
        match self.entries.get(path) {
            Some(Entry::File(content)) => Ok(content.clone()),
            Some(Entry::Dir) => Err(DipError::storage(StoreOp::Read, path, "is a directory")),
            None => Err(DipError::storage(StoreOp::Read, path, "entry does not exist")),
        }
    }

    fn create_file(&mut self, parent: &Path, name: &str, content: &str) -> Result<PathBuf> {
        let path = parent.join(name);
        self.check(StoreOp::CreateFile, &path)?;
        self.require_dir(StoreOp::CreateFile, parent)?;
        self.require_absent(StoreOp::CreateFile, &path)?;
        self.entries
            .insert(path.clone(), Entry::File(content.to_string()));
        Ok(path)
    }

    fn create_folder(&mut self, parent: &Path, name: &str) -> Result<PathBuf> {
        let path = parent.join(name);
        self.check(StoreOp::CreateFolder, &path)?;
        self.require_dir(StoreOp::CreateFolder, parent)?;
        self.require_absent(StoreOp::CreateFolder, &path)?;
        self.entries.insert(path.clone(), Entry::Dir);
        Ok(path)
    }

    fn write_text(&mut self, path: &Path, content: &str) -> Result<()> {
        self.check(StoreOp::Write, path)?;
        if let Some(parent) = path.parent() {
            self.require_dir(StoreOp::Write, parent)?;
        }
        if self.is_dir(path) {
            return Err(DipError::storage(StoreOp::Write, path, "is a directory"));
        }
        self.entries
            .insert(path.to_path_buf(), Entry::File(content.to_string()));
        Ok(())
    }

    fn copy(&mut self, from: &Path, to_parent: &Path, name: &str) -> Result<PathBuf> {
        let to = to_parent.join(name);
        self.check(StoreOp::Copy, from)?;
        self.require_dir(StoreOp::Copy, to_parent)?;
        self.require_absent(StoreOp::Copy, &to)?;
        if !self.exists(from) {
            return Err(DipError::storage(StoreOp::Copy, from, "entry does not exist"));
        }
        if to.starts_with(from) {
            return Err(DipError::storage(
                StoreOp::Copy,
                from,
                "cannot copy a directory into itself",
            ));
        }
        for (path, entry) in self.subtree(from) {
            self.entries.insert(Self::rebase(&path, from, &to), entry);
        }
        Ok(to)
    }

    fn move_to(&mut self, from: &Path, to_parent: &Path, name: &str) -> Result<PathBuf> {
        let to = to_parent.join(name);
        self.check(StoreOp::Move, from)?;
        self.require_dir(StoreOp::Move, to_parent)?;
        if !same_entry(from, &to) {
            self.require_absent(StoreOp::Move, &to)?;
        }
        if !self.exists(from) {
            return Err(DipError::storage(StoreOp::Move, from, "entry does not exist"));
        }
        if to.starts_with(from) && to != from {
            return Err(DipError::storage(
                StoreOp::Move,
                from,
                "cannot move a directory into itself",
            ));
        }
        let moved = self.subtree(from);
        for (path, _) in &moved {
            self.entries.remove(path);
        }
        for (path, entry) in moved {
            self.entries.insert(Self::rebase(&path, from, &to), entry);
        }
        Ok(to)
    }

    fn delete(&mut self, path: &Path) -> Result<()> {
        self.check(StoreOp::Delete, path)?;
        if !self.exists(path) {
            return Err(DipError::storage(StoreOp::Delete, path, "entry does not exist"));
        }
        self.entries.retain(|p, _| !p.starts_with(path));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_requires_parent() {
        let mut store = MemStore::new();
        assert!(store.create_file(Path::new("/p"), "a.txt", "").is_err());
        store.mkdir_all("/p");
        store.create_file(Path::new("/p"), "a.txt", "x").unwrap();
        assert_eq!(store.read_text(Path::new("/p/a.txt")).unwrap(), "x");
    }

    #[test]
    fn test_list_only_direct_children() {
        let mut store = MemStore::new();
        store.put_file("/p/a.txt", "");
        store.put_file("/p/sub/b.txt", "");
        assert_eq!(store.list_children(Path::new("/p")).unwrap(), ["a.txt", "sub"]);
    }

    #[test]
    fn test_move_subtree() {
        let mut store = MemStore::new();
        store.put_file("/p/req/a.txt", "x");
        store.mkdir_all("/p/spec");
        let moved = store
            .move_to(Path::new("/p/req"), Path::new("/p/spec"), "req")
            .unwrap();
        assert_eq!(moved, PathBuf::from("/p/spec/req"));
        assert!(!store.exists(Path::new("/p/req")));
        assert_eq!(store.read_text(Path::new("/p/spec/req/a.txt")).unwrap(), "x");
    }

    #[test]
    fn test_case_only_rename() {
        let mut store = MemStore::new();
        store.put_file("/p/intro.txt", "x");
        store
            .move_to(Path::new("/p/intro.txt"), Path::new("/p"), "Intro.txt")
            .unwrap();
        assert_eq!(store.list_children(Path::new("/p")).unwrap(), ["Intro.txt"]);
    }

    #[test]
    fn test_simulated_failure() {
        let mut store = MemStore::new();
        store.mkdir_all("/p");
        store.set_failing(StoreOp::CreateFolder, true);
        let err = store.create_folder(Path::new("/p"), "req").unwrap_err();
        assert!(matches!(
            err,
            DipError::Storage {
                op: StoreOp::CreateFolder,
                ..
            }
        ));
        assert!(!store.exists(Path::new("/p/req")));
        store.set_failing(StoreOp::CreateFolder, false);
        assert!(store.create_folder(Path::new("/p"), "req").is_ok());
    }

    #[test]
    fn test_delete_is_recursive() {
        let mut store = MemStore::new();
        store.put_file("/p/req/a.txt", "");
        store.put_file("/p/requirements.txt", "");
        store.delete(Path::new("/p/req")).unwrap();
        assert_eq!(
            store.paths_under("/p"),
            [PathBuf::from("/p"), PathBuf::from("/p/requirements.txt")]
        );
    }
}
