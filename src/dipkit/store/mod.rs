//! # Storage Layer
//!
//! Every element is backed one-to-one by an entry in an external hierarchical
//! store: containers by directories, units and attachments by files. The
//! [`ExternalStore`] trait is the only way the engine touches that store.
//!
//! ## Implementations
//!
//! - [`fs::FsStore`]: Production filesystem store
//!   - Atomic writes (write to a temp file, then rename)
//!   - Recursive copy and delete for directories
//!
//! - [`memory::MemStore`]: In-memory store for testing
//!   - No persistence
//!   - Per-operation failure simulation
//!
//! ## Ordering of effects
//!
//! Commands always call the store first. A store error aborts the command
//! before the tree is touched, so a failed operation leaves the tree exactly
//! as it was.

use crate::error::Result;
use std::path::{Path, PathBuf};

pub mod fs;
pub mod memory;

/// Abstract interface for the hierarchical store backing a project.
///
/// Paths are opaque handles returned by the store itself; callers only build
/// new ones through `parent + name` arguments.
pub trait ExternalStore {
    fn exists(&self, path: &Path) -> bool;

    fn is_dir(&self, path: &Path) -> bool;

    /// Names of the direct entries of a directory, sorted.
    fn list_children(&self, path: &Path) -> Result<Vec<String>>;

    /// Case-insensitive lookup of an entry inside `parent`.
    /// Returns the entry's actual name.
    fn find_child(&self, parent: &Path, name: &str) -> Result<Option<String>> {
        if !self.is_dir(parent) {
            return Ok(None);
        }
        Ok(self
            .list_children(parent)?
            .into_iter()
            .find(|entry| entry.eq_ignore_ascii_case(name)))
    }

    fn read_text(&self, path: &Path) -> Result<String>;

    /// Creates a new file. Fails if the entry already exists.
    fn create_file(&mut self, parent: &Path, name: &str, content: &str) -> Result<PathBuf>;

    /// Creates a new directory. Fails if the entry already exists.
    fn create_folder(&mut self, parent: &Path, name: &str) -> Result<PathBuf>;

    /// Creates or replaces a file's content.
    /// MUST be atomic (e.g. write to tmp then rename) to avoid partial writes.
    fn write_text(&mut self, path: &Path, content: &str) -> Result<()>;

    /// Copies an entry (recursively for directories) to `to_parent/name`.
    fn copy(&mut self, from: &Path, to_parent: &Path, name: &str) -> Result<PathBuf>;

    /// Moves or renames an entry to `to_parent/name`.
    /// A case-only rename of the same entry is allowed.
    fn move_to(&mut self, from: &Path, to_parent: &Path, name: &str) -> Result<PathBuf>;

    /// Deletes an entry, recursively for directories.
    fn delete(&mut self, path: &Path) -> Result<()>;
}

/// True when `to` names the same entry as `from`, ignoring ASCII case.
pub(crate) fn same_entry(from: &Path, to: &Path) -> bool {
    from.to_string_lossy()
        .eq_ignore_ascii_case(&to.to_string_lossy())
}
