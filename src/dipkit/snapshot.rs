//! # Reversible Delete
//!
//! Before a `tmp` delete, the element's store entry is copied into a scratch
//! area and described by a [`TmpElement`]. The engine hands the record to the
//! caller and forgets it: keeping, restoring (see
//! [`crate::commands::restore`]) or discarding it is the caller's business.
//!
//! ```text
//! <scratch>/
//! └── <uuid>/
//!     └── <element name>     # file or full directory copy
//! ```

use crate::config::DipConfig;
use crate::error::{DipError, Result};
use crate::model::{Annotations, ElementKind, NodeId};
use crate::store::ExternalStore;
use crate::tree::DipTree;
use chrono::{DateTime, Utc};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use uuid::Uuid;

/// A snapshot taken before deletion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TmpElement {
    pub id: Uuid,
    pub kind: ElementKind,
    pub name: String,
    /// Location of the copy inside the scratch area.
    pub path: PathBuf,
    /// Full ID the element had when it was deleted.
    pub origin: String,
    pub annotations: Annotations,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct SnapshotService {
    scratch_dir: PathBuf,
}

impl SnapshotService {
    pub fn new(scratch_dir: impl Into<PathBuf>) -> Self {
        Self {
            scratch_dir: scratch_dir.into(),
        }
    }

    /// Uses the configured snapshot dir, else the platform data dir.
    pub fn from_config(config: &DipConfig) -> Result<Self> {
        match &config.snapshot_dir {
            Some(dir) => Ok(Self::new(dir)),
            None => Self::default_dir().map(Self::new),
        }
    }

    pub fn default_dir() -> Result<PathBuf> {
        ProjectDirs::from("com", "dipkit", "dipkit")
            .map(|dirs| dirs.data_dir().join("snapshots"))
            .ok_or_else(|| DipError::Snapshot {
                name: String::new(),
                message: "could not determine a data directory".to_string(),
            })
    }

    pub fn scratch_dir(&self) -> &Path {
        &self.scratch_dir
    }

    /// Copies the store entry of `id` into the scratch area.
    pub fn snapshot<S: ExternalStore>(
        &self,
        store: &mut S,
        tree: &DipTree,
        id: NodeId,
    ) -> Result<TmpElement> {
        let el = tree.element(id)?;
        let fail = |e: DipError| DipError::Snapshot {
            name: el.name.clone(),
            message: e.to_string(),
        };

        let snapshot_id = Uuid::new_v4();
        ensure_dir(store, &self.scratch_dir).map_err(fail)?;
        let holder = store
            .create_folder(&self.scratch_dir, &snapshot_id.to_string())
            .map_err(fail)?;
        let path = match store.copy(&el.resource, &holder, &el.name) {
            Ok(path) => path,
            Err(e) => {
                if let Err(cleanup) = store.delete(&holder) {
                    warn!(holder = %holder.display(), error = %cleanup, "could not remove snapshot holder");
                }
                return Err(fail(e));
            }
        };

        debug!(element = %tree.full_id(id), snapshot = %path.display(), "snapshot taken");
        Ok(TmpElement {
            id: snapshot_id,
            kind: el.kind,
            name: el.name.clone(),
            path,
            origin: tree.full_id(id),
            annotations: el.annotations.clone(),
            created_at: Utc::now(),
        })
    }

    /// Removes a snapshot the caller no longer needs.
    pub fn discard<S: ExternalStore>(&self, store: &mut S, tmp: &TmpElement) -> Result<()> {
        let holder = self.scratch_dir.join(tmp.id.to_string());
        if store.exists(&holder) {
            store.delete(&holder)?;
        }
        Ok(())
    }
}

/// Creates `dir` and any missing ancestors through the store.
pub(crate) fn ensure_dir<S: ExternalStore>(store: &mut S, dir: &Path) -> Result<()> {
    if store.is_dir(dir) {
        return Ok(());
    }
    let parent = dir
        .parent()
        .ok_or_else(|| DipError::Api(format!("cannot create {}", dir.display())))?;
    let name = dir
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| DipError::Api(format!("cannot create {}", dir.display())))?;
    ensure_dir(store, parent)?;
    store.create_folder(parent, name)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreOp;
    use crate::model::Element;
    use crate::store::memory::MemStore;

    fn setup() -> (MemStore, DipTree, NodeId) {
        let mut store = MemStore::new();
        store.put_file("/p/req/010.txt", "body");
        let mut tree = DipTree::new("proj", "/p");
        let root = tree.root();
        let req = tree
            .insert(root, 0, Element::new(ElementKind::Folder, "req", "/p/req"))
            .unwrap();
        tree.insert(req, 0, Element::new(ElementKind::Unit, "010.txt", "/p/req/010.txt"))
            .unwrap();
        (store, tree, req)
    }

    #[test]
    fn test_snapshot_copies_subtree() {
        let (mut store, tree, req) = setup();
        let service = SnapshotService::new("/scratch/snaps");

        let tmp = service.snapshot(&mut store, &tree, req).unwrap();

        assert_eq!(tmp.kind, ElementKind::Folder);
        assert_eq!(tmp.origin, "proj/req");
        assert_eq!(tmp.path, Path::new("/scratch/snaps").join(tmp.id.to_string()).join("req"));
        assert_eq!(store.read_text(&tmp.path.join("010.txt")).unwrap(), "body");
        // source untouched
        assert!(store.exists(Path::new("/p/req/010.txt")));

        service.discard(&mut store, &tmp).unwrap();
        assert!(!store.exists(&tmp.path));
    }

    #[test]
    fn test_snapshot_failure_is_reported() {
        let (mut store, tree, req) = setup();
        store.set_failing(StoreOp::Copy, true);
        let service = SnapshotService::new("/scratch");
        let err = service.snapshot(&mut store, &tree, req).unwrap_err();
        assert!(matches!(err, DipError::Snapshot { ref name, .. } if name == "req"));
        // no empty holder left behind
        assert!(store.list_children(Path::new("/scratch")).unwrap().is_empty());
    }

    #[test]
    fn test_from_config_prefers_configured_dir() {
        let config = DipConfig {
            snapshot_dir: Some(PathBuf::from("/tmp/snaps")),
            ..Default::default()
        };
        let service = SnapshotService::from_config(&config).unwrap();
        assert_eq!(service.scratch_dir(), Path::new("/tmp/snaps"));
    }
}
