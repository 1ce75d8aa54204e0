//! Per-folder descriptor (`.dnfo`).
//!
//! Each container directory holds a JSON descriptor with the presentation
//! order of its children, its numbering configuration, the appendix flag, its
//! own annotations, the annotations of its file children, and the include
//! links it hosts. A directory without a descriptor is still loaded, but only
//! one with a descriptor counts as a document folder.
//!
//! ```text
//! req/
//! ├── .dnfo          # {"order": ["010.txt", "020.txt", "sub"], ...}
//! ├── 010.txt
//! ├── 020.txt
//! ├── 030.txt.rsvd   # reserved unit
//! └── sub/
//! ```

use crate::error::Result;
use crate::model::{Annotations, ElementKind, NodeId, Numbering};
use crate::naming::DESCRIPTOR_FILE;
use crate::store::ExternalStore;
use crate::tree::DipTree;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncludeEntry {
    pub name: String,
    pub project: String,
    pub folder: String,
    pub target: PathBuf,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Descriptor {
    #[serde(default)]
    pub order: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub numbering: Option<Numbering>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub appendix: bool,
    #[serde(default, skip_serializing_if = "Annotations::is_empty")]
    pub annotations: Annotations,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub units: BTreeMap<String, Annotations>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub includes: Vec<IncludeEntry>,
}

impl Descriptor {
    pub fn path(dir: &Path) -> PathBuf {
        dir.join(DESCRIPTOR_FILE)
    }

    /// True when `dir` carries a descriptor, i.e. is a genuine document folder.
    pub fn exists<S: ExternalStore>(store: &S, dir: &Path) -> bool {
        store.exists(&Self::path(dir))
    }

    pub fn load<S: ExternalStore>(store: &S, dir: &Path) -> Result<Option<Self>> {
        let path = Self::path(dir);
        if !store.exists(&path) {
            return Ok(None);
        }
        let content = store.read_text(&path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    pub fn save<S: ExternalStore>(&self, store: &mut S, dir: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        store.write_text(&Self::path(dir), &content)
    }

    /// Snapshot of a container's persisted state as held in the tree.
    pub fn from_tree(tree: &DipTree, container: NodeId) -> Result<Self> {
        let el = tree.element(container)?;
        let mut descriptor = Descriptor {
            numbering: el.numbering.clone(),
            appendix: el.appendix,
            annotations: el.annotations.clone(),
            ..Default::default()
        };

        for child in tree.children(container) {
            let child = tree.element(*child)?;
            descriptor.order.push(child.name.clone());
            match child.kind {
                ElementKind::IncludeFolder => {
                    if let Some(link) = &child.link {
                        descriptor.includes.push(IncludeEntry {
                            name: child.name.clone(),
                            project: link.project.clone(),
                            folder: link.folder.clone(),
                            target: link.target.clone(),
                        });
                    }
                }
                ElementKind::Unit
                | ElementKind::Report
                | ElementKind::Table
                | ElementKind::ReservedUnit => {
                    if !child.annotations.is_empty() {
                        descriptor
                            .units
                            .insert(child.name.clone(), child.annotations.clone());
                    }
                }
                ElementKind::Project | ElementKind::Folder | ElementKind::ReservedFolder => {}
            }
        }
        Ok(descriptor)
    }
}

/// Writes the descriptor of `container` back to the store.
///
/// Include folders and included content belong to another project and are
/// never written from here.
pub fn persist<S: ExternalStore>(store: &mut S, tree: &DipTree, container: NodeId) -> Result<()> {
    let el = tree.element(container)?;
    if !el.is_container() || el.included || el.kind == ElementKind::IncludeFolder {
        return Ok(());
    }
    let dir = el.resource.clone();
    Descriptor::from_tree(tree, container)?.save(store, &dir)?;
    debug!(container = %tree.full_id(container), "descriptor persisted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Element, IncludeLink};
    use crate::store::memory::MemStore;

    #[test]
    fn test_from_tree_collects_order_and_annotations() {
        let mut tree = DipTree::new("proj", "/p");
        let root = tree.root();
        let mut unit = Element::new(ElementKind::Unit, "010.txt", "/p/010.txt");
        unit.annotations.description = Some("intro".into());
        tree.insert(root, 0, unit).unwrap();
        tree.insert(root, 1, Element::new(ElementKind::ReservedUnit, "020.txt", "/p/020.txt.rsvd"))
            .unwrap();
        let mut inc = Element::new(ElementKind::IncludeFolder, "shared", "/lib/defs");
        inc.link = Some(IncludeLink {
            project: "lib".into(),
            folder: "defs".into(),
            target: PathBuf::from("/lib/defs"),
            broken: false,
        });
        tree.insert(root, 2, inc).unwrap();

        let d = Descriptor::from_tree(&tree, root).unwrap();
        assert_eq!(d.order, ["010.txt", "020.txt", "shared"]);
        assert_eq!(d.units.len(), 1);
        assert_eq!(d.units["010.txt"].description.as_deref(), Some("intro"));
        assert_eq!(d.includes[0].project, "lib");
    }

    #[test]
    fn test_persist_and_load() {
        let mut store = MemStore::new();
        store.mkdir_all("/p");
        let mut tree = DipTree::new("proj", "/p");
        let root = tree.root();
        tree.insert(root, 0, Element::new(ElementKind::Unit, "a.txt", "/p/a.txt"))
            .unwrap();

        persist(&mut store, &tree, root).unwrap();

        let loaded = Descriptor::load(&store, Path::new("/p")).unwrap().unwrap();
        assert_eq!(loaded.order, ["a.txt"]);
        assert!(Descriptor::exists(&store, Path::new("/p")));
        assert_eq!(Descriptor::load(&store, Path::new("/q")).unwrap(), None);
    }

    #[test]
    fn test_persist_skips_included_containers() {
        let mut store = MemStore::new();
        store.mkdir_all("/lib/defs");
        let mut tree = DipTree::new("proj", "/p");
        let root = tree.root();
        let inc = tree
            .insert(root, 0, Element::new(ElementKind::IncludeFolder, "shared", "/lib/defs"))
            .unwrap();
        persist(&mut store, &tree, inc).unwrap();
        assert!(!Descriptor::exists(&store, Path::new("/lib/defs")));
    }

    #[test]
    fn test_minimal_json_shape() {
        let json = serde_json::to_string(&Descriptor::default()).unwrap();
        assert_eq!(json, r#"{"order":[]}"#);
    }
}
