use crate::commands::{CmdMessage, CmdResult};
use crate::descriptor;
use crate::error::{DipError, Result};
use crate::model::{Category, ElementKind, NodeId};
use crate::naming;
use crate::store::ExternalStore;
use crate::tree::DipTree;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Looks up an element by relative ID.
pub fn resolve(tree: &DipTree, relative_id: &str) -> Result<NodeId> {
    tree.find_element(relative_id).ok_or_else(|| {
        DipError::NotFound(format!("{}/{}", tree.project_name(), relative_id))
    })
}

pub fn resolve_all(tree: &DipTree, relative_ids: &[String]) -> Result<Vec<NodeId>> {
    relative_ids.iter().map(|id| resolve(tree, id)).collect()
}

/// Rejects changes to read-only or included elements.
pub fn ensure_writable(tree: &DipTree, id: NodeId) -> Result<()> {
    let el = tree.element(id)?;
    if el.read_only || el.included {
        return Err(DipError::ReadOnly(tree.full_id(id)));
    }
    Ok(())
}

/// Rejects containers that cannot receive new children.
///
/// Include folders are read-only targets: their content belongs to the
/// linked project.
pub fn ensure_target(tree: &DipTree, container: NodeId) -> Result<()> {
    let el = tree.element(container)?;
    match el.kind {
        ElementKind::Project | ElementKind::Folder => ensure_writable(tree, container),
        ElementKind::IncludeFolder => Err(DipError::ReadOnly(tree.full_id(container))),
        ElementKind::Unit
        | ElementKind::ReservedFolder
        | ElementKind::ReservedUnit
        | ElementKind::Report
        | ElementKind::Table => Err(DipError::Unsupported {
            op: "add children to",
            name: el.name.clone(),
        }),
    }
}

pub fn resource(tree: &DipTree, id: NodeId) -> Result<PathBuf> {
    Ok(tree.element(id)?.resource.clone())
}

/// Folder levels a subtree occupies: 1 for a folder without subfolders,
/// 0 for files.
pub fn folder_levels(tree: &DipTree, id: NodeId) -> usize {
    match tree.get(id) {
        Some(el) if el.category() == Category::Container => {
            1 + tree
                .children(id)
                .iter()
                .map(|c| folder_levels(tree, *c))
                .max()
                .unwrap_or(0)
        }
        _ => 0,
    }
}

/// [`folder_levels`] for an entry that is not in the tree yet.
pub fn store_folder_levels<S: ExternalStore>(store: &S, path: &Path) -> Result<usize> {
    if !store.is_dir(path) {
        return Ok(0);
    }
    let mut deepest = 0;
    for entry in store.list_children(path)? {
        if naming::is_hidden(&entry) {
            continue;
        }
        deepest = deepest.max(store_folder_levels(store, &path.join(&entry))?);
    }
    Ok(1 + deepest)
}

pub fn entry_name(path: &Path) -> Result<String> {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .ok_or_else(|| DipError::Api(format!("{} has no usable name", path.display())))
}

/// Persists a container descriptor; a failure becomes a warning.
pub fn persist_or_warn<S: ExternalStore>(
    store: &mut S,
    tree: &DipTree,
    container: NodeId,
    result: &mut CmdResult,
) {
    if let Err(e) = descriptor::persist(store, tree, container) {
        warn!(container = %tree.full_id(container), error = %e, "descriptor not saved");
        result.add_message(CmdMessage::warning(format!(
            "Order of {} was not saved: {}",
            tree.full_id(container),
            e
        )));
    }
}
