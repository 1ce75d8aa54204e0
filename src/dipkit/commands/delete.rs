//! Deleting elements.
//!
//! | kind            | plain delete              | with `reserve`                         |
//! |-----------------|---------------------------|----------------------------------------|
//! | unit            | entry removed             | content moved to `<name>.rsvd`         |
//! | folder          | directory removed         | `.rsvd` marker inside (empty: removed) |
//! | include folder  | link dropped              | link dropped                           |
//! | report / table  | entry removed             | entry removed                          |
//! | reserved *      | marker / directory purged | purged                                 |
//!
//! A reserved element replaces the deleted one at the same index. With
//! `tmp`, a snapshot is taken first; if that fails nothing is deleted.

use crate::commands::helpers::{self, persist_or_warn};
use crate::commands::{CmdMessage, CmdResult};
use crate::config::ReservePolicy;
use crate::error::{DipError, Result};
use crate::links::LinkRewriter;
use crate::model::{Element, ElementKind, NodeId};
use crate::naming::{self, RESERVED_MARKER};
use crate::session::Session;
use crate::snapshot::SnapshotService;
use crate::store::ExternalStore;
use crate::tree::DipTree;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeleteOptions {
    /// Leave a reserved element behind.
    pub reserve: bool,
    /// Snapshot before deleting.
    pub tmp: bool,
}

impl DeleteOptions {
    pub fn reserve() -> Self {
        Self {
            reserve: true,
            tmp: false,
        }
    }
}

pub fn run<S: ExternalStore, L: LinkRewriter>(
    session: &mut Session<S, L>,
    project: &str,
    id: NodeId,
    options: DeleteOptions,
) -> Result<CmdResult> {
    let Session {
        store,
        registry,
        config,
        snapshots,
        ..
    } = session;
    let tree = registry.get_mut(project)?;
    let mut result = CmdResult::default();
    delete_element(store, tree, snapshots, config.reserve_policy, id, options, &mut result)?;
    Ok(result)
}

/// Deletes several elements, possibly across projects. A project's root
/// closes the project: it is unregistered, not deleted, and not snapshotted.
///
/// Elements already gone because an ancestor was deleted earlier in the
/// batch are skipped. The first failure stops the batch; earlier deletions
/// stay committed.
pub fn delete_batch<S: ExternalStore, L: LinkRewriter>(
    session: &mut Session<S, L>,
    targets: &[(String, NodeId)],
    options: DeleteOptions,
) -> Result<CmdResult> {
    let Session {
        store,
        registry,
        config,
        snapshots,
        ..
    } = session;
    let mut result = CmdResult::default();

    for (project, id) in targets {
        if !registry.contains(project) {
            debug!(%project, "project already closed, skipping");
            continue;
        }
        let tree = registry.get_mut(project)?;
        if *id == tree.root() {
            registry.unregister(project);
            result.add_message(CmdMessage::success(format!("Closed project {}", project)));
            continue;
        }
        if !tree.contains(*id) {
            debug!(%project, element = %id, "element already removed, skipping");
            continue;
        }
        delete_element(store, tree, snapshots, config.reserve_policy, *id, options, &mut result)?;
    }
    Ok(result)
}

pub(crate) fn delete_element<S: ExternalStore>(
    store: &mut S,
    tree: &mut DipTree,
    snapshots: &SnapshotService,
    policy: ReservePolicy,
    id: NodeId,
    options: DeleteOptions,
    result: &mut CmdResult,
) -> Result<()> {
    let el = tree.element(id)?;
    let kind = el.kind;
    let name = el.name.clone();
    if kind == ElementKind::Project {
        return Err(DipError::Unsupported {
            op: "delete",
            name,
        });
    }
    helpers::ensure_writable(tree, id)?;
    let parent = tree
        .parent(id)
        .ok_or_else(|| DipError::NotFound(format!("parent of {}", name)))?;
    let parent_dir = helpers::resource(tree, parent)?;
    let resource = helpers::resource(tree, id)?;
    let full_id = tree.full_id(id);

    if options.tmp && kind != ElementKind::IncludeFolder {
        let tmp = snapshots.snapshot(store, tree, id)?;
        result.snapshots.push(tmp);
    }

    let replacement = match kind {
        ElementKind::Unit if options.reserve => {
            let marker = naming::reserved_marker_name(&name);
            let content = store.read_text(&resource)?;
            let marker_path = match policy {
                ReservePolicy::Before => {
                    let path = store.create_file(&parent_dir, &marker, &content)?;
                    if let Err(e) = store.delete(&resource) {
                        if let Err(rollback) = store.delete(&path) {
                            warn!(path = %path.display(), error = %rollback, "rollback failed");
                        }
                        return Err(e);
                    }
                    Some(path)
                }
                ReservePolicy::After => {
                    store.delete(&resource)?;
                    match store.create_file(&parent_dir, &marker, &content) {
                        Ok(path) => Some(path),
                        Err(e) => {
                            warn!(unit = %full_id, error = %e, "unit deleted but not reserved");
                            result.add_message(CmdMessage::warning(format!(
                                "{} was deleted but could not be reserved: {}",
                                full_id, e
                            )));
                            None
                        }
                    }
                }
            };
            marker_path.map(|path| {
                let mut reserved = Element::new(ElementKind::ReservedUnit, name.as_str(), path);
                reserved.annotations = el.annotations.clone();
                reserved
            })
        }
        ElementKind::Folder if options.reserve && !tree.children(id).is_empty() => {
            store.create_file(&resource, RESERVED_MARKER, "")?;
            Some(Element::new(ElementKind::ReservedFolder, name.as_str(), resource.clone()))
        }
        ElementKind::Unit
        | ElementKind::Folder
        | ElementKind::Report
        | ElementKind::Table
        | ElementKind::ReservedUnit
        | ElementKind::ReservedFolder => {
            store.delete(&resource)?;
            None
        }
        // The linked folder belongs to another project and is never touched.
        ElementKind::IncludeFolder => None,
        ElementKind::Project => {
            return Err(DipError::Unsupported {
                op: "delete",
                name,
            })
        }
    };

    match replacement {
        Some(element) => {
            let reserved_id = tree.replace(id, element)?;
            result.affected.push(reserved_id);
            info!(element = %full_id, "element reserved");
            result.add_message(CmdMessage::success(format!("Reserved {}", full_id)));
        }
        None => {
            tree.remove(id)?;
            info!(element = %full_id, "element deleted");
            result.add_message(CmdMessage::success(format!("Deleted {}", full_id)));
        }
    }
    persist_or_warn(store, tree, parent, result);
    Ok(())
}
