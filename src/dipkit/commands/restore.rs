use crate::commands::helpers::{self, persist_or_warn};
use crate::commands::validate;
use crate::commands::{CmdMessage, CmdResult};
use crate::error::{DipError, Result};
use crate::links::LinkRewriter;
use crate::loader;
use crate::model::{Element, ElementKind, NodeId, Position};
use crate::naming;
use crate::session::Session;
use crate::snapshot::TmpElement;
use crate::store::ExternalStore;
use tracing::{info, warn};

/// Puts a snapshotted element back into `container`, under its old name,
/// and drops the snapshot.
///
/// The container does not have to be the one the element was deleted from.
pub fn run<S: ExternalStore, L: LinkRewriter>(
    session: &mut Session<S, L>,
    project: &str,
    tmp: TmpElement,
    container: NodeId,
    position: Position,
) -> Result<CmdResult> {
    let Session {
        store,
        registry,
        snapshots,
        ..
    } = session;
    let tree = registry.get_mut(project)?;

    match tmp.kind {
        ElementKind::Folder
        | ElementKind::Unit
        | ElementKind::ReservedFolder
        | ElementKind::ReservedUnit
        | ElementKind::Report
        | ElementKind::Table => {}
        ElementKind::Project | ElementKind::IncludeFolder => {
            return Err(DipError::Unsupported {
                op: "restore",
                name: tmp.name,
            });
        }
    }
    if !store.exists(&tmp.path) {
        return Err(DipError::Snapshot {
            name: tmp.name.clone(),
            message: format!("{} is gone", tmp.path.display()),
        });
    }

    let category = tmp.kind.category();
    let levels = if tmp.kind == ElementKind::Folder {
        helpers::store_folder_levels(store, &tmp.path)?
    } else {
        0
    };
    validate::can_place(store, tree, container, &tmp.name, category, levels, None)?;
    let index = tree.insertion_index(container, category, position)?;

    let target_dir = helpers::resource(tree, container)?;
    let entry_name = match tmp.kind {
        ElementKind::ReservedUnit => naming::reserved_marker_name(&tmp.name),
        _ => tmp.name.clone(),
    };
    let path = store.copy(&tmp.path, &target_dir, &entry_name)?;
    let mut element = Element::new(tmp.kind, tmp.name.as_str(), path);
    element.annotations = tmp.annotations.clone();
    let id = tree.insert(container, index, element)?;
    if tmp.kind == ElementKind::Folder {
        loader::reload_children(store, tree, id)?;
    }

    let mut result = CmdResult::default().with_affected(vec![id]);
    persist_or_warn(store, tree, container, &mut result);
    if let Err(e) = snapshots.discard(store, &tmp) {
        warn!(snapshot = %tmp.id, error = %e, "snapshot not discarded");
        result.add_message(CmdMessage::warning(format!(
            "Snapshot {} was kept: {}",
            tmp.id, e
        )));
    }

    info!(origin = %tmp.origin, element = %tree.full_id(id), "element restored");
    result.add_message(CmdMessage::success(format!(
        "Restored {} as {}",
        tmp.origin,
        tree.full_id(id)
    )));
    Ok(result)
}
