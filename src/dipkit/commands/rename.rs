use crate::commands::helpers::{self, persist_or_warn};
use crate::commands::validate;
use crate::commands::{CmdMessage, CmdResult};
use crate::error::{DipError, Result};
use crate::links::{self, LinkRewriter};
use crate::model::{Element, ElementKind, NodeId};
use crate::naming;
use crate::session::Session;
use crate::store::ExternalStore;
use crate::tree::DipTree;
use tracing::{info, warn};

/// Renames `id` in place.
///
/// The element keeps its handle and annotations; descendants are re-pointed
/// to the new location. With `reserve-on-rename`, a renamed unit leaves a
/// reserved twin under its old name.
pub fn run<S: ExternalStore, L: LinkRewriter>(
    session: &mut Session<S, L>,
    project: &str,
    id: NodeId,
    new_name: &str,
) -> Result<CmdResult> {
    let Session {
        store,
        links,
        registry,
        config,
        ..
    } = session;
    let tree = registry.get_mut(project)?;
    rename_element(store, links, tree, id, new_name, config.reserve_on_rename)
}

/// Disables (`dis.` prefix) or re-enables an element. Implemented as a
/// rename, so links are rewritten the same way.
pub fn set_disabled<S: ExternalStore, L: LinkRewriter>(
    session: &mut Session<S, L>,
    project: &str,
    id: NodeId,
    disabled: bool,
) -> Result<CmdResult> {
    let Session {
        store,
        links,
        registry,
        ..
    } = session;
    let tree = registry.get_mut(project)?;

    let el = tree.element(id)?;
    if el.disabled == disabled {
        let mut result = CmdResult::default();
        result.add_message(CmdMessage::info(format!(
            "{} is already {}",
            tree.relative_project_id(id),
            if disabled { "disabled" } else { "enabled" }
        )));
        return Ok(result);
    }
    let new_name = if disabled {
        naming::disabled_name(&el.name)
    } else {
        naming::enabled_name(&el.name).to_string()
    };
    rename_element(store, links, tree, id, &new_name, false)
}

fn rename_element<S: ExternalStore, L: LinkRewriter>(
    store: &mut S,
    links: &mut L,
    tree: &mut DipTree,
    id: NodeId,
    new_name: &str,
    leave_twin: bool,
) -> Result<CmdResult> {
    let el = tree.element(id)?;
    match el.kind {
        ElementKind::Folder
        | ElementKind::IncludeFolder
        | ElementKind::Unit
        | ElementKind::Report
        | ElementKind::Table => {}
        ElementKind::Project | ElementKind::ReservedFolder | ElementKind::ReservedUnit => {
            return Err(DipError::Unsupported {
                op: "rename",
                name: el.name.clone(),
            });
        }
    }
    if el.name == new_name {
        return Ok(CmdResult::default());
    }
    validate::can_rename(store, tree, id, new_name)?;

    let kind = el.kind;
    let old_name = el.name.clone();
    let old_id = tree.relative_project_id(id);
    let parent = tree
        .parent(id)
        .ok_or_else(|| DipError::NotFound(format!("parent of {}", old_id)))?;
    let parent_dir = helpers::resource(tree, parent)?;
    let twin_content = if leave_twin && kind == ElementKind::Unit {
        Some(store.read_text(&el.resource)?)
    } else {
        None
    };

    // Include folders only exist in the descriptor; nothing to move.
    if kind != ElementKind::IncludeFolder {
        let from = helpers::resource(tree, id)?;
        let to = store.move_to(&from, &parent_dir, new_name)?;
        tree.repoint(id, &to)?;
    }
    tree.element_mut(id)?.set_name(new_name);

    let mut result = CmdResult::default().with_affected(vec![id]);

    if let Some(content) = twin_content {
        let marker = naming::reserved_marker_name(&old_name);
        match store.create_file(&parent_dir, &marker, &content) {
            Ok(path) => {
                let index = tree.index_of(id).map(|i| i + 1).unwrap_or(0);
                let twin_el = Element::new(ElementKind::ReservedUnit, old_name.as_str(), path);
                let twin = tree.insert(parent, index, twin_el)?;
                result.affected.push(twin);
            }
            Err(e) => {
                warn!(unit = %old_name, error = %e, "reserved twin not created");
                result.add_message(CmdMessage::warning(format!(
                    "{} was not reserved: {}",
                    old_name, e
                )));
            }
        }
    }

    persist_or_warn(store, tree, parent, &mut result);

    info!(from = %old_id, to = %tree.relative_project_id(id), "element renamed");
    result.add_rewrite(links::notify(links, tree, id, old_id.clone()));
    result.add_message(CmdMessage::success(format!(
        "Renamed {} to {}",
        old_id,
        tree.relative_project_id(id)
    )));
    Ok(result)
}
