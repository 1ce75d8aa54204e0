use crate::commands::helpers::{self, persist_or_warn};
use crate::commands::{CmdMessage, CmdResult};
use crate::error::Result;
use crate::links::LinkRewriter;
use crate::model::{NodeId, Numbering};
use crate::session::Session;
use crate::store::ExternalStore;
use tracing::info;

/// Turns automatic naming of new files and folders in `container` on or
/// off. Steps come from the container's existing numbering, else from the
/// configured `file-step` / `folder-step`. Existing names are left alone.
pub fn set<S: ExternalStore, L: LinkRewriter>(
    session: &mut Session<S, L>,
    project: &str,
    container: NodeId,
    files: bool,
    folders: bool,
) -> Result<CmdResult> {
    let Session {
        store,
        registry,
        config,
        ..
    } = session;
    let tree = registry.get_mut(project)?;
    helpers::ensure_target(tree, container)?;

    let mut numbering = match tree.element(container)?.numbering.clone() {
        Some(existing) => existing,
        None => Numbering::new(&config.file_step, &config.folder_step)?,
    };
    numbering.file_active = files;
    numbering.folder_active = folders;
    tree.element_mut(container)?.numbering = Some(numbering);

    let mut result = CmdResult::default().with_affected(vec![container]);
    persist_or_warn(store, tree, container, &mut result);

    let full_id = tree.full_id(container);
    info!(container = %full_id, files, folders, "numbering changed");
    let state = |on: bool| if on { "on" } else { "off" };
    result.add_message(CmdMessage::success(format!(
        "Numbering in {}: files {}, folders {}",
        full_id,
        state(files),
        state(folders)
    )));
    Ok(result)
}
