use crate::commands::helpers::{self, persist_or_warn};
use crate::commands::validate;
use crate::commands::{CmdMessage, CmdResult};
use crate::error::Result;
use crate::links::LinkRewriter;
use crate::loader;
use crate::model::{Category, Element, ElementKind, NodeId, Position};
use crate::session::Session;
use crate::store::ExternalStore;
use std::path::Path;
use tracing::info;

/// Copies an arbitrary store entry (from outside the project, or from
/// another project) into `container`.
///
/// With `attachment`, only `.report`/`.xml` files are accepted.
pub fn run<S: ExternalStore, L: LinkRewriter>(
    session: &mut Session<S, L>,
    project: &str,
    container: NodeId,
    source: &Path,
    position: Position,
    attachment: bool,
) -> Result<CmdResult> {
    let Session {
        store, registry, ..
    } = session;
    let tree = registry.get_mut(project)?;

    validate::can_paste(store, tree, container, source, attachment)?;
    let name = helpers::entry_name(source)?;
    let is_dir = store.is_dir(source);
    let (kind, category) = if is_dir {
        (ElementKind::Folder, Category::Container)
    } else {
        (ElementKind::for_file(&name), Category::File)
    };
    let index = tree.insertion_index(container, category, position)?;

    let target_dir = helpers::resource(tree, container)?;
    let path = store.copy(source, &target_dir, &name)?;
    let id = tree.insert(container, index, Element::new(kind, name.as_str(), path))?;
    if is_dir {
        loader::reload_children(store, tree, id)?;
    }

    let mut result = CmdResult::default().with_affected(vec![id]);
    persist_or_warn(store, tree, container, &mut result);

    info!(source = %source.display(), element = %tree.full_id(id), "entry pasted");
    result.add_message(CmdMessage::success(format!(
        "Pasted {} as {}",
        source.display(),
        tree.full_id(id)
    )));
    Ok(result)
}
