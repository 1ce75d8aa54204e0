use crate::commands::helpers::{self, persist_or_warn};
use crate::commands::validate;
use crate::commands::{CmdMessage, CmdResult};
use crate::descriptor::Descriptor;
use crate::error::{DipError, Result};
use crate::links::LinkRewriter;
use crate::loader;
use crate::model::{Category, Element, ElementKind, IncludeLink, NodeId, Position};
use crate::numbering;
use crate::session::Session;
use crate::store::ExternalStore;
use crate::tree::DipTree;
use tracing::info;

/// Picks the name for a new element: the given one, or the container's next
/// number when numbering is active for `category`.
fn choose_name(
    tree: &DipTree,
    container: NodeId,
    category: Category,
    index: usize,
    name: Option<&str>,
    unit_ext: &str,
) -> Result<String> {
    if let Some(name) = name {
        return Ok(name.to_string());
    }
    let label = numbering::next_number(tree, container, category, index)?.ok_or_else(|| {
        DipError::Api(format!(
            "a name is required: numbering is off in {}",
            tree.full_id(container)
        ))
    })?;
    Ok(match category {
        Category::File => format!("{}{}", label.text, unit_ext),
        Category::Container => label.text,
    })
}

/// Creates a folder in `parent`. Without a name, the folder numbering of
/// `parent` names it.
pub fn folder<S: ExternalStore, L: LinkRewriter>(
    session: &mut Session<S, L>,
    project: &str,
    parent: NodeId,
    name: Option<&str>,
    position: Position,
) -> Result<CmdResult> {
    let Session {
        store,
        registry,
        config,
        ..
    } = session;
    let tree = registry.get_mut(project)?;

    helpers::ensure_target(tree, parent)?;
    let index = tree.insertion_index(parent, Category::Container, position)?;
    let name = choose_name(tree, parent, Category::Container, index, name, &config.unit_ext)?;
    validate::can_create_folder(store, tree, parent, &name)?;

    let parent_dir = helpers::resource(tree, parent)?;
    let path = store.create_folder(&parent_dir, &name)?;

    let id = tree.insert(parent, index, Element::new(ElementKind::Folder, name.as_str(), path.clone()))?;

    let mut result = CmdResult::default().with_affected(vec![id]);
    if let Err(e) = Descriptor::default().save(store, &path) {
        result.add_message(CmdMessage::warning(format!(
            "Folder {} has no descriptor: {}",
            name, e
        )));
    }
    persist_or_warn(store, tree, parent, &mut result);

    info!(folder = %tree.full_id(id), "folder created");
    result.add_message(CmdMessage::success(format!(
        "Created folder {}",
        tree.relative_project_id(id)
    )));
    Ok(result)
}

/// Creates a unit holding `content`. Without a name, the file numbering of
/// `parent` names it, with the configured unit extension.
pub fn unit<S: ExternalStore, L: LinkRewriter>(
    session: &mut Session<S, L>,
    project: &str,
    parent: NodeId,
    name: Option<&str>,
    content: &str,
    position: Position,
) -> Result<CmdResult> {
    let Session {
        store,
        registry,
        config,
        ..
    } = session;
    let tree = registry.get_mut(project)?;

    helpers::ensure_target(tree, parent)?;
    let index = tree.insertion_index(parent, Category::File, position)?;
    let name = choose_name(tree, parent, Category::File, index, name, &config.unit_ext)?;
    validate::can_create_file(store, tree, parent, &name)?;

    create_file(store, tree, parent, index, &name, content, ElementKind::Unit)
}

/// Creates a report (`.report`) or table (`.xml`) attachment.
pub fn attachment<S: ExternalStore, L: LinkRewriter>(
    session: &mut Session<S, L>,
    project: &str,
    parent: NodeId,
    name: &str,
    content: &str,
    position: Position,
) -> Result<CmdResult> {
    let Session {
        store, registry, ..
    } = session;
    let tree = registry.get_mut(project)?;

    validate::can_paste_attachment(store, tree, parent, name)?;
    let index = tree.insertion_index(parent, Category::File, position)?;
    create_file(store, tree, parent, index, name, content, ElementKind::for_file(name))
}

fn create_file<S: ExternalStore>(
    store: &mut S,
    tree: &mut DipTree,
    parent: NodeId,
    index: usize,
    name: &str,
    content: &str,
    kind: ElementKind,
) -> Result<CmdResult> {
    let parent_dir = helpers::resource(tree, parent)?;
    let path = store.create_file(&parent_dir, name, content)?;
    let id = tree.insert(parent, index, Element::new(kind, name, path))?;

    let mut result = CmdResult::default().with_affected(vec![id]);
    persist_or_warn(store, tree, parent, &mut result);

    info!(element = %tree.full_id(id), kind = kind.label(), "file created");
    result.add_message(CmdMessage::success(format!(
        "Created {} {}",
        kind.label(),
        tree.relative_project_id(id)
    )));
    Ok(result)
}

/// Adds an include folder named `name` linking to `folder` (a relative ID)
/// of the open project `linked_project`.
///
/// Nothing is written to the linked project; the link lives in the
/// descriptor of `parent`.
pub fn include<S: ExternalStore, L: LinkRewriter>(
    session: &mut Session<S, L>,
    project: &str,
    parent: NodeId,
    name: &str,
    linked_project: &str,
    folder: &str,
) -> Result<CmdResult> {
    let Session {
        store, registry, ..
    } = session;
    if linked_project == project {
        return Err(DipError::Unsupported {
            op: "include a folder of its own project in",
            name: project.to_string(),
        });
    }
    let target = {
        let linked = registry.get(linked_project)?;
        let target = helpers::resolve(linked, folder)?;
        let el = linked.element(target)?;
        if el.kind != ElementKind::Folder {
            return Err(DipError::Unsupported {
                op: "include",
                name: linked.full_id(target),
            });
        }
        el.resource.clone()
    };

    let tree = registry.get_mut(project)?;
    validate::can_create_folder(store, tree, parent, name)?;
    let index = tree.insertion_index(parent, Category::Container, Position::End)?;

    let mut el = Element::new(ElementKind::IncludeFolder, name, target.clone());
    el.link = Some(IncludeLink {
        project: linked_project.to_string(),
        folder: folder.to_string(),
        target,
        broken: false,
    });
    let id = tree.insert(parent, index, el)?;

    let mut result = CmdResult::default().with_affected(vec![id]);
    if let Err(e) = loader::reload_children(store, tree, id) {
        result.add_message(CmdMessage::warning(format!(
            "Content of {} could not be loaded: {}",
            name, e
        )));
    }
    persist_or_warn(store, tree, parent, &mut result);

    info!(include = %tree.full_id(id), linked = %format!("{}/{}", linked_project, folder), "include created");
    result.add_message(CmdMessage::success(format!(
        "Included {}/{} as {}",
        linked_project,
        folder,
        tree.relative_project_id(id)
    )));
    Ok(result)
}
