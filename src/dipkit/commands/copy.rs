use crate::commands::helpers::{self, persist_or_warn};
use crate::commands::validate;
use crate::commands::{CmdMessage, CmdResult};
use crate::descriptor::Descriptor;
use crate::error::{DipError, Result};
use crate::links::LinkRewriter;
use crate::loader;
use crate::model::{Element, ElementKind, NodeId, Position};
use crate::naming;
use crate::session::Session;
use crate::store::ExternalStore;
use crate::tree::DipTree;
use tracing::{debug, info};

/// Copies `id` into `target` under `name` (defaults to the source name).
///
/// Units keep their annotations. A folder gets annotations only when the
/// copied directory turns out to be a document folder (it carries a
/// descriptor). Reserved units, projects and include folders cannot be
/// copied.
pub fn run<S: ExternalStore, L: LinkRewriter>(
    session: &mut Session<S, L>,
    project: &str,
    id: NodeId,
    target: NodeId,
    position: Position,
    name: Option<&str>,
) -> Result<CmdResult> {
    let Session {
        store, registry, ..
    } = session;
    let tree = registry.get_mut(project)?;

    let source = tree.element(id)?;
    match source.kind {
        ElementKind::Unit
        | ElementKind::Folder
        | ElementKind::ReservedFolder
        | ElementKind::Report
        | ElementKind::Table => {}
        ElementKind::ReservedUnit | ElementKind::Project | ElementKind::IncludeFolder => {
            return Err(DipError::Unsupported {
                op: "copy",
                name: source.name.clone(),
            });
        }
    }
    let name = name.unwrap_or(&source.name).to_string();
    let category = source.category();
    if tree.is_ancestor(id, target) || id == target {
        return Err(DipError::Unsupported {
            op: "copy into itself",
            name,
        });
    }

    let levels = helpers::folder_levels(tree, id);
    validate::can_place(store, tree, target, &name, category, levels, None)?;
    let index = tree.insertion_index(target, category, position)?;

    let new_id = copy_into(store, tree, id, target, index, &name)?;

    let mut result = CmdResult::default().with_affected(vec![new_id]);
    persist_or_warn(store, tree, target, &mut result);

    info!(from = %tree.full_id(id), to = %tree.full_id(new_id), "element copied");
    result.add_message(CmdMessage::success(format!(
        "Copied {} to {}",
        tree.relative_project_id(id),
        tree.relative_project_id(new_id)
    )));
    Ok(result)
}

/// Copies the store entry of `id` into `target` at `index` and mirrors it in
/// the tree. No validation and no descriptor persistence.
pub(crate) fn copy_into<S: ExternalStore>(
    store: &mut S,
    tree: &mut DipTree,
    id: NodeId,
    target: NodeId,
    index: usize,
    name: &str,
) -> Result<NodeId> {
    let source = tree.element(id)?.clone();
    let target_dir = helpers::resource(tree, target)?;

    let element = match source.kind {
        ElementKind::Unit | ElementKind::Report | ElementKind::Table => {
            let path = store.copy(&source.resource, &target_dir, name)?;
            let mut el = Element::new(source.kind, name, path);
            el.annotations = source.annotations.clone();
            el
        }
        ElementKind::ReservedUnit => {
            let marker = naming::reserved_marker_name(name);
            let path = store.copy(&source.resource, &target_dir, &marker)?;
            let mut el = Element::new(ElementKind::ReservedUnit, name, path);
            el.annotations = source.annotations.clone();
            el
        }
        ElementKind::Folder | ElementKind::ReservedFolder => {
            let path = store.copy(&source.resource, &target_dir, name)?;
            Element::new(source.kind, name, path)
        }
        ElementKind::IncludeFolder => {
            let mut el = Element::new(ElementKind::IncludeFolder, name, source.resource.clone());
            el.link = source.link.clone();
            el
        }
        ElementKind::Project => {
            return Err(DipError::Unsupported {
                op: "copy",
                name: source.name,
            });
        }
    };

    let kind = element.kind;
    let new_id = tree.insert(target, index, element)?;

    match kind {
        ElementKind::Folder | ElementKind::IncludeFolder => {
            let path = helpers::resource(tree, new_id)?;
            let document = Descriptor::exists(store, &path);
            debug!(path = %path.display(), document, "loading copied folder");
            loader::reload_children(store, tree, new_id)?;
        }
        ElementKind::Project
        | ElementKind::Unit
        | ElementKind::ReservedFolder
        | ElementKind::ReservedUnit
        | ElementKind::Report
        | ElementKind::Table => {}
    }
    Ok(new_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::create;
    use crate::test_utils::mem_session;
    use std::path::Path;

    #[test]
    fn test_copy_unit_keeps_annotations() {
        let mut session = mem_session();
        let root = session.registry.get("proj").unwrap().root();
        let u = create::unit(&mut session, "proj", root, Some("a.txt"), "body", Position::End)
            .unwrap()
            .affected[0];
        session
            .registry
            .get_mut("proj")
            .unwrap()
            .element_mut(u)
            .unwrap()
            .annotations
            .comment = Some("check".into());

        let result = run(&mut session, "proj", u, root, Position::End, Some("b.txt")).unwrap();

        let tree = session.registry.get("proj").unwrap();
        let copy = tree.get(result.affected[0]).unwrap();
        assert_eq!(copy.name, "b.txt");
        assert_eq!(copy.annotations.comment.as_deref(), Some("check"));
        assert_eq!(
            session.store.read_text(Path::new("/work/proj/b.txt")).unwrap(),
            "body"
        );
    }

    #[test]
    fn test_copy_folder_brings_subtree() {
        let mut session = mem_session();
        let root = session.registry.get("proj").unwrap().root();
        let req = create::folder(&mut session, "proj", root, Some("req"), Position::End)
            .unwrap()
            .affected[0];
        create::unit(&mut session, "proj", req, Some("010.txt"), "", Position::End).unwrap();

        let result = run(&mut session, "proj", req, root, Position::End, Some("req2")).unwrap();

        let tree = session.registry.get("proj").unwrap();
        assert_eq!(tree.relative_project_id(result.affected[0]), "req2");
        assert!(tree.find_element("req2/010.txt").is_some());
        assert!(tree.find_element("req/010.txt").is_some());
    }

    #[test]
    fn test_copy_document_folder_keeps_annotations() {
        let mut session = mem_session();
        let root = session.registry.get("proj").unwrap().root();
        let req = create::folder(&mut session, "proj", root, Some("req"), Position::End)
            .unwrap()
            .affected[0];
        {
            let tree = session.registry.get_mut("proj").unwrap();
            let annotations = &mut tree.element_mut(req).unwrap().annotations;
            annotations.description = Some("requirements".into());
            annotations.comment = Some("draft".into());
            crate::descriptor::persist(&mut session.store, tree, req).unwrap();
        }

        let result = run(&mut session, "proj", req, root, Position::End, Some("req2")).unwrap();

        let tree = session.registry.get("proj").unwrap();
        let copy = tree.get(result.affected[0]).unwrap();
        assert_eq!(copy.annotations.description.as_deref(), Some("requirements"));
        assert_eq!(copy.annotations.comment.as_deref(), Some("draft"));
        assert!(Descriptor::exists(&session.store, Path::new("/work/proj/req2")));
    }

    #[test]
    fn test_copy_folder_without_descriptor_has_no_annotations() {
        let mut session = mem_session();
        session.store.put_file("/work/proj/raw/x.txt", "");
        let tree = session.registry.get_mut("proj").unwrap();
        let root = tree.root();
        let mut raw = Element::new(ElementKind::Folder, "raw", "/work/proj/raw");
        raw.annotations.description = Some("in memory only".into());
        let raw = tree.insert(root, 0, raw).unwrap();
        crate::loader::reload_children(&session.store, tree, raw).unwrap();

        let result = run(&mut session, "proj", raw, root, Position::End, Some("raw2")).unwrap();

        let tree = session.registry.get("proj").unwrap();
        assert!(tree.get(result.affected[0]).unwrap().annotations.is_empty());
        assert!(tree.find_element("raw2/x.txt").is_some());
    }

    #[test]
    fn test_copy_into_itself_rejected() {
        let mut session = mem_session();
        let root = session.registry.get("proj").unwrap().root();
        let req = create::folder(&mut session, "proj", root, Some("req"), Position::End)
            .unwrap()
            .affected[0];
        assert!(run(&mut session, "proj", req, req, Position::End, Some("x")).is_err());
    }

    #[test]
    fn test_copy_collision_needs_new_name() {
        let mut session = mem_session();
        let root = session.registry.get("proj").unwrap().root();
        let u = create::unit(&mut session, "proj", root, Some("a.txt"), "", Position::End)
            .unwrap()
            .affected[0];
        let err = run(&mut session, "proj", u, root, Position::End, None).unwrap_err();
        assert!(err.is_validation());
    }
}
