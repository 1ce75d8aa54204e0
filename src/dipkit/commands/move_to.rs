use crate::commands::helpers::{self, persist_or_warn};
use crate::commands::validate;
use crate::commands::{CmdMessage, CmdResult};
use crate::error::{DipError, Result};
use crate::links::{self, LinkRewriter};
use crate::model::{ElementKind, NodeId, Position};
use crate::session::Session;
use crate::store::ExternalStore;
use tracing::info;

/// Moves `id` into the container `target` at `position`.
pub fn run<S: ExternalStore, L: LinkRewriter>(
    session: &mut Session<S, L>,
    project: &str,
    id: NodeId,
    target: NodeId,
    position: Position,
) -> Result<CmdResult> {
    let Session {
        store,
        links,
        registry,
        ..
    } = session;
    let tree = registry.get_mut(project)?;

    let el = tree.element(id)?;
    match el.kind {
        ElementKind::Folder
        | ElementKind::IncludeFolder
        | ElementKind::Unit
        | ElementKind::Report
        | ElementKind::Table => {}
        ElementKind::Project | ElementKind::ReservedFolder | ElementKind::ReservedUnit => {
            return Err(DipError::Unsupported {
                op: "move",
                name: el.name.clone(),
            });
        }
    }
    helpers::ensure_writable(tree, id)?;

    // 1. Cannot move to self
    if id == target {
        return Err(DipError::Api(format!(
            "Cannot move '{}' into itself",
            tree.relative_project_id(id)
        )));
    }
    // 2. Cycle detection: cannot move into a descendant
    if tree.is_ancestor(id, target) {
        return Err(DipError::Api(format!(
            "Cannot move '{}' into its own descendant",
            tree.relative_project_id(id)
        )));
    }

    let kind = el.kind;
    let name = el.name.clone();
    let category = el.category();
    let old_parent = tree
        .parent(id)
        .ok_or_else(|| DipError::NotFound(format!("parent of {}", name)))?;
    let old_id = tree.relative_project_id(id);

    if old_parent != target {
        let levels = helpers::folder_levels(tree, id);
        validate::can_place(store, tree, target, &name, category, levels, Some(id))?;
    } else {
        helpers::ensure_target(tree, target)?;
    }

    if old_parent != target && kind != ElementKind::IncludeFolder {
        let from = helpers::resource(tree, id)?;
        let target_dir = helpers::resource(tree, target)?;
        let to = store.move_to(&from, &target_dir, &name)?;
        tree.repoint(id, &to)?;
    }

    tree.detach(id)?;
    let index = tree.insertion_index(target, category, position)?;
    tree.attach(id, target, index)?;

    let mut result = CmdResult::default().with_affected(vec![id]);
    if old_parent != target {
        persist_or_warn(store, tree, old_parent, &mut result);
    }
    persist_or_warn(store, tree, target, &mut result);

    info!(from = %old_id, to = %tree.relative_project_id(id), "element moved");
    result.add_rewrite(links::notify(links, tree, id, old_id.clone()));
    result.add_message(CmdMessage::success(format!(
        "Moved {} to {}",
        old_id,
        tree.full_id(target)
    )));
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::create;
    use crate::error::CollisionKind;
    use crate::model::MAX_DEPTH;
    use crate::test_utils::mem_session;
    use std::path::Path;

    #[test]
    fn test_move_unit_between_folders() {
        let mut session = mem_session();
        let root = session.registry.get("proj").unwrap().root();
        let a = create::folder(&mut session, "proj", root, Some("a"), Position::End)
            .unwrap()
            .affected[0];
        let b = create::folder(&mut session, "proj", root, Some("b"), Position::End)
            .unwrap()
            .affected[0];
        let u = create::unit(&mut session, "proj", a, Some("u.txt"), "x", Position::End)
            .unwrap()
            .affected[0];

        let result = run(&mut session, "proj", u, b, Position::End).unwrap();

        let tree = session.registry.get("proj").unwrap();
        assert_eq!(tree.relative_project_id(u), "b/u.txt");
        assert!(tree.children(a).is_empty());
        assert!(session.store.exists(Path::new("/work/proj/b/u.txt")));
        assert_eq!(result.link_rewrites[0].old_id, "a/u.txt");
        assert!(!result.link_rewrites[0].cascade);
    }

    #[test]
    fn test_move_into_descendant_rejected() {
        let mut session = mem_session();
        let root = session.registry.get("proj").unwrap().root();
        let a = create::folder(&mut session, "proj", root, Some("a"), Position::End)
            .unwrap()
            .affected[0];
        let inner = create::folder(&mut session, "proj", a, Some("inner"), Position::End)
            .unwrap()
            .affected[0];

        let err = run(&mut session, "proj", a, inner, Position::End).unwrap_err();
        assert!(err.to_string().contains("descendant"));
        assert!(run(&mut session, "proj", a, a, Position::End).is_err());
        assert!(session.links.calls.is_empty());
    }

    #[test]
    fn test_move_respects_depth_of_subtree() {
        let mut session = mem_session();
        let root = session.registry.get("proj").unwrap().root();
        // chain of MAX_DEPTH - 1 folders
        let mut deepest = root;
        for i in 0..MAX_DEPTH - 1 {
            deepest = create::folder(&mut session, "proj", deepest, Some(&format!("d{}", i)), Position::End)
                .unwrap()
                .affected[0];
        }
        let pair = create::folder(&mut session, "proj", root, Some("pair"), Position::End)
            .unwrap()
            .affected[0];
        create::folder(&mut session, "proj", pair, Some("child"), Position::End).unwrap();

        let err = run(&mut session, "proj", pair, deepest, Position::End).unwrap_err();
        assert!(matches!(err, DipError::Depth { depth: 7, .. }));
    }

    #[test]
    fn test_move_rejects_untracked_namesake_in_target() {
        let mut session = mem_session();
        let root = session.registry.get("proj").unwrap().root();
        let a = create::unit(&mut session, "proj", root, Some("a.txt"), "x", Position::End)
            .unwrap()
            .affected[0];
        let b = create::folder(&mut session, "proj", root, Some("b"), Position::End)
            .unwrap()
            .affected[0];
        // on disk only, never loaded into the tree
        session.store.put_file("/work/proj/b/A.TXT", "other");

        let err = run(&mut session, "proj", a, b, Position::End).unwrap_err();

        assert!(matches!(
            err,
            DipError::Collision {
                kind: CollisionKind::Exists,
                ..
            }
        ));
        let tree = session.registry.get("proj").unwrap();
        assert_eq!(tree.parent(a), Some(root));
        assert!(session.store.exists(Path::new("/work/proj/a.txt")));
        assert!(!session.store.exists(Path::new("/work/proj/b/a.txt")));
        assert!(session.links.calls.is_empty());
    }

    #[test]
    fn test_move_within_parent_keeps_ids() {
        let mut session = mem_session();
        let root = session.registry.get("proj").unwrap().root();
        let a = create::unit(&mut session, "proj", root, Some("a.txt"), "", Position::End)
            .unwrap()
            .affected[0];
        create::unit(&mut session, "proj", root, Some("b.txt"), "", Position::End).unwrap();

        let result = run(&mut session, "proj", a, root, Position::End).unwrap();

        let tree = session.registry.get("proj").unwrap();
        assert_eq!(tree.index_of(a), Some(1));
        assert!(result.link_rewrites.is_empty());
    }
}
