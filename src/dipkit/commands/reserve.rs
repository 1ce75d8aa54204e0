//! Bringing reserved elements back.
//!
//! A reserved unit is restored from its marker's content under its old
//! name. A reserved folder only loses its `.rsvd` marker; the content was
//! never removed, so the subtree is reloaded from the store.

use crate::commands::helpers::{self, persist_or_warn};
use crate::commands::{CmdMessage, CmdResult};
use crate::error::{CollisionKind, DipError, Result};
use crate::links::LinkRewriter;
use crate::loader;
use crate::model::{Element, ElementKind, NodeId};
use crate::naming::RESERVED_MARKER;
use crate::session::Session;
use crate::store::ExternalStore;
use crate::tree::DipTree;
use tracing::{info, warn};

pub fn unreserve<S: ExternalStore, L: LinkRewriter>(
    session: &mut Session<S, L>,
    project: &str,
    id: NodeId,
) -> Result<CmdResult> {
    let Session {
        store, registry, ..
    } = session;
    let tree = registry.get_mut(project)?;

    let el = tree.element(id)?;
    let kind = el.kind;
    let name = el.name.clone();
    let annotations = el.annotations.clone();
    let marker = el.resource.clone();
    helpers::ensure_writable(tree, id)?;
    let parent = tree
        .parent(id)
        .ok_or_else(|| DipError::NotFound(format!("parent of {}", name)))?;
    let parent_dir = helpers::resource(tree, parent)?;

    let restored = match kind {
        ElementKind::ReservedUnit => {
            check_free(store, tree, parent, id, &name)?;
            let content = store.read_text(&marker)?;
            let path = store.create_file(&parent_dir, &name, &content)?;
            if let Err(e) = store.delete(&marker) {
                if let Err(rollback) = store.delete(&path) {
                    warn!(path = %path.display(), error = %rollback, "rollback failed");
                }
                return Err(e);
            }
            let mut unit = Element::new(ElementKind::for_file(&name), name.as_str(), path);
            unit.annotations = annotations;
            tree.replace(id, unit)?
        }
        ElementKind::ReservedFolder => {
            store.delete(&marker.join(RESERVED_MARKER))?;
            let folder = Element::new(ElementKind::Folder, name.as_str(), marker);
            let folder = tree.replace(id, folder)?;
            loader::reload_children(store, tree, folder)?;
            folder
        }
        ElementKind::Project
        | ElementKind::Folder
        | ElementKind::IncludeFolder
        | ElementKind::Unit
        | ElementKind::Report
        | ElementKind::Table => {
            return Err(DipError::Unsupported {
                op: "unreserve",
                name,
            })
        }
    };

    let mut result = CmdResult::default().with_affected(vec![restored]);
    persist_or_warn(store, tree, parent, &mut result);
    let full_id = tree.full_id(restored);
    info!(element = %full_id, "element unreserved");
    result.add_message(CmdMessage::success(format!("Restored {}", full_id)));
    Ok(result)
}

/// A reserved unit's name may have been taken by a sibling since.
fn check_free<S: ExternalStore>(
    store: &S,
    tree: &DipTree,
    parent: NodeId,
    id: NodeId,
    name: &str,
) -> Result<()> {
    let taken_in_tree = tree
        .children(parent)
        .iter()
        .filter(|c| **c != id)
        .filter_map(|c| tree.get(*c))
        .any(|e| e.name.eq_ignore_ascii_case(name));
    let dir = helpers::resource(tree, parent)?;
    if taken_in_tree || store.find_child(&dir, name)?.is_some() {
        warn!(unit = name, "name of reserved unit is taken");
        return Err(DipError::Collision {
            name: name.to_string(),
            parent: tree.full_id(parent),
            kind: CollisionKind::Exists,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::create;
    use crate::commands::delete::{self, DeleteOptions};
    use crate::model::Position;
    use crate::test_utils::mem_session;
    use std::path::Path;

    #[test]
    fn test_unit_round_trip() {
        let mut session = mem_session();
        let root = session.registry.get("proj").unwrap().root();
        create::unit(&mut session, "proj", root, Some("a.txt"), "", Position::End).unwrap();
        let b = create::unit(&mut session, "proj", root, Some("b.txt"), "keep me", Position::End)
            .unwrap()
            .affected[0];
        session
            .registry
            .get_mut("proj")
            .unwrap()
            .element_mut(b)
            .unwrap()
            .annotations
            .comment = Some("check".into());
        let reserved = delete::run(&mut session, "proj", b, DeleteOptions::reserve())
            .unwrap()
            .affected[0];

        let result = unreserve(&mut session, "proj", reserved).unwrap();

        let tree = session.registry.get("proj").unwrap();
        let unit = result.affected[0];
        let el = tree.get(unit).unwrap();
        assert_eq!(el.kind, ElementKind::Unit);
        assert_eq!(el.annotations.comment.as_deref(), Some("check"));
        assert_eq!(tree.index_of(unit), Some(1));
        assert_eq!(
            session.store.read_text(Path::new("/work/proj/b.txt")).unwrap(),
            "keep me"
        );
        assert!(!session.store.exists(Path::new("/work/proj/b.txt.rsvd")));
    }

    #[test]
    fn test_folder_round_trip_reloads_content() {
        let mut session = mem_session();
        let root = session.registry.get("proj").unwrap().root();
        let f = create::folder(&mut session, "proj", root, Some("f"), Position::End)
            .unwrap()
            .affected[0];
        create::unit(&mut session, "proj", f, Some("x.txt"), "", Position::End).unwrap();
        let reserved = delete::run(&mut session, "proj", f, DeleteOptions::reserve())
            .unwrap()
            .affected[0];

        let folder = unreserve(&mut session, "proj", reserved).unwrap().affected[0];

        let tree = session.registry.get("proj").unwrap();
        assert_eq!(tree.get(folder).unwrap().kind, ElementKind::Folder);
        assert_eq!(tree.find_element("f/x.txt").map(|u| tree.parent(u)), Some(Some(folder)));
        assert!(!session.store.exists(Path::new("/work/proj/f/.rsvd")));
    }

    #[test]
    fn test_taken_name_is_a_collision() {
        let mut session = mem_session();
        let root = session.registry.get("proj").unwrap().root();
        let a = create::unit(&mut session, "proj", root, Some("a.txt"), "", Position::End)
            .unwrap()
            .affected[0];
        let reserved = delete::run(&mut session, "proj", a, DeleteOptions::reserve())
            .unwrap()
            .affected[0];
        session.store.put_file("/work/proj/A.TXT", "");

        let err = unreserve(&mut session, "proj", reserved).unwrap_err();

        assert!(matches!(
            err,
            DipError::Collision {
                kind: CollisionKind::Exists,
                ..
            }
        ));
        assert!(session.store.exists(Path::new("/work/proj/a.txt.rsvd")));
    }

    #[test]
    fn test_live_elements_are_unsupported() {
        let mut session = mem_session();
        let root = session.registry.get("proj").unwrap().root();
        let a = create::unit(&mut session, "proj", root, Some("a.txt"), "", Position::End)
            .unwrap()
            .affected[0];
        assert!(matches!(
            unreserve(&mut session, "proj", a),
            Err(DipError::Unsupported { .. })
        ));
    }
}
