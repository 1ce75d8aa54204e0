use crate::commands::copy::copy_into;
use crate::commands::delete::{delete_element, DeleteOptions};
use crate::commands::helpers::{self, persist_or_warn};
use crate::commands::validate;
use crate::commands::{CmdMessage, CmdResult, MessageLevel};
use crate::error::{DipError, Result};
use crate::links::{self, LinkRewriter};
use crate::model::{ElementKind, NodeId};
use crate::session::Session;
use crate::store::ExternalStore;
use tracing::{debug, info};

/// Dissolves the folder `id`: its children move up into its parent, taking
/// the folder's place in their original order, and the emptied folder is
/// deleted with a snapshot.
///
/// Children are handled one at a time (copy up, then delete from the
/// folder). A failure part-way leaves the children handled so far in the
/// parent; the returned error is the first one met.
pub fn run<S: ExternalStore, L: LinkRewriter>(
    session: &mut Session<S, L>,
    project: &str,
    id: NodeId,
) -> Result<CmdResult> {
    let Session {
        store,
        links,
        registry,
        config,
        snapshots,
    } = session;
    let tree = registry.get_mut(project)?;

    let el = tree.element(id)?;
    match el.kind {
        ElementKind::Folder => {}
        ElementKind::Project
        | ElementKind::IncludeFolder
        | ElementKind::Unit
        | ElementKind::ReservedFolder
        | ElementKind::ReservedUnit
        | ElementKind::Report
        | ElementKind::Table => {
            return Err(DipError::Unsupported {
                op: "extract",
                name: el.name.clone(),
            });
        }
    }
    helpers::ensure_writable(tree, id)?;
    let parent = tree
        .parent(id)
        .ok_or_else(|| DipError::NotFound(format!("parent of {}", el.name)))?;
    let folder_id = tree.full_id(id);
    let start = tree
        .index_of(id)
        .ok_or_else(|| DipError::NotFound(folder_id.clone()))?;

    let mut result = CmdResult::default();
    let children = tree.children(id).to_vec();
    debug!(folder = %folder_id, children = children.len(), "extracting");

    for (offset, child) in children.into_iter().enumerate() {
        let child_el = tree.element(child)?;
        let name = child_el.name.clone();
        let category = child_el.category();
        let old_id = tree.relative_project_id(child);
        let levels = helpers::folder_levels(tree, child);

        validate::can_place(store, tree, parent, &name, category, levels, None)?;
        let moved = copy_into(store, tree, child, parent, start + offset, &name)?;
        let mut scratch = CmdResult::default();
        delete_element(
            store,
            tree,
            snapshots,
            config.reserve_policy,
            child,
            DeleteOptions::default(),
            &mut scratch,
        )?;
        result.messages.extend(
            scratch
                .messages
                .into_iter()
                .filter(|m| m.level != MessageLevel::Success),
        );
        result.affected.push(moved);
        result.add_rewrite(links::notify(links, tree, moved, old_id));
    }

    let options = DeleteOptions {
        reserve: true,
        tmp: true,
    };
    delete_element(store, tree, snapshots, config.reserve_policy, id, options, &mut result)?;
    persist_or_warn(store, tree, parent, &mut result);

    info!(folder = %folder_id, moved = result.affected.len(), "folder extracted");
    result.add_message(CmdMessage::success(format!(
        "Extracted {} ({} elements moved up)",
        folder_id,
        result.affected.len()
    )));
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::create;
    use crate::links::LinkScope;
    use crate::model::Position;
    use crate::test_utils::mem_session;
    use std::path::Path;

    #[test]
    fn test_children_take_the_folder_place() {
        let mut session = mem_session();
        let root = session.registry.get("proj").unwrap().root();
        let p = create::folder(&mut session, "proj", root, Some("p"), Position::End)
            .unwrap()
            .affected[0];
        for name in ["a.txt", "b.txt"] {
            create::unit(&mut session, "proj", p, Some(name), "", Position::End).unwrap();
        }
        let f = create::folder(&mut session, "proj", p, Some("f"), Position::End)
            .unwrap()
            .affected[0];
        for name in ["u1.txt", "u2.txt", "u3.txt"] {
            create::unit(&mut session, "proj", f, Some(name), name, Position::End).unwrap();
        }

        let result = run(&mut session, "proj", f).unwrap();

        let tree = session.registry.get("proj").unwrap();
        let names: Vec<_> = tree
            .children(p)
            .iter()
            .map(|c| tree.get(*c).unwrap().name.as_str())
            .collect();
        assert_eq!(names, ["a.txt", "b.txt", "u1.txt", "u2.txt", "u3.txt"]);
        assert!(tree.find_element("p/f").is_none());
        assert!(!session.store.exists(Path::new("/work/proj/p/f")));
        assert_eq!(
            session.store.read_text(Path::new("/work/proj/p/u2.txt")).unwrap(),
            "u2.txt"
        );

        assert_eq!(result.snapshots.len(), 1);
        assert_eq!(result.snapshots[0].name, "f");
        let calls: Vec<_> = session
            .links
            .calls
            .iter()
            .map(|c| (c.old_id.as_str(), c.new_id.as_str()))
            .collect();
        assert_eq!(
            calls,
            [
                ("p/f/u1.txt", "p/u1.txt"),
                ("p/f/u2.txt", "p/u2.txt"),
                ("p/f/u3.txt", "p/u3.txt")
            ]
        );
        assert_eq!(session.links.calls[0].scope, LinkScope::Project("proj".into()));
    }

    #[test]
    fn test_collision_stops_after_moved_children() {
        let mut session = mem_session();
        let root = session.registry.get("proj").unwrap().root();
        create::unit(&mut session, "proj", root, Some("u2.txt"), "", Position::End).unwrap();
        let f = create::folder(&mut session, "proj", root, Some("f"), Position::End)
            .unwrap()
            .affected[0];
        for name in ["u1.txt", "u2.txt"] {
            create::unit(&mut session, "proj", f, Some(name), "", Position::End).unwrap();
        }

        let err = run(&mut session, "proj", f).unwrap_err();

        assert!(matches!(err, DipError::Collision { .. }));
        let tree = session.registry.get("proj").unwrap();
        assert!(tree.find_element("u1.txt").is_some());
        assert!(tree.find_element("f/u2.txt").is_some());
        assert!(session.store.exists(Path::new("/work/proj/u1.txt")));
    }

    #[test]
    fn test_only_folders() {
        let mut session = mem_session();
        let root = session.registry.get("proj").unwrap().root();
        let u = create::unit(&mut session, "proj", root, Some("a.txt"), "", Position::End)
            .unwrap()
            .affected[0];
        assert!(matches!(
            run(&mut session, "proj", u),
            Err(DipError::Unsupported { .. })
        ));
        assert!(matches!(
            run(&mut session, "proj", root),
            Err(DipError::Unsupported { .. })
        ));
    }
}
