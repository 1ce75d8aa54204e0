//! Placement validation shared by create, rename, move, copy and paste.
//!
//! Checks run in a fixed order and stop at the first failure:
//!
//! 1. the target accepts children (writable container)
//! 2. name validity
//! 3. an existing sibling with that name, probed twice: the in-memory child
//!    list and the store directory (case-insensitive)
//! 4. a disabled twin `dis.<name>`
//! 5. a reserved entry `<name>.rsvd`
//! 6. folders: the maximum depth
//! 7. attachments: the extension whitelist
//!
//! Nothing is mutated here, so every error is safe to retry.

use crate::commands::helpers::{self, ensure_target, ensure_writable, entry_name};
use crate::error::{CollisionKind, DipError, Result};
use crate::model::{Category, NodeId, MAX_DEPTH};
use crate::naming;
use crate::store::ExternalStore;
use crate::tree::DipTree;
use std::path::Path;

pub fn can_create_file<S: ExternalStore>(
    store: &S,
    tree: &DipTree,
    container: NodeId,
    name: &str,
) -> Result<()> {
    can_place(store, tree, container, name, Category::File, 0, None)
}

pub fn can_create_folder<S: ExternalStore>(
    store: &S,
    tree: &DipTree,
    container: NodeId,
    name: &str,
) -> Result<()> {
    can_place(store, tree, container, name, Category::Container, 1, None)
}

/// Like [`can_create_file`], plus the `.report`/`.xml` extension whitelist.
pub fn can_paste_attachment<S: ExternalStore>(
    store: &S,
    tree: &DipTree,
    container: NodeId,
    name: &str,
) -> Result<()> {
    can_create_file(store, tree, container, name)?;
    if !naming::has_attachment_extension(name) {
        return Err(DipError::Extension {
            name: name.to_string(),
        });
    }
    Ok(())
}

/// Validates pasting the store entry at `source` into `container`.
///
/// Directories follow folder rules, including the depth of everything they
/// contain. Files are refused by appendix containers and otherwise follow
/// file rules, or attachment rules when `attachment` is set.
pub fn can_paste<S: ExternalStore>(
    store: &S,
    tree: &DipTree,
    container: NodeId,
    source: &Path,
    attachment: bool,
) -> Result<()> {
    let name = entry_name(source)?;
    if !store.exists(source) {
        return Err(DipError::NotFound(source.display().to_string()));
    }
    if store.is_dir(source) {
        let levels = helpers::store_folder_levels(store, source)?;
        return can_place(store, tree, container, &name, Category::Container, levels, None);
    }
    if attachment {
        return can_paste_attachment(store, tree, container, &name);
    }
    if tree.element(container)?.appendix {
        return Err(DipError::Unsupported {
            op: "paste files into appendix",
            name: tree.element(container)?.name.clone(),
        });
    }
    can_create_file(store, tree, container, &name)
}

/// Validates renaming `id` to `new_name` inside its current parent.
pub fn can_rename<S: ExternalStore>(
    store: &S,
    tree: &DipTree,
    id: NodeId,
    new_name: &str,
) -> Result<()> {
    ensure_writable(tree, id)?;
    let parent = tree
        .parent(id)
        .ok_or_else(|| DipError::Unsupported {
            op: "rename",
            name: tree.project_name().to_string(),
        })?;
    let category = tree.element(id)?.category();
    check_name(new_name)?;
    check_collisions(store, tree, parent, new_name, category, Some(id))
}

/// Full placement check for an element of `category` spanning `levels`
/// folder levels, optionally ignoring an element that is being replaced or
/// renamed.
pub fn can_place<S: ExternalStore>(
    store: &S,
    tree: &DipTree,
    container: NodeId,
    name: &str,
    category: Category,
    levels: usize,
    ignore: Option<NodeId>,
) -> Result<()> {
    ensure_target(tree, container)?;
    check_name(name)?;
    check_collisions(store, tree, container, name, category, ignore)?;
    check_depth(tree, container, name, levels)
}

pub fn check_name(name: &str) -> Result<()> {
    naming::check_name(name).map_err(|source| DipError::Name {
        name: name.to_string(),
        source,
    })
}

pub fn check_depth(tree: &DipTree, container: NodeId, name: &str, levels: usize) -> Result<()> {
    if levels == 0 {
        return Ok(());
    }
    let depth = tree.depth(container) + levels;
    if depth > MAX_DEPTH {
        return Err(DipError::Depth {
            name: name.to_string(),
            depth,
        });
    }
    Ok(())
}

fn check_collisions<S: ExternalStore>(
    store: &S,
    tree: &DipTree,
    container: NodeId,
    name: &str,
    category: Category,
    ignore: Option<NodeId>,
) -> Result<()> {
    let dir = helpers::resource(tree, container)?;
    // Only the ignored element's own entry is exempt, never a namesake in
    // another directory.
    let ignored_resource = ignore.and_then(|id| tree.get(id)).map(|e| e.resource.as_path());
    let is_ignored = |entry: &str| ignored_resource == Some(dir.join(entry).as_path());
    let collision = |kind| DipError::Collision {
        name: name.to_string(),
        parent: tree.full_id(container),
        kind,
    };

    // Probe 1: the tree
    if let Some(sibling) = tree.find_child(container, name).filter(|s| Some(*s) != ignore) {
        let sibling = tree.element(sibling)?;
        let kind = if sibling.kind.is_reserved() {
            CollisionKind::Reserved
        } else if sibling.category() != category {
            CollisionKind::FolderFile
        } else {
            CollisionKind::Exists
        };
        return Err(collision(kind));
    }

    // Probe 2: the store, which may hold entries the tree never loaded
    if let Some(entry) = store.find_child(&dir, name)? {
        if !is_ignored(entry.as_str()) {
            return Err(collision(CollisionKind::Exists));
        }
    }

    if !naming::is_disabled(name) {
        let twin = naming::disabled_name(name);
        let in_tree = tree
            .find_child(container, &twin)
            .filter(|s| Some(*s) != ignore)
            .is_some();
        let in_store = store
            .find_child(&dir, &twin)?
            .filter(|entry| !is_ignored(entry.as_str()))
            .is_some();
        if in_tree || in_store {
            return Err(collision(CollisionKind::Disabled));
        }
    }

    if store
        .find_child(&dir, &naming::reserved_marker_name(name))?
        .is_some()
    {
        return Err(collision(CollisionKind::Reserved));
    }

    Ok(())
}
