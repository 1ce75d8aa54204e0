//! Building a [`DipTree`] from the store, and project initialisation.
//!
//! Loading walks each container directory:
//! - hidden entries (descriptors, markers, temp files) are skipped
//! - `<name>.rsvd` files become reserved units named `<name>`
//! - directories holding a `.rsvd` marker become reserved folders
//! - other directories become folders and are loaded recursively
//! - other files become units, reports or tables by extension
//!
//! Children are ordered by the descriptor's `order` list; entries it does
//! not mention follow, files first, each group by name. Files always end up
//! ahead of containers.

use crate::descriptor::Descriptor;
use crate::error::{DipError, Result};
use crate::model::{Category, Element, ElementKind, IncludeLink, NodeId};
use crate::naming::{self, PROJECT_MARKER, RESERVED_MARKER};
use crate::store::ExternalStore;
use crate::tree::DipTree;
use std::path::Path;
use tracing::{debug, info, warn};

/// Inherited flags for elements loaded below an include folder.
#[derive(Debug, Clone, Copy, Default)]
struct Origin {
    included: bool,
}

pub fn is_project<S: ExternalStore>(store: &S, dir: &Path) -> bool {
    store.exists(&dir.join(PROJECT_MARKER))
}

/// Creates a new, empty project directory `parent/name`.
pub fn init_project<S: ExternalStore>(store: &mut S, parent: &Path, name: &str) -> Result<DipTree> {
    naming::check_name(name).map_err(|source| DipError::Name {
        name: name.to_string(),
        source,
    })?;
    if store.find_child(parent, name)?.is_some() {
        return Err(DipError::Project(format!(
            "'{}' already exists in {}",
            name,
            parent.display()
        )));
    }
    let dir = store.create_folder(parent, name)?;
    store.create_file(&dir, PROJECT_MARKER, "")?;
    Descriptor::default().save(store, &dir)?;
    info!(project = name, path = %dir.display(), "project initialised");
    Ok(DipTree::new(name, dir))
}

/// Loads the project rooted at `dir`.
pub fn open_project<S: ExternalStore>(store: &S, dir: &Path) -> Result<DipTree> {
    if !is_project(store, dir) {
        return Err(DipError::Project(format!(
            "{} is not a project (missing {})",
            dir.display(),
            PROJECT_MARKER
        )));
    }
    let name = dir
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| DipError::Project(format!("{} has no usable name", dir.display())))?;

    let mut tree = DipTree::new(name, dir);
    let root = tree.root();
    load_container(store, &mut tree, root, Origin::default())?;
    debug!(project = name, elements = tree.iter().count(), "project loaded");
    Ok(tree)
}

/// Replaces the children of `container` with what the store holds.
pub fn reload_children<S: ExternalStore>(store: &S, tree: &mut DipTree, container: NodeId) -> Result<()> {
    tree.clear_children(container)?;
    let origin = Origin {
        included: tree.element(container)?.included
            || tree.element(container)?.kind == ElementKind::IncludeFolder,
    };
    load_container(store, tree, container, origin)
}

fn load_container<S: ExternalStore>(
    store: &S,
    tree: &mut DipTree,
    container: NodeId,
    origin: Origin,
) -> Result<()> {
    let dir = tree.element(container)?.resource.clone();
    let descriptor = Descriptor::load(store, &dir)?.unwrap_or_default();
    {
        let el = tree.element_mut(container)?;
        el.numbering = descriptor.numbering.clone();
        el.appendix = descriptor.appendix;
        if el.kind != ElementKind::IncludeFolder {
            el.annotations = descriptor.annotations.clone();
        }
    }

    let mut elements = Vec::new();
    for entry in store.list_children(&dir)? {
        let path = dir.join(&entry);
        let element = if store.is_dir(&path) {
            if naming::is_hidden(&entry) {
                continue;
            }
            let kind = if store.exists(&path.join(RESERVED_MARKER)) {
                ElementKind::ReservedFolder
            } else {
                ElementKind::Folder
            };
            Element::new(kind, entry, path)
        } else if let Some(unit) = naming::reserved_unit_name(&entry) {
            let mut el = Element::new(ElementKind::ReservedUnit, unit, path.clone());
            if let Some(annotations) = descriptor.units.get(unit) {
                el.annotations = annotations.clone();
            }
            el
        } else if naming::is_hidden(&entry) {
            continue;
        } else {
            let mut el = Element::new(ElementKind::for_file(&entry), entry.clone(), path);
            if let Some(annotations) = descriptor.units.get(&entry) {
                el.annotations = annotations.clone();
            }
            el
        };
        elements.push(element);
    }

    // Includes are only followed from the project's own folders.
    if !origin.included {
        for include in &descriptor.includes {
            let mut el = Element::new(ElementKind::IncludeFolder, include.name.clone(), include.target.clone());
            let broken = !store.is_dir(&include.target) || include.target.starts_with(&dir);
            if broken {
                warn!(include = %include.name, target = %include.target.display(), "include link is broken");
            }
            el.link = Some(IncludeLink {
                project: include.project.clone(),
                folder: include.folder.clone(),
                target: include.target.clone(),
                broken,
            });
            elements.push(el);
        }
    }

    sort_children(&mut elements, &descriptor.order);

    for mut el in elements {
        el.included = origin.included;
        el.read_only = origin.included;
        let kind = el.kind;
        let follow = match kind {
            ElementKind::Folder => true,
            ElementKind::IncludeFolder => el.link.as_ref().map(|l| !l.broken).unwrap_or(false),
            _ => false,
        };
        let index = tree.children(container).len();
        let id = tree.insert(container, index, el)?;
        if follow {
            let child_origin = Origin {
                included: origin.included || kind == ElementKind::IncludeFolder,
            };
            load_container(store, tree, id, child_origin)?;
        }
    }
    Ok(())
}

fn sort_children(elements: &mut [Element], order: &[String]) {
    let rank = |el: &Element| {
        order
            .iter()
            .position(|n| n.eq_ignore_ascii_case(&el.name))
            .unwrap_or(usize::MAX)
    };
    elements.sort_by(|a, b| {
        let category = |el: &Element| match el.category() {
            Category::File => 0,
            Category::Container => 1,
        };
        category(a)
            .cmp(&category(b))
            .then_with(|| rank(a).cmp(&rank(b)))
            .then_with(|| a.name.cmp(&b.name))
    });
}
