//! # Tree Model
//!
//! A project is held as an arena of [`Element`]s addressed by [`NodeId`].
//! Ownership runs strictly downward: a container owns the ordered list of its
//! children's ids, while `Element::parent` is a plain back-handle. There are
//! no reference-counted cycles; removing an element frees its whole subtree.
//!
//! Freed slots are never reused: a [`NodeId`] names one element for the life
//! of the tree, so a stale id reads as absent (see [`DipTree::contains`])
//! instead of aliasing a newer element. Reloads and deletes leave empty slots
//! behind; a tree lives for one session and is rebuilt on the next load.
//!
//! ## Ordering
//!
//! A container's child list *is* the presentation order. Files come first,
//! containers after (see [`DipTree::first_container_index`]). The arena never
//! reorders on its own; callers pick insertion indexes with
//! [`DipTree::insertion_index`].
//!
//! ## Identifiers
//!
//! IDs are never stored. [`DipTree::relative_project_id`] walks the parent
//! handles and joins `dip_name`s with `/`, stopping below the project root.

use crate::error::{DipError, Result};
use crate::model::{Category, Element, ElementKind, NodeId, Position};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct DipTree {
    nodes: Vec<Option<Element>>,
    root: NodeId,
}

impl DipTree {
    pub fn new(project_name: &str, resource: impl Into<PathBuf>) -> Self {
        let root = Element::new(ElementKind::Project, project_name, resource);
        Self {
            nodes: vec![Some(root)],
            root: NodeId(0),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn project_name(&self) -> &str {
        self.nodes[self.root.0]
            .as_ref()
            .map(|e| e.dip_name.as_str())
            .unwrap_or_default()
    }

    pub fn get(&self, id: NodeId) -> Option<&Element> {
        self.nodes.get(id.0).and_then(|slot| slot.as_ref())
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    pub fn element(&self, id: NodeId) -> Result<&Element> {
        self.get(id)
            .ok_or_else(|| DipError::NotFound(format!("element {}", id)))
    }

    pub fn element_mut(&mut self, id: NodeId) -> Result<&mut Element> {
        self.nodes
            .get_mut(id.0)
            .and_then(|slot| slot.as_mut())
            .ok_or_else(|| DipError::NotFound(format!("element {}", id)))
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map(|e| e.children.as_slice()).unwrap_or(&[])
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|e| e.parent)
    }

    pub fn index_of(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|c| *c == id)
    }

    /// All live elements, in arena order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Element)> {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|e| (NodeId(i), e)))
    }

    /// Adds `element` under `parent` at `index` (clamped to the list length).
    pub fn insert(&mut self, parent: NodeId, index: usize, mut element: Element) -> Result<NodeId> {
        let parent_el = self.element(parent)?;
        if !parent_el.is_container() {
            return Err(DipError::Unsupported {
                op: "add children to",
                name: parent_el.name.clone(),
            });
        }
        element.parent = Some(parent);
        let id = NodeId(self.nodes.len());
        self.nodes.push(Some(element));
        self.attach_at(parent, id, index)?;
        Ok(id)
    }

    fn attach_at(&mut self, parent: NodeId, id: NodeId, index: usize) -> Result<()> {
        let children = &mut self.element_mut(parent)?.children;
        let index = index.min(children.len());
        children.insert(index, id);
        Ok(())
    }

    /// Unlinks `id` from its parent's child list, keeping the subtree alive.
    /// Returns the index it occupied.
    pub fn detach(&mut self, id: NodeId) -> Result<usize> {
        let parent = self
            .parent(id)
            .ok_or_else(|| DipError::Unsupported {
                op: "detach",
                name: self.project_name().to_string(),
            })?;
        let index = self
            .index_of(id)
            .ok_or_else(|| DipError::NotFound(format!("element {} in its parent", id)))?;
        self.element_mut(parent)?.children.remove(index);
        self.element_mut(id)?.parent = None;
        Ok(index)
    }

    /// Re-links a detached subtree under `parent`.
    pub fn attach(&mut self, id: NodeId, parent: NodeId, index: usize) -> Result<()> {
        if !self.element(parent)?.is_container() {
            return Err(DipError::Unsupported {
                op: "add children to",
                name: self.element(parent)?.name.clone(),
            });
        }
        self.element_mut(id)?.parent = Some(parent);
        self.attach_at(parent, id, index)
    }

    /// Detaches `id` and frees it with all descendants. Returns its former index.
    pub fn remove(&mut self, id: NodeId) -> Result<usize> {
        let index = self.detach(id)?;
        self.free(id);
        Ok(index)
    }

    /// Swaps `id` for a new element at the same index of the same parent.
    pub fn replace(&mut self, id: NodeId, element: Element) -> Result<NodeId> {
        let parent = self
            .parent(id)
            .ok_or_else(|| DipError::NotFound(format!("parent of {}", id)))?;
        let index = self.remove(id)?;
        self.insert(parent, index, element)
    }

    /// Frees every descendant of a container, leaving it empty.
    pub fn clear_children(&mut self, id: NodeId) -> Result<()> {
        let children = std::mem::take(&mut self.element_mut(id)?.children);
        for child in children {
            self.free(child);
        }
        Ok(())
    }

    fn free(&mut self, id: NodeId) {
        let children = self
            .nodes
            .get_mut(id.0)
            .and_then(|slot| slot.take())
            .map(|e| e.children)
            .unwrap_or_default();
        for child in children {
            self.free(child);
        }
    }

    /// Pre-order descendants of `id`, excluding `id` itself.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }
        out
    }

    pub fn is_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut current = self.parent(id);
        while let Some(p) = current {
            if p == ancestor {
                return true;
            }
            current = self.parent(p);
        }
        false
    }

    /// Index of the last file-category child, if any.
    pub fn last_unit_index(&self, container: NodeId) -> Option<usize> {
        self.children(container)
            .iter()
            .rposition(|c| self.category_of(*c) == Some(Category::File))
    }

    /// Index of the first container-category child, or the list length.
    pub fn first_container_index(&self, container: NodeId) -> usize {
        let children = self.children(container);
        children
            .iter()
            .position(|c| self.category_of(*c) == Some(Category::Container))
            .unwrap_or(children.len())
    }

    fn category_of(&self, id: NodeId) -> Option<Category> {
        self.get(id).map(|e| e.category())
    }

    /// Resolves a [`Position`] to a child-list index for an element of `category`.
    pub fn insertion_index(
        &self,
        container: NodeId,
        category: Category,
        position: Position,
    ) -> Result<usize> {
        let len = self.children(container).len();
        let boundary = self.first_container_index(container);
        let (low, high) = match category {
            Category::File => (0, boundary),
            Category::Container => (boundary, len),
        };
        let index = match position {
            Position::Start => low,
            Position::End => high,
            Position::Index(i) => return Ok(i.min(len)),
            Position::Before(n) | Position::After(n) => {
                if self.parent(n) != Some(container) {
                    return Err(DipError::NotFound(format!(
                        "neighbour {} in {}",
                        n,
                        self.relative_project_id(container)
                    )));
                }
                let at = self.index_of(n).unwrap_or(high);
                let at = if matches!(position, Position::After(_)) {
                    at + 1
                } else {
                    at
                };
                at.clamp(low, high)
            }
        };
        Ok(index)
    }

    /// Path segments from the project root, i.e. the folder nesting depth.
    pub fn depth(&self, id: NodeId) -> usize {
        let mut depth = 0;
        let mut current = id;
        while let Some(p) = self.parent(current) {
            depth += 1;
            current = p;
        }
        depth
    }

    pub fn relative_project_id(&self, id: NodeId) -> String {
        let mut segments = Vec::new();
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            if let Some(el) = self.get(current) {
                segments.push(el.dip_name.as_str());
            }
            current = parent;
        }
        segments.reverse();
        segments.join("/")
    }

    pub fn full_id(&self, id: NodeId) -> String {
        let rel = self.relative_project_id(id);
        if rel.is_empty() {
            self.project_name().to_string()
        } else {
            format!("{}/{}", self.project_name(), rel)
        }
    }

    pub fn full_id_with_revision(&self, id: NodeId, revision: &str) -> String {
        format!("{}@{}", self.full_id(id), revision)
    }

    /// Nearest include folder strictly above `id`.
    pub fn include_ancestor(&self, id: NodeId) -> Option<NodeId> {
        let mut current = self.parent(id);
        while let Some(p) = current {
            if self.get(p).map(|e| e.kind) == Some(ElementKind::IncludeFolder) {
                return Some(p);
            }
            current = self.parent(p);
        }
        None
    }

    /// For included elements, the full ID inside the linked project.
    pub fn source_id(&self, id: NodeId) -> Option<String> {
        let include = if self.get(id)?.kind == ElementKind::IncludeFolder {
            id
        } else {
            self.include_ancestor(id)?
        };
        let link = self.get(include)?.link.as_ref()?;
        let include_rel = self.relative_project_id(include);
        let own_rel = self.relative_project_id(id);
        let below = own_rel
            .strip_prefix(&include_rel)
            .unwrap_or_default()
            .trim_start_matches('/');
        let mut out = format!("{}/{}", link.project, link.folder);
        if !below.is_empty() {
            out.push('/');
            out.push_str(below);
        }
        Some(out)
    }

    /// Inverse of [`DipTree::relative_project_id`].
    pub fn find_element(&self, relative_id: &str) -> Option<NodeId> {
        let mut current = self.root;
        for segment in relative_id.split('/').filter(|s| !s.is_empty()) {
            current = *self
                .children(current)
                .iter()
                .find(|c| self.get(**c).map(|e| e.dip_name.as_str()) == Some(segment))?;
        }
        Some(current)
    }

    /// Case-insensitive child lookup by on-disk name.
    pub fn find_child(&self, container: NodeId, name: &str) -> Option<NodeId> {
        self.children(container).iter().copied().find(|c| {
            self.get(*c)
                .map(|e| e.name.eq_ignore_ascii_case(name))
                .unwrap_or(false)
        })
    }

    pub fn previous_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let index = self.index_of(id)?;
        index
            .checked_sub(1)
            .map(|i| self.children(parent)[i])
    }

    /// Points `id` at `new_resource` and rebases every descendant's resource
    /// from the old prefix onto the new one. Identities are untouched.
    pub fn repoint(&mut self, id: NodeId, new_resource: &Path) -> Result<()> {
        let old = std::mem::replace(
            &mut self.element_mut(id)?.resource,
            new_resource.to_path_buf(),
        );
        for d in self.descendants(id) {
            let el = self.element_mut(d)?;
            if let Ok(rest) = el.resource.strip_prefix(&old) {
                el.resource = new_resource.join(rest);
            }
        }
        Ok(())
    }

    /// Number of live, enabled, non-reserved elements below `id`.
    pub fn count_live(&self, id: NodeId) -> usize {
        self.children(id)
            .iter()
            .filter_map(|c| self.get(*c).map(|e| (*c, e)))
            .filter(|(_, e)| !e.disabled && !e.kind.is_reserved())
            .map(|(c, _)| 1 + self.count_live(c))
            .sum()
    }
}
