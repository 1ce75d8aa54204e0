//! # Ordering / Selection Validator
//!
//! Elements move one step at a time within their container, and only among
//! elements of the same [`Category`]: a unit never jumps over the file/folder
//! boundary and neither does a folder.
//!
//! A multi-selection moves as a block. It must be non-empty, share one parent
//! and one category, and occupy a contiguous run of indexes. The move is a
//! single splice: the sibling just outside the block is taken out and put
//! back at the opposite end, so the block's inner order is preserved and the
//! rest of the list is untouched.

use crate::error::{DipError, Result};
use crate::model::{Category, NodeId};
use crate::tree::DipTree;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

/// A validated contiguous selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Block {
    parent: NodeId,
    first: usize,
    last: usize,
}

fn neighbour_index(block: &Block, direction: Direction, len: usize) -> Option<usize> {
    match direction {
        Direction::Up => block.first.checked_sub(1),
        Direction::Down => Some(block.last + 1).filter(|i| *i < len),
    }
}

fn select(tree: &DipTree, ids: &[NodeId]) -> Option<Block> {
    let first_id = *ids.first()?;
    let parent = tree.parent(first_id)?;
    let category = tree.get(first_id)?.category();

    let mut indexes = Vec::with_capacity(ids.len());
    for id in ids {
        let el = tree.get(*id)?;
        if el.parent != Some(parent) || el.category() != category {
            return None;
        }
        indexes.push(tree.index_of(*id)?);
    }
    indexes.sort_unstable();
    indexes.dedup();

    let first = indexes[0];
    let last = indexes[indexes.len() - 1];
    if last - first + 1 != indexes.len() {
        return None;
    }
    Some(Block {
        parent,
        first,
        last,
    })
}

fn can_move_block(tree: &DipTree, block: &Block, direction: Direction) -> bool {
    let children = tree.children(block.parent);
    let boundary = match direction {
        Direction::Up => children[block.first],
        Direction::Down => children[block.last],
    };
    let Some(category) = tree.get(boundary).map(|e| e.category()) else {
        return false;
    };
    neighbour_index(block, direction, children.len())
        .and_then(|i| tree.get(children[i]))
        .map(|n| n.category() == category)
        .unwrap_or(false)
}

pub fn can_up(tree: &DipTree, id: NodeId) -> bool {
    can_move(tree, &[id], Direction::Up)
}

pub fn can_down(tree: &DipTree, id: NodeId) -> bool {
    can_move(tree, &[id], Direction::Down)
}

/// True iff the selection is a valid block whose boundary element can step
/// in `direction`.
pub fn can_move(tree: &DipTree, ids: &[NodeId], direction: Direction) -> bool {
    select(tree, ids)
        .map(|block| can_move_block(tree, &block, direction))
        .unwrap_or(false)
}

pub fn up(tree: &mut DipTree, ids: &[NodeId]) -> Result<()> {
    shift(tree, ids, Direction::Up)
}

pub fn down(tree: &mut DipTree, ids: &[NodeId]) -> Result<()> {
    shift(tree, ids, Direction::Down)
}

/// Moves the selection one step in `direction`.
pub fn shift(tree: &mut DipTree, ids: &[NodeId], direction: Direction) -> Result<()> {
    let block = select(tree, ids).ok_or_else(|| {
        DipError::Api("selection must be contiguous siblings of one kind".to_string())
    })?;
    if !can_move_block(tree, &block, direction) {
        let name = tree
            .get(ids[0])
            .map(|e| e.name.clone())
            .unwrap_or_default();
        return Err(DipError::Unsupported {
            op: match direction {
                Direction::Up => "move up",
                Direction::Down => "move down",
            },
            name,
        });
    }

    let children = &mut tree.element_mut(block.parent)?.children;
    match direction {
        Direction::Up => {
            let neighbour = children.remove(block.first - 1);
            children.insert(block.last, neighbour);
        }
        Direction::Down => {
            let neighbour = children.remove(block.last + 1);
            children.insert(block.first, neighbour);
        }
    }
    Ok(())
}

/// Category shared by a valid selection.
pub fn selection_category(tree: &DipTree, ids: &[NodeId]) -> Option<Category> {
    select(tree, ids)?;
    tree.get(ids[0]).map(|e| e.category())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Element, ElementKind};

    /// Root with units u0..u4 followed by folders f0, f1.
    fn sample() -> (DipTree, Vec<NodeId>, Vec<NodeId>) {
        let mut tree = DipTree::new("proj", "/p");
        let root = tree.root();
        let units: Vec<NodeId> = (0..5)
            .map(|i| {
                let name = format!("u{}", i);
                tree.insert(root, i, Element::new(ElementKind::Unit, &name, &name))
                    .unwrap()
            })
            .collect();
        let folders: Vec<NodeId> = (0..2)
            .map(|i| {
                let name = format!("f{}", i);
                tree.insert(root, 5 + i, Element::new(ElementKind::Folder, &name, &name))
                    .unwrap()
            })
            .collect();
        (tree, units, folders)
    }

    fn names(tree: &DipTree) -> Vec<String> {
        tree.children(tree.root())
            .iter()
            .map(|c| tree.get(*c).unwrap().name.clone())
            .collect()
    }

    #[test]
    fn test_single_element_rules() {
        let (tree, units, folders) = sample();
        assert!(!can_up(&tree, units[0]));
        assert!(can_up(&tree, units[1]));
        assert!(can_down(&tree, units[3]));
        // last unit cannot jump over the first folder
        assert!(!can_down(&tree, units[4]));
        assert!(!can_up(&tree, folders[0]));
        assert!(can_down(&tree, folders[0]));
        assert!(!can_down(&tree, folders[1]));
    }

    #[test]
    fn test_block_up_keeps_relative_order() {
        let (mut tree, units, _) = sample();
        let selection = [units[2], units[3], units[4]];
        assert!(can_move(&tree, &selection, Direction::Up));

        up(&mut tree, &selection).unwrap();

        assert_eq!(tree.index_of(units[2]), Some(1));
        assert_eq!(tree.index_of(units[3]), Some(2));
        assert_eq!(tree.index_of(units[4]), Some(3));
        assert_eq!(names(&tree), ["u0", "u2", "u3", "u4", "u1", "f0", "f1"]);
    }

    #[test]
    fn test_block_down_swaps_with_next() {
        let (mut tree, units, _) = sample();
        let selection = [units[1], units[2]];
        assert!(can_move(&tree, &selection, Direction::Down));
        down(&mut tree, &selection).unwrap();
        assert_eq!(names(&tree), ["u0", "u3", "u1", "u2", "u4", "f0", "f1"]);
    }

    #[test]
    fn test_block_down_blocked_by_folder() {
        let (tree, units, _) = sample();
        assert!(!can_move(&tree, &[units[3], units[4]], Direction::Down));
    }

    #[test]
    fn test_selection_order_does_not_matter() {
        let (tree, units, _) = sample();
        assert!(can_move(&tree, &[units[3], units[1], units[2]], Direction::Up));
    }

    #[test]
    fn test_invalid_selections() {
        let (mut tree, units, folders) = sample();
        assert!(!can_move(&tree, &[], Direction::Up));
        // not contiguous
        assert!(!can_move(&tree, &[units[1], units[3]], Direction::Up));
        // mixed categories
        assert!(!can_move(&tree, &[units[4], folders[0]], Direction::Up));
        // different parents
        let child = tree
            .insert(folders[0], 0, Element::new(ElementKind::Unit, "c", "c"))
            .unwrap();
        assert!(!can_move(&tree, &[units[1], child], Direction::Up));
        assert!(up(&mut tree, &[units[1], units[3]]).is_err());
    }

    #[test]
    fn test_disallowed_move_is_an_error() {
        let (mut tree, units, _) = sample();
        let err = up(&mut tree, &[units[0]]).unwrap_err();
        assert!(err.to_string().contains("move up"));
        assert_eq!(names(&tree), ["u0", "u1", "u2", "u3", "u4", "f0", "f1"]);
    }
}
