//! # Numbering Engine
//!
//! Containers may number their file children and, independently, their
//! folder children. A step such as `"010"` defines both the label width (3)
//! and the increment (10).
//!
//! Labels are derived lazily by scanning backward from the insertion point;
//! no counters are stored, so manual renames never desynchronise numbering.
//! A previous sibling anchors the next label only if its leading `width`
//! characters parse as a number divisible by the step. Anything else (short
//! names, foreign labels like `015`, disabled names) is skipped.
//!
//! If the scan finds no anchor the step itself is returned, as if the new
//! element were the first. [`Label::anchor`] tells callers whether that
//! fallback happened.

use crate::error::{DipError, Result};
use crate::model::{Category, NodeId};
use crate::tree::DipTree;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    pub text: String,
    /// Name of the sibling the label was derived from.
    pub anchor: Option<String>,
}

/// Parses a step string, rejecting empty, non-numeric and zero steps.
pub fn parse_step(step: &str) -> Result<u64> {
    if step.is_empty() || !step.bytes().all(|b| b.is_ascii_digit()) {
        return Err(DipError::InvalidStep(step.to_string()));
    }
    match step.parse::<u64>() {
        Ok(0) | Err(_) => Err(DipError::InvalidStep(step.to_string())),
        Ok(v) => Ok(v),
    }
}

/// Computes the next label given sibling names ordered nearest-first.
pub fn next_label<'a, I>(step: &str, previous: I) -> Result<Label>
where
    I: IntoIterator<Item = &'a str>,
{
    let value = parse_step(step)?;
    let width = step.len();
    let mut skipped = 0usize;

    for name in previous {
        match leading_number(name, width) {
            Some(n) if n % value == 0 => {
                let next = n
                    .checked_add(value)
                    .ok_or_else(|| DipError::InvalidStep(step.to_string()))?;
                return Ok(Label {
                    text: format!("{:0width$}", next, width = width),
                    anchor: Some(name.to_string()),
                });
            }
            _ => skipped += 1,
        }
    }

    if skipped > 0 {
        debug!(step, skipped, "no numbered anchor found, restarting at step");
    }
    Ok(Label {
        text: step.to_string(),
        anchor: None,
    })
}

fn leading_number(name: &str, width: usize) -> Option<u64> {
    let head = name.get(..width)?;
    if !head.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    head.parse().ok()
}

/// Next label for an element of `category` inserted at `index` of `container`,
/// or `None` when numbering is not active for that category.
pub fn next_number(
    tree: &DipTree,
    container: NodeId,
    category: Category,
    index: usize,
) -> Result<Option<Label>> {
    let parent = tree.element(container)?;
    let Some(step) = parent
        .numbering
        .as_ref()
        .and_then(|n| n.active_step(category))
    else {
        return Ok(None);
    };

    let children = tree.children(container);
    let end = index.min(children.len());
    let previous = children[..end]
        .iter()
        .rev()
        .filter_map(|c| tree.get(*c))
        .filter(|e| e.category() == category)
        .map(|e| e.name.as_str());

    next_label(step, previous).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Element, ElementKind, Numbering};

    fn label(step: &str, previous: &[&str]) -> String {
        next_label(step, previous.iter().copied()).unwrap().text
    }

    #[test]
    fn test_first_label_is_step() {
        assert_eq!(label("010", &[]), "010");
    }

    #[test]
    fn test_increments_anchor() {
        assert_eq!(label("010", &["010"]), "020");
        assert_eq!(label("010", &["020.txt", "010.txt"]), "030");
        assert_eq!(label("100", &["900-intro"]), "1000");
    }

    #[test]
    fn test_foreign_label_is_skipped() {
        // 015 is not divisible by 10: same result as asking for 015's predecessor
        assert_eq!(label("010", &["015", "010"]), label("010", &["010"]));
        assert_eq!(label("010", &["015"]), "010");
    }

    #[test]
    fn test_short_and_non_numeric_names_are_skipped() {
        assert_eq!(label("010", &["a", "intro.txt", "040.txt"]), "050");
        assert_eq!(label("010", &["dis.050.txt", "040.txt"]), "050");
    }

    #[test]
    fn test_anchor_reported() {
        let l = next_label("010", ["x", "020.txt"]).unwrap();
        assert_eq!(l.anchor.as_deref(), Some("020.txt"));
        let l = next_label("010", ["x", "y"]).unwrap();
        assert_eq!(l.anchor, None);
        assert_eq!(l.text, "010");
    }

    #[test]
    fn test_invalid_steps() {
        assert!(next_label("", ["010"]).is_err());
        assert!(next_label("0", ["010"]).is_err());
        assert!(next_label("1x", ["010"]).is_err());
    }

    #[test]
    fn test_label_past_u64_is_rejected() {
        let step = "10000000000000000000";
        let err = next_label(step, [step]).unwrap_err();
        assert!(matches!(err, DipError::InvalidStep(ref s) if s == step));
    }

    #[test]
    fn test_next_number_uses_same_category_only() {
        let mut tree = DipTree::new("proj", "/p");
        let root = tree.root();
        let mut numbering = Numbering::new("010", "100").unwrap();
        numbering.file_active = true;
        numbering.folder_active = true;
        tree.element_mut(root).unwrap().numbering = Some(numbering);

        tree.insert(root, 0, Element::new(ElementKind::Unit, "010.txt", "/p/010.txt"))
            .unwrap();
        tree.insert(root, 1, Element::new(ElementKind::Folder, "300", "/p/300"))
            .unwrap();

        let files = next_number(&tree, root, Category::File, 1).unwrap().unwrap();
        assert_eq!(files.text, "020");
        let folders = next_number(&tree, root, Category::Container, 2)
            .unwrap()
            .unwrap();
        assert_eq!(folders.text, "400");
    }

    #[test]
    fn test_next_number_inactive() {
        let tree = DipTree::new("proj", "/p");
        assert_eq!(
            next_number(&tree, tree.root(), Category::File, 0).unwrap(),
            None
        );
    }
}
