//! # Link Integrity
//!
//! Documents embed relative IDs of other elements. Rewriting those references
//! is the job of an external [`LinkRewriter`]; this module only fixes *when*
//! and *with what* it is called.
//!
//! Any operation that changes where an element sits in the tree captures the
//! element's old relative ID before the change and, once the store operation
//! and the tree update have both succeeded, calls
//! `update_links(old, new, scope, cascade)`.
//!
//! - `scope` is the project, or the include folder the element lives under.
//! - `cascade` is true for containers, whose descendants' IDs change too.
//!
//! The rewrite is a secondary effect. Its failure is recorded in a
//! [`LinkRewrite`] and never rolls back the structural change.

use crate::error::{DipError, Result};
use crate::model::NodeId;
use crate::tree::DipTree;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkScope {
    Project(String),
    Include { project: String, include_id: String },
}

impl std::fmt::Display for LinkScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LinkScope::Project(name) => write!(f, "project {}", name),
            LinkScope::Include {
                project,
                include_id,
            } => write!(f, "include {}/{}", project, include_id),
        }
    }
}

/// Consumer that rewrites embedded references after an ID change.
pub trait LinkRewriter {
    fn update_links(
        &mut self,
        old_id: &str,
        new_id: &str,
        scope: &LinkScope,
        cascade: bool,
    ) -> Result<()>;
}

/// Rewriter for sessions that carry no cross-references.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopRewriter;

impl LinkRewriter for NoopRewriter {
    fn update_links(&mut self, _: &str, _: &str, _: &LinkScope, _: bool) -> Result<()> {
        Ok(())
    }
}

/// Record of one link-rewrite request and its outcome.
#[derive(Debug)]
pub struct LinkRewrite {
    pub old_id: String,
    pub new_id: String,
    pub scope: LinkScope,
    pub cascade: bool,
    pub outcome: Result<()>,
}

impl LinkRewrite {
    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Scope to rewrite in for an element: its include folder, else its project.
pub fn scope_for(tree: &DipTree, id: NodeId) -> LinkScope {
    match tree.include_ancestor(id) {
        Some(include) => LinkScope::Include {
            project: tree.project_name().to_string(),
            include_id: tree.relative_project_id(include),
        },
        None => LinkScope::Project(tree.project_name().to_string()),
    }
}

/// Issues the rewrite for `id`, whose ID used to be `old_id`.
///
/// Returns `None` when the ID did not change.
pub fn notify<L: LinkRewriter>(
    links: &mut L,
    tree: &DipTree,
    id: NodeId,
    old_id: String,
) -> Option<LinkRewrite> {
    let new_id = tree.relative_project_id(id);
    if new_id == old_id {
        return None;
    }
    let cascade = tree.get(id).map(|e| e.is_container()).unwrap_or(false);
    let scope = scope_for(tree, id);

    let outcome = links
        .update_links(&old_id, &new_id, &scope, cascade)
        .map_err(|e| DipError::LinkRewrite {
            old_id: old_id.clone(),
            new_id: new_id.clone(),
            message: e.to_string(),
        });
    match &outcome {
        Ok(()) => debug!(%old_id, %new_id, %scope, cascade, "links rewritten"),
        Err(e) => warn!(error = %e, "link rewrite failed; structure change kept"),
    }

    Some(LinkRewrite {
        old_id,
        new_id,
        scope,
        cascade,
        outcome,
    })
}

#[cfg(any(test, feature = "test_utils"))]
pub mod fixtures {
    use super::*;

    /// One recorded `update_links` call.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct LinkCall {
        pub old_id: String,
        pub new_id: String,
        pub scope: LinkScope,
        pub cascade: bool,
    }

    /// Rewriter that records every call and can be told to fail.
    #[derive(Debug, Default)]
    pub struct RecordingRewriter {
        pub calls: Vec<LinkCall>,
        pub fail: bool,
    }

    impl RecordingRewriter {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }
    }

    impl LinkRewriter for RecordingRewriter {
        fn update_links(
            &mut self,
            old_id: &str,
            new_id: &str,
            scope: &LinkScope,
            cascade: bool,
        ) -> Result<()> {
            self.calls.push(LinkCall {
                old_id: old_id.to_string(),
                new_id: new_id.to_string(),
                scope: scope.clone(),
                cascade,
            });
            if self.fail {
                return Err(DipError::Api("link index unavailable".to_string()));
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::RecordingRewriter;
    use super::*;
    use crate::model::{Element, ElementKind};

    #[test]
    fn test_notify_skips_unchanged_ids() {
        let mut tree = DipTree::new("proj", "/p");
        let root = tree.root();
        let u = tree
            .insert(root, 0, Element::new(ElementKind::Unit, "a.txt", "/p/a.txt"))
            .unwrap();
        let mut links = RecordingRewriter::new();
        assert!(notify(&mut links, &tree, u, "a.txt".into()).is_none());
        assert!(links.calls.is_empty());
    }

    #[test]
    fn test_notify_reports_failure_without_panicking() {
        let mut tree = DipTree::new("proj", "/p");
        let root = tree.root();
        let f = tree
            .insert(root, 0, Element::new(ElementKind::Folder, "b", "/p/b"))
            .unwrap();
        let mut links = RecordingRewriter::failing();
        let rewrite = notify(&mut links, &tree, f, "a".into()).unwrap();
        assert!(!rewrite.is_ok());
        assert!(rewrite.cascade);
        assert_eq!(rewrite.scope, LinkScope::Project("proj".into()));
        assert!(matches!(rewrite.outcome, Err(DipError::LinkRewrite { .. })));
    }

    #[test]
    fn test_scope_inside_include() {
        let mut tree = DipTree::new("proj", "/p");
        let root = tree.root();
        let inc = tree
            .insert(root, 0, Element::new(ElementKind::IncludeFolder, "shared", "/lib/x"))
            .unwrap();
        let u = tree
            .insert(inc, 0, Element::new(ElementKind::Unit, "a.txt", "/lib/x/a.txt"))
            .unwrap();
        assert_eq!(
            scope_for(&tree, u),
            LinkScope::Include {
                project: "proj".into(),
                include_id: "shared".into()
            }
        );
        assert_eq!(scope_for(&tree, inc), LinkScope::Project("proj".into()));
    }
}
