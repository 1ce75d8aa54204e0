use crate::error::{DipError, Result};
use crate::tree::DipTree;
use std::collections::BTreeMap;
use tracing::info;

/// The set of open projects, keyed by project name.
///
/// Owned by the [`crate::session::Session`]; there is no process-wide
/// instance.
#[derive(Debug, Default)]
pub struct Registry {
    projects: BTreeMap<String, DipTree>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, tree: DipTree) -> Result<()> {
        let name = tree.project_name().to_string();
        if self.projects.contains_key(&name) {
            return Err(DipError::Project(format!("project '{}' is already open", name)));
        }
        info!(project = %name, "project registered");
        self.projects.insert(name, tree);
        Ok(())
    }

    pub fn unregister(&mut self, name: &str) -> Option<DipTree> {
        let removed = self.projects.remove(name);
        if removed.is_some() {
            info!(project = name, "project unregistered");
        }
        removed
    }

    pub fn get(&self, name: &str) -> Result<&DipTree> {
        self.projects
            .get(name)
            .ok_or_else(|| DipError::NotFound(format!("project '{}'", name)))
    }

    pub fn get_mut(&mut self, name: &str) -> Result<&mut DipTree> {
        self.projects
            .get_mut(name)
            .ok_or_else(|| DipError::NotFound(format!("project '{}'", name)))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.projects.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.projects.keys().map(String::as_str)
    }
}
