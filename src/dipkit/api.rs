//! # API Facade
//!
//! A thin facade over the command layer for clients that speak in string
//! IDs rather than [`NodeId`] handles.
//!
//! IDs are full IDs: the project name, then the relative project ID, joined
//! with `/` (`spec/req/010.txt`). A bare project name addresses the project
//! root. The facade resolves them against the [`Session`]'s registry and
//! dispatches; it holds no logic of its own.
//!
//! `DipApi<S, L>` is generic over the store and the link rewriter:
//! - Production: `DipApi<FsStore, NoopRewriter>`
//! - Testing: `DipApi<MemStore, RecordingRewriter>`

use crate::commands;
use crate::error::{DipError, Result};
use crate::links::LinkRewriter;
use crate::model::{NodeId, Position};
use crate::session::Session;
use crate::snapshot::TmpElement;
use crate::store::ExternalStore;
use crate::tree::DipTree;
use std::path::Path;

/// Where to put an element, with neighbours named by full ID.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Placement {
    Start,
    #[default]
    End,
    Before(String),
    After(String),
}

pub struct DipApi<S: ExternalStore, L: LinkRewriter> {
    session: Session<S, L>,
}

impl<S: ExternalStore, L: LinkRewriter> DipApi<S, L> {
    pub fn new(session: Session<S, L>) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &Session<S, L> {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session<S, L> {
        &mut self.session
    }

    pub fn open(&mut self, dir: &Path) -> Result<String> {
        self.session.open(dir)
    }

    pub fn init(&mut self, parent: &Path, name: &str) -> Result<String> {
        self.session.init(parent, name)
    }

    pub fn tree(&self, project: &str) -> Result<&DipTree> {
        self.session.registry.get(project)
    }

    /// Resolves a full ID to its project and handle.
    pub fn resolve(&self, full_id: &str) -> Result<(String, NodeId)> {
        let (project, relative) = split_id(full_id)?;
        let tree = self.session.registry.get(project)?;
        let id = commands::helpers::resolve(tree, relative)?;
        Ok((project.to_string(), id))
    }

    /// Resolves several IDs that must all live in one project.
    fn resolve_same_project<I: AsRef<str>>(&self, full_ids: &[I]) -> Result<(String, Vec<NodeId>)> {
        let mut project: Option<String> = None;
        let mut ids = Vec::with_capacity(full_ids.len());
        for full_id in full_ids {
            let (p, id) = self.resolve(full_id.as_ref())?;
            match &project {
                Some(existing) if *existing != p => {
                    return Err(DipError::Api(format!(
                        "{} is not in project {}",
                        full_id.as_ref(),
                        existing
                    )));
                }
                Some(_) => {}
                None => project = Some(p),
            }
            ids.push(id);
        }
        let project = project.ok_or_else(|| DipError::Api("nothing selected".to_string()))?;
        Ok((project, ids))
    }

    fn position(&self, project: &str, placement: &Placement) -> Result<Position> {
        let neighbour = |full_id: &str| -> Result<NodeId> {
            let (p, id) = self.resolve(full_id)?;
            if p != project {
                return Err(DipError::Api(format!("{} is not in project {}", full_id, project)));
            }
            Ok(id)
        };
        Ok(match placement {
            Placement::Start => Position::Start,
            Placement::End => Position::End,
            Placement::Before(n) => Position::Before(neighbour(n)?),
            Placement::After(n) => Position::After(neighbour(n)?),
        })
    }

    pub fn create_folder(
        &mut self,
        parent: &str,
        name: Option<&str>,
        placement: Placement,
    ) -> Result<commands::CmdResult> {
        let (project, parent) = self.resolve(parent)?;
        let position = self.position(&project, &placement)?;
        commands::create::folder(&mut self.session, &project, parent, name, position)
    }

    pub fn create_unit(
        &mut self,
        parent: &str,
        name: Option<&str>,
        content: &str,
        placement: Placement,
    ) -> Result<commands::CmdResult> {
        let (project, parent) = self.resolve(parent)?;
        let position = self.position(&project, &placement)?;
        commands::create::unit(&mut self.session, &project, parent, name, content, position)
    }

    pub fn create_attachment(
        &mut self,
        parent: &str,
        name: &str,
        content: &str,
        placement: Placement,
    ) -> Result<commands::CmdResult> {
        let (project, parent) = self.resolve(parent)?;
        let position = self.position(&project, &placement)?;
        commands::create::attachment(&mut self.session, &project, parent, name, content, position)
    }

    /// Links `folder` (a full ID in another open project) into `parent`.
    pub fn include(&mut self, parent: &str, name: &str, folder: &str) -> Result<commands::CmdResult> {
        let (project, parent) = self.resolve(parent)?;
        let (linked, relative) = split_id(folder)?;
        commands::create::include(&mut self.session, &project, parent, name, linked, relative)
    }

    pub fn set_numbering(&mut self, container: &str, files: bool, folders: bool) -> Result<commands::CmdResult> {
        let (project, container) = self.resolve(container)?;
        commands::number::set(&mut self.session, &project, container, files, folders)
    }

    pub fn copy(
        &mut self,
        id: &str,
        target: &str,
        placement: Placement,
        name: Option<&str>,
    ) -> Result<commands::CmdResult> {
        let (project, ids) = self.resolve_same_project(&[id, target])?;
        let position = self.position(&project, &placement)?;
        commands::copy::run(&mut self.session, &project, ids[0], ids[1], position, name)
    }

    pub fn rename(&mut self, id: &str, new_name: &str) -> Result<commands::CmdResult> {
        let (project, id) = self.resolve(id)?;
        commands::rename::run(&mut self.session, &project, id, new_name)
    }

    pub fn set_disabled(&mut self, id: &str, disabled: bool) -> Result<commands::CmdResult> {
        let (project, id) = self.resolve(id)?;
        commands::rename::set_disabled(&mut self.session, &project, id, disabled)
    }

    pub fn move_to(&mut self, id: &str, target: &str, placement: Placement) -> Result<commands::CmdResult> {
        let (project, ids) = self.resolve_same_project(&[id, target])?;
        let position = self.position(&project, &placement)?;
        commands::move_to::run(&mut self.session, &project, ids[0], ids[1], position)
    }

    /// Deletes every element named, across projects. All IDs are resolved
    /// before anything is deleted.
    pub fn delete<I: AsRef<str>>(&mut self, ids: &[I], options: DeleteOptions) -> Result<commands::CmdResult> {
        let targets = ids
            .iter()
            .map(|id| self.resolve(id.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        commands::delete::delete_batch(&mut self.session, &targets, options)
    }

    pub fn unreserve(&mut self, id: &str) -> Result<commands::CmdResult> {
        let (project, id) = self.resolve(id)?;
        commands::reserve::unreserve(&mut self.session, &project, id)
    }

    pub fn extract(&mut self, id: &str) -> Result<commands::CmdResult> {
        let (project, id) = self.resolve(id)?;
        commands::extract::run(&mut self.session, &project, id)
    }

    pub fn paste(
        &mut self,
        container: &str,
        source: &Path,
        placement: Placement,
        attachment: bool,
    ) -> Result<commands::CmdResult> {
        let (project, container) = self.resolve(container)?;
        let position = self.position(&project, &placement)?;
        commands::paste::run(&mut self.session, &project, container, source, position, attachment)
    }

    pub fn up<I: AsRef<str>>(&mut self, ids: &[I]) -> Result<commands::CmdResult> {
        let (project, ids) = self.resolve_same_project(ids)?;
        commands::reorder::up(&mut self.session, &project, &ids)
    }

    pub fn down<I: AsRef<str>>(&mut self, ids: &[I]) -> Result<commands::CmdResult> {
        let (project, ids) = self.resolve_same_project(ids)?;
        commands::reorder::down(&mut self.session, &project, &ids)
    }

    pub fn restore(
        &mut self,
        tmp: TmpElement,
        container: &str,
        placement: Placement,
    ) -> Result<commands::CmdResult> {
        let (project, container) = self.resolve(container)?;
        let position = self.position(&project, &placement)?;
        commands::restore::run(&mut self.session, &project, tmp, container, position)
    }

    pub fn config(&mut self, project: &str, action: ConfigAction) -> Result<commands::CmdResult> {
        commands::config::run(&mut self.session, project, action)
    }
}

/// Splits a full ID into project name and relative project ID.
pub fn split_id(full_id: &str) -> Result<(&str, &str)> {
    let trimmed = full_id.trim_matches('/');
    if trimmed.is_empty() {
        return Err(DipError::Api("an element ID is required".to_string()));
    }
    Ok(match trimmed.split_once('/') {
        Some((project, relative)) => (project, relative),
        None => (trimmed, ""),
    })
}

pub use crate::commands::config::ConfigAction;
pub use crate::commands::delete::DeleteOptions;
pub use crate::commands::{CmdMessage, CmdResult, MessageLevel};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ElementKind;
    use crate::test_utils::{mem_session, MemSession};

    fn api() -> DipApi<crate::store::memory::MemStore, crate::links::fixtures::RecordingRewriter> {
        let session: MemSession = mem_session();
        DipApi::new(session)
    }

    #[test]
    fn test_split_id() {
        assert_eq!(split_id("proj/req/010.txt").unwrap(), ("proj", "req/010.txt"));
        assert_eq!(split_id("proj").unwrap(), ("proj", ""));
        assert_eq!(split_id("/proj/").unwrap(), ("proj", ""));
        assert!(split_id("").is_err());
    }

    #[test]
    fn test_scenario_create_rename() {
        let mut api = api();
        api.create_folder("proj", Some("req"), Placement::Start).unwrap();
        api.set_numbering("proj/req", true, false).unwrap();
        let created = api
            .create_unit("proj/req", None, "", Placement::End)
            .unwrap();
        let unit = created.affected[0];
        assert_eq!(api.tree("proj").unwrap().relative_project_id(unit), "req/010.txt");

        api.rename("proj/req/010.txt", "015.txt").unwrap();

        assert_eq!(api.tree("proj").unwrap().relative_project_id(unit), "req/015.txt");
        let call = &api.session().links.calls[0];
        assert_eq!(call.old_id, "req/010.txt");
        assert_eq!(call.new_id, "req/015.txt");
        assert!(!call.cascade);
    }

    #[test]
    fn test_placement_before_neighbour() {
        let mut api = api();
        api.create_unit("proj", Some("b.txt"), "", Placement::End).unwrap();
        api.create_unit("proj", Some("a.txt"), "", Placement::Before("proj/b.txt".into()))
            .unwrap();
        let tree = api.tree("proj").unwrap();
        assert_eq!(tree.find_element("a.txt").and_then(|a| tree.index_of(a)), Some(0));
    }

    #[test]
    fn test_delete_by_ids_and_unknown_ids() {
        let mut api = api();
        api.create_unit("proj", Some("a.txt"), "", Placement::End).unwrap();

        assert!(matches!(
            api.delete(&["proj/missing.txt"], DeleteOptions::default()),
            Err(DipError::NotFound(_))
        ));
        let result = api.delete(&["proj/a.txt"], DeleteOptions::reserve()).unwrap();
        let tree = api.tree("proj").unwrap();
        assert_eq!(tree.get(result.affected[0]).unwrap().kind, ElementKind::ReservedUnit);
    }

    #[test]
    fn test_reorder_requires_one_project() {
        let mut api = api();
        api.init(Path::new("/work"), "other").unwrap();
        api.create_unit("proj", Some("a.txt"), "", Placement::End).unwrap();
        api.create_unit("other", Some("b.txt"), "", Placement::End).unwrap();

        assert!(matches!(
            api.down(&["proj/a.txt", "other/b.txt"]),
            Err(DipError::Api(_))
        ));
    }
}
