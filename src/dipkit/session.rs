//! The context every structural command runs in.
//!
//! A [`Session`] bundles the external store, the link rewriter, the registry
//! of open projects, the configuration and the snapshot service. Commands
//! receive it explicitly; nothing in the crate reaches for global state.

use crate::config::DipConfig;
use crate::error::Result;
use crate::links::LinkRewriter;
use crate::loader;
use crate::registry::Registry;
use crate::snapshot::SnapshotService;
use crate::store::ExternalStore;
use std::path::Path;

pub struct Session<S: ExternalStore, L: LinkRewriter> {
    pub store: S,
    pub links: L,
    pub registry: Registry,
    pub config: DipConfig,
    pub snapshots: SnapshotService,
}

impl<S: ExternalStore, L: LinkRewriter> Session<S, L> {
    pub fn new(store: S, links: L, config: DipConfig, snapshots: SnapshotService) -> Self {
        Self {
            store,
            links,
            registry: Registry::new(),
            config,
            snapshots,
        }
    }

    /// Loads the project at `dir` and registers it. Returns its name.
    pub fn open(&mut self, dir: &Path) -> Result<String> {
        let tree = loader::open_project(&self.store, dir)?;
        let name = tree.project_name().to_string();
        self.registry.register(tree)?;
        Ok(name)
    }

    /// Creates a project under `parent` and registers it.
    pub fn init(&mut self, parent: &Path, name: &str) -> Result<String> {
        let tree = loader::init_project(&mut self.store, parent, name)?;
        let name = tree.project_name().to_string();
        self.registry.register(tree)?;
        Ok(name)
    }
}
