//! Shared fixtures for unit and integration tests.

use crate::config::DipConfig;
use crate::links::fixtures::RecordingRewriter;
use crate::session::Session;
use crate::snapshot::SnapshotService;
use crate::store::memory::MemStore;

pub type MemSession = Session<MemStore, RecordingRewriter>;

/// In-memory session with an empty project `proj` at `/work/proj` and
/// snapshots under `/scratch`.
pub fn mem_session() -> MemSession {
    let mut store = MemStore::new();
    store.mkdir_all("/work");
    let mut session = Session::new(
        store,
        RecordingRewriter::new(),
        DipConfig::default(),
        SnapshotService::new("/scratch"),
    );
    session
        .init(std::path::Path::new("/work"), "proj")
        .expect("fixture project");
    session
}
