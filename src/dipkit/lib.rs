//! # Dipkit Architecture
//!
//! Dipkit is a **structural mutation engine** for document projects: trees of
//! folders and text units that live one-to-one in a directory hierarchy. It
//! creates, renames, moves, copies, deletes, reorders and extracts elements
//! while keeping the in-memory tree, the directories on disk and the links
//! between documents consistent.
//!
//! It is a library that happens to have a CLI client.
//!
//! ## Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  CLI Layer (main.rs, args.rs)                               │
//! │  - Parses arguments, prints results, sets up logging        │
//! │  - The ONLY place that knows about stdout/stderr/exit codes │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  API Layer (api.rs)                                         │
//! │  - Thin facade over commands                                │
//! │  - Resolves string IDs (project/req/010.txt) to handles     │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Command Layer (commands/*.rs)                              │
//! │  - One module per structural operation                      │
//! │  - validate → store → tree → descriptor → link rewrite      │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Model Layer (tree.rs, model.rs, numbering.rs, ordering.rs) │
//! │  Storage Layer (store/, descriptor.rs, loader.rs)           │
//! │  - ExternalStore trait: FsStore (production), MemStore      │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## The Session
//!
//! Commands never reach for global state. Everything they touch (the store,
//! the link rewriter, the registry of open projects, the configuration and
//! the snapshot service) travels in an explicit [`session::Session`].
//!
//! ## Testing Strategy
//!
//! 1. **Commands**: unit tests next to each command, on [`store::memory::MemStore`]
//!    with a recording link rewriter. Most tests live here.
//! 2. **Integration** (`tests/`): whole scenarios on a real temporary directory.
//! 3. **CLI**: the binary driven with `assert_cmd`.
//!
//! ## Module Overview
//!
//! - [`api`]: The API facade
//! - [`commands`]: Structural operations
//! - [`tree`]: The arena tree and ID computation
//! - [`model`]: Element kinds, elements, numbering settings, positions
//! - [`naming`]: Name validity and reserved/hidden/disabled markers
//! - [`numbering`]: Automatic labels for new elements
//! - [`ordering`]: Up/down moves of single elements and blocks
//! - [`links`]: The link-rewrite contract
//! - [`snapshot`]: Copies taken before a delete
//! - [`store`]: Storage abstraction and implementations
//! - [`descriptor`]: Per-folder `.dnfo` files
//! - [`loader`]: Reading a project from the store
//! - [`registry`]: Open projects
//! - [`session`]: The context commands run in
//! - [`config`]: Configuration management
//! - [`error`]: Error types

pub mod api;
pub mod commands;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod links;
pub mod loader;
pub mod model;
pub mod naming;
pub mod numbering;
pub mod ordering;
pub mod registry;
pub mod session;
pub mod snapshot;
pub mod store;
pub mod tree;

#[cfg(any(test, feature = "test_utils"))]
pub mod test_utils;
