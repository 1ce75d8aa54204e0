//! # Structural Operations
//!
//! One module per operation. Every command takes the [`Session`] explicitly,
//! the name of the project it works on and [`NodeId`] handles into that
//! project's tree, and returns a [`CmdResult`].
//!
//! Within a command the order of effects is fixed:
//!
//! 1. validation (nothing has changed yet if it fails)
//! 2. the external store operation (a failure aborts, tree untouched)
//! 3. the tree update
//! 4. post-processing: descriptor persistence, annotations
//! 5. link rewriting
//!
//! Failures in steps 4 and 5 do not undo steps 2 and 3. Post-processing
//! failures become warnings in [`CmdResult::messages`]; link failures are
//! recorded in [`CmdResult::link_rewrites`].
//!
//! [`Session`]: crate::session::Session

use crate::config::DipConfig;
use crate::links::LinkRewrite;
use crate::model::NodeId;
use crate::snapshot::TmpElement;

pub mod config;
pub mod copy;
pub mod create;
pub mod delete;
pub mod extract;
pub mod helpers;
pub mod move_to;
pub mod number;
pub mod paste;
pub mod rename;
pub mod reorder;
pub mod reserve;
pub mod restore;
pub mod validate;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone)]
pub struct CmdMessage {
    pub level: MessageLevel,
    pub content: String,
}

impl CmdMessage {
    pub fn info(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Info,
            content: content.into(),
        }
    }

    pub fn success(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Success,
            content: content.into(),
        }
    }

    pub fn warning(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Warning,
            content: content.into(),
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Error,
            content: content.into(),
        }
    }
}

#[derive(Debug, Default)]
pub struct CmdResult {
    /// Elements created or changed, in the project the command ran on.
    pub affected: Vec<NodeId>,
    pub snapshots: Vec<TmpElement>,
    pub link_rewrites: Vec<LinkRewrite>,
    pub config: Option<DipConfig>,
    pub messages: Vec<CmdMessage>,
}

impl CmdResult {
    pub fn add_message(&mut self, message: CmdMessage) {
        self.messages.push(message);
    }

    pub fn with_affected(mut self, ids: Vec<NodeId>) -> Self {
        self.affected = ids;
        self
    }

    pub fn with_config(mut self, config: DipConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn add_rewrite(&mut self, rewrite: Option<LinkRewrite>) {
        if let Some(rewrite) = rewrite {
            self.link_rewrites.push(rewrite);
        }
    }

    /// True when every link rewrite issued by the command succeeded.
    pub fn links_ok(&self) -> bool {
        self.link_rewrites.iter().all(LinkRewrite::is_ok)
    }

    pub fn has_warnings(&self) -> bool {
        self.messages
            .iter()
            .any(|m| m.level == MessageLevel::Warning)
    }

    /// Folds another command's outcome into this one.
    pub fn merge(&mut self, other: CmdResult) {
        self.affected.extend(other.affected);
        self.snapshots.extend(other.snapshots);
        self.link_rewrites.extend(other.link_rewrites);
        self.messages.extend(other.messages);
        if other.config.is_some() {
            self.config = other.config;
        }
    }
}
