use crate::naming::NameError;
use std::path::PathBuf;
use thiserror::Error;

/// External store operations, used to tag [`DipError::Storage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    Read,
    List,
    CreateFile,
    CreateFolder,
    Write,
    Copy,
    Move,
    Delete,
}

impl std::fmt::Display for StoreOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            StoreOp::Read => "read",
            StoreOp::List => "list",
            StoreOp::CreateFile => "create file",
            StoreOp::CreateFolder => "create folder",
            StoreOp::Write => "write",
            StoreOp::Copy => "copy",
            StoreOp::Move => "move",
            StoreOp::Delete => "delete",
        };
        f.write_str(s)
    }
}

/// Why a name clashes with something already in the target container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionKind {
    /// A live sibling with the same name (case-insensitive).
    Exists,
    /// A disabled twin `dis.<name>` exists.
    Disabled,
    /// A reserved marker or reserved sibling with that name exists.
    Reserved,
    /// A sibling of the other category (file vs. folder) has the name.
    FolderFile,
}

impl std::fmt::Display for CollisionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            CollisionKind::Exists => "already exists",
            CollisionKind::Disabled => "collides with a disabled element",
            CollisionKind::Reserved => "is reserved",
            CollisionKind::FolderFile => "collides with a file/folder of the same name",
        };
        f.write_str(s)
    }
}

#[derive(Error, Debug)]
pub enum DipError {
    #[error("Invalid name '{name}': {source}")]
    Name { name: String, source: NameError },

    #[error("'{name}' {kind} in '{parent}'")]
    Collision {
        name: String,
        parent: String,
        kind: CollisionKind,
    },

    #[error("Cannot nest '{name}': depth {depth} exceeds the maximum of {max}", max = crate::model::MAX_DEPTH)]
    Depth { name: String, depth: usize },

    #[error("'{name}' does not have an allowed attachment extension (.report, .xml)")]
    Extension { name: String },

    #[error("Store error ({op} {}): {message}", .path.display())]
    Storage {
        op: StoreOp,
        path: PathBuf,
        message: String,
    },

    #[error("Link rewrite {old_id} -> {new_id} failed: {message}")]
    LinkRewrite {
        old_id: String,
        new_id: String,
        message: String,
    },

    #[error("Snapshot of '{name}' failed: {message}")]
    Snapshot { name: String, message: String },

    #[error("Element not found: {0}")]
    NotFound(String),

    #[error("Element is read-only: {0}")]
    ReadOnly(String),

    #[error("Cannot {op} '{name}'")]
    Unsupported { op: &'static str, name: String },

    #[error("Invalid numbering step: '{0}'")]
    InvalidStep(String),

    #[error("Project error: {0}")]
    Project(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Api Error: {0}")]
    Api(String),
}

impl DipError {
    pub(crate) fn storage(op: StoreOp, path: impl Into<PathBuf>, message: impl ToString) -> Self {
        DipError::Storage {
            op,
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Validation errors are raised before any mutation and are safe to retry.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            DipError::Name { .. }
                | DipError::Collision { .. }
                | DipError::Depth { .. }
                | DipError::Extension { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, DipError>;
