use crate::error::Result;
use crate::naming;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Maximum folder nesting, counted in path segments from the project root.
pub const MAX_DEPTH: usize = 6;

/// Stable handle of an element inside a [`crate::tree::DipTree`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementKind {
    Project,
    Folder,
    IncludeFolder,
    Unit,
    ReservedFolder,
    ReservedUnit,
    Report,
    Table,
}

/// Broad grouping used by ordering rules: files sort before containers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    File,
    Container,
}

impl ElementKind {
    pub fn category(self) -> Category {
        match self {
            ElementKind::Project
            | ElementKind::Folder
            | ElementKind::IncludeFolder
            | ElementKind::ReservedFolder => Category::Container,
            ElementKind::Unit
            | ElementKind::ReservedUnit
            | ElementKind::Report
            | ElementKind::Table => Category::File,
        }
    }

    /// Kinds that own a child list.
    pub fn is_container(self) -> bool {
        match self {
            ElementKind::Project | ElementKind::Folder | ElementKind::IncludeFolder => true,
            ElementKind::Unit
            | ElementKind::ReservedFolder
            | ElementKind::ReservedUnit
            | ElementKind::Report
            | ElementKind::Table => false,
        }
    }

    pub fn is_reserved(self) -> bool {
        matches!(self, ElementKind::ReservedFolder | ElementKind::ReservedUnit)
    }

    /// Kind of a live file entry, decided by its extension.
    pub fn for_file(name: &str) -> Self {
        let lower = name.to_ascii_lowercase();
        if lower.ends_with(".report") {
            ElementKind::Report
        } else if lower.ends_with(".xml") {
            ElementKind::Table
        } else {
            ElementKind::Unit
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ElementKind::Project => "project",
            ElementKind::Folder => "folder",
            ElementKind::IncludeFolder => "include",
            ElementKind::Unit => "unit",
            ElementKind::ReservedFolder => "reserved folder",
            ElementKind::ReservedUnit => "reserved unit",
            ElementKind::Report => "report",
            ElementKind::Table => "table",
        }
    }
}

/// Per-container automatic numbering configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Numbering {
    pub file_step: String,
    pub folder_step: String,
    #[serde(default)]
    pub file_active: bool,
    #[serde(default)]
    pub folder_active: bool,
}

impl Numbering {
    /// Both steps must be non-empty numeric strings with a non-zero value.
    pub fn new(file_step: &str, folder_step: &str) -> Result<Self> {
        crate::numbering::parse_step(file_step)?;
        crate::numbering::parse_step(folder_step)?;
        Ok(Self {
            file_step: file_step.to_string(),
            folder_step: folder_step.to_string(),
            file_active: false,
            folder_active: false,
        })
    }

    pub fn is_file_numeration(&self) -> bool {
        self.file_active
    }

    pub fn file_step(&self) -> &str {
        &self.file_step
    }

    pub fn is_folder_numeration(&self) -> bool {
        self.folder_active
    }

    pub fn folder_step(&self) -> &str {
        &self.folder_step
    }

    /// The active step for a category, if numbering is on for it.
    pub fn active_step(&self, category: Category) -> Option<&str> {
        match category {
            Category::File if self.file_active => Some(&self.file_step),
            Category::Container if self.folder_active => Some(&self.folder_step),
            _ => None,
        }
    }
}

/// Description and comment text attached to an element.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotations {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl Annotations {
    pub fn is_empty(&self) -> bool {
        self.description.is_none() && self.comment.is_none()
    }
}

/// Target of an include folder: a folder of another project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncludeLink {
    pub project: String,
    /// Relative ID of the linked folder inside `project`.
    pub folder: String,
    /// Store path of the linked folder.
    pub target: PathBuf,
    #[serde(skip)]
    pub broken: bool,
}

#[derive(Debug, Clone)]
pub struct Element {
    pub name: String,
    pub dip_name: String,
    pub kind: ElementKind,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub resource: PathBuf,
    pub read_only: bool,
    pub disabled: bool,
    pub included: bool,
    pub numbering: Option<Numbering>,
    pub appendix: bool,
    pub link: Option<IncludeLink>,
    pub annotations: Annotations,
}

impl Element {
    pub fn new(kind: ElementKind, name: impl Into<String>, resource: impl Into<PathBuf>) -> Self {
        let name = name.into();
        Self {
            dip_name: name.clone(),
            disabled: naming::is_disabled(&name),
            name,
            kind,
            parent: None,
            children: Vec::new(),
            resource: resource.into(),
            read_only: false,
            included: false,
            numbering: None,
            appendix: false,
            link: None,
            annotations: Annotations::default(),
        }
    }

    pub fn category(&self) -> Category {
        self.kind.category()
    }

    pub fn is_container(&self) -> bool {
        self.kind.is_container()
    }

    /// Updates on-disk and logical names together.
    pub fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
        self.dip_name = name.to_string();
        self.disabled = naming::is_disabled(name);
    }
}

/// Where a new element goes in its container's child list.
///
/// `Start`/`End`/`Before`/`After` respect the file/folder boundary: files are
/// placed among files, containers among containers. `Index` is taken as-is
/// (clamped to the list length).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    Start,
    End,
    Before(NodeId),
    After(NodeId),
    Index(usize),
}
