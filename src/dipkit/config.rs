use crate::error::{DipError, Result};
use crate::numbering::parse_step;
use crate::store::ExternalStore;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_FILENAME: &str = ".dipconfig.json";
const DEFAULT_UNIT_EXT: &str = ".txt";
const DEFAULT_STEP: &str = "010";

/// When the reserve marker of a unit is written relative to the unit's
/// physical deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReservePolicy {
    Before,
    #[default]
    After,
}

impl std::fmt::Display for ReservePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReservePolicy::Before => f.write_str("before"),
            ReservePolicy::After => f.write_str("after"),
        }
    }
}

impl std::str::FromStr for ReservePolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "before" => Ok(ReservePolicy::Before),
            "after" => Ok(ReservePolicy::After),
            other => Err(format!(
                "Invalid reserve policy '{}' (expected before or after)",
                other
            )),
        }
    }
}

/// Configuration for a project, stored in `<project>/.dipconfig.json`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct DipConfig {
    /// Extension given to units named by the numbering engine
    #[serde(default = "default_unit_ext")]
    pub unit_ext: String,

    /// Step used when numbering is switched on for files
    #[serde(default = "default_step")]
    pub file_step: String,

    /// Step used when numbering is switched on for folders
    #[serde(default = "default_step")]
    pub folder_step: String,

    #[serde(default)]
    pub reserve_policy: ReservePolicy,

    /// Leave a reserved twin behind when a unit is renamed
    #[serde(default)]
    pub reserve_on_rename: bool,

    /// Scratch directory for delete snapshots; platform data dir when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot_dir: Option<PathBuf>,
}

fn default_unit_ext() -> String {
    DEFAULT_UNIT_EXT.to_string()
}

fn default_step() -> String {
    DEFAULT_STEP.to_string()
}

impl Default for DipConfig {
    fn default() -> Self {
        Self {
            unit_ext: default_unit_ext(),
            file_step: default_step(),
            folder_step: default_step(),
            reserve_policy: ReservePolicy::default(),
            reserve_on_rename: false,
            snapshot_dir: None,
        }
    }
}

impl DipConfig {
    pub const KEYS: [&'static str; 6] = [
        "unit-ext",
        "file-step",
        "folder-step",
        "reserve-policy",
        "reserve-on-rename",
        "snapshot-dir",
    ];

    /// Load config from the project directory, or return defaults if not found
    pub fn load<S: ExternalStore>(store: &S, project_dir: &Path) -> Result<Self> {
        let config_path = project_dir.join(CONFIG_FILENAME);
        if !store.exists(&config_path) {
            return Ok(Self::default());
        }
        let content = store.read_text(&config_path)?;
        let config: DipConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    pub fn save<S: ExternalStore>(&self, store: &mut S, project_dir: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        store.write_text(&project_dir.join(CONFIG_FILENAME), &content)
    }

    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "unit-ext" => Some(self.unit_ext.clone()),
            "file-step" => Some(self.file_step.clone()),
            "folder-step" => Some(self.folder_step.clone()),
            "reserve-policy" => Some(self.reserve_policy.to_string()),
            "reserve-on-rename" => Some(self.reserve_on_rename.to_string()),
            "snapshot-dir" => Some(
                self.snapshot_dir
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default(),
            ),
            _ => None,
        }
    }

    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "unit-ext" => self.set_unit_ext(value),
            "file-step" => {
                parse_step(value)?;
                self.file_step = value.to_string();
            }
            "folder-step" => {
                parse_step(value)?;
                self.folder_step = value.to_string();
            }
            "reserve-policy" => {
                self.reserve_policy = value.parse().map_err(DipError::Api)?;
            }
            "reserve-on-rename" => {
                self.reserve_on_rename = match value {
                    "true" | "yes" | "on" => true,
                    "false" | "no" | "off" => false,
                    _ => return Err(DipError::Api(format!("Invalid boolean: {}", value))),
                };
            }
            "snapshot-dir" => {
                self.snapshot_dir = if value.is_empty() {
                    None
                } else {
                    Some(PathBuf::from(value))
                };
            }
            _ => return Err(DipError::Api(format!("Unknown config key: {}", key))),
        }
        Ok(())
    }

    /// Set the unit extension (normalizes to start with a dot)
    pub fn set_unit_ext(&mut self, ext: &str) {
        if ext.starts_with('.') {
            self.unit_ext = ext.to_string();
        } else {
            self.unit_ext = format!(".{}", ext);
        }
    }
}
