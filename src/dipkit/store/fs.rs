use super::{same_entry, ExternalStore};
use crate::error::{DipError, Result, StoreOp};
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Filesystem-backed store. Paths are real filesystem paths.
#[derive(Debug, Default, Clone)]
pub struct FsStore;

impl FsStore {
    pub fn new() -> Self {
        Self
    }

    fn ensure_absent(op: StoreOp, path: &Path) -> Result<()> {
        if path.symlink_metadata().is_ok() {
            return Err(DipError::storage(op, path, "entry already exists"));
        }
        Ok(())
    }

    fn copy_recursive(from: &Path, to: &Path) -> Result<()> {
        let meta = fs::metadata(from).map_err(|e| DipError::storage(StoreOp::Copy, from, e))?;
        if meta.is_dir() {
            fs::create_dir(to).map_err(|e| DipError::storage(StoreOp::Copy, to, e))?;
            let entries = fs::read_dir(from).map_err(|e| DipError::storage(StoreOp::Copy, from, e))?;
            for entry in entries {
                let entry = entry.map_err(|e| DipError::storage(StoreOp::Copy, from, e))?;
                Self::copy_recursive(&entry.path(), &to.join(entry.file_name()))?;
            }
        } else {
            fs::copy(from, to).map_err(|e| DipError::storage(StoreOp::Copy, from, e))?;
        }
        Ok(())
    }
}

impl ExternalStore for FsStore {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn list_children(&self, path: &Path) -> Result<Vec<String>> {
        let entries = fs::read_dir(path).map_err(|e| DipError::storage(StoreOp::List, path, e))?;
        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| DipError::storage(StoreOp::List, path, e))?;
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    fn read_text(&self, path: &Path) -> Result<String> {
        fs::read_to_string(path).map_err(|e| DipError::storage(StoreOp::Read, path, e))
    }

    fn create_file(&mut self, parent: &Path, name: &str, content: &str) -> Result<PathBuf> {
        let path = parent.join(name);
        Self::ensure_absent(StoreOp::CreateFile, &path)?;
        if !parent.is_dir() {
            return Err(DipError::storage(
                StoreOp::CreateFile,
                parent,
                "parent directory does not exist",
            ));
        }
        self.write_text(&path, content)
            .map_err(|e| DipError::storage(StoreOp::CreateFile, &path, e))?;
        Ok(path)
    }

    fn create_folder(&mut self, parent: &Path, name: &str) -> Result<PathBuf> {
        let path = parent.join(name);
        Self::ensure_absent(StoreOp::CreateFolder, &path)?;
        fs::create_dir(&path).map_err(|e| DipError::storage(StoreOp::CreateFolder, &path, e))?;
        Ok(path)
    }

    fn write_text(&mut self, path: &Path, content: &str) -> Result<()> {
        let dir = path
            .parent()
            .ok_or_else(|| DipError::storage(StoreOp::Write, path, "path has no parent"))?;

        // Atomic write
        let tmp_path = dir.join(format!(".dip-{}.tmp", Uuid::new_v4()));
        fs::write(&tmp_path, content).map_err(|e| DipError::storage(StoreOp::Write, path, e))?;
        fs::rename(&tmp_path, path).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            DipError::storage(StoreOp::Write, path, e)
        })
    }

    fn copy(&mut self, from: &Path, to_parent: &Path, name: &str) -> Result<PathBuf> {
        let to = to_parent.join(name);
        Self::ensure_absent(StoreOp::Copy, &to)?;
        if to.starts_with(from) {
            return Err(DipError::storage(
                StoreOp::Copy,
                from,
                "cannot copy a directory into itself",
            ));
        }
        Self::copy_recursive(from, &to)?;
        Ok(to)
    }

    fn move_to(&mut self, from: &Path, to_parent: &Path, name: &str) -> Result<PathBuf> {
        let to = to_parent.join(name);
        if !same_entry(from, &to) {
            Self::ensure_absent(StoreOp::Move, &to)?;
        }
        if !from.exists() {
            return Err(DipError::storage(StoreOp::Move, from, "entry does not exist"));
        }
        fs::rename(from, &to).map_err(|e| DipError::storage(StoreOp::Move, from, e))?;
        Ok(to)
    }

    fn delete(&mut self, path: &Path) -> Result<()> {
        let result = if path.is_dir() {
            fs::remove_dir_all(path)
        } else {
            fs::remove_file(path)
        };
        result.map_err(|e| DipError::storage(StoreOp::Delete, path, e))
    }
}
