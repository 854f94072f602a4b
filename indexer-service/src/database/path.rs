use anyhow::{bail, Result};
use std::{
    fs,
    path::{Component, Path, PathBuf},
};

use super::constants::MEMORY_URL;

/// Where the snapshot store lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    Memory,
    File(PathBuf),
}

impl StoreLocation {
    /// Validate a configured store path.
    ///
    /// Rejects parent traversal, control characters, directories and symlinks.
    pub fn parse(db_path: &str) -> Result<Self> {
        if db_path == ":memory:" || db_path == MEMORY_URL {
            return Ok(StoreLocation::Memory);
        }
        if db_path.is_empty() {
            bail!("Empty snapshot store path");
        }
        if db_path.contains(['\0', '\n', '\r', '\t']) {
            bail!("Invalid control characters in snapshot store path");
        }

        let path = Path::new(db_path);
        if path.components().any(|c| matches!(c, Component::ParentDir)) {
            bail!("Parent directory traversal is not allowed in snapshot store path");
        }
        if path.file_name().is_none() {
            bail!("Snapshot store path must include a file name");
        }
        if let Ok(meta) = fs::symlink_metadata(path) {
            if meta.file_type().is_symlink() {
                bail!("Symlink path is not allowed for snapshot store path");
            }
            if meta.is_dir() {
                bail!("Snapshot store path points to a directory");
            }
        }

        Ok(StoreLocation::File(path.to_path_buf()))
    }

    pub fn display_path(&self) -> String {
        match self {
            StoreLocation::Memory => ":memory:".to_string(),
            StoreLocation::File(p) => p.to_string_lossy().to_string(),
        }
    }
}
