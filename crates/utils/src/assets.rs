//! Resolution of the on-disk data directory.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use thiserror::Error;

use crate::APP_NAME;

/// Environment variable that overrides the platform data directory.
pub const DATA_DIR_ENV: &str = "FOCUS_TODO_DATA_DIR";

#[derive(Debug, Error)]
pub enum AssetDirError {
    #[error("no home directory could be determined for this platform")]
    NoHomeDir,
}

/// Returns the directory holding persisted slots.
///
/// An explicit override wins, then `FOCUS_TODO_DATA_DIR`, then the platform
/// data directory (e.g. `~/.local/share/focus-todo`).
pub fn data_dir(explicit: Option<&Path>) -> Result<PathBuf, AssetDirError> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    if let Some(path) = std::env::var_os(DATA_DIR_ENV).filter(|value| !value.is_empty()) {
        return Ok(PathBuf::from(path));
    }
    ProjectDirs::from("", "", APP_NAME)
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or(AssetDirError::NoHomeDir)
}
