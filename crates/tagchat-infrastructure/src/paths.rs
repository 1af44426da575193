//! Path management for tagchat files.
//!
//! Paths are resolved through `AppPaths` from the version-migrate crate so
//! the layout follows platform conventions (XDG on Linux, the usual
//! locations elsewhere).
//!
//! ```text
//! ~/.config/tagchat/
//! ├── tagchat.toml             # settings, last active session, session map
//! └── logs/
//!     └── tagchat.log.YYYY-MM-DD
//! ```

use std::path::PathBuf;
use thiserror::Error;
use version_migrate::AppPaths;

/// Errors that can occur during path resolution.
#[derive(Debug, Error)]
pub enum PathError {
    /// Home directory could not be determined.
    #[error("Cannot find home directory")]
    HomeDirNotFound,
}

pub struct TagchatPaths;

impl TagchatPaths {
    fn app_paths() -> AppPaths {
        AppPaths::new("tagchat")
    }

    /// Returns the tagchat configuration directory.
    pub fn config_dir() -> Result<PathBuf, PathError> {
        Self::app_paths()
            .config_dir()
            .map_err(|_| PathError::HomeDirNotFound)
    }

    /// Returns the path to the persisted state file.
    pub fn state_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("tagchat.toml"))
    }

    /// Returns the path to the logs directory.
    pub fn logs_dir() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("logs"))
    }
}
