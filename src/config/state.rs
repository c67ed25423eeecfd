// Application state module
// Immutable state shared by every connection task

use std::path::{Path, PathBuf};

use super::types::Config;
use crate::error::ServerError;

/// Application state
///
/// Built once at startup and shared behind an `Arc`. Nothing in here changes
/// while the server runs, so connection tasks read it without locking.
#[derive(Debug)]
pub struct AppState {
    pub config: Config,
    /// Canonical directory that request paths are resolved against
    pub root: PathBuf,
}

impl AppState {
    /// Create `AppState` serving files below `root`
    pub fn new(config: Config, root: &Path) -> Result<Self, ServerError> {
        let root = root.canonicalize().map_err(|source| ServerError::Root {
            path: root.to_path_buf(),
            source,
        })?;

        if !root.is_dir() {
            return Err(ServerError::Root {
                path: root,
                source: std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "not a directory",
                ),
            });
        }

        Ok(Self { config, root })
    }
}
