use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::AnnexError;

/// Changes the process working directory until dropped.
///
/// The previous directory is restored on every exit path, including early
/// returns through `?`.
#[must_use = "the previous directory is restored when the guard is dropped"]
pub struct WorkdirGuard {
    previous: PathBuf,
}

impl WorkdirGuard {
    pub fn enter(dir: &Path) -> Result<Self, AnnexError> {
        let previous = env::current_dir().map_err(|err| AnnexError::Filesystem(err.to_string()))?;
        env::set_current_dir(dir)
            .map_err(|err| AnnexError::Filesystem(format!("chdir {}: {err}", dir.display())))?;
        debug!(dir = %dir.display(), "entered directory");
        Ok(Self { previous })
    }
}

impl Drop for WorkdirGuard {
    fn drop(&mut self) {
        if let Err(err) = env::set_current_dir(&self.previous) {
            warn!(dir = %self.previous.display(), "failed to restore working directory: {err}");
        }
    }
}

/// True for regular files, directories and symbolic links, dangling or not.
pub fn path_present(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}
