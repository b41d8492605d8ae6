use std::fs;

use camino::Utf8Path;
use tracing::{error, info};

use crate::annex::{AnnexCommand, CommandRunner};
use crate::error::AnnexError;
use crate::fs_util::WorkdirGuard;

pub const GIT_DIR: &str = ".git";
pub const ANNEX_DIR: &str = "annex";

/// Makes sure `target` is a git-annex working tree.
///
/// The directory, the git repository and the annex are checked in that
/// order; with `create` each missing piece is set up, otherwise the first
/// missing one is reported. Nothing is rolled back if a later step fails.
pub fn verify(
    target: &Utf8Path,
    create: bool,
    runner: &dyn CommandRunner,
) -> Result<(), AnnexError> {
    if !target.is_dir() {
        if !create {
            error!("{target} is not a directory, please create it");
            return Err(AnnexError::DestinationMissing(target.to_string()));
        }
        info!("creating {target}");
        fs::create_dir_all(target.as_std_path())
            .map_err(|err| AnnexError::Filesystem(format!("create {target}: {err}")))?;
    }

    let git_dir = target.join(GIT_DIR);
    if !git_dir.is_dir() {
        if !create {
            error!("{target} is not a git directory. Please run git init {target}");
            return Err(AnnexError::NotGitRepository(target.to_string()));
        }
        runner.run(&AnnexCommand::GitInit {
            target: target.as_std_path().to_path_buf(),
        })?;
    }

    let annex_dir = git_dir.join(ANNEX_DIR);
    if !annex_dir.is_dir() {
        if !create {
            error!("{target} is not a git-annex directory please cd {target}; git annex init");
            return Err(AnnexError::NotAnnexRepository(target.to_string()));
        }
        let _guard = WorkdirGuard::enter(target.as_std_path())?;
        runner.run(&AnnexCommand::AnnexInit)?;
    }

    Ok(())
}
