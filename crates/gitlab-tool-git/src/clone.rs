//! Cloning through the git CLI
//!
//! Cloning shells out to `git` so that the user's credential helpers and
//! SSH agent are used as-is.

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, info, instrument};

use crate::repository::{is_repository, Result};
use gitlab_tool_core::GitError;

/// What happened to one clone target
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloneOutcome {
    /// Freshly cloned into the path
    Cloned(PathBuf),
    /// A repository already existed at the path
    Skipped(PathBuf),
}

impl CloneOutcome {
    pub fn path(&self) -> &Path {
        match self {
            Self::Cloned(path) | Self::Skipped(path) => path,
        }
    }
}

/// Locate the `git` executable
pub fn find_git() -> Result<PathBuf> {
    which::which("git").map_err(|_| GitError::GitNotInstalled)
}

/// Clone `url` into `dest` unless a repository is already there
#[instrument(skip_all, fields(url = %url, dest = %dest.display()))]
pub fn clone_into(git: &Path, url: &str, dest: &Path) -> Result<CloneOutcome> {
    if is_repository(dest) {
        debug!("repository already present, skipping");
        return Ok(CloneOutcome::Skipped(dest.to_path_buf()));
    }

    let start = std::time::Instant::now();
    let output = Command::new(git)
        .args(["clone", "--quiet", url])
        .arg(dest)
        .output()
        .map_err(|e| GitError::CloneFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(GitError::CloneFailed {
            url: url.to_string(),
            reason: stderr.trim().to_string(),
        });
    }

    info!(
        url,
        dest = %dest.display(),
        duration_ms = start.elapsed().as_millis(),
        "cloned repository"
    );
    Ok(CloneOutcome::Cloned(dest.to_path_buf()))
}
