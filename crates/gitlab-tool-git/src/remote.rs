//! Remote lookups and remote URL parsing

use tracing::debug;
use url::Url;

use crate::repository::{GitRepo, Result};
use gitlab_tool_core::GitError;

impl GitRepo {
    /// Get the URL for a remote
    pub fn remote_url(&self, name: &str) -> Result<String> {
        match self.repo.find_remote(name) {
            Ok(remote) => remote
                .url()
                .map(|s| s.to_string())
                .ok_or_else(|| GitError::RemoteNotFound(format!("{} (no valid URL)", name))),
            Err(e) if e.code() == git2::ErrorCode::NotFound => {
                Err(GitError::RemoteNotFound(name.to_string()))
            }
            Err(e) => Err(GitError::Git2(e)),
        }
    }

    /// `group/project` path of the project behind a remote
    pub fn remote_project(&self, name: &str) -> Result<String> {
        let url = self.remote_url(name)?;
        let project = project_path_from_remote(&url).ok_or_else(|| {
            GitError::RemoteNotFound(format!("{} ({} is not a project URL)", name, url))
        })?;
        debug!(remote = name, %project, "resolved project from remote");
        Ok(project)
    }
}

/// Extract the namespaced project path from a clone URL.
///
/// Understands `https://host/group/project.git`,
/// `ssh://git@host:port/group/project.git` and the scp-like
/// `git@host:group/project.git`. Nested groups are kept.
pub fn project_path_from_remote(remote: &str) -> Option<String> {
    let remote = remote.trim();

    let path = if remote.contains("://") {
        Url::parse(remote).ok()?.path().to_string()
    } else {
        let (host, path) = remote.split_once(':')?;
        if host.is_empty() || host.contains('/') {
            return None;
        }
        path.to_string()
    };

    let path = path.trim_matches('/');
    let path = path.strip_suffix(".git").unwrap_or(path);
    let path = path.trim_end_matches('/');

    let segments: Vec<&str> = path.split('/').collect();
    if segments.len() < 2 || segments.iter().any(|s| s.is_empty()) {
        return None;
    }
    Some(path.to_string())
}
