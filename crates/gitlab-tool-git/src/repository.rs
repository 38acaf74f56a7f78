//! Git repository operations

use std::path::{Path, PathBuf};

use git2::Repository;
use tracing::{debug, instrument};

use gitlab_tool_core::GitError;

/// Result type for git operations
pub type Result<T> = std::result::Result<T, GitError>;

/// Git repository wrapper
pub struct GitRepo {
    pub(crate) repo: Repository,
    path: PathBuf,
}

impl GitRepo {
    /// Open a repository at the given path
    #[instrument(fields(path = %path.display()))]
    pub fn open(path: &Path) -> Result<Self> {
        debug!("opening git repository");
        let repo = Repository::open(path).map_err(|e| open_error(e, path))?;

        Ok(Self {
            path: path.to_path_buf(),
            repo,
        })
    }

    /// Discover and open a repository by searching parent directories
    #[instrument(fields(start_path = %start_path.display()))]
    pub fn discover(start_path: &Path) -> Result<Self> {
        debug!("discovering git repository");
        let repo = Repository::discover(start_path).map_err(|e| open_error(e, start_path))?;

        let path = repo.workdir().unwrap_or_else(|| repo.path()).to_path_buf();

        Ok(Self { repo, path })
    }

    /// Get the repository path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get the workdir path
    pub fn workdir(&self) -> Option<&Path> {
        self.repo.workdir()
    }

    /// Check if the repository is bare
    pub fn is_bare(&self) -> bool {
        self.repo.is_bare()
    }
}

/// Whether `path` itself is the root of a repository
pub fn is_repository(path: &Path) -> bool {
    Repository::open(path).is_ok()
}

fn open_error(e: git2::Error, path: &Path) -> GitError {
    if e.code() == git2::ErrorCode::NotFound {
        GitError::NotARepository(path.to_path_buf())
    } else {
        GitError::OpenFailed(e.to_string())
    }
}
