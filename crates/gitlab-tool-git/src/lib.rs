//! gitlab-tool git - local repository helpers
//!
//! This crate finds the repository the tool runs in, maps its remotes to
//! hosting-platform project paths and clones group projects with the git CLI.

mod clone;
mod remote;
mod repository;

pub use clone::{clone_into, find_git, CloneOutcome};
pub use remote::project_path_from_remote;
pub use repository::{is_repository, GitRepo, Result};
