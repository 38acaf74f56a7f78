//! gitlab-tool core - configuration and error types
//!
//! This crate provides the error taxonomy and the layered configuration
//! (file, environment, flags) shared by the other gitlab-tool crates.

pub mod config;
pub mod error;

pub use config::{BranchConfig, ChangelogConfig, Config, ConfigOverrides, PaginationConfig};
pub use error::{ChangelogError, ConfigError, GitError, Result, ToolError};
