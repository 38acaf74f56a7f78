//! Exit codes for the CLI

use gitlab_tool_api::FetchError;
use gitlab_tool_core::{ChangelogError, ConfigError, GitError, ToolError};

/// General error
pub const ERROR: u8 = 1;

/// Configuration error
pub const CONFIG_ERROR: u8 = 2;

/// Git error
pub const GIT_ERROR: u8 = 3;

/// Changelog error
pub const CHANGELOG_ERROR: u8 = 4;

/// Hosting API error
pub const API_ERROR: u8 = 5;

/// Exit code for the first categorized error in the chain
pub fn for_error(err: &anyhow::Error) -> u8 {
    for cause in err.chain() {
        if let Some(tool) = cause.downcast_ref::<ToolError>() {
            return match tool {
                ToolError::Config(_) => CONFIG_ERROR,
                ToolError::Git(_) => GIT_ERROR,
                ToolError::Changelog(_) => CHANGELOG_ERROR,
                ToolError::Io(_) => ERROR,
            };
        }
        if cause.is::<ConfigError>() {
            return CONFIG_ERROR;
        }
        if cause.is::<GitError>() {
            return GIT_ERROR;
        }
        if cause.is::<ChangelogError>() {
            return CHANGELOG_ERROR;
        }
        if cause.is::<FetchError>() {
            return API_ERROR;
        }
    }
    ERROR
}
