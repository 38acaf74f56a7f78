//! Error types for gitlab-tool

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using ToolError
pub type Result<T> = std::result::Result<T, ToolError>;

/// Main error type for gitlab-tool operations
#[derive(Debug, Error)]
pub enum ToolError {
    /// Configuration-related errors
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Git-related errors
    #[error(transparent)]
    Git(#[from] GitError),

    /// Changelog-related errors
    #[error(transparent)]
    Changelog(#[from] ChangelogError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found at {0}")]
    NotFound(PathBuf),

    /// Invalid configuration value
    #[error("Invalid configuration: {field} - {message}")]
    InvalidValue { field: String, message: String },

    /// Missing required field
    #[error("Missing required configuration field: {0}")]
    MissingField(String),

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// IO error
    #[error("IO error reading config: {0}")]
    Io(#[from] std::io::Error),
}

/// Git-related errors
#[derive(Debug, Error)]
pub enum GitError {
    /// Not a git repository
    #[error("Not a git repository: {0}")]
    NotARepository(PathBuf),

    /// Failed to open repository
    #[error("Failed to open repository: {0}")]
    OpenFailed(String),

    /// Remote not found
    #[error("Remote not found: {0}")]
    RemoteNotFound(String),

    /// The git executable is not on PATH
    #[error("git executable not found on PATH")]
    GitNotInstalled,

    /// `git clone` exited unsuccessfully
    #[error("Failed to clone {url}: {reason}")]
    CloneFailed { url: String, reason: String },

    /// Git2 library error
    #[error("Git error: {0}")]
    Git2(#[from] git2::Error),
}

/// Changelog-related errors
#[derive(Debug, Error)]
pub enum ChangelogError {
    /// No well-formed entry at the requested position
    #[error("No changelog entry at index {index}: {reason}")]
    NotFound { index: usize, reason: String },

    /// Package name is neither in the previous entry nor in the manifest
    #[error("Package name not found in previous entry or {}", manifest.display())]
    PackageNotFound { manifest: PathBuf },

    /// Version was not supplied and there is no previous entry to take it from
    #[error("Version not supplied and no previous changelog entry has one")]
    MissingVersion,

    /// Maintainer was not supplied and there is no previous entry to take it from
    #[error("Maintainer not supplied and no previous changelog entry exists")]
    MissingMaintainer,

    /// A value would not read back from the written entry
    #[error("Invalid changelog {field}: {value:?}")]
    InvalidField { field: &'static str, value: String },

    /// Writing or replacing the changelog file failed; the original is untouched
    #[error("Failed to write changelog {}: {source}", path.display())]
    WriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ChangelogError {
    /// Build a `NotFound` error for the given entry index
    pub fn not_found(index: usize, reason: impl Into<String>) -> Self {
        Self::NotFound {
            index,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_changelog_error_wraps_into_tool_error() {
        let err: ToolError = ChangelogError::MissingVersion.into();
        assert!(matches!(err, ToolError::Changelog(ChangelogError::MissingVersion)));
        assert!(err.to_string().contains("Version not supplied"));
    }

    #[test]
    fn test_not_found_message_includes_index() {
        let err = ChangelogError::not_found(2, "document has 1 entry");
        assert_eq!(
            err.to_string(),
            "No changelog entry at index 2: document has 1 entry"
        );
    }

    #[test]
    fn test_package_not_found_mentions_manifest() {
        let err = ChangelogError::PackageNotFound {
            manifest: PathBuf::from("debian/control"),
        };
        assert!(err.to_string().ends_with("debian/control"));
    }
}
