//! Configuration types

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::defaults::{
    DEFAULT_GITLAB_URL, DEFAULT_MAIN_BRANCH, DEFAULT_PLACEHOLDER_CHANGES, DEFAULT_RELEASE,
    DEFAULT_STAGING_BRANCH, DEFAULT_URGENCY,
};

/// Main configuration for gitlab-tool
///
/// Keys are kebab-case so a config file can use the same names as the
/// command-line flags (`gitlab-url`, `exclude-projects`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
    /// GitLab server URL
    pub gitlab_url: String,

    /// Personal access token sent as `PRIVATE-TOKEN`
    pub gitlab_token: Option<String>,

    /// Group whose projects are listed and cloned
    pub gitlab_group: String,

    /// Project names to skip in group operations
    pub exclude_projects: Vec<String>,

    /// Per-request HTTP timeout in seconds
    pub request_timeout_secs: u64,

    /// Branch roles used by release correlation
    pub branches: BranchConfig,

    /// Page sizes for API listings
    pub pagination: PaginationConfig,

    /// Changelog file locations and field defaults
    pub changelog: ChangelogConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gitlab_url: DEFAULT_GITLAB_URL.to_string(),
            gitlab_token: None,
            gitlab_group: String::new(),
            exclude_projects: Vec::new(),
            request_timeout_secs: 30,
            branches: BranchConfig::default(),
            pagination: PaginationConfig::default(),
            changelog: ChangelogConfig::default(),
        }
    }
}

impl Config {
    /// Whether a project name is in the exclusion list
    pub fn is_excluded(&self, project_name: &str) -> bool {
        self.exclude_projects.iter().any(|p| p == project_name)
    }

    /// Layer command-line and environment values over file values
    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(url) = &overrides.gitlab_url {
            self.gitlab_url = url.clone();
        }
        if let Some(token) = &overrides.gitlab_token {
            self.gitlab_token = Some(token.clone());
        }
        if let Some(group) = &overrides.gitlab_group {
            self.gitlab_group = group.clone();
        }
        if let Some(exclude) = &overrides.exclude_projects {
            self.exclude_projects = exclude.clone();
        }
    }
}

/// Values supplied on the command line or through `GT_*` variables
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub gitlab_url: Option<String>,
    pub gitlab_token: Option<String>,
    pub gitlab_group: Option<String>,
    pub exclude_projects: Option<Vec<String>>,
}

/// Branch roles for the staging-promotion heuristic
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct BranchConfig {
    /// Branch features are merged into
    pub main: String,

    /// Branch the main branch is promoted into
    pub staging: String,
}

impl Default for BranchConfig {
    fn default() -> Self {
        Self {
            main: DEFAULT_MAIN_BRANCH.to_string(),
            staging: DEFAULT_STAGING_BRANCH.to_string(),
        }
    }
}

/// Page sizes used when walking API listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct PaginationConfig {
    /// Merge requests per page when scanning the staging branch
    pub staging_page_size: u32,

    /// Merge requests per page when scanning the main branch
    pub main_page_size: u32,

    /// Tags per page for `get tags`
    pub tags_page_size: u32,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            staging_page_size: 5,
            main_page_size: 20,
            tags_page_size: 20,
        }
    }
}

/// Changelog configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ChangelogConfig {
    /// Changelog file path
    pub file: PathBuf,

    /// Package manifest consulted for the package name
    pub control_file: PathBuf,

    /// Release label used when nothing else supplies one
    pub default_release: String,

    /// Urgency used when nothing else supplies one
    pub default_urgency: String,

    /// Change text used when merge requests cannot be correlated
    pub placeholder_changes: String,
}

impl Default for ChangelogConfig {
    fn default() -> Self {
        Self {
            file: PathBuf::from("debian/changelog"),
            control_file: PathBuf::from("debian/control"),
            default_release: DEFAULT_RELEASE.to_string(),
            default_urgency: DEFAULT_URGENCY.to_string(),
            placeholder_changes: DEFAULT_PLACEHOLDER_CHANGES.to_string(),
        }
    }
}
