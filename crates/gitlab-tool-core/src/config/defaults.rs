//! Default configuration values

use std::path::PathBuf;

/// Default configuration file name (YAML)
pub const DEFAULT_CONFIG_YAML: &str = ".gitlab-tool.yml";

/// Alternative YAML extension
pub const ALT_CONFIG_YAML: &str = ".gitlab-tool.yaml";

/// TOML configuration file name
pub const DEFAULT_CONFIG_TOML: &str = ".gitlab-tool.toml";

pub const DEFAULT_GITLAB_URL: &str = "https://gitlab.com/";
pub const DEFAULT_MAIN_BRANCH: &str = "master";
pub const DEFAULT_STAGING_BRANCH: &str = "beta";
pub const DEFAULT_RELEASE: &str = "UNRELEASED";
pub const DEFAULT_URGENCY: &str = "medium";
pub const DEFAULT_PLACEHOLDER_CHANGES: &str = "  some changes were made";

/// Get list of config file names to search for
pub fn config_file_names() -> Vec<&'static str> {
    vec![DEFAULT_CONFIG_YAML, ALT_CONFIG_YAML, DEFAULT_CONFIG_TOML]
}

/// Directories searched after the working directory and its parents
pub fn fallback_config_dirs() -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    if let Some(home) = dirs::home_dir() {
        dirs.push(home.join(".gitlab"));
    }
    dirs.push(PathBuf::from("/etc/gitlab"));
    dirs
}
