//! Configuration loading

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{ConfigError, Result};

use super::defaults::{config_file_names, fallback_config_dirs};
use super::types::Config;

/// Load configuration from a file.
///
/// Values are not validated here: flags and environment may still override
/// them, so callers validate the merged result.
pub fn load_config(path: &Path) -> Result<Config> {
    let format = if path.extension().is_some_and(|e| e == "toml") {
        "TOML"
    } else {
        "YAML"
    };
    info!(path = %path.display(), format, "loading config");

    let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;

    let config: Config = if format == "TOML" {
        toml::from_str(&content).map_err(ConfigError::TomlError)?
    } else if content.trim().is_empty() {
        Config::default()
    } else {
        serde_yaml::from_str(&content).map_err(ConfigError::YamlError)?
    };

    debug!(path = %path.display(), "config loaded");
    Ok(config)
}

/// Find a configuration file.
///
/// The working directory and each of its parents are checked first, then
/// `~/.gitlab/` and `/etc/gitlab/`. The first match wins.
pub fn find_config(start_dir: &Path) -> Option<PathBuf> {
    debug!(start_dir = %start_dir.display(), "searching for config file");
    let mut current = start_dir.to_path_buf();

    loop {
        if let Some(found) = find_in_dir(&current) {
            return Some(found);
        }
        if !current.pop() {
            break;
        }
    }

    for dir in fallback_config_dirs() {
        if let Some(found) = find_in_dir(&dir) {
            return Some(found);
        }
    }

    debug!("no config file found");
    None
}

fn find_in_dir(dir: &Path) -> Option<PathBuf> {
    for name in config_file_names() {
        let config_path = dir.join(name);
        if config_path.is_file() {
            info!(path = %config_path.display(), "found config file");
            return Some(config_path);
        }
    }
    None
}

/// Load configuration or use defaults.
///
/// A file that exists but fails to parse is still an error; only a missing
/// file falls back to defaults.
pub fn load_config_or_default(dir: &Path) -> Result<(Config, Option<PathBuf>)> {
    match find_config(dir) {
        Some(path) => {
            let config = load_config(&path)?;
            Ok((config, Some(path)))
        }
        None => {
            debug!(dir = %dir.display(), "no config found, using defaults");
            Ok((Config::default(), None))
        }
    }
}

/// Resolve configuration for the CLI.
///
/// An explicitly requested file must exist. Otherwise the usual search
/// applies and a missing file means defaults.
pub fn resolve_config(explicit: Option<&Path>, cwd: &Path) -> Result<(Config, Option<PathBuf>)> {
    match explicit {
        Some(path) => {
            let path = if path.is_absolute() {
                path.to_path_buf()
            } else {
                cwd.join(path)
            };
            if !path.is_file() {
                return Err(ConfigError::NotFound(path).into());
            }
            let config = load_config(&path)?;
            Ok((config, Some(path)))
        }
        None => load_config_or_default(cwd),
    }
}
