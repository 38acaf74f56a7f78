//! Configuration validation

use tracing::debug;

use crate::error::{ConfigError, Result};

use super::types::Config;

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    debug!("validating configuration");
    validate_gitlab(config)?;
    validate_branches(config)?;
    validate_pagination(config)?;
    validate_changelog(config)?;
    debug!("configuration validation passed");
    Ok(())
}

fn invalid(field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        message: message.into(),
    }
}

fn validate_gitlab(config: &Config) -> Result<()> {
    let parsed = url::Url::parse(&config.gitlab_url)
        .map_err(|e| invalid("gitlab-url", format!("not a valid URL: {}", e)))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(invalid("gitlab-url", "scheme must be http or https").into());
    }

    if config.request_timeout_secs == 0 {
        return Err(invalid("request-timeout-secs", "must be greater than zero").into());
    }

    Ok(())
}

fn validate_branches(config: &Config) -> Result<()> {
    if config.branches.main.trim().is_empty() {
        return Err(invalid("branches.main", "branch cannot be empty").into());
    }

    if config.branches.staging.trim().is_empty() {
        return Err(invalid("branches.staging", "branch cannot be empty").into());
    }

    if config.branches.main == config.branches.staging {
        return Err(invalid("branches", "main and staging branches must differ").into());
    }

    Ok(())
}

fn validate_pagination(config: &Config) -> Result<()> {
    let pagination = &config.pagination;
    for (field, value) in [
        ("pagination.staging-page-size", pagination.staging_page_size),
        ("pagination.main-page-size", pagination.main_page_size),
        ("pagination.tags-page-size", pagination.tags_page_size),
    ] {
        if value == 0 {
            return Err(invalid(field, "must be greater than zero").into());
        }
    }

    Ok(())
}

fn validate_changelog(config: &Config) -> Result<()> {
    if config.changelog.file.as_os_str().is_empty() {
        return Err(invalid("changelog.file", "path cannot be empty").into());
    }

    if config.changelog.default_release.contains(';') {
        return Err(invalid("changelog.default-release", "cannot contain ';'").into());
    }

    Ok(())
}
