//! CLI definition and command handling

pub mod commands;
pub mod output;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::debug;

use gitlab_tool_api::GitLabClient;
use gitlab_tool_core::config::{resolve_config, validate_config};
use gitlab_tool_core::{Config, ConfigError, ConfigOverrides};

use commands::{ChangelogCommand, CloneCommand, CompletionsCommand, GetCommand};

/// gitlab-tool - GitLab group, merge request and Debian changelog helper
#[derive(Debug, Parser)]
#[command(name = "gitlab-tool")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Suppress output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output format
    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Working directory
    #[arg(short = 'C', long, global = true)]
    pub directory: Option<PathBuf>,

    /// GitLab server URL
    #[arg(long, global = true, env = "GT_GITLAB_URL")]
    pub gitlab_url: Option<String>,

    /// GitLab access token
    #[arg(long, global = true, env = "GT_GITLAB_TOKEN", hide_env_values = true)]
    pub gitlab_token: Option<String>,

    /// GitLab project group
    #[arg(long, global = true, env = "GT_GITLAB_GROUP")]
    pub gitlab_group: Option<String>,

    /// Projects to exclude from group operations
    #[arg(
        long,
        global = true,
        env = "GT_EXCLUDE_PROJECTS",
        value_delimiter = ','
    )]
    pub exclude_projects: Option<Vec<String>>,

    /// Configuration file (default: search for .gitlab-tool.yml)
    #[arg(long, global = true, env = "GT_CONFIG_FILE")]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format for CLI
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output
    #[default]
    Text,
    /// JSON output
    Json,
}

/// Available commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Get objects from the GitLab server
    Get(GetCommand),

    /// Clone the projects of a group
    Clone(CloneCommand),

    /// Changelog operations
    #[command(alias = "chl")]
    Changelog(ChangelogCommand),

    /// Generate shell completions
    Completions(CompletionsCommand),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> anyhow::Result<()> {
        // Change to specified directory if provided
        if let Some(dir) = &self.directory {
            std::env::set_current_dir(dir)?;
        }

        match self.command {
            Commands::Get(ref cmd) => cmd.execute(&self),
            Commands::Clone(ref cmd) => cmd.execute(&self),
            Commands::Changelog(ref cmd) => cmd.execute(&self),
            Commands::Completions(ref cmd) => cmd.execute(&self),
        }
    }

    /// Flag and `GT_*` values layered over the config file
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            gitlab_url: self.gitlab_url.clone(),
            gitlab_token: self.gitlab_token.clone(),
            gitlab_group: self.gitlab_group.clone(),
            exclude_projects: self.exclude_projects.clone(),
        }
    }

    /// Resolve configuration: defaults, then file, then flags and environment
    pub fn load_config(&self) -> anyhow::Result<Config> {
        let cwd = std::env::current_dir()?;
        let (mut config, path) = resolve_config(self.config_file.as_deref(), &cwd)?;
        config.apply_overrides(&self.overrides());
        validate_config(&config)?;
        debug!(path = ?path, gitlab_url = %config.gitlab_url, "configuration resolved");
        Ok(config)
    }

    /// GitLab client for the resolved configuration
    pub fn client(&self, config: &Config) -> anyhow::Result<GitLabClient> {
        Ok(GitLabClient::from_config(config)?)
    }
}

/// Require a group for group-wide commands
pub fn require_group(config: &Config) -> anyhow::Result<&str> {
    if config.gitlab_group.trim().is_empty() {
        return Err(ConfigError::MissingField(
            "gitlab-group (set it with --gitlab-group or GT_GITLAB_GROUP)".to_string(),
        )
        .into());
    }
    Ok(config.gitlab_group.as_str())
}
