//! Get command: list projects, tags and merge requests of a group

use std::time::Duration;

use clap::{Args, Subcommand};
use console::style;
use tracing::info;

use gitlab_tool_api::{Deadline, HostingApi, Project, TagQuery};
use gitlab_tool_changelog::{change_line, Correlation, ReleaseCorrelator};
use gitlab_tool_core::Config;

use crate::cli::output;
use crate::cli::{require_group, Cli, OutputFormat};

/// Get objects from the GitLab server
#[derive(Debug, Args)]
pub struct GetCommand {
    #[command(subcommand)]
    pub command: GetSubcommand,
}

/// Get subcommands
#[derive(Debug, Subcommand)]
pub enum GetSubcommand {
    /// List the projects of the group
    Projects,

    /// List the tags of each project
    Tags(TagsCommand),

    /// Show merges into the main branch since the last staging promotion
    #[command(alias = "mrs")]
    MergeRequests(MergeRequestsCommand),
}

/// List tags
#[derive(Debug, Args)]
pub struct TagsCommand {
    /// Only this project (path with namespace)
    #[arg(long)]
    pub project: Option<String>,
}

/// Correlate merge requests
#[derive(Debug, Args)]
pub struct MergeRequestsCommand {
    /// Only this project (path with namespace)
    #[arg(long)]
    pub project: Option<String>,

    /// Give up on a project after this many seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,
}

impl GetCommand {
    /// Execute the get command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(command = ?self.command, "executing get command");
        let config = cli.load_config()?;
        let client = cli.client(&config)?;

        let rt = tokio::runtime::Runtime::new()?;
        match &self.command {
            GetSubcommand::Projects => rt.block_on(list_projects(&client, &config, cli)),
            GetSubcommand::Tags(cmd) => rt.block_on(cmd.execute(&client, &config, cli)),
            GetSubcommand::MergeRequests(cmd) => rt.block_on(cmd.execute(&client, &config, cli)),
        }
    }
}

/// Projects of the configured group, minus excluded ones
pub(crate) async fn group_projects(
    api: &dyn HostingApi,
    config: &Config,
) -> anyhow::Result<Vec<Project>> {
    let group = require_group(config)?;
    let projects = api.group_projects(group).await?;
    let total = projects.len();
    let kept: Vec<Project> = projects
        .into_iter()
        .filter(|p| !config.is_excluded(&p.name))
        .collect();
    info!(group, total, kept = kept.len(), "listed group projects");
    Ok(kept)
}

/// Target projects: one named project, or the whole group
async fn target_projects(
    api: &dyn HostingApi,
    config: &Config,
    project: Option<&str>,
) -> anyhow::Result<Vec<String>> {
    match project {
        Some(project) => Ok(vec![project.to_string()]),
        None => Ok(group_projects(api, config)
            .await?
            .into_iter()
            .map(|p| p.path_with_namespace)
            .collect()),
    }
}

async fn list_projects(api: &dyn HostingApi, config: &Config, cli: &Cli) -> anyhow::Result<()> {
    let projects = group_projects(api, config).await?;

    match cli.format {
        OutputFormat::Json => output::json(&projects)?,
        OutputFormat::Text => {
            if projects.is_empty() && !cli.quiet {
                output::warning("No projects found");
            }
            for (i, project) in projects.iter().enumerate() {
                println!(
                    "{:>3} : {}",
                    style(i + 1).dim(),
                    output::path_style().apply_to(&project.path_with_namespace)
                );
            }
        }
    }
    Ok(())
}

impl TagsCommand {
    async fn execute(&self, api: &dyn HostingApi, config: &Config, cli: &Cli) -> anyhow::Result<()> {
        let projects = target_projects(api, config, self.project.as_deref()).await?;
        let query = TagQuery {
            per_page: config.pagination.tags_page_size,
            ..TagQuery::default()
        };

        let mut report = Vec::new();
        for project in projects {
            let page = api.list_tags(&project, &query).await?;

            if cli.format == OutputFormat::Text {
                println!("{}", output::header(&project));
                for tag in &page.items {
                    let created = tag
                        .created_at
                        .map(|d| d.to_rfc3339())
                        .unwrap_or_else(|| "-".to_string());
                    println!(
                        "  - {} : {} : {}{}",
                        created,
                        output::tag_style().apply_to(&tag.name),
                        output::hash_style().apply_to(&tag.commit_hash),
                        tag.release
                            .as_deref()
                            .map(|r| format!(" : {}", r.lines().next().unwrap_or_default()))
                            .unwrap_or_default()
                    );
                }
            }

            report.push(serde_json::json!({
                "project": project,
                "tags": page.items,
            }));
        }

        if cli.format == OutputFormat::Json {
            output::json(&report)?;
        }
        Ok(())
    }
}

impl MergeRequestsCommand {
    async fn execute(&self, api: &dyn HostingApi, config: &Config, cli: &Cli) -> anyhow::Result<()> {
        let projects = target_projects(api, config, self.project.as_deref()).await?;

        let mut report = Vec::new();
        for project in projects {
            let deadline = self
                .timeout
                .map(|secs| Deadline::after(Duration::from_secs(secs)))
                .unwrap_or_default();
            let correlation =
                ReleaseCorrelator::new(api, config.branches.clone(), config.pagination)
                    .with_deadline(deadline)
                    .correlate(&project)
                    .await?;

            if cli.format == OutputFormat::Text {
                print_correlation(&project, &correlation, config);
            }
            report.push(serde_json::json!({
                "project": project,
                "correlation": correlation,
            }));
        }

        if cli.format == OutputFormat::Json {
            output::json(&report)?;
        }
        Ok(())
    }
}

fn print_correlation(project: &str, correlation: &Correlation, config: &Config) {
    println!("{}", output::header(project));

    if let Some(tag) = &correlation.anchor_tag {
        println!("{}", output::key_value("latest tag", &tag.name));
    }
    match &correlation.promotion {
        Some(mr) => println!(
            "{}",
            output::key_value(
                &format!("last {} promotion", config.branches.staging),
                &format!("!{} {} ({})", mr.iid, mr.title, mr.created_at.to_rfc3339())
            )
        ),
        None => println!(
            "{}",
            output::key_value(
                &format!("last {} promotion", config.branches.staging),
                "none found"
            )
        ),
    }

    if correlation.changes.is_empty() {
        println!("  {}", style("no recent merges").dim());
    }
    for mr in &correlation.changes {
        println!("{}", change_line(mr));
    }

    if let Some(boundary) = &correlation.boundary {
        println!(
            "  {} {}",
            style("-- released in").dim(),
            output::version_style().apply_to(change_line(boundary).trim())
        );
    }
}
