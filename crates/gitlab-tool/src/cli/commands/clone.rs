//! Clone command

use std::path::PathBuf;

use clap::Args;
use tracing::{info, warn};
use url::Url;

use gitlab_tool_api::Project;
use gitlab_tool_git::{clone_into, find_git, CloneOutcome};

use crate::cli::commands::get::group_projects;
use crate::cli::output;
use crate::cli::{Cli, OutputFormat};

/// Clone the projects of a group
#[derive(Debug, Args)]
pub struct CloneCommand {
    /// Group URL, e.g. https://gitlab.example.com/infra (default: configured group)
    pub url: Option<String>,

    /// Additional projects to skip, comma separated
    #[arg(long, value_delimiter = ',')]
    pub exclude: Vec<String>,

    /// Directory to clone into
    #[arg(long, value_name = "DIR")]
    pub into: Option<PathBuf>,

    /// Clone over SSH instead of HTTPS
    #[arg(long)]
    pub ssh: bool,
}

/// Server and group named by a group URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupLocation {
    pub server: String,
    pub group: String,
}

/// Split `https://host/group/subgroup` into server and group
pub fn parse_group_url(raw: &str) -> anyhow::Result<GroupLocation> {
    let url = Url::parse(raw.trim())?;
    let host = url
        .host_str()
        .ok_or_else(|| anyhow::anyhow!("no host in {}", raw))?;
    let server = match url.port() {
        Some(port) => format!("{}://{}:{}/", url.scheme(), host, port),
        None => format!("{}://{}/", url.scheme(), host),
    };

    let path = url.path().trim_matches('/');
    let group = path.strip_suffix(".git").unwrap_or(path);
    if group.is_empty() {
        anyhow::bail!("no group in {}", raw);
    }

    Ok(GroupLocation {
        server,
        group: group.to_string(),
    })
}

/// Last path segment of a project, used as its directory name
fn directory_name(project: &Project) -> &str {
    project
        .path_with_namespace
        .rsplit('/')
        .next()
        .unwrap_or(&project.name)
}

impl CloneCommand {
    /// Execute the clone command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(url = ?self.url, ssh = self.ssh, "executing clone command");
        let mut config = cli.load_config()?;

        if let Some(raw) = &self.url {
            let location = parse_group_url(raw)?;
            config.gitlab_url = location.server;
            config.gitlab_group = location.group;
        }
        config.exclude_projects.extend(self.exclude.iter().cloned());

        let git = find_git()?;
        let client = cli.client(&config)?;
        let rt = tokio::runtime::Runtime::new()?;
        let projects = rt.block_on(group_projects(&client, &config))?;

        let base = match &self.into {
            Some(dir) => dir.clone(),
            None => std::env::current_dir()?,
        };

        let mut outcomes = Vec::new();
        let mut first_error = None;
        for project in &projects {
            let repo_url = if self.ssh {
                project.ssh_url_to_repo.as_deref()
            } else {
                project.http_url_to_repo.as_deref()
            };
            let Some(repo_url) = repo_url else {
                warn!(project = %project.path_with_namespace, "project has no clone URL");
                if !cli.quiet {
                    output::warning(&format!(
                        "{} has no clone URL, skipping",
                        project.path_with_namespace
                    ));
                }
                continue;
            };

            let dest = base.join(directory_name(project));
            match clone_into(&git, repo_url, &dest) {
                Ok(outcome) => {
                    if !cli.quiet && cli.format == OutputFormat::Text {
                        let path = output::path_style().apply_to(dest.display()).to_string();
                        match &outcome {
                            CloneOutcome::Cloned(_) => output::success(&format!("Cloned {}", path)),
                            CloneOutcome::Skipped(_) => {
                                output::info(&format!("{} already exists, skipped", path))
                            }
                        }
                    }
                    outcomes.push(serde_json::json!({
                        "project": project.path_with_namespace,
                        "path": outcome.path().display().to_string(),
                        "cloned": matches!(outcome, CloneOutcome::Cloned(_)),
                    }));
                }
                Err(e) => {
                    output::error(&e.to_string());
                    first_error.get_or_insert(e);
                }
            }
        }

        if cli.format == OutputFormat::Json {
            output::json(&outcomes)?;
        }

        match first_error {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }
}
