//! Changelog command

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Subcommand};
use console::style;
use tracing::{info, warn};

use gitlab_tool_api::Deadline;
use gitlab_tool_changelog::{
    render, ChangelogEngine, ChangelogFile, ChangelogRecord, ChangesProvider, RecordDraft,
    ReleaseChanges, ReleaseCorrelator,
};
use gitlab_tool_core::Config;
use gitlab_tool_git::GitRepo;

use crate::cli::output;
use crate::cli::{Cli, OutputFormat};

/// Changelog operations
#[derive(Debug, Args)]
pub struct ChangelogCommand {
    #[command(subcommand)]
    pub command: ChangelogSubcommand,
}

/// Changelog subcommands
#[derive(Debug, Subcommand)]
pub enum ChangelogSubcommand {
    /// Add an entry to the top of the changelog
    #[command(disable_version_flag = true)]
    Add(AddCommand),

    /// Show entries of the changelog
    Show(ShowCommand),
}

/// Add a changelog entry
#[derive(Debug, Args)]
pub struct AddCommand {
    /// Package name (default: previous entry, then the control file)
    #[arg(short, long)]
    pub package: Option<String>,

    /// Version (default: previous entry)
    #[arg(short, long)]
    pub version: Option<String>,

    /// Release, e.g. stable (default: previous entry, then UNRELEASED)
    #[arg(short, long)]
    pub release: Option<String>,

    /// Urgency (default: previous entry, then medium)
    #[arg(short, long)]
    pub urgency: Option<String>,

    /// Change lines (default: merge requests since the last promotion)
    #[arg(short, long)]
    pub changes: Option<String>,

    /// Maintainer as "Name <email>" (default: previous entry)
    #[arg(short, long)]
    pub maintainer: Option<String>,

    /// Date in RFC 2822 form (default: now)
    #[arg(short, long)]
    pub date: Option<String>,

    /// Changelog file (default: configured changelog file)
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// Control file used to find the package name
    #[arg(long)]
    pub control_file: Option<PathBuf>,

    /// Project to collect merge requests from (default: the origin remote)
    #[arg(long)]
    pub project: Option<String>,

    /// Give up collecting merge requests after this many seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Print the entry instead of writing it
    #[arg(long)]
    pub dry_run: bool,
}

/// Show changelog entries
#[derive(Debug, Args)]
pub struct ShowCommand {
    /// Entry to show, 0 being the most recent
    #[arg(long, default_value_t = 0)]
    pub index: usize,

    /// Show every entry
    #[arg(long, conflicts_with = "index")]
    pub all: bool,

    /// Changelog file (default: configured changelog file)
    #[arg(long)]
    pub file: Option<PathBuf>,
}

impl ChangelogCommand {
    /// Execute the changelog command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        match &self.command {
            ChangelogSubcommand::Add(cmd) => {
                let rt = tokio::runtime::Runtime::new()?;
                rt.block_on(cmd.execute(cli))
            }
            ChangelogSubcommand::Show(cmd) => cmd.execute(cli),
        }
    }
}

impl AddCommand {
    fn draft(&self) -> RecordDraft {
        RecordDraft::from_parts(
            self.package.clone(),
            self.version.clone(),
            self.release.clone(),
            self.urgency.clone(),
            self.changes.clone(),
            self.maintainer.clone(),
            self.date.clone(),
        )
    }

    /// Project whose merge requests describe the changes
    fn resolve_project(&self) -> Option<String> {
        if let Some(project) = &self.project {
            return Some(project.clone());
        }
        let cwd = std::env::current_dir().ok()?;
        match GitRepo::discover(&cwd).and_then(|repo| repo.remote_project("origin")) {
            Ok(project) => Some(project),
            Err(e) => {
                warn!(error = %e, "cannot determine project for merge requests");
                None
            }
        }
    }

    async fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(version = ?self.version, dry_run = self.dry_run, "executing changelog add command");
        let mut config = cli.load_config()?;
        if let Some(file) = &self.file {
            config.changelog.file = file.clone();
        }
        if let Some(control_file) = &self.control_file {
            config.changelog.control_file = control_file.clone();
        }

        let draft = self.draft();
        let project = if draft.changes.is_none() {
            self.resolve_project()
        } else {
            None
        };
        let client = match &project {
            Some(_) => cli
                .client(&config)
                .map_err(|e| warn!(error = %e, "cannot create GitLab client"))
                .ok(),
            None => None,
        };

        let deadline = Deadline::after(Duration::from_secs(
            self.timeout.unwrap_or(config.request_timeout_secs),
        ));
        let provider = match (&client, project) {
            (Some(client), Some(project)) => Some(ReleaseChanges::new(
                ReleaseCorrelator::new(client, config.branches.clone(), config.pagination)
                    .with_deadline(deadline),
                project,
            )),
            _ => None,
        };
        let changes = provider.as_ref().map(|p| p as &dyn ChangesProvider);

        let engine = ChangelogEngine::new(&config.changelog);
        let record = if self.dry_run {
            engine.preview(draft, changes).await?
        } else {
            engine.add(draft, changes).await?
        };

        self.report(cli, &config, &record)
    }

    fn report(&self, cli: &Cli, config: &Config, record: &ChangelogRecord) -> anyhow::Result<()> {
        match cli.format {
            OutputFormat::Json => output::json(record)?,
            OutputFormat::Text if self.dry_run => print!("{}", render(record)),
            OutputFormat::Text => {
                if !cli.quiet {
                    output::success(&format!(
                        "Added {} {} to {}",
                        record.package,
                        output::version_style().apply_to(&record.version),
                        output::path_style().apply_to(config.changelog.file.display())
                    ));
                }
                if cli.verbose {
                    print!("{}", render(record));
                }
            }
        }
        Ok(())
    }
}

impl ShowCommand {
    fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(index = self.index, all = self.all, "executing changelog show command");
        let path = match &self.file {
            Some(file) => file.clone(),
            None => cli.load_config()?.changelog.file,
        };
        let file = ChangelogFile::new(path);

        if !self.all {
            let record = file.read_record(self.index)?;
            match cli.format {
                OutputFormat::Json => output::json(&record)?,
                OutputFormat::Text => print!("{}", render(&record)),
            }
            return Ok(());
        }

        let mut records = Vec::new();
        for result in file.records()? {
            match result {
                Ok(record) => records.push(record),
                Err(e) => {
                    warn!(error = %e, "stopped reading changelog");
                    if !cli.quiet {
                        output::warning(&e.to_string());
                    }
                }
            }
        }

        match cli.format {
            OutputFormat::Json => output::json(&records)?,
            OutputFormat::Text => {
                if records.is_empty() && !cli.quiet {
                    println!("{}", style("No changelog entries found.").yellow());
                }
                for record in &records {
                    print!("{}", render(record));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Commands;
    use clap::Parser;

    fn parse_add(args: &[&str]) -> AddCommand {
        let mut argv = vec!["gitlab-tool", "changelog", "add"];
        argv.extend_from_slice(args);
        let cli = Cli::try_parse_from(argv).unwrap();
        match cli.command {
            Commands::Changelog(ChangelogCommand {
                command: ChangelogSubcommand::Add(cmd),
            }) => cmd,
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_short_flags() {
        let cmd = parse_add(&[
            "-p",
            "mypkg",
            "-v",
            "1.2.4",
            "-r",
            "stable",
            "-u",
            "low",
            "-c",
            "  * fix",
            "-m",
            "A B <a@b.com>",
            "-d",
            "Mon, 01 Jan 2024 00:00:00 +0000",
        ]);
        let draft = cmd.draft();
        assert_eq!(draft.package.as_deref(), Some("mypkg"));
        assert_eq!(draft.version.as_deref(), Some("1.2.4"));
        assert_eq!(draft.release.as_deref(), Some("stable"));
        assert_eq!(draft.urgency.as_deref(), Some("low"));
        assert_eq!(draft.changes.as_deref(), Some("  * fix"));
        assert_eq!(draft.maintainer.as_deref(), Some("A B <a@b.com>"));
        assert_eq!(draft.date.as_deref(), Some("Mon, 01 Jan 2024 00:00:00 +0000"));
    }

    #[test]
    fn test_empty_flags_are_absent() {
        let cmd = parse_add(&["--version", "", "--dry-run"]);
        assert!(cmd.draft().version.is_none());
        assert!(cmd.dry_run);
    }

    #[test]
    fn test_explicit_project_wins() {
        let cmd = parse_add(&["--project", "infra/api"]);
        assert_eq!(cmd.resolve_project().as_deref(), Some("infra/api"));
    }

    #[test]
    fn test_show_all_conflicts_with_index() {
        let result =
            Cli::try_parse_from(["gitlab-tool", "changelog", "show", "--all", "--index", "2"]);
        assert!(result.is_err());
    }
}
