//! Shell completion scripts

use std::io::Write;
use std::path::PathBuf;

use clap::{Args, CommandFactory};
use clap_complete::{generate, Shell};
use tracing::info;

use crate::cli::{output, Cli};

const BIN_NAME: &str = "gitlab-tool";

/// Print a completion script for a shell
#[derive(Debug, Args)]
pub struct CompletionsCommand {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,

    /// Write the script to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

/// Completion script for `shell`
fn script(shell: Shell) -> Vec<u8> {
    let mut buf = Vec::new();
    generate(shell, &mut Cli::command(), BIN_NAME, &mut buf);
    buf
}

impl CompletionsCommand {
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(shell = %self.shell, "generating completions");
        let script = script(self.shell);

        let Some(path) = &self.output else {
            std::io::stdout().write_all(&script)?;
            return Ok(());
        };

        std::fs::write(path, &script)?;
        if !cli.quiet {
            output::success(&format!(
                "{} completions written to {}",
                self.shell,
                output::path_style().apply_to(path.display())
            ));
        }
        Ok(())
    }
}
