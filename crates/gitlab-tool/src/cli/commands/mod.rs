//! CLI commands

mod changelog;
mod clone;
mod completions;
mod get;

pub use changelog::ChangelogCommand;
pub use clone::CloneCommand;
pub use completions::CompletionsCommand;
pub use get::GetCommand;
