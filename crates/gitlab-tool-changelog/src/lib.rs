//! gitlab-tool changelog - Debian changelog entries and release correlation
//!
//! The engine reads the most recent entry of a changelog, fills in the
//! fields of a new one and prepends it atomically. Change text comes from
//! the [`ReleaseCorrelator`], which walks merged merge requests to find what
//! landed on the main branch since its last promotion.

mod correlator;
mod deriver;
mod document;
mod engine;
pub mod formatter;
pub mod manifest;
pub mod parser;
pub mod types;
mod validation;

pub use correlator::{change_line, Correlation, ReleaseChanges, ReleaseCorrelator, NO_RECENT_MERGES};
pub use deriver::{ChangesProvider, RecordDeriver};
pub use document::{atomic_rewrite, ChangelogFile};
pub use engine::ChangelogEngine;
pub use formatter::{format_date, render, DATE_FORMAT};
pub use parser::{read_record, records, Records, Result};
pub use types::{ChangelogRecord, RecordDraft};

pub use gitlab_tool_core::ChangelogError;
