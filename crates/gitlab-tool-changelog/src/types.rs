//! Changelog record types

use serde::{Deserialize, Serialize};

/// One versioned entry of a Debian changelog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangelogRecord {
    /// Source package name
    pub package: String,
    /// Version token, free form
    pub version: String,
    /// Distribution, e.g. `stable` or `UNRELEASED`
    pub release: String,
    /// Urgency, e.g. `low` or `medium`
    pub urgency: String,
    /// Change lines, without the surrounding blank lines
    pub changes: String,
    /// `Name <email>`
    pub maintainer: String,
    /// RFC 2822 date with numeric zone
    pub date: String,
}

/// A record under construction; `None` fields are derived later
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordDraft {
    pub package: Option<String>,
    pub version: Option<String>,
    pub release: Option<String>,
    pub urgency: Option<String>,
    pub changes: Option<String>,
    pub maintainer: Option<String>,
    pub date: Option<String>,
}

impl RecordDraft {
    /// Empty draft
    pub fn new() -> Self {
        Self::default()
    }

    /// Draft from optional values, treating blank strings as absent.
    ///
    /// Single-line fields are trimmed; change text keeps its indentation.
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        package: Option<String>,
        version: Option<String>,
        release: Option<String>,
        urgency: Option<String>,
        changes: Option<String>,
        maintainer: Option<String>,
        date: Option<String>,
    ) -> Self {
        Self {
            package: trimmed(package),
            version: trimmed(version),
            release: trimmed(release),
            urgency: trimmed(urgency),
            changes: changes.filter(|v| !v.trim().is_empty()),
            maintainer: trimmed(maintainer),
            date: trimmed(date),
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_package(mut self, package: impl Into<String>) -> Self {
        self.package = Some(package.into());
        self
    }

    pub fn with_changes(mut self, changes: impl Into<String>) -> Self {
        self.changes = Some(changes.into());
        self
    }

    pub fn with_maintainer(mut self, maintainer: impl Into<String>) -> Self {
        self.maintainer = Some(maintainer.into());
        self
    }

    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
