//! Field derivation for new changelog entries
//!
//! Every field left empty in a [`RecordDraft`] is filled from, in order, the
//! previous entry, a fallback source and a configured default:
//!
//! | field      | previous | fallback                  | otherwise            |
//! |------------|----------|---------------------------|----------------------|
//! | package    | yes      | `Package:` in the manifest| `PackageNotFound`    |
//! | version    | yes      |                           | `MissingVersion`     |
//! | release    | yes      |                           | default release      |
//! | urgency    | yes      |                           | default urgency      |
//! | maintainer | yes      |                           | `MissingMaintainer`  |
//! | date       | never    | the deriver's clock       |                      |
//! | changes    | never    | the changes provider      | placeholder text     |
//!
//! Changes are derived last so that a draft missing a required field fails
//! before any network traffic. The finished record is checked against the
//! entry grammar; a value that would not read back is `InvalidField`.

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Local};
use tracing::{debug, warn};

use gitlab_tool_api::FetchError;
use gitlab_tool_core::{ChangelogConfig, ChangelogError};

use crate::formatter::format_date;
use crate::manifest;
use crate::parser::Result;
use crate::types::{ChangelogRecord, RecordDraft};
use crate::validation::{check_fields, normalize_changes};

/// Source of change text for a new entry
#[async_trait]
pub trait ChangesProvider: Send + Sync {
    /// Change lines describing what happened since `previous`
    async fn changes(
        &self,
        previous: Option<&ChangelogRecord>,
    ) -> std::result::Result<String, FetchError>;
}

/// Fills in a draft's missing fields
#[derive(Debug, Clone)]
pub struct RecordDeriver {
    config: ChangelogConfig,
    now: DateTime<FixedOffset>,
}

impl RecordDeriver {
    /// Deriver using the local clock at construction time
    pub fn new(config: ChangelogConfig) -> Self {
        Self {
            config,
            now: Local::now().fixed_offset(),
        }
    }

    /// Use a fixed "now" for the date field
    pub fn with_clock(mut self, now: DateTime<FixedOffset>) -> Self {
        self.now = now;
        self
    }

    pub fn config(&self) -> &ChangelogConfig {
        &self.config
    }

    /// Produce a complete record from `draft`.
    ///
    /// A missing or failing `changes` provider is not an error: the
    /// configured placeholder is used instead.
    pub async fn derive(
        &self,
        previous: Option<&ChangelogRecord>,
        draft: RecordDraft,
        changes: Option<&dyn ChangesProvider>,
    ) -> Result<ChangelogRecord> {
        let package = match draft.package.or_else(|| previous.map(|p| p.package.clone())) {
            Some(package) => package,
            None => manifest::package_name(&self.config.control_file).ok_or_else(|| {
                ChangelogError::PackageNotFound {
                    manifest: self.config.control_file.clone(),
                }
            })?,
        };

        let version = draft
            .version
            .or_else(|| from_previous(previous, |p| &p.version))
            .ok_or(ChangelogError::MissingVersion)?;

        let release = draft
            .release
            .or_else(|| from_previous(previous, |p| &p.release))
            .unwrap_or_else(|| self.config.default_release.clone());

        let urgency = draft
            .urgency
            .or_else(|| from_previous(previous, |p| &p.urgency))
            .unwrap_or_else(|| self.config.default_urgency.clone());

        let maintainer = draft
            .maintainer
            .or_else(|| from_previous(previous, |p| &p.maintainer))
            .ok_or(ChangelogError::MissingMaintainer)?;

        let date = draft.date.unwrap_or_else(|| format_date(&self.now));

        let mut record = ChangelogRecord {
            package,
            version,
            release,
            urgency,
            changes: String::new(),
            maintainer,
            date,
        };
        check_fields(&record)?;

        record.changes = match draft.changes {
            Some(changes) => normalize_changes(&changes)?,
            None => self.derive_changes(previous, changes).await?,
        };

        debug!(
            package = %record.package,
            version = %record.version,
            release = %record.release,
            "derived changelog record"
        );
        Ok(record)
    }

    async fn derive_changes(
        &self,
        previous: Option<&ChangelogRecord>,
        provider: Option<&dyn ChangesProvider>,
    ) -> Result<String> {
        let Some(provider) = provider else {
            debug!("no changes source, using placeholder");
            return self.placeholder();
        };

        match provider.changes(previous).await {
            Ok(text) if !text.trim().is_empty() => match normalize_changes(&text) {
                Ok(changes) => Ok(changes),
                Err(e) => {
                    warn!(error = %e, "merge request text cannot be written, using placeholder changes");
                    self.placeholder()
                }
            },
            Ok(_) => self.placeholder(),
            Err(e) => {
                warn!(error = %e, "could not collect merge requests, using placeholder changes");
                self.placeholder()
            }
        }
    }

    fn placeholder(&self) -> Result<String> {
        normalize_changes(&self.config.placeholder_changes)
    }
}

/// Non-empty field of the previous record
fn from_previous<F>(previous: Option<&ChangelogRecord>, field: F) -> Option<String>
where
    F: Fn(&ChangelogRecord) -> &String,
{
    previous
        .map(field)
        .filter(|value| !value.trim().is_empty())
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    struct FixedChanges(&'static str);

    #[async_trait]
    impl ChangesProvider for FixedChanges {
        async fn changes(
            &self,
            _previous: Option<&ChangelogRecord>,
        ) -> std::result::Result<String, FetchError> {
            Ok(self.0.to_string())
        }
    }

    #[derive(Default)]
    struct FailingChanges {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ChangesProvider for FailingChanges {
        async fn changes(
            &self,
            _previous: Option<&ChangelogRecord>,
        ) -> std::result::Result<String, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(FetchError::Timeout("merge requests".to_string()))
        }
    }

    fn clock() -> DateTime<FixedOffset> {
        FixedOffset::east_opt(3600)
            .unwrap()
            .with_ymd_and_hms(2024, 6, 7, 12, 30, 0)
            .unwrap()
    }

    fn deriver(dir: &TempDir) -> RecordDeriver {
        let config = ChangelogConfig {
            control_file: dir.path().join("control"),
            ..ChangelogConfig::default()
        };
        RecordDeriver::new(config).with_clock(clock())
    }

    fn previous() -> ChangelogRecord {
        ChangelogRecord {
            package: "pkgA".to_string(),
            version: "1.0.0".to_string(),
            release: "stable".to_string(),
            urgency: "low".to_string(),
            changes: "  * fix".to_string(),
            maintainer: "A B <a@b.com>".to_string(),
            date: "Mon, 01 Jan 2024 00:00:00 +0000".to_string(),
        }
    }

    #[tokio::test]
    async fn test_fields_come_from_previous() {
        let dir = TempDir::new().unwrap();
        let prev = previous();
        let record = deriver(&dir)
            .derive(
                Some(&prev),
                RecordDraft::new().with_version("1.0.1"),
                Some(&FixedChanges("  * new")),
            )
            .await
            .unwrap();

        assert_eq!(record.package, "pkgA");
        assert_eq!(record.version, "1.0.1");
        assert_eq!(record.release, "stable");
        assert_eq!(record.urgency, "low");
        assert_eq!(record.maintainer, "A B <a@b.com>");
        assert_eq!(record.changes, "  * new");
        // never copied from the previous entry
        assert_eq!(record.date, "Fri, 07 Jun 2024 12:30:00 +0100");
    }

    #[tokio::test]
    async fn test_draft_values_win() {
        let dir = TempDir::new().unwrap();
        let prev = previous();
        let draft = RecordDraft {
            release: Some("unstable".to_string()),
            urgency: Some("high".to_string()),
            ..RecordDraft::new()
                .with_package("other")
                .with_version("2.0")
                .with_maintainer("C D <c@d.org>")
                .with_date("Sat, 01 Jun 2024 00:00:00 +0000")
                .with_changes("  * manual")
        };

        let provider = FailingChanges::default();
        let record = deriver(&dir)
            .derive(Some(&prev), draft, Some(&provider))
            .await
            .unwrap();

        assert_eq!(record.package, "other");
        assert_eq!(record.release, "unstable");
        assert_eq!(record.urgency, "high");
        assert_eq!(record.maintainer, "C D <c@d.org>");
        assert_eq!(record.date, "Sat, 01 Jun 2024 00:00:00 +0000");
        assert_eq!(record.changes, "  * manual");
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failing_provider_falls_back_to_placeholder() {
        let dir = TempDir::new().unwrap();
        let prev = previous();
        let provider = FailingChanges::default();
        let record = deriver(&dir)
            .derive(Some(&prev), RecordDraft::new().with_version("1.0.1"), Some(&provider))
            .await
            .unwrap();

        assert_eq!(record.changes, "  some changes were made");
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_no_provider_uses_placeholder() {
        let dir = TempDir::new().unwrap();
        let prev = previous();
        let record = deriver(&dir)
            .derive(Some(&prev), RecordDraft::new(), None)
            .await
            .unwrap();
        assert_eq!(record.changes, "  some changes were made");
        assert_eq!(record.version, "1.0.0");
    }

    #[tokio::test]
    async fn test_defaults_without_previous() {
        let dir = TempDir::new().unwrap();
        let draft = RecordDraft::new()
            .with_package("fresh")
            .with_version("0.1.0")
            .with_maintainer("A B <a@b.com>");
        let record = deriver(&dir).derive(None, draft, None).await.unwrap();
        assert_eq!(record.release, "UNRELEASED");
        assert_eq!(record.urgency, "medium");
    }

    #[tokio::test]
    async fn test_package_not_found() {
        let dir = TempDir::new().unwrap();
        let provider = FailingChanges::default();
        let err = deriver(&dir)
            .derive(None, RecordDraft::new().with_version("1.0"), Some(&provider))
            .await
            .unwrap_err();
        assert!(matches!(err, ChangelogError::PackageNotFound { .. }));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_package_from_manifest_then_missing_maintainer() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("control"), "Package: coolthing\n").unwrap();

        let provider = FailingChanges::default();
        let err = deriver(&dir)
            .derive(None, RecordDraft::new().with_version("1.0"), Some(&provider))
            .await
            .unwrap_err();
        assert!(matches!(err, ChangelogError::MissingMaintainer));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);

        let record = deriver(&dir)
            .derive(
                None,
                RecordDraft::new()
                    .with_version("1.0")
                    .with_maintainer("A B <a@b.com>"),
                None,
            )
            .await
            .unwrap();
        assert_eq!(record.package, "coolthing");
    }

    #[tokio::test]
    async fn test_missing_version() {
        let dir = TempDir::new().unwrap();
        let err = deriver(&dir)
            .derive(None, RecordDraft::new().with_package("p"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ChangelogError::MissingVersion));
    }

    #[tokio::test]
    async fn test_invalid_draft_field_fails_before_changes() {
        let dir = TempDir::new().unwrap();
        let prev = previous();
        let provider = FailingChanges::default();
        let err = deriver(&dir)
            .derive(
                Some(&prev),
                RecordDraft::new().with_maintainer("Jane Doe"),
                Some(&provider),
            )
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ChangelogError::InvalidField { field: "maintainer", .. }
        ));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_invalid_package_and_date() {
        let dir = TempDir::new().unwrap();
        let prev = previous();

        let err = deriver(&dir)
            .derive(Some(&prev), RecordDraft::new().with_package("my pkg"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ChangelogError::InvalidField { field: "package", .. }));

        let err = deriver(&dir)
            .derive(Some(&prev), RecordDraft::new().with_date("yesterday"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ChangelogError::InvalidField { field: "date", .. }));
    }

    #[tokio::test]
    async fn test_draft_changes_are_normalized() {
        let dir = TempDir::new().unwrap();
        let prev = previous();
        let record = deriver(&dir)
            .derive(
                Some(&prev),
                RecordDraft::new().with_changes("\r\n  * one\r\n  * two\r\n\r\n"),
                None,
            )
            .await
            .unwrap();
        assert_eq!(record.changes, "  * one\n  * two");
    }

    #[tokio::test]
    async fn test_draft_changes_with_a_trailer_line() {
        let dir = TempDir::new().unwrap();
        let prev = previous();
        let err = deriver(&dir)
            .derive(
                Some(&prev),
                RecordDraft::new()
                    .with_changes("  * one\n -- X <x@y.z>  Mon, 01 Jan 2024 00:00:00 +0000"),
                None,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ChangelogError::InvalidField { field: "changes", .. }));
    }

    #[tokio::test]
    async fn test_unwritable_provider_text_uses_placeholder() {
        let dir = TempDir::new().unwrap();
        let prev = previous();
        let record = deriver(&dir)
            .derive(
                Some(&prev),
                RecordDraft::new(),
                Some(&FixedChanges("other (2.0) stable; urgency=low")),
            )
            .await
            .unwrap();
        assert_eq!(record.changes, "  some changes were made");
    }

    #[tokio::test]
    async fn test_derivation_is_repeatable() {
        let dir = TempDir::new().unwrap();
        let prev = previous();
        let deriver = deriver(&dir);
        let draft = RecordDraft::new().with_version("1.0.1");

        let first = deriver
            .derive(Some(&prev), draft.clone(), Some(&FixedChanges("  * x")))
            .await
            .unwrap();
        let second = deriver
            .derive(Some(&prev), draft, Some(&FixedChanges("  * x")))
            .await
            .unwrap();
        assert_eq!(first, second);
    }
}
