//! Adding entries to a changelog file

use tracing::{info, instrument, warn};

use gitlab_tool_core::{ChangelogConfig, ChangelogError};

use crate::deriver::{ChangesProvider, RecordDeriver};
use crate::document::ChangelogFile;
use crate::parser::Result;
use crate::types::{ChangelogRecord, RecordDraft};

/// Reads the previous entry, derives the new one and prepends it
pub struct ChangelogEngine {
    file: ChangelogFile,
    deriver: RecordDeriver,
}

impl ChangelogEngine {
    /// Engine for the configured changelog file
    pub fn new(config: &ChangelogConfig) -> Self {
        Self {
            file: ChangelogFile::new(&config.file),
            deriver: RecordDeriver::new(config.clone()),
        }
    }

    pub fn with_file(mut self, file: ChangelogFile) -> Self {
        self.file = file;
        self
    }

    pub fn with_deriver(mut self, deriver: RecordDeriver) -> Self {
        self.deriver = deriver;
        self
    }

    pub fn file(&self) -> &ChangelogFile {
        &self.file
    }

    /// Most recent entry, if the document has a readable one
    pub fn previous(&self) -> Result<Option<ChangelogRecord>> {
        match self.file.read_record(0) {
            Ok(record) => Ok(Some(record)),
            Err(ChangelogError::NotFound { reason, .. }) => {
                warn!(
                    path = %self.file.path().display(),
                    %reason,
                    "no previous changelog entry"
                );
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Derive the next entry without writing it
    pub async fn preview(
        &self,
        draft: RecordDraft,
        changes: Option<&dyn ChangesProvider>,
    ) -> Result<ChangelogRecord> {
        let previous = self.previous()?;
        self.deriver.derive(previous.as_ref(), draft, changes).await
    }

    /// Derive the next entry and prepend it to the file
    #[instrument(skip_all, fields(path = %self.file.path().display()))]
    pub async fn add(
        &self,
        draft: RecordDraft,
        changes: Option<&dyn ChangesProvider>,
    ) -> Result<ChangelogRecord> {
        let record = self.preview(draft, changes).await?;
        self.file.prepend(&record)?;
        info!(package = %record.package, version = %record.version, "added changelog entry");
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{FixedOffset, TimeZone};
    use gitlab_tool_api::testing::{merge_request, InMemoryApi};
    use gitlab_tool_api::FetchError;
    use gitlab_tool_core::{BranchConfig, PaginationConfig};
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    use crate::correlator::{ReleaseChanges, ReleaseCorrelator};

    const SCENARIO_ONE: &str = "pkgA (1.0.0) stable; urgency=low\n\n  * fix\n\n -- A B <a@b.com>  Mon, 01 Jan 2024 00:00:00 +0000\n\n";

    struct Unreachable;

    #[async_trait]
    impl ChangesProvider for Unreachable {
        async fn changes(
            &self,
            _previous: Option<&ChangelogRecord>,
        ) -> std::result::Result<String, FetchError> {
            Err(FetchError::Api {
                status: 503,
                message: "unavailable".to_string(),
            })
        }
    }

    fn engine(dir: &Path) -> ChangelogEngine {
        let config = ChangelogConfig {
            file: dir.join("changelog"),
            control_file: dir.join("control"),
            ..ChangelogConfig::default()
        };
        let now = FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2024, 2, 3, 4, 5, 6)
            .unwrap();
        ChangelogEngine::new(&config).with_deriver(RecordDeriver::new(config).with_clock(now))
    }

    #[tokio::test]
    async fn test_add_derives_from_previous_entry() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("changelog"), SCENARIO_ONE).unwrap();

        let record = engine(dir.path())
            .add(RecordDraft::new().with_version("1.0.1"), Some(&Unreachable))
            .await
            .unwrap();

        assert_eq!(record.package, "pkgA");
        assert_eq!(record.release, "stable");
        assert_eq!(record.urgency, "low");
        assert_eq!(record.maintainer, "A B <a@b.com>");
        assert_eq!(record.date, "Sat, 03 Feb 2024 04:05:06 +0000");
        assert_eq!(record.changes, "  some changes were made");

        let content = fs::read_to_string(dir.path().join("changelog")).unwrap();
        assert_eq!(
            content,
            format!(
                "pkgA (1.0.1) stable; urgency=low\n\n  some changes were made\n\n -- A B <a@b.com>  Sat, 03 Feb 2024 04:05:06 +0000\n\n{}",
                SCENARIO_ONE
            )
        );
    }

    #[tokio::test]
    async fn test_add_without_package_leaves_file_alone() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("changelog");
        fs::write(&path, "").unwrap();

        let err = engine(dir.path())
            .add(RecordDraft::new().with_version("1.0"), Some(&Unreachable))
            .await
            .unwrap_err();

        assert!(matches!(err, ChangelogError::PackageNotFound { .. }));
        assert_eq!(fs::read_to_string(&path).unwrap(), "");
    }

    #[tokio::test]
    async fn test_add_without_package_does_not_create_file() {
        let dir = TempDir::new().unwrap();
        let err = engine(dir.path())
            .add(RecordDraft::new().with_version("1.0"), None)
            .await
            .unwrap_err();

        assert!(matches!(err, ChangelogError::PackageNotFound { .. }));
        assert!(!dir.path().join("changelog").exists());
    }

    #[tokio::test]
    async fn test_add_with_manifest_still_needs_maintainer() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("control"), "Package: coolthing\n").unwrap();
        fs::write(dir.path().join("changelog"), "").unwrap();

        let err = engine(dir.path())
            .add(RecordDraft::new().with_version("2.0"), None)
            .await
            .unwrap_err();

        assert!(matches!(err, ChangelogError::MissingMaintainer));
        assert_eq!(
            fs::read_to_string(dir.path().join("changelog")).unwrap(),
            ""
        );
    }

    #[tokio::test]
    async fn test_preview_does_not_write() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("changelog"), SCENARIO_ONE).unwrap();

        let engine = engine(dir.path());
        let first = engine
            .preview(RecordDraft::new().with_version("1.0.1"), None)
            .await
            .unwrap();
        let second = engine
            .preview(RecordDraft::new().with_version("1.0.1"), None)
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(
            fs::read_to_string(dir.path().join("changelog")).unwrap(),
            SCENARIO_ONE
        );
    }

    #[tokio::test]
    async fn test_add_with_correlated_changes() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("changelog"), SCENARIO_ONE).unwrap();

        let api = InMemoryApi::new().with_merge_requests(
            "master",
            vec![
                merge_request(8, "feature", "master", "8888888888"),
                merge_request(7, "feature", "master", "7777777777"),
            ],
        );
        let correlator =
            ReleaseCorrelator::new(&api, BranchConfig::default(), PaginationConfig::default());
        let provider = ReleaseChanges::new(correlator, "group/pkgA");

        let engine = engine(dir.path());
        let record = engine
            .add(RecordDraft::new().with_version("1.1.0"), Some(&provider))
            .await
            .unwrap();

        assert_eq!(
            record.changes,
            "  * Change 8 (!8, 88888888)\n  * Change 7 (!7, 77777777)"
        );
        assert_eq!(engine.file().read_record(0).unwrap(), record);
        assert_eq!(engine.file().read_record(1).unwrap().version, "1.0.0");
    }

    #[tokio::test]
    async fn test_rejected_field_keeps_history_readable() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("changelog"), SCENARIO_ONE).unwrap();
        let engine = engine(dir.path());

        let err = engine
            .add(
                RecordDraft::new()
                    .with_version("1.0.1")
                    .with_maintainer("Jane Doe"),
                None,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ChangelogError::InvalidField { field: "maintainer", .. }));
        assert_eq!(
            fs::read_to_string(dir.path().join("changelog")).unwrap(),
            SCENARIO_ONE
        );

        let record = engine
            .add(RecordDraft::new().with_version("1.1"), None)
            .await
            .unwrap();
        assert_eq!(record.package, "pkgA");
        assert_eq!(engine.file().read_record(0).unwrap(), record);
        assert_eq!(engine.file().read_record(1).unwrap().version, "1.0.0");
    }

    #[tokio::test]
    async fn test_previous_entry_with_invalid_utf8() {
        let dir = TempDir::new().unwrap();
        // latin-1 "café" in an otherwise UTF-8 document
        let mut bytes = SCENARIO_ONE.replace("fix", "caf\u{1}").into_bytes();
        let marker = bytes.iter().position(|b| *b == 1).unwrap();
        bytes[marker] = 0xE9;
        fs::write(dir.path().join("changelog"), &bytes).unwrap();

        let engine = engine(dir.path());
        let previous = engine.previous().unwrap().unwrap();
        assert_eq!(previous.changes, "  * caf\u{FFFD}");

        engine
            .add(RecordDraft::new().with_version("1.0.1"), None)
            .await
            .unwrap();
        let written = fs::read(dir.path().join("changelog")).unwrap();
        assert!(written.ends_with(&bytes));
    }

    #[tokio::test]
    async fn test_malformed_previous_entry_is_a_warning() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("changelog"), "not a changelog\n").unwrap();

        let engine = engine(dir.path());
        assert!(engine.previous().unwrap().is_none());
    }
}
