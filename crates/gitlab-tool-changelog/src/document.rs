//! Changelog file access
//!
//! Reads go through the streaming parser. Writes build the complete new
//! document in a temporary file next to the changelog and rename it over the
//! original, so a failed write never leaves a partial file behind. There is
//! no locking: two processes prepending to the same file at once can lose
//! one of the entries.

use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, BufWriter, Cursor, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, info};

use gitlab_tool_core::ChangelogError;

use crate::formatter::render;
use crate::parser::{self, Records, Result};
use crate::types::ChangelogRecord;

/// A changelog document on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangelogFile {
    path: PathBuf,
}

impl ChangelogFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Open for reading; a missing file reads as an empty document
    fn open(&self) -> Result<Box<dyn BufRead>> {
        match File::open(&self.path) {
            Ok(file) => Ok(Box::new(BufReader::new(file))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "changelog does not exist yet");
                Ok(Box::new(Cursor::new(Vec::new())))
            }
            Err(e) => Err(ChangelogError::Io(e)),
        }
    }

    /// Entry at `index`, 0 being the most recent
    pub fn read_record(&self, index: usize) -> Result<ChangelogRecord> {
        parser::read_record(self.open()?, index)
    }

    /// Every entry, most recent first
    pub fn records(&self) -> Result<Records<Box<dyn BufRead>>> {
        Ok(parser::records(self.open()?))
    }

    /// Write `record` in front of the current content, creating the file if
    /// needed
    pub fn prepend(&self, record: &ChangelogRecord) -> Result<()> {
        let rendered = render(record);
        let original = match File::open(&self.path) {
            Ok(file) => Some(BufReader::new(file)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(source) => {
                return Err(ChangelogError::WriteError {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        atomic_rewrite(&self.path, |out| {
            out.write_all(rendered.as_bytes())?;
            if let Some(reader) = original {
                copy_lines(reader, out)?;
            }
            Ok(())
        })?;

        info!(
            path = %self.path.display(),
            version = %record.version,
            "prepended changelog entry"
        );
        Ok(())
    }
}

/// Copy lines, terminating each with a single `\n`
fn copy_lines<R: BufRead>(mut reader: R, out: &mut dyn Write) -> io::Result<()> {
    let mut line = Vec::new();
    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line)? == 0 {
            return Ok(());
        }
        while matches!(line.last(), Some(b'\n' | b'\r')) {
            line.pop();
        }
        out.write_all(&line)?;
        out.write_all(b"\n")?;
    }
}

/// Replace `path` with whatever `fill` writes.
///
/// The content goes to a temporary file in the same directory which is
/// flushed, synced and renamed over `path`. If any step fails the temporary
/// file is removed and `path` keeps its previous content.
pub fn atomic_rewrite<F>(path: &Path, fill: F) -> Result<()>
where
    F: FnOnce(&mut dyn Write) -> io::Result<()>,
{
    let write_error = |source| ChangelogError::WriteError {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    if !dir.exists() {
        debug!(dir = %dir.display(), "creating changelog directory");
        fs::create_dir_all(dir).map_err(write_error)?;
    }

    let mut temp = NamedTempFile::new_in(dir).map_err(write_error)?;
    {
        let mut writer = BufWriter::new(temp.as_file_mut());
        fill(&mut writer).map_err(write_error)?;
        writer.flush().map_err(write_error)?;
    }
    temp.as_file().sync_all().map_err(write_error)?;

    if let Ok(metadata) = fs::metadata(path) {
        fs::set_permissions(temp.path(), metadata.permissions()).map_err(write_error)?;
    }

    debug!(path = %path.display(), "replacing file atomically");
    temp.persist(path).map_err(|e| write_error(e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const EXISTING: &str = "\
mypkg (1.2.3) stable; urgency=medium

  * did a thing

 -- Jane Doe <jane@example.com>  Mon, 01 Jan 2024 10:00:00 +0000
";

    fn record(version: &str) -> ChangelogRecord {
        ChangelogRecord {
            package: "mypkg".to_string(),
            version: version.to_string(),
            release: "stable".to_string(),
            urgency: "medium".to_string(),
            changes: "  * new thing".to_string(),
            maintainer: "Jane Doe <jane@example.com>".to_string(),
            date: "Tue, 02 Jan 2024 10:00:00 +0000".to_string(),
        }
    }

    fn dir_entries(dir: &Path) -> usize {
        fs::read_dir(dir).unwrap().count()
    }

    #[test]
    fn test_prepend_keeps_previous_content() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("changelog");
        fs::write(&path, EXISTING).unwrap();

        let file = ChangelogFile::new(&path);
        file.prepend(&record("1.2.4")).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("mypkg (1.2.4) stable; urgency=medium\n\n  * new thing\n"));
        assert!(content.ends_with(EXISTING));
        assert_eq!(file.read_record(0).unwrap().version, "1.2.4");
        assert_eq!(file.read_record(1).unwrap().version, "1.2.3");
        assert_eq!(dir_entries(dir.path()), 1);
    }

    #[test]
    fn test_prepend_normalizes_line_endings() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("changelog");
        fs::write(&path, EXISTING.replace('\n', "\r\n")).unwrap();

        ChangelogFile::new(&path).prepend(&record("1.2.4")).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(!content.contains('\r'));
        assert!(content.ends_with(EXISTING));
    }

    #[test]
    fn test_prepend_creates_missing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("debian").join("changelog");

        let file = ChangelogFile::new(&path);
        assert!(!file.exists());
        file.prepend(&record("0.1.0")).unwrap();

        assert!(file.exists());
        assert_eq!(file.read_record(0).unwrap(), record("0.1.0"));
    }

    #[test]
    fn test_missing_file_reads_as_empty() {
        let dir = TempDir::new().unwrap();
        let file = ChangelogFile::new(dir.path().join("changelog"));

        assert!(matches!(
            file.read_record(0),
            Err(ChangelogError::NotFound { index: 0, .. })
        ));
        assert_eq!(file.records().unwrap().count(), 0);
    }

    #[test]
    fn test_failed_fill_leaves_original_untouched() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("changelog");
        fs::write(&path, EXISTING).unwrap();

        let err = atomic_rewrite(&path, |out| {
            out.write_all(b"half an entr")?;
            Err(io::Error::new(io::ErrorKind::Other, "disk full"))
        })
        .unwrap_err();

        assert!(matches!(err, ChangelogError::WriteError { .. }));
        assert!(err.to_string().contains("disk full"));
        assert_eq!(fs::read_to_string(&path).unwrap(), EXISTING);
        // temporary file cleaned up
        assert_eq!(dir_entries(dir.path()), 1);
    }

    #[test]
    fn test_rename_onto_directory_fails_cleanly() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("changelog");
        fs::create_dir(&path).unwrap();
        fs::write(path.join("keep"), "x").unwrap();

        let err = ChangelogFile::new(&path).prepend(&record("1.0")).unwrap_err();
        assert!(matches!(
            err,
            ChangelogError::WriteError { .. } | ChangelogError::Io(_)
        ));
        assert!(path.join("keep").exists());
        assert_eq!(dir_entries(dir.path()), 1);
    }

    #[test]
    fn test_records_lists_all_entries() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("changelog");
        fs::write(&path, EXISTING).unwrap();
        let file = ChangelogFile::new(&path);
        file.prepend(&record("1.2.4")).unwrap();

        let versions: Vec<String> = file
            .records()
            .unwrap()
            .map(|r| r.unwrap().version)
            .collect();
        assert_eq!(versions, vec!["1.2.4", "1.2.3"]);
    }
}
