//! Package manifest lookup (`debian/control`)

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::debug;

const PACKAGE_FIELD: &str = "Package:";

/// Package name from the first `Package:` line of a manifest.
///
/// A missing or unreadable file, or one without such a line, yields `None`.
pub fn package_name(path: &Path) -> Option<String> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "manifest not readable");
            return None;
        }
    };
    package_name_from(BufReader::new(file))
}

/// See [`package_name`]
pub fn package_name_from<R: BufRead>(reader: R) -> Option<String> {
    reader
        .lines()
        .map_while(|line| line.ok())
        .find_map(|line| {
            line.strip_prefix(PACKAGE_FIELD)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::TempDir;

    #[test]
    fn test_first_package_line_wins() {
        let control = "Source: mypkg-src\nMaintainer: A <a@b>\n\nPackage: mypkg\nArchitecture: any\n\nPackage: mypkg-doc\n";
        assert_eq!(
            package_name_from(Cursor::new(control)),
            Some("mypkg".to_string())
        );
    }

    #[test]
    fn test_value_is_trimmed() {
        assert_eq!(
            package_name_from(Cursor::new("Package:    spaced  \r\n")),
            Some("spaced".to_string())
        );
    }

    #[test]
    fn test_no_package_line() {
        assert_eq!(package_name_from(Cursor::new("Source: x\n")), None);
        assert_eq!(package_name_from(Cursor::new(" Package: indented\n")), None);
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        assert_eq!(package_name(&dir.path().join("control")), None);
    }

    #[test]
    fn test_reads_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("control");
        std::fs::write(&path, "Package: from-file\n").unwrap();
        assert_eq!(package_name(&path), Some("from-file".to_string()));
    }
}
