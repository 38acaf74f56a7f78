//! Checks that a new entry reads back with the same fields
//!
//! Values are checked against the grammar the parser accepts, so a written
//! entry never hides the history below it.

use chrono::DateTime;

use gitlab_tool_core::ChangelogError;

use crate::formatter::{header_line, trailer_line};
use crate::parser::{parse_header, parse_trailer, trim_blank_edges, Result, DATE_REGEX};
use crate::types::ChangelogRecord;

fn invalid(field: &'static str, value: &str) -> ChangelogError {
    ChangelogError::InvalidField {
        field,
        value: value.to_string(),
    }
}

/// Check every header and trailer field of `record`; changes are not looked at
pub fn check_fields(record: &ChangelogRecord) -> Result<()> {
    let single_line = [
        ("package", &record.package),
        ("version", &record.version),
        ("release", &record.release),
        ("urgency", &record.urgency),
        ("maintainer", &record.maintainer),
        ("date", &record.date),
    ];
    for (field, value) in single_line {
        if value.contains(['\n', '\r']) {
            return Err(invalid(field, value));
        }
    }

    if record.package.is_empty() || record.package.contains(char::is_whitespace) {
        return Err(invalid("package", &record.package));
    }
    if record.version.trim().is_empty() {
        return Err(invalid("version", &record.version));
    }
    if record.release.contains(';') {
        return Err(invalid("release", &record.release));
    }
    if !DATE_REGEX.is_match(&record.date) || DateTime::parse_from_rfc2822(&record.date).is_err() {
        return Err(invalid("date", &record.date));
    }

    let header = parse_header(&header_line(record));
    let header_fields = [
        ("package", &record.package, header.as_ref().map(|h| &h.package)),
        ("version", &record.version, header.as_ref().map(|h| &h.version)),
        ("release", &record.release, header.as_ref().map(|h| &h.release)),
        ("urgency", &record.urgency, header.as_ref().map(|h| &h.urgency)),
    ];
    for (field, value, read_back) in header_fields {
        if read_back != Some(value) {
            return Err(invalid(field, value));
        }
    }

    // the date is known to be good here, so a failed read is the maintainer's
    let trailer = parse_trailer(&trailer_line(record));
    let trailer_fields = [
        ("maintainer", &record.maintainer, trailer.as_ref().map(|t| &t.maintainer)),
        ("date", &record.date, trailer.as_ref().map(|t| &t.date)),
    ];
    for (field, value, read_back) in trailer_fields {
        if read_back != Some(value) {
            return Err(invalid(field, value));
        }
    }

    Ok(())
}

/// Bring change text into the form it is read back as.
///
/// Line endings become `\n` and blank lines at either end are dropped. A line
/// that would be taken for an entry header or trailer is rejected.
pub fn normalize_changes(changes: &str) -> Result<String> {
    let unified = changes.replace("\r\n", "\n").replace('\r', "\n");
    let lines: Vec<String> = unified.split('\n').map(str::to_string).collect();

    for line in &lines {
        if parse_header(line).is_some() || parse_trailer(line).is_some() {
            return Err(invalid("changes", line));
        }
    }

    Ok(trim_blank_edges(&lines))
}
