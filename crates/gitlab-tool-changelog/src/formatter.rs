//! Changelog entry rendering

use chrono::{DateTime, TimeZone};

use crate::types::ChangelogRecord;

/// `Mon, 02 Jan 2024 15:04:05 +0000`
pub const DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S %z";

/// Format a timestamp the way changelog trailers expect
pub fn format_date<Tz>(date: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    date.format(DATE_FORMAT).to_string()
}

/// `<package> (<version>) <release>; urgency=<urgency>`
pub(crate) fn header_line(record: &ChangelogRecord) -> String {
    format!(
        "{} ({}) {}; urgency={}",
        record.package, record.version, record.release, record.urgency
    )
}

/// ` -- <maintainer>  <date>`
pub(crate) fn trailer_line(record: &ChangelogRecord) -> String {
    format!(" -- {}  {}", record.maintainer, record.date)
}

/// Render a record with the fixed entry template.
///
/// The output ends with a blank line so that prior entries can follow it
/// directly.
pub fn render(record: &ChangelogRecord) -> String {
    format!(
        "{}\n\n{}\n\n{}\n\n",
        header_line(record),
        record.changes,
        trailer_line(record)
    )
}
