//! Streaming Debian changelog parser
//!
//! Entries are recognized line by line with a small state machine instead of
//! one regex over the whole document, so looking up the n-th entry reads the
//! file once and only buffers the body of the entry being returned.
//!
//! ```text
//! <package> (<version>) <release>; urgency=<urgency>
//!
//!   * change
//!
//!  -- <maintainer>  <date>
//! ```
//!
//! Reading is lenient about layout: extra blank lines around the changes and
//! CRLF endings are accepted but not kept, so rendering a parsed entry gives
//! the canonical form above.

use std::io::BufRead;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, trace};

use gitlab_tool_core::ChangelogError;

use crate::types::ChangelogRecord;

/// Result type for changelog operations
pub type Result<T> = std::result::Result<T, ChangelogError>;

static HEADER_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<package>\S+)\s+\((?P<version>.+)\)\s*(?P<release>[^;]*?)\s*;\s*urgency=(?P<urgency>.*?)\s*$",
    )
    .expect("Invalid regex")
});

const MAINTAINER_PATTERN: &str = r".+<[^<>\s]+>";
const DATE_PATTERN: &str = r"\w+,\s+\d+\s+\w+\s+\d+\s+[\d:]+\s+[+-]\d{4}";

static TRAILER_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"^\s+--\s+(?P<maintainer>{MAINTAINER_PATTERN})\s+(?P<date>{DATE_PATTERN})\s*$"
    ))
    .expect("Invalid regex")
});

/// A trailer date on its own
pub(crate) static DATE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!("^{DATE_PATTERN}$")).expect("Invalid regex"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Header {
    pub(crate) package: String,
    pub(crate) version: String,
    pub(crate) release: String,
    pub(crate) urgency: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Trailer {
    pub(crate) maintainer: String,
    pub(crate) date: String,
}

pub(crate) fn parse_header(line: &str) -> Option<Header> {
    let caps = HEADER_REGEX.captures(line)?;
    Some(Header {
        package: caps.name("package")?.as_str().to_string(),
        version: caps.name("version")?.as_str().to_string(),
        release: caps.name("release")?.as_str().to_string(),
        urgency: caps.name("urgency")?.as_str().to_string(),
    })
}

pub(crate) fn parse_trailer(line: &str) -> Option<Trailer> {
    let caps = TRAILER_REGEX.captures(line)?;
    Some(Trailer {
        maintainer: caps.name("maintainer")?.as_str().trim().to_string(),
        date: caps.name("date")?.as_str().to_string(),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Skipping blank lines until an entry header
    SeekHeader,
    /// Inside the wanted entry, buffering change lines
    InChanges,
    /// Inside an entry being skipped, only looking for its trailer
    SeekTrailer,
    Done,
}

/// Why a scan stopped without producing an entry
#[derive(Debug, Clone, PartialEq, Eq)]
struct ScanError {
    line: usize,
    reason: &'static str,
}

/// Line-by-line entry scanner over any buffered reader
struct EntryScanner<R> {
    reader: R,
    buf: Vec<u8>,
    line_no: usize,
}

impl<R: BufRead> EntryScanner<R> {
    fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
            line_no: 0,
        }
    }

    /// Next line with any `\n` / `\r\n` terminator removed. Bytes that are
    /// not UTF-8 are replaced rather than failing the whole document.
    fn read_line(&mut self) -> std::io::Result<Option<String>> {
        self.buf.clear();
        if self.reader.read_until(b'\n', &mut self.buf)? == 0 {
            return Ok(None);
        }
        self.line_no += 1;
        let line = String::from_utf8_lossy(&self.buf);
        Ok(Some(
            line.trim_end_matches('\n').trim_end_matches('\r').to_string(),
        ))
    }

    /// Scan the next entry. With `capture` unset the body is not buffered and
    /// the returned record has empty changes.
    fn next_entry(
        &mut self,
        capture: bool,
    ) -> std::io::Result<std::result::Result<Option<ChangelogRecord>, ScanError>> {
        let mut state = State::SeekHeader;
        let mut header = None;
        let mut trailer = None;
        let mut body: Vec<String> = Vec::new();

        while state != State::Done {
            let Some(line) = self.read_line()? else {
                return Ok(match state {
                    State::SeekHeader => Ok(None),
                    _ => Err(ScanError {
                        line: self.line_no,
                        reason: "document ends before the entry trailer",
                    }),
                });
            };

            match state {
                State::SeekHeader => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    match parse_header(&line) {
                        Some(h) => {
                            trace!(line = self.line_no, package = %h.package, "entry header");
                            header = Some(h);
                            state = if capture {
                                State::InChanges
                            } else {
                                State::SeekTrailer
                            };
                        }
                        None => {
                            return Ok(Err(ScanError {
                                line: self.line_no,
                                reason: "expected an entry header",
                            }))
                        }
                    }
                }
                State::InChanges | State::SeekTrailer => {
                    if let Some(t) = parse_trailer(&line) {
                        trailer = Some(t);
                        state = State::Done;
                    } else if parse_header(&line).is_some() {
                        return Ok(Err(ScanError {
                            line: self.line_no,
                            reason: "new entry header before the trailer",
                        }));
                    } else if state == State::InChanges {
                        body.push(line);
                    }
                }
                State::Done => {}
            }
        }

        let (Some(header), Some(trailer)) = (header, trailer) else {
            return Ok(Err(ScanError {
                line: self.line_no,
                reason: "incomplete entry",
            }));
        };

        Ok(Ok(Some(ChangelogRecord {
            package: header.package,
            version: header.version,
            release: header.release,
            urgency: header.urgency,
            changes: trim_blank_edges(&body),
            maintainer: trailer.maintainer,
            date: trailer.date,
        })))
    }
}

/// Join change lines, dropping blank lines at either end
pub(crate) fn trim_blank_edges(lines: &[String]) -> String {
    let start = lines.iter().position(|l| !l.trim().is_empty());
    let end = lines.iter().rposition(|l| !l.trim().is_empty());
    match (start, end) {
        (Some(start), Some(end)) => lines[start..=end].join("\n"),
        _ => String::new(),
    }
}

/// Read the entry at `index` (0 = most recent).
///
/// Fails with [`ChangelogError::NotFound`] when the document has fewer
/// entries or is malformed before the wanted entry is complete.
pub fn read_record<R: BufRead>(reader: R, index: usize) -> Result<ChangelogRecord> {
    let mut scanner = EntryScanner::new(reader);

    for seen in 0..=index {
        let capture = seen == index;
        match scanner.next_entry(capture)? {
            Ok(Some(record)) if capture => {
                debug!(index, version = %record.version, "read changelog entry");
                return Ok(record);
            }
            Ok(Some(_)) => {}
            Ok(None) => {
                return Err(ChangelogError::not_found(
                    index,
                    format!("document has {} entries", seen),
                ))
            }
            Err(e) => {
                return Err(ChangelogError::not_found(
                    index,
                    format!("{} at line {}", e.reason, e.line),
                ))
            }
        }
    }

    Err(ChangelogError::not_found(index, "no entry"))
}

/// Iterator over every entry of a document, most recent first.
///
/// A malformed entry yields one `NotFound` error and ends the iteration.
pub fn records<R: BufRead>(reader: R) -> Records<R> {
    Records {
        scanner: EntryScanner::new(reader),
        index: 0,
        finished: false,
    }
}

/// See [`records`]
pub struct Records<R> {
    scanner: EntryScanner<R>,
    index: usize,
    finished: bool,
}

impl<R: BufRead> Iterator for Records<R> {
    type Item = Result<ChangelogRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let index = self.index;
        self.index += 1;

        let outcome = match self.scanner.next_entry(true) {
            Ok(Ok(Some(record))) => return Some(Ok(record)),
            Ok(Ok(None)) => None,
            Ok(Err(e)) => Some(Err(ChangelogError::not_found(
                index,
                format!("{} at line {}", e.reason, e.line),
            ))),
            Err(e) => Some(Err(ChangelogError::Io(e))),
        };
        self.finished = true;
        outcome
    }
}
