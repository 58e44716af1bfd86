//! Classification of assembled database lines: date tags, section markers and
//! `key = value` assignments.

use chrono::{DateTime, Datelike, Local, NaiveDate, NaiveDateTime};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::warn;

lazy_static! {
    // content of the first bracket pair, at least 11 characters long
    static ref DATE_TAG: Regex = Regex::new(r"^[^\[]*\[([^\]]{11,})\]").unwrap();
    // the first '[' is followed by something other than ']' and closed later on
    static ref MARKER: Regex = Regex::new(r"^[^\[]*\[[^\]].*\]").unwrap();
}

/// Date tags before this year are rejected, and it is the governing date of
/// any assignment that precedes the first tag in a file.
pub const EARLIEST_YEAR: i32 = 1995;

/// The governing date before any date tag has been seen.
pub fn earliest() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(EARLIEST_YEAR, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .expect("January 1st is always a valid date")
}

/// Parses a date tag of the form `[ yyyy-mm-dd hh:mi:ss ]`, optionally with a
/// time zone offset (`[ 2021-06-01 12:00:00 +0200 ]`), in which case the
/// result is converted to local time. Returns `None` if the line is not a
/// valid date tag; with `warn_invalid` set, lines that look like a date tag
/// but do not parse are reported.
pub fn parse_date_tag(line: &str, warn_invalid: bool) -> Option<NaiveDateTime> {
    let captures = DATE_TAG.captures(line)?;
    let stamp = captures.get(1)?.as_str().trim();

    let parsed = DateTime::parse_from_str(stamp, "%Y-%m-%d %H:%M:%S %z")
        .map(|d| d.with_timezone(&Local).naive_local())
        // no time zone field: assume local time, as old databases do
        .or_else(|_| NaiveDateTime::parse_from_str(stamp, "%Y-%m-%d %H:%M:%S"));

    match parsed {
        Ok(date) if date.year() >= EARLIEST_YEAR => Some(date),
        _ => {
            if warn_invalid && stamp.starts_with(|c: char| c.is_ascii_digit()) {
                warn!(line, "Invalid date tag");
            }
            None
        }
    }
}

/// True if the line contains a bracketed section marker, like `[ config=B ]`
/// or a date tag.
pub fn is_marker(line: &str) -> bool {
    MARKER.is_match(line)
}

/// True if the whole trimmed line is one bracketed marker, like
/// `[ 2019-02-01 00:00:00 ]` or `[ config=B ]`. Brackets inside a value
/// (`b[1] c`) do not count.
pub fn is_marker_line(line: &str) -> bool {
    let line = line.trim();
    line.len() > 2 && line.starts_with('[') && line.ends_with(']')
}

/// True if `line` has the form `<text> = [text]`. The comparison operators
/// `==`, `!=`, `<=` and `>=` are not assignments, and neither is a line that
/// starts with `=`.
pub fn is_assignment(line: &str) -> bool {
    let Some(pos) = line.find('=') else {
        return false;
    };
    if line[..pos].trim_start().is_empty() {
        return false;
    }
    let bytes = line.as_bytes();
    let before = bytes[pos - 1];
    let after = bytes.get(pos + 1).copied();
    !(before == b'!' || before == b'<' || before == b'>' || after == Some(b'='))
}

/// Result of matching one logical line against a requested key.
#[derive(Debug, PartialEq, Eq)]
pub enum KeyMatch<'a> {
    /// Not an assignment at all; the line may be a date tag.
    NoAssignment,
    /// An assignment for some other key.
    Other,
    /// An assignment for the requested key, with the trimmed value text.
    Value(&'a str),
}

/// Matches `line` against `key`. Keys compare exactly, including case.
pub fn match_key<'a>(line: &'a str, key: &str) -> KeyMatch<'a> {
    if !is_assignment(line) {
        return KeyMatch::NoAssignment;
    }
    let Some((lhs, rhs)) = line.split_once('=') else {
        return KeyMatch::NoAssignment;
    };
    if lhs.trim() == key {
        KeyMatch::Value(rhs.trim())
    } else {
        KeyMatch::Other
    }
}

/// Whether the database contents may differ between dates `a` and `b`.
/// Without an in-memory index of the date tags this is simply `a != b`.
pub fn dates_differ(a: &NaiveDateTime, b: &NaiveDateTime) -> bool {
    a != b
}

/// Parses a reference date given by a user: `yyyy-mm-dd hh:mi:ss`,
/// `yyyy-mm-ddThh:mi:ss` or just `yyyy-mm-dd` (midnight).
pub fn parse_reference_date(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S"))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}
