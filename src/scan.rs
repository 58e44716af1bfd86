//! Date-aware key lookup in a single database file.
//!
//! A database file is an append-only history. Assignments before the first
//! date tag are valid from the earliest date onwards; every later block is
//! introduced by a date tag and overrides what came before it:
//!
//! ```text
//! L.vdc.nw = 368
//!
//! [ 2019-02-01 00:00:00 ]
//! L.vdc.nw = 400
//! ```
//!
//! Looking up `L.vdc.nw` for a date in 2018 gives `368`, for any later date
//! `400`. Blocks dated after the requested date are skipped entirely, and
//! within the blocks that are valid, the last assignment wins. There is no
//! index: every lookup reads the whole file.

use std::io::{BufRead, Seek};

use chrono::NaiveDateTime;
use tracing::trace;

use crate::datatype::{parse_array, parse_matrix, parse_scalar, Arithmetic, ConvertError};
use crate::error::{Error, Result};
use crate::line::next_logical_line;
use crate::stream::DatabaseFile;
use crate::timestamp::{earliest, match_key, parse_date_tag, KeyMatch};

/// Text substitution applied to every logical line before it is
/// interpreted. One line may expand into several.
pub trait Substitute {
    fn substitute(&self, line: &str) -> Vec<String>;
}

/// Finds the value of `key` in effect at `date`. The whole file is read from
/// the start, whatever its current position. Returns `Ok(None)` if the key
/// has no value at that date.
pub fn load_value<R: BufRead + Seek>(
    file: &mut DatabaseFile<R>,
    date: &NaiveDateTime,
    key: &str,
    vars: Option<&dyn Substitute>,
) -> Result<Option<String>> {
    let mut key_date = earliest();
    let mut accepted_date = earliest();
    let mut ignore = false;
    let mut value: Option<String> = None;

    file.rewind()?;
    while let Some(logical) = next_logical_line(file)? {
        let lines = match vars {
            Some(vars) => vars.substitute(&logical),
            None => vec![logical],
        };
        for line in &lines {
            let matched = if ignore {
                KeyMatch::NoAssignment
            } else {
                match_key(line, key)
            };
            match matched {
                KeyMatch::Value(text) => {
                    // keep reading, the last valid assignment wins
                    value = Some(text.to_owned());
                    accepted_date = key_date;
                }
                KeyMatch::Other => (),
                KeyMatch::NoAssignment => {
                    if let Some(tag) = parse_date_tag(line, true) {
                        key_date = tag;
                        ignore = key_date > *date || key_date < accepted_date;
                    }
                }
            }
        }
    }
    trace!(key, found = value.is_some(), "scanned database");
    Ok(value)
}

pub(crate) fn conversion_error(key: &str, text: &str, error: ConvertError) -> Error {
    if error.is_arity() {
        Error::ArityMismatch {
            key: key.to_owned(),
            source: error,
        }
    } else {
        Error::Conversion {
            key: key.to_owned(),
            text: text.to_owned(),
            source: error,
        }
    }
}

pub fn load_scalar<T: Arithmetic, R: BufRead + Seek>(
    file: &mut DatabaseFile<R>,
    date: &NaiveDateTime,
    key: &str,
    vars: Option<&dyn Substitute>,
) -> Result<Option<T>> {
    match load_value(file, date, key, vars)? {
        Some(text) => parse_scalar(&text).map(Some).map_err(|e| conversion_error(key, &text, e)),
        None => Ok(None),
    }
}

pub fn load_array<T: Arithmetic, R: BufRead + Seek>(
    file: &mut DatabaseFile<R>,
    date: &NaiveDateTime,
    key: &str,
    vars: Option<&dyn Substitute>,
) -> Result<Option<Vec<T>>> {
    match load_value(file, date, key, vars)? {
        Some(text) => parse_array(&text).map(Some).map_err(|e| conversion_error(key, &text, e)),
        None => Ok(None),
    }
}

pub fn load_matrix<T: Arithmetic, R: BufRead + Seek>(
    file: &mut DatabaseFile<R>,
    date: &NaiveDateTime,
    key: &str,
    ncols: usize,
    vars: Option<&dyn Substitute>,
) -> Result<Option<Vec<Vec<T>>>> {
    match load_value(file, date, key, vars)? {
        Some(text) => parse_matrix(&text, ncols)
            .map(Some)
            .map_err(|e| conversion_error(key, &text, e)),
        None => Ok(None),
    }
}
