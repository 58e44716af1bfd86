//! Positioning a database file at a configuration block or date segment.
//!
//! Large files can be split into blocks for different experimental
//! configurations, each introduced by a marker line:
//!
//! ```text
//! [ config=lowrate ]
//! ...
//! [ config=highrate ]
//! ...
//! ```
//!
//! After [`seek_config`] finds `highrate`, reading continues on the line
//! following its marker. Both seekers restore the original position when
//! they find nothing.

use std::io::{BufRead, Seek};

use chrono::NaiveDateTime;
use tracing::trace;

use crate::error::Result;
use crate::stream::{DatabaseFile, Position};
use crate::timestamp::{earliest, is_marker, parse_date_tag};

/// Label of configuration markers when none is given explicitly.
pub const CONFIG_LABEL: &str = "config";

// Comments and empty lines are never markers
fn is_skipped(line: &str) -> bool {
    line.is_empty() || line.starts_with('#')
}

/// Looks for the marker `[ label=tag ]` (or `[ tag ]` if `label` is empty)
/// from the current position on. Whitespace inside the marker does not
/// matter. On success the file is positioned on the line after the marker.
///
/// With `end_on_tag`, the search ends at the first other marker line that is
/// not a `[ label=... ]` marker.
pub fn seek_config<R: BufRead + Seek>(
    file: &mut DatabaseFile<R>,
    tag: &str,
    label: &str,
    end_on_tag: bool,
) -> Result<bool> {
    if tag.is_empty() {
        return Ok(false);
    }
    let opening = if label.is_empty() {
        "[".to_owned()
    } else {
        format!("[{}=", label)
    };

    let start = file.mark();
    let mut found = false;
    let mut line = String::new();
    while file.read_line(&mut line)? {
        if is_skipped(&line) {
            continue;
        }
        let compressed: String = line.chars().filter(|c| !c.is_whitespace()).collect();
        let labelled = compressed
            .find(&opening)
            .map(|pos| pos + opening.len())
            .filter(|&after| after < compressed.len());
        if let Some(after) = labelled {
            if let Some(len) = compressed[after..].find(']') {
                if &compressed[after..after + len] == tag {
                    found = true;
                    break;
                }
            }
        } else if end_on_tag && is_marker(&line) {
            break;
        }
    }
    if !found {
        file.reset(start)?;
    }
    trace!(tag, label, found, "seek configuration");
    Ok(found)
}

/// Position of the next `[ label=... ]` marker from the current position on,
/// which is where the configuration block being read ends. The file is left
/// where it was. An empty label has no block end.
pub fn config_block_end<R: BufRead + Seek>(file: &mut DatabaseFile<R>, label: &str) -> Result<Option<Position>> {
    if label.is_empty() {
        return Ok(None);
    }
    let opening = format!("[{}=", label);
    let start = file.mark();
    let mut end = None;
    let mut line = String::new();
    loop {
        let before = file.mark();
        if !file.read_line(&mut line)? {
            break;
        }
        if is_skipped(&line) {
            continue;
        }
        let compressed: String = line.chars().filter(|c| !c.is_whitespace()).collect();
        if compressed.contains(&opening) {
            end = Some(before);
            break;
        }
    }
    file.reset(start)?;
    Ok(end)
}

/// Looks for the latest date tag not after `date`, from the current position
/// on. On success the file is positioned on the line after that tag.
///
/// With `end_on_tag`, the search ends at the first marker line that does not
/// improve on the best tag so far: a date tag after `date` or before the
/// best one, or any other marker. Otherwise it runs to the end of the file.
pub fn seek_date<R: BufRead + Seek>(
    file: &mut DatabaseFile<R>,
    date: &NaiveDateTime,
    end_on_tag: bool,
) -> Result<bool> {
    let start = file.mark();
    let mut best_date = earliest();
    let mut best = None;
    let mut line = String::new();
    while file.read_line(&mut line)? {
        if is_skipped(&line) {
            continue;
        }
        match parse_date_tag(&line, false) {
            Some(tag) => {
                if tag <= *date && tag >= best_date {
                    best_date = tag;
                    best = Some(file.mark());
                } else if end_on_tag {
                    break;
                }
            }
            None => {
                if end_on_tag && is_marker(&line) {
                    break;
                }
            }
        }
    }
    file.reset(best.unwrap_or(start))?;
    trace!(date = %date, found = best.is_some(), "seek date");
    Ok(best.is_some())
}
