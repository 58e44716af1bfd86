//! Assembly of logical lines from the physical lines of a database file.
//!
//! The file format knows three ways of spreading one value over several
//! physical lines:
//!
//! ```text
//! # a comment, ignored
//! key1 = 1 2 3 \
//!        4 5 6          # backslash continuation
//! key2 = 1 2 3
//!        4 5 6          # implicit continuation, ends at the next blank
//!                       # line, assignment or bracketed marker
//! ```
//!
//! Both produce `key = 1 2 3 4 5 6`.

use std::io::{BufRead, Seek};

use crate::error::Result;
use crate::stream::DatabaseFile;
use crate::timestamp::{is_assignment, is_marker_line};

/// What [`prepare_line`] found out about a physical line.
#[derive(Debug, Default, Clone, Copy)]
struct LineTraits {
    comment: bool,
    continued: bool,
    leading_space: bool,
    trailing_space: bool,
}

// Removes a comment ('#') or a continuation mark ('\') and everything after
// it, then trims the line, remembering what was cut.
fn prepare_line(line: &mut String) -> LineTraits {
    let mut traits = LineTraits::default();
    if line.is_empty() {
        return traits;
    }
    let hash = line.find('#');
    if hash == Some(0) {
        traits.comment = true;
        line.clear();
        return traits;
    }
    let backslash = line.find('\\');
    let cut = match (hash, backslash) {
        (Some(h), Some(b)) => Some(h.min(b)),
        (h, b) => h.or(b),
    };
    if let Some(pos) = cut {
        if Some(pos) == backslash {
            traits.continued = true;
        } else {
            traits.comment = true;
        }
        line.truncate(pos);
    }
    if let (Some(first), Some(last)) = (line.chars().next(), line.chars().last()) {
        traits.leading_space = first.is_whitespace();
        traits.trailing_space = last.is_whitespace();
        if traits.leading_space || traits.trailing_space {
            let trimmed = line.trim().to_owned();
            *line = trimmed;
        }
    }
    traits
}

/// Reads the next logical line from `file`. Comments are dropped,
/// continuations merged, tabs turned into spaces and surrounding whitespace
/// trimmed. Returns `None` only at the end of the stream; otherwise the
/// returned line is never empty.
pub fn next_logical_line<R: BufRead + Seek>(file: &mut DatabaseFile<R>) -> Result<Option<String>> {
    let mut line = String::new();
    let mut buffer = String::new();
    let mut maybe_continued = false;

    loop {
        let before = file.mark();
        if !file.read_line(&mut buffer)? {
            break;
        }
        let traits = prepare_line(&mut buffer);

        if line.is_empty() && buffer.is_empty() {
            // nothing read yet and nothing here
            continue;
        }

        let mut assignment = false;
        if !buffer.is_empty() {
            assignment = is_assignment(&buffer);
            if maybe_continued && (assignment || is_marker_line(&buffer)) {
                // This line starts the next key or block. Push it back so it
                // is read again by the next call.
                file.reset(before)?;
                break;
            }
        } else if traits.continued || traits.comment {
            // empty continuation lines and comments inside a block
            continue;
        } else {
            // a blank line ends any continuation
            break;
        }

        if line.is_empty() && !traits.continued && assignment {
            // The first line of an assignment may be continued by lines
            // without '=' up to the next blank line. Backslash continuation
            // and this implicit style are not mixed.
            maybe_continued = true;
        }

        // keep one space between fragments if there was one in the source
        if maybe_continued || (traits.trailing_space && traits.continued) {
            buffer.push(' ');
        }
        if traits.leading_space && line.chars().last().is_some_and(|c| !c.is_whitespace()) {
            line.push(' ');
        }
        line.push_str(&buffer);

        if !(traits.continued || maybe_continued) {
            break;
        }
    }

    // drop the tentative separator left over from the last fragment
    let end = line.trim_end().len();
    line.truncate(end);

    if line.is_empty() {
        Ok(None)
    } else {
        Ok(Some(line))
    }
}

/// Iterator over the logical lines of a file, from its current position.
pub struct LogicalLines<'f, R> {
    file: &'f mut DatabaseFile<R>,
}

impl<'f, R: BufRead + Seek> LogicalLines<'f, R> {
    pub fn new(file: &'f mut DatabaseFile<R>) -> Self {
        Self { file }
    }
}

impl<R: BufRead + Seek> Iterator for LogicalLines<'_, R> {
    type Item = Result<String>;
    fn next(&mut self) -> Option<Self::Item> {
        next_logical_line(self.file).transpose()
    }
}
