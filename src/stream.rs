//! Seekable line cursor over a database file.
//!
//! Everything above this module reads the database one physical line at a
//! time and occasionally needs to step back: the line assembler pushes back a
//! line that turned out to start a new assignment, and the segment seekers
//! restore the original position when nothing was found. Both go through
//! [`DatabaseFile::mark`] and [`DatabaseFile::reset`].
//!
//! Lookups always start over with [`DatabaseFile::rewind`], which goes back
//! to the origin of the file. The origin is the start of the stream unless a
//! segment was selected with [`DatabaseFile::set_segment`], which also sets
//! where reading stops.

use std::fs::File;
use std::io::{BufRead, BufReader, Cursor, Seek, SeekFrom};
use std::path::Path;

use crate::error::Result;

/// A saved read position, obtained from [`DatabaseFile::mark`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Position(u64);

impl Position {
    pub const START: Position = Position(0);

    pub fn offset(&self) -> u64 {
        self.0
    }
}

/// An ordered byte stream with a current read position.
#[derive(Debug)]
pub struct DatabaseFile<R = BufReader<File>> {
    reader: R,
    raw: Vec<u8>,
    position: u64,
    origin: u64,
    limit: Option<u64>,
}

impl DatabaseFile<BufReader<File>> {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl DatabaseFile<Cursor<Vec<u8>>> {
    /// In-memory database, mostly useful for tests and for callers that
    /// have already fetched the file contents.
    pub fn from_text(text: &str) -> Self {
        Self::new(Cursor::new(text.as_bytes().to_vec()))
    }
}

impl<R: BufRead + Seek> DatabaseFile<R> {
    /// Wraps a reader positioned at the start of its stream.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            raw: Vec::with_capacity(256),
            position: 0,
            origin: 0,
            limit: None,
        }
    }

    /// Reads the next physical line into `line`, without its newline and with
    /// every tab replaced by a single space. Returns false at the end of the
    /// stream (or segment) when no data at all was read.
    pub fn read_line(&mut self, line: &mut String) -> Result<bool> {
        line.clear();
        if self.limit.is_some_and(|limit| self.position >= limit) {
            return Ok(false);
        }
        self.raw.clear();
        let n = self.reader.read_until(b'\n', &mut self.raw)?;
        if n == 0 {
            return Ok(false);
        }
        self.position += n as u64;
        if self.raw.last() == Some(&b'\n') {
            self.raw.pop();
        }
        line.push_str(&String::from_utf8_lossy(&self.raw));
        if line.contains('\t') {
            *line = line.replace('\t', " ");
        }
        Ok(true)
    }

    pub fn mark(&self) -> Position {
        Position(self.position)
    }

    pub fn reset(&mut self, position: Position) -> Result<()> {
        self.position = self.reader.seek(SeekFrom::Start(position.0))?;
        Ok(())
    }

    /// Goes back to the origin, the start of the stream or of the selected
    /// segment.
    pub fn rewind(&mut self) -> Result<()> {
        self.reset(Position(self.origin))
    }

    /// Confines reading to `[start, end)`; without an end the segment runs to
    /// the end of the stream. The file is positioned at `start`.
    pub fn set_segment(&mut self, start: Position, end: Option<Position>) -> Result<()> {
        self.origin = start.0;
        self.limit = end.map(|e| e.0);
        self.rewind()
    }

    /// Makes the whole stream readable again.
    pub fn clear_segment(&mut self) -> Result<()> {
        self.set_segment(Position::START, None)
    }

    pub fn segment(&self) -> (Position, Option<Position>) {
        (Position(self.origin), self.limit.map(Position))
    }

    pub fn into_inner(self) -> R {
        self.reader
    }
}
