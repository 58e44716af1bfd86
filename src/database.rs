//! A database file opened for one reference date.

use std::fs::File;
use std::io::{BufRead, BufReader, Cursor, Seek};
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;

use crate::datatype::Arithmetic;
use crate::error::Result;
use crate::line::next_logical_line;
use crate::locate::{FileResolver, OpenMode};
use crate::request::Request;
use crate::resolve::{load_database, ResolutionContext};
use crate::scan::{load_array, load_matrix, load_scalar, load_value, Substitute};
use crate::seek::{config_block_end, seek_config, seek_date};
use crate::stream::DatabaseFile;
use crate::textvars::TextVars;

/// Owns an open database file, the path it was opened from and the date
/// for which values are looked up.
pub struct Database<R = BufReader<File>> {
    file: DatabaseFile<R>,
    path: Option<PathBuf>,
    date: NaiveDateTime,
    vars: Option<TextVars>,
}

impl Database<BufReader<File>> {
    /// Opens the database file for `name` as configured by the settings
    /// (see [`crate::settings::Settings`]).
    pub fn open(name: &str, date: NaiveDateTime) -> Result<Self> {
        Self::open_with(&FileResolver::from_settings()?, name, date)
    }
    pub fn open_with(resolver: &FileResolver, name: &str, date: NaiveDateTime) -> Result<Self> {
        let (file, path) = resolver.open(name, &date, OpenMode::Read)?;
        Ok(Self {
            file,
            path: Some(path),
            date,
            vars: None,
        })
    }
}

impl Database<Cursor<Vec<u8>>> {
    pub fn from_text(text: &str, date: NaiveDateTime) -> Self {
        Self::new(DatabaseFile::from_text(text), date)
    }
}

impl<R: BufRead + Seek> Database<R> {
    pub fn new(file: DatabaseFile<R>, date: NaiveDateTime) -> Self {
        Self {
            file,
            path: None,
            date,
            vars: None,
        }
    }
    pub fn with_text_vars(mut self, vars: TextVars) -> Self {
        self.vars = Some(vars);
        self
    }
    pub fn date(&self) -> &NaiveDateTime {
        &self.date
    }
    pub fn set_date(&mut self, date: NaiveDateTime) {
        self.date = date;
    }
    /// Path of the file, if it was opened from the file system.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
    pub fn file_mut(&mut self) -> &mut DatabaseFile<R> {
        &mut self.file
    }
    pub fn value(&mut self, key: &str) -> Result<Option<String>> {
        let vars = self.vars.as_ref().map(|v| v as &dyn Substitute);
        load_value(&mut self.file, &self.date, key, vars)
    }
    pub fn scalar<T: Arithmetic>(&mut self, key: &str) -> Result<Option<T>> {
        let vars = self.vars.as_ref().map(|v| v as &dyn Substitute);
        load_scalar(&mut self.file, &self.date, key, vars)
    }
    pub fn array<T: Arithmetic>(&mut self, key: &str) -> Result<Option<Vec<T>>> {
        let vars = self.vars.as_ref().map(|v| v as &dyn Substitute);
        load_array(&mut self.file, &self.date, key, vars)
    }
    pub fn matrix<T: Arithmetic>(&mut self, key: &str, ncols: usize) -> Result<Option<Vec<Vec<T>>>> {
        let vars = self.vars.as_ref().map(|v| v as &dyn Substitute);
        load_matrix(&mut self.file, &self.date, key, ncols, vars)
    }

    /// Resolves `requests` under `prefix`, see [`load_database`]. `here`
    /// names the caller in diagnostics.
    pub fn load(&mut self, requests: &mut [Request<'_>], prefix: &str, search: i32, here: &str) -> Result<()> {
        let mut ctx = ResolutionContext::new(here);
        if let Some(vars) = self.vars.as_ref() {
            ctx = ctx.with_substitution(vars);
        }
        load_database(&mut self.file, &self.date, requests, prefix, search, &mut ctx)
    }

    /// Confines further lookups to the block after the configuration marker
    /// `[ label=tag ]`, up to the next marker with the same label. The whole
    /// file is searched. Returns false, leaving the scope as it was, if there
    /// is no such marker.
    pub fn seek_config(&mut self, tag: &str, label: &str, end_on_tag: bool) -> Result<bool> {
        let (origin, limit) = self.file.segment();
        self.file.clear_segment()?;
        if !seek_config(&mut self.file, tag, label, end_on_tag)? {
            self.file.set_segment(origin, limit)?;
            return Ok(false);
        }
        let start = self.file.mark();
        let end = config_block_end(&mut self.file, label)?;
        self.file.set_segment(start, end)?;
        Ok(true)
    }

    /// Confines further lookups to the part of the current scope after the
    /// latest date tag not after the reference date.
    pub fn seek_date(&mut self, end_on_tag: bool) -> Result<bool> {
        self.file.rewind()?;
        let found = seek_date(&mut self.file, &self.date, end_on_tag)?;
        if found {
            let start = self.file.mark();
            let (_, end) = self.file.segment();
            self.file.set_segment(start, end)?;
        }
        Ok(found)
    }

    /// Lookups see the whole file again.
    pub fn unscope(&mut self) -> Result<()> {
        self.file.clear_segment()
    }

    /// Reads the next logical line from the current position, for callers
    /// that parse a segment themselves.
    pub fn next_line(&mut self) -> Result<Option<String>> {
        next_logical_line(&mut self.file)
    }
}
