//! Locating the database file for a name and a date.
//!
//! Database files live in the first directory that can be opened among an
//! optional override directory, `DB`, `db` and `.`:
//!
//! ```text
//! DB/
//!   20180101/db_L.vdc.dat    valid from 2018-01-01
//!   20190601/db_L.vdc.dat    valid from 2019-06-01 onwards
//!   DEFAULT/db_L.vdc.dat
//!   db_L.vdc.dat
//! ```
//!
//! A file in the working directory always comes first, then the one in the
//! latest date-coded directory not after the requested date, then `DEFAULT`,
//! then the database directory itself.

use std::fs::{self, OpenOptions};
use std::io::BufReader;
use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDateTime};
use tracing::{debug, error, trace};

use crate::error::{Error, Result};
use crate::settings::Settings;
use crate::stream::DatabaseFile;

const DEFAULT_DIR: &str = "DEFAULT";
const SEARCH_DIRS: [&str; 3] = ["DB", "db", "."];

/// How a database file is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OpenMode {
    #[default]
    Read,
    ReadWrite,
}

/// The date as a `YYYYMMDD` number, comparable with date-coded directory
/// names.
pub fn date_code(date: &NaiveDateTime) -> u32 {
    date.year().max(0) as u32 * 10000 + date.month() * 100 + date.day()
}

fn is_date_code(name: &str) -> bool {
    name.len() == 8 && name.bytes().all(|b| b.is_ascii_digit())
}

/// `L.vdc` becomes `db_L.vdc.dat`, `L.vdc.` becomes `db_L.vdc.dat`, and
/// names that already have the prefix or the suffix keep them.
pub fn normalize_file_name(name: &str) -> String {
    let mut file_name = if name.starts_with("db_") {
        name.to_owned()
    } else {
        format!("db_{}", name)
    };
    if file_name.ends_with('.') {
        file_name.push_str("dat");
    } else if !file_name.ends_with(".dat") {
        file_name.push_str(".dat");
    }
    file_name
}

#[derive(Debug, Clone)]
pub struct FileResolver {
    base: PathBuf,
    override_dir: Option<PathBuf>,
}

impl Default for FileResolver {
    fn default() -> Self {
        Self::new(".")
    }
}

impl FileResolver {
    /// Resolver for paths relative to `base`, usually the working directory.
    pub fn new<P: AsRef<Path>>(base: P) -> Self {
        Self {
            base: base.as_ref().to_path_buf(),
            override_dir: None,
        }
    }
    pub fn with_override_dir<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.override_dir = Some(dir.as_ref().to_path_buf());
        self
    }
    pub fn configured(settings: &Settings) -> Self {
        let resolver = Self::new(settings.base());
        match &settings.dir {
            Some(dir) => resolver.with_override_dir(dir),
            None => resolver,
        }
    }
    /// Resolver configured from [`Settings`], read now.
    pub fn from_settings() -> Result<Self> {
        Ok(Self::configured(&Settings::load()?))
    }

    // First directory of the search list that can be read
    fn database_dir(&self) -> Result<(PathBuf, fs::ReadDir)> {
        let dirs = self
            .override_dir
            .iter()
            .cloned()
            .chain(SEARCH_DIRS.iter().map(PathBuf::from));
        for dir in dirs {
            let path = self.base.join(&dir);
            if let Ok(entries) = fs::read_dir(&path) {
                return Ok((path, entries));
            }
        }
        error!(base = %self.base.display(), "Cannot open any database directories. Check your disk!");
        Err(Error::NoDatabaseDirectory)
    }

    /// Candidate paths for the database file `name` at `date`, most specific
    /// first. A name containing a directory separator is its own and only
    /// candidate.
    pub fn candidates(&self, name: &str, date: &NaiveDateTime) -> Result<Vec<PathBuf>> {
        if name.is_empty() {
            return Ok(Vec::new());
        }
        if name.contains('/') {
            return Ok(vec![PathBuf::from(name)]);
        }

        let (dir, entries) = self.database_dir()?;
        let mut dated = Vec::new();
        let mut have_default = false;
        for entry in entries {
            let entry = entry?;
            let item = entry.file_name().to_string_lossy().into_owned();
            if is_date_code(&item) {
                dated.push(item);
            } else if item == DEFAULT_DIR {
                have_default = true;
            }
        }
        // fixed width, so lexical order is date order
        dated.sort();
        let wanted = date_code(date);
        // the last date-coded directory is valid until the end of time
        let dated_dir = dated
            .iter()
            .rev()
            .find(|d| d.parse::<u32>().is_ok_and(|code| code <= wanted));

        let file_name = normalize_file_name(name);
        let mut candidates = vec![self.base.join(&file_name)];
        if let Some(d) = dated_dir {
            candidates.push(dir.join(d).join(&file_name));
        }
        if have_default {
            candidates.push(dir.join(DEFAULT_DIR).join(&file_name));
        }
        candidates.push(dir.join(&file_name));
        Ok(candidates)
    }

    /// Opens the database file for `name` at `date`, returning it together
    /// with the path that was opened.
    pub fn open(&self, name: &str, date: &NaiveDateTime, mode: OpenMode) -> Result<(DatabaseFile, PathBuf)> {
        let candidates = self.candidates(name, date)?;
        open_first(name, &candidates, mode)
    }
}

/// Tries `candidates` in order and opens the first one that can be opened.
pub fn open_first(name: &str, candidates: &[PathBuf], mode: OpenMode) -> Result<(DatabaseFile, PathBuf)> {
    let mut options = OpenOptions::new();
    options.read(true).write(mode == OpenMode::ReadWrite);
    for path in candidates {
        match options.open(path) {
            Ok(file) => {
                debug!(path = %path.display(), "Opened database file");
                return Ok((DatabaseFile::new(BufReader::new(file)), path.clone()));
            }
            Err(e) => trace!(path = %path.display(), error = %e, "Opening database file failed"),
        }
    }
    error!(name, "Cannot open database file {}", normalize_file_name(name));
    Err(Error::NoDatabaseFile {
        name: name.to_owned(),
        tried: candidates.to_vec(),
    })
}

/// Opens the database file for `name` at `date` with the resolver from
/// [`FileResolver::from_settings`].
pub fn open_db_file(name: &str, date: &NaiveDateTime) -> Result<(DatabaseFile, PathBuf)> {
    FileResolver::from_settings()?.open(name, date, OpenMode::Read)
}
