//! Settings read from an optional `calibdb` config file (`calibdb.toml`,
//! `calibdb.yaml`, ...) in the working directory and from `DB_*` environment
//! variables, the latter taking precedence:
//!
//! * `DB_DIR`: database directory tried before `DB`, `db` and `.`
//! * `DB_BASE`: directory that relative database paths start from
//! * `DB_SEARCH`: default search depth for request batches

use std::path::PathBuf;

use serde::Deserialize;

use crate::error::Result;

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct Settings {
    /// Overrides the database directory search.
    #[serde(default)]
    pub dir: Option<PathBuf>,
    #[serde(default)]
    pub base: Option<PathBuf>,
    #[serde(default)]
    pub search: i32,
}

impl Settings {
    pub const FILE_NAME: &'static str = "calibdb";
    pub const ENV_PREFIX: &'static str = "DB";

    /// Reads the settings afresh. Called once per file lookup so that
    /// changes to the environment are seen.
    pub fn load() -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(Self::FILE_NAME).required(false))
            .add_source(config::Environment::with_prefix(Self::ENV_PREFIX))
            .build()?;
        Ok(settings.try_deserialize()?)
    }

    pub fn base(&self) -> PathBuf {
        self.base.clone().unwrap_or_else(|| PathBuf::from("."))
    }
}
