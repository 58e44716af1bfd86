use std::path::PathBuf;

use thiserror::Error;

use crate::datatype::ConvertError;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Numerical conversion error: {key} = \"{text}\" ({source})")]
    Conversion {
        key: String,
        text: String,
        source: ConvertError,
    },
    #[error("Arity mismatch for key = {key}: {source}. Fix the database!")]
    ArityMismatch { key: String, source: ConvertError },
    #[error("Key \"{key}\": Reading of data type \"{data_type}\" not implemented")]
    UnsupportedType { key: String, data_type: String },
    #[error("Required key \"{key}\"{} missing in the database", describe(.description))]
    MissingRequired {
        // 1-based position of the failing request in the batch
        index: usize,
        key: String,
        description: Option<String>,
    },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Cannot open any database directories. Check your disk!")]
    NoDatabaseDirectory,
    #[error("Cannot open database file {name} (tried {})", .tried.len())]
    NoDatabaseFile { name: String, tried: Vec<PathBuf> },
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("Config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;

fn describe(description: &Option<String>) -> String {
    match description {
        Some(d) => format!(" ({})", d),
        None => String::new(),
    }
}

impl Error {
    /// Integer status in the convention used by the calling pipeline: the
    /// 1-based request index for a missing key, negative numbers for errors.
    pub fn code(&self) -> i32 {
        match self {
            Error::MissingRequired { index, .. } => i32::try_from(*index).unwrap_or(i32::MAX),
            Error::UnsupportedType { .. } => -2,
            Error::ArityMismatch { source, .. } => match source {
                ConvertError::Ragged { .. } | ConvertError::NoColumns => -129,
                _ => -130,
            },
            Error::Conversion { .. } => -131,
            Error::Io(_) => -1,
            _ => -255,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Error::MissingRequired { .. })
    }
}

// Helper conversions
impl From<config::ConfigError> for Error {
    fn from(e: config::ConfigError) -> Self {
        Self::Config(e.to_string())
    }
}
