//! Error types for the row store.

use std::path::PathBuf;

use polars::prelude::PolarsError;
use saev_model::ErrorKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to open store {path}: {source}")]
    Unavailable {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("failed to prepare store location {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("store does not exist: {path}")]
    Missing { path: PathBuf },

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("frame is missing column {column}")]
    MissingColumn { column: String },

    #[error("failed to read frame column {column}: {source}")]
    Frame {
        column: String,
        #[source]
        source: PolarsError,
    },
}

impl StoreError {
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingColumn { .. } => ErrorKind::SchemaMismatch,
            _ => ErrorKind::StoreUnavailable,
        }
    }

    /// File path involved in the failure, when there is one.
    #[must_use]
    pub fn path(&self) -> Option<&std::path::Path> {
        match self {
            Self::Unavailable { path, .. } | Self::Io { path, .. } | Self::Missing { path } => {
                Some(path)
            }
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
