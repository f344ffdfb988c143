//! Error types for replication.

use std::path::PathBuf;

use saev_model::ErrorKind;
use saev_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MigrateError {
    #[error("failed to open columnar store {path}: {source}")]
    Unavailable {
        path: PathBuf,
        #[source]
        source: duckdb::Error,
    },

    #[error("failed to prepare columnar store location {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Row store holds no dimensional model to copy.
    #[error("row store has no {table} table; build the dimensional model first")]
    MissingModel { table: &'static str },

    #[error("failed reading {table} from the row store: {source}")]
    Source {
        table: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    #[error("failed writing {table} to the columnar store: {source}")]
    Destination {
        table: &'static str,
        #[source]
        source: duckdb::Error,
    },

    /// Copy stopped with some fact batches already committed.
    #[error("replication of {table} stopped after {rows_copied} rows: {reason}")]
    PartialMigration {
        table: &'static str,
        tables_copied: u64,
        rows_copied: u64,
        reason: String,
    },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("DuckDB error: {0}")]
    DuckDb(#[from] duckdb::Error),
}

impl MigrateError {
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Unavailable { .. } | Self::Io { .. } | Self::DuckDb(_) | Self::Source { .. } => {
                ErrorKind::StoreUnavailable
            }
            Self::MissingModel { .. } => ErrorKind::MissingRawData,
            Self::Destination { .. } | Self::PartialMigration { .. } => {
                ErrorKind::PartialMigration
            }
            Self::Store(err) => err.kind(),
        }
    }

    /// File or table involved in the failure.
    #[must_use]
    pub fn resource(&self) -> Option<String> {
        match self {
            Self::Unavailable { path, .. } | Self::Io { path, .. } => {
                Some(path.display().to_string())
            }
            Self::MissingModel { table }
            | Self::Source { table, .. }
            | Self::Destination { table, .. }
            | Self::PartialMigration { table, .. } => Some((*table).to_string()),
            Self::Store(err) => err.path().map(|p| p.display().to_string()),
            Self::DuckDb(_) => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, MigrateError>;
