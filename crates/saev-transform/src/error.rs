//! Error types for the dimensional transform.

use saev_model::ErrorKind;
use saev_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransformError {
    /// Raw table has no rows.
    #[error("raw table is empty; nothing to transform")]
    MissingRawData,

    /// A dimension or fact table could not be built.
    #[error("failed to build {table}: {source}")]
    Build {
        table: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    /// Fact rows reference keys absent from a dimension.
    #[error("{count} rows of {table}.{column} do not resolve to a dimension member")]
    OrphanKeys {
        table: &'static str,
        column: &'static str,
        count: u64,
    },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

impl TransformError {
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingRawData => ErrorKind::MissingRawData,
            Self::Build { .. } | Self::OrphanKeys { .. } => ErrorKind::ReferentialIntegrityError,
            Self::Store(err) => err.kind(),
            Self::Sqlite(_) => ErrorKind::StoreUnavailable,
        }
    }

    /// Table involved in the failure, when known.
    #[must_use]
    pub fn table(&self) -> Option<&'static str> {
        match self {
            Self::MissingRawData => Some(saev_model::RAW_ASSESSMENT.name),
            Self::Build { table, .. } | Self::OrphanKeys { table, .. } => Some(*table),
            Self::Store(_) | Self::Sqlite(_) => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, TransformError>;
