use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Pipeline failure category.
///
/// Every crate-level error maps onto one of these so the orchestrator and
/// the CLI can report failures uniformly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Input path does not exist or contains no CSV files.
    SourceNotFound,
    /// A source file has a header but no data rows.
    EmptySource,
    /// A source file's header set differs from the record columns.
    SchemaMismatch,
    /// Transform requested but the raw table is empty.
    MissingRawData,
    /// A fact row could not be bound to a dimension.
    ReferentialIntegrityError,
    /// Replication stopped after some batches were committed.
    PartialMigration,
    /// Replica counts or aggregates differ from the row store.
    ValidationMismatch,
    /// A store file could not be opened or created.
    StoreUnavailable,
    /// Configuration could not be loaded or is invalid.
    InvalidConfig,
}

impl ErrorKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SourceNotFound => "source_not_found",
            Self::EmptySource => "empty_source",
            Self::SchemaMismatch => "schema_mismatch",
            Self::MissingRawData => "missing_raw_data",
            Self::ReferentialIntegrityError => "referential_integrity_error",
            Self::PartialMigration => "partial_migration",
            Self::ValidationMismatch => "validation_mismatch",
            Self::StoreUnavailable => "store_unavailable",
            Self::InvalidConfig => "invalid_config",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised while loading or checking a [`crate::PipelineConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("batch_size must be greater than zero")]
    ZeroBatchSize,

    #[error("no source path configured")]
    NoSources,
}

impl ConfigError {
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        ErrorKind::InvalidConfig
    }
}

pub type Result<T> = std::result::Result<T, ConfigError>;
