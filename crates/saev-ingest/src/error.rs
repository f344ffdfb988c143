//! Error types for assessment data ingestion.

use std::path::{Path, PathBuf};

use saev_model::ErrorKind;
use saev_store::StoreError;
use thiserror::Error;

/// Errors that can occur during ingestion.
#[derive(Debug, Error)]
pub enum IngestError {
    // === Source Errors ===
    /// Declared file or directory does not exist.
    #[error("source not found: {path}")]
    SourceNotFound { path: PathBuf },

    /// Directory exists but holds no CSV files.
    #[error("no CSV files found in {path}")]
    NoCsvFiles { path: PathBuf },

    /// Failed to read directory entries.
    #[error("failed to read directory {path}: {source}")]
    DirectoryRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to read file.
    #[error("failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File carries a byte-order mark for an encoding other than UTF-8.
    #[error("unsupported encoding {encoding} in {path}")]
    UnsupportedEncoding {
        path: PathBuf,
        encoding: &'static str,
    },

    // === CSV Errors ===
    /// File has no header line.
    #[error("CSV file is empty: {path}")]
    EmptySource { path: PathBuf },

    /// Header set differs from the record columns.
    #[error(
        "header mismatch in {path}: missing [{}], unexpected [{}]",
        missing.join(", "),
        unexpected.join(", ")
    )]
    SchemaMismatch {
        path: PathBuf,
        missing: Vec<String>,
        unexpected: Vec<String>,
    },

    /// Failed to parse CSV.
    #[error("failed to parse CSV {path}: {message}")]
    CsvParse { path: PathBuf, message: String },

    // === Filter Errors ===
    /// Failed to read the municipality allow-list.
    #[error("failed to read city list {path}: {source}")]
    CityList {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // === Frame Errors ===
    /// Failed DataFrame operation.
    #[error("DataFrame operation failed: {message}")]
    DataFrame { message: String },

    // === Store Errors ===
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl IngestError {
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::SourceNotFound { .. } | Self::CityList { .. } => ErrorKind::SourceNotFound,
            Self::NoCsvFiles { .. } | Self::EmptySource { .. } => ErrorKind::EmptySource,
            Self::SchemaMismatch { .. }
            | Self::CsvParse { .. }
            | Self::UnsupportedEncoding { .. }
            | Self::DataFrame { .. } => ErrorKind::SchemaMismatch,
            Self::DirectoryRead { .. } | Self::FileRead { .. } => ErrorKind::SourceNotFound,
            Self::Store(err) => err.kind(),
        }
    }

    /// Offending file, when the error concerns one.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::SourceNotFound { path }
            | Self::NoCsvFiles { path }
            | Self::DirectoryRead { path, .. }
            | Self::FileRead { path, .. }
            | Self::UnsupportedEncoding { path, .. }
            | Self::EmptySource { path }
            | Self::SchemaMismatch { path, .. }
            | Self::CsvParse { path, .. }
            | Self::CityList { path, .. } => Some(path),
            Self::DataFrame { .. } => None,
            Self::Store(err) => err.path(),
        }
    }
}

impl From<polars::prelude::PolarsError> for IngestError {
    fn from(err: polars::prelude::PolarsError) -> Self {
        Self::DataFrame {
            message: err.to_string(),
        }
    }
}

/// Result type for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestError>;
