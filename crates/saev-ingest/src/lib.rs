//! Assessment data ingestion.
//!
//! This crate discovers CSV exports, checks their headers against the flat
//! record columns, and loads them into the raw table of a [`RowStore`].
//!
//! # Features
//!
//! - **Discovery**: single files or directories, loaded in filename order
//! - **CSV Loading**: strict header contract, all values read as text
//! - **City Filter**: exact-match municipality allow-list
//! - **Anonymization**: truncated SHA-256 digests of personal fields
//!
//! # Example
//!
//! ```ignore
//! use saev_ingest::{CityFilter, IngestRequest, ingest};
//! use saev_store::RowStore;
//!
//! let mut store = RowStore::create(Path::new("saev.db"), true)?;
//! let request = IngestRequest {
//!     sources: vec!["exports/".into()],
//!     city_filter: Some(CityFilter::load(Path::new("cities.txt"))?),
//!     anonymize: true,
//! };
//! let summary = ingest(&mut store, &request)?;
//! ```
//!
//! [`RowStore`]: saev_store::RowStore

mod anonymize;
mod cities;
mod controller;
mod csv;
mod discovery;
mod error;

// === Error Types ===
pub use error::{IngestError, Result};

// === CSV Reading ===
pub use csv::{check_record_schema, read_headers, read_record_frame, validate_encoding};

// === File Discovery ===
pub use discovery::{list_csv_files, resolve_sources};

// === Filtering and Anonymization ===
pub use anonymize::{anonymize_frame, anonymize_record, anonymize_value};
pub use cities::CityFilter;

// === Controller ===
pub use controller::{IngestRequest, ingest};
