//! Columnar DuckDB replica of the dimensional model.
//!
//! The replica is rebuilt from the row store: dimensions are copied whole,
//! the fact table in bounded batches, indexes and the consumer view are
//! created afterwards, and the result is checked against the source.

pub mod columnar;
mod copy;
pub mod error;
pub mod verify;

pub use columnar::ColumnarStore;
pub use copy::{BatchControl, BatchProgress, Migrator};
pub use error::{MigrateError, Result};
pub use verify::{FACT_METRICS, ROW_COUNT, verify_replica};
