//! DuckDB-backed columnar store.

use std::path::{Path, PathBuf};

use duckdb::Connection;
use saev_model::{DROP_CONSUMER_VIEW_SQL, Dialect, TableDef, model_tables};
use tracing::debug;

use crate::error::{MigrateError, Result};

/// Columnar replica of the dimensional model.
pub struct ColumnarStore {
    conn: Connection,
    path: Option<PathBuf>,
}

impl ColumnarStore {
    /// Opens (or creates) the DuckDB file at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| MigrateError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let conn = Connection::open(path).map_err(|source| MigrateError::Unavailable {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "columnar store opened");
        Ok(Self {
            conn,
            path: Some(path.to_path_buf()),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
            path: None,
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn connection_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }

    pub fn table_exists(&self, name: &str) -> Result<bool> {
        let found: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM information_schema.tables WHERE table_name = ?",
            duckdb::params![name],
            |row| row.get(0),
        )?;
        Ok(found > 0)
    }

    /// Single integer result; NULL reads as 0.
    pub fn query_i64(&self, sql: &str) -> Result<i64> {
        let value: Option<i64> = self.conn.query_row(sql, duckdb::params![], |row| row.get(0))?;
        Ok(value.unwrap_or(0))
    }

    /// Drops the view and every model table, then recreates empty tables.
    pub(crate) fn reset_model(&self) -> Result<()> {
        self.conn.execute(DROP_CONSUMER_VIEW_SQL, duckdb::params![])?;
        for table in model_tables().iter().rev() {
            self.conn.execute(&table.drop_sql(), duckdb::params![])?;
        }
        for table in model_tables() {
            self.conn
                .execute(&table.create_sql(Dialect::DuckDb), duckdb::params![])
                .map_err(|source| MigrateError::Destination {
                    table: table.name,
                    source,
                })?;
        }
        Ok(())
    }

    pub(crate) fn build_indexes(&self, table: &TableDef) -> Result<()> {
        for sql in table.index_sql() {
            self.conn
                .execute(&sql, duckdb::params![])
                .map_err(|source| MigrateError::Destination {
                    table: table.name,
                    source,
                })?;
        }
        Ok(())
    }
}
