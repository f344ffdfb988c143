//! SQLite-backed row store.

use std::path::{Path, PathBuf};

use rusqlite::{Connection, OptionalExtension, params};
use saev_model::{RAW_ASSESSMENT, TableDef};
use tracing::{debug, info};

use crate::error::{Result, StoreError};

/// Row-oriented store holding the raw table and the dimensional model.
///
/// A store exclusively owns its file for the duration of a pipeline run;
/// no locking is done here.
#[derive(Debug)]
pub struct RowStore {
    conn: Connection,
    path: Option<PathBuf>,
}

impl RowStore {
    /// Opens the store at `path`, creating it (and its parent directory)
    /// when needed. With `overwrite` an existing file is removed first.
    ///
    /// The raw table and its indexes exist once this returns.
    pub fn create(path: &Path, overwrite: bool) -> Result<Self> {
        if overwrite && path.exists() {
            info!(path = %path.display(), "removing existing store");
            std::fs::remove_file(path).map_err(|source| StoreError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        }
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let store = Self::connect(path)?;
        store.ensure_raw_table()?;
        Ok(store)
    }

    /// Opens an existing store file without touching its tables.
    pub fn open(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(StoreError::Missing {
                path: path.to_path_buf(),
            });
        }
        Self::connect(path)
    }

    /// In-memory store with the raw table (for tests).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        configure_pragmas(&conn)?;
        let store = Self { conn, path: None };
        store.ensure_raw_table()?;
        Ok(store)
    }

    fn connect(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| StoreError::Unavailable {
            path: path.to_path_buf(),
            source,
        })?;
        configure_pragmas(&conn).map_err(|err| match err {
            StoreError::Sqlite(source) => StoreError::Unavailable {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })?;
        debug!(path = %path.display(), "store opened");
        Ok(Self {
            conn,
            path: Some(path.to_path_buf()),
        })
    }

    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    #[must_use]
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn connection_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }

    /// Creates the raw table and its lookup indexes if absent.
    pub fn ensure_raw_table(&self) -> Result<()> {
        if !self.table_exists(RAW_ASSESSMENT.name)? {
            self.conn.execute(&RAW_ASSESSMENT.create_sql(saev_model::Dialect::Sqlite), [])?;
        }
        for sql in RAW_ASSESSMENT.index_sql() {
            self.conn.execute(&sql, [])?;
        }
        Ok(())
    }

    /// Deletes every raw row. Returns the number removed.
    pub fn reset_raw(&self) -> Result<u64> {
        let removed = self
            .conn
            .execute(&format!("DELETE FROM {}", RAW_ASSESSMENT.name), [])?;
        info!(rows = removed, "raw table cleared");
        Ok(removed as u64)
    }

    /// Whether a table or view with this name exists.
    pub fn table_exists(&self, name: &str) -> Result<bool> {
        let found = self
            .conn
            .query_row(
                "SELECT 1 FROM sqlite_master WHERE type IN ('table', 'view') AND name = ?1",
                params![name],
                |row| row.get::<_, i64>(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    pub fn count_rows(&self, table: &TableDef) -> Result<u64> {
        self.query_count(&table.count_sql())
    }

    /// Runs a single-value integer query. NULL reads as zero.
    pub fn query_count(&self, sql: &str) -> Result<u64> {
        let value: Option<i64> = self.conn.query_row(sql, [], |row| row.get(0))?;
        Ok(value.map_or(0, |n| u64::try_from(n).unwrap_or(0)))
    }
}

fn configure_pragmas(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "PRAGMA journal_mode=DELETE;
         PRAGMA synchronous=NORMAL;
         PRAGMA temp_store=MEMORY;",
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_store_has_raw_table() {
        let store = RowStore::open_in_memory().unwrap();
        assert!(store.table_exists("raw_assessment").unwrap());
        assert_eq!(store.count_rows(&RAW_ASSESSMENT).unwrap(), 0);
    }

    #[test]
    fn raw_indexes_are_created() {
        let store = RowStore::open_in_memory().unwrap();
        let count = store
            .query_count(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'index' AND tbl_name = 'raw_assessment'",
            )
            .unwrap();
        assert_eq!(count, 5);
    }

    #[test]
    fn ensure_raw_table_is_idempotent() {
        let store = RowStore::open_in_memory().unwrap();
        store.ensure_raw_table().unwrap();
        store.ensure_raw_table().unwrap();
        assert!(store.table_exists("raw_assessment").unwrap());
    }

    #[test]
    fn open_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = RowStore::open(&dir.path().join("absent.db")).unwrap_err();
        assert!(matches!(err, StoreError::Missing { .. }));
        assert_eq!(err.kind(), saev_model::ErrorKind::StoreUnavailable);
    }
}
