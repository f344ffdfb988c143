//! Batched copy of the dimensional model into the columnar store.

use std::path::Path;
use std::time::Instant;

use saev_model::{
    AGGREGATE_FACT_TABLES, CONSUMER_VIEW, CONSUMER_VIEW_SQL, DEFAULT_BATCH_SIZE, DIMENSION_TABLES,
    FACT_STUDENT_RESPONSE, MigrationSummary, TableDef, model_tables,
};
use saev_store::RowStore;
use tracing::{debug, info, info_span, warn};

use crate::columnar::ColumnarStore;
use crate::error::{MigrateError, Result};
use crate::verify::verify_replica;

/// Answer from the batch hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchControl {
    Continue,
    Stop,
}

/// Progress reported after each committed fact batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchProgress {
    pub table: &'static str,
    /// 1-based batch number.
    pub batch: u64,
    pub rows_copied: u64,
    pub total_rows: u64,
}

type BatchHook<'a> = Box<dyn FnMut(&BatchProgress) -> BatchControl + 'a>;

/// Copies dimensions and facts from a row store into a DuckDB replica.
pub struct Migrator<'a> {
    batch_size: usize,
    force: bool,
    on_batch: Option<BatchHook<'a>>,
}

impl Default for Migrator<'_> {
    fn default() -> Self {
        Self::new(DEFAULT_BATCH_SIZE)
    }
}

impl<'a> Migrator<'a> {
    /// `batch_size` of zero is treated as one.
    pub fn new(batch_size: usize) -> Self {
        Self {
            batch_size: batch_size.max(1),
            force: false,
            on_batch: None,
        }
    }

    /// Rebuild the replica even when the destination file already exists.
    #[must_use]
    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Hook called after each fact batch; returning [`BatchControl::Stop`]
    /// ends the copy before the next batch.
    #[must_use]
    pub fn on_batch(mut self, hook: impl FnMut(&BatchProgress) -> BatchControl + 'a) -> Self {
        self.on_batch = Some(Box::new(hook));
        self
    }

    pub fn migrate(&mut self, source: &RowStore, destination: &Path) -> Result<MigrationSummary> {
        if !source.table_exists(FACT_STUDENT_RESPONSE.name)? {
            return Err(MigrateError::MissingModel {
                table: FACT_STUDENT_RESPONSE.name,
            });
        }

        let span = info_span!("replicate", destination = %destination.display());
        let _guard = span.enter();

        if destination.is_file() && !self.force {
            let replica = ColumnarStore::open(destination)?;
            let checks = verify_replica(source, &replica)?;
            let verified = checks.iter().all(|check| check.matches());
            info!(verified, "replica exists; copy skipped");
            return Ok(MigrationSummary {
                destination: destination.to_path_buf(),
                tables_copied: 0,
                rows_copied: 0,
                verified,
                checks,
                skipped: true,
            });
        }

        let start = Instant::now();
        let mut replica = ColumnarStore::open(destination)?;
        replica.reset_model()?;

        let mut tables_copied = 0_u64;
        let mut rows_copied = 0_u64;

        for table in DIMENSION_TABLES {
            let rows = copy_whole_table(source, &mut replica, &table, tables_copied, rows_copied)?;
            debug!(table = table.name, rows, "dimension copied");
            tables_copied += 1;
            rows_copied += rows;
        }

        let fact_rows = self.copy_facts(source, &mut replica, tables_copied, rows_copied)?;
        tables_copied += 1;
        rows_copied += fact_rows;

        for table in AGGREGATE_FACT_TABLES {
            let rows = copy_whole_table(source, &mut replica, &table, tables_copied, rows_copied)?;
            debug!(table = table.name, rows, "aggregate copied");
            tables_copied += 1;
            rows_copied += rows;
        }

        for table in model_tables() {
            replica.build_indexes(&table)?;
        }
        replica
            .connection()
            .execute(CONSUMER_VIEW_SQL, duckdb::params![])
            .map_err(|source| MigrateError::Destination {
                table: CONSUMER_VIEW,
                source,
            })?;

        let checks = verify_replica(source, &replica)?;
        let verified = checks.iter().all(|check| check.matches());
        info!(
            tables_copied,
            rows_copied,
            verified,
            duration_ms = start.elapsed().as_millis(),
            "replication complete"
        );
        Ok(MigrationSummary {
            destination: destination.to_path_buf(),
            tables_copied,
            rows_copied,
            verified,
            checks,
            skipped: false,
        })
    }

    /// Keyset-paginated fact copy; each batch commits on its own.
    fn copy_facts(
        &mut self,
        source: &RowStore,
        replica: &mut ColumnarStore,
        tables_copied: u64,
        rows_before: u64,
    ) -> Result<u64> {
        let table = FACT_STUDENT_RESPONSE;
        let total_rows = source.count_rows(&table)?;
        let key_position = table
            .primary_key
            .and_then(|key| table.columns.iter().position(|c| c.name == key))
            .unwrap_or(0);
        let sql = format!(
            "SELECT {columns} FROM {name} WHERE {key} > ?1 ORDER BY {key} LIMIT ?2",
            columns = table.column_names().join(", "),
            name = table.name,
            key = table.columns[key_position].name,
        );
        let partial = |rows_copied: u64, reason: String| MigrateError::PartialMigration {
            table: table.name,
            tables_copied,
            rows_copied: rows_before + rows_copied,
            reason,
        };

        let mut last_key = i64::MIN;
        let mut rows_copied = 0_u64;
        let mut batch = 0_u64;
        let limit = i64::try_from(self.batch_size).unwrap_or(i64::MAX);

        loop {
            let rows = read_rows(source, table.name, &sql, (last_key, limit))
                .map_err(|err| partial(rows_copied, err.to_string()))?;
            let Some(last) = rows.last() else {
                break;
            };
            if let rusqlite::types::Value::Integer(key) = last[key_position] {
                last_key = key;
            }

            let appended = append_rows(replica, table.name, &rows)
                .map_err(|err| partial(rows_copied, err.to_string()))?;
            rows_copied += appended;
            batch += 1;
            debug!(batch, rows = appended, rows_copied, total_rows, "fact batch copied");

            let progress = BatchProgress {
                table: table.name,
                batch,
                rows_copied,
                total_rows,
            };
            let control = self
                .on_batch
                .as_mut()
                .map_or(BatchControl::Continue, |hook| hook(&progress));
            if control == BatchControl::Stop && rows_copied < total_rows {
                warn!(batch, rows_copied, total_rows, "fact copy stopped by caller");
                return Err(partial(
                    rows_copied,
                    format!("stopped after batch {batch}"),
                ));
            }
            if rows.len() < self.batch_size {
                break;
            }
        }

        if rows_copied != total_rows {
            return Err(partial(
                rows_copied,
                format!("copied {rows_copied} of {total_rows} rows"),
            ));
        }
        Ok(rows_copied)
    }
}

/// Copies a whole table in one append transaction.
///
/// A failure is reported as a partial migration carrying the tables and rows
/// committed before it.
fn copy_whole_table(
    source: &RowStore,
    replica: &mut ColumnarStore,
    table: &TableDef,
    tables_copied: u64,
    rows_copied: u64,
) -> Result<u64> {
    let copy = |replica: &mut ColumnarStore| -> Result<u64> {
        let rows = read_rows(source, table.name, &table.select_sql(), rusqlite::params![])?;
        append_rows(replica, table.name, &rows)
    };
    copy(replica).map_err(|err| MigrateError::PartialMigration {
        table: table.name,
        tables_copied,
        rows_copied,
        reason: err.to_string(),
    })
}

fn read_rows(
    source: &RowStore,
    table: &'static str,
    sql: &str,
    params: impl rusqlite::Params,
) -> Result<Vec<Vec<rusqlite::types::Value>>> {
    let read = || -> rusqlite::Result<Vec<Vec<rusqlite::types::Value>>> {
        let mut stmt = source.connection().prepare(sql)?;
        let width = stmt.column_count();
        let rows = stmt.query_map(params, |row| {
            (0..width)
                .map(|idx| row.get::<_, rusqlite::types::Value>(idx))
                .collect()
        })?;
        rows.collect()
    };
    read().map_err(|source| MigrateError::Source { table, source })
}

fn append_rows(
    replica: &mut ColumnarStore,
    table: &'static str,
    rows: &[Vec<rusqlite::types::Value>],
) -> Result<u64> {
    let mut append = || -> duckdb::Result<u64> {
        let tx = replica.connection_mut().transaction()?;
        {
            let mut appender = tx.appender(table)?;
            for row in rows {
                let values = row.iter().map(to_duckdb);
                appender.append_row(duckdb::appender_params_from_iter(values))?;
            }
            appender.flush()?;
        }
        tx.commit()?;
        Ok(rows.len() as u64)
    };
    append().map_err(|source| MigrateError::Destination { table, source })
}

fn to_duckdb(value: &rusqlite::types::Value) -> duckdb::types::Value {
    use duckdb::types::Value as Out;
    use rusqlite::types::Value as In;
    match value {
        In::Null => Out::Null,
        In::Integer(v) => Out::BigInt(*v),
        In::Real(v) => Out::Double(*v),
        In::Text(v) => Out::Text(v.clone()),
        In::Blob(v) => Out::Blob(v.clone()),
    }
}
