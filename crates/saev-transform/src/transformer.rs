//! Full rebuild of the dimensional model inside the row store.

use std::collections::BTreeMap;
use std::time::Instant;

use rusqlite::Transaction;
use saev_model::{
    AGGREGATE_FACT_TABLES, CONSUMER_VIEW_SQL, DROP_CONSUMER_VIEW_SQL, Dialect,
    FACT_STUDENT_RESPONSE, RAW_ASSESSMENT, TableDef, TransformSummary,
};
use saev_store::RowStore;
use tracing::{debug, info, info_span};

use crate::dimensions::DIMENSIONS;
use crate::error::{Result, TransformError};
use crate::facts::{AGGREGATE_LOADS, CONTRIBUTING_ROWS_SQL, FACT_LOAD_SQL, orphan_key_checks};

/// Builds dimensions, facts, aggregated facts and the consumer view from
/// the raw table.
///
/// Every run drops and recreates the whole model in one transaction, so a
/// failed run leaves the previous model in place.
pub struct Transformer<'a> {
    store: &'a mut RowStore,
}

impl<'a> Transformer<'a> {
    pub fn new(store: &'a mut RowStore) -> Self {
        Self { store }
    }

    pub fn transform(&mut self) -> Result<TransformSummary> {
        let raw_rows = self.store.count_rows(&RAW_ASSESSMENT)?;
        if raw_rows == 0 {
            return Err(TransformError::MissingRawData);
        }

        let start = Instant::now();
        let tx = self.store.connection_mut().transaction()?;

        drop_model(&tx)?;

        // ===== Dimensions =====
        let mut dimension_counts = BTreeMap::new();
        for spec in DIMENSIONS {
            let span = info_span!("dimension", table = spec.table.name);
            let _guard = span.enter();
            let rows = build_table(&tx, &spec.table, &spec.load_sql())?;
            debug!(rows, "dimension loaded");
            dimension_counts.insert(spec.table.name.to_string(), rows);
        }

        // ===== Facts =====
        let fact_row_count = build_table(&tx, &FACT_STUDENT_RESPONSE, FACT_LOAD_SQL)?;
        check_fact_keys(&tx)?;

        let contributing = count(&tx, CONTRIBUTING_ROWS_SQL)?;
        let excluded_rows = raw_rows.saturating_sub(contributing);

        // ===== Aggregated facts =====
        let mut aggregate_counts = BTreeMap::new();
        for (table, load_sql) in AGGREGATE_LOADS {
            let rows = build_table(&tx, &table, load_sql)?;
            debug!(table = table.name, rows, "aggregate loaded");
            aggregate_counts.insert(table.name.to_string(), rows);
        }

        tx.execute(CONSUMER_VIEW_SQL, [])
            .map_err(|source| TransformError::Build {
                table: saev_model::CONSUMER_VIEW,
                source,
            })?;
        tx.commit()?;

        info!(
            dimensions = dimension_counts.len(),
            fact_rows = fact_row_count,
            aggregates = aggregate_counts.len(),
            excluded_rows,
            duration_ms = start.elapsed().as_millis(),
            "transform complete"
        );
        Ok(TransformSummary {
            dimension_counts,
            fact_row_count,
            aggregate_counts,
            excluded_rows,
        })
    }
}

fn drop_model(tx: &Transaction<'_>) -> Result<()> {
    tx.execute(DROP_CONSUMER_VIEW_SQL, [])?;
    for table in AGGREGATE_FACT_TABLES.iter().rev() {
        tx.execute(&table.drop_sql(), [])?;
    }
    tx.execute(&FACT_STUDENT_RESPONSE.drop_sql(), [])?;
    for spec in DIMENSIONS.iter().rev() {
        tx.execute(&spec.table.drop_sql(), [])?;
    }
    Ok(())
}

/// Creates `table`, fills it with `load_sql` and adds its indexes.
fn build_table(tx: &Transaction<'_>, table: &TableDef, load_sql: &str) -> Result<u64> {
    let build = |sql: &str| {
        tx.execute(sql, []).map_err(|source| TransformError::Build {
            table: table.name,
            source,
        })
    };
    build(&table.create_sql(Dialect::Sqlite))?;
    let rows = build(load_sql)?;
    for sql in table.index_sql() {
        build(&sql)?;
    }
    Ok(rows as u64)
}

fn check_fact_keys(tx: &Transaction<'_>) -> Result<()> {
    for (column, sql) in orphan_key_checks() {
        let orphans = count(tx, &sql)?;
        if orphans > 0 {
            return Err(TransformError::OrphanKeys {
                table: FACT_STUDENT_RESPONSE.name,
                column,
                count: orphans,
            });
        }
    }
    Ok(())
}

fn count(tx: &Transaction<'_>, sql: &str) -> Result<u64> {
    let value: i64 = tx.query_row(sql, [], |row| row.get(0))?;
    Ok(u64::try_from(value).unwrap_or(0))
}
