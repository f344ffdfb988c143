//! Parity checks between the row store and its columnar replica.

use saev_model::{FACT_STUDENT_RESPONSE, TableCheck, model_tables};
use saev_store::RowStore;
use tracing::{debug, warn};

use crate::columnar::ColumnarStore;
use crate::error::Result;

pub const ROW_COUNT: &str = "row_count";

/// Aggregate metrics compared on the fact table, as `(metric, expression)`.
pub const FACT_METRICS: [(&str, &str); 4] = [
    ("sum_acerto", "COALESCE(SUM(ACERTO), 0)"),
    ("sum_erro", "COALESCE(SUM(ERRO), 0)"),
    ("distinct_students", "COUNT(DISTINCT student_sk)"),
    ("distinct_schools", "COUNT(DISTINCT school_sk)"),
];

/// Compares row counts of every model table plus the fact aggregates.
///
/// A table absent from the replica counts as empty there, so it shows up as
/// a mismatch rather than an error.
pub fn verify_replica(source: &RowStore, destination: &ColumnarStore) -> Result<Vec<TableCheck>> {
    let mut checks = Vec::new();

    for table in model_tables() {
        let source_rows = i64::try_from(source.count_rows(&table)?).unwrap_or(i64::MAX);
        let destination_rows = if destination.table_exists(table.name)? {
            destination.query_i64(&table.count_sql())?
        } else {
            0
        };
        checks.push(TableCheck {
            table: table.name.to_string(),
            metric: ROW_COUNT.to_string(),
            source: source_rows,
            destination: destination_rows,
        });
    }

    let fact_present = destination.table_exists(FACT_STUDENT_RESPONSE.name)?;
    for (metric, expression) in FACT_METRICS {
        let sql = format!(
            "SELECT CAST({expression} AS BIGINT) FROM {}",
            FACT_STUDENT_RESPONSE.name
        );
        let source_value = i64::try_from(source.query_count(&sql)?).unwrap_or(i64::MAX);
        let destination_value = if fact_present {
            destination.query_i64(&sql)?
        } else {
            0
        };
        checks.push(TableCheck {
            table: FACT_STUDENT_RESPONSE.name.to_string(),
            metric: metric.to_string(),
            source: source_value,
            destination: destination_value,
        });
    }

    for check in checks.iter().filter(|check| !check.matches()) {
        warn!(
            table = %check.table,
            metric = %check.metric,
            source = check.source,
            destination = check.destination,
            "replica mismatch"
        );
    }
    debug!(checks = checks.len(), "replica verified");
    Ok(checks)
}
