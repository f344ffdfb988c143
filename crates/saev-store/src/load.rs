//! Bulk loading into the raw table.

use polars::prelude::{DataFrame, DataType, StringChunked};
use rusqlite::params_from_iter;
use rusqlite::types::Value;
use saev_model::{FlatRecord, RAW_ASSESSMENT, RecordColumn, SqlType};
use tracing::debug;

use crate::error::{Result, StoreError};
use crate::store::RowStore;

impl RowStore {
    /// Appends every row of `df` to the raw table in one transaction.
    ///
    /// The frame must carry all record columns (extra columns are ignored).
    /// Values are read as text: empty cells become NULL, integer columns are
    /// parsed, and text that does not parse as an integer is kept verbatim
    /// so validation can count it.
    pub fn append_frame(&mut self, df: &DataFrame) -> Result<u64> {
        let mut casted = Vec::with_capacity(RecordColumn::ALL.len());
        for column in RecordColumn::ALL {
            let name = column.name();
            let source = df
                .column(name)
                .map_err(|_| StoreError::MissingColumn {
                    column: name.to_string(),
                })?;
            let text = source
                .cast(&DataType::String)
                .map_err(|source| StoreError::Frame {
                    column: name.to_string(),
                    source,
                })?;
            casted.push((column, text));
        }
        let mut chunks: Vec<(RecordColumn, &StringChunked)> = Vec::with_capacity(casted.len());
        for (column, text) in &casted {
            let chunk = text.str().map_err(|source| StoreError::Frame {
                column: column.name().to_string(),
                source,
            })?;
            chunks.push((*column, chunk));
        }

        let height = df.height();
        let tx = self.connection_mut().transaction()?;
        {
            let mut stmt = tx.prepare(&RAW_ASSESSMENT.insert_sql())?;
            for row in 0..height {
                let values = chunks
                    .iter()
                    .map(|(column, chunk)| cell_value(*column, chunk.get(row)));
                stmt.execute(params_from_iter(values))?;
            }
        }
        tx.commit()?;
        debug!(rows = height, "frame appended");
        Ok(height as u64)
    }

    /// Appends typed records to the raw table in one transaction.
    pub fn append_records(&mut self, records: &[FlatRecord]) -> Result<u64> {
        let tx = self.connection_mut().transaction()?;
        {
            let mut stmt = tx.prepare(&RAW_ASSESSMENT.insert_sql())?;
            for record in records {
                stmt.execute(params_from_iter(record_values(record)))?;
            }
        }
        tx.commit()?;
        Ok(records.len() as u64)
    }
}

/// Converts one raw cell to its stored value.
fn cell_value(column: RecordColumn, raw: Option<&str>) -> Value {
    let Some(raw) = raw else {
        return Value::Null;
    };
    if raw.trim().is_empty() {
        return Value::Null;
    }
    match column.sql_type() {
        SqlType::Integer => raw
            .trim()
            .parse::<i64>()
            .map_or_else(|_| Value::Text(raw.to_string()), Value::Integer),
        SqlType::Real => raw
            .trim()
            .parse::<f64>()
            .map_or_else(|_| Value::Text(raw.to_string()), Value::Real),
        SqlType::Text => Value::Text(raw.to_string()),
    }
}

fn text(value: Option<&String>) -> Value {
    value.map_or(Value::Null, |s| Value::Text(s.clone()))
}

fn integer(value: Option<i64>) -> Value {
    value.map_or(Value::Null, Value::Integer)
}

fn record_values(record: &FlatRecord) -> [Value; 20] {
    [
        text(record.state_code.as_ref()),
        text(record.municipality_name.as_ref()),
        text(record.school_id.as_ref()),
        text(record.school_name.as_ref()),
        integer(record.grade_number),
        text(record.grade_name.as_ref()),
        text(record.class_period.as_ref()),
        text(record.class_name.as_ref()),
        integer(record.student_id),
        text(record.student_name.as_ref()),
        text(record.student_document.as_ref()),
        text(record.assessment_name.as_ref()),
        integer(record.assessment_year),
        text(record.subject_name.as_ref()),
        text(record.test_name.as_ref()),
        integer(record.item_order),
        text(record.answer_option.as_ref()),
        integer(record.correct),
        text(record.descriptor_code.as_ref()),
        text(record.descriptor_text.as_ref()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_cells_parse_or_stay_text() {
        assert_eq!(
            cell_value(RecordColumn::Correct, Some(" 1 ")),
            Value::Integer(1)
        );
        assert_eq!(
            cell_value(RecordColumn::Correct, Some("x")),
            Value::Text("x".to_string())
        );
        assert_eq!(cell_value(RecordColumn::Correct, Some("")), Value::Null);
        assert_eq!(cell_value(RecordColumn::StudentName, None), Value::Null);
    }

    #[test]
    fn text_cells_keep_leading_zeros() {
        assert_eq!(
            cell_value(RecordColumn::SchoolId, Some("00123")),
            Value::Text("00123".to_string())
        );
    }
}
