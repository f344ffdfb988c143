//! One-way replacement of personally identifying fields.
//!
//! Values are replaced by a truncated SHA-256 digest, so equal inputs stay
//! equal (joins and grouping still work) while the original text cannot be
//! recovered. Natural keys are never touched.

use polars::prelude::{Column, DataFrame};
use saev_model::{FlatRecord, RecordColumn};
use sha2::{Digest, Sha256};

use crate::error::Result;

/// Digest bytes kept; rendered as twice as many hex characters.
const DIGEST_BYTES: usize = 16;

/// Returns the 32-character lowercase hex digest of `value`.
#[must_use]
pub fn anonymize_value(value: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(value.as_bytes());
    let digest = hasher.finalize();
    hex::encode(&digest[..DIGEST_BYTES])
}

/// Copy of `record` with every sensitive field digested. Nulls stay null.
#[must_use]
pub fn anonymize_record(record: &FlatRecord) -> FlatRecord {
    let mut out = record.clone();
    for column in RecordColumn::SENSITIVE {
        if let Some(field) = out.sensitive_field_mut(column) {
            *field = field.as_deref().map(anonymize_value);
        }
    }
    out
}

/// Digests the sensitive columns of a record frame in place.
pub fn anonymize_frame(df: &mut DataFrame) -> Result<()> {
    for column in RecordColumn::SENSITIVE {
        let name = column.name();
        let values = df.column(name)?.str()?;
        let hashed: Vec<Option<String>> = values
            .iter()
            .map(|value| value.map(anonymize_value))
            .collect();
        df.with_column(Column::new(name.into(), hashed))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_digest() {
        assert_eq!(anonymize_value("abc"), "ba7816bf8f01cfea414140de5dae2223");
    }

    #[test]
    fn test_record_keeps_keys_and_nulls() {
        let record = FlatRecord {
            student_id: Some(42),
            school_id: Some("35000001".to_string()),
            student_name: Some("Ana".to_string()),
            student_document: None,
            municipality_name: Some("A".to_string()),
            ..FlatRecord::default()
        };
        let out = anonymize_record(&record);
        assert_eq!(out.student_id, Some(42));
        assert_eq!(out.school_id.as_deref(), Some("35000001"));
        assert_eq!(out.student_document, None);
        assert_eq!(out.student_name, Some(anonymize_value("Ana")));
        assert_eq!(out.municipality_name.as_deref().map(str::len), Some(32));
    }

    #[test]
    fn test_frame_only_touches_sensitive_columns() {
        let mut df = DataFrame::new(vec![
            Column::new("ALU_ID".into(), vec![Some("1"), Some("2")]),
            Column::new("ALU_NOME".into(), vec![Some("Ana"), None]),
            Column::new("ALU_CPF".into(), vec![Some("111"), Some("222")]),
            Column::new("MUN_NOME".into(), vec![Some("A"), Some("A")]),
            Column::new("ESC_NOME".into(), vec![Some("E1"), Some("E2")]),
        ])
        .unwrap();
        anonymize_frame(&mut df).unwrap();

        let ids = df.column("ALU_ID").unwrap().str().unwrap();
        assert_eq!(ids.get(0), Some("1"));
        let names = df.column("ALU_NOME").unwrap().str().unwrap();
        assert_eq!(names.get(1), None);
        let cities = df.column("MUN_NOME").unwrap().str().unwrap();
        assert_eq!(cities.get(0), cities.get(1));
        assert_eq!(cities.get(0), Some(anonymize_value("A").as_str()));
    }
}
