//! Validation aggregates over seeded raw rows.

use saev_model::FlatRecord;
use saev_store::RowStore;
use saev_validate::validate;

fn record(student: Option<i64>, school: &str, city: &str, correct: Option<i64>) -> FlatRecord {
    FlatRecord {
        municipality_name: Some(city.to_string()),
        school_id: Some(school.to_string()),
        student_id: student,
        correct,
        descriptor_code: Some("D01".to_string()),
        ..FlatRecord::default()
    }
}

#[test]
fn counts_quality_signals() {
    let mut store = RowStore::open_in_memory().unwrap();
    let mut no_code = record(Some(3), "E2", "B", Some(1));
    no_code.descriptor_code = None;
    store
        .append_records(&[
            record(Some(1), "E1", "A", Some(1)),
            record(Some(1), "E1", "A", Some(0)),
            record(Some(2), "E1", "A", Some(2)),
            record(None, "E2", "B", None),
            no_code,
        ])
        .unwrap();

    let summary = validate(&store).unwrap();
    assert_eq!(summary.total_records, 5);
    assert_eq!(summary.null_student_count, 1);
    assert_eq!(summary.invalid_answer_count, 2);
    assert_eq!(summary.unique_students, 3);
    assert_eq!(summary.school_count, 2);
    assert_eq!(summary.city_count, 2);
    assert_eq!(summary.null_descriptor_count, 1);
    assert_eq!(summary.advisories().len(), 3);
}

#[test]
fn text_correctness_flag_is_invalid() {
    let mut store = RowStore::open_in_memory().unwrap();
    store
        .append_records(&[record(Some(1), "E1", "A", Some(1))])
        .unwrap();
    store
        .connection()
        .execute("UPDATE raw_assessment SET ATR_CERTO = 'X'", [])
        .unwrap();

    let summary = validate(&store).unwrap();
    assert_eq!(summary.invalid_answer_count, 1);
}

#[test]
fn text_identifiers_are_counted() {
    let mut store = RowStore::open_in_memory().unwrap();
    store
        .append_records(&[
            record(Some(1), "E1", "A", Some(1)),
            record(Some(2), "E1", "A", Some(0)),
            record(Some(3), "E1", "A", Some(1)),
            record(None, "E1", "A", Some(1)),
        ])
        .unwrap();
    store
        .connection()
        .execute("UPDATE raw_assessment SET ALU_ID = 'A12' WHERE ALU_ID = 2", [])
        .unwrap();
    store
        .connection()
        .execute("UPDATE raw_assessment SET AVA_ANO = '2024/1' WHERE ALU_ID = 3", [])
        .unwrap();

    let summary = validate(&store).unwrap();
    assert_eq!(summary.non_integer_key_count, 2);
    assert_eq!(summary.null_student_count, 1);
    assert!(
        summary
            .advisories()
            .iter()
            .any(|note| note.starts_with("2 rows with a non-numeric"))
    );
}
