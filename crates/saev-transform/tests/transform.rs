//! Integration tests for the dimensional transform.

use saev_model::{ErrorKind, FlatRecord};
use saev_store::RowStore;
use saev_transform::{TransformError, Transformer};

fn response(student: i64, school: &str, code: Option<&str>, correct: i64) -> FlatRecord {
    FlatRecord {
        state_code: Some("SP".to_string()),
        municipality_name: Some("Alpha".to_string()),
        school_id: Some(school.to_string()),
        school_name: Some(format!("Escola {school}")),
        grade_number: Some(5),
        grade_name: Some("5 ano".to_string()),
        class_period: Some("Manha".to_string()),
        class_name: Some("A".to_string()),
        student_id: Some(student),
        student_name: Some(format!("Aluno {student}")),
        student_document: Some(format!("{student:03}")),
        assessment_name: Some("Diagnostica".to_string()),
        assessment_year: Some(2024),
        subject_name: Some("Matematica".to_string()),
        test_name: Some("Prova 1".to_string()),
        item_order: Some(1),
        answer_option: Some("B".to_string()),
        correct: Some(correct),
        descriptor_code: code.map(str::to_string),
        descriptor_text: code.map(|c| format!("Descritor {c}")),
    }
}

fn seeded_store(records: &[FlatRecord]) -> RowStore {
    let mut store = RowStore::open_in_memory().unwrap();
    store.append_records(records).unwrap();
    store
}

fn count(store: &RowStore, sql: &str) -> u64 {
    store.query_count(sql).unwrap()
}

#[test]
fn builds_dimensions_and_aggregated_facts() {
    let records = vec![
        response(1, "E1", Some("D01"), 1),
        response(1, "E1", Some("D01"), 0),
        response(1, "E1", Some("D01"), 1),
        response(1, "E1", Some("D02"), 0),
        response(2, "E2", Some("D01"), 1),
        response(2, "E2", Some("D02"), 1),
    ];
    let mut store = seeded_store(&records);

    let summary = Transformer::new(&mut store).transform().unwrap();

    assert_eq!(summary.dimension_counts["dim_student"], 2);
    assert_eq!(summary.dimension_counts["dim_school"], 2);
    assert_eq!(summary.dimension_counts["dim_descriptor"], 2);
    assert_eq!(summary.dimension_counts["dim_municipality"], 1);
    assert_eq!(summary.dimension_counts["dim_time"], 1);
    assert_eq!(summary.fact_row_count, 4);
    assert_eq!(summary.excluded_rows, 0);

    let (acerto, erro): (i64, i64) = store
        .connection()
        .query_row(
            "SELECT f.ACERTO, f.ERRO FROM fact_student_response f \
             JOIN dim_student s ON s.student_sk = f.student_sk \
             JOIN dim_descriptor d ON d.descriptor_sk = f.descriptor_sk \
             WHERE s.ALU_ID = 1 AND d.MTI_CODIGO = 'D01'",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .unwrap();
    assert_eq!((acerto, erro), (2, 1));

    assert_eq!(
        count(&store, "SELECT SUM(ACERTO) FROM fact_student_response"),
        count(&store, "SELECT SUM(ATR_CERTO) FROM raw_assessment")
    );
    assert_eq!(
        count(&store, "SELECT SUM(ACERTO + ERRO) FROM fact_student_response"),
        records.len() as u64
    );
}

#[test]
fn surrogate_keys_follow_natural_key_order() {
    let mut store = seeded_store(&[
        response(30, "E9", Some("D03"), 1),
        response(10, "E1", Some("D01"), 1),
        response(20, "E5", Some("D02"), 0),
    ]);
    Transformer::new(&mut store).transform().unwrap();

    let ids: Vec<(i64, i64)> = {
        let conn = store.connection();
        let mut stmt = conn
            .prepare("SELECT student_sk, ALU_ID FROM dim_student ORDER BY student_sk")
            .unwrap();
        stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap()
    };
    assert_eq!(ids, vec![(1, 10), (2, 20), (3, 30)]);
}

#[test]
fn null_competency_and_invalid_flags_are_excluded() {
    let mut store = seeded_store(&[
        response(1, "E1", Some("D01"), 1),
        response(1, "E1", None, 1),
        response(2, "E1", Some("D01"), 2),
    ]);

    let summary = Transformer::new(&mut store).transform().unwrap();

    assert_eq!(summary.dimension_counts["dim_descriptor"], 1);
    assert_eq!(summary.dimension_counts["dim_student"], 2);
    assert_eq!(summary.fact_row_count, 1);
    assert_eq!(summary.excluded_rows, 2);
}

#[test]
fn conflicting_attributes_resolve_to_smallest_value() {
    let mut first = response(1, "E1", Some("D01"), 1);
    first.school_name = Some("Zeta".to_string());
    let mut second = response(1, "E1", Some("D01"), 0);
    second.school_name = Some("Beta".to_string());
    let mut third = response(2, "E1", Some("D01"), 0);
    third.school_name = None;
    let mut store = seeded_store(&[first, second, third]);

    Transformer::new(&mut store).transform().unwrap();

    let name: String = store
        .connection()
        .query_row("SELECT ESC_NOME FROM dim_school", [], |row| row.get(0))
        .unwrap();
    assert_eq!(name, "Beta");
}

#[test]
fn school_takes_smallest_named_municipality() {
    let mut first = response(1, "E1", Some("D01"), 1);
    first.municipality_name = Some("Bravo".to_string());
    let mut second = response(2, "E1", Some("D01"), 1);
    second.municipality_name = Some("Alpha".to_string());
    let mut orphan = response(3, "E2", Some("D01"), 1);
    orphan.municipality_name = None;
    let mut store = seeded_store(&[first, second, orphan]);

    let summary = Transformer::new(&mut store).transform().unwrap();
    assert_eq!(summary.dimension_counts["dim_municipality"], 2);

    let city: String = store
        .connection()
        .query_row(
            "SELECT m.MUN_NOME FROM dim_school s \
             JOIN dim_municipality m ON m.municipality_sk = s.municipality_sk \
             WHERE s.ESC_INEP = 'E1'",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(city, "Alpha");
    assert_eq!(
        count(
            &store,
            "SELECT COUNT(*) FROM dim_school WHERE ESC_INEP = 'E2' AND municipality_sk IS NULL"
        ),
        1
    );
    // The school without a municipality still has facts.
    assert_eq!(summary.fact_row_count, 3);
}

#[test]
fn rerun_rebuilds_identical_model() {
    let records: Vec<FlatRecord> = (1..=4)
        .flat_map(|student| {
            ["D01", "D02"]
                .into_iter()
                .map(move |code| response(student, "E1", Some(code), student % 2))
        })
        .collect();
    let mut store = seeded_store(&records);

    let first = Transformer::new(&mut store).transform().unwrap();
    let second = Transformer::new(&mut store).transform().unwrap();
    assert_eq!(first, second);
    assert_eq!(
        count(&store, "SELECT COUNT(*) FROM vw_student_response"),
        second.fact_row_count
    );
}

#[test]
fn empty_raw_table_is_missing_raw_data() {
    let mut store = RowStore::open_in_memory().unwrap();
    let err = Transformer::new(&mut store).transform().unwrap_err();
    assert!(matches!(err, TransformError::MissingRawData));
    assert_eq!(err.kind(), ErrorKind::MissingRawData);
    assert_eq!(err.table(), Some("raw_assessment"));
}

#[test]
fn fact_foreign_keys_are_indexed() {
    let mut store = seeded_store(&[response(1, "E1", Some("D01"), 1)]);
    Transformer::new(&mut store).transform().unwrap();
    assert_eq!(
        count(
            &store,
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'index' \
             AND tbl_name = 'fact_student_response' AND name LIKE 'idx_fact_%'"
        ),
        7
    );
}

#[test]
fn non_integer_student_ids_are_excluded() {
    let mut store = seeded_store(&[
        response(1, "E1", Some("D01"), 1),
        response(2, "E1", Some("D01"), 0),
        response(3, "E1", Some("D01"), 1),
    ]);
    store
        .connection()
        .execute("UPDATE raw_assessment SET ALU_ID = 'A12' WHERE ALU_ID = 2", [])
        .unwrap();

    let summary = Transformer::new(&mut store).transform().unwrap();

    assert_eq!(summary.dimension_counts["dim_student"], 2);
    assert_eq!(summary.fact_row_count, 2);
    assert_eq!(summary.excluded_rows, 1);
    assert_eq!(
        count(
            &store,
            "SELECT COUNT(*) FROM dim_student WHERE typeof(ALU_ID) <> 'integer'"
        ),
        0
    );
}

#[test]
fn builds_school_competency_and_municipal_rollups() {
    let mut records = vec![
        response(1, "E1", Some("D01"), 1),
        response(1, "E1", Some("D02"), 1),
        response(2, "E1", Some("D01"), 0),
        response(2, "E1", Some("D02"), 1),
        response(3, "E2", Some("D01"), 0),
        response(3, "E2", Some("D02"), 0),
    ];
    for (student, correct) in [(4, 1), (5, 0)] {
        let mut record = response(student, "E3", Some("D01"), correct);
        record.municipality_name = Some("Bravo".to_string());
        records.push(record);
    }
    let mut store = seeded_store(&records);

    let summary = Transformer::new(&mut store).transform().unwrap();

    assert_eq!(summary.aggregate_counts["fact_school_performance"], 3);
    assert_eq!(summary.aggregate_counts["fact_competency_performance"], 5);
    assert_eq!(summary.aggregate_counts["fact_municipality_performance"], 2);

    let (students, answers, correct, rate, competencies): (i64, i64, i64, f64, i64) = store
        .connection()
        .query_row(
            "SELECT p.total_students, p.total_answers, p.total_correct, p.correct_rate, \
             p.competency_count FROM fact_school_performance p \
             JOIN dim_school e ON e.school_sk = p.school_sk WHERE e.ESC_INEP = 'E1'",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?)),
        )
        .unwrap();
    assert_eq!((students, answers, correct, competencies), (2, 4, 3, 2));
    assert!((rate - 75.0).abs() < 1e-9);

    // Alpha averages E1 (75%) and E2 (0%); Bravo has E3 at 50%.
    let ranking: Vec<(String, i64, i64, f64)> = {
        let conn = store.connection();
        let mut stmt = conn
            .prepare(
                "SELECT m.MUN_NOME, f.school_count, f.ranking, f.correct_rate \
                 FROM fact_municipality_performance f \
                 JOIN dim_municipality m ON m.municipality_sk = f.municipality_sk \
                 ORDER BY f.ranking",
            )
            .unwrap();
        stmt.query_map([], |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
        })
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap()
    };
    assert_eq!(ranking.len(), 2);
    assert_eq!((ranking[0].0.as_str(), ranking[0].1, ranking[0].2), ("Bravo", 1, 1));
    assert_eq!((ranking[1].0.as_str(), ranking[1].1, ranking[1].2), ("Alpha", 2, 2));
    assert!((ranking[1].3 - 37.5).abs() < 1e-9);
}

#[test]
fn failed_rebuild_keeps_previous_model() {
    let mut store = seeded_store(&[
        response(1, "E1", Some("D01"), 1),
        response(2, "E2", Some("D02"), 0),
    ]);
    let first = Transformer::new(&mut store).transform().unwrap();

    // A table holding the name of a dimension index makes the rebuild fail.
    store
        .connection()
        .execute_batch(
            "DROP INDEX ux_dim_student_nk; CREATE TABLE ux_dim_student_nk (id INTEGER);",
        )
        .unwrap();
    store
        .append_records(&[response(3, "E3", Some("D03"), 1)])
        .unwrap();

    let err = Transformer::new(&mut store).transform().unwrap_err();
    assert!(matches!(err, TransformError::Build { table: "dim_student", .. }));
    assert_eq!(err.kind(), ErrorKind::ReferentialIntegrityError);
    assert_eq!(err.table(), Some("dim_student"));

    assert_eq!(
        count(&store, "SELECT COUNT(*) FROM dim_student"),
        first.dimension_counts["dim_student"]
    );
    assert_eq!(
        count(&store, "SELECT COUNT(*) FROM dim_school"),
        first.dimension_counts["dim_school"]
    );
    assert_eq!(
        count(&store, "SELECT COUNT(*) FROM fact_student_response"),
        first.fact_row_count
    );
    assert_eq!(
        count(&store, "SELECT COUNT(*) FROM vw_student_response"),
        first.fact_row_count
    );
}
