//! Tests for saev-model types.

use saev_model::{
    Dialect, ErrorKind, FlatRecord, PipelineConfig, PipelineOutcome, PipelineStage,
    RAW_ASSESSMENT, RecordColumn, StageFailure, model_tables,
};

#[test]
fn flat_record_deserializes_from_header_names() {
    let json = r#"{
        "MUN_UF": "SP", "MUN_NOME": "Alpha", "ESC_INEP": "35000001", "ESC_NOME": "Escola 1",
        "SER_NUMBER": 5, "SER_NOME": "5 ano", "TUR_PERIODO": "Manha", "TUR_NOME": "A",
        "ALU_ID": 42, "ALU_NOME": "Ana", "ALU_CPF": "000", "AVA_NOME": "Diagnostica",
        "AVA_ANO": 2024, "DIS_NOME": "Matematica", "TES_NOME": "Prova 1", "TEG_ORDEM": 1,
        "ATR_RESPOSTA": "B", "ATR_CERTO": 1, "MTI_CODIGO": "D01", "MTI_DESCRITOR": "Soma"
    }"#;
    let record: FlatRecord = serde_json::from_str(json).expect("deserialize record");
    assert_eq!(record.student_id, Some(42));
    assert_eq!(record.descriptor_code.as_deref(), Some("D01"));
    assert!(record.is_usable());
    assert!(record.has_valid_correctness());
}

#[test]
fn raw_table_types_follow_record_columns() {
    for (column, def) in RecordColumn::ALL.iter().zip(RAW_ASSESSMENT.columns) {
        assert_eq!(column.name(), def.name);
        assert_eq!(column.sql_type(), def.sql_type);
    }
}

#[test]
fn every_table_renders_in_both_dialects() {
    for table in model_tables().iter().chain([&RAW_ASSESSMENT]) {
        let sqlite = table.create_sql(Dialect::Sqlite);
        let duckdb = table.create_sql(Dialect::DuckDb);
        assert!(sqlite.starts_with(&format!("CREATE TABLE {} (", table.name)));
        assert!(!duckdb.contains("PRIMARY KEY"));
        assert_eq!(
            table.insert_sql().matches('?').count(),
            table.columns.len()
        );
    }
}

#[test]
fn config_loads_from_file() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("saev.toml");
    std::fs::write(
        &path,
        "sources = [\"input\"]\nstore_path = \"out/run.db\"\nreplicate_columnar = true\n",
    )
    .expect("write config");

    let config = PipelineConfig::load(&path).expect("load config");
    assert!(config.replicate_columnar);
    assert_eq!(
        config.columnar_store_path(),
        std::path::PathBuf::from("out/run.duckdb")
    );
}

#[test]
fn unknown_config_file_is_invalid_config() {
    let err = PipelineConfig::load(std::path::Path::new("/nonexistent/saev.toml")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidConfig);
}

#[test]
fn failed_outcome_keeps_furthest_stage() {
    let mut outcome = PipelineOutcome::new();
    outcome.advance(PipelineStage::StructureReady);
    outcome.advance(PipelineStage::Loaded);
    outcome.fail(StageFailure {
        stage: PipelineStage::Transformed,
        kind: ErrorKind::MissingRawData,
        resource: Some("raw_assessment".to_string()),
        message: "raw table is empty".to_string(),
    });
    assert!(!outcome.is_success());
    assert_eq!(outcome.reached, PipelineStage::Loaded);

    let json = serde_json::to_value(&outcome).expect("serialize outcome");
    assert_eq!(json["reached"], "loaded");
    assert_eq!(json["failure"]["kind"], "missing_raw_data");
}
