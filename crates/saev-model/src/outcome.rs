//! Stage results and the structured pipeline outcome.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ErrorKind;

/// Pipeline progress, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Created,
    StructureReady,
    Loaded,
    Validated,
    Transformed,
    Migrated,
    Done,
}

impl PipelineStage {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::StructureReady => "structure_ready",
            Self::Loaded => "loaded",
            Self::Validated => "validated",
            Self::Transformed => "transformed",
            Self::Migrated => "migrated",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-file ingestion counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileLoad {
    pub path: PathBuf,
    pub rows_read: u64,
    pub rows_filtered: u64,
    pub rows_loaded: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestSummary {
    pub files: Vec<FileLoad>,
    pub rows_read: u64,
    /// Rows dropped by the municipality allow-list.
    pub rows_filtered: u64,
    pub rows_loaded: u64,
}

impl IngestSummary {
    pub fn push(&mut self, file: FileLoad) {
        self.rows_read += file.rows_read;
        self.rows_filtered += file.rows_filtered;
        self.rows_loaded += file.rows_loaded;
        self.files.push(file);
    }
}

/// Data-quality aggregates over the raw table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationSummary {
    pub total_records: u64,
    pub null_student_count: u64,
    pub invalid_answer_count: u64,
    pub unique_students: u64,
    pub school_count: u64,
    pub city_count: u64,
    pub null_descriptor_count: u64,
    /// Rows whose student, grade or year identifier is present but not an
    /// integer. The transform leaves these rows out of the model.
    #[serde(default)]
    pub non_integer_key_count: u64,
}

impl ValidationSummary {
    /// Advisory messages for non-zero quality counters.
    #[must_use]
    pub fn advisories(&self) -> Vec<String> {
        let mut notes = Vec::new();
        if self.total_records == 0 {
            notes.push("raw table is empty".to_string());
        }
        if self.null_student_count > 0 {
            notes.push(format!(
                "{} rows without a student identifier",
                self.null_student_count
            ));
        }
        if self.invalid_answer_count > 0 {
            notes.push(format!(
                "{} rows with a correctness flag outside {{0, 1}}",
                self.invalid_answer_count
            ));
        }
        if self.null_descriptor_count > 0 {
            notes.push(format!(
                "{} rows without a competency code",
                self.null_descriptor_count
            ));
        }
        if self.non_integer_key_count > 0 {
            notes.push(format!(
                "{} rows with a non-numeric student, grade or year identifier",
                self.non_integer_key_count
            ));
        }
        notes
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformSummary {
    /// Row count per dimension table.
    pub dimension_counts: BTreeMap<String, u64>,
    pub fact_row_count: u64,
    /// Row count per aggregated fact table.
    #[serde(default)]
    pub aggregate_counts: BTreeMap<String, u64>,
    /// Raw rows that did not contribute to any fact.
    pub excluded_rows: u64,
}

/// One source-versus-replica comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableCheck {
    pub table: String,
    pub metric: String,
    pub source: i64,
    pub destination: i64,
}

impl TableCheck {
    #[must_use]
    pub fn matches(&self) -> bool {
        self.source == self.destination
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationSummary {
    pub destination: PathBuf,
    pub tables_copied: u64,
    pub rows_copied: u64,
    pub verified: bool,
    pub checks: Vec<TableCheck>,
    /// Replica already existed and the copy was not forced.
    pub skipped: bool,
}

impl MigrationSummary {
    #[must_use]
    pub fn mismatches(&self) -> Vec<&TableCheck> {
        self.checks.iter().filter(|check| !check.matches()).collect()
    }
}

/// Error that stopped the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageFailure {
    /// Stage being attempted when the error occurred.
    pub stage: PipelineStage,
    pub kind: ErrorKind,
    /// Offending file path or table name, when known.
    pub resource: Option<String>,
    pub message: String,
}

/// Non-fatal problem surfaced alongside a successful result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageWarning {
    pub stage: PipelineStage,
    pub kind: Option<ErrorKind>,
    pub message: String,
}

/// Structured result of a pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineOutcome {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    /// Furthest stage completed.
    pub reached: PipelineStage,
    pub failure: Option<StageFailure>,
    pub warnings: Vec<StageWarning>,
    pub ingest: Option<IngestSummary>,
    pub validation: Option<ValidationSummary>,
    pub transform: Option<TransformSummary>,
    pub migration: Option<MigrationSummary>,
}

impl PipelineOutcome {
    #[must_use]
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            reached: PipelineStage::Created,
            failure: None,
            warnings: Vec::new(),
            ingest: None,
            validation: None,
            transform: None,
            migration: None,
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }

    pub fn advance(&mut self, stage: PipelineStage) {
        if stage > self.reached {
            self.reached = stage;
        }
    }

    pub fn warn(&mut self, stage: PipelineStage, kind: Option<ErrorKind>, message: impl Into<String>) {
        self.warnings.push(StageWarning {
            stage,
            kind,
            message: message.into(),
        });
    }

    pub fn fail(&mut self, failure: StageFailure) {
        self.failure = Some(failure);
        self.finished_at = Some(Utc::now());
    }

    pub fn finish(&mut self) {
        self.advance(PipelineStage::Done);
        self.finished_at = Some(Utc::now());
    }
}

impl Default for PipelineOutcome {
    fn default() -> Self {
        Self::new()
    }
}
