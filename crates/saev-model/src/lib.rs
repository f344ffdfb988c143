pub mod error;
pub mod options;
pub mod outcome;
pub mod record;
pub mod schema;

pub use error::{ConfigError, ErrorKind, Result};
pub use options::{DEFAULT_BATCH_SIZE, PipelineConfig};
pub use outcome::{
    FileLoad, IngestSummary, MigrationSummary, PipelineOutcome, PipelineStage, StageFailure,
    StageWarning, TableCheck, TransformSummary, ValidationSummary,
};
pub use record::{FlatRecord, RecordColumn, record_column_names};
pub use schema::{
    AGGREGATE_FACT_TABLES, CONSUMER_VIEW, CONSUMER_VIEW_SQL, ColumnDef, DIM_DESCRIPTOR, DIM_GRADE,
    DIM_MUNICIPALITY, DIM_SCHOOL, DIM_STUDENT, DIM_SUBJECT, DIM_TIME, DIMENSION_TABLES,
    DROP_CONSUMER_VIEW_SQL, Dialect, FACT_COMPETENCY_PERFORMANCE, FACT_MUNICIPALITY_PERFORMANCE,
    FACT_SCHOOL_PERFORMANCE, FACT_STUDENT_RESPONSE, IndexDef, RAW_ASSESSMENT, SqlType, TableDef,
    model_tables,
};
