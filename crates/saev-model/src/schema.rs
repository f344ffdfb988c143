//! Table definitions shared by the row store and the columnar replica.
//!
//! All identifiers rendered into SQL come from the static definitions in
//! this module; user-supplied values are always bound as parameters.

use crate::record::RecordColumn;

/// Logical column type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
    Integer,
    Real,
    Text,
}

/// Target SQL dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// Row-oriented store (SQLite).
    Sqlite,
    /// Columnar replica (DuckDB).
    DuckDb,
}

impl SqlType {
    #[must_use]
    pub const fn render(self, dialect: Dialect) -> &'static str {
        match (self, dialect) {
            (Self::Integer, Dialect::Sqlite) => "INTEGER",
            (Self::Integer, Dialect::DuckDb) => "BIGINT",
            (Self::Real, Dialect::Sqlite) => "REAL",
            (Self::Real, Dialect::DuckDb) => "DOUBLE",
            (Self::Text, Dialect::Sqlite) => "TEXT",
            (Self::Text, Dialect::DuckDb) => "VARCHAR",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: &'static str,
    pub sql_type: SqlType,
}

impl ColumnDef {
    #[must_use]
    pub const fn integer(name: &'static str) -> Self {
        Self {
            name,
            sql_type: SqlType::Integer,
        }
    }

    #[must_use]
    pub const fn real(name: &'static str) -> Self {
        Self {
            name,
            sql_type: SqlType::Real,
        }
    }

    #[must_use]
    pub const fn text(name: &'static str) -> Self {
        Self {
            name,
            sql_type: SqlType::Text,
        }
    }

    const fn record(column: RecordColumn) -> Self {
        Self {
            name: column.name(),
            sql_type: column.sql_type(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexDef {
    pub name: &'static str,
    pub columns: &'static [&'static str],
    pub unique: bool,
}

impl IndexDef {
    const fn plain(name: &'static str, columns: &'static [&'static str]) -> Self {
        Self {
            name,
            columns,
            unique: false,
        }
    }

    const fn unique(name: &'static str, columns: &'static [&'static str]) -> Self {
        Self {
            name,
            columns,
            unique: true,
        }
    }
}

/// Physical table layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableDef {
    pub name: &'static str,
    /// Integer row key. For dimensions this is the surrogate key.
    pub primary_key: Option<&'static str>,
    pub columns: &'static [ColumnDef],
    pub indexes: &'static [IndexDef],
}

impl TableDef {
    #[must_use]
    pub fn column_names(&self) -> Vec<&'static str> {
        self.columns.iter().map(|column| column.name).collect()
    }

    /// `CREATE TABLE` statement for the given dialect.
    ///
    /// The DuckDB rendering omits the primary-key constraint so bulk appends
    /// do not maintain an index while rows are copied.
    #[must_use]
    pub fn create_sql(&self, dialect: Dialect) -> String {
        let columns: Vec<String> = self
            .columns
            .iter()
            .map(|column| {
                let ty = column.sql_type.render(dialect);
                match (self.primary_key == Some(column.name), dialect) {
                    (true, Dialect::Sqlite) => format!("{} {ty} PRIMARY KEY", column.name),
                    (true, Dialect::DuckDb) => format!("{} {ty} NOT NULL", column.name),
                    (false, _) => format!("{} {ty}", column.name),
                }
            })
            .collect();
        format!("CREATE TABLE {} ({})", self.name, columns.join(", "))
    }

    #[must_use]
    pub fn drop_sql(&self) -> String {
        format!("DROP TABLE IF EXISTS {}", self.name)
    }

    /// Positional insert covering every column.
    #[must_use]
    pub fn insert_sql(&self) -> String {
        let placeholders = vec!["?"; self.columns.len()].join(", ");
        format!(
            "INSERT INTO {} ({}) VALUES ({placeholders})",
            self.name,
            self.column_names().join(", ")
        )
    }

    /// Full-table read in a stable order (primary key when present).
    #[must_use]
    pub fn select_sql(&self) -> String {
        let mut sql = format!("SELECT {} FROM {}", self.column_names().join(", "), self.name);
        if let Some(key) = self.primary_key {
            sql.push_str(" ORDER BY ");
            sql.push_str(key);
        }
        sql
    }

    #[must_use]
    pub fn count_sql(&self) -> String {
        format!("SELECT COUNT(*) FROM {}", self.name)
    }

    #[must_use]
    pub fn index_sql(&self) -> Vec<String> {
        self.indexes
            .iter()
            .map(|index| {
                format!(
                    "CREATE {}INDEX IF NOT EXISTS {} ON {} ({})",
                    if index.unique { "UNIQUE " } else { "" },
                    index.name,
                    self.name,
                    index.columns.join(", ")
                )
            })
            .collect()
    }

    #[must_use]
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|column| column.name == name)
    }
}

/// Raw flat table, one row per response.
pub const RAW_ASSESSMENT: TableDef = TableDef {
    name: "raw_assessment",
    primary_key: None,
    columns: &[
        ColumnDef::record(RecordColumn::StateCode),
        ColumnDef::record(RecordColumn::MunicipalityName),
        ColumnDef::record(RecordColumn::SchoolId),
        ColumnDef::record(RecordColumn::SchoolName),
        ColumnDef::record(RecordColumn::GradeNumber),
        ColumnDef::record(RecordColumn::GradeName),
        ColumnDef::record(RecordColumn::ClassPeriod),
        ColumnDef::record(RecordColumn::ClassName),
        ColumnDef::record(RecordColumn::StudentId),
        ColumnDef::record(RecordColumn::StudentName),
        ColumnDef::record(RecordColumn::StudentDocument),
        ColumnDef::record(RecordColumn::AssessmentName),
        ColumnDef::record(RecordColumn::AssessmentYear),
        ColumnDef::record(RecordColumn::SubjectName),
        ColumnDef::record(RecordColumn::TestName),
        ColumnDef::record(RecordColumn::ItemOrder),
        ColumnDef::record(RecordColumn::AnswerOption),
        ColumnDef::record(RecordColumn::Correct),
        ColumnDef::record(RecordColumn::DescriptorCode),
        ColumnDef::record(RecordColumn::DescriptorText),
    ],
    indexes: &[
        IndexDef::plain("idx_raw_municipality", &["MUN_NOME"]),
        IndexDef::plain("idx_raw_school", &["ESC_INEP"]),
        IndexDef::plain("idx_raw_year", &["AVA_ANO"]),
        IndexDef::plain("idx_raw_subject", &["DIS_NOME"]),
        IndexDef::plain("idx_raw_grade", &["SER_NUMBER"]),
    ],
};

pub const DIM_MUNICIPALITY: TableDef = TableDef {
    name: "dim_municipality",
    primary_key: Some("municipality_sk"),
    columns: &[
        ColumnDef::integer("municipality_sk"),
        ColumnDef::text("MUN_UF"),
        ColumnDef::text("MUN_NOME"),
    ],
    indexes: &[IndexDef::unique(
        "ux_dim_municipality_nk",
        &["MUN_UF", "MUN_NOME"],
    )],
};

pub const DIM_SCHOOL: TableDef = TableDef {
    name: "dim_school",
    primary_key: Some("school_sk"),
    columns: &[
        ColumnDef::integer("school_sk"),
        ColumnDef::text("ESC_INEP"),
        ColumnDef::text("ESC_NOME"),
        ColumnDef::integer("municipality_sk"),
    ],
    indexes: &[
        IndexDef::unique("ux_dim_school_nk", &["ESC_INEP"]),
        IndexDef::plain("idx_dim_school_municipality", &["municipality_sk"]),
    ],
};

pub const DIM_GRADE: TableDef = TableDef {
    name: "dim_grade",
    primary_key: Some("grade_sk"),
    columns: &[
        ColumnDef::integer("grade_sk"),
        ColumnDef::integer("SER_NUMBER"),
        ColumnDef::text("SER_NOME"),
    ],
    indexes: &[IndexDef::unique("ux_dim_grade_nk", &["SER_NUMBER"])],
};

pub const DIM_SUBJECT: TableDef = TableDef {
    name: "dim_subject",
    primary_key: Some("subject_sk"),
    columns: &[ColumnDef::integer("subject_sk"), ColumnDef::text("DIS_NOME")],
    indexes: &[IndexDef::unique("ux_dim_subject_nk", &["DIS_NOME"])],
};

pub const DIM_TIME: TableDef = TableDef {
    name: "dim_time",
    primary_key: Some("time_sk"),
    columns: &[ColumnDef::integer("time_sk"), ColumnDef::integer("AVA_ANO")],
    indexes: &[IndexDef::unique("ux_dim_time_nk", &["AVA_ANO"])],
};

pub const DIM_DESCRIPTOR: TableDef = TableDef {
    name: "dim_descriptor",
    primary_key: Some("descriptor_sk"),
    columns: &[
        ColumnDef::integer("descriptor_sk"),
        ColumnDef::text("MTI_CODIGO"),
        ColumnDef::text("MTI_DESCRITOR"),
    ],
    indexes: &[IndexDef::unique("ux_dim_descriptor_nk", &["MTI_CODIGO"])],
};

pub const DIM_STUDENT: TableDef = TableDef {
    name: "dim_student",
    primary_key: Some("student_sk"),
    columns: &[
        ColumnDef::integer("student_sk"),
        ColumnDef::integer("ALU_ID"),
        ColumnDef::text("ALU_NOME"),
        ColumnDef::text("ALU_CPF"),
    ],
    indexes: &[IndexDef::unique("ux_dim_student_nk", &["ALU_ID"])],
};

/// Aggregated responses at the (student, school, grade, period, class,
/// assessment, subject, test, competency) grain.
pub const FACT_STUDENT_RESPONSE: TableDef = TableDef {
    name: "fact_student_response",
    primary_key: Some("fact_id"),
    columns: &[
        ColumnDef::integer("fact_id"),
        ColumnDef::integer("student_sk"),
        ColumnDef::integer("school_sk"),
        ColumnDef::integer("municipality_sk"),
        ColumnDef::integer("grade_sk"),
        ColumnDef::integer("subject_sk"),
        ColumnDef::integer("time_sk"),
        ColumnDef::integer("descriptor_sk"),
        ColumnDef::text("TUR_PERIODO"),
        ColumnDef::text("TUR_NOME"),
        ColumnDef::text("AVA_NOME"),
        ColumnDef::text("TES_NOME"),
        ColumnDef::integer("ACERTO"),
        ColumnDef::integer("ERRO"),
    ],
    indexes: &[
        IndexDef::plain("idx_fact_student", &["student_sk"]),
        IndexDef::plain("idx_fact_school", &["school_sk"]),
        IndexDef::plain("idx_fact_municipality", &["municipality_sk"]),
        IndexDef::plain("idx_fact_grade", &["grade_sk"]),
        IndexDef::plain("idx_fact_subject", &["subject_sk"]),
        IndexDef::plain("idx_fact_time", &["time_sk"]),
        IndexDef::plain("idx_fact_descriptor", &["descriptor_sk"]),
    ],
};

/// School results per (school, grade, subject, year).
///
/// `correct_rate` is the percentage of correct answers; `competency_count`
/// is the number of distinct competencies assessed.
pub const FACT_SCHOOL_PERFORMANCE: TableDef = TableDef {
    name: "fact_school_performance",
    primary_key: None,
    columns: &[
        ColumnDef::integer("school_sk"),
        ColumnDef::integer("grade_sk"),
        ColumnDef::integer("subject_sk"),
        ColumnDef::integer("time_sk"),
        ColumnDef::integer("total_students"),
        ColumnDef::integer("total_answers"),
        ColumnDef::integer("total_correct"),
        ColumnDef::real("correct_rate"),
        ColumnDef::integer("competency_count"),
    ],
    indexes: &[
        IndexDef::unique(
            "ux_fact_school_performance",
            &["school_sk", "grade_sk", "subject_sk", "time_sk"],
        ),
        IndexDef::plain("idx_fact_school_performance_time", &["time_sk"]),
    ],
};

/// School results per competency.
pub const FACT_COMPETENCY_PERFORMANCE: TableDef = TableDef {
    name: "fact_competency_performance",
    primary_key: None,
    columns: &[
        ColumnDef::integer("school_sk"),
        ColumnDef::integer("grade_sk"),
        ColumnDef::integer("subject_sk"),
        ColumnDef::integer("descriptor_sk"),
        ColumnDef::integer("time_sk"),
        ColumnDef::integer("total_students"),
        ColumnDef::integer("total_answers"),
        ColumnDef::integer("total_correct"),
        ColumnDef::real("correct_rate"),
    ],
    indexes: &[
        IndexDef::unique(
            "ux_fact_competency_performance",
            &["school_sk", "grade_sk", "subject_sk", "descriptor_sk", "time_sk"],
        ),
        IndexDef::plain("idx_fact_competency_descriptor", &["descriptor_sk"]),
    ],
};

/// Municipal rollup of [`FACT_SCHOOL_PERFORMANCE`].
///
/// `correct_rate` averages the school rates; `ranking` is the municipality's
/// position (1 = best, ties share a rank) among municipalities with the same
/// grade, subject and year.
pub const FACT_MUNICIPALITY_PERFORMANCE: TableDef = TableDef {
    name: "fact_municipality_performance",
    primary_key: None,
    columns: &[
        ColumnDef::integer("municipality_sk"),
        ColumnDef::integer("grade_sk"),
        ColumnDef::integer("subject_sk"),
        ColumnDef::integer("time_sk"),
        ColumnDef::integer("school_count"),
        ColumnDef::integer("total_students"),
        ColumnDef::integer("total_answers"),
        ColumnDef::integer("total_correct"),
        ColumnDef::real("correct_rate"),
        ColumnDef::integer("ranking"),
    ],
    indexes: &[IndexDef::unique(
        "ux_fact_municipality_performance",
        &["municipality_sk", "grade_sk", "subject_sk", "time_sk"],
    )],
};

/// Dimensions in build order: a dimension only references dimensions
/// listed before it.
pub const DIMENSION_TABLES: [TableDef; 7] = [
    DIM_MUNICIPALITY,
    DIM_SCHOOL,
    DIM_GRADE,
    DIM_SUBJECT,
    DIM_TIME,
    DIM_DESCRIPTOR,
    DIM_STUDENT,
];

/// Aggregated facts in build order; the municipal rollup reads the school
/// table.
pub const AGGREGATE_FACT_TABLES: [TableDef; 3] = [
    FACT_SCHOOL_PERFORMANCE,
    FACT_COMPETENCY_PERFORMANCE,
    FACT_MUNICIPALITY_PERFORMANCE,
];

/// Every model table in build order: dimensions, the response fact, then
/// the aggregated facts.
#[must_use]
pub fn model_tables() -> Vec<TableDef> {
    let mut tables = DIMENSION_TABLES.to_vec();
    tables.push(FACT_STUDENT_RESPONSE);
    tables.extend(AGGREGATE_FACT_TABLES);
    tables
}

/// Flat read model over the star schema for report and dashboard consumers.
pub const CONSUMER_VIEW: &str = "vw_student_response";

/// View definition; plain SQL accepted by both SQLite and DuckDB.
pub const CONSUMER_VIEW_SQL: &str = "CREATE VIEW vw_student_response AS \
SELECT m.MUN_UF, m.MUN_NOME, e.ESC_INEP, e.ESC_NOME, g.SER_NUMBER, g.SER_NOME, \
f.TUR_PERIODO, f.TUR_NOME, s.ALU_ID, s.ALU_NOME, f.AVA_NOME, t.AVA_ANO, d.DIS_NOME, \
f.TES_NOME, c.MTI_CODIGO, c.MTI_DESCRITOR, f.ACERTO, f.ERRO \
FROM fact_student_response f \
JOIN dim_student s ON s.student_sk = f.student_sk \
JOIN dim_school e ON e.school_sk = f.school_sk \
LEFT JOIN dim_municipality m ON m.municipality_sk = f.municipality_sk \
JOIN dim_grade g ON g.grade_sk = f.grade_sk \
JOIN dim_subject d ON d.subject_sk = f.subject_sk \
JOIN dim_time t ON t.time_sk = f.time_sk \
JOIN dim_descriptor c ON c.descriptor_sk = f.descriptor_sk";

pub const DROP_CONSUMER_VIEW_SQL: &str = "DROP VIEW IF EXISTS vw_student_response";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_table_follows_record_order() {
        let names = RAW_ASSESSMENT.column_names();
        let expected: Vec<&str> = RecordColumn::ALL.iter().map(|c| c.name()).collect();
        assert_eq!(names, expected);
    }

    #[test]
    fn create_sql_per_dialect() {
        insta::assert_snapshot!(
            DIM_SUBJECT.create_sql(Dialect::Sqlite),
            @"CREATE TABLE dim_subject (subject_sk INTEGER PRIMARY KEY, DIS_NOME TEXT)"
        );
        insta::assert_snapshot!(
            DIM_SUBJECT.create_sql(Dialect::DuckDb),
            @"CREATE TABLE dim_subject (subject_sk BIGINT NOT NULL, DIS_NOME VARCHAR)"
        );
    }

    #[test]
    fn insert_sql_binds_every_column() {
        insta::assert_snapshot!(
            DIM_TIME.insert_sql(),
            @"INSERT INTO dim_time (time_sk, AVA_ANO) VALUES (?, ?)"
        );
    }

    #[test]
    fn index_sql_renders_unique_and_plain() {
        let sql = DIM_SCHOOL.index_sql();
        assert_eq!(
            sql,
            vec![
                "CREATE UNIQUE INDEX IF NOT EXISTS ux_dim_school_nk ON dim_school (ESC_INEP)"
                    .to_string(),
                "CREATE INDEX IF NOT EXISTS idx_dim_school_municipality ON dim_school (municipality_sk)"
                    .to_string(),
            ]
        );
    }

    #[test]
    fn every_fact_foreign_key_is_indexed() {
        for table in DIMENSION_TABLES {
            let key = table.primary_key.expect("dimension key");
            assert!(FACT_STUDENT_RESPONSE.has_column(key), "{key} missing");
            assert!(
                FACT_STUDENT_RESPONSE
                    .indexes
                    .iter()
                    .any(|index| index.columns == [key]),
                "{key} not indexed"
            );
        }
    }

    #[test]
    fn real_columns_render_per_dialect() {
        insta::assert_snapshot!(
            FACT_MUNICIPALITY_PERFORMANCE.create_sql(Dialect::DuckDb),
            @"CREATE TABLE fact_municipality_performance (municipality_sk BIGINT, grade_sk BIGINT, subject_sk BIGINT, time_sk BIGINT, school_count BIGINT, total_students BIGINT, total_answers BIGINT, total_correct BIGINT, correct_rate DOUBLE, ranking BIGINT)"
        );
        assert_eq!(SqlType::Real.render(Dialect::Sqlite), "REAL");
    }

    #[test]
    fn model_tables_end_with_aggregates() {
        let names: Vec<&str> = model_tables().iter().map(|table| table.name).collect();
        assert_eq!(names.len(), 11);
        assert_eq!(names[7], "fact_student_response");
        assert_eq!(
            &names[8..],
            [
                "fact_school_performance",
                "fact_competency_performance",
                "fact_municipality_performance"
            ]
        );
    }

    #[test]
    fn select_sql_orders_by_key() {
        assert_eq!(
            DIM_TIME.select_sql(),
            "SELECT time_sk, AVA_ANO FROM dim_time ORDER BY time_sk"
        );
        assert_eq!(
            RAW_ASSESSMENT.count_sql(),
            "SELECT COUNT(*) FROM raw_assessment"
        );
    }
}
