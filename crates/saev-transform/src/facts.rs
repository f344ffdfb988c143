//! Response fact load, aggregated facts and integrity checks.

use saev_model::{
    DIMENSION_TABLES, FACT_COMPETENCY_PERFORMANCE, FACT_MUNICIPALITY_PERFORMANCE,
    FACT_SCHOOL_PERFORMANCE, FACT_STUDENT_RESPONSE, TableDef,
};

/// Aggregates raw responses at the fact grain.
///
/// Only rows with a correctness flag of 0 or 1 contribute, and the inner
/// joins drop rows whose natural keys have no dimension member, so
/// `ACERTO + ERRO` equals the number of raw rows behind each fact.
/// `municipality_sk` is read from the school and does not refine the grain.
pub const FACT_LOAD_SQL: &str = "INSERT INTO fact_student_response (\
fact_id, student_sk, school_sk, municipality_sk, grade_sk, subject_sk, time_sk, descriptor_sk, \
TUR_PERIODO, TUR_NOME, AVA_NOME, TES_NOME, ACERTO, ERRO) \
SELECT ROW_NUMBER() OVER (ORDER BY s.student_sk, e.school_sk, g.grade_sk, r.TUR_PERIODO, \
r.TUR_NOME, r.AVA_NOME, t.time_sk, d.subject_sk, r.TES_NOME, c.descriptor_sk), \
s.student_sk, e.school_sk, e.municipality_sk, g.grade_sk, d.subject_sk, t.time_sk, c.descriptor_sk, \
r.TUR_PERIODO, r.TUR_NOME, r.AVA_NOME, r.TES_NOME, \
SUM(CASE WHEN r.ATR_CERTO = 1 THEN 1 ELSE 0 END), \
SUM(CASE WHEN r.ATR_CERTO = 0 THEN 1 ELSE 0 END) \
FROM raw_assessment r \
JOIN dim_student s ON s.ALU_ID = r.ALU_ID \
JOIN dim_school e ON e.ESC_INEP = r.ESC_INEP \
JOIN dim_grade g ON g.SER_NUMBER = r.SER_NUMBER \
JOIN dim_subject d ON d.DIS_NOME = r.DIS_NOME \
JOIN dim_time t ON t.AVA_ANO = r.AVA_ANO \
JOIN dim_descriptor c ON c.MTI_CODIGO = r.MTI_CODIGO \
WHERE r.ATR_CERTO IN (0, 1) \
GROUP BY s.student_sk, e.school_sk, e.municipality_sk, g.grade_sk, d.subject_sk, t.time_sk, \
c.descriptor_sk, r.TUR_PERIODO, r.TUR_NOME, r.AVA_NOME, r.TES_NOME";

/// Per (school, grade, subject, year) rollup of the response facts.
pub const SCHOOL_PERFORMANCE_SQL: &str = "INSERT INTO fact_school_performance (\
school_sk, grade_sk, subject_sk, time_sk, total_students, total_answers, total_correct, \
correct_rate, competency_count) \
SELECT school_sk, grade_sk, subject_sk, time_sk, COUNT(DISTINCT student_sk), \
SUM(ACERTO + ERRO), SUM(ACERTO), 100.0 * SUM(ACERTO) / SUM(ACERTO + ERRO), \
COUNT(DISTINCT descriptor_sk) \
FROM fact_student_response \
GROUP BY school_sk, grade_sk, subject_sk, time_sk";

/// Per-competency rollup at the school grain.
pub const COMPETENCY_PERFORMANCE_SQL: &str = "INSERT INTO fact_competency_performance (\
school_sk, grade_sk, subject_sk, descriptor_sk, time_sk, total_students, total_answers, \
total_correct, correct_rate) \
SELECT school_sk, grade_sk, subject_sk, descriptor_sk, time_sk, COUNT(DISTINCT student_sk), \
SUM(ACERTO + ERRO), SUM(ACERTO), 100.0 * SUM(ACERTO) / SUM(ACERTO + ERRO) \
FROM fact_student_response \
GROUP BY school_sk, grade_sk, subject_sk, descriptor_sk, time_sk";

/// Municipal rollup of the school table, ranked within each
/// (grade, subject, year). Schools without a municipality are left out.
pub const MUNICIPALITY_PERFORMANCE_SQL: &str = "INSERT INTO fact_municipality_performance (\
municipality_sk, grade_sk, subject_sk, time_sk, school_count, total_students, total_answers, \
total_correct, correct_rate, ranking) \
SELECT e.municipality_sk, p.grade_sk, p.subject_sk, p.time_sk, COUNT(*), \
SUM(p.total_students), SUM(p.total_answers), SUM(p.total_correct), AVG(p.correct_rate), \
RANK() OVER (PARTITION BY p.grade_sk, p.subject_sk, p.time_sk ORDER BY AVG(p.correct_rate) DESC) \
FROM fact_school_performance p \
JOIN dim_school e ON e.school_sk = p.school_sk \
WHERE e.municipality_sk IS NOT NULL \
GROUP BY e.municipality_sk, p.grade_sk, p.subject_sk, p.time_sk";

/// Aggregated facts with their load statements, in build order.
pub const AGGREGATE_LOADS: [(TableDef, &str); 3] = [
    (FACT_SCHOOL_PERFORMANCE, SCHOOL_PERFORMANCE_SQL),
    (FACT_COMPETENCY_PERFORMANCE, COMPETENCY_PERFORMANCE_SQL),
    (FACT_MUNICIPALITY_PERFORMANCE, MUNICIPALITY_PERFORMANCE_SQL),
];

/// Raw rows accounted for by the facts.
pub const CONTRIBUTING_ROWS_SQL: &str =
    "SELECT COALESCE(SUM(ACERTO + ERRO), 0) FROM fact_student_response";

/// One orphan-key query per fact foreign key.
///
/// `municipality_sk` may be NULL (school without a resolvable municipality);
/// every other key must be present.
#[must_use]
pub fn orphan_key_checks() -> Vec<(&'static str, String)> {
    DIMENSION_TABLES
        .iter()
        .filter_map(|dimension| dimension.primary_key.map(|key| (key, dimension.name)))
        .map(|(key, dimension)| {
            let null_check = if key == "municipality_sk" {
                format!("f.{key} IS NOT NULL AND ")
            } else {
                String::new()
            };
            let sql = format!(
                "SELECT COUNT(*) FROM {fact} f WHERE {null_check}\
                 NOT EXISTS (SELECT 1 FROM {dimension} d WHERE d.{key} = f.{key})",
                fact = FACT_STUDENT_RESPONSE.name,
            );
            (key, sql)
        })
        .collect()
}
