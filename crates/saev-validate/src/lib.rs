//! Data-quality checks over the raw assessment table.
//!
//! Every check is a single aggregate query; nothing here writes to the
//! store. Non-zero counters are advisory. Only an empty table blocks the
//! dimensional transform, and that decision belongs to the caller.

use saev_model::ValidationSummary;
use saev_store::{Result, RowStore};
use tracing::{info, warn};

/// A named aggregate over `raw_assessment`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QualityCheck {
    TotalRecords,
    NullStudents,
    InvalidAnswers,
    UniqueStudents,
    Schools,
    Cities,
    NullDescriptors,
    NonIntegerKeys,
}

impl QualityCheck {
    pub const ALL: [QualityCheck; 8] = [
        Self::TotalRecords,
        Self::NullStudents,
        Self::InvalidAnswers,
        Self::UniqueStudents,
        Self::Schools,
        Self::Cities,
        Self::NullDescriptors,
        Self::NonIntegerKeys,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::TotalRecords => "total_records",
            Self::NullStudents => "null_students",
            Self::InvalidAnswers => "invalid_answers",
            Self::UniqueStudents => "unique_students",
            Self::Schools => "schools",
            Self::Cities => "cities",
            Self::NullDescriptors => "null_descriptors",
            Self::NonIntegerKeys => "non_integer_keys",
        }
    }

    /// Aggregate query. A NULL correctness flag counts as invalid; a NULL
    /// identifier is not counted as non-integer.
    #[must_use]
    pub const fn sql(self) -> &'static str {
        match self {
            Self::TotalRecords => "SELECT COUNT(*) FROM raw_assessment",
            Self::NullStudents => "SELECT COUNT(*) FROM raw_assessment WHERE ALU_ID IS NULL",
            Self::InvalidAnswers => {
                "SELECT COUNT(*) FROM raw_assessment \
                 WHERE ATR_CERTO IS NULL OR ATR_CERTO NOT IN (0, 1)"
            }
            Self::UniqueStudents => "SELECT COUNT(DISTINCT ALU_ID) FROM raw_assessment",
            Self::Schools => "SELECT COUNT(DISTINCT ESC_INEP) FROM raw_assessment",
            Self::Cities => "SELECT COUNT(DISTINCT MUN_NOME) FROM raw_assessment",
            Self::NullDescriptors => {
                "SELECT COUNT(*) FROM raw_assessment WHERE MTI_CODIGO IS NULL"
            }
            Self::NonIntegerKeys => {
                "SELECT COUNT(*) FROM raw_assessment \
                 WHERE (ALU_ID IS NOT NULL AND typeof(ALU_ID) <> 'integer') \
                 OR (SER_NUMBER IS NOT NULL AND typeof(SER_NUMBER) <> 'integer') \
                 OR (AVA_ANO IS NOT NULL AND typeof(AVA_ANO) <> 'integer')"
            }
        }
    }

    fn record(self, summary: &mut ValidationSummary, value: u64) {
        let slot = match self {
            Self::TotalRecords => &mut summary.total_records,
            Self::NullStudents => &mut summary.null_student_count,
            Self::InvalidAnswers => &mut summary.invalid_answer_count,
            Self::UniqueStudents => &mut summary.unique_students,
            Self::Schools => &mut summary.school_count,
            Self::Cities => &mut summary.city_count,
            Self::NullDescriptors => &mut summary.null_descriptor_count,
            Self::NonIntegerKeys => &mut summary.non_integer_key_count,
        };
        *slot = value;
    }
}

/// Computes every quality aggregate over the raw table.
pub fn validate(store: &RowStore) -> Result<ValidationSummary> {
    let mut summary = ValidationSummary::default();
    for check in QualityCheck::ALL {
        let value = store.query_count(check.sql())?;
        check.record(&mut summary, value);
    }

    info!(
        total_records = summary.total_records,
        unique_students = summary.unique_students,
        schools = summary.school_count,
        cities = summary.city_count,
        "validation complete"
    );
    for note in summary.advisories() {
        warn!("{note}");
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_store_reports_zero() {
        let store = RowStore::open_in_memory().unwrap();
        let summary = validate(&store).unwrap();
        assert_eq!(summary, ValidationSummary::default());
        assert_eq!(summary.advisories(), vec!["raw table is empty".to_string()]);
    }

    #[test]
    fn check_names_are_unique() {
        let mut names: Vec<_> = QualityCheck::ALL.iter().map(|c| c.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), QualityCheck::ALL.len());
    }
}
