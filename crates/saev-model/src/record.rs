//! Flat assessment record: one row per (student, test item) response.
//!
//! The column names are the fixed CSV header contract of the source exports
//! and double as the column names of the raw store table.

use serde::{Deserialize, Serialize};

use crate::schema::SqlType;

/// A column of the flat assessment record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RecordColumn {
    StateCode,
    MunicipalityName,
    SchoolId,
    SchoolName,
    GradeNumber,
    GradeName,
    ClassPeriod,
    ClassName,
    StudentId,
    StudentName,
    StudentDocument,
    AssessmentName,
    AssessmentYear,
    SubjectName,
    TestName,
    ItemOrder,
    AnswerOption,
    Correct,
    DescriptorCode,
    DescriptorText,
}

impl RecordColumn {
    /// All record columns in canonical (raw table) order.
    pub const ALL: [RecordColumn; 20] = [
        Self::StateCode,
        Self::MunicipalityName,
        Self::SchoolId,
        Self::SchoolName,
        Self::GradeNumber,
        Self::GradeName,
        Self::ClassPeriod,
        Self::ClassName,
        Self::StudentId,
        Self::StudentName,
        Self::StudentDocument,
        Self::AssessmentName,
        Self::AssessmentYear,
        Self::SubjectName,
        Self::TestName,
        Self::ItemOrder,
        Self::AnswerOption,
        Self::Correct,
        Self::DescriptorCode,
        Self::DescriptorText,
    ];

    /// Fields overwritten by anonymization. Natural keys are never part of this set.
    pub const SENSITIVE: [RecordColumn; 4] = [
        Self::StudentName,
        Self::StudentDocument,
        Self::MunicipalityName,
        Self::SchoolName,
    ];

    /// Header / column name as it appears in source files.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::StateCode => "MUN_UF",
            Self::MunicipalityName => "MUN_NOME",
            Self::SchoolId => "ESC_INEP",
            Self::SchoolName => "ESC_NOME",
            Self::GradeNumber => "SER_NUMBER",
            Self::GradeName => "SER_NOME",
            Self::ClassPeriod => "TUR_PERIODO",
            Self::ClassName => "TUR_NOME",
            Self::StudentId => "ALU_ID",
            Self::StudentName => "ALU_NOME",
            Self::StudentDocument => "ALU_CPF",
            Self::AssessmentName => "AVA_NOME",
            Self::AssessmentYear => "AVA_ANO",
            Self::SubjectName => "DIS_NOME",
            Self::TestName => "TES_NOME",
            Self::ItemOrder => "TEG_ORDEM",
            Self::AnswerOption => "ATR_RESPOSTA",
            Self::Correct => "ATR_CERTO",
            Self::DescriptorCode => "MTI_CODIGO",
            Self::DescriptorText => "MTI_DESCRITOR",
        }
    }

    /// Storage type in the raw table.
    #[must_use]
    pub const fn sql_type(self) -> SqlType {
        match self {
            Self::GradeNumber
            | Self::StudentId
            | Self::AssessmentYear
            | Self::ItemOrder
            | Self::Correct => SqlType::Integer,
            _ => SqlType::Text,
        }
    }

    #[must_use]
    pub fn is_sensitive(self) -> bool {
        Self::SENSITIVE.contains(&self)
    }

    /// Looks up a column by its exact header name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|column| column.name() == name)
    }
}

/// Header names in canonical order.
#[must_use]
pub fn record_column_names() -> Vec<&'static str> {
    RecordColumn::ALL.iter().map(|column| column.name()).collect()
}

/// One typed flat record.
///
/// Field names follow the source header so the struct (de)serializes
/// directly against CSV rows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatRecord {
    #[serde(rename = "MUN_UF")]
    pub state_code: Option<String>,
    #[serde(rename = "MUN_NOME")]
    pub municipality_name: Option<String>,
    #[serde(rename = "ESC_INEP")]
    pub school_id: Option<String>,
    #[serde(rename = "ESC_NOME")]
    pub school_name: Option<String>,
    #[serde(rename = "SER_NUMBER")]
    pub grade_number: Option<i64>,
    #[serde(rename = "SER_NOME")]
    pub grade_name: Option<String>,
    #[serde(rename = "TUR_PERIODO")]
    pub class_period: Option<String>,
    #[serde(rename = "TUR_NOME")]
    pub class_name: Option<String>,
    #[serde(rename = "ALU_ID")]
    pub student_id: Option<i64>,
    #[serde(rename = "ALU_NOME")]
    pub student_name: Option<String>,
    #[serde(rename = "ALU_CPF")]
    pub student_document: Option<String>,
    #[serde(rename = "AVA_NOME")]
    pub assessment_name: Option<String>,
    #[serde(rename = "AVA_ANO")]
    pub assessment_year: Option<i64>,
    #[serde(rename = "DIS_NOME")]
    pub subject_name: Option<String>,
    #[serde(rename = "TES_NOME")]
    pub test_name: Option<String>,
    #[serde(rename = "TEG_ORDEM")]
    pub item_order: Option<i64>,
    #[serde(rename = "ATR_RESPOSTA")]
    pub answer_option: Option<String>,
    #[serde(rename = "ATR_CERTO")]
    pub correct: Option<i64>,
    #[serde(rename = "MTI_CODIGO")]
    pub descriptor_code: Option<String>,
    #[serde(rename = "MTI_DESCRITOR")]
    pub descriptor_text: Option<String>,
}

impl FlatRecord {
    /// A record is usable when it identifies a student.
    #[must_use]
    pub fn is_usable(&self) -> bool {
        self.student_id.is_some()
    }

    /// Correctness flag is one of {0, 1}.
    #[must_use]
    pub fn has_valid_correctness(&self) -> bool {
        matches!(self.correct, Some(0 | 1))
    }

    /// Mutable access to a sensitive text field.
    pub fn sensitive_field_mut(&mut self, column: RecordColumn) -> Option<&mut Option<String>> {
        match column {
            RecordColumn::StudentName => Some(&mut self.student_name),
            RecordColumn::StudentDocument => Some(&mut self.student_document),
            RecordColumn::MunicipalityName => Some(&mut self.municipality_name),
            RecordColumn::SchoolName => Some(&mut self.school_name),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_names_are_unique() {
        let mut names = record_column_names();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), RecordColumn::ALL.len());
    }

    #[test]
    fn from_name_is_exact() {
        assert_eq!(RecordColumn::from_name("ALU_ID"), Some(RecordColumn::StudentId));
        assert_eq!(RecordColumn::from_name("alu_id"), None);
        assert_eq!(RecordColumn::from_name(" ALU_ID"), None);
    }

    #[test]
    fn sensitive_fields_exclude_natural_keys() {
        for column in [
            RecordColumn::StudentId,
            RecordColumn::SchoolId,
            RecordColumn::DescriptorCode,
        ] {
            assert!(!column.is_sensitive());
        }
        let mut record = FlatRecord::default();
        for column in RecordColumn::SENSITIVE {
            assert!(record.sensitive_field_mut(column).is_some());
        }
    }

    #[test]
    fn correctness_validity() {
        let mut record = FlatRecord {
            correct: Some(1),
            ..FlatRecord::default()
        };
        assert!(record.has_valid_correctness());
        record.correct = Some(2);
        assert!(!record.has_valid_correctness());
        record.correct = None;
        assert!(!record.has_valid_correctness());
    }
}
