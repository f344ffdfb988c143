//! Dimension definitions and their load statements.
//!
//! Each dimension is a deduplicated projection of raw columns. Surrogate
//! keys are numbered `1..n` in ascending natural-key order, rows with a
//! NULL natural-key part are left out, and conflicting attribute values
//! resolve to the smallest non-null one.
//!
//! An integer natural-key column only admits values stored as integers.
//! The raw table keeps unparseable numbers as text; those rows get no
//! dimension member and drop out of the facts as excluded rows.

use saev_model::{
    DIM_DESCRIPTOR, DIM_GRADE, DIM_MUNICIPALITY, DIM_SCHOOL, DIM_STUDENT, DIM_SUBJECT, DIM_TIME,
    RAW_ASSESSMENT, SqlType, TableDef,
};

/// Column computed from other tables rather than projected from raw rows.
///
/// The expression may reference the grouped source row as `src`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DerivedColumn {
    pub column: &'static str,
    pub expression: &'static str,
}

/// How one dimension is built from the raw table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DimensionSpec {
    pub table: TableDef,
    pub surrogate_key: &'static str,
    pub natural_key: &'static [&'static str],
    pub attributes: &'static [&'static str],
    pub derived: Option<DerivedColumn>,
}

/// School's municipality: the (state, name) pair with the smallest name
/// among the school's rows.
const SCHOOL_MUNICIPALITY: DerivedColumn = DerivedColumn {
    column: "municipality_sk",
    expression: "(SELECT m.municipality_sk FROM raw_assessment r \
                 JOIN dim_municipality m ON m.MUN_UF = r.MUN_UF AND m.MUN_NOME = r.MUN_NOME \
                 WHERE r.ESC_INEP = src.ESC_INEP \
                 ORDER BY m.MUN_NOME, m.MUN_UF LIMIT 1)",
};

/// Dimensions in build order; a derived column only reads dimensions
/// listed before its own.
pub const DIMENSIONS: [DimensionSpec; 7] = [
    DimensionSpec {
        table: DIM_MUNICIPALITY,
        surrogate_key: "municipality_sk",
        natural_key: &["MUN_UF", "MUN_NOME"],
        attributes: &[],
        derived: None,
    },
    DimensionSpec {
        table: DIM_SCHOOL,
        surrogate_key: "school_sk",
        natural_key: &["ESC_INEP"],
        attributes: &["ESC_NOME"],
        derived: Some(SCHOOL_MUNICIPALITY),
    },
    DimensionSpec {
        table: DIM_GRADE,
        surrogate_key: "grade_sk",
        natural_key: &["SER_NUMBER"],
        attributes: &["SER_NOME"],
        derived: None,
    },
    DimensionSpec {
        table: DIM_SUBJECT,
        surrogate_key: "subject_sk",
        natural_key: &["DIS_NOME"],
        attributes: &[],
        derived: None,
    },
    DimensionSpec {
        table: DIM_TIME,
        surrogate_key: "time_sk",
        natural_key: &["AVA_ANO"],
        attributes: &[],
        derived: None,
    },
    DimensionSpec {
        table: DIM_DESCRIPTOR,
        surrogate_key: "descriptor_sk",
        natural_key: &["MTI_CODIGO"],
        attributes: &["MTI_DESCRITOR"],
        derived: None,
    },
    DimensionSpec {
        table: DIM_STUDENT,
        surrogate_key: "student_sk",
        natural_key: &["ALU_ID"],
        attributes: &["ALU_NOME", "ALU_CPF"],
        derived: None,
    },
];

impl DimensionSpec {
    /// `INSERT ... SELECT` populating the dimension from the raw table.
    #[must_use]
    pub fn load_sql(&self) -> String {
        let key = self.natural_key.join(", ");

        let mut target = vec![self.surrogate_key];
        target.extend_from_slice(self.natural_key);
        target.extend_from_slice(self.attributes);

        let mut projected: Vec<String> = vec![format!("ROW_NUMBER() OVER (ORDER BY {key})")];
        projected.extend(self.natural_key.iter().map(|c| (*c).to_string()));
        projected.extend(self.attributes.iter().map(|c| (*c).to_string()));

        if let Some(derived) = self.derived {
            target.push(derived.column);
            projected.push(derived.expression.to_string());
        }

        let mut grouped: Vec<String> = self.natural_key.iter().map(|c| (*c).to_string()).collect();
        grouped.extend(
            self.attributes
                .iter()
                .map(|attr| format!("MIN({attr}) AS {attr}")),
        );

        let present = self
            .natural_key
            .iter()
            .map(|c| {
                if self.is_integer(c) {
                    format!("typeof({c}) = 'integer'")
                } else {
                    format!("{c} IS NOT NULL")
                }
            })
            .collect::<Vec<_>>()
            .join(" AND ");

        format!(
            "INSERT INTO {table} ({target}) SELECT {projected} FROM \
             (SELECT {grouped} FROM {raw} WHERE {present} GROUP BY {key}) AS src",
            table = self.table.name,
            target = target.join(", "),
            projected = projected.join(", "),
            grouped = grouped.join(", "),
            raw = RAW_ASSESSMENT.name,
        )
    }

    fn is_integer(&self, column: &str) -> bool {
        self.table
            .columns
            .iter()
            .any(|c| c.name == column && c.sql_type == SqlType::Integer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn specs_match_table_layouts() {
        for spec in DIMENSIONS {
            assert_eq!(spec.table.primary_key, Some(spec.surrogate_key));
            for column in spec
                .natural_key
                .iter()
                .chain(spec.attributes)
                .chain(spec.derived.iter().map(|d| &d.column))
            {
                assert!(spec.table.has_column(column), "{column} not in {}", spec.table.name);
            }
            let covered = 1 + spec.natural_key.len()
                + spec.attributes.len()
                + usize::from(spec.derived.is_some());
            assert_eq!(covered, spec.table.columns.len(), "{}", spec.table.name);
        }
    }

    #[test]
    fn load_sql_for_plain_dimension() {
        let student = DIMENSIONS[6];
        insta::assert_snapshot!(
            student.load_sql(),
            @"INSERT INTO dim_student (student_sk, ALU_ID, ALU_NOME, ALU_CPF) SELECT ROW_NUMBER() OVER (ORDER BY ALU_ID), ALU_ID, ALU_NOME, ALU_CPF FROM (SELECT ALU_ID, MIN(ALU_NOME) AS ALU_NOME, MIN(ALU_CPF) AS ALU_CPF FROM raw_assessment WHERE typeof(ALU_ID) = 'integer' GROUP BY ALU_ID) AS src"
        );
    }

    #[test]
    fn integer_keys_filter_on_storage_type() {
        for spec in DIMENSIONS {
            let sql = spec.load_sql();
            for key in spec.natural_key {
                let typed = format!("typeof({key}) = 'integer'");
                assert_eq!(
                    sql.contains(&typed),
                    matches!(*key, "ALU_ID" | "SER_NUMBER" | "AVA_ANO"),
                    "{key}"
                );
            }
        }
    }

    #[test]
    fn load_sql_for_composite_key() {
        insta::assert_snapshot!(
            DIMENSIONS[0].load_sql(),
            @"INSERT INTO dim_municipality (municipality_sk, MUN_UF, MUN_NOME) SELECT ROW_NUMBER() OVER (ORDER BY MUN_UF, MUN_NOME), MUN_UF, MUN_NOME FROM (SELECT MUN_UF, MUN_NOME FROM raw_assessment WHERE MUN_UF IS NOT NULL AND MUN_NOME IS NOT NULL GROUP BY MUN_UF, MUN_NOME) AS src"
        );
    }
}
