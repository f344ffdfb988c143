//! Municipality allow-list.

use std::collections::BTreeSet;
use std::path::Path;

use polars::prelude::{BooleanChunked, DataFrame, NewChunkedArray};
use saev_model::RecordColumn;

use crate::error::{IngestError, Result};

/// Set of municipality names whose rows are kept.
///
/// Matching is exact and case-sensitive; names are not normalized beyond
/// trimming surrounding whitespace when loaded from a file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CityFilter {
    names: BTreeSet<String>,
}

impl CityFilter {
    /// Reads a newline-delimited list. Blank lines are ignored.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| IngestError::CityList {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::from_names(text.lines()))
    }

    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let names = names
            .into_iter()
            .map(|name| name.as_ref().trim().to_string())
            .filter(|name| !name.is_empty())
            .collect();
        Self { names }
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Keeps only rows whose municipality is in the set.
    ///
    /// Rows with a null municipality are dropped. Returns the filtered frame
    /// and the number of rows removed.
    pub fn retain(&self, df: &DataFrame) -> Result<(DataFrame, u64)> {
        let column = df.column(RecordColumn::MunicipalityName.name())?;
        let names = column.str()?;
        let keep: Vec<bool> = names
            .iter()
            .map(|value| value.is_some_and(|name| self.contains(name)))
            .collect();

        let mask = BooleanChunked::from_slice("city_filter".into(), &keep);
        let filtered = df.filter(&mask)?;
        let dropped = (df.height() - filtered.height()) as u64;
        Ok((filtered, dropped))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::Column;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_trims_and_skips_blank_lines() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "  Alpha \n\nBeta\n   \n").unwrap();
        let filter = CityFilter::load(file.path()).unwrap();
        assert_eq!(filter.len(), 2);
        assert!(filter.contains("Alpha"));
        assert!(filter.contains("Beta"));
        assert!(!filter.contains("alpha"));
    }

    #[test]
    fn test_load_missing_file() {
        let result = CityFilter::load(Path::new("/nonexistent/cities.txt"));
        assert!(matches!(result, Err(IngestError::CityList { .. })));
    }

    #[test]
    fn test_retain_drops_other_and_null_cities() {
        let df = DataFrame::new(vec![Column::new(
            "MUN_NOME".into(),
            vec![Some("A"), Some("B"), None, Some("A")],
        )])
        .unwrap();
        let filter = CityFilter::from_names(["A"]);
        let (kept, dropped) = filter.retain(&df).unwrap();
        assert_eq!(kept.height(), 2);
        assert_eq!(dropped, 2);
    }
}
