//! Assessment CSV reading with a strict header contract.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use polars::prelude::*;
use saev_model::{RecordColumn, record_column_names};

use crate::error::{IngestError, Result};

/// Rejects files that start with a UTF-16 byte-order mark.
///
/// A UTF-8 BOM is accepted and stripped from the first header.
pub fn validate_encoding(path: &Path) -> Result<()> {
    let mut file = File::open(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            IngestError::SourceNotFound {
                path: path.to_path_buf(),
            }
        } else {
            IngestError::FileRead {
                path: path.to_path_buf(),
                source: e,
            }
        }
    })?;

    let mut buffer = [0u8; 2];
    let bytes_read = file.read(&mut buffer).map_err(|e| IngestError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    if bytes_read == 2 {
        if buffer == [0xFF, 0xFE] {
            return Err(IngestError::UnsupportedEncoding {
                path: path.to_path_buf(),
                encoding: "UTF-16 LE",
            });
        }
        if buffer == [0xFE, 0xFF] {
            return Err(IngestError::UnsupportedEncoding {
                path: path.to_path_buf(),
                encoding: "UTF-16 BE",
            });
        }
    }

    Ok(())
}

fn normalize_header(value: &str) -> String {
    value.trim_start_matches('\u{feff}').trim().to_string()
}

/// Reads the header line, trimmed and with any BOM removed.
pub fn read_headers(path: &Path) -> Result<Vec<String>> {
    let mut reader = ::csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .map_err(|e| IngestError::CsvParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| IngestError::CsvParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?
        .iter()
        .map(normalize_header)
        .collect();

    if headers.is_empty() || headers.iter().all(String::is_empty) {
        return Err(IngestError::EmptySource {
            path: path.to_path_buf(),
        });
    }
    Ok(headers)
}

/// Checks that `headers` is exactly the record column set.
///
/// Order is free; duplicates count as unexpected.
pub fn check_record_schema(path: &Path, headers: &[String]) -> Result<()> {
    let mut seen = BTreeSet::new();
    let mut unexpected = Vec::new();
    for header in headers {
        if RecordColumn::from_name(header).is_none() || !seen.insert(header.as_str()) {
            unexpected.push(header.clone());
        }
    }
    let missing: Vec<String> = RecordColumn::ALL
        .iter()
        .map(|column| column.name())
        .filter(|name| !seen.contains(name))
        .map(str::to_string)
        .collect();

    if missing.is_empty() && unexpected.is_empty() {
        Ok(())
    } else {
        Err(IngestError::SchemaMismatch {
            path: path.to_path_buf(),
            missing,
            unexpected,
        })
    }
}

/// Reads an assessment CSV into a frame of string columns in record order.
///
/// Every column is read as text; typing happens when rows reach the store.
/// Empty fields come back as nulls.
pub fn read_record_frame(path: &Path) -> Result<DataFrame> {
    validate_encoding(path)?;
    let headers = read_headers(path)?;
    check_record_schema(path, &headers)?;

    let mut df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .map_err(|e| IngestError::CsvParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?
        .finish()
        .map_err(|e| IngestError::CsvParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    let raw_names: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect();
    for raw in raw_names {
        let normalized = normalize_header(&raw);
        if normalized != raw {
            df.rename(&raw, normalized.into())?;
        }
    }

    Ok(df.select(record_column_names())?)
}
