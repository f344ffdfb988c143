//! Source file discovery.

use std::path::{Path, PathBuf};

use crate::error::{IngestError, Result};

/// Lists all CSV files in a directory.
///
/// Returns files sorted by filename.
pub fn list_csv_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(IngestError::SourceNotFound {
            path: dir.to_path_buf(),
        });
    }

    let mut files = Vec::new();

    let entries = std::fs::read_dir(dir).map_err(|e| IngestError::DirectoryRead {
        path: dir.to_path_buf(),
        source: e,
    })?;

    for entry_result in entries {
        let entry = entry_result.map_err(|e| IngestError::DirectoryRead {
            path: dir.to_path_buf(),
            source: e,
        })?;

        let path = entry.path();

        if !path.is_file() {
            continue;
        }

        let is_csv = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));

        if is_csv {
            files.push(path);
        }
    }

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    Ok(files)
}

/// Expands declared sources into the ordered list of files to load.
///
/// A file is taken as-is; a directory contributes its CSV files in
/// filename order. Sources keep their declared order.
pub fn resolve_sources(sources: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for source in sources {
        if source.is_file() {
            files.push(source.clone());
        } else if source.is_dir() {
            let found = list_csv_files(source)?;
            if found.is_empty() {
                return Err(IngestError::NoCsvFiles {
                    path: source.clone(),
                });
            }
            files.extend(found);
        } else {
            return Err(IngestError::SourceNotFound {
                path: source.clone(),
            });
        }
    }
    if files.is_empty() {
        return Err(IngestError::NoCsvFiles {
            path: PathBuf::new(),
        });
    }
    Ok(files)
}
