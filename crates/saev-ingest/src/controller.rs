//! Ingestion controller: sources to raw table.

use std::path::PathBuf;
use std::time::Instant;

use saev_model::{FileLoad, IngestSummary};
use saev_store::RowStore;
use tracing::{debug, info, info_span, warn};

use crate::anonymize::anonymize_frame;
use crate::cities::CityFilter;
use crate::csv::read_record_frame;
use crate::discovery::resolve_sources;
use crate::error::Result;

/// What to load and how.
#[derive(Debug, Clone, Default)]
pub struct IngestRequest {
    /// Files or directories of CSV files.
    pub sources: Vec<PathBuf>,
    /// Municipality allow-list applied before anonymization.
    pub city_filter: Option<CityFilter>,
    pub anonymize: bool,
}

/// Replaces the raw table contents with the rows of every source file.
///
/// Every file is parsed, filtered and anonymized before the raw table is
/// cleared, so a missing, mismatched or malformed input leaves the previous
/// load untouched. Each file is then appended in its own transaction.
pub fn ingest(store: &mut RowStore, request: &IngestRequest) -> Result<IngestSummary> {
    let files = resolve_sources(&request.sources)?;
    for file in &files {
        let headers = crate::csv::read_headers(file)?;
        crate::csv::check_record_schema(file, &headers)?;
    }

    let mut prepared = Vec::with_capacity(files.len());
    for path in files {
        let span = info_span!("read_file", path = %path.display());
        let _guard = span.enter();

        let mut df = read_record_frame(&path)?;
        let rows_read = df.height() as u64;
        if rows_read == 0 {
            warn!("source file has no data rows");
        }

        let mut rows_filtered = 0;
        if let Some(filter) = &request.city_filter {
            let (kept, dropped) = filter.retain(&df)?;
            df = kept;
            rows_filtered = dropped;
            debug!(rows_filtered = dropped, "city filter applied");
        }

        if request.anonymize {
            anonymize_frame(&mut df)?;
        }
        prepared.push((path, df, rows_read, rows_filtered));
    }

    store.reset_raw()?;

    let mut summary = IngestSummary::default();
    for (path, df, rows_read, rows_filtered) in prepared {
        let span = info_span!("ingest_file", path = %path.display());
        let _guard = span.enter();
        let start = Instant::now();

        let rows_loaded = store.append_frame(&df)?;
        info!(
            rows_read,
            rows_filtered,
            rows_loaded,
            duration_ms = start.elapsed().as_millis(),
            "file loaded"
        );
        summary.push(FileLoad {
            path,
            rows_read,
            rows_filtered,
            rows_loaded,
        });
    }

    info!(
        files = summary.files.len(),
        rows_loaded = summary.rows_loaded,
        rows_filtered = summary.rows_filtered,
        "ingest complete"
    );
    Ok(summary)
}
