//! Pipeline orchestration.
//!
//! A run moves through `Created → StructureReady → Loaded → Validated →
//! Transformed → Migrated → Done`. Ingestion, validation and transform
//! errors stop the run and are recorded as the outcome's failure; replica
//! errors only add warnings because the row store stays usable.

use std::time::Instant;

use saev_ingest::{CityFilter, IngestRequest, ingest};
use saev_model::{
    ConfigError, ErrorKind, MigrationSummary, PipelineConfig, PipelineOutcome, PipelineStage,
    RAW_ASSESSMENT, StageFailure,
};
use saev_replica::{BatchControl, BatchProgress, MigrateError, Migrator};
use saev_store::RowStore;
use saev_transform::Transformer;
use tracing::{error, info, info_span, warn};

type BatchHook<'a> = Box<dyn FnMut(&BatchProgress) -> BatchControl + 'a>;

/// Runs the ingest → validate → transform → replicate stages for one
/// configuration.
pub struct Pipeline<'a> {
    config: PipelineConfig,
    on_batch: Option<BatchHook<'a>>,
}

/// Stage error carried up to the outcome.
struct Halt {
    kind: ErrorKind,
    resource: Option<String>,
    message: String,
}

impl Halt {
    fn new(kind: ErrorKind, resource: Option<String>, message: impl ToString) -> Self {
        Self {
            kind,
            resource,
            message: message.to_string(),
        }
    }
}

impl From<ConfigError> for Halt {
    fn from(err: ConfigError) -> Self {
        Self::new(err.kind(), None, &err)
    }
}

impl From<saev_store::StoreError> for Halt {
    fn from(err: saev_store::StoreError) -> Self {
        let resource = err.path().map(|p| p.display().to_string());
        Self::new(err.kind(), resource, &err)
    }
}

impl From<saev_ingest::IngestError> for Halt {
    fn from(err: saev_ingest::IngestError) -> Self {
        let resource = err.path().map(|p| p.display().to_string());
        Self::new(err.kind(), resource, &err)
    }
}

impl From<saev_transform::TransformError> for Halt {
    fn from(err: saev_transform::TransformError) -> Self {
        let resource = err.table().map(str::to_string);
        Self::new(err.kind(), resource, &err)
    }
}

impl From<MigrateError> for Halt {
    fn from(err: MigrateError) -> Self {
        Self::new(err.kind(), err.resource(), &err)
    }
}

impl<'a> Pipeline<'a> {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            on_batch: None,
        }
    }

    /// Hook passed to the replica copy; see [`Migrator::on_batch`].
    #[must_use]
    pub fn on_batch(mut self, hook: impl FnMut(&BatchProgress) -> BatchControl + 'a) -> Self {
        self.on_batch = Some(Box::new(hook));
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Full run: ingest, validate, optionally transform and replicate.
    pub fn run(&mut self) -> PipelineOutcome {
        let mut outcome = PipelineOutcome::new();
        let span = info_span!("pipeline", store = %self.config.store_path.display());
        let _guard = span.enter();
        let start = Instant::now();

        let result = self.run_stages(&mut outcome);
        conclude(&mut outcome, result);
        info!(
            success = outcome.is_success(),
            reached = %outcome.reached,
            duration_ms = start.elapsed().as_millis(),
            "pipeline finished"
        );
        outcome
    }

    /// Data-quality aggregates of an existing store.
    pub fn run_validate_only(&mut self) -> PipelineOutcome {
        let mut outcome = PipelineOutcome::new();
        let result = self.open_existing(&mut outcome).and_then(|store| {
            outcome.advance(PipelineStage::Loaded);
            self.validate_stage(&store, &mut outcome)
        });
        conclude(&mut outcome, result);
        outcome
    }

    /// Rebuilds the dimensional model on an existing store, then replicates
    /// when configured.
    pub fn run_transform_only(&mut self) -> PipelineOutcome {
        let mut outcome = PipelineOutcome::new();
        let result = self.open_existing(&mut outcome).and_then(|mut store| {
            outcome.advance(PipelineStage::Loaded);
            self.validate_stage(&store, &mut outcome)?;
            self.transform_stage(&mut store, &mut outcome)?;
            if self.config.replicate_columnar {
                self.replicate_stage(&store, &mut outcome);
            }
            Ok(())
        });
        conclude(&mut outcome, result);
        outcome
    }

    /// Copies the model of an existing store into the replica.
    ///
    /// The replica is the only product here, so a replica error is the
    /// run's failure rather than a warning.
    pub fn run_replicate_only(&mut self) -> PipelineOutcome {
        let mut outcome = PipelineOutcome::new();
        let result = self.open_existing(&mut outcome).and_then(|store| {
            outcome.advance(PipelineStage::Transformed);
            let span = info_span!("replicate");
            let _guard = span.enter();
            let summary = self.migrate(&store)?;
            let verified = summary.verified;
            outcome.migration = Some(summary);
            if !verified {
                return Err(Halt::new(
                    ErrorKind::ValidationMismatch,
                    Some(self.config.columnar_store_path().display().to_string()),
                    "replica does not match the row store",
                ));
            }
            outcome.advance(PipelineStage::Migrated);
            Ok(())
        });
        conclude(&mut outcome, result);
        outcome
    }

    fn run_stages(&mut self, outcome: &mut PipelineOutcome) -> Result<(), Halt> {
        self.config.validate()?;

        let mut store = {
            let span = info_span!("structure");
            let _guard = span.enter();
            RowStore::create(&self.config.store_path, self.config.overwrite_store)?
        };
        outcome.advance(PipelineStage::StructureReady);

        {
            let span = info_span!("ingest", sources = self.config.sources.len());
            let _guard = span.enter();
            let city_filter = self
                .config
                .city_list
                .as_deref()
                .map(CityFilter::load)
                .transpose()?;
            let request = IngestRequest {
                sources: self.config.sources.clone(),
                city_filter,
                anonymize: self.config.anonymize,
            };
            let summary = ingest(&mut store, &request)?;
            if summary.rows_filtered > 0 {
                outcome.warn(
                    PipelineStage::Loaded,
                    None,
                    format!(
                        "{} rows dropped by the municipality allow-list",
                        summary.rows_filtered
                    ),
                );
            }
            outcome.ingest = Some(summary);
        }
        outcome.advance(PipelineStage::Loaded);

        self.validate_stage(&store, outcome)?;

        if self.config.apply_transform {
            self.transform_stage(&mut store, outcome)?;
        } else {
            info!("dimensional transform disabled");
        }

        if self.config.replicate_columnar {
            if self.config.apply_transform {
                self.replicate_stage(&store, outcome);
            } else {
                outcome.warn(
                    PipelineStage::Migrated,
                    None,
                    "replication skipped: dimensional transform disabled",
                );
            }
        }
        Ok(())
    }

    fn open_existing(&self, outcome: &mut PipelineOutcome) -> Result<RowStore, Halt> {
        if self.config.batch_size == 0 {
            return Err(ConfigError::ZeroBatchSize.into());
        }
        let store = RowStore::open(&self.config.store_path)?;
        outcome.advance(PipelineStage::StructureReady);
        Ok(store)
    }

    fn validate_stage(&self, store: &RowStore, outcome: &mut PipelineOutcome) -> Result<(), Halt> {
        let span = info_span!("validate");
        let _guard = span.enter();

        let summary = saev_validate::validate(store)?;
        let empty = summary.total_records == 0;
        if !empty {
            for note in summary.advisories() {
                outcome.warn(PipelineStage::Validated, None, note);
            }
        }
        outcome.validation = Some(summary);

        if empty {
            let message = "raw table is empty; nothing to transform";
            if self.config.apply_transform {
                return Err(Halt::new(
                    ErrorKind::MissingRawData,
                    Some(RAW_ASSESSMENT.name.to_string()),
                    message,
                ));
            }
            outcome.warn(
                PipelineStage::Validated,
                Some(ErrorKind::MissingRawData),
                message,
            );
        }
        outcome.advance(PipelineStage::Validated);
        Ok(())
    }

    fn transform_stage(
        &self,
        store: &mut RowStore,
        outcome: &mut PipelineOutcome,
    ) -> Result<(), Halt> {
        let span = info_span!("transform");
        let _guard = span.enter();

        let summary = Transformer::new(store).transform()?;
        if summary.excluded_rows > 0 {
            outcome.warn(
                PipelineStage::Transformed,
                None,
                format!(
                    "{} raw rows did not contribute to any fact",
                    summary.excluded_rows
                ),
            );
        }
        outcome.transform = Some(summary);
        outcome.advance(PipelineStage::Transformed);
        Ok(())
    }

    /// Replica errors and mismatches are recorded as warnings.
    fn replicate_stage(&mut self, store: &RowStore, outcome: &mut PipelineOutcome) {
        let span = info_span!("replicate");
        let _guard = span.enter();

        match self.migrate(store) {
            Ok(summary) => {
                if summary.verified {
                    outcome.advance(PipelineStage::Migrated);
                } else {
                    let mismatched: Vec<String> = summary
                        .mismatches()
                        .iter()
                        .map(|check| format!("{}.{}", check.table, check.metric))
                        .collect();
                    warn!(mismatched = ?mismatched, "replica verification failed");
                    outcome.warn(
                        PipelineStage::Migrated,
                        Some(ErrorKind::ValidationMismatch),
                        format!("replica does not match the row store: {}", mismatched.join(", ")),
                    );
                }
                outcome.migration = Some(summary);
            }
            Err(err) => {
                warn!(error = %err, "replication failed");
                outcome.warn(PipelineStage::Migrated, Some(err.kind()), err.to_string());
                outcome.migration = Some(self.failed_summary(&err));
            }
        }
    }

    fn migrate(&mut self, store: &RowStore) -> Result<MigrationSummary, MigrateError> {
        let destination = self.config.columnar_store_path();
        let mut migrator =
            Migrator::new(self.config.batch_size).with_force(self.config.force_replicate);
        if let Some(hook) = self.on_batch.as_mut() {
            migrator = migrator.on_batch(|progress| hook(progress));
        }
        migrator.migrate(store, &destination)
    }

    fn failed_summary(&self, err: &MigrateError) -> MigrationSummary {
        let (tables_copied, rows_copied) = match err {
            MigrateError::PartialMigration {
                tables_copied,
                rows_copied,
                ..
            } => (*tables_copied, *rows_copied),
            _ => (0, 0),
        };
        MigrationSummary {
            destination: self.config.columnar_store_path(),
            tables_copied,
            rows_copied,
            verified: false,
            checks: Vec::new(),
            skipped: false,
        }
    }
}

fn conclude(outcome: &mut PipelineOutcome, result: Result<(), Halt>) {
    match result {
        Ok(()) => outcome.finish(),
        Err(halt) => {
            let stage = next_stage(outcome.reached);
            error!(
                stage = %stage,
                kind = %halt.kind,
                resource = halt.resource.as_deref().unwrap_or("-"),
                "{}",
                halt.message
            );
            outcome.fail(StageFailure {
                stage,
                kind: halt.kind,
                resource: halt.resource,
                message: halt.message,
            });
        }
    }
}

/// Stage being attempted after `reached` completed.
fn next_stage(reached: PipelineStage) -> PipelineStage {
    match reached {
        PipelineStage::Created => PipelineStage::StructureReady,
        PipelineStage::StructureReady => PipelineStage::Loaded,
        PipelineStage::Loaded => PipelineStage::Validated,
        PipelineStage::Validated => PipelineStage::Transformed,
        PipelineStage::Transformed => PipelineStage::Migrated,
        PipelineStage::Migrated | PipelineStage::Done => PipelineStage::Done,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_stage_follows_reached_stage() {
        assert_eq!(next_stage(PipelineStage::Created), PipelineStage::StructureReady);
        assert_eq!(next_stage(PipelineStage::Validated), PipelineStage::Transformed);
        assert_eq!(next_stage(PipelineStage::Done), PipelineStage::Done);
    }

    #[test]
    fn invalid_config_fails_before_structure() {
        let config = PipelineConfig {
            batch_size: 0,
            sources: vec!["in.csv".into()],
            ..PipelineConfig::default()
        };
        let outcome = Pipeline::new(config).run();
        let failure = outcome.failure.unwrap();
        assert_eq!(failure.kind, ErrorKind::InvalidConfig);
        assert_eq!(failure.stage, PipelineStage::StructureReady);
        assert_eq!(outcome.reached, PipelineStage::Created);
    }
}
