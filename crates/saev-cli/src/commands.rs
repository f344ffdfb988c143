use anyhow::{Context, Result};

use saev_cli::pipeline::Pipeline;
use saev_model::{PipelineConfig, PipelineOutcome};

use crate::cli::{ReplicaArgs, ReplicateArgs, RunArgs, StoreArgs, TransformArgs, switch};

pub fn run_pipeline(args: &RunArgs) -> Result<PipelineOutcome> {
    let config = run_config(args)?;
    Ok(Pipeline::new(config).run())
}

/// Config for `run`: file values, then every flag that was given.
fn run_config(args: &RunArgs) -> Result<PipelineConfig> {
    let mut config = load_config(&args.store, &args.replica)?;
    if !args.sources.is_empty() {
        config.sources.clone_from(&args.sources);
    }
    if let Some(path) = &args.cities {
        config.city_list = Some(path.clone());
    }
    if let Some(anonymize) = switch(args.anonymize, args.no_anonymize) {
        config.anonymize = anonymize;
    }
    if let Some(transform) = switch(args.transform, args.no_transform) {
        config.apply_transform = transform;
    }
    if let Some(keep) = switch(args.keep_store, args.overwrite_store) {
        config.overwrite_store = !keep;
    }
    if let Some(replicate) = args.replicate.value() {
        config.replicate_columnar = replicate;
    }
    Ok(config)
}

pub fn run_validate(args: &StoreArgs) -> Result<PipelineOutcome> {
    let mut config = load_config(args, &ReplicaArgs::none())?;
    // Validation alone never treats an empty store as fatal.
    config.apply_transform = false;
    Ok(Pipeline::new(config).run_validate_only())
}

pub fn run_transform(args: &TransformArgs) -> Result<PipelineOutcome> {
    let mut config = load_config(&args.store, &args.replica)?;
    config.apply_transform = true;
    if let Some(replicate) = args.replicate.value() {
        config.replicate_columnar = replicate;
    }
    Ok(Pipeline::new(config).run_transform_only())
}

pub fn run_replicate(args: &ReplicateArgs) -> Result<PipelineOutcome> {
    let config = load_config(&args.store, &args.replica)?;
    Ok(Pipeline::new(config).run_replicate_only())
}

/// Config file (or defaults) with the shared flags applied on top.
fn load_config(store: &StoreArgs, replica: &ReplicaArgs) -> Result<PipelineConfig> {
    let mut config = match &store.config {
        Some(path) => PipelineConfig::load(path)
            .with_context(|| format!("load config {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    if let Some(path) = &store.store {
        config.store_path = path.clone();
    }
    if let Some(path) = &replica.columnar {
        config.columnar_path = Some(path.clone());
    }
    if let Some(force) = switch(replica.force, replica.no_force) {
        config.force_replicate = force;
    }
    if let Some(size) = replica.batch_size {
        config.batch_size = size;
    }
    Ok(config)
}

impl ReplicaArgs {
    fn none() -> Self {
        Self {
            columnar: None,
            force: false,
            no_force: false,
            batch_size: None,
        }
    }
}
