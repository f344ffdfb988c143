//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "saev",
    version,
    about = "SAEV assessment pipeline - load answer sheets into a dimensional model",
    long_about = "Load flat assessment CSV exports into a SQLite row store, build the \
                  student-response star schema and optionally replicate it to DuckDB.\n\n\
                  Settings come from an optional TOML file; flags override it."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Ingest CSV sources, validate, transform and optionally replicate.
    Run(RunArgs),

    /// Report data-quality aggregates of an existing store.
    Validate(StoreArgs),

    /// Rebuild the dimensional model of an existing store.
    Transform(TransformArgs),

    /// Copy the dimensional model of an existing store to DuckDB.
    Replicate(ReplicateArgs),
}

/// Options shared by every subcommand.
#[derive(Args)]
pub struct StoreArgs {
    /// TOML configuration file.
    #[arg(long = "config", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Row store file (SQLite).
    #[arg(long = "store", value_name = "PATH")]
    pub store: Option<PathBuf>,

    /// Print the outcome as JSON instead of tables.
    #[arg(long = "json")]
    pub json: bool,
}

#[derive(Args)]
pub struct ReplicaArgs {
    /// Columnar replica file (default: store path with a .duckdb extension).
    #[arg(long = "columnar", value_name = "PATH")]
    pub columnar: Option<PathBuf>,

    /// Rebuild the replica even if it already exists.
    #[arg(long = "force", overrides_with = "no_force")]
    pub force: bool,

    /// Keep an existing replica even if the config file sets `force_replicate`.
    #[arg(long = "no-force", overrides_with = "force")]
    pub no_force: bool,

    /// Fact rows copied per batch.
    #[arg(long = "batch-size", value_name = "ROWS")]
    pub batch_size: Option<usize>,
}

#[derive(Args)]
pub struct RunArgs {
    /// CSV files or directories of CSV files.
    #[arg(value_name = "SOURCE")]
    pub sources: Vec<PathBuf>,

    #[command(flatten)]
    pub store: StoreArgs,

    #[command(flatten)]
    pub replica: ReplicaArgs,

    /// Keep only rows whose municipality is listed in this file.
    #[arg(long = "cities", value_name = "PATH")]
    pub cities: Option<PathBuf>,

    /// Hash student names, documents, municipality and school names.
    #[arg(long = "anonymize", overrides_with = "no_anonymize")]
    pub anonymize: bool,

    /// Load names and documents as they are.
    #[arg(long = "no-anonymize", overrides_with = "anonymize")]
    pub no_anonymize: bool,

    /// Build the dimensional model after validation.
    #[arg(long = "transform", overrides_with = "no_transform")]
    pub transform: bool,

    /// Load and validate only; skip the dimensional model.
    #[arg(long = "no-transform", overrides_with = "transform")]
    pub no_transform: bool,

    /// Reuse the existing store file instead of recreating it.
    #[arg(long = "keep-store", overrides_with = "overwrite_store")]
    pub keep_store: bool,

    /// Recreate the store file.
    #[arg(long = "overwrite-store", overrides_with = "keep_store")]
    pub overwrite_store: bool,

    #[command(flatten)]
    pub replicate: ReplicateSwitch,
}

/// `--replicate` / `--no-replicate`.
#[derive(Args)]
pub struct ReplicateSwitch {
    /// Also copy the dimensional model to DuckDB.
    #[arg(long = "replicate", overrides_with = "no_replicate")]
    pub replicate: bool,

    /// Skip the DuckDB copy even if the config file enables it.
    #[arg(long = "no-replicate", overrides_with = "replicate")]
    pub no_replicate: bool,
}

impl ReplicateSwitch {
    #[must_use]
    pub fn value(&self) -> Option<bool> {
        switch(self.replicate, self.no_replicate)
    }
}

#[derive(Args)]
pub struct TransformArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    #[command(flatten)]
    pub replica: ReplicaArgs,

    #[command(flatten)]
    pub replicate: ReplicateSwitch,
}

#[derive(Args)]
pub struct ReplicateArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    #[command(flatten)]
    pub replica: ReplicaArgs,
}

/// Value of an `--x` / `--no-x` pair; `None` when neither was given.
///
/// The pair is declared with `overrides_with`, so at most one side is set.
#[must_use]
pub fn switch(on: bool, off: bool) -> Option<bool> {
    match (on, off) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
