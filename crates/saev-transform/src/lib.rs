//! Dimensional transform for SAEV assessment data.
//!
//! This crate turns the flat `raw_assessment` table into a star schema:
//!
//! - **dimensions**: surrogate-keyed projections of the raw natural keys
//! - **facts**: responses aggregated per student, class, assessment, test
//!   and competency, with correct (`ACERTO`) and wrong (`ERRO`) counts,
//!   plus school, competency and municipal rollups of those facts
//! - **transformer**: the transactional drop-and-rebuild of the model

pub mod dimensions;
pub mod error;
pub mod facts;
pub mod transformer;

pub use dimensions::{DIMENSIONS, DerivedColumn, DimensionSpec};
pub use error::{Result, TransformError};
pub use transformer::Transformer;
