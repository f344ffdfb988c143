//! Library side of the `saev` CLI: pipeline orchestration and logging setup.

pub mod logging;
pub mod pipeline;
