// Redshift curation pipeline: core processing, per-source flows and the
// per-target orchestration

pub mod orchestrator;
pub mod processing;
pub mod sources;

pub use orchestrator::{resolve_file, RedshiftPipeline, RunOutcome, TargetLayout};
