//! Ingestion engine: bundle fetching and extraction, the per-day pipeline,
//! the transactional loader and the orchestrator driving it all.

pub mod assemble;
pub mod config;
pub mod extract;
pub mod fetch;
pub mod load;
pub mod orchestrator;
pub mod pipeline;
pub mod runner;
pub mod schedule;

pub use config::EtlConfig;
pub use fetch::{FetchError, Fetcher};
pub use orchestrator::{
    DayRunner, IngestionJob, Ledger, Orchestrator, OrchestratorConfig, PgLedger, RunStats,
};
pub use pipeline::{build_day_payload, PipelineError, PortalPipeline};
pub use runner::{ingest_range, IngestParams};

pub const CRATE_NAME: &str = "verba-etl";
