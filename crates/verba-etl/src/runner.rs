//! One full ingestion run over an inclusive date range.

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use sqlx::PgPool;
use tracing::info;
use verba_core::{ScopeKind, TriggerKind};

use crate::config::EtlConfig;
use crate::orchestrator::{
    IngestionJob, Orchestrator, OrchestratorConfig, PgLedger, RunStats,
};
use crate::pipeline::PortalPipeline;

#[derive(Debug, Clone)]
pub struct IngestParams {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub codes: Vec<i64>,
    pub scope: ScopeKind,
    pub trigger: TriggerKind,
    pub concurrency: usize,
}

/// Reconciles state from the ledger, queues one job per eligible day in
/// the range and drives the worker pool until everything drained.
pub async fn ingest_range(
    pool: PgPool,
    etl_config: EtlConfig,
    params: IngestParams,
) -> Result<RunStats> {
    if params.start_date > params.end_date {
        bail!(
            "start date {} is after end date {}",
            params.start_date,
            params.end_date
        );
    }
    if params.codes.is_empty() {
        bail!("at least one code is required");
    }

    std::fs::create_dir_all(&etl_config.cache_dir)
        .with_context(|| format!("creating {}", etl_config.cache_dir.display()))?;
    std::fs::create_dir_all(&etl_config.work_dir)
        .with_context(|| format!("creating {}", etl_config.work_dir.display()))?;

    let pipeline =
        PortalPipeline::new(etl_config, pool.clone()).context("building pipeline")?;
    let ledger = PgLedger::new(pool);
    let mut orchestrator = Orchestrator::new(
        ledger,
        pipeline,
        OrchestratorConfig {
            max_concurrency: params.concurrency.max(1),
            ..OrchestratorConfig::default()
        },
    );

    orchestrator
        .initialize_state(params.start_date, params.end_date, &params.codes)
        .await?;
    orchestrator.start();

    let mut queued = 0usize;
    let mut day = params.start_date;
    while day <= params.end_date {
        if orchestrator.should_process(day).await {
            orchestrator
                .add_job(IngestionJob::new(
                    day,
                    params.codes.clone(),
                    params.scope,
                    params.trigger,
                ))
                .await?;
            queued += 1;
        } else {
            info!(date = %day, "skipping date (already processed or active)");
        }
        day = match day.succ_opt() {
            Some(next) => next,
            None => break,
        };
    }

    orchestrator.close();
    let stats = orchestrator.wait().await;
    info!(
        queued,
        succeeded = stats.succeeded,
        skipped = stats.skipped,
        failed = stats.failed,
        retried = stats.retried,
        "ingestion run finished"
    );
    Ok(stats)
}
