//! Cron-driven daily ingestion of yesterday's bundle.

use anyhow::{anyhow, Result};
use sqlx::PgPool;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};
use verba_core::{ScopeKind, TriggerKind};

use crate::config::EtlConfig;
use crate::runner::{ingest_range, IngestParams};

/// Builds and starts a scheduler that ingests yesterday's reference date
/// on the configured cron expression with the SCHEDULED trigger. The
/// returned scheduler must be kept alive by the caller.
pub async fn start_daily(
    pool: PgPool,
    config: EtlConfig,
    codes: Vec<i64>,
    scope: ScopeKind,
    concurrency: usize,
) -> Result<JobScheduler> {
    let scheduler = JobScheduler::new()
        .await
        .map_err(|e| anyhow!("creating scheduler: {e}"))?;

    let cron = config.sync_cron.clone();
    let job = Job::new_async(cron.as_str(), move |_id, _scheduler| {
        let pool = pool.clone();
        let config = config.clone();
        let codes = codes.clone();
        Box::pin(async move {
            let yesterday = chrono::Utc::now().date_naive() - chrono::Duration::days(1);
            info!(date = %yesterday, "scheduled ingestion triggered");
            let params = IngestParams {
                start_date: yesterday,
                end_date: yesterday,
                codes,
                scope,
                trigger: TriggerKind::Scheduled,
                concurrency,
            };
            if let Err(error) = ingest_range(pool, config, params).await {
                error!(%error, "scheduled ingestion failed");
            }
        })
    })
    .map_err(|e| anyhow!("creating scheduler job for cron {cron}: {e}"))?;

    scheduler
        .add(job)
        .await
        .map_err(|e| anyhow!("adding scheduler job: {e}"))?;
    scheduler
        .start()
        .await
        .map_err(|e| anyhow!("starting scheduler: {e}"))?;

    info!(%cron, "daily ingestion scheduler started");
    Ok(scheduler)
}
