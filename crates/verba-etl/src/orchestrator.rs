//! Coordination of per-day ingestion jobs: ledger reconciliation, a
//! bounded worker pool and the retry feedback loop.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use tokio::sync::{mpsc, watch, Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;
use verba_core::{IngestionStatus, ScopeKind, TriggerKind};
use verba_storage::{ingestion_history, IngestionHistoryRow, NewIngestionHistory};

use crate::config::archive_name;
use crate::load::LoadReport;
use crate::pipeline::PipelineError;

/// One unit of work: ingest one reference date. The attempt counter lives
/// here, not on the ledger; ledger rows are append-only, one per attempt.
#[derive(Debug, Clone)]
pub struct IngestionJob {
    pub date: NaiveDate,
    pub codes: Vec<i64>,
    pub attempt: u32,
    pub scope: ScopeKind,
    pub trigger: TriggerKind,
}

impl IngestionJob {
    pub fn new(date: NaiveDate, codes: Vec<i64>, scope: ScopeKind, trigger: TriggerKind) -> Self {
        Self {
            date,
            codes,
            attempt: 1,
            scope,
            trigger,
        }
    }
}

/// The ledger operations the orchestrator needs, behind a seam so tests
/// can run against an in-memory implementation.
#[async_trait]
pub trait Ledger: Send + Sync + 'static {
    async fn insert(&self, entry: &NewIngestionHistory) -> Result<(i64, DateTime<Utc>)>;
    async fn update_status(&self, id: i64, status: IngestionStatus) -> Result<()>;
    async fn history_in_range(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
        codes: &[i64],
    ) -> Result<Vec<IngestionHistoryRow>>;
}

/// The Postgres-backed ledger.
pub struct PgLedger {
    pool: PgPool,
}

impl PgLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Ledger for PgLedger {
    async fn insert(&self, entry: &NewIngestionHistory) -> Result<(i64, DateTime<Utc>)> {
        ingestion_history::insert(&self.pool, entry)
            .await
            .context("inserting ingestion history")
    }

    async fn update_status(&self, id: i64, status: IngestionStatus) -> Result<()> {
        ingestion_history::update_status(&self.pool, id, status.as_str())
            .await
            .context("updating ingestion status")
    }

    async fn history_in_range(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
        codes: &[i64],
    ) -> Result<Vec<IngestionHistoryRow>> {
        ingestion_history::history_in_range(&self.pool, start_date, end_date, codes)
            .await
            .context("loading ingestion history")
    }
}

/// The per-day pipeline behind a seam, for the same reason.
#[async_trait]
pub trait DayRunner: Send + Sync + 'static {
    async fn run_day(&self, job: &IngestionJob) -> Result<LoadReport, PipelineError>;
}

#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub max_concurrency: usize,
    pub retry_limit: u32,
    pub stale_timeout: Duration,
    pub queue_capacity: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 10,
            retry_limit: 3,
            stale_timeout: Duration::from_secs(30 * 60),
            queue_capacity: 100,
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct RunStats {
    pub succeeded: u64,
    pub skipped: u64,
    pub failed: u64,
    pub retried: u64,
}

#[derive(Debug, Clone, Copy)]
struct StatusEntry {
    status: IngestionStatus,
    processed_at: DateTime<Utc>,
}

#[derive(Debug)]
enum Disposition {
    Succeeded(LoadReport),
    Skipped,
    Failed(String),
}

#[derive(Debug)]
struct IngestionResult {
    job: IngestionJob,
    disposition: Disposition,
}

type StatusMap = Arc<RwLock<HashMap<NaiveDate, StatusEntry>>>;

async fn process_job<L: Ledger, R: DayRunner>(
    ledger: &L,
    runner: &R,
    run_id: Uuid,
    job: &IngestionJob,
) -> IngestionResult {
    debug!(%run_id, date = %job.date, attempt = job.attempt, "processing job");

    let entry = NewIngestionHistory {
        reference_date: job.date,
        source_file: archive_name(job.date),
        trigger_type: job.trigger.as_str().to_string(),
        scope_type: job.scope.as_str().to_string(),
        status: IngestionStatus::InProgress.as_str().to_string(),
        processed_codes: job.codes.clone(),
    };

    let ledger_id = match ledger.insert(&entry).await {
        Ok((id, _processed_at)) => id,
        Err(error) => {
            error!(date = %job.date, %error, "failed to create IN_PROGRESS record");
            return IngestionResult {
                job: job.clone(),
                disposition: Disposition::Failed(error.to_string()),
            };
        }
    };

    let (status, disposition) = match runner.run_day(job).await {
        Ok(report) => (IngestionStatus::Success, Disposition::Succeeded(report)),
        Err(error) if error.is_empty_day() => {
            info!(date = %job.date, %error, "day skipped");
            (IngestionStatus::Skipped, Disposition::Skipped)
        }
        Err(error) => (IngestionStatus::Failure, Disposition::Failed(error.to_string())),
    };

    if let Err(error) = ledger.update_status(ledger_id, status).await {
        error!(id = ledger_id, status = status.as_str(), %error, "failed to update final status");
    }

    IngestionResult {
        job: job.clone(),
        disposition,
    }
}

/// Drives the workers and the result listener. The in-memory status map
/// is reconciled from the ledger at startup and updated on every
/// successful job; it is the only long-lived mutable state.
pub struct Orchestrator<L: Ledger, R: DayRunner> {
    ledger: Arc<L>,
    runner: Arc<R>,
    config: OrchestratorConfig,
    run_id: Uuid,
    status_map: StatusMap,
    stats: Arc<Mutex<RunStats>>,
    outstanding: Arc<AtomicI64>,

    job_tx: Option<mpsc::Sender<IngestionJob>>,
    job_rx: Option<mpsc::Receiver<IngestionJob>>,
    result_tx: Option<mpsc::Sender<IngestionResult>>,
    result_rx: Option<mpsc::Receiver<IngestionResult>>,

    closed_tx: watch::Sender<bool>,
    shutdown_tx: watch::Sender<bool>,

    workers: Vec<JoinHandle<()>>,
    listener: Option<JoinHandle<()>>,
}

impl<L: Ledger, R: DayRunner> Orchestrator<L, R> {
    pub fn new(ledger: L, runner: R, config: OrchestratorConfig) -> Self {
        let (job_tx, job_rx) = mpsc::channel(config.queue_capacity);
        let (result_tx, result_rx) = mpsc::channel(config.queue_capacity);
        let (closed_tx, _) = watch::channel(false);
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            ledger: Arc::new(ledger),
            runner: Arc::new(runner),
            config,
            run_id: Uuid::new_v4(),
            status_map: Arc::new(RwLock::new(HashMap::new())),
            stats: Arc::new(Mutex::new(RunStats::default())),
            outstanding: Arc::new(AtomicI64::new(0)),
            job_tx: Some(job_tx),
            job_rx: Some(job_rx),
            result_tx: Some(result_tx),
            result_rx: Some(result_rx),
            closed_tx,
            shutdown_tx,
            workers: Vec::new(),
            listener: None,
        }
    }

    /// Loads ledger entries in range and keeps the most recent entry per
    /// reference date (latest `processed_at` wins).
    pub async fn initialize_state(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
        codes: &[i64],
    ) -> Result<()> {
        info!(%start_date, %end_date, "syncing initial state from the ledger");
        let history = self
            .ledger
            .history_in_range(start_date, end_date, codes)
            .await?;

        let mut map = self.status_map.write().await;
        for row in history {
            let status = match IngestionStatus::parse(&row.status) {
                Ok(status) => status,
                Err(error) => {
                    warn!(id = row.id, %error, "ignoring ledger row with unknown status");
                    continue;
                }
            };
            let entry = StatusEntry {
                status,
                processed_at: row.processed_at,
            };
            map.entry(row.reference_date)
                .and_modify(|existing| {
                    if entry.processed_at > existing.processed_at {
                        *existing = entry;
                    }
                })
                .or_insert(entry);
        }
        info!(unique_dates = map.len(), "state sync complete");
        Ok(())
    }

    /// Whether `date` needs an ingestion attempt: unknown days and failed
    /// days do, finished or skipped days do not, and an IN_PROGRESS day
    /// becomes eligible again once it exceeds the stale timeout.
    pub async fn should_process(&self, date: NaiveDate) -> bool {
        let map = self.status_map.read().await;
        match map.get(&date) {
            None => true,
            Some(entry) => match entry.status {
                IngestionStatus::InProgress => {
                    let age = Utc::now() - entry.processed_at;
                    age.to_std().unwrap_or_default() > self.config.stale_timeout
                }
                IngestionStatus::Success | IngestionStatus::Skipped => false,
                IngestionStatus::Failure | IngestionStatus::Partial => true,
            },
        }
    }

    /// Spawns the worker pool and the result listener.
    pub fn start(&mut self) {
        info!(run_id = %self.run_id, concurrency = self.config.max_concurrency, "starting orchestrator");

        let (job_rx, result_tx, result_rx) =
            match (self.job_rx.take(), self.result_tx.clone(), self.result_rx.take()) {
                (Some(rx), Some(tx), Some(results)) => (Arc::new(Mutex::new(rx)), tx, results),
                _ => return,
            };

        for worker_id in 0..self.config.max_concurrency {
            let job_rx = Arc::clone(&job_rx);
            let result_tx = result_tx.clone();
            let ledger = Arc::clone(&self.ledger);
            let runner = Arc::clone(&self.runner);
            let mut shutdown = self.shutdown_tx.subscribe();
            let run_id = self.run_id;

            self.workers.push(tokio::spawn(async move {
                loop {
                    let job = {
                        let mut rx = job_rx.lock().await;
                        tokio::select! {
                            job = rx.recv() => job,
                            _ = shutdown.changed() => None,
                        }
                    };
                    let Some(job) = job else { break };

                    tokio::select! {
                        result = process_job(&*ledger, &*runner, run_id, &job) => {
                            if result_tx.send(result).await.is_err() {
                                break;
                            }
                        }
                        _ = shutdown.changed() => {
                            // The in-flight future is dropped here; the
                            // IN_PROGRESS row stays unfinalized and the
                            // stale-timeout rule makes the day eligible
                            // again.
                            warn!(worker_id, date = %job.date, "cancelled mid-job");
                            break;
                        }
                    }
                }
                debug!(worker_id, "worker drained");
            }));
        }

        self.listener = Some(self.spawn_listener(result_rx));
    }

    fn spawn_listener(&mut self, mut result_rx: mpsc::Receiver<IngestionResult>) -> JoinHandle<()> {
        let mut retry_tx = self.job_tx.clone();
        let mut closed_rx = self.closed_tx.subscribe();
        let outstanding = Arc::clone(&self.outstanding);
        let status_map = Arc::clone(&self.status_map);
        let stats = Arc::clone(&self.stats);
        let retry_limit = self.config.retry_limit;

        tokio::spawn(async move {
            loop {
                // Once submissions are closed and nothing is in flight, no
                // retry can ever be sent again; dropping the retry sender
                // lets the workers drain.
                if *closed_rx.borrow() && outstanding.load(Ordering::SeqCst) == 0 {
                    retry_tx = None;
                }

                tokio::select! {
                    maybe = result_rx.recv() => {
                        let Some(result) = maybe else { break };
                        let date = result.job.date;
                        match result.disposition {
                            Disposition::Succeeded(report) => {
                                info!(
                                    %date,
                                    units = report.units_loaded,
                                    commitments = report.commitments,
                                    liquidations = report.liquidations,
                                    payments = report.payments,
                                    "job completed"
                                );
                                status_map.write().await.insert(
                                    date,
                                    StatusEntry {
                                        status: IngestionStatus::Success,
                                        processed_at: Utc::now(),
                                    },
                                );
                                stats.lock().await.succeeded += 1;
                                outstanding.fetch_sub(1, Ordering::SeqCst);
                            }
                            Disposition::Skipped => {
                                info!(%date, "job marked as skipped");
                                stats.lock().await.skipped += 1;
                                outstanding.fetch_sub(1, Ordering::SeqCst);
                            }
                            Disposition::Failed(reason) => {
                                if result.job.attempt < retry_limit {
                                    let mut job = result.job;
                                    job.attempt += 1;
                                    warn!(
                                        %date,
                                        attempt = job.attempt,
                                        reason = %reason,
                                        "job failed, queuing retry"
                                    );
                                    stats.lock().await.retried += 1;
                                    let sent = match &retry_tx {
                                        Some(tx) => tx.send(job).await.is_ok(),
                                        None => false,
                                    };
                                    if !sent {
                                        error!(%date, "retry could not be enqueued");
                                        stats.lock().await.failed += 1;
                                        outstanding.fetch_sub(1, Ordering::SeqCst);
                                    }
                                } else {
                                    error!(%date, reason = %reason, "job failed after max attempts");
                                    stats.lock().await.failed += 1;
                                    outstanding.fetch_sub(1, Ordering::SeqCst);
                                }
                            }
                        }
                    }
                    changed = closed_rx.changed(), if retry_tx.is_some() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                }
            }
            debug!("result listener drained");
        })
    }

    /// Enqueues a job. Must not be called after [`close`](Self::close).
    pub async fn add_job(&self, job: IngestionJob) -> Result<()> {
        let tx = self
            .job_tx
            .as_ref()
            .ok_or_else(|| anyhow!("orchestrator already closed"))?;
        self.outstanding.fetch_add(1, Ordering::SeqCst);
        if tx.send(job).await.is_err() {
            self.outstanding.fetch_sub(1, Ordering::SeqCst);
            return Err(anyhow!("job queue closed"));
        }
        Ok(())
    }

    /// Closes the job queue for external submissions; retries already in
    /// flight still run to completion.
    pub fn close(&mut self) {
        self.job_tx = None;
        let _ = self.closed_tx.send(true);
    }

    /// Cancels in-flight work; affected days keep their IN_PROGRESS rows
    /// and become eligible again via the stale timeout.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    /// Blocks until every worker drained, then closes the result channel
    /// and waits for the listener. Returns the run's tallies.
    pub async fn wait(&mut self) -> RunStats {
        for worker in self.workers.drain(..) {
            if let Err(error) = worker.await {
                error!(%error, "worker task panicked");
            }
        }
        self.result_tx = None;
        if let Some(listener) = self.listener.take() {
            if let Err(error) = listener.await {
                error!(%error, "listener task panicked");
            }
        }
        self.stats.lock().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    #[derive(Debug, Clone)]
    struct FakeRow {
        id: i64,
        reference_date: NaiveDate,
        status: String,
        processed_at: DateTime<Utc>,
    }

    #[derive(Default)]
    struct FakeLedger {
        rows: std::sync::Mutex<Vec<FakeRow>>,
        seed: std::sync::Mutex<Vec<FakeRow>>,
    }

    impl FakeLedger {
        fn with_seed(seed: Vec<FakeRow>) -> Self {
            Self {
                rows: std::sync::Mutex::new(Vec::new()),
                seed: std::sync::Mutex::new(seed),
            }
        }

        fn snapshot(&self) -> Vec<FakeRow> {
            self.rows.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Ledger for FakeLedger {
        async fn insert(&self, entry: &NewIngestionHistory) -> Result<(i64, DateTime<Utc>)> {
            assert_eq!(entry.status, "IN_PROGRESS");
            let mut rows = self.rows.lock().unwrap();
            let id = rows.len() as i64 + 1;
            let processed_at = Utc::now();
            rows.push(FakeRow {
                id,
                reference_date: entry.reference_date,
                status: entry.status.clone(),
                processed_at,
            });
            Ok((id, processed_at))
        }

        async fn update_status(&self, id: i64, status: IngestionStatus) -> Result<()> {
            let mut rows = self.rows.lock().unwrap();
            let row = rows
                .iter_mut()
                .find(|r| r.id == id)
                .ok_or_else(|| anyhow!("no such ledger row"))?;
            assert_eq!(row.status, "IN_PROGRESS", "terminal update must be unique");
            row.status = status.as_str().to_string();
            Ok(())
        }

        async fn history_in_range(
            &self,
            start_date: NaiveDate,
            end_date: NaiveDate,
            _codes: &[i64],
        ) -> Result<Vec<IngestionHistoryRow>> {
            Ok(self
                .seed
                .lock()
                .unwrap()
                .iter()
                .filter(|r| r.reference_date >= start_date && r.reference_date <= end_date)
                .map(|r| IngestionHistoryRow {
                    id: r.id,
                    reference_date: r.reference_date,
                    processed_at: r.processed_at,
                    source_file: String::new(),
                    trigger_type: "MANUAL".into(),
                    scope_type: "MANAGEMENT_UNIT".into(),
                    status: r.status.clone(),
                    processed_codes: vec![158454],
                })
                .collect())
        }
    }

    enum Planned {
        Succeed,
        EmptyDay,
        Fail,
    }

    #[derive(Default)]
    struct FakeRunner {
        plan: std::sync::Mutex<HashMap<NaiveDate, VecDeque<Planned>>>,
        runs: std::sync::Mutex<Vec<(NaiveDate, u32)>>,
    }

    impl FakeRunner {
        fn plan(date: NaiveDate, outcomes: Vec<Planned>) -> Self {
            let runner = Self::default();
            runner.plan.lock().unwrap().insert(date, outcomes.into());
            runner
        }

        fn attempts(&self, date: NaiveDate) -> Vec<u32> {
            self.runs
                .lock()
                .unwrap()
                .iter()
                .filter(|(d, _)| *d == date)
                .map(|(_, attempt)| *attempt)
                .collect()
        }
    }

    #[async_trait]
    impl DayRunner for FakeRunner {
        async fn run_day(&self, job: &IngestionJob) -> Result<LoadReport, PipelineError> {
            self.runs.lock().unwrap().push((job.date, job.attempt));
            let outcome = self
                .plan
                .lock()
                .unwrap()
                .get_mut(&job.date)
                .and_then(VecDeque::pop_front);
            match outcome {
                Some(Planned::Succeed) | None => Ok(LoadReport {
                    units_loaded: 1,
                    ..LoadReport::default()
                }),
                Some(Planned::EmptyDay) => Err(PipelineError::EmptyDay(job.date)),
                Some(Planned::Fail) => Err(PipelineError::UnitFailures {
                    failed: vec!["158454".into()],
                }),
            }
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 16).unwrap()
    }

    fn job() -> IngestionJob {
        IngestionJob::new(
            date(),
            vec![158454],
            ScopeKind::ManagementUnit,
            TriggerKind::Manual,
        )
    }

    fn config() -> OrchestratorConfig {
        OrchestratorConfig {
            max_concurrency: 2,
            ..OrchestratorConfig::default()
        }
    }

    async fn run_to_completion(
        orchestrator: &mut Orchestrator<FakeLedger, FakeRunner>,
        jobs: Vec<IngestionJob>,
    ) -> RunStats {
        orchestrator.start();
        for job in jobs {
            orchestrator.add_job(job).await.unwrap();
        }
        orchestrator.close();
        orchestrator.wait().await
    }

    #[tokio::test]
    async fn success_writes_one_in_progress_row_and_one_terminal_update() {
        let mut orchestrator =
            Orchestrator::new(FakeLedger::default(), FakeRunner::default(), config());
        let stats = run_to_completion(&mut orchestrator, vec![job()]).await;

        assert_eq!(stats.succeeded, 1);
        let rows = orchestrator.ledger.snapshot();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].status, "SUCCESS");
        // The in-memory map now filters the day out.
        assert!(!orchestrator.should_process(date()).await);
    }

    #[tokio::test]
    async fn failure_is_retried_with_a_fresh_ledger_row() {
        let runner = FakeRunner::plan(date(), vec![Planned::Fail, Planned::Succeed]);
        let mut orchestrator = Orchestrator::new(FakeLedger::default(), runner, config());
        let stats = run_to_completion(&mut orchestrator, vec![job()]).await;

        assert_eq!(stats.succeeded, 1);
        assert_eq!(stats.retried, 1);
        assert_eq!(stats.failed, 0);
        let rows = orchestrator.ledger.snapshot();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].status, "FAILURE");
        assert_eq!(rows[1].status, "SUCCESS");
        assert_eq!(orchestrator.runner.attempts(date()), vec![1, 2]);
    }

    #[tokio::test]
    async fn attempts_never_exceed_the_retry_limit() {
        let runner = FakeRunner::plan(
            date(),
            vec![Planned::Fail, Planned::Fail, Planned::Fail, Planned::Fail],
        );
        let mut orchestrator = Orchestrator::new(FakeLedger::default(), runner, config());
        let stats = run_to_completion(&mut orchestrator, vec![job()]).await;

        assert_eq!(stats.failed, 1);
        assert_eq!(stats.succeeded, 0);
        let attempts = orchestrator.runner.attempts(date());
        assert_eq!(attempts, vec![1, 2, 3]);
        let rows = orchestrator.ledger.snapshot();
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|r| r.status == "FAILURE"));
    }

    #[tokio::test]
    async fn empty_day_is_skipped_and_never_retried() {
        let runner = FakeRunner::plan(date(), vec![Planned::EmptyDay]);
        let mut orchestrator = Orchestrator::new(FakeLedger::default(), runner, config());
        let stats = run_to_completion(&mut orchestrator, vec![job()]).await;

        assert_eq!(stats.skipped, 1);
        assert_eq!(stats.retried, 0);
        let rows = orchestrator.ledger.snapshot();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].status, "SKIPPED");
    }

    #[tokio::test]
    async fn should_process_follows_the_ledger_state() {
        let fresh = Utc::now();
        let stale = Utc::now() - chrono::Duration::minutes(45);
        let d = date;
        let seed = vec![
            FakeRow {
                id: 1,
                reference_date: d(),
                status: "FAILURE".into(),
                processed_at: stale,
            },
            // Later row wins for the same date.
            FakeRow {
                id: 2,
                reference_date: d(),
                status: "SUCCESS".into(),
                processed_at: fresh,
            },
            FakeRow {
                id: 3,
                reference_date: d() + chrono::Duration::days(1),
                status: "SKIPPED".into(),
                processed_at: fresh,
            },
            FakeRow {
                id: 4,
                reference_date: d() + chrono::Duration::days(2),
                status: "IN_PROGRESS".into(),
                processed_at: stale,
            },
            FakeRow {
                id: 5,
                reference_date: d() + chrono::Duration::days(3),
                status: "IN_PROGRESS".into(),
                processed_at: fresh,
            },
            FakeRow {
                id: 6,
                reference_date: d() + chrono::Duration::days(4),
                status: "FAILURE".into(),
                processed_at: fresh,
            },
        ];
        let orchestrator = Orchestrator::new(
            FakeLedger::with_seed(seed),
            FakeRunner::default(),
            config(),
        );
        orchestrator
            .initialize_state(d(), d() + chrono::Duration::days(10), &[158454])
            .await
            .unwrap();

        // SUCCESS (latest wins over the older FAILURE).
        assert!(!orchestrator.should_process(d()).await);
        // SKIPPED.
        assert!(!orchestrator.should_process(d() + chrono::Duration::days(1)).await);
        // Stale IN_PROGRESS: eligible again.
        assert!(orchestrator.should_process(d() + chrono::Duration::days(2)).await);
        // Fresh IN_PROGRESS: some other worker owns it.
        assert!(!orchestrator.should_process(d() + chrono::Duration::days(3)).await);
        // FAILURE: retryable.
        assert!(orchestrator.should_process(d() + chrono::Duration::days(4)).await);
        // Unknown date.
        assert!(orchestrator.should_process(d() + chrono::Duration::days(5)).await);
    }

    #[tokio::test]
    async fn add_job_after_close_is_rejected() {
        let mut orchestrator =
            Orchestrator::new(FakeLedger::default(), FakeRunner::default(), config());
        orchestrator.start();
        orchestrator.close();
        assert!(orchestrator.add_job(job()).await.is_err());
        orchestrator.wait().await;
    }
}
