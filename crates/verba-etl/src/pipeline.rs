//! The per-day pipeline: fetch → extract → filter → assemble → load.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::PgPool;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};
use verba_core::DataKind;
use verba_tabular::{filter_in, project, read_table, Table, TabularError};

use crate::assemble::{assemble, DayTables};
use crate::config::{day_code, EtlConfig};
use crate::extract::{extract_archive, ExtractError, WorkDir};
use crate::fetch::{FetchError, Fetcher};
use crate::load::{load_payload, LoadReport};
use crate::orchestrator::{DayRunner, IngestionJob};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Extract(#[from] ExtractError),
    #[error("no matching data found for extraction date {0}")]
    EmptyDay(NaiveDate),
    #[error("load failed for units: {}", failed.join(", "))]
    UnitFailures { failed: Vec<String> },
}

impl PipelineError {
    /// The "empty day" condition finalizes the ledger as SKIPPED and is
    /// never retried.
    pub fn is_empty_day(&self) -> bool {
        matches!(self, PipelineError::EmptyDay(_))
    }
}

/// The production pipeline over the transparency portal and the Postgres
/// warehouse.
pub struct PortalPipeline {
    config: EtlConfig,
    fetcher: Fetcher,
    pool: PgPool,
}

impl PortalPipeline {
    pub fn new(config: EtlConfig, pool: PgPool) -> Result<Self, FetchError> {
        let fetcher = Fetcher::new(&config)?;
        Ok(Self {
            config,
            fetcher,
            pool,
        })
    }

    /// Reads and filters the files of `kinds` concurrently; each matching
    /// table is pushed to a channel with its kind tag, and the fan-in
    /// completes only after every filter task has finished.
    async fn filter_files(
        workdir: &Path,
        date_code: &str,
        kinds: &[DataKind],
        column: &str,
        codes: Arc<HashSet<String>>,
    ) -> HashMap<DataKind, Table> {
        let (tx, mut rx) = mpsc::channel::<(DataKind, Table)>(kinds.len().max(1));
        let mut tasks: JoinSet<()> = JoinSet::new();

        for &kind in kinds {
            let path = workdir.join(format!("{date_code}{}", kind.file_suffix()));
            if !path.exists() {
                debug!(kind = kind.display_name(), "member file absent, skipping");
                continue;
            }
            let tx = tx.clone();
            let codes = Arc::clone(&codes);
            let column = column.to_string();
            tasks.spawn_blocking(move || match read_table(&path) {
                Ok(table) => {
                    if let Some(matched) = filter_in(&table, &column, &codes) {
                        debug!(
                            kind = kind.display_name(),
                            rows = matched.row_count(),
                            "row search completed"
                        );
                        let _ = tx.blocking_send((kind, matched));
                    }
                }
                Err(TabularError::Empty) => {
                    debug!(kind = kind.display_name(), "file has no data rows");
                }
                Err(error) => {
                    warn!(kind = kind.display_name(), %error, "failed to read member file");
                }
            });
        }
        drop(tx);

        // The phase barrier: phase 2 must not start before this drains.
        while tasks.join_next().await.is_some() {}

        let mut matched = HashMap::new();
        while let Some((kind, table)) = rx.recv().await {
            matched.insert(kind, table);
        }
        matched
    }

    fn transform(matched: HashMap<DataKind, Table>) -> HashMap<DataKind, Table> {
        let mut transformed = HashMap::new();
        for (kind, table) in matched {
            match project(&table, kind) {
                Ok(projected) => {
                    transformed.insert(kind, projected);
                }
                Err(error) => {
                    warn!(kind = kind.display_name(), %error, "projection failed, dropping table");
                }
            }
        }
        transformed
    }

    pub async fn run(&self, job: &IngestionJob) -> Result<LoadReport, PipelineError> {
        let date = job.date;
        let date_code = day_code(date);

        // 1. Fetch (no-op when the archive is already cached).
        let archive = self.fetcher.fetch(date).await?;

        // 2. Extract into a per-day workdir, removed on every exit path.
        let workdir = WorkDir::create(self.config.work_dir.join(format!("despesas_{date_code}")))?;
        extract_archive(&archive, workdir.path())?;

        // 3-7. Filter, transform and join.
        let payload = build_day_payload(workdir.path(), date, &job.codes, job.scope).await?;

        // 8. Load.
        let report = load_payload(&self.pool, &payload).await;
        if !report.all_units_succeeded() {
            return Err(PipelineError::UnitFailures {
                failed: report.failed_units,
            });
        }
        Ok(report)
    }
}

/// Runs both filter phases over an extracted workdir and joins the result
/// into the hierarchical payload. Pure with respect to the warehouse; the
/// output is a deterministic function of the extracted bundle.
pub async fn build_day_payload(
    workdir: &Path,
    date: NaiveDate,
    codes: &[i64],
    scope: verba_core::ScopeKind,
) -> Result<verba_core::DayPayload, PipelineError> {
    let date_code = day_code(date);

    // Phase 1: the three top-level files filtered by scope column.
    let code_set: Arc<HashSet<String>> = Arc::new(codes.iter().map(|c| c.to_string()).collect());
    let matched = PortalPipeline::filter_files(
        workdir,
        &date_code,
        &DataKind::TOP_LEVEL,
        scope.filter_column(),
        code_set,
    )
    .await;
    let mut transformed = PortalPipeline::transform(matched);

    info!(
        date = %date,
        commitments = transformed
            .get(&DataKind::Commitment)
            .map_or(0, Table::row_count),
        liquidations = transformed
            .get(&DataKind::Liquidation)
            .map_or(0, Table::row_count),
        payments = transformed.get(&DataKind::Payment).map_or(0, Table::row_count),
        "phase 1 completed"
    );

    // Eligibility: nothing matched at all means the day is skipped.
    if transformed.is_empty() {
        return Err(PipelineError::EmptyDay(date));
    }

    // Phase 2: detail files filtered by the harvested commitment codes;
    // only runs when there were commitments. The fan-out is bounded by
    // the number of detail files.
    let mut details = HashMap::new();
    if let Some(commitments) = transformed.get(&DataKind::Commitment) {
        let commitment_codes: Arc<HashSet<String>> =
            Arc::new(commitments.column("Código Empenho").into_iter().collect());
        debug!(
            date = %date,
            codes = commitment_codes.len(),
            "phase 2: filtering detail files"
        );
        let matched = PortalPipeline::filter_files(
            workdir,
            &date_code,
            &DataKind::DETAIL,
            "Código Empenho",
            commitment_codes,
        )
        .await;
        details = PortalPipeline::transform(matched);
    }

    let payload = assemble(
        date,
        DayTables {
            commitments: transformed.remove(&DataKind::Commitment),
            items: details.remove(&DataKind::CommitmentItem),
            history: details.remove(&DataKind::CommitmentItemHistory),
            liquidations: transformed.remove(&DataKind::Liquidation),
            liquidation_impacts: details.remove(&DataKind::LiquidationImpactedCommitments),
            payments: transformed.remove(&DataKind::Payment),
            payment_impacts: details.remove(&DataKind::PaymentImpactedCommitments),
        },
    )
    .await;

    if payload.is_empty() {
        return Err(PipelineError::EmptyDay(date));
    }
    Ok(payload)
}

#[async_trait]
impl DayRunner for PortalPipeline {
    async fn run_day(&self, job: &IngestionJob) -> Result<LoadReport, PipelineError> {
        self.run(job).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use verba_core::{ScopeKind, TriggerKind};
    use zip::write::SimpleFileOptions;

    // Fixture bodies are Windows-1252 bytes, as the portal ships them
    // (0xF3 = ó, 0xE7 = ç, 0xE3 = ã).
    fn write_member(writer: &mut zip::ZipWriter<std::fs::File>, name: &str, body: &[u8]) {
        writer
            .start_file(name.to_string(), SimpleFileOptions::default())
            .unwrap();
        writer.write_all(body).unwrap();
    }

    fn job(date: NaiveDate) -> IngestionJob {
        IngestionJob {
            date,
            codes: vec![158454],
            attempt: 1,
            scope: ScopeKind::ManagementUnit,
            trigger: TriggerKind::Manual,
        }
    }

    /// Drives fetch-from-cache → extract → both filter phases → assemble
    /// against a fixture archive, stopping short of the database by
    /// exercising the phases directly.
    #[tokio::test]
    async fn phases_filter_and_harvest_commitment_codes() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 16).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let archive_path = dir.path().join("despesas_20250116.zip");
        let mut writer = zip::ZipWriter::new(std::fs::File::create(&archive_path).unwrap());
        write_member(
            &mut writer,
            "20250116_Despesas_Empenho.csv",
            b"Id Empenho;C\xF3digo Empenho;C\xF3digo Unidade Gestora;Unidade Gestora\n\
              1;E1;158454;IFS\n\
              2;E2;999999;OTHER\n",
        );
        write_member(
            &mut writer,
            "20250116_Despesas_ItemEmpenho.csv",
            b"Id Empenho;C\xF3digo Empenho;Sequencial;Descri\xE7\xE3o\n\
              1;E1;1;ink\n\
              2;E2;1;paper\n",
        );
        writer.finish().unwrap();

        let workdir = dir.path().join("work");
        extract_archive(&archive_path, &workdir).unwrap();

        let job = job(date);
        let codes: Arc<HashSet<String>> =
            Arc::new(job.codes.iter().map(|c| c.to_string()).collect());
        let matched = PortalPipeline::filter_files(
            &workdir,
            "20250116",
            &DataKind::TOP_LEVEL,
            job.scope.filter_column(),
            codes,
        )
        .await;
        assert_eq!(matched.len(), 1);
        let commitments = &matched[&DataKind::Commitment];
        assert_eq!(commitments.row_count(), 1);
        assert_eq!(commitments.value(0, "Código Empenho"), "E1");

        let harvested: Arc<HashSet<String>> =
            Arc::new(commitments.column("Código Empenho").into_iter().collect());
        let details = PortalPipeline::filter_files(
            &workdir,
            "20250116",
            &DataKind::DETAIL,
            "Código Empenho",
            harvested,
        )
        .await;
        assert_eq!(details.len(), 1);
        assert_eq!(details[&DataKind::CommitmentItem].row_count(), 1);
        assert_eq!(
            details[&DataKind::CommitmentItem].value(0, "Descrição"),
            "ink"
        );
    }

    #[tokio::test]
    async fn absent_and_header_only_files_yield_no_tables() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("20250116_Despesas_Empenho.csv"),
            b"C\xF3digo Unidade Gestora\n",
        )
        .unwrap();

        let codes: Arc<HashSet<String>> = Arc::new(["158454".to_string()].into_iter().collect());
        let matched = PortalPipeline::filter_files(
            dir.path(),
            "20250116",
            &DataKind::TOP_LEVEL,
            "Código Unidade Gestora",
            codes,
        )
        .await;
        assert!(matched.is_empty());
    }

    #[test]
    fn empty_day_error_message_names_the_date() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 16).unwrap();
        let error = PipelineError::EmptyDay(date);
        assert!(error.is_empty_day());
        assert_eq!(
            error.to_string(),
            "no matching data found for extraction date 2025-01-16"
        );
    }
}
