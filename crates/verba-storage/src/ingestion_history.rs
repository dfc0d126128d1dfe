//! The append-and-update ingestion ledger.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use tracing::debug;

use crate::models::{IngestionHistoryRow, NewIngestionHistory};

/// Stores the entry and returns the server-assigned id and processed_at.
/// Callers insert with status `IN_PROGRESS`; terminal statuses arrive via
/// [`update_status`].
pub async fn insert(
    pool: &PgPool,
    entry: &NewIngestionHistory,
) -> Result<(i64, DateTime<Utc>), sqlx::Error> {
    let (id, processed_at): (i64, DateTime<Utc>) = sqlx::query_as(
        r#"
        INSERT INTO ingestion_history (
            reference_date,
            source_file,
            trigger_type,
            scope_type,
            status,
            processed_codes
        ) VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id, processed_at
        "#,
    )
    .bind(entry.reference_date)
    .bind(&entry.source_file)
    .bind(&entry.trigger_type)
    .bind(&entry.scope_type)
    .bind(&entry.status)
    .bind(&entry.processed_codes)
    .fetch_one(pool)
    .await?;

    debug!(id, reference_date = %entry.reference_date, "ingestion history recorded");
    Ok((id, processed_at))
}

/// Moves a single entry to a terminal status.
pub async fn update_status(pool: &PgPool, id: i64, status: &str) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE ingestion_history SET status = $1 WHERE id = $2")
        .bind(status)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Every entry whose reference_date falls in the inclusive range and whose
/// processed codes overlap the requested set. Ordered by processed_at so
/// the caller's latest-wins fold is deterministic.
pub async fn history_in_range(
    pool: &PgPool,
    start_date: NaiveDate,
    end_date: NaiveDate,
    codes: &[i64],
) -> Result<Vec<IngestionHistoryRow>, sqlx::Error> {
    sqlx::query_as(
        r#"
        SELECT id, reference_date, processed_at, source_file,
               trigger_type, scope_type, status, processed_codes
        FROM ingestion_history
        WHERE reference_date BETWEEN $1 AND $2
          AND processed_codes && $3
        ORDER BY processed_at ASC
        "#,
    )
    .bind(start_date)
    .bind(end_date)
    .bind(codes)
    .fetch_all(pool)
    .await
}

/// Latest `limit` entries by processed_at, for the read API.
pub async fn latest(pool: &PgPool, limit: i64) -> Result<Vec<IngestionHistoryRow>, sqlx::Error> {
    sqlx::query_as(
        r#"
        SELECT id, reference_date, processed_at, source_file,
               trigger_type, scope_type, status, processed_codes
        FROM ingestion_history
        ORDER BY processed_at DESC
        LIMIT $1
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await
}
