//! Postgres warehouse access: pool setup, upsert stores, the ingestion
//! ledger and the aggregate report queries.

pub mod commitment;
pub mod db;
pub mod expenses;
pub mod ingestion_history;
pub mod liquidation;
pub mod models;
pub mod payment;

pub use db::{connect, connect_lazy, DbConfig};
pub use models::{
    CommitmentItemRow, CommitmentItemsHistoryRow, CommitmentRow, IngestionHistoryRow,
    LiquidationImpactedCommitmentRow, LiquidationRow, NewIngestionHistory,
    PaymentImpactedCommitmentRow, PaymentRow,
};

pub const CRATE_NAME: &str = "verba-storage";

/// Embedded schema migrations (`crates/verba-storage/migrations`).
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!();
