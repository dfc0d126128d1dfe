//! Core domain model for the transparency-portal expense warehouse.

pub mod kind;
pub mod ledger;
pub mod parse;
pub mod payload;

pub use kind::DataKind;
pub use ledger::{IngestionStatus, ScopeKind, TriggerKind};
pub use payload::{
    Commitment, CommitmentItem, CommitmentItemHistory, DayPayload, Liquidation,
    LiquidationImpactedCommitment, Payment, PaymentImpactedCommitment, UnitBundle,
};

pub const CRATE_NAME: &str = "verba-core";
