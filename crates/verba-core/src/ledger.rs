//! Vocabulary of the ingestion-history ledger.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("unknown {field} value: {value}")]
pub struct UnknownValue {
    pub field: &'static str,
    pub value: String,
}

/// Lifecycle of one ingestion attempt. A row is created `InProgress` and
/// moved exactly once to a terminal status. `Partial` is accepted from the
/// wire but never produced by the current workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IngestionStatus {
    InProgress,
    Success,
    Failure,
    Partial,
    Skipped,
}

impl IngestionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            IngestionStatus::InProgress => "IN_PROGRESS",
            IngestionStatus::Success => "SUCCESS",
            IngestionStatus::Failure => "FAILURE",
            IngestionStatus::Partial => "PARTIAL",
            IngestionStatus::Skipped => "SKIPPED",
        }
    }

    pub fn parse(value: &str) -> Result<Self, UnknownValue> {
        match value {
            "IN_PROGRESS" => Ok(IngestionStatus::InProgress),
            "SUCCESS" => Ok(IngestionStatus::Success),
            "FAILURE" => Ok(IngestionStatus::Failure),
            "PARTIAL" => Ok(IngestionStatus::Partial),
            "SKIPPED" => Ok(IngestionStatus::Skipped),
            other => Err(UnknownValue {
                field: "status",
                value: other.to_string(),
            }),
        }
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, IngestionStatus::InProgress)
    }
}

/// Origin of an ingestion run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TriggerKind {
    Manual,
    Scheduled,
}

impl TriggerKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TriggerKind::Manual => "MANUAL",
            TriggerKind::Scheduled => "SCHEDULED",
        }
    }

    pub fn parse(value: &str) -> Result<Self, UnknownValue> {
        match value {
            "MANUAL" => Ok(TriggerKind::Manual),
            "SCHEDULED" => Ok(TriggerKind::Scheduled),
            other => Err(UnknownValue {
                field: "trigger_type",
                value: other.to_string(),
            }),
        }
    }
}

/// How the configured codes are interpreted when filtering the bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScopeKind {
    ManagementUnit,
    Management,
}

impl ScopeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ScopeKind::ManagementUnit => "MANAGEMENT_UNIT",
            ScopeKind::Management => "MANAGEMENT",
        }
    }

    pub fn parse(value: &str) -> Result<Self, UnknownValue> {
        match value {
            "MANAGEMENT_UNIT" => Ok(ScopeKind::ManagementUnit),
            "MANAGEMENT" => Ok(ScopeKind::Management),
            other => Err(UnknownValue {
                field: "scope_type",
                value: other.to_string(),
            }),
        }
    }

    /// The upstream column the phase-1 filter matches against.
    pub fn filter_column(self) -> &'static str {
        match self {
            ScopeKind::ManagementUnit => "Código Unidade Gestora",
            ScopeKind::Management => "Código Gestão",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips() {
        for status in [
            IngestionStatus::InProgress,
            IngestionStatus::Success,
            IngestionStatus::Failure,
            IngestionStatus::Partial,
            IngestionStatus::Skipped,
        ] {
            assert_eq!(IngestionStatus::parse(status.as_str()).unwrap(), status);
        }
        assert!(IngestionStatus::parse("DONE").is_err());
    }

    #[test]
    fn only_in_progress_is_non_terminal() {
        assert!(!IngestionStatus::InProgress.is_terminal());
        assert!(IngestionStatus::Skipped.is_terminal());
        assert!(IngestionStatus::Partial.is_terminal());
    }

    #[test]
    fn scope_picks_the_matching_filter_column() {
        assert_eq!(
            ScopeKind::ManagementUnit.filter_column(),
            "Código Unidade Gestora"
        );
        assert_eq!(ScopeKind::Management.filter_column(), "Código Gestão");
    }
}
