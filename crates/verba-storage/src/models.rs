//! Typed warehouse rows. Field order mirrors the table definitions in the
//! migrations.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, Default, FromRow, Serialize)]
pub struct CommitmentRow {
    pub id: i64,
    pub commitment_code: String,
    pub resumed_commitment_code: String,
    pub emission_date: Option<NaiveDate>,
    pub commitment_type: String,
    pub process: String,
    pub document_code_type: String,
    pub document_type: String,
    pub management_unit_name: String,
    pub management_unit_code: i64,
    pub management_code: i64,
    pub management_name: String,
    pub favored_code: String,
    pub favored_name: String,
    pub expense_category_code: i64,
    pub expense_category: String,
    pub expense_group_code: i64,
    pub expense_group: String,
    pub application_modality_code: i64,
    pub application_modality: String,
    pub expense_element_code: i64,
    pub expense_element: String,
    pub expense_nature_code: String,
    pub budget_plan: String,
    pub commitment_original_value: Decimal,
    pub commitment_value_converted_to_brl: Decimal,
    pub conversion_value_used: Decimal,
    pub inserted_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, FromRow, Serialize)]
pub struct CommitmentItemRow {
    pub commitment_id: i64,
    pub commitment_code: String,
    pub sequential: i16,
    pub expense_category_code: i64,
    pub expense_category: String,
    pub expense_group_code: i64,
    pub expense_group: String,
    pub application_modality_code: i64,
    pub application_modality: String,
    pub expense_element_code: i64,
    pub expense_element: String,
    pub expense_nature_code: String,
    pub description: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub total_price: Decimal,
    pub current_value: Decimal,
    pub inserted_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, FromRow, Serialize)]
pub struct CommitmentItemsHistoryRow {
    pub commitment_id: i64,
    pub commitment_code: String,
    pub sequential: i16,
    pub operation_type: String,
    pub operation_date: Option<NaiveDate>,
    pub item_quantity: Decimal,
    pub item_unit_price: Decimal,
    pub item_total_price: Decimal,
    pub inserted_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, FromRow, Serialize)]
pub struct LiquidationRow {
    pub liquidation_code: String,
    pub liquidation_code_resumed: String,
    pub liquidation_emission_date: Option<NaiveDate>,
    pub document_code_type: String,
    pub document_type: String,
    pub management_unit_name: String,
    pub management_unit_code: i64,
    pub management_code: i64,
    pub management_name: String,
    pub favored_code: String,
    pub favored_name: String,
    pub observation: String,
    pub inserted_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, FromRow, Serialize)]
pub struct LiquidationImpactedCommitmentRow {
    pub liquidation_code: String,
    pub commitment_code: String,
    pub expense_nature_code: String,
    pub subitem: String,
    pub liquidated_value_brl: Decimal,
    pub registered_payables_value_brl: Decimal,
    pub canceled_payables_value_brl: Decimal,
    pub outstanding_value_liquidated_brl: Decimal,
    pub inserted_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, FromRow, Serialize)]
pub struct PaymentRow {
    pub payment_code: String,
    pub payment_code_resumed: String,
    pub payment_emission_date: Option<NaiveDate>,
    pub document_code_type: String,
    pub document_type: String,
    pub management_unit_name: String,
    pub management_unit_code: i64,
    pub management_code: i64,
    pub management_name: String,
    pub favored_code: String,
    pub favored_name: String,
    pub extra_budgetary: bool,
    pub process: String,
    pub original_payment_value: Decimal,
    pub converted_payment_value: Decimal,
    pub conversion_used_value: Decimal,
    pub inserted_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, FromRow, Serialize)]
pub struct PaymentImpactedCommitmentRow {
    pub payment_code: String,
    pub commitment_code: String,
    pub expense_nature_code: String,
    pub subitem: String,
    pub paid_value_brl: Decimal,
    pub registered_payables_value_brl: Decimal,
    pub canceled_payables_value_brl: Decimal,
    pub outstanding_value_paid_brl: Decimal,
    pub inserted_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One attempt in the ingestion ledger.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct IngestionHistoryRow {
    pub id: i64,
    pub reference_date: NaiveDate,
    pub processed_at: DateTime<Utc>,
    pub source_file: String,
    pub trigger_type: String,
    pub scope_type: String,
    pub status: String,
    pub processed_codes: Vec<i64>,
}

/// Insert payload for the ledger; id and processed_at are server-assigned.
#[derive(Debug, Clone)]
pub struct NewIngestionHistory {
    pub reference_date: NaiveDate,
    pub source_file: String,
    pub trigger_type: String,
    pub scope_type: String,
    pub status: String,
    pub processed_codes: Vec<i64>,
}
