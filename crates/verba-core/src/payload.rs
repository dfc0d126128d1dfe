//! The hierarchical day payload assembled from one bundle.
//!
//! Every field is carried as the raw upstream string; typed conversion
//! (decimals, dates, codes) happens at load time so that one malformed
//! field skips one row instead of poisoning a whole table.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commitment {
    pub commitment_id: String,
    pub commitment_code: String,
    pub resumed_commitment_code: String,
    pub emission_date: String,
    pub commitment_type: String,
    pub document_code_type: String,
    pub document_type: String,
    pub process: String,
    pub management_unit_code: String,
    pub management_unit_name: String,
    pub management_code: String,
    pub management_name: String,
    pub favored_code: String,
    pub favored_name: String,
    pub expense_category_code: String,
    pub expense_category: String,
    pub expense_group_code: String,
    pub expense_group: String,
    pub application_modality_code: String,
    pub application_modality: String,
    pub expense_element_code: String,
    pub expense_element: String,
    pub complete_expense_nature: String,
    pub budget_plan: String,
    pub original_value: String,
    pub converted_value: String,
    pub conversion_reference_value: String,
    pub items: Vec<CommitmentItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitmentItem {
    pub commitment_id: String,
    pub commitment_code: String,
    pub sequential: String,
    pub expense_category_code: String,
    pub expense_category: String,
    pub expense_group_code: String,
    pub expense_group: String,
    pub application_modality_code: String,
    pub application_modality: String,
    pub expense_element_code: String,
    pub expense_element: String,
    pub complete_expense_nature: String,
    pub description: String,
    pub quantity: String,
    pub unit_price: String,
    pub total_price: String,
    pub current_value: String,
    pub history: Vec<CommitmentItemHistory>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitmentItemHistory {
    pub commitment_id: String,
    pub commitment_code: String,
    pub sequential: String,
    pub operation_type: String,
    pub operation_date: String,
    pub item_quantity: String,
    pub item_unit_price: String,
    pub item_total_price: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Liquidation {
    pub liquidation_code: String,
    pub resumed_liquidation_code: String,
    pub emission_date: String,
    pub document_code_type: String,
    pub document_type: String,
    pub management_unit_code: String,
    pub management_unit_name: String,
    pub management_code: String,
    pub management_name: String,
    pub favored_code: String,
    pub favored_name: String,
    pub observation: String,
    pub impacted_commitments: Vec<LiquidationImpactedCommitment>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidationImpactedCommitment {
    pub liquidation_code: String,
    pub commitment_code: String,
    pub expense_nature_code: String,
    pub subitem: String,
    pub liquidated_value: String,
    pub registered_payables_value: String,
    pub canceled_payables_value: String,
    pub outstanding_liquidated_value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub payment_code: String,
    pub resumed_payment_code: String,
    pub emission_date: String,
    pub document_code_type: String,
    pub document_type: String,
    pub management_unit_code: String,
    pub management_unit_name: String,
    pub management_code: String,
    pub management_name: String,
    pub favored_code: String,
    pub favored_name: String,
    pub extra_budgetary: String,
    pub process: String,
    pub original_value: String,
    pub converted_value: String,
    pub conversion_reference_value: String,
    pub impacted_commitments: Vec<PaymentImpactedCommitment>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentImpactedCommitment {
    pub payment_code: String,
    pub commitment_code: String,
    pub expense_nature_code: String,
    pub subitem: String,
    pub paid_value: String,
    pub registered_payables_value: String,
    pub canceled_payables_value: String,
    pub outstanding_paid_value: String,
}

/// Everything ingested for one management unit on one day.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitBundle {
    pub unit_code: String,
    pub unit_name: String,
    pub commitments: Vec<Commitment>,
    pub liquidations: Vec<Liquidation>,
    pub payments: Vec<Payment>,
}

/// The assembled payload for one reference date, units ordered by code.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayPayload {
    pub extraction_date: String,
    pub units: Vec<UnitBundle>,
}

impl DayPayload {
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn row_counts(&self) -> (usize, usize, usize) {
        self.units.iter().fold((0, 0, 0), |(c, l, p), unit| {
            (
                c + unit.commitments.len(),
                l + unit.liquidations.len(),
                p + unit.payments.len(),
            )
        })
    }
}
