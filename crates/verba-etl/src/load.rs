//! Transactional load of an assembled payload, one transaction per unit.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::{error, info, warn};
use verba_core::parse::{parse_code, parse_day, parse_flag, parse_money, ParseError};
use verba_core::{
    Commitment, CommitmentItem, CommitmentItemHistory, DayPayload, Liquidation,
    LiquidationImpactedCommitment, Payment, PaymentImpactedCommitment, UnitBundle,
};
use verba_storage::{
    commitment, liquidation, payment, CommitmentItemRow, CommitmentItemsHistoryRow, CommitmentRow,
    LiquidationImpactedCommitmentRow, LiquidationRow, PaymentImpactedCommitmentRow, PaymentRow,
};

/// Outcome of loading one day. Partial progress across units is possible;
/// within a unit the transaction is all-or-nothing.
#[derive(Debug, Default, Clone)]
pub struct LoadReport {
    pub units_loaded: usize,
    pub failed_units: Vec<String>,
    pub commitments: usize,
    pub liquidations: usize,
    pub payments: usize,
    pub rows_skipped: usize,
}

impl LoadReport {
    pub fn all_units_succeeded(&self) -> bool {
        self.failed_units.is_empty()
    }
}

fn commitment_row(c: &Commitment, now: DateTime<Utc>) -> Result<CommitmentRow, ParseError> {
    Ok(CommitmentRow {
        id: parse_code(&c.commitment_id)?,
        commitment_code: c.commitment_code.clone(),
        resumed_commitment_code: c.resumed_commitment_code.clone(),
        emission_date: parse_day(&c.emission_date)?,
        commitment_type: c.commitment_type.clone(),
        process: c.process.clone(),
        document_code_type: c.document_code_type.clone(),
        document_type: c.document_type.clone(),
        management_unit_name: c.management_unit_name.clone(),
        management_unit_code: parse_code(&c.management_unit_code)?,
        management_code: parse_code(&c.management_code)?,
        management_name: c.management_name.clone(),
        favored_code: c.favored_code.clone(),
        favored_name: c.favored_name.clone(),
        expense_category_code: parse_code(&c.expense_category_code)?,
        expense_category: c.expense_category.clone(),
        expense_group_code: parse_code(&c.expense_group_code)?,
        expense_group: c.expense_group.clone(),
        application_modality_code: parse_code(&c.application_modality_code)?,
        application_modality: c.application_modality.clone(),
        expense_element_code: parse_code(&c.expense_element_code)?,
        expense_element: c.expense_element.clone(),
        expense_nature_code: c.complete_expense_nature.clone(),
        budget_plan: c.budget_plan.clone(),
        commitment_original_value: parse_money(&c.original_value)?,
        commitment_value_converted_to_brl: parse_money(&c.converted_value)?,
        conversion_value_used: parse_money(&c.conversion_reference_value)?,
        inserted_at: now,
        updated_at: now,
    })
}

fn item_row(
    item: &CommitmentItem,
    parent_id: i64,
    now: DateTime<Utc>,
) -> Result<CommitmentItemRow, ParseError> {
    Ok(CommitmentItemRow {
        commitment_id: parent_id,
        commitment_code: item.commitment_code.clone(),
        sequential: parse_code(&item.sequential)? as i16,
        expense_category_code: parse_code(&item.expense_category_code)?,
        expense_category: item.expense_category.clone(),
        expense_group_code: parse_code(&item.expense_group_code)?,
        expense_group: item.expense_group.clone(),
        application_modality_code: parse_code(&item.application_modality_code)?,
        application_modality: item.application_modality.clone(),
        expense_element_code: parse_code(&item.expense_element_code)?,
        expense_element: item.expense_element.clone(),
        expense_nature_code: item.complete_expense_nature.clone(),
        description: item.description.clone(),
        quantity: parse_money(&item.quantity)?,
        unit_price: parse_money(&item.unit_price)?,
        total_price: parse_money(&item.total_price)?,
        current_value: parse_money(&item.current_value)?,
        inserted_at: now,
        updated_at: now,
    })
}

fn history_row(
    history: &CommitmentItemHistory,
    parent_id: i64,
    now: DateTime<Utc>,
) -> Result<CommitmentItemsHistoryRow, ParseError> {
    Ok(CommitmentItemsHistoryRow {
        commitment_id: parent_id,
        commitment_code: history.commitment_code.clone(),
        sequential: parse_code(&history.sequential)? as i16,
        operation_type: history.operation_type.clone(),
        operation_date: parse_day(&history.operation_date)?,
        item_quantity: parse_money(&history.item_quantity)?,
        item_unit_price: parse_money(&history.item_unit_price)?,
        item_total_price: parse_money(&history.item_total_price)?,
        inserted_at: now,
        updated_at: now,
    })
}

fn liquidation_row(l: &Liquidation, now: DateTime<Utc>) -> Result<LiquidationRow, ParseError> {
    Ok(LiquidationRow {
        liquidation_code: l.liquidation_code.clone(),
        liquidation_code_resumed: l.resumed_liquidation_code.clone(),
        liquidation_emission_date: parse_day(&l.emission_date)?,
        document_code_type: l.document_code_type.clone(),
        document_type: l.document_type.clone(),
        management_unit_name: l.management_unit_name.clone(),
        management_unit_code: parse_code(&l.management_unit_code)?,
        management_code: parse_code(&l.management_code)?,
        management_name: l.management_name.clone(),
        favored_code: l.favored_code.clone(),
        favored_name: l.favored_name.clone(),
        observation: l.observation.clone(),
        inserted_at: now,
        updated_at: now,
    })
}

fn liquidation_impact_row(
    impact: &LiquidationImpactedCommitment,
    now: DateTime<Utc>,
) -> Result<LiquidationImpactedCommitmentRow, ParseError> {
    Ok(LiquidationImpactedCommitmentRow {
        liquidation_code: impact.liquidation_code.clone(),
        commitment_code: impact.commitment_code.clone(),
        expense_nature_code: impact.expense_nature_code.clone(),
        subitem: impact.subitem.clone(),
        liquidated_value_brl: parse_money(&impact.liquidated_value)?,
        registered_payables_value_brl: parse_money(&impact.registered_payables_value)?,
        canceled_payables_value_brl: parse_money(&impact.canceled_payables_value)?,
        outstanding_value_liquidated_brl: parse_money(&impact.outstanding_liquidated_value)?,
        inserted_at: now,
        updated_at: now,
    })
}

fn payment_row(p: &Payment, now: DateTime<Utc>) -> Result<PaymentRow, ParseError> {
    Ok(PaymentRow {
        payment_code: p.payment_code.clone(),
        payment_code_resumed: p.resumed_payment_code.clone(),
        payment_emission_date: parse_day(&p.emission_date)?,
        document_code_type: p.document_code_type.clone(),
        document_type: p.document_type.clone(),
        management_unit_name: p.management_unit_name.clone(),
        management_unit_code: parse_code(&p.management_unit_code)?,
        management_code: parse_code(&p.management_code)?,
        management_name: p.management_name.clone(),
        favored_code: p.favored_code.clone(),
        favored_name: p.favored_name.clone(),
        extra_budgetary: parse_flag(&p.extra_budgetary),
        process: p.process.clone(),
        original_payment_value: parse_money(&p.original_value)?,
        converted_payment_value: parse_money(&p.converted_value)?,
        conversion_used_value: parse_money(&p.conversion_reference_value)?,
        inserted_at: now,
        updated_at: now,
    })
}

fn payment_impact_row(
    impact: &PaymentImpactedCommitment,
    now: DateTime<Utc>,
) -> Result<PaymentImpactedCommitmentRow, ParseError> {
    Ok(PaymentImpactedCommitmentRow {
        payment_code: impact.payment_code.clone(),
        commitment_code: impact.commitment_code.clone(),
        expense_nature_code: impact.expense_nature_code.clone(),
        subitem: impact.subitem.clone(),
        paid_value_brl: parse_money(&impact.paid_value)?,
        registered_payables_value_brl: parse_money(&impact.registered_payables_value)?,
        canceled_payables_value_brl: parse_money(&impact.canceled_payables_value)?,
        outstanding_value_paid_brl: parse_money(&impact.outstanding_paid_value)?,
        inserted_at: now,
        updated_at: now,
    })
}

#[derive(Debug, Default)]
struct UnitStats {
    commitments: usize,
    liquidations: usize,
    payments: usize,
    rows_skipped: usize,
}

async fn load_unit(
    pool: &PgPool,
    unit: &UnitBundle,
    now: DateTime<Utc>,
) -> Result<UnitStats, sqlx::Error> {
    let mut stats = UnitStats::default();
    let mut tx = pool.begin().await?;

    for c in &unit.commitments {
        let row = match commitment_row(c, now) {
            Ok(row) => row,
            Err(error) => {
                warn!(code = %c.commitment_code, %error, "skipping commitment row");
                stats.rows_skipped += 1;
                continue;
            }
        };
        commitment::upsert_commitment(&mut *tx, &row).await?;
        stats.commitments += 1;

        for item in &c.items {
            let item_row = match item_row(item, row.id, now) {
                Ok(r) => r,
                Err(error) => {
                    warn!(code = %c.commitment_code, %error, "skipping commitment item row");
                    stats.rows_skipped += 1;
                    continue;
                }
            };
            commitment::upsert_commitment_item(&mut *tx, &item_row).await?;

            for hist in &item.history {
                let hist_row = match history_row(hist, row.id, now) {
                    Ok(r) => r,
                    Err(error) => {
                        warn!(code = %c.commitment_code, %error, "skipping item history row");
                        stats.rows_skipped += 1;
                        continue;
                    }
                };
                commitment::upsert_commitment_item_history(&mut *tx, &hist_row).await?;
            }
        }
    }

    for l in &unit.liquidations {
        let row = match liquidation_row(l, now) {
            Ok(row) => row,
            Err(error) => {
                warn!(code = %l.liquidation_code, %error, "skipping liquidation row");
                stats.rows_skipped += 1;
                continue;
            }
        };
        liquidation::upsert_liquidation(&mut *tx, &row).await?;
        stats.liquidations += 1;

        for impact in &l.impacted_commitments {
            let impact_row = match liquidation_impact_row(impact, now) {
                Ok(r) => r,
                Err(error) => {
                    warn!(code = %l.liquidation_code, %error, "skipping liquidation impact row");
                    stats.rows_skipped += 1;
                    continue;
                }
            };
            liquidation::upsert_liquidation_impacted_commitment(&mut *tx, &impact_row).await?;
        }
    }

    for p in &unit.payments {
        let row = match payment_row(p, now) {
            Ok(row) => row,
            Err(error) => {
                warn!(code = %p.payment_code, %error, "skipping payment row");
                stats.rows_skipped += 1;
                continue;
            }
        };
        payment::upsert_payment(&mut *tx, &row).await?;
        stats.payments += 1;

        for impact in &p.impacted_commitments {
            let impact_row = match payment_impact_row(impact, now) {
                Ok(r) => r,
                Err(error) => {
                    warn!(code = %p.payment_code, %error, "skipping payment impact row");
                    stats.rows_skipped += 1;
                    continue;
                }
            };
            payment::upsert_payment_impacted_commitment(&mut *tx, &impact_row).await?;
        }
    }

    tx.commit().await?;
    Ok(stats)
}

/// Upserts every row of `payload`, one transaction per management unit. A
/// failed unit rolls back alone; the remaining units still load.
pub async fn load_payload(pool: &PgPool, payload: &DayPayload) -> LoadReport {
    let mut report = LoadReport::default();
    info!(date = %payload.extraction_date, units = payload.units.len(), "starting data load");

    for unit in &payload.units {
        let now = Utc::now();
        match load_unit(pool, unit, now).await {
            Ok(stats) => {
                report.units_loaded += 1;
                report.commitments += stats.commitments;
                report.liquidations += stats.liquidations;
                report.payments += stats.payments;
                report.rows_skipped += stats.rows_skipped;
            }
            Err(error) => {
                error!(unit = %unit.unit_code, %error, "unit transaction failed");
                report.failed_units.push(unit.unit_code.clone());
            }
        }
    }

    info!(
        date = %payload.extraction_date,
        units_loaded = report.units_loaded,
        failed_units = report.failed_units.len(),
        rows_skipped = report.rows_skipped,
        "data load completed"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn sample_commitment() -> Commitment {
        Commitment {
            commitment_id: "42".into(),
            commitment_code: "158454000012025NE000001".into(),
            emission_date: "16/01/2025".into(),
            management_unit_code: "158454".into(),
            management_code: "26423".into(),
            original_value: "1.234,56".into(),
            converted_value: "1.234,56".into(),
            conversion_reference_value: "".into(),
            ..Commitment::default()
        }
    }

    #[test]
    fn commitment_conversion_parses_typed_columns() {
        let now = Utc::now();
        let row = commitment_row(&sample_commitment(), now).unwrap();
        assert_eq!(row.id, 42);
        assert_eq!(row.management_unit_code, 158454);
        assert_eq!(
            row.commitment_original_value,
            "1234.56".parse::<Decimal>().unwrap()
        );
        assert_eq!(row.conversion_value_used, Decimal::ZERO);
        assert_eq!(
            row.emission_date,
            Some(chrono::NaiveDate::from_ymd_opt(2025, 1, 16).unwrap())
        );
        assert_eq!(row.inserted_at, now);
        assert_eq!(row.updated_at, now);
    }

    #[test]
    fn malformed_amount_is_a_row_error() {
        let mut c = sample_commitment();
        c.original_value = "not-a-number".into();
        assert!(commitment_row(&c, Utc::now()).is_err());
    }

    #[test]
    fn payment_flag_follows_the_sim_convention() {
        let mut p = Payment {
            payment_code: "P1".into(),
            extra_budgetary: "Sim".into(),
            ..Payment::default()
        };
        assert!(payment_row(&p, Utc::now()).unwrap().extra_budgetary);
        p.extra_budgetary = "Não".into();
        assert!(!payment_row(&p, Utc::now()).unwrap().extra_budgetary);
    }

    #[test]
    fn empty_dates_become_null_without_error() {
        let l = Liquidation {
            liquidation_code: "L1".into(),
            emission_date: String::new(),
            ..Liquidation::default()
        };
        let row = liquidation_row(&l, Utc::now()).unwrap();
        assert!(row.liquidation_emission_date.is_none());
    }

    #[test]
    fn item_and_history_rows_carry_the_parent_id() {
        let item = CommitmentItem {
            commitment_code: "E1".into(),
            sequential: "3".into(),
            quantity: "2,00".into(),
            ..CommitmentItem::default()
        };
        let row = item_row(&item, 42, Utc::now()).unwrap();
        assert_eq!(row.commitment_id, 42);
        assert_eq!(row.sequential, 3);

        let hist = CommitmentItemHistory {
            commitment_code: "E1".into(),
            sequential: "3".into(),
            operation_date: "2025-01-16".into(),
            ..CommitmentItemHistory::default()
        };
        let row = history_row(&hist, 42, Utc::now()).unwrap();
        assert_eq!(row.commitment_id, 42);
        assert!(row.operation_date.is_some());
    }
}
