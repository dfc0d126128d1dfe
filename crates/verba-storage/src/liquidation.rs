//! Upserts for liquidations and their impacted-commitment edges.

use sqlx::PgExecutor;

use crate::models::{LiquidationImpactedCommitmentRow, LiquidationRow};

pub async fn upsert_liquidation(
    executor: impl PgExecutor<'_>,
    row: &LiquidationRow,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO liquidations (
            liquidation_code,
            liquidation_code_resumed,
            liquidation_emission_date,
            document_code_type,
            document_type,
            management_unit_name,
            management_unit_code,
            management_code,
            management_name,
            favored_code,
            favored_name,
            observation,
            inserted_at,
            updated_at
        ) VALUES (
            $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14
        )
        ON CONFLICT (liquidation_code) DO UPDATE SET
            liquidation_code_resumed = EXCLUDED.liquidation_code_resumed,
            liquidation_emission_date = EXCLUDED.liquidation_emission_date,
            document_code_type = EXCLUDED.document_code_type,
            document_type = EXCLUDED.document_type,
            management_unit_name = EXCLUDED.management_unit_name,
            management_unit_code = EXCLUDED.management_unit_code,
            management_code = EXCLUDED.management_code,
            management_name = EXCLUDED.management_name,
            favored_code = EXCLUDED.favored_code,
            favored_name = EXCLUDED.favored_name,
            observation = EXCLUDED.observation,
            inserted_at = EXCLUDED.inserted_at,
            updated_at = EXCLUDED.updated_at
        "#,
    )
    .bind(&row.liquidation_code)
    .bind(&row.liquidation_code_resumed)
    .bind(row.liquidation_emission_date)
    .bind(&row.document_code_type)
    .bind(&row.document_type)
    .bind(&row.management_unit_name)
    .bind(row.management_unit_code)
    .bind(row.management_code)
    .bind(&row.management_name)
    .bind(&row.favored_code)
    .bind(&row.favored_name)
    .bind(&row.observation)
    .bind(row.inserted_at)
    .bind(row.updated_at)
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn upsert_liquidation_impacted_commitment(
    executor: impl PgExecutor<'_>,
    row: &LiquidationImpactedCommitmentRow,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO liquidation_impacted_commitments (
            liquidation_code,
            commitment_code,
            expense_nature_code,
            subitem,
            liquidated_value_brl,
            registered_payables_value_brl,
            canceled_payables_value_brl,
            outstanding_value_liquidated_brl,
            inserted_at,
            updated_at
        ) VALUES (
            $1, $2, $3, $4, $5, $6, $7, $8, $9, $10
        )
        ON CONFLICT (liquidation_code, commitment_code, expense_nature_code, subitem)
        DO UPDATE SET
            liquidated_value_brl = EXCLUDED.liquidated_value_brl,
            registered_payables_value_brl = EXCLUDED.registered_payables_value_brl,
            canceled_payables_value_brl = EXCLUDED.canceled_payables_value_brl,
            outstanding_value_liquidated_brl = EXCLUDED.outstanding_value_liquidated_brl,
            inserted_at = EXCLUDED.inserted_at,
            updated_at = EXCLUDED.updated_at
        "#,
    )
    .bind(&row.liquidation_code)
    .bind(&row.commitment_code)
    .bind(&row.expense_nature_code)
    .bind(&row.subitem)
    .bind(row.liquidated_value_brl)
    .bind(row.registered_payables_value_brl)
    .bind(row.canceled_payables_value_brl)
    .bind(row.outstanding_value_liquidated_brl)
    .bind(row.inserted_at)
    .bind(row.updated_at)
    .execute(executor)
    .await?;
    Ok(())
}
