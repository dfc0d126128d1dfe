//! Upserts for payments and their impacted-commitment edges.

use sqlx::PgExecutor;

use crate::models::{PaymentImpactedCommitmentRow, PaymentRow};

pub async fn upsert_payment(
    executor: impl PgExecutor<'_>,
    row: &PaymentRow,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO payments (
            payment_code,
            payment_code_resumed,
            payment_emission_date,
            document_code_type,
            document_type,
            management_unit_name,
            management_unit_code,
            management_code,
            management_name,
            favored_code,
            favored_name,
            extra_budgetary,
            process,
            original_payment_value,
            converted_payment_value,
            conversion_used_value,
            inserted_at,
            updated_at
        ) VALUES (
            $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14,
            $15, $16, $17, $18
        )
        ON CONFLICT (payment_code) DO UPDATE SET
            payment_code_resumed = EXCLUDED.payment_code_resumed,
            payment_emission_date = EXCLUDED.payment_emission_date,
            document_code_type = EXCLUDED.document_code_type,
            document_type = EXCLUDED.document_type,
            management_unit_name = EXCLUDED.management_unit_name,
            management_unit_code = EXCLUDED.management_unit_code,
            management_code = EXCLUDED.management_code,
            management_name = EXCLUDED.management_name,
            favored_code = EXCLUDED.favored_code,
            favored_name = EXCLUDED.favored_name,
            extra_budgetary = EXCLUDED.extra_budgetary,
            process = EXCLUDED.process,
            original_payment_value = EXCLUDED.original_payment_value,
            converted_payment_value = EXCLUDED.converted_payment_value,
            conversion_used_value = EXCLUDED.conversion_used_value,
            inserted_at = EXCLUDED.inserted_at,
            updated_at = EXCLUDED.updated_at
        "#,
    )
    .bind(&row.payment_code)
    .bind(&row.payment_code_resumed)
    .bind(row.payment_emission_date)
    .bind(&row.document_code_type)
    .bind(&row.document_type)
    .bind(&row.management_unit_name)
    .bind(row.management_unit_code)
    .bind(row.management_code)
    .bind(&row.management_name)
    .bind(&row.favored_code)
    .bind(&row.favored_name)
    .bind(row.extra_budgetary)
    .bind(&row.process)
    .bind(row.original_payment_value)
    .bind(row.converted_payment_value)
    .bind(row.conversion_used_value)
    .bind(row.inserted_at)
    .bind(row.updated_at)
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn upsert_payment_impacted_commitment(
    executor: impl PgExecutor<'_>,
    row: &PaymentImpactedCommitmentRow,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO payment_impacted_commitments (
            payment_code,
            commitment_code,
            expense_nature_code,
            subitem,
            paid_value_brl,
            registered_payables_value_brl,
            canceled_payables_value_brl,
            outstanding_value_paid_brl,
            inserted_at,
            updated_at
        ) VALUES (
            $1, $2, $3, $4, $5, $6, $7, $8, $9, $10
        )
        ON CONFLICT (payment_code, commitment_code, expense_nature_code, subitem)
        DO UPDATE SET
            paid_value_brl = EXCLUDED.paid_value_brl,
            registered_payables_value_brl = EXCLUDED.registered_payables_value_brl,
            canceled_payables_value_brl = EXCLUDED.canceled_payables_value_brl,
            outstanding_value_paid_brl = EXCLUDED.outstanding_value_paid_brl,
            inserted_at = EXCLUDED.inserted_at,
            updated_at = EXCLUDED.updated_at
        "#,
    )
    .bind(&row.payment_code)
    .bind(&row.commitment_code)
    .bind(&row.expense_nature_code)
    .bind(&row.subitem)
    .bind(row.paid_value_brl)
    .bind(row.registered_payables_value_brl)
    .bind(row.canceled_payables_value_brl)
    .bind(row.outstanding_value_paid_brl)
    .bind(row.inserted_at)
    .bind(row.updated_at)
    .execute(executor)
    .await?;
    Ok(())
}
