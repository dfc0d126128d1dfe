//! Upserts for commitments, their items and the item history.
//!
//! All three run against any Postgres executor so the loader can point
//! them at a per-unit transaction.

use sqlx::PgExecutor;

use crate::models::{CommitmentItemRow, CommitmentItemsHistoryRow, CommitmentRow};

pub async fn upsert_commitment(
    executor: impl PgExecutor<'_>,
    row: &CommitmentRow,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO commitments (
            id,
            commitment_code,
            resumed_commitment_code,
            emission_date,
            commitment_type,
            process,
            document_code_type,
            document_type,
            management_unit_name,
            management_unit_code,
            management_code,
            management_name,
            favored_code,
            favored_name,
            expense_category_code,
            expense_category,
            expense_group_code,
            expense_group,
            application_modality_code,
            application_modality,
            expense_element_code,
            expense_element,
            expense_nature_code,
            budget_plan,
            commitment_original_value,
            commitment_value_converted_to_brl,
            conversion_value_used,
            inserted_at,
            updated_at
        ) VALUES (
            $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14,
            $15, $16, $17, $18, $19, $20, $21, $22, $23, $24, $25, $26,
            $27, $28, $29
        )
        ON CONFLICT (commitment_code) DO UPDATE SET
            resumed_commitment_code = EXCLUDED.resumed_commitment_code,
            emission_date = EXCLUDED.emission_date,
            commitment_type = EXCLUDED.commitment_type,
            process = EXCLUDED.process,
            document_code_type = EXCLUDED.document_code_type,
            document_type = EXCLUDED.document_type,
            management_unit_name = EXCLUDED.management_unit_name,
            management_unit_code = EXCLUDED.management_unit_code,
            management_code = EXCLUDED.management_code,
            management_name = EXCLUDED.management_name,
            favored_code = EXCLUDED.favored_code,
            favored_name = EXCLUDED.favored_name,
            expense_category_code = EXCLUDED.expense_category_code,
            expense_category = EXCLUDED.expense_category,
            expense_group_code = EXCLUDED.expense_group_code,
            expense_group = EXCLUDED.expense_group,
            application_modality_code = EXCLUDED.application_modality_code,
            application_modality = EXCLUDED.application_modality,
            expense_element_code = EXCLUDED.expense_element_code,
            expense_element = EXCLUDED.expense_element,
            expense_nature_code = EXCLUDED.expense_nature_code,
            budget_plan = EXCLUDED.budget_plan,
            commitment_original_value = EXCLUDED.commitment_original_value,
            commitment_value_converted_to_brl = EXCLUDED.commitment_value_converted_to_brl,
            conversion_value_used = EXCLUDED.conversion_value_used,
            inserted_at = EXCLUDED.inserted_at,
            updated_at = EXCLUDED.updated_at
        "#,
    )
    .bind(row.id)
    .bind(&row.commitment_code)
    .bind(&row.resumed_commitment_code)
    .bind(row.emission_date)
    .bind(&row.commitment_type)
    .bind(&row.process)
    .bind(&row.document_code_type)
    .bind(&row.document_type)
    .bind(&row.management_unit_name)
    .bind(row.management_unit_code)
    .bind(row.management_code)
    .bind(&row.management_name)
    .bind(&row.favored_code)
    .bind(&row.favored_name)
    .bind(row.expense_category_code)
    .bind(&row.expense_category)
    .bind(row.expense_group_code)
    .bind(&row.expense_group)
    .bind(row.application_modality_code)
    .bind(&row.application_modality)
    .bind(row.expense_element_code)
    .bind(&row.expense_element)
    .bind(&row.expense_nature_code)
    .bind(&row.budget_plan)
    .bind(row.commitment_original_value)
    .bind(row.commitment_value_converted_to_brl)
    .bind(row.conversion_value_used)
    .bind(row.inserted_at)
    .bind(row.updated_at)
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn upsert_commitment_item(
    executor: impl PgExecutor<'_>,
    row: &CommitmentItemRow,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO commitment_items (
            commitment_id,
            commitment_code,
            sequential,
            expense_category_code,
            expense_category,
            expense_group_code,
            expense_group,
            application_modality_code,
            application_modality,
            expense_element_code,
            expense_element,
            expense_nature_code,
            description,
            quantity,
            unit_price,
            total_price,
            current_value,
            inserted_at,
            updated_at
        ) VALUES (
            $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14,
            $15, $16, $17, $18, $19
        )
        ON CONFLICT (commitment_code, sequential) DO UPDATE SET
            commitment_id = EXCLUDED.commitment_id,
            expense_category_code = EXCLUDED.expense_category_code,
            expense_category = EXCLUDED.expense_category,
            expense_group_code = EXCLUDED.expense_group_code,
            expense_group = EXCLUDED.expense_group,
            application_modality_code = EXCLUDED.application_modality_code,
            application_modality = EXCLUDED.application_modality,
            expense_element_code = EXCLUDED.expense_element_code,
            expense_element = EXCLUDED.expense_element,
            expense_nature_code = EXCLUDED.expense_nature_code,
            description = EXCLUDED.description,
            quantity = EXCLUDED.quantity,
            unit_price = EXCLUDED.unit_price,
            total_price = EXCLUDED.total_price,
            current_value = EXCLUDED.current_value,
            inserted_at = EXCLUDED.inserted_at,
            updated_at = EXCLUDED.updated_at
        "#,
    )
    .bind(row.commitment_id)
    .bind(&row.commitment_code)
    .bind(row.sequential)
    .bind(row.expense_category_code)
    .bind(&row.expense_category)
    .bind(row.expense_group_code)
    .bind(&row.expense_group)
    .bind(row.application_modality_code)
    .bind(&row.application_modality)
    .bind(row.expense_element_code)
    .bind(&row.expense_element)
    .bind(&row.expense_nature_code)
    .bind(&row.description)
    .bind(row.quantity)
    .bind(row.unit_price)
    .bind(row.total_price)
    .bind(row.current_value)
    .bind(row.inserted_at)
    .bind(row.updated_at)
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn upsert_commitment_item_history(
    executor: impl PgExecutor<'_>,
    row: &CommitmentItemsHistoryRow,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO commitment_items_history (
            commitment_id,
            commitment_code,
            sequential,
            operation_type,
            operation_date,
            item_quantity,
            item_unit_price,
            item_total_price,
            inserted_at,
            updated_at
        ) VALUES (
            $1, $2, $3, $4, $5, $6, $7, $8, $9, $10
        )
        ON CONFLICT (commitment_code, sequential, operation_date, operation_type)
        DO UPDATE SET
            commitment_id = EXCLUDED.commitment_id,
            item_quantity = EXCLUDED.item_quantity,
            item_unit_price = EXCLUDED.item_unit_price,
            item_total_price = EXCLUDED.item_total_price,
            inserted_at = EXCLUDED.inserted_at,
            updated_at = EXCLUDED.updated_at
        "#,
    )
    .bind(row.commitment_id)
    .bind(&row.commitment_code)
    .bind(row.sequential)
    .bind(&row.operation_type)
    .bind(row.operation_date)
    .bind(row.item_quantity)
    .bind(row.item_unit_price)
    .bind(row.item_total_price)
    .bind(row.inserted_at)
    .bind(row.updated_at)
    .execute(executor)
    .await?;
    Ok(())
}
