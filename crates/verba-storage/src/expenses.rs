//! Aggregate report queries over the warehouse.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};

/// Common filter for the expense reports. `management_unit_codes` empty
/// means "all units of the management".
#[derive(Debug, Clone)]
pub struct ExpensesFilter {
    pub management_code: i64,
    pub management_unit_codes: Vec<i64>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct UnitExecutionSummary {
    pub management_unit_code: i64,
    pub management_unit_name: String,
    pub committed_amount: Decimal,
    pub liquidated_amount: Decimal,
    pub paid_amount: Decimal,
    pub balance_to_liquidate: Decimal,
    pub balance_to_pay_processed: Decimal,
    pub execution_percentage: Decimal,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct GlobalSummary {
    pub committed_amount: Decimal,
    pub liquidated_amount: Decimal,
    pub paid_amount: Decimal,
    pub balance_to_liquidate: Decimal,
    pub balance_to_pay_processed: Decimal,
    pub execution_percentage: Decimal,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ExpenseNatureTotal {
    pub expense_nature_code: String,
    pub expense_element: String,
    pub committed_amount: Decimal,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ExpensesByCategory {
    pub expense_category_code: i64,
    pub expense_category: String,
    pub committed_amount: Decimal,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TopFavored {
    pub favored_code: String,
    pub favored_name: String,
    pub paid_amount: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitmentItemInformation {
    pub description: String,
    pub sequential: i16,
    pub quantity: Decimal,
    pub current_value: Decimal,
    pub expense_element: String,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CommitmentInformation {
    pub management_unit_code: i64,
    pub commitment_code: String,
    pub commitment_total_value: Decimal,
    pub commitment_emission_date: Option<NaiveDate>,
    pub commitment_process: String,
    pub commitment_type: String,
    pub commitment_favored: String,
    pub commitment_favored_code: String,
    pub commitment_items: Json<Vec<CommitmentItemInformation>>,
}

/// Filter for the commitments listing.
#[derive(Debug, Clone)]
pub struct CommitmentInformationFilter {
    pub management_code: i64,
    pub management_unit_codes: Vec<i64>,
    pub commitment_codes: Vec<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// Committed/liquidated/paid totals per management unit of one management,
/// with the derived balances and execution percentage.
pub async fn budget_execution_summary(
    pool: &PgPool,
    filter: &ExpensesFilter,
) -> Result<Vec<UnitExecutionSummary>, sqlx::Error> {
    sqlx::query_as(
        r#"
        WITH committed AS (
            SELECT c.management_unit_code AS unit_code,
                   MIN(c.management_unit_name) AS unit_name,
                   COALESCE(SUM(ci.current_value), 0) AS committed
            FROM commitments c
            LEFT JOIN commitment_items ci ON c.id = ci.commitment_id
            WHERE c.management_code = $1
              AND (cardinality($2::bigint[]) = 0 OR c.management_unit_code = ANY($2))
              AND c.emission_date BETWEEN $3 AND $4
            GROUP BY c.management_unit_code
        ),
        liquidated AS (
            SELECT l.management_unit_code AS unit_code,
                   COALESCE(SUM(lic.liquidated_value_brl), 0) AS liquidated
            FROM liquidations l
            LEFT JOIN liquidation_impacted_commitments lic
                   ON l.liquidation_code = lic.liquidation_code
            WHERE l.management_code = $1
              AND (cardinality($2::bigint[]) = 0 OR l.management_unit_code = ANY($2))
              AND l.liquidation_emission_date BETWEEN $3 AND $4
            GROUP BY l.management_unit_code
        ),
        paid AS (
            SELECT p.management_unit_code AS unit_code,
                   COALESCE(SUM(pic.paid_value_brl), 0) AS paid
            FROM payments p
            LEFT JOIN payment_impacted_commitments pic
                   ON p.payment_code = pic.payment_code
            WHERE p.management_code = $1
              AND (cardinality($2::bigint[]) = 0 OR p.management_unit_code = ANY($2))
              AND p.payment_emission_date BETWEEN $3 AND $4
            GROUP BY p.management_unit_code
        )
        SELECT COALESCE(c.unit_code, l.unit_code, p.unit_code) AS management_unit_code,
               COALESCE(c.unit_name, '') AS management_unit_name,
               COALESCE(c.committed, 0)::numeric AS committed_amount,
               COALESCE(l.liquidated, 0)::numeric AS liquidated_amount,
               COALESCE(p.paid, 0)::numeric AS paid_amount,
               (COALESCE(c.committed, 0) - COALESCE(l.liquidated, 0))::numeric
                   AS balance_to_liquidate,
               (COALESCE(l.liquidated, 0) - COALESCE(p.paid, 0))::numeric
                   AS balance_to_pay_processed,
               CASE WHEN COALESCE(c.committed, 0) > 0
                    THEN ROUND(COALESCE(p.paid, 0) / c.committed * 100, 2)
                    ELSE 0::numeric
               END AS execution_percentage
        FROM committed c
        FULL JOIN liquidated l ON l.unit_code = c.unit_code
        FULL JOIN paid p ON p.unit_code = COALESCE(c.unit_code, l.unit_code)
        ORDER BY management_unit_code
        "#,
    )
    .bind(filter.management_code)
    .bind(&filter.management_unit_codes)
    .bind(filter.start_date)
    .bind(filter.end_date)
    .fetch_all(pool)
    .await
}

/// Consolidated execution numbers for the whole management. Restricted to
/// current expenses (category 3 / nature prefix 33), the slice the
/// execution dashboards track.
pub async fn budget_execution_summary_by_management(
    pool: &PgPool,
    filter: &ExpensesFilter,
) -> Result<GlobalSummary, sqlx::Error> {
    sqlx::query_as(
        r#"
        WITH total_committed AS (
            SELECT COALESCE(SUM(ci.current_value), 0) AS committed
            FROM commitments c
            LEFT JOIN commitment_items ci ON c.id = ci.commitment_id
            WHERE c.expense_category_code = 3
              AND c.management_code = $1
              AND c.emission_date BETWEEN $2 AND $3
        ),
        total_liquidated AS (
            SELECT COALESCE(SUM(lic.liquidated_value_brl), 0) AS liquidated
            FROM liquidations l
            LEFT JOIN liquidation_impacted_commitments lic
                   ON l.liquidation_code = lic.liquidation_code
            WHERE lic.expense_nature_code LIKE '33%'
              AND l.management_code = $1
              AND l.liquidation_emission_date BETWEEN $2 AND $3
        ),
        total_paid AS (
            SELECT COALESCE(SUM(pic.paid_value_brl), 0) AS paid
            FROM payments p
            LEFT JOIN payment_impacted_commitments pic
                   ON p.payment_code = pic.payment_code
            WHERE pic.expense_nature_code LIKE '33%'
              AND p.management_code = $1
              AND p.payment_emission_date BETWEEN $2 AND $3
        )
        SELECT c.committed::numeric AS committed_amount,
               l.liquidated::numeric AS liquidated_amount,
               p.paid::numeric AS paid_amount,
               (c.committed - l.liquidated)::numeric AS balance_to_liquidate,
               (l.liquidated - p.paid)::numeric AS balance_to_pay_processed,
               CASE WHEN c.committed > 0
                    THEN ROUND(p.paid / c.committed * 100, 2)
                    ELSE 0::numeric
               END AS execution_percentage
        FROM total_committed c
        CROSS JOIN total_liquidated l
        CROSS JOIN total_paid p
        "#,
    )
    .bind(filter.management_code)
    .bind(filter.start_date)
    .bind(filter.end_date)
    .fetch_one(pool)
    .await
}

/// Committed totals grouped by the complete expense nature, descending.
pub async fn budget_execution_report(
    pool: &PgPool,
    filter: &ExpensesFilter,
) -> Result<Vec<ExpenseNatureTotal>, sqlx::Error> {
    sqlx::query_as(
        r#"
        SELECT CONCAT(c.expense_category_code, '.',
                      c.expense_group_code, '.',
                      LPAD(c.application_modality_code::text, 2, '0'), '.',
                      LPAD(c.expense_element_code::text, 2, '0')) AS expense_nature_code,
               c.expense_element AS expense_element,
               COALESCE(SUM(ci.current_value), 0)::numeric AS committed_amount
        FROM commitments c
        LEFT JOIN commitment_items ci ON c.id = ci.commitment_id
        WHERE c.management_code = $1
          AND (cardinality($2::bigint[]) = 0 OR c.management_unit_code = ANY($2))
          AND c.emission_date BETWEEN $3 AND $4
        GROUP BY c.expense_category_code, c.expense_group_code,
                 c.application_modality_code, c.expense_element_code,
                 c.expense_element
        ORDER BY committed_amount DESC
        "#,
    )
    .bind(filter.management_code)
    .bind(&filter.management_unit_codes)
    .bind(filter.start_date)
    .bind(filter.end_date)
    .fetch_all(pool)
    .await
}

/// Committed totals grouped by expense category, descending.
pub async fn expenses_by_category(
    pool: &PgPool,
    filter: &ExpensesFilter,
) -> Result<Vec<ExpensesByCategory>, sqlx::Error> {
    sqlx::query_as(
        r#"
        SELECT c.expense_category_code AS expense_category_code,
               MIN(c.expense_category) AS expense_category,
               COALESCE(SUM(ci.current_value), 0)::numeric AS committed_amount
        FROM commitments c
        LEFT JOIN commitment_items ci ON c.id = ci.commitment_id
        WHERE c.management_code = $1
          AND (cardinality($2::bigint[]) = 0 OR c.management_unit_code = ANY($2))
          AND c.emission_date BETWEEN $3 AND $4
        GROUP BY c.expense_category_code
        ORDER BY committed_amount DESC
        "#,
    )
    .bind(filter.management_code)
    .bind(&filter.management_unit_codes)
    .bind(filter.start_date)
    .bind(filter.end_date)
    .fetch_all(pool)
    .await
}

/// Payees receiving the most, by summed paid value.
pub async fn top_favored(
    pool: &PgPool,
    filter: &ExpensesFilter,
    limit: i64,
) -> Result<Vec<TopFavored>, sqlx::Error> {
    sqlx::query_as(
        r#"
        SELECT p.favored_code AS favored_code,
               MIN(p.favored_name) AS favored_name,
               COALESCE(SUM(pic.paid_value_brl), 0)::numeric AS paid_amount
        FROM payments p
        LEFT JOIN payment_impacted_commitments pic
               ON p.payment_code = pic.payment_code
        WHERE p.management_code = $1
          AND (cardinality($2::bigint[]) = 0 OR p.management_unit_code = ANY($2))
          AND p.payment_emission_date BETWEEN $3 AND $4
        GROUP BY p.favored_code
        ORDER BY paid_amount DESC
        LIMIT $5
        "#,
    )
    .bind(filter.management_code)
    .bind(&filter.management_unit_codes)
    .bind(filter.start_date)
    .bind(filter.end_date)
    .bind(limit)
    .fetch_all(pool)
    .await
}

/// Commitments of a management with their items JSON-aggregated, for the
/// read API listing.
pub async fn commitments_information(
    pool: &PgPool,
    filter: &CommitmentInformationFilter,
) -> Result<Vec<CommitmentInformation>, sqlx::Error> {
    sqlx::query_as(
        r#"
        SELECT c.management_unit_code AS management_unit_code,
               c.commitment_code AS commitment_code,
               COALESCE(SUM(ci.current_value), 0)::numeric AS commitment_total_value,
               c.emission_date AS commitment_emission_date,
               c.process AS commitment_process,
               c.commitment_type AS commitment_type,
               c.favored_name AS commitment_favored,
               c.favored_code AS commitment_favored_code,
               JSON_AGG(JSON_BUILD_OBJECT(
                   'description', ci.description,
                   'sequential', ci.sequential,
                   'quantity', ci.quantity,
                   'current_value', ci.current_value,
                   'expense_element', ci.expense_element
               ) ORDER BY ci.sequential) AS commitment_items
        FROM commitments c
        JOIN commitment_items ci ON c.id = ci.commitment_id
        WHERE c.management_code = $1
          AND (cardinality($2::bigint[]) = 0 OR c.management_unit_code = ANY($2))
          AND (cardinality($3::text[]) = 0 OR c.commitment_code = ANY($3))
          AND c.emission_date BETWEEN $4 AND $5
        GROUP BY c.management_unit_code, c.commitment_code, c.emission_date,
                 c.process, c.commitment_type, c.favored_name, c.favored_code
        ORDER BY c.emission_date DESC, c.commitment_code
        "#,
    )
    .bind(filter.management_code)
    .bind(&filter.management_unit_codes)
    .bind(&filter.commitment_codes)
    .bind(filter.start_date)
    .bind(filter.end_date)
    .fetch_all(pool)
    .await
}

/// Wide-open default date range used when the caller sends none.
pub fn default_date_range() -> (NaiveDate, NaiveDate) {
    let start = NaiveDate::from_ymd_opt(2000, 1, 1).expect("valid literal date");
    let end = NaiveDate::from_ymd_opt(2100, 12, 31).expect("valid literal date");
    (start, end)
}
