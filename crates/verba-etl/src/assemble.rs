//! Joins the transformed per-kind tables into the hierarchical day payload.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tracing::info;
use verba_core::{
    Commitment, CommitmentItem, CommitmentItemHistory, DayPayload, Liquidation,
    LiquidationImpactedCommitment, Payment, PaymentImpactedCommitment, UnitBundle,
};
use verba_tabular::{Table, COMPLETE_EXPENSE_NATURE};

/// The projected tables of one day; `None` where the bundle had no
/// matching rows.
#[derive(Debug, Default)]
pub struct DayTables {
    pub commitments: Option<Table>,
    pub items: Option<Table>,
    pub history: Option<Table>,
    pub liquidations: Option<Table>,
    pub liquidation_impacts: Option<Table>,
    pub payments: Option<Table>,
    pub payment_impacts: Option<Table>,
}

fn row_to_commitment(table: &Table, row: usize) -> Commitment {
    Commitment {
        commitment_id: table.value(row, "Id Empenho").to_string(),
        commitment_code: table.value(row, "Código Empenho").to_string(),
        resumed_commitment_code: table.value(row, "Código Empenho Resumido").to_string(),
        emission_date: table.value(row, "Data Emissão").to_string(),
        commitment_type: table.value(row, "Tipo Empenho").to_string(),
        document_code_type: table.value(row, "Código Tipo Documento").to_string(),
        document_type: table.value(row, "Tipo Documento").to_string(),
        process: table.value(row, "Processo").to_string(),
        management_unit_code: table.value(row, "Código Unidade Gestora").to_string(),
        management_unit_name: table.value(row, "Unidade Gestora").to_string(),
        management_code: table.value(row, "Código Gestão").to_string(),
        management_name: table.value(row, "Gestão").to_string(),
        favored_code: table.value(row, "Código Favorecido").to_string(),
        favored_name: table.value(row, "Favorecido").to_string(),
        expense_category_code: table.value(row, "Código Categoria de Despesa").to_string(),
        expense_category: table.value(row, "Categoria de Despesa").to_string(),
        expense_group_code: table.value(row, "Código Grupo de Despesa").to_string(),
        expense_group: table.value(row, "Grupo de Despesa").to_string(),
        application_modality_code: table
            .value(row, "Código Modalidade de Aplicação")
            .to_string(),
        application_modality: table.value(row, "Modalidade de Aplicação").to_string(),
        expense_element_code: table.value(row, "Código Elemento de Despesa").to_string(),
        expense_element: table.value(row, "Elemento de Despesa").to_string(),
        complete_expense_nature: table.value(row, COMPLETE_EXPENSE_NATURE).to_string(),
        budget_plan: table.value(row, "Plano Orçamentário").to_string(),
        original_value: table.value(row, "Valor Original do Empenho").to_string(),
        converted_value: table
            .value(row, "Valor do Empenho Convertido pra R$")
            .to_string(),
        conversion_reference_value: table.value(row, "Valor Utilizado na Conversão").to_string(),
        items: Vec::new(),
    }
}

fn row_to_item(table: &Table, row: usize) -> CommitmentItem {
    CommitmentItem {
        commitment_id: table.value(row, "Id Empenho").to_string(),
        commitment_code: table.value(row, "Código Empenho").to_string(),
        sequential: table.value(row, "Sequencial").to_string(),
        expense_category_code: table.value(row, "Código Categoria de Despesa").to_string(),
        expense_category: table.value(row, "Categoria de Despesa").to_string(),
        expense_group_code: table.value(row, "Código Grupo de Despesa").to_string(),
        expense_group: table.value(row, "Grupo de Despesa").to_string(),
        application_modality_code: table
            .value(row, "Código Modalidade de Aplicação")
            .to_string(),
        application_modality: table.value(row, "Modalidade de Aplicação").to_string(),
        expense_element_code: table.value(row, "Código Elemento de Despesa").to_string(),
        expense_element: table.value(row, "Elemento de Despesa").to_string(),
        complete_expense_nature: table.value(row, COMPLETE_EXPENSE_NATURE).to_string(),
        description: table.value(row, "Descrição").to_string(),
        quantity: table.value(row, "Quantidade").to_string(),
        unit_price: table.value(row, "Valor Unitário").to_string(),
        total_price: table.value(row, "Valor Total").to_string(),
        current_value: table.value(row, "Valor Atual").to_string(),
        history: Vec::new(),
    }
}

fn row_to_item_history(table: &Table, row: usize) -> CommitmentItemHistory {
    CommitmentItemHistory {
        commitment_id: table.value(row, "Id Empenho").to_string(),
        commitment_code: table.value(row, "Código Empenho").to_string(),
        sequential: table.value(row, "Sequencial").to_string(),
        operation_type: table.value(row, "Tipo Operação").to_string(),
        operation_date: table.value(row, "Data Operação").to_string(),
        item_quantity: table.value(row, "Quantidade Item").to_string(),
        item_unit_price: table.value(row, "Valor Unitário Item").to_string(),
        item_total_price: table.value(row, "Valor Total Item").to_string(),
    }
}

fn row_to_liquidation(table: &Table, row: usize) -> Liquidation {
    Liquidation {
        liquidation_code: table.value(row, "Código Liquidação").to_string(),
        resumed_liquidation_code: table.value(row, "Código Liquidação Resumido").to_string(),
        emission_date: table.value(row, "Data Emissão").to_string(),
        document_code_type: table.value(row, "Código Tipo Documento").to_string(),
        document_type: table.value(row, "Tipo Documento").to_string(),
        management_unit_code: table.value(row, "Código Unidade Gestora").to_string(),
        management_unit_name: table.value(row, "Unidade Gestora").to_string(),
        management_code: table.value(row, "Código Gestão").to_string(),
        management_name: table.value(row, "Gestão").to_string(),
        favored_code: table.value(row, "Código Favorecido").to_string(),
        favored_name: table.value(row, "Favorecido").to_string(),
        observation: table.value(row, "Observação").to_string(),
        impacted_commitments: Vec::new(),
    }
}

fn row_to_liquidation_impact(table: &Table, row: usize) -> LiquidationImpactedCommitment {
    LiquidationImpactedCommitment {
        liquidation_code: table.value(row, "Código Liquidação").to_string(),
        commitment_code: table.value(row, "Código Empenho").to_string(),
        expense_nature_code: table
            .value(row, "Código Natureza Despesa Completa")
            .to_string(),
        subitem: table.value(row, "Subitem").to_string(),
        liquidated_value: table.value(row, "Valor Liquidado (R$)").to_string(),
        registered_payables_value: table
            .value(row, "Valor Restos a Pagar Inscritos (R$)")
            .to_string(),
        canceled_payables_value: table
            .value(row, "Valor Restos a Pagar Cancelado (R$)")
            .to_string(),
        outstanding_liquidated_value: table
            .value(row, "Valor Restos a Pagar Liquidados (R$)")
            .to_string(),
    }
}

fn row_to_payment(table: &Table, row: usize) -> Payment {
    Payment {
        payment_code: table.value(row, "Código Pagamento").to_string(),
        resumed_payment_code: table.value(row, "Código Pagamento Resumido").to_string(),
        emission_date: table.value(row, "Data Emissão").to_string(),
        document_code_type: table.value(row, "Código Tipo Documento").to_string(),
        document_type: table.value(row, "Tipo Documento").to_string(),
        management_unit_code: table.value(row, "Código Unidade Gestora").to_string(),
        management_unit_name: table.value(row, "Unidade Gestora").to_string(),
        management_code: table.value(row, "Código Gestão").to_string(),
        management_name: table.value(row, "Gestão").to_string(),
        favored_code: table.value(row, "Código Favorecido").to_string(),
        favored_name: table.value(row, "Favorecido").to_string(),
        extra_budgetary: table.value(row, "Extraorçamentário").to_string(),
        process: table.value(row, "Processo").to_string(),
        original_value: table.value(row, "Valor Original do Pagamento").to_string(),
        converted_value: table
            .value(row, "Valor do Pagamento Convertido pra R$")
            .to_string(),
        conversion_reference_value: table.value(row, "Valor Utilizado na Conversão").to_string(),
        impacted_commitments: Vec::new(),
    }
}

fn row_to_payment_impact(table: &Table, row: usize) -> PaymentImpactedCommitment {
    PaymentImpactedCommitment {
        payment_code: table.value(row, "Código Pagamento").to_string(),
        commitment_code: table.value(row, "Código Empenho").to_string(),
        expense_nature_code: table
            .value(row, "Código Natureza Despesa Completa")
            .to_string(),
        subitem: table.value(row, "Subitem").to_string(),
        paid_value: table.value(row, "Valor Pago (R$)").to_string(),
        registered_payables_value: table
            .value(row, "Valor Restos a Pagar Inscritos (R$)")
            .to_string(),
        canceled_payables_value: table
            .value(row, "Valor Restos a Pagar Cancelados (R$)")
            .to_string(),
        outstanding_paid_value: table.value(row, "Valor Restos a Pagar Pagos (R$)").to_string(),
    }
}

type UnitsMap = Arc<Mutex<HashMap<String, UnitBundle>>>;

async fn unit_entry<'a>(
    units: &'a UnitsMap,
    code: &str,
    name: &str,
) -> tokio::sync::OwnedMutexGuard<HashMap<String, UnitBundle>> {
    let mut guard = Arc::clone(units).lock_owned().await;
    let entry = guard.entry(code.to_string()).or_insert_with(|| UnitBundle {
        unit_code: code.to_string(),
        ..UnitBundle::default()
    });
    // Late-binding: the first non-empty observation names the unit.
    if entry.unit_name.is_empty() && !name.is_empty() {
        entry.unit_name = name.to_string();
    }
    guard
}

/// Items grouped by commitment code with their history attached, source
/// order preserved on both levels.
fn group_items(items: Option<&Table>, history: Option<&Table>) -> HashMap<String, Vec<CommitmentItem>> {
    let mut history_by_key: HashMap<(String, String), Vec<CommitmentItemHistory>> = HashMap::new();
    if let Some(table) = history {
        for row in 0..table.row_count() {
            let entry = row_to_item_history(table, row);
            history_by_key
                .entry((entry.commitment_code.clone(), entry.sequential.clone()))
                .or_default()
                .push(entry);
        }
    }

    let mut grouped: HashMap<String, Vec<CommitmentItem>> = HashMap::new();
    if let Some(table) = items {
        for row in 0..table.row_count() {
            let mut item = row_to_item(table, row);
            if let Some(history) =
                history_by_key.remove(&(item.commitment_code.clone(), item.sequential.clone()))
            {
                item.history = history;
            }
            grouped
                .entry(item.commitment_code.clone())
                .or_default()
                .push(item);
        }
    }
    grouped
}

fn group_by_code<T>(
    table: Option<&Table>,
    convert: impl Fn(&Table, usize) -> T,
    key: impl Fn(&T) -> String,
) -> HashMap<String, Vec<T>> {
    let mut grouped: HashMap<String, Vec<T>> = HashMap::new();
    if let Some(table) = table {
        for row in 0..table.row_count() {
            let value = convert(table, row);
            grouped.entry(key(&value)).or_default().push(value);
        }
    }
    grouped
}

/// Builds the per-unit payload for one day. The three top-level groupings
/// run concurrently over a shared unit map; children keep the order they
/// had in the source tables.
pub async fn assemble(date: NaiveDate, tables: DayTables) -> DayPayload {
    let units: UnitsMap = Arc::new(Mutex::new(HashMap::new()));

    let mut items_by_commitment = group_items(tables.items.as_ref(), tables.history.as_ref());
    let mut liq_impacts = group_by_code(
        tables.liquidation_impacts.as_ref(),
        row_to_liquidation_impact,
        |impact| impact.liquidation_code.clone(),
    );
    let mut pay_impacts = group_by_code(
        tables.payment_impacts.as_ref(),
        row_to_payment_impact,
        |impact| impact.payment_code.clone(),
    );

    let mut tasks = JoinSet::new();

    if let Some(table) = tables.commitments {
        let units = Arc::clone(&units);
        let items = std::mem::take(&mut items_by_commitment);
        tasks.spawn(async move {
            let mut items = items;
            for row in 0..table.row_count() {
                let mut commitment = row_to_commitment(&table, row);
                if let Some(list) = items.remove(&commitment.commitment_code) {
                    commitment.items = list;
                }
                let mut guard = unit_entry(
                    &units,
                    &commitment.management_unit_code,
                    &commitment.management_unit_name,
                )
                .await;
                if let Some(unit) = guard.get_mut(&commitment.management_unit_code) {
                    unit.commitments.push(commitment);
                }
            }
        });
    }

    if let Some(table) = tables.liquidations {
        let units = Arc::clone(&units);
        let impacts = std::mem::take(&mut liq_impacts);
        tasks.spawn(async move {
            let mut impacts = impacts;
            for row in 0..table.row_count() {
                let mut liquidation = row_to_liquidation(&table, row);
                if let Some(list) = impacts.remove(&liquidation.liquidation_code) {
                    liquidation.impacted_commitments = list;
                }
                let mut guard = unit_entry(
                    &units,
                    &liquidation.management_unit_code,
                    &liquidation.management_unit_name,
                )
                .await;
                if let Some(unit) = guard.get_mut(&liquidation.management_unit_code) {
                    unit.liquidations.push(liquidation);
                }
            }
        });
    }

    if let Some(table) = tables.payments {
        let units = Arc::clone(&units);
        let impacts = std::mem::take(&mut pay_impacts);
        tasks.spawn(async move {
            let mut impacts = impacts;
            for row in 0..table.row_count() {
                let mut payment = row_to_payment(&table, row);
                if let Some(list) = impacts.remove(&payment.payment_code) {
                    payment.impacted_commitments = list;
                }
                let mut guard = unit_entry(
                    &units,
                    &payment.management_unit_code,
                    &payment.management_unit_name,
                )
                .await;
                if let Some(unit) = guard.get_mut(&payment.management_unit_code) {
                    unit.payments.push(payment);
                }
            }
        });
    }

    while tasks.join_next().await.is_some() {}

    let map = Arc::try_unwrap(units)
        .map(Mutex::into_inner)
        .unwrap_or_default();
    let mut units: Vec<UnitBundle> = map.into_values().collect();
    units.sort_by(|a, b| a.unit_code.cmp(&b.unit_code));

    let payload = DayPayload {
        extraction_date: date.format("%Y-%m-%d").to_string(),
        units,
    };
    let (commitments, liquidations, payments) = payload.row_counts();
    info!(
        date = %date,
        units = payload.units.len(),
        commitments,
        liquidations,
        payments,
        "assembly completed"
    );
    payload
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(columns: &[&str], rows: &[&[&str]]) -> Table {
        let mut t = Table::new(columns.iter().map(|c| c.to_string()).collect()).unwrap();
        for row in rows {
            t.push_row(row.iter().map(|v| v.to_string()).collect())
                .unwrap();
        }
        t
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 16).unwrap()
    }

    #[tokio::test]
    async fn groups_by_unit_and_attaches_children() {
        let commitments = table(
            &[
                "Id Empenho",
                "Código Empenho",
                "Código Unidade Gestora",
                "Unidade Gestora",
            ],
            &[
                &["1", "E1", "158454", "IFS"],
                &["2", "E2", "158148", "UFPB"],
            ],
        );
        let items = table(
            &["Código Empenho", "Sequencial", "Descrição"],
            &[
                &["E1", "1", "first"],
                &["E1", "2", "second"],
                &["E2", "1", "other"],
            ],
        );
        let history = table(
            &["Código Empenho", "Sequencial", "Tipo Operação", "Data Operação"],
            &[
                &["E1", "2", "REFORÇO", "17/01/2025"],
                &["E1", "1", "INCLUSÃO", "16/01/2025"],
            ],
        );
        let liquidations = table(
            &["Código Liquidação", "Código Unidade Gestora", "Unidade Gestora"],
            &[&["L1", "158454", ""]],
        );
        let liq_impacts = table(
            &["Código Liquidação", "Código Empenho", "Valor Liquidado (R$)"],
            &[&["L1", "E1", "10,00"]],
        );

        let payload = assemble(
            date(),
            DayTables {
                commitments: Some(commitments),
                items: Some(items),
                history: Some(history),
                liquidations: Some(liquidations),
                liquidation_impacts: Some(liq_impacts),
                ..DayTables::default()
            },
        )
        .await;

        assert_eq!(payload.extraction_date, "2025-01-16");
        assert_eq!(payload.units.len(), 2);
        // Sorted by unit code.
        assert_eq!(payload.units[0].unit_code, "158148");
        assert_eq!(payload.units[1].unit_code, "158454");

        let ifs = &payload.units[1];
        assert_eq!(ifs.unit_name, "IFS");
        assert_eq!(ifs.commitments.len(), 1);
        let e1 = &ifs.commitments[0];
        assert_eq!(e1.items.len(), 2);
        // Item order follows the source table, history joins on
        // (commitment, sequential).
        assert_eq!(e1.items[0].description, "first");
        assert_eq!(e1.items[0].history.len(), 1);
        assert_eq!(e1.items[0].history[0].operation_type, "INCLUSÃO");
        assert_eq!(e1.items[1].history[0].operation_type, "REFORÇO");

        assert_eq!(ifs.liquidations.len(), 1);
        assert_eq!(ifs.liquidations[0].impacted_commitments.len(), 1);
        assert_eq!(
            ifs.liquidations[0].impacted_commitments[0].liquidated_value,
            "10,00"
        );
    }

    #[tokio::test]
    async fn unit_name_late_binds_to_first_non_empty_observation() {
        let liquidations = table(
            &["Código Liquidação", "Código Unidade Gestora", "Unidade Gestora"],
            &[&["L1", "158454", ""], &["L2", "158454", "IFS"]],
        );
        let payload = assemble(
            date(),
            DayTables {
                liquidations: Some(liquidations),
                ..DayTables::default()
            },
        )
        .await;
        assert_eq!(payload.units.len(), 1);
        assert_eq!(payload.units[0].unit_name, "IFS");
        assert_eq!(payload.units[0].liquidations.len(), 2);
    }

    #[tokio::test]
    async fn empty_tables_produce_an_empty_payload() {
        let payload = assemble(date(), DayTables::default()).await;
        assert!(payload.is_empty());
        assert_eq!(payload.row_counts(), (0, 0, 0));
    }
}
