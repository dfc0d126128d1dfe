//! Row selection by code set and projection to the canonical column set.

use std::collections::HashSet;

use thiserror::Error;
use verba_core::DataKind;

use crate::table::{Table, TabularError};

/// The synthesized dot-joined nature column.
pub const COMPLETE_EXPENSE_NATURE: &str = "Natureza de Despesa Completa";

/// The four component code columns, join order = hierarchy order.
const EXPENSE_NATURE_COMPONENTS: [&str; 4] = [
    "Código Categoria de Despesa",
    "Código Grupo de Despesa",
    "Código Modalidade de Aplicação",
    "Código Elemento de Despesa",
];

#[derive(Debug, Error)]
pub enum SelectError {
    #[error("kind {0:?} has no canonical projection")]
    UnsupportedKind(DataKind),
    #[error(transparent)]
    Tabular(#[from] TabularError),
}

/// Canonical column set per ingested kind. Names are the exact upstream
/// headers; projection output column order is fixed per kind.
pub fn canonical_columns(kind: DataKind) -> Option<&'static [&'static str]> {
    match kind {
        DataKind::Commitment => Some(&[
            "Id Empenho",
            "Código Empenho",
            "Código Empenho Resumido",
            "Data Emissão",
            "Tipo Empenho",
            "Código Tipo Documento",
            "Tipo Documento",
            "Código Unidade Gestora",
            "Unidade Gestora",
            "Código Gestão",
            "Gestão",
            "Processo",
            "Favorecido",
            "Código Favorecido",
            "Código Categoria de Despesa",
            "Categoria de Despesa",
            "Código Grupo de Despesa",
            "Grupo de Despesa",
            "Código Modalidade de Aplicação",
            "Modalidade de Aplicação",
            "Código Elemento de Despesa",
            "Elemento de Despesa",
            "Plano Orçamentário",
            "Valor Original do Empenho",
            "Valor do Empenho Convertido pra R$",
            "Valor Utilizado na Conversão",
        ]),
        DataKind::CommitmentItem => Some(&[
            "Id Empenho",
            "Código Empenho",
            "Sequencial",
            "Código Categoria de Despesa",
            "Categoria de Despesa",
            "Código Grupo de Despesa",
            "Grupo de Despesa",
            "Código Modalidade de Aplicação",
            "Modalidade de Aplicação",
            "Código Elemento de Despesa",
            "Elemento de Despesa",
            "Descrição",
            "Quantidade",
            "Valor Unitário",
            "Valor Total",
            "Valor Atual",
        ]),
        DataKind::CommitmentItemHistory => Some(&[
            "Id Empenho",
            "Código Empenho",
            "Sequencial",
            "Tipo Operação",
            "Data Operação",
            "Quantidade Item",
            "Valor Unitário Item",
            "Valor Total Item",
        ]),
        DataKind::Liquidation => Some(&[
            "Código Liquidação",
            "Código Liquidação Resumido",
            "Data Emissão",
            "Código Tipo Documento",
            "Tipo Documento",
            "Código Unidade Gestora",
            "Unidade Gestora",
            "Código Gestão",
            "Gestão",
            "Código Favorecido",
            "Favorecido",
            "Observação",
        ]),
        DataKind::LiquidationImpactedCommitments => Some(&[
            "Código Liquidação",
            "Código Empenho",
            "Código Natureza Despesa Completa",
            "Subitem",
            "Valor Liquidado (R$)",
            "Valor Restos a Pagar Inscritos (R$)",
            "Valor Restos a Pagar Cancelado (R$)",
            "Valor Restos a Pagar Liquidados (R$)",
        ]),
        DataKind::Payment => Some(&[
            "Código Pagamento",
            "Código Pagamento Resumido",
            "Data Emissão",
            "Código Tipo Documento",
            "Tipo Documento",
            "Tipo OB",
            "Extraorçamentário",
            "Processo",
            "Código Unidade Gestora",
            "Unidade Gestora",
            "Código Gestão",
            "Gestão",
            "Código Favorecido",
            "Favorecido",
            "Valor Original do Pagamento",
            "Valor do Pagamento Convertido pra R$",
            "Valor Utilizado na Conversão",
        ]),
        DataKind::PaymentImpactedCommitments => Some(&[
            "Código Pagamento",
            "Código Empenho",
            "Código Natureza Despesa Completa",
            "Subitem",
            "Valor Pago (R$)",
            "Valor Restos a Pagar Inscritos (R$)",
            "Valor Restos a Pagar Cancelados (R$)",
            "Valor Restos a Pagar Pagos (R$)",
        ]),
        DataKind::PaymentBankList
        | DataKind::PaymentInvoiceList
        | DataKind::PaymentCourtOrderList => None,
    }
}

/// Rows whose `column` value is a member of `codes`; `None` when nothing
/// matches. Source row order is preserved.
pub fn filter_in(table: &Table, column: &str, codes: &HashSet<String>) -> Option<Table> {
    let matched = table.retain_rows(|row| codes.contains(table.value(row, column)));
    if matched.is_empty() {
        None
    } else {
        Some(matched)
    }
}

fn has_all_nature_components(table: &Table) -> bool {
    EXPENSE_NATURE_COMPONENTS
        .iter()
        .all(|c| table.has_column(c))
}

/// Projects `table` to the canonical column set of `kind`. When the input
/// carries all four expense-nature component code columns, the dot-joined
/// `Natureza de Despesa Completa` column is synthesized and appended after
/// the canonical set, leading zeros intact.
pub fn project(table: &Table, kind: DataKind) -> Result<Table, SelectError> {
    let columns = canonical_columns(kind).ok_or(SelectError::UnsupportedKind(kind))?;

    let synthesized = if has_all_nature_components(table) {
        let joined = (0..table.row_count())
            .map(|row| {
                EXPENSE_NATURE_COMPONENTS
                    .iter()
                    .map(|c| table.value(row, c))
                    .collect::<Vec<_>>()
                    .join(".")
            })
            .collect::<Vec<_>>();
        Some(joined)
    } else {
        None
    };

    let projected = table.select(columns);
    match synthesized {
        Some(values) => Ok(projected.with_column(COMPLETE_EXPENSE_NATURE, values)?),
        None => Ok(projected),
    }
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

    #[test]
    fn filter_in_keeps_matching_rows_in_order() {
        let t = table(
            &["Código Unidade Gestora", "Valor"],
            &[
                &["158454", "10"],
                &["999999", "20"],
                &["158148", "30"],
                &["158454", "40"],
            ],
        );
        let codes: HashSet<String> = ["158454", "158148"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let matched = filter_in(&t, "Código Unidade Gestora", &codes).unwrap();
        assert_eq!(matched.row_count(), 3);
        assert_eq!(matched.value(0, "Valor"), "10");
        assert_eq!(matched.value(1, "Valor"), "30");
        assert_eq!(matched.value(2, "Valor"), "40");
    }

    #[test]
    fn filter_in_returns_none_without_matches() {
        let t = table(&["Código Unidade Gestora"], &[&["1"]]);
        let codes: HashSet<String> = ["2".to_string()].into_iter().collect();
        assert!(filter_in(&t, "Código Unidade Gestora", &codes).is_none());
    }

    #[test]
    fn projection_is_a_function_of_kind_only() {
        let a = table(
            &["Código Liquidação", "Extra", "Favorecido"],
            &[&["L1", "x", "F"]],
        );
        let b = table(&["Favorecido", "Código Liquidação"], &[&["F", "L2"]]);
        let pa = project(&a, DataKind::Liquidation).unwrap();
        let pb = project(&b, DataKind::Liquidation).unwrap();
        assert_eq!(pa.columns(), pb.columns());
        assert!(!pa.has_column("Extra"));
    }

    #[test]
    fn complete_expense_nature_is_dot_joined_with_leading_zeros() {
        let t = table(
            &[
                "Id Empenho",
                "Código Empenho",
                "Código Categoria de Despesa",
                "Código Grupo de Despesa",
                "Código Modalidade de Aplicação",
                "Código Elemento de Despesa",
            ],
            &[&["7", "E1", "3", "3", "90", "039"]],
        );
        let p = project(&t, DataKind::CommitmentItem).unwrap();
        assert_eq!(p.columns().last().unwrap(), COMPLETE_EXPENSE_NATURE);
        assert_eq!(p.value(0, COMPLETE_EXPENSE_NATURE), "3.3.90.039");
    }

    #[test]
    fn nature_column_is_absent_when_components_are_incomplete() {
        let t = table(
            &["Código Empenho", "Código Categoria de Despesa"],
            &[&["E1", "3"]],
        );
        let p = project(&t, DataKind::CommitmentItem).unwrap();
        assert!(!p.has_column(COMPLETE_EXPENSE_NATURE));
    }

    #[test]
    fn unlisted_kinds_are_rejected() {
        let t = table(&["A"], &[&["1"]]);
        assert!(matches!(
            project(&t, DataKind::PaymentBankList),
            Err(SelectError::UnsupportedKind(_))
        ));
    }
}
