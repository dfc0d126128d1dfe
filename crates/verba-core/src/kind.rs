//! The member-file kinds of a daily expense bundle.

/// One CSV member of the daily `despesas_YYYYMMDD.zip` bundle.
///
/// The portal ships ten files per day; three of them (bank lists, invoice
/// lists, court-order lists) carry no data this system warehouses and are
/// never extracted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataKind {
    Commitment,
    CommitmentItem,
    CommitmentItemHistory,
    Liquidation,
    LiquidationImpactedCommitments,
    Payment,
    PaymentImpactedCommitments,
    PaymentBankList,
    PaymentInvoiceList,
    PaymentCourtOrderList,
}

impl DataKind {
    pub const ALL: [DataKind; 10] = [
        DataKind::Commitment,
        DataKind::CommitmentItem,
        DataKind::CommitmentItemHistory,
        DataKind::Liquidation,
        DataKind::LiquidationImpactedCommitments,
        DataKind::Payment,
        DataKind::PaymentImpactedCommitments,
        DataKind::PaymentBankList,
        DataKind::PaymentInvoiceList,
        DataKind::PaymentCourtOrderList,
    ];

    /// The three kinds filtered in phase 1 by unit/management code.
    pub const TOP_LEVEL: [DataKind; 3] = [
        DataKind::Commitment,
        DataKind::Liquidation,
        DataKind::Payment,
    ];

    /// The kinds filtered in phase 2 by harvested commitment codes.
    pub const DETAIL: [DataKind; 4] = [
        DataKind::CommitmentItem,
        DataKind::CommitmentItemHistory,
        DataKind::LiquidationImpactedCommitments,
        DataKind::PaymentImpactedCommitments,
    ];

    /// Archive member suffix, e.g. `20250116_Despesas_Empenho.csv` for the
    /// commitments file of 2025-01-16.
    pub fn file_suffix(self) -> &'static str {
        match self {
            DataKind::Commitment => "_Despesas_Empenho.csv",
            DataKind::CommitmentItem => "_Despesas_ItemEmpenho.csv",
            DataKind::CommitmentItemHistory => "_Despesas_ItemEmpenhoHistorico.csv",
            DataKind::Liquidation => "_Despesas_Liquidacao.csv",
            DataKind::LiquidationImpactedCommitments => {
                "_Despesas_Liquidacao_EmpenhosImpactados.csv"
            }
            DataKind::Payment => "_Despesas_Pagamento.csv",
            DataKind::PaymentImpactedCommitments => "_Despesas_Pagamento_EmpenhosImpactados.csv",
            DataKind::PaymentBankList => "_Despesas_Pagamento_ListaBancos.csv",
            DataKind::PaymentInvoiceList => "_Despesas_Pagamento_ListaFaturas.csv",
            DataKind::PaymentCourtOrderList => "_Despesas_Pagamento_ListaPrecatorios.csv",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            DataKind::Commitment => "Despesas Empenho",
            DataKind::CommitmentItem => "Despesas Item Empenho",
            DataKind::CommitmentItemHistory => "Despesas Item Empenho Histórico",
            DataKind::Liquidation => "Despesas Liquidação",
            DataKind::LiquidationImpactedCommitments => "Despesas Liquidação Empenhos Impactados",
            DataKind::Payment => "Despesas Pagamento",
            DataKind::PaymentImpactedCommitments => "Despesas Pagamento Empenhos Impactados",
            DataKind::PaymentBankList => "Despesas Pagamento Lista Bancos",
            DataKind::PaymentInvoiceList => "Despesas Pagamento Lista Faturas",
            DataKind::PaymentCourtOrderList => "Despesas Pagamento Lista Precatórios",
        }
    }

    /// Whether this member is extracted and ingested at all.
    pub fn is_ingested(self) -> bool {
        !matches!(
            self,
            DataKind::PaymentBankList
                | DataKind::PaymentInvoiceList
                | DataKind::PaymentCourtOrderList
        )
    }

    /// The document-code column of the three top-level kinds, used to
    /// harvest codes for phase-2 filtering.
    pub fn main_code_column(self) -> Option<&'static str> {
        match self {
            DataKind::Commitment => Some("Código Empenho"),
            DataKind::Liquidation => Some("Código Liquidação"),
            DataKind::Payment => Some("Código Pagamento"),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blacklist_covers_exactly_the_three_list_files() {
        let skipped: Vec<_> = DataKind::ALL.iter().filter(|k| !k.is_ingested()).collect();
        assert_eq!(
            skipped,
            vec![
                &DataKind::PaymentBankList,
                &DataKind::PaymentInvoiceList,
                &DataKind::PaymentCourtOrderList,
            ]
        );
    }

    #[test]
    fn suffixes_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for kind in DataKind::ALL {
            assert!(seen.insert(kind.file_suffix()), "{:?}", kind);
        }
    }

    #[test]
    fn only_top_level_kinds_have_a_main_code_column() {
        for kind in DataKind::ALL {
            assert_eq!(
                kind.main_code_column().is_some(),
                DataKind::TOP_LEVEL.contains(&kind),
            );
        }
    }
}
