//! Recent-activity summaries built on top of the projector.

use rust_decimal::Decimal;
use saldo_domain::Transaction;

use crate::{format::MoneyFormat, projector::most_recent, project, Projection};

const APP_NAME: &str = "Adominus Wealth";
const INCOME_LABEL: &str = "Entradas";
const EXPENSE_LABEL: &str = "Saídas";

/// Totals for the most recent slice of a ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct RecentSummary {
    pub window: usize,
    pub transactions: Vec<Transaction>,
    pub projection: Projection,
}

impl RecentSummary {
    pub fn income_label(&self, format: &MoneyFormat) -> String {
        format!("{INCOME_LABEL}: {}", format.format(self.projection.total_income))
    }

    pub fn expense_label(&self, format: &MoneyFormat) -> String {
        format!("{EXPENSE_LABEL}: {}", format.format(self.projection.total_expense))
    }

    /// Plain-text summary suitable for sharing.
    pub fn share_text(&self, format: &MoneyFormat) -> String {
        format!(
            "Resumo financeiro das últimas {} transações:\n{}\n{}",
            self.window,
            self.income_label(format),
            self.expense_label(format)
        )
    }
}

pub struct ReportService;

impl ReportService {
    /// Plain-text message sharing the current balance.
    pub fn balance_share_text(balance: Decimal, format: &MoneyFormat) -> String {
        format!("Meu saldo atual no {APP_NAME} é {}", format.format(balance))
    }

    /// Summarizes the `window` most recent transactions by date.
    pub fn recent_summary(transactions: &[Transaction], window: usize) -> RecentSummary {
        let recent: Vec<Transaction> = most_recent(transactions, window)
            .into_iter()
            .cloned()
            .collect();
        let projection = project(&recent);
        RecentSummary {
            window,
            transactions: recent,
            projection,
        }
    }
}
