//! Balance projection: a pure fold of transactions into income, expense and net totals.

use rust_decimal::Decimal;
use serde::Serialize;

use saldo_domain::{Transaction, TransactionKind};

/// Number of transactions covered by the recent-activity summary.
pub const DEFAULT_RECENT_WINDOW: usize = 10;

/// Aggregate totals derived from a ledger snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Projection {
    pub net: Decimal,
    pub total_income: Decimal,
    pub total_expense: Decimal,
}

impl Projection {
    pub const ZERO: Projection = Projection {
        net: Decimal::ZERO,
        total_income: Decimal::ZERO,
        total_expense: Decimal::ZERO,
    };
}

/// Folds any sequence of transactions. Empty input yields [`Projection::ZERO`].
///
/// Totals saturate at the `Decimal` range; use [`try_project`] to detect
/// overflow instead.
pub fn project<'a, I>(transactions: I) -> Projection
where
    I: IntoIterator<Item = &'a Transaction>,
{
    let (total_income, total_expense) = transactions.into_iter().fold(
        (Decimal::ZERO, Decimal::ZERO),
        |(income, expense), txn| match txn.kind {
            TransactionKind::Income => (income.saturating_add(txn.amount), expense),
            TransactionKind::Expense => (income, expense.saturating_add(txn.amount)),
        },
    );
    Projection {
        net: total_income.saturating_sub(total_expense),
        total_income,
        total_expense,
    }
}

/// Like [`project`], but returns `None` when any total leaves the `Decimal` range.
pub fn try_project<'a, I>(transactions: I) -> Option<Projection>
where
    I: IntoIterator<Item = &'a Transaction>,
{
    let mut total_income = Decimal::ZERO;
    let mut total_expense = Decimal::ZERO;
    for txn in transactions {
        match txn.kind {
            TransactionKind::Income => total_income = total_income.checked_add(txn.amount)?,
            TransactionKind::Expense => total_expense = total_expense.checked_add(txn.amount)?,
        }
    }
    Some(Projection {
        net: total_income.checked_sub(total_expense)?,
        total_income,
        total_expense,
    })
}

/// Returns the `limit` most recent transactions in display order.
pub fn most_recent(transactions: &[Transaction], limit: usize) -> Vec<&Transaction> {
    let mut sorted: Vec<&Transaction> = transactions.iter().collect();
    sorted.sort_by(|a, b| Transaction::display_order(a, b));
    sorted.truncate(limit);
    sorted
}

/// Projection restricted to the `limit` most recent transactions.
pub fn project_recent(transactions: &[Transaction], limit: usize) -> Projection {
    project(most_recent(transactions, limit))
}
