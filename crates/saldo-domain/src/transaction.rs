//! Domain models for ledger transactions.

use std::{cmp::Ordering, fmt, str::FromStr};

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{de::Deserializer, Deserialize, Serialize, Serializer};

use crate::common::{TransactionId, UserId};

/// Direction of a transaction. The stored amount is always a magnitude;
/// the sign comes from the kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TransactionKind::Income => "income",
            TransactionKind::Expense => "expense",
        }
    }

    /// Resolves a kind from its stored label, including the legacy
    /// `Entrada`/`Saída` labels.
    pub fn from_label(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "income" | "entrada" => Some(TransactionKind::Income),
            "expense" | "saída" | "saida" => Some(TransactionKind::Expense),
            _ => None,
        }
    }

    /// Applies the sign of this kind to a magnitude.
    pub fn signed(self, amount: Decimal) -> Decimal {
        match self {
            TransactionKind::Income => amount,
            TransactionKind::Expense => -amount,
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TransactionKind::Income => "Income",
            TransactionKind::Expense => "Expense",
        };
        f.write_str(label)
    }
}

impl FromStr for TransactionKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::from_label(value).ok_or_else(|| format!("unknown transaction type `{value}`"))
    }
}

impl Serialize for TransactionKind {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for TransactionKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// A single income or expense entry owned by one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub kind: TransactionKind,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub owner: UserId,
    /// Creation instant; only used to break ordering ties between entries
    /// attributed to the same date.
    #[serde(default)]
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    pub fn new(
        id: impl Into<TransactionId>,
        kind: TransactionKind,
        amount: Decimal,
        date: NaiveDate,
        owner: UserId,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            amount,
            date,
            owner,
            created_at,
        }
    }

    /// Amount with the sign implied by the kind.
    pub fn signed_amount(&self) -> Decimal {
        self.kind.signed(self.amount)
    }

    pub fn is_income(&self) -> bool {
        self.kind == TransactionKind::Income
    }

    /// Display ordering: most recent date first, then most recent write.
    pub fn display_order(a: &Transaction, b: &Transaction) -> Ordering {
        b.date
            .cmp(&a.date)
            .then_with(|| b.created_at.cmp(&a.created_at))
    }
}

/// Sorts transactions in place using [`Transaction::display_order`].
pub fn sort_for_display(transactions: &mut [Transaction]) {
    transactions.sort_by(Transaction::display_order);
}
