//! Unvalidated transaction input as typed by a user.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use saldo_domain::{parse_record_date, TransactionKind};

use crate::{amount::parse_amount, CoreError};

/// Transaction fields as entered, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionDraft {
    pub kind: TransactionKind,
    pub amount: String,
    /// `dd/mm/yyyy` or ISO date; blank means today.
    pub date: Option<String>,
}

/// Draft that passed validation, ready for [`crate::LedgerStore::add`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidDraft {
    pub kind: TransactionKind,
    pub amount: Decimal,
    pub date: Option<NaiveDate>,
}

impl TransactionDraft {
    pub fn new(kind: TransactionKind, amount: impl Into<String>) -> Self {
        Self {
            kind,
            amount: amount.into(),
            date: None,
        }
    }

    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }

    pub fn validate(&self) -> Result<ValidDraft, CoreError> {
        let amount = parse_amount(&self.amount)?;
        let date = match self.date.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(parse_record_date(raw).ok_or_else(|| {
                CoreError::Validation(format!("`{raw}` is not a valid date"))
            })?),
        };
        Ok(ValidDraft {
            kind: self.kind,
            amount,
            date,
        })
    }
}
