//! Mapping between ledger transactions and their stored document form.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use saldo_domain::{record_date, Transaction, TransactionKind, UserId};

use crate::{CoreError, Document, Fields, RemoteError};

/// Field holding the owner of a transaction document.
pub const OWNER_FIELD: &str = "userId";
/// Owner field written by older clients.
pub const LEGACY_OWNER_FIELD: &str = "uid";

/// Stored shape of a transaction document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub amount: Decimal,
    #[serde(with = "record_date")]
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing)]
    pub uid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl From<&Transaction> for TransactionRecord {
    fn from(value: &Transaction) -> Self {
        Self {
            kind: value.kind,
            amount: value.amount,
            date: value.date,
            user_id: Some(value.owner.as_str().to_string()),
            uid: None,
            created_at: Some(value.created_at),
        }
    }
}

impl TransactionRecord {
    pub fn into_fields(self) -> Result<Fields, CoreError> {
        match serde_json::to_value(self)? {
            Value::Object(fields) => Ok(fields),
            other => Err(RemoteError::Malformed(format!(
                "transaction record serialized to {other}"
            ))
            .into()),
        }
    }

    pub fn from_fields(fields: &Fields) -> Result<Self, CoreError> {
        Ok(serde_json::from_value(Value::Object(fields.clone()))?)
    }

    pub fn owner(&self) -> Option<UserId> {
        self.user_id
            .as_deref()
            .or(self.uid.as_deref())
            .map(UserId::from)
    }

    /// Builds the domain transaction for a stored document.
    pub fn into_transaction(self, id: &str) -> Option<Transaction> {
        let owner = self.owner()?;
        Some(Transaction::new(
            id,
            self.kind,
            self.amount,
            self.date,
            owner,
            self.created_at.unwrap_or_default(),
        ))
    }
}

/// Decodes a document belonging to `owner`.
///
/// Returns `Ok(None)` for documents owned by someone else (or by no one).
/// Stored amounts are magnitudes; zero or negative values are malformed.
pub fn decode_transaction(
    document: &Document,
    owner: &UserId,
) -> Result<Option<Transaction>, CoreError> {
    let record = TransactionRecord::from_fields(&document.fields)?;
    if record.owner().as_ref() != Some(owner) {
        return Ok(None);
    }
    if record.amount <= Decimal::ZERO {
        return Err(RemoteError::Malformed(format!(
            "transaction `{}` has non-positive amount {}",
            document.id, record.amount
        ))
        .into());
    }
    Ok(record.into_transaction(&document.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn sample() -> Transaction {
        Transaction::new(
            "doc-1",
            TransactionKind::Expense,
            dec!(30.50),
            NaiveDate::from_ymd_opt(2024, 1, 9).unwrap(),
            UserId::from("alice"),
            Utc.with_ymd_and_hms(2024, 1, 9, 8, 30, 0).unwrap(),
        )
    }

    #[test]
    fn record_uses_stored_field_names() {
        let fields = TransactionRecord::from(&sample()).into_fields().unwrap();
        assert_eq!(fields.get("type"), Some(&json!("expense")));
        assert_eq!(fields.get("amount"), Some(&json!("30.50")));
        assert_eq!(fields.get("date"), Some(&json!("09/01/2024")));
        assert_eq!(fields.get(OWNER_FIELD), Some(&json!("alice")));
        assert!(fields.contains_key("createdAt"));
    }

    #[test]
    fn legacy_documents_decode() {
        let fields = json!({
            "type": "Entrada",
            "amount": 50,
            "date": "10/01/2024",
            "uid": "alice",
        });
        let Value::Object(fields) = fields else {
            unreachable!()
        };
        let document = Document::new("legacy", fields);
        let decoded = decode_transaction(&document, &UserId::from("alice"))
            .unwrap()
            .expect("owned document");
        assert_eq!(decoded.kind, TransactionKind::Income);
        assert_eq!(decoded.amount, dec!(50));
        assert_eq!(decoded.id.as_str(), "legacy");
    }

    #[test]
    fn documents_carrying_both_owner_fields_decode() {
        let mut fields = TransactionRecord::from(&sample()).into_fields().unwrap();
        fields.insert(LEGACY_OWNER_FIELD.into(), json!("alice"));
        let document = Document::new("doc-1", fields);
        let decoded = decode_transaction(&document, &UserId::from("alice")).unwrap();
        assert_eq!(decoded.map(|txn| txn.amount), Some(dec!(30.50)));
    }

    #[test]
    fn non_positive_amounts_are_malformed() {
        for amount in ["-50", "0"] {
            let Value::Object(fields) = json!({
                "type": "expense",
                "amount": amount,
                "date": "10/01/2024",
                "userId": "alice",
            }) else {
                unreachable!()
            };
            let document = Document::new("negative", fields);
            let err = decode_transaction(&document, &UserId::from("alice")).unwrap_err();
            assert!(
                matches!(err, CoreError::Remote(RemoteError::Malformed(_))),
                "amount {amount}"
            );
        }
    }

    #[test]
    fn foreign_documents_are_filtered() {
        let fields = TransactionRecord::from(&sample()).into_fields().unwrap();
        let document = Document::new("doc-1", fields);
        assert!(decode_transaction(&document, &UserId::from("bob"))
            .unwrap()
            .is_none());
    }
}
