//! Identifiers and calendar helpers shared by ledger entities.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Date layout used by persisted transaction records (`dd/mm/yyyy`).
pub const RECORD_DATE_FORMAT: &str = "%d/%m/%Y";
/// ISO layout accepted as a fallback when reading records.
pub const ISO_DATE_FORMAT: &str = "%Y-%m-%d";

const PROVISIONAL_PREFIX: &str = "local-";

/// Stable identifier issued by the authentication collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for UserId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Opaque transaction identifier.
///
/// Identifiers are normally assigned by the persistence layer. Entries that
/// were prepended optimistically carry a provisional identifier until the
/// remote write confirms them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(String);

impl TransactionId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Creates a locally unique identifier for an unconfirmed entry.
    pub fn provisional() -> Self {
        Self(format!("{}{}", PROVISIONAL_PREFIX, Uuid::new_v4()))
    }

    pub fn is_provisional(&self) -> bool {
        self.0.starts_with(PROVISIONAL_PREFIX)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TransactionId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for TransactionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Parses a record date in either `dd/mm/yyyy` or ISO `yyyy-mm-dd` form.
pub fn parse_record_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    NaiveDate::parse_from_str(trimmed, RECORD_DATE_FORMAT)
        .or_else(|_| NaiveDate::parse_from_str(trimmed, ISO_DATE_FORMAT))
        .ok()
}

/// Formats a date the way transaction records store it.
pub fn format_record_date(date: NaiveDate) -> String {
    date.format(RECORD_DATE_FORMAT).to_string()
}

/// Serde adapter for [`NaiveDate`] fields stored as `dd/mm/yyyy`.
pub mod record_date {
    use chrono::NaiveDate;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::format_record_date(*date))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        super::parse_record_date(&raw)
            .ok_or_else(|| D::Error::custom(format!("unrecognized date `{raw}`")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_dates_accept_both_layouts() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        assert_eq!(parse_record_date("10/01/2024"), Some(expected));
        assert_eq!(parse_record_date("2024-01-10"), Some(expected));
        assert_eq!(parse_record_date(" 10/01/2024 "), Some(expected));
        assert_eq!(parse_record_date("01-10-2024"), None);
        assert_eq!(format_record_date(expected), "10/01/2024");
    }

    #[test]
    fn provisional_ids_are_flagged() {
        let id = TransactionId::provisional();
        assert!(id.is_provisional());
        assert!(!TransactionId::from("abc123").is_provisional());
        assert_ne!(id, TransactionId::provisional());
    }
}
