//! Validation helpers for user-entered amounts.

use std::str::FromStr;

use rust_decimal::{prelude::FromPrimitive, Decimal};

use crate::CoreError;

/// Parses a user-entered amount. Accepts `.` or `,` as decimal separator.
pub fn parse_amount(input: &str) -> Result<Decimal, CoreError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation("amount is required".into()));
    }
    let normalized = trimmed.replace(',', ".");
    let value = Decimal::from_str(&normalized)
        .map_err(|_| CoreError::Validation(format!("`{trimmed}` is not a valid amount")))?;
    ensure_positive(value)
}

/// Converts a floating point amount, rejecting NaN and infinities.
pub fn amount_from_f64(value: f64) -> Result<Decimal, CoreError> {
    if !value.is_finite() {
        return Err(CoreError::Validation(format!(
            "amount must be finite, got {value}"
        )));
    }
    let decimal = Decimal::from_f64(value)
        .ok_or_else(|| CoreError::Validation(format!("amount {value} is out of range")))?;
    ensure_positive(decimal)
}

/// Rejects zero and negative amounts.
pub fn ensure_positive(value: Decimal) -> Result<Decimal, CoreError> {
    if value <= Decimal::ZERO {
        return Err(CoreError::Validation(format!(
            "amount must be positive, got {value}"
        )));
    }
    Ok(value)
}
