use thiserror::Error;

use crate::errors::ApiError;

/// Ledger amounts are integer minor units. Accumulating cents keeps the
/// conservation invariants exact instead of drifting with float error.
pub type Cents = i64;

const CENTS_PER_UNIT: f64 = 100.0;

/// Largest accepted single amount, in cents. Keeps any realistic sum of
/// expenses far away from i64 overflow.
const MAX_AMOUNT_CENTS: Cents = 1_000_000_000_000;

#[derive(Debug, Error, PartialEq)]
pub enum MoneyError {
    #[error("amount must be a finite number")]
    NotFinite,
    #[error("amount must be positive")]
    NotPositive,
    #[error("amount is too large")]
    TooLarge,
}

impl From<MoneyError> for ApiError {
    fn from(err: MoneyError) -> Self {
        ApiError::InvalidArgument(err.to_string())
    }
}

/// Converts an API amount in major units to cents, rounding to 2 decimal
/// places. The conversion is the only place floats touch the ledger.
pub fn to_cents(amount: f64) -> Result<Cents, MoneyError> {
    if !amount.is_finite() {
        return Err(MoneyError::NotFinite);
    }
    let cents = (amount * CENTS_PER_UNIT).round();
    if cents > MAX_AMOUNT_CENTS as f64 {
        return Err(MoneyError::TooLarge);
    }
    if cents <= 0.0 {
        return Err(MoneyError::NotPositive);
    }
    Ok(cents as Cents)
}

/// Cents back to major units for responses.
pub fn to_major_units(cents: Cents) -> f64 {
    cents as f64 / CENTS_PER_UNIT
}
