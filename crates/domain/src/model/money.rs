//! Conversions between user-facing decimal amounts and the integer cents
//! persisted in the database.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use thiserror::Error;

/// Number of fractional digits kept for every monetary amount.
pub const MONEY_SCALE: u32 = 2;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AmountError {
    #[error("amount `{0}` does not fit into the supported range")]
    OutOfRange(Decimal),
    #[error("line total of {quantity} x {price_cents} cents exceeds the supported range")]
    LineTotalOverflow { price_cents: i64, quantity: i32 },
    #[error("aggregate of {0} cents exceeds the supported range")]
    SumOutOfRange(i128),
}

/// Rounds to two decimal places (half away from zero) and returns cents.
pub fn to_cents(amount: Decimal) -> Result<i64, AmountError> {
    let rounded = amount.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero);
    rounded
        .checked_mul(Decimal::ONE_HUNDRED)
        .and_then(|cents| cents.to_i64())
        .ok_or(AmountError::OutOfRange(amount))
}

pub fn from_cents(cents: i64) -> Decimal {
    Decimal::new(cents, MONEY_SCALE)
}

/// `price_cents * quantity`, rejected when it no longer fits a cents column.
pub fn line_total_cents(price_cents: i64, quantity: i32) -> Result<i64, AmountError> {
    price_cents
        .checked_mul(i64::from(quantity))
        .ok_or(AmountError::LineTotalOverflow {
            price_cents,
            quantity,
        })
}

/// Converts an aggregate that may exceed `i64` cents back into a decimal.
pub fn from_wide_cents(cents: i128) -> Result<Decimal, AmountError> {
    Decimal::try_from_i128_with_scale(cents, MONEY_SCALE)
        .map_err(|_| AmountError::SumOutOfRange(cents))
}
