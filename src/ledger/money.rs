use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use super::error::LedgerError;

/* Balances and amounts are persisted as integer cents so that SQL
arithmetic on them is exact. Decimal is the boundary type. */

/// Convert a decimal currency amount into cents.
///
/// Rejects amounts that are zero or negative, carry sub-cent precision,
/// or do not fit an i64.
pub fn to_cents(amount: Decimal) -> Result<i64, LedgerError> {
    if amount <= Decimal::ZERO {
        return Err(LedgerError::InvalidAmount);
    }
    let scaled = amount
        .checked_mul(Decimal::ONE_HUNDRED)
        .ok_or(LedgerError::InvalidAmount)?;
    if !scaled.fract().is_zero() {
        return Err(LedgerError::InvalidAmount);
    }
    scaled.to_i64().ok_or(LedgerError::InvalidAmount)
}

/// Convert stored cents back to a two-decimal amount.
pub fn from_cents(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn whole_cent_amounts_convert() {
        assert_eq!(to_cents(dec!(50.00)).unwrap(), 5000);
        assert_eq!(to_cents(dec!(0.01)).unwrap(), 1);
        assert_eq!(to_cents(dec!(1234.5)).unwrap(), 123450);
    }

    #[test]
    fn zero_and_negative_are_invalid() {
        assert!(matches!(to_cents(dec!(0)), Err(LedgerError::InvalidAmount)));
        assert!(matches!(
            to_cents(dec!(-3.50)),
            Err(LedgerError::InvalidAmount)
        ));
    }

    #[test]
    fn sub_cent_precision_is_invalid() {
        assert!(matches!(
            to_cents(dec!(0.005)),
            Err(LedgerError::InvalidAmount)
        ));
        assert!(matches!(
            to_cents(dec!(19.999)),
            Err(LedgerError::InvalidAmount)
        ));
    }

    #[test]
    fn cents_round_trip() {
        assert_eq!(from_cents(15000), dec!(150.00));
        assert_eq!(to_cents(from_cents(4321)).unwrap(), 4321);
    }
}
