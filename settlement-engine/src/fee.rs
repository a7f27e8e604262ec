//! Fee calculator
//!
//! Pure ceiling-rounded basis-point fee. Rounding up means the engine never
//! under-collects; monotonicity in `total` is what makes the partial-mode
//! refund identity hold.

use crate::error::{Error, Result};
use transport_core::Amount;

/// Basis-point denominator (100% = 10_000 bps)
pub const BPS_DENOMINATOR: u128 = 10_000;

/// Quote the service fee for a batch total
///
/// Returns 0 if `total` or `fee_bps` is 0; otherwise the exact integer
/// ceiling of `total * fee_bps / 10_000`. Guarantees, for in-range rates:
/// monotonic non-decreasing in `total`, and `fee <= total`.
pub fn quote_fee(total: Amount, fee_bps: u16) -> Result<Amount> {
    if total == 0 || fee_bps == 0 {
        return Ok(0);
    }
    let scaled = total
        .checked_mul(u128::from(fee_bps))
        .ok_or(Error::Arithmetic)?;
    // Integer ceiling division; scaled + (BPS - 1) cannot overflow unless
    // the checked multiply already did.
    Ok(scaled
        .checked_add(BPS_DENOMINATOR - 1)
        .ok_or(Error::Arithmetic)?
        / BPS_DENOMINATOR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_cases() {
        assert_eq!(quote_fee(0, 10).unwrap(), 0);
        assert_eq!(quote_fee(1_000_000, 0).unwrap(), 0);
        assert_eq!(quote_fee(0, 0).unwrap(), 0);
    }

    #[test]
    fn test_exact_multiples() {
        // 1% of 10_000 = 100
        assert_eq!(quote_fee(10_000, 100).unwrap(), 100);
        // 0.10% of 4.00 (400 smallest units) = 0.4, rounds up to 1
        assert_eq!(quote_fee(400, 10).unwrap(), 1);
    }

    #[test]
    fn test_ceiling_rounds_up() {
        // 0.01% of 100 = 0.01 -> 1, never 0
        assert_eq!(quote_fee(100, 1).unwrap(), 1);
        // 1 bps of 10_001 = 1.0001 -> 2
        assert_eq!(quote_fee(10_001, 1).unwrap(), 2);
    }

    #[test]
    fn test_fee_never_exceeds_total() {
        for total in [1u128, 2, 99, 10_000, 123_456_789] {
            let fee = quote_fee(total, 10_000).unwrap();
            assert!(fee <= total);
        }
    }

    #[test]
    fn test_overflow_is_arithmetic_error() {
        let err = quote_fee(Amount::MAX, 2).unwrap_err();
        assert!(matches!(err, Error::Arithmetic));
    }
}
