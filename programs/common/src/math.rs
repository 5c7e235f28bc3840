//! Basis-point constants and checked helpers
//!
//! Settlement amounts must never wrap or saturate, so every helper here
//! returns an `AmmError` instead.

use crate::error::AmmError;

/// 10,000 bps = 100%
pub const HUNDRED_PCT_BPS: u64 = 10_000;

/// 100 = 100% for percentage-denominated splits
pub const HUNDRED_PCT: u64 = 100;

/// Largest delta accepted for Exponential curves (must stay below 100%)
pub const MAX_DELTA_BPS: u64 = 9_999;

/// Largest mm fee a Trade pool may charge
pub const MAX_MM_FEE_BPS: u16 = 9_999;

/// Protocol fee charged on every taker trade
pub const TAKER_FEE_BPS: u16 = 200;

/// Share of the taker fee routed to brokers
pub const BROKER_FEE_PCT: u8 = 50;

/// Share of the broker fee routed to the maker broker
pub const MAKER_BROKER_PCT: u8 = 80;

/// Metaplex creator limit
pub const MAX_CREATORS: usize = 5;

/// Hard cap on curve iterations when estimating bids
pub const MAX_BID_ITERATIONS: u32 = 1_000;

/// `amount * bps / 10_000`, rounded down
#[inline]
pub fn bps_of(amount: u64, bps: u64) -> Result<u64, AmmError> {
    mul_div(amount, bps, HUNDRED_PCT_BPS)
}

/// `amount * pct / 100`, rounded down
#[inline]
pub fn pct_of(amount: u64, pct: u64) -> Result<u64, AmmError> {
    mul_div(amount, pct, HUNDRED_PCT)
}

/// `a * b / denom` through u128, rounded down
#[inline]
pub fn mul_div(a: u64, b: u64, denom: u64) -> Result<u64, AmmError> {
    if denom == 0 {
        return Err(AmmError::ArithmeticOverflow);
    }
    let wide = (a as u128) * (b as u128) / (denom as u128);
    u64::try_from(wide).map_err(|_| AmmError::ArithmeticOverflow)
}

#[inline]
pub fn checked_add(a: u64, b: u64) -> Result<u64, AmmError> {
    a.checked_add(b).ok_or(AmmError::ArithmeticOverflow)
}

#[inline]
pub fn checked_sub(a: u64, b: u64) -> Result<u64, AmmError> {
    a.checked_sub(b).ok_or(AmmError::ArithmeticUnderflow)
}

#[inline]
pub fn checked_mul(a: u64, b: u64) -> Result<u64, AmmError> {
    a.checked_mul(b).ok_or(AmmError::ArithmeticOverflow)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bps_of() {
        assert_eq!(bps_of(1_000_000_000, 200).unwrap(), 20_000_000);
        assert_eq!(bps_of(1_000_000_000, 458).unwrap(), 45_800_000);
        assert_eq!(bps_of(9_999, 1).unwrap(), 0);
        assert_eq!(bps_of(u64::MAX, HUNDRED_PCT_BPS).unwrap(), u64::MAX);
    }

    #[test]
    fn test_pct_of() {
        assert_eq!(pct_of(20_000_000, 50).unwrap(), 10_000_000);
        assert_eq!(pct_of(333, 80).unwrap(), 266);
    }

    #[test]
    fn test_mul_div_overflow() {
        assert_eq!(mul_div(u64::MAX, 2, 1), Err(AmmError::ArithmeticOverflow));
        assert_eq!(mul_div(1, 1, 0), Err(AmmError::ArithmeticOverflow));
    }

    #[test]
    fn test_checked_ops() {
        assert_eq!(checked_add(u64::MAX, 1), Err(AmmError::ArithmeticOverflow));
        assert_eq!(checked_sub(0, 1), Err(AmmError::ArithmeticUnderflow));
        assert_eq!(checked_mul(u64::MAX, 2), Err(AmmError::ArithmeticOverflow));
        assert_eq!(checked_sub(10, 3).unwrap(), 7);
    }
}
