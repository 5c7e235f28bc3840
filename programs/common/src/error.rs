//! Engine error codes

use core::fmt;
use pinocchio::program_error::ProgramError;

/// Errors surfaced by pricing, settlement and pool lifecycle operations.
///
/// Every variant is fatal to the operation that produced it: the engine never
/// commits partial state, so the caller aborts the whole transaction.
#[repr(u32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AmmError {
    /// Resolved price is above the taker's ceiling (buy) or below the floor (sell)
    PriceMismatch = 0,
    /// The bonding curve has no further valid price point
    CurveExhausted = 1,
    /// Pool or shared escrow cannot cover the bid once rent is reserved
    InsufficientLiquidity = 2,
    /// Starting price must be non-zero
    InvalidStartingPrice = 3,
    /// Delta out of range for the curve type
    InvalidDelta = 4,
    /// mm fee missing on a Trade pool, present on another type, or too large
    InvalidMmFee = 5,
    /// Optional royalty percentage above 100
    InvalidRoyaltyPct = 6,
    /// Creator shares do not add up to 100 or exceed the creator limit
    InvalidCreatorShares = 7,
    /// Pool requires a cosigner that did not sign
    WrongCosigner = 8,
    /// Maker broker does not match the one recorded on the pool
    WrongMakerBroker = 9,
    /// NFT failed whitelist verification
    WrongWhitelist = 10,
    /// Signer is not the pool owner
    WrongOwner = 11,
    /// Arithmetic overflow in curve math or fee splitting
    ArithmeticOverflow = 12,
    /// Arithmetic underflow in curve math or fee splitting
    ArithmeticUnderflow = 13,
    /// Operation not supported by this pool type
    WrongPoolType = 14,
    /// Pool has already been closed
    PoolClosed = 15,
    /// Pool holds no NFTs to sell
    PoolEmpty = 16,
    /// Pool still holds NFTs and cannot be closed
    ExistingNfts = 17,
    /// Pool settles against a shared escrow; move funds through the escrow
    PoolOnSharedEscrow = 18,
    /// Pool still holds currency and cannot be attached to a shared escrow
    PoolHasFunds = 19,
    /// Pool is not attached to a shared escrow
    NoSharedEscrow = 20,
    /// Pool would hold more sold NFTs than its configured cap
    MaxTakerSellCountExceeded = 21,
    /// New sell cap is below the number of NFTs already sold into the pool
    MaxTakerSellCountTooSmall = 22,
    /// Withdrawal exceeds the available balance
    InsufficientFunds = 23,
}

impl AmmError {
    /// Numeric error code reported to the host
    pub const fn to_u32(self) -> u32 {
        self as u32
    }

    /// Decode an error code returned by the program
    pub fn from_u32(code: u32) -> Option<Self> {
        let err = match code {
            0 => Self::PriceMismatch,
            1 => Self::CurveExhausted,
            2 => Self::InsufficientLiquidity,
            3 => Self::InvalidStartingPrice,
            4 => Self::InvalidDelta,
            5 => Self::InvalidMmFee,
            6 => Self::InvalidRoyaltyPct,
            7 => Self::InvalidCreatorShares,
            8 => Self::WrongCosigner,
            9 => Self::WrongMakerBroker,
            10 => Self::WrongWhitelist,
            11 => Self::WrongOwner,
            12 => Self::ArithmeticOverflow,
            13 => Self::ArithmeticUnderflow,
            14 => Self::WrongPoolType,
            15 => Self::PoolClosed,
            16 => Self::PoolEmpty,
            17 => Self::ExistingNfts,
            18 => Self::PoolOnSharedEscrow,
            19 => Self::PoolHasFunds,
            20 => Self::NoSharedEscrow,
            21 => Self::MaxTakerSellCountExceeded,
            22 => Self::MaxTakerSellCountTooSmall,
            23 => Self::InsufficientFunds,
            _ => return None,
        };
        Some(err)
    }

    /// True for the config-validation family
    pub const fn is_invalid_config(self) -> bool {
        matches!(
            self,
            Self::InvalidStartingPrice
                | Self::InvalidDelta
                | Self::InvalidMmFee
                | Self::InvalidRoyaltyPct
                | Self::InvalidCreatorShares
        )
    }

    /// True for the authority-check family
    pub const fn is_wrong_authority(self) -> bool {
        matches!(
            self,
            Self::WrongCosigner | Self::WrongMakerBroker | Self::WrongWhitelist | Self::WrongOwner
        )
    }

    /// Short human-readable message
    pub const fn message(self) -> &'static str {
        match self {
            Self::PriceMismatch => "price mismatch",
            Self::CurveExhausted => "curve exhausted",
            Self::InsufficientLiquidity => "insufficient liquidity",
            Self::InvalidStartingPrice => "invalid starting price",
            Self::InvalidDelta => "invalid delta",
            Self::InvalidMmFee => "invalid mm fee",
            Self::InvalidRoyaltyPct => "invalid royalty percentage",
            Self::InvalidCreatorShares => "invalid creator shares",
            Self::WrongCosigner => "wrong cosigner",
            Self::WrongMakerBroker => "wrong maker broker",
            Self::WrongWhitelist => "wrong whitelist",
            Self::WrongOwner => "wrong owner",
            Self::ArithmeticOverflow => "arithmetic overflow",
            Self::ArithmeticUnderflow => "arithmetic underflow",
            Self::WrongPoolType => "wrong pool type",
            Self::PoolClosed => "pool closed",
            Self::PoolEmpty => "pool holds no nfts",
            Self::ExistingNfts => "pool still holds nfts",
            Self::PoolOnSharedEscrow => "pool uses a shared escrow",
            Self::PoolHasFunds => "pool still holds funds",
            Self::NoSharedEscrow => "pool has no shared escrow",
            Self::MaxTakerSellCountExceeded => "max taker sell count exceeded",
            Self::MaxTakerSellCountTooSmall => "max taker sell count too small",
            Self::InsufficientFunds => "insufficient funds",
        }
    }
}

impl fmt::Display for AmmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

impl From<AmmError> for ProgramError {
    fn from(e: AmmError) -> Self {
        ProgramError::Custom(e as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_roundtrip() {
        for code in 0..=23 {
            let err = AmmError::from_u32(code).unwrap();
            assert_eq!(err.to_u32(), code);
        }
        assert_eq!(AmmError::from_u32(24), None);
    }

    #[test]
    fn test_program_error_conversion() {
        let err: ProgramError = AmmError::PriceMismatch.into();
        assert_eq!(err, ProgramError::Custom(0));

        let err: ProgramError = AmmError::InsufficientFunds.into();
        assert_eq!(err, ProgramError::Custom(23));
    }

    #[test]
    fn test_error_families() {
        assert!(AmmError::InvalidDelta.is_invalid_config());
        assert!(AmmError::InvalidRoyaltyPct.is_invalid_config());
        assert!(!AmmError::PriceMismatch.is_invalid_config());

        assert!(AmmError::WrongCosigner.is_wrong_authority());
        assert!(AmmError::WrongMakerBroker.is_wrong_authority());
        assert!(!AmmError::CurveExhausted.is_wrong_authority());
    }
}
