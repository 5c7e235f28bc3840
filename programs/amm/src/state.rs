//! Pool state - configuration, counters and lifecycle status
//!
//! A `Pool` is a plain value: every operation takes the current pool by
//! reference and returns the next one, so a failed operation leaves the
//! caller's copy untouched.

use nftamm_common::{
    AmmError, Currency, CurveType, PoolType, MAX_DELTA_BPS, MAX_MM_FEE_BPS,
};
use pinocchio::pubkey::Pubkey;

/// Pricing parameters, fixed at creation and changed only through an edit
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolConfig {
    pub pool_type: PoolType,
    pub curve_type: CurveType,
    /// Price at offset 0 (lamports)
    pub starting_price: u64,
    /// Lamport step (Linear) or basis-point step (Exponential)
    pub delta: u64,
    /// Keep the mm fee in the pool instead of paying the owner (Trade only)
    pub mm_compound_fees: bool,
    /// Market-maker fee; present exactly when the pool is a Trade pool
    pub mm_fee_bps: Option<u16>,
}

impl PoolConfig {
    /// Check static bounds on the configuration
    pub fn validate(&self) -> Result<(), AmmError> {
        if self.starting_price == 0 {
            return Err(AmmError::InvalidStartingPrice);
        }
        if self.curve_type == CurveType::Exponential && self.delta > MAX_DELTA_BPS {
            return Err(AmmError::InvalidDelta);
        }
        match (self.pool_type, self.mm_fee_bps) {
            (PoolType::Trade, Some(bps)) if bps <= MAX_MM_FEE_BPS => Ok(()),
            (PoolType::Trade, _) => Err(AmmError::InvalidMmFee),
            (PoolType::Token | PoolType::NFT, Some(_)) => Err(AmmError::InvalidMmFee),
            (PoolType::Token | PoolType::NFT, None) => Ok(()),
        }
    }

    /// mm fee that actually applies to trades against this pool
    #[inline]
    pub fn effective_mm_fee_bps(&self) -> u16 {
        match self.pool_type {
            PoolType::Trade => self.mm_fee_bps.unwrap_or(0),
            PoolType::Token | PoolType::NFT => 0,
        }
    }

    /// Whether the mm fee stays in the pool
    #[inline]
    pub fn compounds_mm_fees(&self) -> bool {
        self.pool_type == PoolType::Trade && self.mm_compound_fees
    }
}

/// Trade counters
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Successful taker buys (NFT out of the pool)
    pub taker_buy_count: u32,
    /// Successful taker sells (NFT into the pool)
    pub taker_sell_count: u32,
    /// Total mm fee earned over the pool's lifetime (lamports)
    pub accumulated_mm_profit: u64,
}

impl PoolStats {
    /// NFTs sold into the pool net of NFTs bought back out
    #[inline]
    pub fn net_taker_sells(&self) -> u32 {
        self.taker_sell_count.saturating_sub(self.taker_buy_count)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolStatus {
    /// Has inventory or liquidity to trade
    Open,
    /// Trade pool with no NFTs and no currency; a deposit reopens it
    Depleted,
    /// Terminal; resources released to owner and rent payer
    Closed,
}

/// Mutable economic state
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolState {
    /// Bonding curve position: +1 per taker buy, -1 per taker sell
    pub price_offset: i32,
    /// Currency held by the pool itself (lamports); 0 for NFT and shared-escrow pools
    pub amount: u64,
    /// NFTs escrowed by the pool
    pub nfts_held: u32,
    pub stats: PoolStats,
    /// Margin account the pool settles against, if any
    pub shared_escrow: Option<Pubkey>,
    pub currency: Currency,
    pub status: PoolStatus,
}

impl Default for PoolState {
    fn default() -> Self {
        Self {
            price_offset: 0,
            amount: 0,
            nfts_held: 0,
            stats: PoolStats::default(),
            shared_escrow: None,
            currency: Currency::Sol,
            status: PoolStatus::Open,
        }
    }
}

/// Pool account contents as seen by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pool {
    /// Pool account address
    pub address: Pubkey,
    /// Owner; receives proceeds, refunds and non-compounded mm fees
    pub owner: Pubkey,
    /// Account that paid the pool's rent and gets it back on close
    pub rent_payer: Pubkey,
    pub config: PoolConfig,
    pub state: PoolState,
    /// Signer required on every trade, if set
    pub cosigner: Option<Pubkey>,
    /// Broker entitled to the maker share of broker fees, if set
    pub maker_broker: Option<Pubkey>,
    /// Cap on net NFTs sold into the pool; 0 = unlimited
    pub max_taker_sell_count: u32,
}

impl Pool {
    #[inline]
    pub fn is_closed(&self) -> bool {
        self.state.status == PoolStatus::Closed
    }

    #[inline]
    pub fn uses_shared_escrow(&self) -> bool {
        self.state.shared_escrow.is_some()
    }

    /// Fail on closed pools
    #[inline]
    pub fn ensure_live(&self) -> Result<(), AmmError> {
        if self.is_closed() {
            return Err(AmmError::PoolClosed);
        }
        Ok(())
    }

    /// Fail unless `signer` owns the pool
    #[inline]
    pub fn ensure_owner(&self, signer: &Pubkey) -> Result<(), AmmError> {
        if self.owner != *signer {
            return Err(AmmError::WrongOwner);
        }
        Ok(())
    }

    /// Remaining NFTs the pool may buy under its sell cap (`None` = unlimited)
    pub fn remaining_sell_capacity(&self) -> Option<u32> {
        if self.max_taker_sell_count == 0 {
            return None;
        }
        Some(
            self.max_taker_sell_count
                .saturating_sub(self.state.stats.net_taker_sells()),
        )
    }

    /// Recompute Open/Depleted after a deposit or withdrawal
    pub fn refresh_status(&mut self) {
        if self.is_closed() {
            return;
        }
        self.state.status = match self.config.pool_type {
            PoolType::Trade
                if self.state.nfts_held == 0
                    && self.state.amount == 0
                    && !self.uses_shared_escrow() =>
            {
                PoolStatus::Depleted
            }
            PoolType::Token | PoolType::NFT | PoolType::Trade => PoolStatus::Open,
        };
    }
}
