//! Price resolver - taker-facing ask and bid for a pool
//!
//! Everything here is a read-only projection of a `Pool`. The same
//! functions back the quoting interface and the settlement state machine,
//! so a quote and the trade that follows it agree to the lamport.

use crate::curve::{price_point, sum_points_with};
use crate::escrow::{bid_budget, Balance};
use crate::state::{Pool, PoolConfig};
use nftamm_common::{bps_of, checked_add, checked_sub, AmmError, PoolType, Side};

/// Curve price split into what the pool keeps and the mm spread
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PriceComponents {
    /// Raw curve point (lamports)
    pub nominal: u64,
    /// Market-maker fee on top of (asks) or below (bids) the nominal price
    pub mm_fee: u64,
}

impl PriceComponents {
    /// Price the taker sees before royalties and protocol fees
    pub fn taker_price(&self, side: Side) -> Result<u64, AmmError> {
        match side {
            Side::Buy => checked_add(self.nominal, self.mm_fee),
            Side::Sell => checked_sub(self.nominal, self.mm_fee),
        }
    }
}

/// Curve offset of the `extra_offset`-th next trade on `side`.
///
/// Buys walk up from the current offset. Trade pools bid one step below
/// their ask so that a buy followed by a sell never crosses the spread.
pub fn curve_offset(pool: &Pool, side: Side, extra_offset: u32) -> Result<i32, AmmError> {
    let extra = i32::try_from(extra_offset).map_err(|_| AmmError::ArithmeticOverflow)?;
    let offset = pool.state.price_offset;
    let resolved = match (side, pool.config.pool_type) {
        (Side::Buy, _) => offset.checked_add(extra),
        (Side::Sell, PoolType::Trade) => offset
            .checked_sub(1)
            .and_then(|o| o.checked_sub(extra)),
        (Side::Sell, PoolType::Token | PoolType::NFT) => offset.checked_sub(extra),
    };
    resolved.ok_or(AmmError::ArithmeticOverflow)
}

/// Lamports that leave the funding account when the pool buys at `nominal`.
///
/// A compounding Trade pool keeps its mm fee, so it only pays out the
/// taker's side of the spread.
pub fn pool_outlay(config: &PoolConfig, nominal: u64) -> Result<u64, AmmError> {
    if config.compounds_mm_fees() {
        let mm_fee = bps_of(nominal, config.effective_mm_fee_bps() as u64)?;
        checked_sub(nominal, mm_fee)
    } else {
        Ok(nominal)
    }
}

/// Nominal price and mm fee of the `extra_offset`-th next trade on `side`.
///
/// `None` when the pool cannot serve the trade: closed pool, side not
/// served by the pool type, not enough NFTs for the ask, or an exhausted
/// curve.
pub fn price_components(
    pool: &Pool,
    side: Side,
    extra_offset: u32,
    exclude_mm_fee: bool,
) -> Result<Option<PriceComponents>, AmmError> {
    if pool.is_closed() {
        return Ok(None);
    }
    let served = match side {
        Side::Buy => pool.config.pool_type.serves_asks() && pool.state.nfts_held > extra_offset,
        Side::Sell => pool.config.pool_type.serves_bids(),
    };
    if !served {
        return Ok(None);
    }

    let offset = curve_offset(pool, side, extra_offset)?;
    let Some(nominal) = price_point(&pool.config, offset)? else {
        return Ok(None);
    };
    let mm_fee = if exclude_mm_fee {
        0
    } else {
        bps_of(nominal, pool.config.effective_mm_fee_bps() as u64)?
    };
    Ok(Some(PriceComponents { nominal, mm_fee }))
}

/// Taker-facing price including mm fee and royalties.
///
/// Royalties are added on asks and deducted on bids. Does not check the
/// pool's liquidity; see [`bid_price`] for that.
pub fn current_price(
    pool: &Pool,
    side: Side,
    royalty_fee_bps: u16,
    extra_offset: u32,
    exclude_mm_fee: bool,
) -> Result<Option<u64>, AmmError> {
    let Some(components) = price_components(pool, side, extra_offset, exclude_mm_fee)? else {
        return Ok(None);
    };
    let price = components.taker_price(side)?;
    let royalty = bps_of(components.nominal, royalty_fee_bps as u64)?;
    let with_royalty = match side {
        Side::Buy => checked_add(price, royalty)?,
        Side::Sell => checked_sub(price, royalty)?,
    };
    Ok(Some(with_royalty))
}

/// Bid the pool can actually pay given the lamports of its funding account.
///
/// The bid at `extra_offset` is only available if the funding account can
/// cover it together with every bid in front of it, after reserving the
/// account's rent-exempt minimum. A self-funded pool is further capped at its
/// own `amount`. Falling short by a single lamport yields `None`. The pool's
/// remaining sell capacity is honoured the same way.
pub fn bid_price(
    pool: &Pool,
    funds: &Balance,
    royalty_fee_bps: u16,
    extra_offset: u32,
    exclude_mm_fee: bool,
) -> Result<Option<u64>, AmmError> {
    if let Some(capacity) = pool.remaining_sell_capacity() {
        if capacity <= extra_offset {
            return Ok(None);
        }
    }
    let Some(price) = current_price(pool, Side::Sell, royalty_fee_bps, extra_offset, exclude_mm_fee)?
    else {
        return Ok(None);
    };

    let needed = extra_offset
        .checked_add(1)
        .ok_or(AmmError::ArithmeticOverflow)?;
    let start = curve_offset(pool, Side::Sell, 0)?;
    let outlay = sum_points_with(
        &pool.config,
        start,
        needed,
        Side::Sell.curve_direction(),
        |nominal| pool_outlay(&pool.config, nominal),
    )?;
    if outlay.count < needed || outlay.total > bid_budget(pool, funds) {
        return Ok(None);
    }
    Ok(Some(price))
}
