//! External interface of the engine
//!
//! Read-only quotes for display and routing, plus the two settlement entry
//! points. Quotes never change the pool; calling any of them twice on the
//! same pool gives the same answer.

use crate::curve::sum_points_with;
use crate::escrow::Balance;
use crate::estimate::max_bid_count;
use crate::price::{bid_price, current_price, curve_offset, PriceComponents};
use crate::state::Pool;
use nftamm_common::{bps_of, AmmError, QuoteLadder, Side, LADDER_DEPTH};

pub use crate::settlement::{apply_buy, apply_sell};

/// Price a taker would pay for the `extra_offset`-th next NFT out of the pool
pub fn quote_ask(
    pool: &Pool,
    royalty_fee_bps: u16,
    extra_offset: u32,
    exclude_mm_fee: bool,
) -> Result<Option<u64>, AmmError> {
    current_price(pool, Side::Buy, royalty_fee_bps, extra_offset, exclude_mm_fee)
}

/// Price a taker would receive for the `extra_offset`-th next NFT sold in,
/// if the funding account can pay for it
pub fn quote_bid(
    pool: &Pool,
    funds: &Balance,
    royalty_fee_bps: u16,
    extra_offset: u32,
    exclude_mm_fee: bool,
) -> Result<Option<u64>, AmmError> {
    bid_price(pool, funds, royalty_fee_bps, extra_offset, exclude_mm_fee)
}

/// How many NFTs the pool can buy in a row from `funds`
pub fn estimate_max_bids(pool: &Pool, funds: &Balance) -> u32 {
    max_bid_count(pool, funds)
}

/// Taker-facing total of `quantity` consecutive trades on `side`.
///
/// The mm fee is included, royalties and protocol fees are not. `None`
/// when the pool cannot serve that many trades: too few NFTs for asks, sell
/// cap reached for bids, or an exhausted curve.
pub fn estimate_bulk_cost(pool: &Pool, side: Side, quantity: u32) -> Result<Option<u64>, AmmError> {
    if pool.is_closed() {
        return Ok(None);
    }
    let servable = match side {
        Side::Buy => pool.config.pool_type.serves_asks() && pool.state.nfts_held >= quantity,
        Side::Sell => {
            pool.config.pool_type.serves_bids()
                && pool
                    .remaining_sell_capacity()
                    .map_or(true, |capacity| capacity >= quantity)
        }
    };
    if !servable {
        return Ok(None);
    }
    if quantity == 0 {
        return Ok(Some(0));
    }

    let mm_fee_bps = pool.config.effective_mm_fee_bps() as u64;
    let start = curve_offset(pool, side, 0)?;
    let sum = sum_points_with(&pool.config, start, quantity, side.curve_direction(), |nominal| {
        let mm_fee = bps_of(nominal, mm_fee_bps)?;
        PriceComponents { nominal, mm_fee }.taker_price(side)
    })?;
    if sum.count < quantity {
        return Ok(None);
    }
    Ok(Some(sum.total))
}

/// Next `LADDER_DEPTH` asks and fundable bids of the pool
pub fn build_ladder(pool: &Pool, funds: &Balance, royalty_fee_bps: u16) -> Result<QuoteLadder, AmmError> {
    let mut ladder = QuoteLadder::new(pool.state.price_offset);
    for extra in 0..LADDER_DEPTH as u32 {
        match quote_ask(pool, royalty_fee_bps, extra, false)? {
            Some(price) if ladder.push_ask(price) => {}
            _ => break,
        }
    }
    for extra in 0..LADDER_DEPTH as u32 {
        match quote_bid(pool, funds, royalty_fee_bps, extra, false)? {
            Some(price) if ladder.push_bid(price) => {}
            _ => break,
        }
    }
    Ok(ladder)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{PoolConfig, PoolState};
    use nftamm_common::{CurveType, PoolType};

    fn trade_pool() -> Pool {
        Pool {
            address: [9u8; 32],
            owner: [1u8; 32],
            rent_payer: [1u8; 32],
            config: PoolConfig {
                pool_type: PoolType::Trade,
                curve_type: CurveType::Linear,
                starting_price: 1_000,
                delta: 100,
                mm_compound_fees: false,
                mm_fee_bps: Some(1_000),
            },
            state: PoolState {
                amount: 10_000,
                nfts_held: 3,
                ..PoolState::default()
            },
            cosigner: None,
            maker_broker: None,
            max_taker_sell_count: 0,
        }
    }

    #[test]
    fn test_bulk_cost_asks() {
        let pool = trade_pool();
        // (1000 + 100) + (1100 + 110) + (1200 + 120)
        assert_eq!(estimate_bulk_cost(&pool, Side::Buy, 3).unwrap(), Some(3_630));
        assert_eq!(estimate_bulk_cost(&pool, Side::Buy, 4).unwrap(), None);
        assert_eq!(estimate_bulk_cost(&pool, Side::Buy, 0).unwrap(), Some(0));
    }

    #[test]
    fn test_bulk_cost_bids() {
        let pool = trade_pool();
        // (900 - 90) + (800 - 80)
        assert_eq!(estimate_bulk_cost(&pool, Side::Sell, 2).unwrap(), Some(1_530));
        // Bids at 900..=100 only
        assert_eq!(estimate_bulk_cost(&pool, Side::Sell, 10).unwrap(), None);
    }

    #[test]
    fn test_bulk_cost_matches_single_quotes() {
        let pool = trade_pool();
        let single: u64 = (0..3)
            .map(|k| quote_ask(&pool, 0, k, false).unwrap().unwrap())
            .sum();
        assert_eq!(estimate_bulk_cost(&pool, Side::Buy, 3).unwrap(), Some(single));
    }

    #[test]
    fn test_build_ladder() {
        let pool = trade_pool();
        let funds = Balance::for_pool(&pool, 0);
        let ladder = build_ladder(&pool, &funds, 0).unwrap();

        // Only three NFTs to sell
        assert_eq!(ladder.asks().len(), 3);
        assert_eq!(ladder.best_ask(), Some(1_100));
        assert_eq!(ladder.asks()[2].cumulative, 3_630);

        // 900 + 800 + ... + 200 = 4_400 fits in 10_000
        assert_eq!(ladder.bids().len(), LADDER_DEPTH);
        assert_eq!(ladder.best_bid(), Some(810));
        assert_eq!(ladder.spread(), Some(290));
    }
}
