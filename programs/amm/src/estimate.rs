//! Bid quantity estimator

use crate::curve::CurveWalk;
use crate::escrow::{bid_budget, Balance};
use crate::price::{curve_offset, pool_outlay};
use crate::state::Pool;
use nftamm_common::{Side, MAX_BID_ITERATIONS};

/// Number of consecutive bids the pool can fund from `funds`.
///
/// Walks the bid curve summing pool outlays and stops at the first bid the
/// bid budget (spendable balance, capped at `amount` for self-funded pools)
/// cannot cover, at an exhausted curve, at the pool's
/// remaining sell capacity, or after `MAX_BID_ITERATIONS` bids. Arithmetic
/// overflow on the way also ends the walk; bids past that point could not
/// settle anyway.
pub fn max_bid_count(pool: &Pool, funds: &Balance) -> u32 {
    if pool.is_closed() || !pool.config.pool_type.serves_bids() {
        return 0;
    }
    let cap = match pool.remaining_sell_capacity() {
        Some(capacity) => capacity.min(MAX_BID_ITERATIONS),
        None => MAX_BID_ITERATIONS,
    };
    let Ok(start) = curve_offset(pool, Side::Sell, 0) else {
        return 0;
    };

    let spendable = bid_budget(pool, funds);
    let mut spent = 0u64;
    let mut count = 0u32;
    for point in CurveWalk::new(&pool.config, start, Side::Sell.curve_direction()) {
        if count >= cap {
            break;
        }
        let Ok(outlay) = point.and_then(|nominal| pool_outlay(&pool.config, nominal)) else {
            break;
        };
        match spent.checked_add(outlay) {
            Some(total) if total <= spendable => spent = total,
            _ => break,
        }
        count += 1;
    }
    count
}
