//! Pool settlement state machine
//!
//! `apply_buy` and `apply_sell` turn a pool and the taker's limits into the
//! next pool value and a `Settlement` describing every lamport that has to
//! move. The input pool is never touched; on error the caller simply keeps
//! it.
//!
//! Order of checks on both sides:
//! 1. pool status and type
//! 2. authority (cosigner, maker broker, whitelist)
//! 3. price against the taker's limit, on the pool as it is now
//! 4. liquidity (sells)
//! 5. fee split and state update

use crate::escrow::{bid_budget, resolve_funds_source, Balance, FundsSource};
use crate::fees::{split_fees, BrokerParams, FeeRates, FeeSplit, RoyaltyParams};
use crate::price::{pool_outlay, price_components, PriceComponents};
use crate::state::{Pool, PoolStatus};
use nftamm_common::{checked_add, checked_sub, AmmError, PoolType, Side};
use pinocchio::msg;
use pinocchio::pubkey::Pubkey;
use pinocchio_log::log;

/// Signatures and proofs verified by the instruction layer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TradeAuthority {
    /// Cosigner that signed the trade, if any
    pub cosigner: Option<Pubkey>,
    /// The NFT passed the pool's whitelist check
    pub whitelist_verified: bool,
}

/// Everything a trade needs besides the pool and the price limit
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TradeParams {
    pub royalty: RoyaltyParams,
    pub brokers: BrokerParams,
    pub authority: TradeAuthority,
    pub fee_rates: FeeRates,
}

/// Resources released when a trade closes the pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClosePlan {
    /// Receives the pool account's rent
    pub rent_refund_to: Pubkey,
    /// Receives the leftover pool currency
    pub currency_refund_to: Pubkey,
    pub currency_refund: u64,
    /// The NFT custody account can be closed as well
    pub release_nft_custody: bool,
}

/// Lamport movements of one trade
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settlement {
    pub side: Side,
    /// Curve point the trade executed at
    pub nominal_price: u64,
    pub mm_fee: u64,
    /// Part of the mm fee paid out to the owner (0 when compounding)
    pub mm_fee_to_owner: u64,
    pub fees: FeeSplit,
    /// Buy: total paid by the taker. Sell: total received by the taker.
    pub taker_amount: u64,
    /// Lamports credited to the funding account (pool or shared escrow)
    pub funds_credit: u64,
    /// Lamports debited from the funding account
    pub funds_debit: u64,
    /// Lamports paid straight to the pool owner
    pub owner_proceeds: u64,
    pub funds_source: FundsSource,
    /// Token pools forward bought NFTs to the owner instead of holding them
    pub nft_to_owner: bool,
    pub close: Option<ClosePlan>,
}

impl Settlement {
    /// Zeroed settlement for `side`
    pub fn empty(side: Side) -> Self {
        Self {
            side,
            nominal_price: 0,
            mm_fee: 0,
            mm_fee_to_owner: 0,
            fees: FeeSplit::default(),
            taker_amount: 0,
            funds_credit: 0,
            funds_debit: 0,
            owner_proceeds: 0,
            funds_source: FundsSource::PoolOwned,
            nft_to_owner: false,
            close: None,
        }
    }
}

fn authorize(
    pool: &Pool,
    side: Side,
    brokers: &BrokerParams,
    authority: &TradeAuthority,
) -> Result<(), AmmError> {
    if let Some(cosigner) = pool.cosigner {
        if authority.cosigner != Some(cosigner) {
            msg!("Error: cosigner mismatch");
            return Err(AmmError::WrongCosigner);
        }
    }
    if let Some(maker_broker) = pool.maker_broker {
        if brokers.maker_broker != Some(maker_broker) {
            msg!("Error: maker broker mismatch");
            return Err(AmmError::WrongMakerBroker);
        }
    }
    if side == Side::Sell && !authority.whitelist_verified {
        msg!("Error: NFT not whitelisted");
        return Err(AmmError::WrongWhitelist);
    }
    Ok(())
}

fn resolve(pool: &Pool, side: Side) -> Result<PriceComponents, AmmError> {
    price_components(pool, side, 0, false)?.ok_or(AmmError::CurveExhausted)
}

/// Taker buys one NFT from the pool, paying at most `max_price`.
///
/// `max_price` bounds the nominal price plus mm fee plus the royalty owed;
/// protocol fees come on top, as they do in the quote.
pub fn apply_buy(
    pool: &Pool,
    max_price: u64,
    params: &TradeParams,
) -> Result<(Pool, Settlement), AmmError> {
    pool.ensure_live()?;
    if !pool.config.pool_type.serves_asks() {
        return Err(AmmError::WrongPoolType);
    }
    if pool.state.nfts_held == 0 {
        return Err(AmmError::PoolEmpty);
    }
    authorize(pool, Side::Buy, &params.brokers, &params.authority)?;

    let PriceComponents { nominal, mm_fee } = resolve(pool, Side::Buy)?;
    let fees = split_fees(nominal, &params.fee_rates, &params.brokers, &params.royalty)?;

    let quoted = checked_add(checked_add(nominal, mm_fee)?, fees.royalty_owed)?;
    if quoted > max_price {
        log!("Error: price mismatch, ask {} above max {}", quoted, max_price);
        return Err(AmmError::PriceMismatch);
    }
    let taker_amount = checked_add(
        checked_add(checked_add(nominal, mm_fee)?, fees.royalty_paid)?,
        fees.taker_fee,
    )?;

    let mut next = *pool;
    next.state.price_offset = next
        .state
        .price_offset
        .checked_add(1)
        .ok_or(AmmError::ArithmeticOverflow)?;
    next.state.stats.taker_buy_count = next
        .state
        .stats
        .taker_buy_count
        .checked_add(1)
        .ok_or(AmmError::ArithmeticOverflow)?;
    next.state.stats.accumulated_mm_profit =
        checked_add(next.state.stats.accumulated_mm_profit, mm_fee)?;
    next.state.nfts_held -= 1;

    let mut settlement = Settlement {
        nominal_price: nominal,
        mm_fee,
        fees,
        taker_amount,
        funds_source: resolve_funds_source(pool),
        ..Settlement::empty(Side::Buy)
    };

    match pool.config.pool_type {
        PoolType::Trade => {
            let (credit, to_owner) = if pool.config.compounds_mm_fees() {
                (checked_add(nominal, mm_fee)?, 0)
            } else {
                (nominal, mm_fee)
            };
            if !pool.uses_shared_escrow() {
                next.state.amount = checked_add(next.state.amount, credit)?;
            }
            settlement.funds_credit = credit;
            settlement.mm_fee_to_owner = to_owner;
            settlement.owner_proceeds = to_owner;
            next.refresh_status();
        }
        PoolType::NFT => {
            settlement.owner_proceeds = nominal;
            if next.state.nfts_held == 0 {
                msg!("Pool sold out, closing");
                next.state.status = PoolStatus::Closed;
                settlement.close = Some(ClosePlan {
                    rent_refund_to: pool.rent_payer,
                    currency_refund_to: pool.owner,
                    currency_refund: 0,
                    release_nft_custody: true,
                });
            }
        }
        PoolType::Token => return Err(AmmError::WrongPoolType),
    }

    Ok((next, settlement))
}

/// Taker sells one NFT into the pool, receiving at least `min_price`.
///
/// `funds` is the funding account's balance: the pool itself or its shared
/// escrow, rent-exempt minimum included. A self-funded pool never pays out
/// more than its own `amount`.
pub fn apply_sell(
    pool: &Pool,
    min_price: u64,
    funds: &Balance,
    params: &TradeParams,
) -> Result<(Pool, Settlement), AmmError> {
    pool.ensure_live()?;
    if !pool.config.pool_type.serves_bids() {
        return Err(AmmError::WrongPoolType);
    }
    if pool.remaining_sell_capacity() == Some(0) {
        return Err(AmmError::MaxTakerSellCountExceeded);
    }
    authorize(pool, Side::Sell, &params.brokers, &params.authority)?;

    let PriceComponents { nominal, mm_fee } = resolve(pool, Side::Sell)?;
    let fees = split_fees(nominal, &params.fee_rates, &params.brokers, &params.royalty)?;

    let quoted = checked_sub(checked_sub(nominal, mm_fee)?, fees.royalty_owed)?;
    if quoted < min_price {
        log!("Error: price mismatch, bid {} below min {}", quoted, min_price);
        return Err(AmmError::PriceMismatch);
    }

    let outlay = pool_outlay(&pool.config, nominal)?;
    let spendable = bid_budget(pool, funds);
    if outlay > spendable {
        log!("Error: insufficient liquidity, outlay {} spendable {}", outlay, spendable);
        return Err(AmmError::InsufficientLiquidity);
    }
    let taker_amount = checked_sub(
        checked_sub(checked_sub(nominal, mm_fee)?, fees.royalty_paid)?,
        fees.taker_fee,
    )?;

    let mut next = *pool;
    next.state.price_offset = next
        .state
        .price_offset
        .checked_sub(1)
        .ok_or(AmmError::ArithmeticOverflow)?;
    next.state.stats.taker_sell_count = next
        .state
        .stats
        .taker_sell_count
        .checked_add(1)
        .ok_or(AmmError::ArithmeticOverflow)?;
    next.state.stats.accumulated_mm_profit =
        checked_add(next.state.stats.accumulated_mm_profit, mm_fee)?;
    if !pool.uses_shared_escrow() {
        next.state.amount = checked_sub(next.state.amount, outlay)?;
    }

    let mut settlement = Settlement {
        nominal_price: nominal,
        mm_fee,
        fees,
        taker_amount,
        funds_debit: outlay,
        funds_source: resolve_funds_source(pool),
        ..Settlement::empty(Side::Sell)
    };

    match pool.config.pool_type {
        PoolType::Trade => {
            next.state.nfts_held = next
                .state
                .nfts_held
                .checked_add(1)
                .ok_or(AmmError::ArithmeticOverflow)?;
            if !pool.config.compounds_mm_fees() {
                settlement.mm_fee_to_owner = mm_fee;
                settlement.owner_proceeds = mm_fee;
            }
            next.refresh_status();
        }
        PoolType::Token => {
            settlement.nft_to_owner = true;
            if !pool.uses_shared_escrow() && !can_fund_next_bid(&next)? {
                let refund = next.state.amount;
                log!("Pool cannot fund next bid, closing with {} left", refund);
                settlement.close = Some(ClosePlan {
                    rent_refund_to: pool.rent_payer,
                    currency_refund_to: pool.owner,
                    currency_refund: refund,
                    release_nft_custody: false,
                });
                next.state.amount = 0;
                next.state.status = PoolStatus::Closed;
            }
        }
        PoolType::NFT => return Err(AmmError::WrongPoolType),
    }

    Ok((next, settlement))
}

/// Whether a self-funded pool still holds enough for its next bid
fn can_fund_next_bid(pool: &Pool) -> Result<bool, AmmError> {
    match price_components(pool, Side::Sell, 0, false)? {
        Some(next) => Ok(pool.state.amount >= pool_outlay(&pool.config, next.nominal)?),
        None => Ok(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{PoolConfig, PoolState};
    use nftamm_common::CurveType;

    const OWNER: Pubkey = [1u8; 32];
    const RENT_PAYER: Pubkey = [2u8; 32];
    const COSIGNER: Pubkey = [5u8; 32];

    fn trade_pool(mm_fee_bps: u16, compound: bool) -> Pool {
        Pool {
            address: [9u8; 32],
            owner: OWNER,
            rent_payer: RENT_PAYER,
            config: PoolConfig {
                pool_type: PoolType::Trade,
                curve_type: CurveType::Linear,
                starting_price: 1_000_000,
                delta: 100_000,
                mm_compound_fees: compound,
                mm_fee_bps: Some(mm_fee_bps),
            },
            state: PoolState {
                amount: 10_000_000,
                nfts_held: 2,
                ..PoolState::default()
            },
            cosigner: None,
            maker_broker: None,
            max_taker_sell_count: 0,
        }
    }

    fn no_fees() -> TradeParams {
        TradeParams {
            fee_rates: FeeRates {
                taker_fee_bps: 0,
                broker_fee_pct: 0,
                maker_broker_pct: 0,
            },
            authority: TradeAuthority {
                cosigner: None,
                whitelist_verified: true,
            },
            ..TradeParams::default()
        }
    }

    #[test]
    fn test_buy_compounding_trade_pool() {
        let pool = trade_pool(1_000, true);
        let (next, settlement) = apply_buy(&pool, u64::MAX, &no_fees()).unwrap();

        assert_eq!(settlement.nominal_price, 1_000_000);
        assert_eq!(settlement.mm_fee, 100_000);
        assert_eq!(settlement.taker_amount, 1_100_000);
        assert_eq!(settlement.funds_credit, 1_100_000);
        assert_eq!(settlement.owner_proceeds, 0);

        assert_eq!(next.state.price_offset, 1);
        assert_eq!(next.state.nfts_held, 1);
        assert_eq!(next.state.amount, 11_100_000);
        assert_eq!(next.state.stats.taker_buy_count, 1);
        assert_eq!(next.state.stats.accumulated_mm_profit, 100_000);
    }

    #[test]
    fn test_sell_non_compounding_pays_owner() {
        let pool = trade_pool(1_000, false);
        let funds = Balance::for_pool(&pool, 0);
        let (next, settlement) = apply_sell(&pool, 0, &funds, &no_fees()).unwrap();

        // Trade pools bid one step below the ask
        assert_eq!(settlement.nominal_price, 900_000);
        assert_eq!(settlement.mm_fee, 90_000);
        assert_eq!(settlement.taker_amount, 810_000);
        assert_eq!(settlement.owner_proceeds, 90_000);
        assert_eq!(settlement.funds_debit, 900_000);

        assert_eq!(next.state.amount, 9_100_000);
        assert_eq!(next.state.nfts_held, 3);
        assert_eq!(next.state.price_offset, -1);
    }

    #[test]
    fn test_price_limits() {
        let pool = trade_pool(0, false);
        assert_eq!(
            apply_buy(&pool, 999_999, &no_fees()).map(|_| ()),
            Err(AmmError::PriceMismatch)
        );
        assert!(apply_buy(&pool, 1_000_000, &no_fees()).is_ok());

        let funds = Balance::for_pool(&pool, 0);
        assert_eq!(
            apply_sell(&pool, 900_001, &funds, &no_fees()).map(|_| ()),
            Err(AmmError::PriceMismatch)
        );
        assert!(apply_sell(&pool, 900_000, &funds, &no_fees()).is_ok());
    }

    #[test]
    fn test_authority_checked_first() {
        let mut pool = trade_pool(0, false);
        pool.cosigner = Some(COSIGNER);
        // Would also fail the price check; the cosigner error wins
        assert_eq!(
            apply_buy(&pool, 0, &no_fees()).map(|_| ()),
            Err(AmmError::WrongCosigner)
        );

        let mut params = no_fees();
        params.authority.cosigner = Some(COSIGNER);
        assert!(apply_buy(&pool, u64::MAX, &params).is_ok());

        pool.maker_broker = Some([6u8; 32]);
        assert_eq!(
            apply_buy(&pool, u64::MAX, &params).map(|_| ()),
            Err(AmmError::WrongMakerBroker)
        );

        pool.maker_broker = None;
        params.authority.whitelist_verified = false;
        let funds = Balance::for_pool(&pool, 0);
        assert_eq!(
            apply_sell(&pool, 0, &funds, &params).map(|_| ()),
            Err(AmmError::WrongWhitelist)
        );
    }

    #[test]
    fn test_insufficient_liquidity() {
        let mut pool = trade_pool(0, false);
        pool.state.amount = 899_999;
        let funds = Balance::for_pool(&pool, 890_880);
        assert_eq!(
            apply_sell(&pool, 0, &funds, &no_fees()).map(|_| ()),
            Err(AmmError::InsufficientLiquidity)
        );
    }

    #[test]
    fn test_sell_cap() {
        let mut pool = trade_pool(0, false);
        pool.max_taker_sell_count = 1;
        let funds = Balance::for_pool(&pool, 0);
        let (next, _) = apply_sell(&pool, 0, &funds, &no_fees()).unwrap();
        let funds = Balance::for_pool(&next, 0);
        assert_eq!(
            apply_sell(&next, 0, &funds, &no_fees()).map(|_| ()),
            Err(AmmError::MaxTakerSellCountExceeded)
        );
    }

    #[test]
    fn test_shared_escrow_pool_amount_untouched() {
        let mut pool = trade_pool(0, false);
        pool.state.amount = 0;
        pool.state.shared_escrow = Some([8u8; 32]);
        let escrow = Balance::new(5_000_000, 0);

        let (next, settlement) = apply_sell(&pool, 0, &escrow, &no_fees()).unwrap();
        assert_eq!(next.state.amount, 0);
        assert_eq!(settlement.funds_source, FundsSource::SharedEscrow([8u8; 32]));
        assert_eq!(settlement.funds_debit, 900_000);
    }

    #[test]
    fn test_wrong_pool_type() {
        let mut pool = trade_pool(0, false);
        pool.config.pool_type = PoolType::Token;
        pool.config.mm_fee_bps = None;
        assert_eq!(
            apply_buy(&pool, u64::MAX, &no_fees()).map(|_| ()),
            Err(AmmError::WrongPoolType)
        );
    }

    fn token_pool(starting_price: u64, delta: u64, amount: u64) -> Pool {
        let mut pool = trade_pool(0, false);
        pool.config.pool_type = PoolType::Token;
        pool.config.mm_fee_bps = None;
        pool.config.starting_price = starting_price;
        pool.config.delta = delta;
        pool.state.amount = amount;
        pool.state.nfts_held = 0;
        pool
    }

    #[test]
    fn test_self_funded_sell_capped_by_amount() {
        let pool = token_pool(900, 0, 500);
        let rich_account = Balance::new(10_000, 0);
        assert_eq!(
            apply_sell(&pool, 0, &rich_account, &no_fees()).map(|_| ()),
            Err(AmmError::InsufficientLiquidity)
        );
    }

    #[test]
    fn test_sell_into_exhausted_curve() {
        let mut pool = trade_pool(0, false);
        pool.config.starting_price = 100;
        pool.config.delta = 50;
        let funds = Balance::for_pool(&pool, 0);
        let (next, settlement) = apply_sell(&pool, 0, &funds, &no_fees()).unwrap();
        assert_eq!(settlement.nominal_price, 50);

        // Next bid sits at offset -2, where the linear curve reaches zero
        let funds = Balance::for_pool(&next, 0);
        assert_eq!(
            apply_sell(&next, 0, &funds, &no_fees()).map(|_| ()),
            Err(AmmError::CurveExhausted)
        );
    }

    #[test]
    fn test_token_pool_closes_when_curve_runs_out() {
        let pool = token_pool(100, 50, 1_000);
        let funds = Balance::for_pool(&pool, 0);
        let (next, settlement) = apply_sell(&pool, 0, &funds, &no_fees()).unwrap();
        assert_eq!(settlement.nominal_price, 100);
        assert_eq!(settlement.close, None);
        assert_eq!(next.state.amount, 900);
        assert_eq!(next.state.status, PoolStatus::Open);

        let funds = Balance::for_pool(&next, 0);
        let (closed, settlement) = apply_sell(&next, 0, &funds, &no_fees()).unwrap();
        assert_eq!(settlement.nominal_price, 50);
        assert!(settlement.nft_to_owner);
        assert_eq!(
            settlement.close,
            Some(ClosePlan {
                rent_refund_to: RENT_PAYER,
                currency_refund_to: OWNER,
                currency_refund: 850,
                release_nft_custody: false,
            })
        );
        assert_eq!(closed.state.amount, 0);
        assert_eq!(closed.state.status, PoolStatus::Closed);
        assert_eq!(closed.state.price_offset, -2);
    }
}
