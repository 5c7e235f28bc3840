//! Pool lifecycle - everything besides trades that changes a pool
//!
//! Each operation checks the signer against the pool owner, validates,
//! and returns the next pool value.

use crate::escrow::SharedEscrow;
use crate::settlement::ClosePlan;
use crate::state::{Pool, PoolConfig, PoolState, PoolStatus};
use nftamm_common::{checked_add, AmmError, Currency};
use pinocchio::msg;
use pinocchio::pubkey::Pubkey;
use pinocchio_log::log;

/// Parameters of a new pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreatePool {
    pub address: Pubkey,
    pub owner: Pubkey,
    pub rent_payer: Pubkey,
    pub config: PoolConfig,
    pub currency: Currency,
    pub cosigner: Option<Pubkey>,
    pub maker_broker: Option<Pubkey>,
    pub max_taker_sell_count: u32,
}

/// Owner edit; `None` fields are left unchanged
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EditPool {
    pub new_config: Option<PoolConfig>,
    pub cosigner: Option<Pubkey>,
    pub max_taker_sell_count: Option<u32>,
    /// Move the curve back to the starting price
    pub reset_price_offset: bool,
}

pub fn create_pool(params: &CreatePool) -> Result<Pool, AmmError> {
    params.config.validate()?;
    Ok(Pool {
        address: params.address,
        owner: params.owner,
        rent_payer: params.rent_payer,
        config: params.config,
        state: PoolState {
            currency: params.currency,
            ..PoolState::default()
        },
        cosigner: params.cosigner,
        maker_broker: params.maker_broker,
        max_taker_sell_count: params.max_taker_sell_count,
    })
}

/// Apply an owner edit.
///
/// Takes effect immediately, so a trade quoted before the edit settles at
/// the edited price or fails its price limit.
pub fn edit_pool(pool: &Pool, signer: &Pubkey, edit: &EditPool) -> Result<Pool, AmmError> {
    pool.ensure_live()?;
    pool.ensure_owner(signer)?;

    let mut next = *pool;
    if let Some(config) = edit.new_config {
        if config.pool_type != pool.config.pool_type {
            return Err(AmmError::WrongPoolType);
        }
        config.validate()?;
        next.config = config;
    }
    if let Some(cosigner) = edit.cosigner {
        next.cosigner = Some(cosigner);
    }
    if let Some(max) = edit.max_taker_sell_count {
        if max != 0 && max < pool.state.stats.net_taker_sells() {
            return Err(AmmError::MaxTakerSellCountTooSmall);
        }
        next.max_taker_sell_count = max;
    }
    if edit.reset_price_offset {
        next.state.price_offset = 0;
    }
    Ok(next)
}

fn ensure_self_funded(pool: &Pool) -> Result<(), AmmError> {
    if !pool.config.pool_type.holds_currency() {
        return Err(AmmError::WrongPoolType);
    }
    if pool.uses_shared_escrow() {
        msg!("Error: pool is funded by a shared escrow");
        return Err(AmmError::PoolOnSharedEscrow);
    }
    Ok(())
}

pub fn deposit_sol(pool: &Pool, signer: &Pubkey, amount: u64) -> Result<Pool, AmmError> {
    pool.ensure_live()?;
    pool.ensure_owner(signer)?;
    ensure_self_funded(pool)?;

    let mut next = *pool;
    next.state.amount = checked_add(next.state.amount, amount)?;
    next.refresh_status();
    Ok(next)
}

pub fn withdraw_sol(pool: &Pool, signer: &Pubkey, amount: u64) -> Result<Pool, AmmError> {
    pool.ensure_live()?;
    pool.ensure_owner(signer)?;
    ensure_self_funded(pool)?;
    if amount > pool.state.amount {
        return Err(AmmError::InsufficientFunds);
    }

    let mut next = *pool;
    next.state.amount -= amount;
    next.refresh_status();
    Ok(next)
}

pub fn deposit_nft(pool: &Pool, signer: &Pubkey, whitelist_verified: bool) -> Result<Pool, AmmError> {
    pool.ensure_live()?;
    pool.ensure_owner(signer)?;
    if !pool.config.pool_type.serves_asks() {
        return Err(AmmError::WrongPoolType);
    }
    if !whitelist_verified {
        return Err(AmmError::WrongWhitelist);
    }

    let mut next = *pool;
    next.state.nfts_held = next
        .state
        .nfts_held
        .checked_add(1)
        .ok_or(AmmError::ArithmeticOverflow)?;
    next.refresh_status();
    Ok(next)
}

pub fn withdraw_nft(pool: &Pool, signer: &Pubkey) -> Result<Pool, AmmError> {
    pool.ensure_live()?;
    pool.ensure_owner(signer)?;
    if !pool.config.pool_type.serves_asks() {
        return Err(AmmError::WrongPoolType);
    }
    if pool.state.nfts_held == 0 {
        return Err(AmmError::PoolEmpty);
    }

    let mut next = *pool;
    next.state.nfts_held -= 1;
    next.refresh_status();
    Ok(next)
}

/// Close the pool, refunding its currency to the owner and its rent to the rent payer
pub fn close_pool(pool: &Pool, signer: &Pubkey) -> Result<(Pool, ClosePlan), AmmError> {
    pool.ensure_live()?;
    pool.ensure_owner(signer)?;
    if pool.state.nfts_held > 0 {
        let held = pool.state.nfts_held;
        log!("Error: pool still holds {} NFTs", held);
        return Err(AmmError::ExistingNfts);
    }

    let plan = ClosePlan {
        rent_refund_to: pool.rent_payer,
        currency_refund_to: pool.owner,
        currency_refund: pool.state.amount,
        release_nft_custody: true,
    };
    let mut next = *pool;
    next.state.amount = 0;
    next.state.status = PoolStatus::Closed;
    Ok((next, plan))
}

/// Move a self-funded pool with no currency onto `escrow`
pub fn attach_shared_escrow(
    pool: &Pool,
    signer: &Pubkey,
    escrow: &SharedEscrow,
) -> Result<(Pool, SharedEscrow), AmmError> {
    pool.ensure_live()?;
    pool.ensure_owner(signer)?;
    ensure_self_funded(pool)?;
    if escrow.owner != pool.owner {
        return Err(AmmError::WrongOwner);
    }
    if pool.state.amount != 0 {
        return Err(AmmError::PoolHasFunds);
    }

    let mut next_escrow = *escrow;
    next_escrow.pools_attached = next_escrow
        .pools_attached
        .checked_add(1)
        .ok_or(AmmError::ArithmeticOverflow)?;
    let mut next = *pool;
    next.state.shared_escrow = Some(escrow.address);
    next.refresh_status();
    Ok((next, next_escrow))
}

/// Return a pool to self-funding; its currency stays in the escrow
pub fn detach_shared_escrow(
    pool: &Pool,
    signer: &Pubkey,
    escrow: &SharedEscrow,
) -> Result<(Pool, SharedEscrow), AmmError> {
    pool.ensure_live()?;
    pool.ensure_owner(signer)?;
    if pool.state.shared_escrow != Some(escrow.address) {
        return Err(AmmError::NoSharedEscrow);
    }

    let mut next_escrow = *escrow;
    next_escrow.pools_attached = next_escrow
        .pools_attached
        .checked_sub(1)
        .ok_or(AmmError::ArithmeticUnderflow)?;
    let mut next = *pool;
    next.state.shared_escrow = None;
    next.refresh_status();
    Ok((next, next_escrow))
}
