//! Escrow delegation - where trade funds come from and go to
//!
//! A pool either settles against its own lamports or against a shared
//! margin account owned by the same wallet. The shared escrow is modelled
//! the same way as a collateral vault: a balance with a rent reserve that
//! can never be spent.

use crate::settlement::Settlement;
use crate::state::Pool;
use nftamm_common::{checked_add, checked_sub, AmmError};
use pinocchio::pubkey::Pubkey;
use pinocchio::sysvars::rent::Rent;

/// Bytes every account pays rent on regardless of its data
pub const ACCOUNT_STORAGE_OVERHEAD: u64 = 128;

/// Default lamports per byte for two years of rent (rent-exempt threshold)
pub const DEFAULT_EXEMPT_LAMPORTS_PER_BYTE: u64 = 6_960;

/// Account funding a trade
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FundsSource {
    /// The pool's own lamports (`PoolState::amount`)
    PoolOwned,
    /// A shared margin account
    SharedEscrow(Pubkey),
}

/// Pick the account buy/sell settlement draws from or deposits to
#[inline]
pub fn resolve_funds_source(pool: &Pool) -> FundsSource {
    match pool.state.shared_escrow {
        Some(escrow) => FundsSource::SharedEscrow(escrow),
        None => FundsSource::PoolOwned,
    }
}

/// Lamports available to pay for bids. A self-funded pool can spend at most
/// its own `amount`, whatever the funding account holds beyond it.
#[inline]
pub fn bid_budget(pool: &Pool, funds: &Balance) -> u64 {
    match resolve_funds_source(pool) {
        FundsSource::PoolOwned => funds.spendable().min(pool.state.amount),
        FundsSource::SharedEscrow(_) => funds.spendable(),
    }
}

/// Rent-exemption threshold lookup
pub trait RentExemption {
    /// Minimum lamports for an account with `data_len` bytes to be rent-exempt
    fn minimum_balance(&self, data_len: usize) -> u64;
}

impl RentExemption for Rent {
    fn minimum_balance(&self, data_len: usize) -> u64 {
        Rent::minimum_balance(self, data_len)
    }
}

/// Fixed per-byte schedule, for off-chain quoting without the rent sysvar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RentSchedule {
    pub exempt_lamports_per_byte: u64,
}

impl Default for RentSchedule {
    fn default() -> Self {
        Self {
            exempt_lamports_per_byte: DEFAULT_EXEMPT_LAMPORTS_PER_BYTE,
        }
    }
}

impl RentExemption for RentSchedule {
    fn minimum_balance(&self, data_len: usize) -> u64 {
        (ACCOUNT_STORAGE_OVERHEAD.saturating_add(data_len as u64))
            .saturating_mul(self.exempt_lamports_per_byte)
    }
}

/// Lamports held by the funding account and the part reserved for rent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Balance {
    pub lamports: u64,
    pub rent_exempt_min: u64,
}

impl Balance {
    pub fn new(lamports: u64, rent_exempt_min: u64) -> Self {
        Self {
            lamports,
            rent_exempt_min,
        }
    }

    /// Balance of an account of `data_len` bytes under the given rent schedule
    pub fn with_rent<R: RentExemption>(lamports: u64, rent: &R, data_len: usize) -> Self {
        Self::new(lamports, rent.minimum_balance(data_len))
    }

    /// Balance of a pool funding its own bids: its `amount` on top of its rent
    pub fn for_pool(pool: &Pool, rent_exempt_min: u64) -> Self {
        Self {
            lamports: pool.state.amount.saturating_add(rent_exempt_min),
            rent_exempt_min,
        }
    }

    /// Lamports that can leave the account without breaking rent exemption
    #[inline]
    pub fn spendable(&self) -> u64 {
        self.lamports.saturating_sub(self.rent_exempt_min)
    }
}

/// Margin account shared by several pools of the same owner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SharedEscrow {
    pub address: Pubkey,
    pub owner: Pubkey,
    /// Account lamports, rent included
    pub lamports: u64,
    /// Rent reserve that must stay in the account
    pub rent_exempt_min: u64,
    /// Pools currently settling against this escrow
    pub pools_attached: u32,
}

impl SharedEscrow {
    pub fn new(address: Pubkey, owner: Pubkey, rent_exempt_min: u64) -> Self {
        Self {
            address,
            owner,
            lamports: rent_exempt_min,
            rent_exempt_min,
            pools_attached: 0,
        }
    }

    /// Funds available to bids and withdrawals
    #[inline]
    pub fn balance(&self) -> Balance {
        Balance::new(self.lamports, self.rent_exempt_min)
    }

    /// Owner deposit
    pub fn deposit(&mut self, signer: &Pubkey, amount: u64) -> Result<(), AmmError> {
        if self.owner != *signer {
            return Err(AmmError::WrongOwner);
        }
        self.lamports = checked_add(self.lamports, amount)?;
        Ok(())
    }

    /// Owner withdrawal; the rent reserve is never released
    pub fn withdraw(&mut self, signer: &Pubkey, amount: u64) -> Result<(), AmmError> {
        if self.owner != *signer {
            return Err(AmmError::WrongOwner);
        }
        if amount > self.balance().spendable() {
            return Err(AmmError::InsufficientFunds);
        }
        self.lamports = checked_sub(self.lamports, amount)?;
        Ok(())
    }

    /// Pay out a pool's bid; the rent reserve is never touched
    pub fn debit_for_bid(&mut self, amount: u64) -> Result<(), AmmError> {
        if amount > self.balance().spendable() {
            return Err(AmmError::InsufficientLiquidity);
        }
        self.lamports = checked_sub(self.lamports, amount)?;
        Ok(())
    }

    /// Receive the proceeds of a pool's sale
    pub fn credit_from_sale(&mut self, amount: u64) -> Result<(), AmmError> {
        self.lamports = checked_add(self.lamports, amount)?;
        Ok(())
    }

    /// Apply the escrow side of a settlement produced by a pool on this escrow
    pub fn apply(&mut self, settlement: &Settlement) -> Result<(), AmmError> {
        if settlement.funds_source != FundsSource::SharedEscrow(self.address) {
            return Err(AmmError::NoSharedEscrow);
        }
        let mut next = *self;
        next.debit_for_bid(settlement.funds_debit)?;
        next.credit_from_sale(settlement.funds_credit)?;
        *self = next;
        Ok(())
    }
}
