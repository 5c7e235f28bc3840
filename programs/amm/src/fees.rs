//! Fee splitter
//!
//! Splits the protocol taker fee between the fee vault and the two brokers,
//! and the creator royalty between up to five creators.

use arrayvec::ArrayVec;
use nftamm_common::{
    bps_of, checked_add, checked_sub, pct_of, AmmError, TokenStandard, BROKER_FEE_PCT,
    HUNDRED_PCT, MAKER_BROKER_PCT, MAX_CREATORS, TAKER_FEE_BPS,
};
use pinocchio::pubkey::Pubkey;

/// Protocol fee schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeRates {
    /// Taker fee on the nominal price (bps)
    pub taker_fee_bps: u16,
    /// Share of the taker fee routed to brokers (pct)
    pub broker_fee_pct: u8,
    /// Share of the broker fee routed to the maker broker (pct)
    pub maker_broker_pct: u8,
}

impl Default for FeeRates {
    fn default() -> Self {
        Self {
            taker_fee_bps: TAKER_FEE_BPS,
            broker_fee_pct: BROKER_FEE_PCT,
            maker_broker_pct: MAKER_BROKER_PCT,
        }
    }
}

/// Broker accounts supplied with a trade
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BrokerParams {
    pub maker_broker: Option<Pubkey>,
    pub taker_broker: Option<Pubkey>,
}

/// Creator from the NFT metadata, with the lamports its account holds now
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreatorAccount {
    pub address: Pubkey,
    /// Share of royalties (pct, all creators sum to 100)
    pub share: u8,
    /// Current account lamports
    pub lamports: u64,
}

/// Royalty terms of the traded NFT
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoyaltyParams {
    pub royalty_fee_bps: u16,
    /// Percentage of the royalty the taker chose to pay; `None` pays in full
    pub optional_royalty_pct: Option<u8>,
    pub standard: TokenStandard,
    pub creators: ArrayVec<CreatorAccount, MAX_CREATORS>,
    /// Rent-exempt minimum for a creator's (data-less) account
    pub creator_rent_exempt_min: u64,
}

impl Default for RoyaltyParams {
    fn default() -> Self {
        Self::none()
    }
}

impl RoyaltyParams {
    /// No royalties
    pub fn none() -> Self {
        Self {
            royalty_fee_bps: 0,
            optional_royalty_pct: None,
            standard: TokenStandard::NonFungible,
            creators: ArrayVec::new(),
            creator_rent_exempt_min: 0,
        }
    }

    pub fn new(royalty_fee_bps: u16, standard: TokenStandard) -> Self {
        Self {
            royalty_fee_bps,
            standard,
            ..Self::none()
        }
    }

    /// Add a creator; more than `MAX_CREATORS` is rejected
    pub fn with_creator(mut self, creator: CreatorAccount) -> Result<Self, AmmError> {
        self.creators
            .try_push(creator)
            .map_err(|_| AmmError::InvalidCreatorShares)?;
        Ok(self)
    }

    pub fn with_optional_pct(mut self, pct: u8) -> Self {
        self.optional_royalty_pct = Some(pct);
        self
    }

    pub fn with_creator_rent_exempt_min(mut self, lamports: u64) -> Self {
        self.creator_rent_exempt_min = lamports;
        self
    }
}

/// Royalty actually credited to one creator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreatorPayout {
    pub creator: Pubkey,
    pub amount: u64,
}

/// Result of splitting the fees of one trade
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FeeSplit {
    /// Protocol taker fee
    pub taker_fee: u64,
    /// Part of the taker fee earmarked for brokers
    pub broker_fee: u64,
    /// Paid to the maker broker (0 when none was supplied)
    pub maker_broker_fee: u64,
    /// Paid to the taker broker (0 when none was supplied)
    pub taker_broker_fee: u64,
    /// Remainder of the taker fee, including unclaimed broker shares
    pub fee_vault: u64,
    /// Full royalty at the metadata rate
    pub royalty_fee: u64,
    /// Royalty after applying the optional percentage
    pub royalty_owed: u64,
    /// Royalty actually credited to creators
    pub royalty_paid: u64,
    pub creator_payouts: ArrayVec<CreatorPayout, MAX_CREATORS>,
    /// Creators whose share was dropped because their account would not be rent-exempt
    pub skipped_creators: u8,
}

/// Percentage of the royalty due on this trade
pub fn royalty_pct(royalty: &RoyaltyParams) -> Result<u64, AmmError> {
    if royalty.standard.enforces_royalties() {
        return Ok(HUNDRED_PCT);
    }
    match royalty.optional_royalty_pct {
        None => Ok(HUNDRED_PCT),
        Some(pct) if (pct as u64) <= HUNDRED_PCT => Ok(pct as u64),
        Some(_) => Err(AmmError::InvalidRoyaltyPct),
    }
}

/// Split taker fee and royalties on `gross` (the nominal trade price).
pub fn split_fees(
    gross: u64,
    rates: &FeeRates,
    brokers: &BrokerParams,
    royalty: &RoyaltyParams,
) -> Result<FeeSplit, AmmError> {
    let taker_fee = bps_of(gross, rates.taker_fee_bps as u64)?;
    let broker_fee = pct_of(taker_fee, rates.broker_fee_pct as u64)?;
    let maker_share = pct_of(broker_fee, rates.maker_broker_pct as u64)?;
    let taker_share = checked_sub(broker_fee, maker_share)?;

    let maker_broker_fee = if brokers.maker_broker.is_some() { maker_share } else { 0 };
    let taker_broker_fee = if brokers.taker_broker.is_some() { taker_share } else { 0 };
    let fee_vault = checked_sub(
        checked_sub(taker_fee, maker_broker_fee)?,
        taker_broker_fee,
    )?;

    let pct = royalty_pct(royalty)?;
    let royalty_fee = bps_of(gross, royalty.royalty_fee_bps as u64)?;
    let royalty_owed = pct_of(royalty_fee, pct)?;

    let mut split = FeeSplit {
        taker_fee,
        broker_fee,
        maker_broker_fee,
        taker_broker_fee,
        fee_vault,
        royalty_fee,
        royalty_owed,
        ..FeeSplit::default()
    };
    pay_creators(&mut split, royalty)?;
    Ok(split)
}

fn pay_creators(split: &mut FeeSplit, royalty: &RoyaltyParams) -> Result<(), AmmError> {
    if royalty.creators.is_empty() {
        return Ok(());
    }
    let total_shares = royalty
        .creators
        .iter()
        .fold(0u64, |acc, c| acc + c.share as u64);
    if total_shares != HUNDRED_PCT {
        return Err(AmmError::InvalidCreatorShares);
    }

    for creator in &royalty.creators {
        let amount = pct_of(split.royalty_owed, creator.share as u64)?;
        if amount == 0 {
            continue;
        }
        let after = checked_add(creator.lamports, amount)?;
        if after < royalty.creator_rent_exempt_min {
            split.skipped_creators += 1;
            continue;
        }
        split.royalty_paid = checked_add(split.royalty_paid, amount)?;
        split
            .creator_payouts
            .try_push(CreatorPayout {
                creator: creator.address,
                amount,
            })
            .map_err(|_| AmmError::InvalidCreatorShares)?;
    }
    Ok(())
}
