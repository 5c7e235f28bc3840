//! NFT AMM engine - bonding-curve pricing and pool settlement
//!
//! Pools quote asks and bids off a Linear or Exponential bonding curve and
//! settle trades against their own currency or a shared escrow. The engine
//! is pure: it takes a `Pool` value and returns the next one together with
//! the lamport movements the instruction layer has to carry out.
//!
//! - `curve`: price points and sums along the curve
//! - `price`: taker-facing ask and bid of a pool
//! - `fees`: taker fee, broker and royalty split
//! - `settlement`: buy and sell state machine
//! - `escrow`: funding accounts and rent reservation
//! - `estimate`: how many bids a balance can fund
//! - `lifecycle`: create, edit, deposit, withdraw, close
//! - `quote`: external quoting and settlement interface

#![cfg_attr(target_os = "solana", no_std)]
#![allow(clippy::arithmetic_side_effects)]

pub mod curve;
pub mod escrow;
pub mod estimate;
pub mod fees;
pub mod lifecycle;
pub mod price;
pub mod quote;
pub mod settlement;
pub mod state;

pub use escrow::{bid_budget, Balance, FundsSource, RentExemption, RentSchedule, SharedEscrow};
pub use fees::{BrokerParams, CreatorAccount, FeeRates, FeeSplit, RoyaltyParams};
pub use lifecycle::{CreatePool, EditPool};
pub use quote::*;
pub use settlement::{ClosePlan, Settlement, TradeAuthority, TradeParams};
pub use state::*;
