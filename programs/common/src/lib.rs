//! Shared types for the NFT AMM engine and its off-chain clients
//!
//! Everything here is `no_std` and free of account plumbing so it can be
//! linked into the on-chain program as well as the quoter.

#![no_std]

pub mod error;
pub mod math;
pub mod quote_ladder;
pub mod types;

pub use error::*;
pub use math::*;
pub use quote_ladder::*;
pub use types::*;
