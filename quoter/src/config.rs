//! Quoter configuration and pool snapshots

use anyhow::{Context, Result};
use nftamm_common::{AmmError, Currency, CurveType, PoolType};
use nftamm_engine::{Balance, Pool, PoolConfig, PoolState, PoolStats, PoolStatus};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors turning a configured snapshot into an engine pool
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SnapshotError {
    #[error("invalid {field} address {value:?}: {reason}")]
    InvalidAddress {
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("pool {address} rejected: {reason}")]
    InvalidPool { address: String, reason: AmmError },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoolKind {
    Token,
    Nft,
    Trade,
}

impl From<PoolKind> for PoolType {
    fn from(kind: PoolKind) -> Self {
        match kind {
            PoolKind::Token => PoolType::Token,
            PoolKind::Nft => PoolType::NFT,
            PoolKind::Trade => PoolType::Trade,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CurveKind {
    Linear,
    Exponential,
}

impl From<CurveKind> for CurveType {
    fn from(kind: CurveKind) -> Self {
        match kind {
            CurveKind::Linear => CurveType::Linear,
            CurveKind::Exponential => CurveType::Exponential,
        }
    }
}

/// Pool account contents as read off-chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolSpec {
    /// Pool address (base58)
    pub address: String,

    /// Owner address (base58)
    pub owner: String,

    pub pool_type: PoolKind,
    pub curve: CurveKind,

    /// Starting price in lamports
    pub starting_price: u64,

    /// Lamports (linear) or basis points (exponential)
    pub delta: u64,

    /// Trade pools only
    #[serde(default)]
    pub mm_fee_bps: Option<u16>,

    #[serde(default)]
    pub mm_compound_fees: bool,

    #[serde(default)]
    pub price_offset: i32,

    #[serde(default)]
    pub nfts_held: u32,

    /// Lamports held by the pool on top of its rent
    #[serde(default)]
    pub amount: u64,

    #[serde(default)]
    pub max_taker_sell_count: u32,

    /// Shared escrow address (base58), if the pool is on one
    #[serde(default)]
    pub shared_escrow: Option<String>,

    /// Total lamports of the shared escrow account
    #[serde(default)]
    pub escrow_lamports: u64,
}

/// A pool together with the balance that funds its bids
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolSnapshot {
    pub pool: Pool,
    pub funds: Balance,
}

fn decode_pubkey(field: &'static str, value: &str) -> Result<[u8; 32], SnapshotError> {
    let invalid = |reason: String| SnapshotError::InvalidAddress {
        field,
        value: value.to_string(),
        reason,
    };
    let bytes = bs58::decode(value)
        .into_vec()
        .map_err(|e| invalid(e.to_string()))?;
    let len = bytes.len();
    bytes
        .try_into()
        .map_err(|_| invalid(format!("expected 32 bytes, got {}", len)))
}

impl PoolSpec {
    /// Build and validate the engine pool plus its funding balance
    pub fn snapshot(&self, rent_exempt_min: u64) -> Result<PoolSnapshot, SnapshotError> {
        let address = decode_pubkey("pool", &self.address)?;
        let owner = decode_pubkey("owner", &self.owner)?;
        let shared_escrow = self
            .shared_escrow
            .as_deref()
            .map(|escrow| decode_pubkey("shared_escrow", escrow))
            .transpose()?;

        let config = PoolConfig {
            pool_type: self.pool_type.into(),
            curve_type: self.curve.into(),
            starting_price: self.starting_price,
            delta: self.delta,
            mm_compound_fees: self.mm_compound_fees,
            mm_fee_bps: self.mm_fee_bps,
        };
        config.validate().map_err(|reason| SnapshotError::InvalidPool {
            address: self.address.clone(),
            reason,
        })?;

        let mut pool = Pool {
            address,
            owner,
            rent_payer: owner,
            config,
            state: PoolState {
                price_offset: self.price_offset,
                amount: if shared_escrow.is_some() { 0 } else { self.amount },
                nfts_held: self.nfts_held,
                stats: PoolStats::default(),
                shared_escrow,
                currency: Currency::Sol,
                status: PoolStatus::Open,
            },
            cosigner: None,
            maker_broker: None,
            max_taker_sell_count: self.max_taker_sell_count,
        };
        pool.refresh_status();

        let funds = match shared_escrow {
            Some(_) => Balance::new(self.escrow_lamports, rent_exempt_min),
            None => Balance::for_pool(&pool, rent_exempt_min),
        };
        Ok(PoolSnapshot { pool, funds })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Creator royalty applied to every quote (bps)
    pub royalty_fee_bps: u16,

    /// Ask/bid levels printed per pool
    pub ladder_depth: usize,

    /// NFTs to route across pools in the sweep
    pub sweep_quantity: u32,

    /// Rent-exempt minimum of pool and escrow accounts
    pub rent_exempt_min: u64,

    #[serde(default)]
    pub pools: Vec<PoolSpec>,
}

impl Config {
    /// Load configuration from TOML file
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("QUOTER_CONFIG")
            .unwrap_or_else(|_| "quoter-config.toml".to_string());
        let expanded = shellexpand::tilde(&config_path);

        let config_str = std::fs::read_to_string(expanded.as_ref())
            .context(format!("Failed to read config file: {}", config_path))?;

        let config: Config = toml::from_str(&config_str)
            .context("Failed to parse config TOML")?;

        Ok(config)
    }

    /// Built-in demo book: one pool of each type
    pub fn demo() -> Self {
        Self {
            royalty_fee_bps: 500,
            ladder_depth: 5,
            sweep_quantity: 6,
            rent_exempt_min: 2_039_280,
            pools: vec![
                PoolSpec {
                    address: "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA".to_string(),
                    owner: "metaqbxxUerdq28cj1RbAWkYQm3ybzjb6a8bt518x1s".to_string(),
                    pool_type: PoolKind::Trade,
                    curve: CurveKind::Exponential,
                    starting_price: 1_000_000_000,
                    delta: 100,
                    mm_fee_bps: Some(458),
                    mm_compound_fees: true,
                    price_offset: 0,
                    nfts_held: 3,
                    amount: 10_000_000_000,
                    max_taker_sell_count: 0,
                    shared_escrow: None,
                    escrow_lamports: 0,
                },
                PoolSpec {
                    address: "9xQeWvG816bUx9EPjHmaT23yvVM2ZWbrrpZb9PusVFin".to_string(),
                    owner: "metaqbxxUerdq28cj1RbAWkYQm3ybzjb6a8bt518x1s".to_string(),
                    pool_type: PoolKind::Nft,
                    curve: CurveKind::Linear,
                    starting_price: 950_000_000,
                    delta: 50_000_000,
                    mm_fee_bps: None,
                    mm_compound_fees: false,
                    price_offset: 0,
                    nfts_held: 4,
                    amount: 0,
                    max_taker_sell_count: 0,
                    shared_escrow: None,
                    escrow_lamports: 0,
                },
                PoolSpec {
                    address: "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v".to_string(),
                    owner: "metaqbxxUerdq28cj1RbAWkYQm3ybzjb6a8bt518x1s".to_string(),
                    pool_type: PoolKind::Token,
                    curve: CurveKind::Linear,
                    starting_price: 900_000_000,
                    delta: 25_000_000,
                    mm_fee_bps: None,
                    mm_compound_fees: false,
                    price_offset: 0,
                    nfts_held: 0,
                    amount: 0,
                    max_taker_sell_count: 10,
                    shared_escrow: Some("So11111111111111111111111111111111111111112".to_string()),
                    escrow_lamports: 3_000_000_000,
                },
            ],
        }
    }

    /// Write the demo config to file
    pub fn write_default(path: &str) -> Result<()> {
        let config = Self::demo();
        let toml_str = toml::to_string_pretty(&config)
            .context("Failed to serialize config")?;

        std::fs::write(path, toml_str)
            .context(format!("Failed to write config to {}", path))?;

        log::info!("Created default config at {}", path);
        Ok(())
    }

    /// Snapshot every configured pool, failing on the first bad one
    pub fn snapshots(&self) -> Result<Vec<PoolSnapshot>, SnapshotError> {
        self.pools
            .iter()
            .map(|spec| spec.snapshot(self.rent_exempt_min))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_config_snapshots() {
        let config = Config::demo();
        let snapshots = config.snapshots().unwrap();
        assert_eq!(snapshots.len(), 3);

        let trade = &snapshots[0];
        assert_eq!(trade.pool.config.pool_type, PoolType::Trade);
        assert_eq!(trade.funds.spendable(), 10_000_000_000);

        let token = &snapshots[2];
        assert!(token.pool.uses_shared_escrow());
        assert_eq!(token.funds.spendable(), 3_000_000_000 - 2_039_280);
    }

    #[test]
    fn test_config_toml_round_trip() {
        let config = Config::demo();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.pools, config.pools);
        assert_eq!(parsed.sweep_quantity, config.sweep_quantity);
    }

    #[test]
    fn test_minimal_pool_entry() {
        let parsed: Config = toml::from_str(
            r#"
            royalty_fee_bps = 0
            ladder_depth = 3
            sweep_quantity = 1
            rent_exempt_min = 0

            [[pools]]
            address = "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA"
            owner = "metaqbxxUerdq28cj1RbAWkYQm3ybzjb6a8bt518x1s"
            pool_type = "nft"
            curve = "linear"
            starting_price = 100
            delta = 10
            nfts_held = 2
            "#,
        )
        .unwrap();
        let snapshot = parsed.pools[0].snapshot(0).unwrap();
        assert_eq!(snapshot.pool.state.nfts_held, 2);
        assert_eq!(snapshot.pool.config.mm_fee_bps, None);
    }

    #[test]
    fn test_bad_address_rejected() {
        let mut spec = Config::demo().pools[0].clone();
        spec.address = "not-base58!".to_string();
        assert!(matches!(
            spec.snapshot(0),
            Err(SnapshotError::InvalidAddress { field: "pool", .. })
        ));

        // Valid base58 but only a few bytes long
        spec.address = "abc".to_string();
        assert!(matches!(
            spec.snapshot(0),
            Err(SnapshotError::InvalidAddress { field: "pool", .. })
        ));
    }

    #[test]
    fn test_invalid_pool_rejected() {
        let mut spec = Config::demo().pools[1].clone();
        spec.mm_fee_bps = Some(100);
        assert_eq!(
            spec.snapshot(0).map(|_| ()),
            Err(SnapshotError::InvalidPool {
                address: spec.address.clone(),
                reason: AmmError::InvalidMmFee,
            })
        );
    }
}
