//! Per-pool quote report

use crate::book::{sweep, Sweep};
use crate::config::{Config, PoolSnapshot};
use anyhow::{anyhow, Result};
use nftamm_common::{AmmError, PoolType, QuoteLevel, Side};
use nftamm_engine::quote::build_ladder;
use nftamm_engine::{bid_budget, estimate_bulk_cost, estimate_max_bids, PoolStatus};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Level {
    pub price: u64,
    pub cumulative: u64,
}

impl From<&QuoteLevel> for Level {
    fn from(level: &QuoteLevel) -> Self {
        Self {
            price: level.price,
            cumulative: level.cumulative,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PoolReport {
    pub address: String,
    pub pool_type: &'static str,
    pub status: &'static str,
    pub price_offset: i32,
    pub nfts_held: u32,
    /// Lamports available for bids after rent
    pub spendable: u64,
    pub asks: Vec<Level>,
    pub bids: Vec<Level>,
    pub spread: Option<u64>,
    pub max_bids: u32,
    /// Cost of buying `nfts_held` NFTs in a row, mm fee included
    pub bulk_buy_cost: Option<u64>,
    /// Proceeds of selling `max_bids` NFTs in a row, mm fee included
    pub bulk_sell_value: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub royalty_fee_bps: u16,
    pub pools: Vec<PoolReport>,
    pub buy_sweep: Sweep,
    pub sell_sweep: Sweep,
}

fn pool_type_name(pool_type: PoolType) -> &'static str {
    match pool_type {
        PoolType::Token => "token",
        PoolType::NFT => "nft",
        PoolType::Trade => "trade",
    }
}

fn status_name(status: PoolStatus) -> &'static str {
    match status {
        PoolStatus::Open => "open",
        PoolStatus::Depleted => "depleted",
        PoolStatus::Closed => "closed",
    }
}

/// Quote one pool
pub fn pool_report(snapshot: &PoolSnapshot, royalty_fee_bps: u16, depth: usize) -> Result<PoolReport> {
    let pool = &snapshot.pool;
    let address = bs58::encode(pool.address).into_string();
    let engine_err = |e: AmmError| anyhow!("pool {}: {}", address, e);

    let ladder = build_ladder(pool, &snapshot.funds, royalty_fee_bps).map_err(engine_err)?;
    let max_bids = estimate_max_bids(pool, &snapshot.funds);
    let bulk_buy_cost = estimate_bulk_cost(pool, Side::Buy, pool.state.nfts_held).map_err(engine_err)?;
    let bulk_sell_value = estimate_bulk_cost(pool, Side::Sell, max_bids).map_err(engine_err)?;

    Ok(PoolReport {
        address: address.clone(),
        pool_type: pool_type_name(pool.config.pool_type),
        status: status_name(pool.state.status),
        price_offset: pool.state.price_offset,
        nfts_held: pool.state.nfts_held,
        spendable: bid_budget(pool, &snapshot.funds),
        asks: ladder.asks().iter().take(depth).map(Level::from).collect(),
        bids: ladder.bids().iter().take(depth).map(Level::from).collect(),
        spread: ladder.spread(),
        max_bids,
        bulk_buy_cost,
        bulk_sell_value,
    })
}

/// Quote every pool and route both sweeps
pub fn build(config: &Config, snapshots: &[PoolSnapshot]) -> Result<Report> {
    let pools = snapshots
        .iter()
        .map(|snapshot| pool_report(snapshot, config.royalty_fee_bps, config.ladder_depth))
        .collect::<Result<Vec<_>>>()?;

    let buy_sweep = sweep(snapshots, Side::Buy, config.sweep_quantity, config.royalty_fee_bps)?;
    let sell_sweep = sweep(snapshots, Side::Sell, config.sweep_quantity, config.royalty_fee_bps)?;

    Ok(Report {
        royalty_fee_bps: config.royalty_fee_bps,
        pools,
        buy_sweep,
        sell_sweep,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_report() {
        let config = Config::demo();
        let snapshots = config.snapshots().unwrap();
        let report = build(&config, &snapshots).unwrap();

        assert_eq!(report.pools.len(), 3);
        let trade = &report.pools[0];
        assert_eq!(trade.pool_type, "trade");
        assert_eq!(trade.asks.len(), 3);
        assert!(trade.spread.is_some());

        let nft = &report.pools[1];
        assert!(nft.bids.is_empty());
        assert_eq!(nft.max_bids, 0);
        assert_eq!(nft.bulk_sell_value, None);

        let token = &report.pools[2];
        assert!(token.asks.is_empty());
        assert!(token.max_bids <= 10);

        assert!(report.buy_sweep.is_complete());
        assert!(report.sell_sweep.fills.len() <= config.sweep_quantity as usize);
    }

    #[test]
    fn test_ladder_depth_limits_levels() {
        let config = Config::demo();
        let snapshots = config.snapshots().unwrap();
        let report = pool_report(&snapshots[1], 0, 2).unwrap();
        assert_eq!(report.asks.len(), 2);
        assert_eq!(report.asks[0].price, 950_000_000);
        assert_eq!(report.asks[1].cumulative, 1_950_000_000);
    }

    #[test]
    fn test_report_serializes() {
        let config = Config::demo();
        let snapshots = config.snapshots().unwrap();
        let report = build(&config, &snapshots).unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["pools"][0]["pool_type"], "trade");
        assert_eq!(json["buy_sweep"]["side"], "buy");
    }
}
