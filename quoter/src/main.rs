//! NFT AMM Quoter
//!
//! Off-chain tool that loads pool snapshots, prints their ask/bid ladders,
//! bid capacity and bulk costs, and routes a multi-NFT sweep across pools.
//!
//! Usage:
//!   nftamm-quoter                 quote the pools in $QUOTER_CONFIG
//!   nftamm-quoter init <path>     write the demo config to <path>

mod book;
mod config;
mod report;

use anyhow::{Context, Result};
use config::Config;

fn main() -> Result<()> {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if let [command, path] = args.as_slice() {
        if command == "init" {
            return Config::write_default(path);
        }
    }

    log::info!("Starting NFT AMM quoter");

    let config = Config::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config ({:#}), using demo pools", e);
        Config::demo()
    });

    let snapshots = config.snapshots().context("Invalid pool snapshot")?;
    log::info!("Loaded {} pools", snapshots.len());

    let report = report::build(&config, &snapshots)?;

    for pool in &report.pools {
        log::debug!(
            "Pool {}: best ask {:?}, best bid {:?}, max bids {}",
            pool.address,
            pool.asks.first().map(|l| l.price),
            pool.bids.first().map(|l| l.price),
            pool.max_bids
        );
    }
    if !report.buy_sweep.is_complete() {
        log::warn!(
            "Buy sweep filled {} of {} NFTs",
            report.buy_sweep.fills.len(),
            report.buy_sweep.requested
        );
    }

    println!(
        "{}",
        serde_json::to_string_pretty(&report).context("Failed to serialize report")?
    );
    Ok(())
}
