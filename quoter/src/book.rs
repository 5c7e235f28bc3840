//! Cross-pool sweep routing (best price first)

use crate::config::PoolSnapshot;
use anyhow::{anyhow, Result};
use nftamm_common::Side;
use nftamm_engine::{quote_ask, quote_bid};
use priority_queue::PriorityQueue;
use serde::Serialize;

/// One NFT routed to one pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fill {
    /// Index of the pool in the snapshot list
    pub pool_index: usize,
    /// Pool address (base58)
    pub pool: String,
    /// Taker price including mm fee and royalty
    pub price: u64,
}

/// Outcome of routing a multi-NFT order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Sweep {
    pub side: &'static str,
    pub requested: u32,
    pub fills: Vec<Fill>,
    /// Sum of fill prices
    pub total: u64,
}

impl Sweep {
    /// Whether every requested NFT found a pool
    pub fn is_complete(&self) -> bool {
        self.fills.len() == self.requested as usize
    }
}

/// Best next quote of every pool, keyed by pool index
///
/// Buys pop the cheapest ask, sells the richest bid. Priorities are signed
/// so the same max-heap serves both sides.
pub struct SweepBook<'a> {
    side: Side,
    royalty_fee_bps: u16,
    pools: &'a [PoolSnapshot],
    queue: PriorityQueue<usize, i128>,
    /// Trades already routed to each pool
    taken: Vec<u32>,
}

impl<'a> SweepBook<'a> {
    pub fn new(pools: &'a [PoolSnapshot], side: Side, royalty_fee_bps: u16) -> Result<Self> {
        let mut book = Self {
            side,
            royalty_fee_bps,
            pools,
            queue: PriorityQueue::new(),
            taken: vec![0; pools.len()],
        };
        for index in 0..pools.len() {
            book.requeue(index)?;
        }
        Ok(book)
    }

    fn quote(&self, index: usize) -> Result<Option<u64>> {
        let snapshot = &self.pools[index];
        let extra = self.taken[index];
        let price = match self.side {
            Side::Buy => quote_ask(&snapshot.pool, self.royalty_fee_bps, extra, false),
            Side::Sell => quote_bid(
                &snapshot.pool,
                &snapshot.funds,
                self.royalty_fee_bps,
                extra,
                false,
            ),
        };
        price.map_err(|e| anyhow!("quote failed for pool #{}: {}", index, e))
    }

    /// Queue the pool's next quote, or drop it once it has none
    fn requeue(&mut self, index: usize) -> Result<()> {
        match self.quote(index)? {
            Some(price) => {
                let priority = match self.side {
                    Side::Buy => -(price as i128),
                    Side::Sell => price as i128,
                };
                self.queue.push(index, priority);
            }
            None => {
                self.queue.remove(&index);
            }
        }
        Ok(())
    }

    /// Best price on offer right now
    pub fn peek(&self) -> Option<(usize, u64)> {
        let (index, priority) = self.queue.peek()?;
        Some((*index, priority.unsigned_abs() as u64))
    }

    /// Take the best quote and move that pool one step along its curve
    pub fn take(&mut self) -> Result<Option<Fill>> {
        let Some((index, price)) = self.peek() else {
            return Ok(None);
        };
        self.taken[index] += 1;
        self.requeue(index)?;

        let pool = bs58::encode(self.pools[index].pool.address).into_string();
        Ok(Some(Fill {
            pool_index: index,
            pool,
            price,
        }))
    }
}

/// Route `quantity` trades on `side` across `pools`, best price first
pub fn sweep(pools: &[PoolSnapshot], side: Side, quantity: u32, royalty_fee_bps: u16) -> Result<Sweep> {
    let mut book = SweepBook::new(pools, side, royalty_fee_bps)?;
    let mut fills = Vec::new();
    let mut total = 0u64;

    while fills.len() < quantity as usize {
        let Some(fill) = book.take()? else {
            log::warn!("Book ran dry after {} of {} fills", fills.len(), quantity);
            break;
        };
        total = total
            .checked_add(fill.price)
            .ok_or_else(|| anyhow!("sweep total overflows u64"))?;
        log::debug!("Routed fill {} to {} at {}", fills.len() + 1, fill.pool, fill.price);
        fills.push(fill);
    }

    Ok(Sweep {
        side: match side {
            Side::Buy => "buy",
            Side::Sell => "sell",
        },
        requested: quantity,
        fills,
        total,
    })
}
