//! Quote ladder - consecutive ask/bid levels for display and routing

/// Number of levels kept per side
pub const LADDER_DEPTH: usize = 8;

/// Single price level on the curve
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QuoteLevel {
    /// Taker-facing price for this NFT (lamports)
    pub price: u64,
    /// Running total including this level (lamports)
    pub cumulative: u64,
}

/// Ladder of the next asks (ascending) and bids (descending) a pool would quote
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QuoteLadder {
    /// Pool price offset the ladder was built from
    pub price_offset: i32,
    /// Populated ask levels
    pub ask_levels: u8,
    /// Populated bid levels
    pub bid_levels: u8,
    /// Padding
    pub _padding: [u8; 2],
    pub asks: [QuoteLevel; LADDER_DEPTH],
    pub bids: [QuoteLevel; LADDER_DEPTH],
}

impl QuoteLadder {
    pub const LEN: usize = core::mem::size_of::<Self>();

    /// Create an empty ladder anchored at `price_offset`
    pub fn new(price_offset: i32) -> Self {
        Self {
            price_offset,
            ..Self::default()
        }
    }

    /// Append an ask level; returns false once the side is full
    pub fn push_ask(&mut self, price: u64) -> bool {
        let idx = self.ask_levels as usize;
        if idx >= LADDER_DEPTH {
            return false;
        }
        let prev = if idx == 0 { 0 } else { self.asks[idx - 1].cumulative };
        let Some(cumulative) = prev.checked_add(price) else {
            return false;
        };
        self.asks[idx] = QuoteLevel { price, cumulative };
        self.ask_levels += 1;
        true
    }

    /// Append a bid level; returns false once the side is full
    pub fn push_bid(&mut self, price: u64) -> bool {
        let idx = self.bid_levels as usize;
        if idx >= LADDER_DEPTH {
            return false;
        }
        let prev = if idx == 0 { 0 } else { self.bids[idx - 1].cumulative };
        let Some(cumulative) = prev.checked_add(price) else {
            return false;
        };
        self.bids[idx] = QuoteLevel { price, cumulative };
        self.bid_levels += 1;
        true
    }

    /// Populated ask levels
    pub fn asks(&self) -> &[QuoteLevel] {
        &self.asks[..self.ask_levels as usize]
    }

    /// Populated bid levels
    pub fn bids(&self) -> &[QuoteLevel] {
        &self.bids[..self.bid_levels as usize]
    }

    /// Best (lowest) ask
    pub fn best_ask(&self) -> Option<u64> {
        self.asks().first().map(|l| l.price)
    }

    /// Best (highest) bid
    pub fn best_bid(&self) -> Option<u64> {
        self.bids().first().map(|l| l.price)
    }

    /// Distance between best ask and best bid, when both exist
    pub fn spread(&self) -> Option<u64> {
        Some(self.best_ask()?.saturating_sub(self.best_bid()?))
    }
}
