//! Core enums shared by the engine and its clients

use pinocchio::pubkey::Pubkey;

/// Taker side of a trade
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    /// Taker buys an NFT out of the pool
    Buy = 0,
    /// Taker sells an NFT into the pool
    Sell = 1,
}

impl Side {
    /// Direction the bonding curve moves after a trade on this side
    #[inline]
    pub const fn curve_direction(self) -> Direction {
        match self {
            Side::Buy => Direction::Up,
            Side::Sell => Direction::Down,
        }
    }
}

/// Which side(s) of the market a pool serves
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PoolType {
    /// Holds currency, buys NFTs from takers
    Token = 0,
    /// Holds NFTs, sells them to takers
    NFT = 1,
    /// Holds both and earns the mm fee on every trade
    Trade = 2,
}

impl PoolType {
    /// Whether takers can buy NFTs from this pool
    #[inline]
    pub const fn serves_asks(self) -> bool {
        matches!(self, PoolType::NFT | PoolType::Trade)
    }

    /// Whether takers can sell NFTs into this pool
    #[inline]
    pub const fn serves_bids(self) -> bool {
        matches!(self, PoolType::Token | PoolType::Trade)
    }

    /// Whether the pool tracks a currency balance of its own
    #[inline]
    pub const fn holds_currency(self) -> bool {
        self.serves_bids()
    }
}

/// Bonding curve shape
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CurveType {
    /// Fixed lamport step per trade
    Linear = 0,
    /// Fixed basis-point step per trade
    Exponential = 1,
}

/// Walking direction along the curve
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

/// Settlement asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Currency {
    /// Native lamports
    #[default]
    Sol,
    /// SPL token mint
    Spl(Pubkey),
}

/// NFT standard of the traded asset; decides whether royalties are optional
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenStandard {
    /// Legacy metadata, royalties follow the caller's optional percentage
    NonFungible,
    /// Programmable NFT, royalties are always paid in full
    ProgrammableNonFungible,
}

impl TokenStandard {
    /// True when the standard enforces full royalties
    #[inline]
    pub const fn enforces_royalties(self) -> bool {
        matches!(self, TokenStandard::ProgrammableNonFungible)
    }
}
