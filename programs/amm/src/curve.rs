//! Bonding curve math
//!
//! Price points are indexed by a signed offset from the starting price.
//! Positive offsets sit above the starting price (more taker buys than
//! sells), negative offsets below it.
//!
//! - Linear: `p(k) = starting_price + k * delta`
//! - Exponential: `p(k) = starting_price * (1 - delta / 10_000)^(-k)`,
//!   evaluated one step at a time with floor division at every step
//!
//! A Linear point at or below zero means the curve is exhausted and is
//! reported as `None`. Exponential curves converge toward zero and never run
//! out; once a point floors to zero every later point is zero too.
//!
//! Flooring also pins small Exponential prices. When `p * delta` is below
//! `10_000 - delta` an up step floors back to `p`, so the curve stops rising:
//! starting at 100 with a 50 bps delta every ask is 100. Down steps still
//! move such prices until they reach zero.

use crate::state::PoolConfig;
use nftamm_common::{checked_add, checked_mul, AmmError, CurveType, Direction, HUNDRED_PCT_BPS};

/// Sum of consecutive price points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PointSum {
    /// Sum of the valid points
    pub total: u64,
    /// Number of valid points summed (less than requested if the curve ran out)
    pub count: u32,
}

/// Price point at `offset` steps from the starting price.
///
/// # Returns
/// * `Ok(Some(price))` for a valid point
/// * `Ok(None)` when a Linear curve is exhausted (point would be <= 0)
/// * `Err(ArithmeticOverflow)` when the point does not fit in a u64
pub fn price_point(config: &PoolConfig, offset: i32) -> Result<Option<u64>, AmmError> {
    let steps = offset.unsigned_abs() as u64;
    let direction = if offset >= 0 { Direction::Up } else { Direction::Down };

    match config.curve_type {
        CurveType::Linear => linear_point(config.starting_price, config.delta, steps, direction),
        CurveType::Exponential => {
            let mut price = config.starting_price;
            for _ in 0..steps {
                let next = exponential_step(price, config.delta, direction)?;
                // Fixed point: floor division can no longer move the price
                if next == price {
                    break;
                }
                price = next;
            }
            Ok(Some(price))
        }
    }
}

fn linear_point(
    starting_price: u64,
    delta: u64,
    steps: u64,
    direction: Direction,
) -> Result<Option<u64>, AmmError> {
    match direction {
        Direction::Up => {
            let shift = checked_mul(delta, steps)?;
            checked_add(starting_price, shift).map(Some)
        }
        Direction::Down => {
            // A shift too large for u64 is certainly past the starting price
            let Some(shift) = delta.checked_mul(steps) else {
                return Ok(None);
            };
            match starting_price.checked_sub(shift) {
                Some(price) if price > 0 => Ok(Some(price)),
                _ => Ok(None),
            }
        }
    }
}

/// One multiplicative step away from the starting price, floored.
fn exponential_step(price: u64, delta_bps: u64, direction: Direction) -> Result<u64, AmmError> {
    let keep_bps = HUNDRED_PCT_BPS
        .checked_sub(delta_bps)
        .filter(|bps| *bps > 0)
        .ok_or(AmmError::InvalidDelta)?;

    let wide = match direction {
        Direction::Down => (price as u128) * (keep_bps as u128) / (HUNDRED_PCT_BPS as u128),
        Direction::Up => (price as u128) * (HUNDRED_PCT_BPS as u128) / (keep_bps as u128),
    };
    u64::try_from(wide).map_err(|_| AmmError::ArithmeticOverflow)
}

/// Inward Exponential points precomputed per refill of a `CurveWalk`
const INWARD_BLOCK: usize = 64;

/// Iterator over successive price points walking in one direction.
///
/// Steps away from the starting price are taken incrementally. Floor division
/// cannot be inverted, so Exponential points on the way back toward the
/// starting price are rebuilt by stepping out from a recomputed point. This
/// happens in blocks of `INWARD_BLOCK` offsets: an inward walk of `n` points
/// from offset `k` costs about `|k| * n / INWARD_BLOCK` steps rather than
/// `|k| * n`. Linear points are O(1) at any offset. Every yielded point equals
/// `price_point` at the same offset.
pub struct CurveWalk<'a> {
    config: &'a PoolConfig,
    next_offset: i32,
    direction: Direction,
    last: Option<(i32, u64)>,
    done: bool,
    /// Upcoming inward points, the next one at `inward[inward_len - 1]`
    inward: [u64; INWARD_BLOCK],
    inward_len: usize,
}

impl<'a> CurveWalk<'a> {
    pub fn new(config: &'a PoolConfig, start_offset: i32, direction: Direction) -> Self {
        Self {
            config,
            next_offset: start_offset,
            direction,
            last: None,
            done: false,
            inward: [0; INWARD_BLOCK],
            inward_len: 0,
        }
    }

    /// Offset of the point the next call to `next` yields
    pub fn next_offset(&self) -> i32 {
        self.next_offset
    }

    fn point_at(&mut self, offset: i32) -> Result<Option<u64>, AmmError> {
        if self.config.curve_type != CurveType::Exponential {
            return price_point(self.config, offset);
        }
        if let Some((last_offset, last_price)) = self.last {
            let moving_out = match self.direction {
                Direction::Up => last_offset >= 0,
                Direction::Down => last_offset <= 0,
            };
            if moving_out && offset.abs_diff(last_offset) == 1 {
                return exponential_step(last_price, self.config.delta, self.direction).map(Some);
            }
        }
        let inward = match self.direction {
            Direction::Up => offset < 0,
            Direction::Down => offset > 0,
        };
        if !inward {
            return price_point(self.config, offset);
        }
        if self.inward_len == 0 {
            self.fill_inward(offset)?;
        }
        self.inward_len -= 1;
        Ok(Some(self.inward[self.inward_len]))
    }

    /// Precompute the inward points from `offset` toward the starting price,
    /// stopping short of offset 0.
    fn fill_inward(&mut self, offset: i32) -> Result<(), AmmError> {
        let span = (INWARD_BLOCK - 1) as i32;
        let (base, outward) = match self.direction {
            Direction::Down => (offset.saturating_sub(span).max(1), Direction::Up),
            Direction::Up => (offset.saturating_add(span).min(-1), Direction::Down),
        };
        let len = offset.abs_diff(base) as usize + 1;
        let mut price = price_point(self.config, base)?.ok_or(AmmError::CurveExhausted)?;
        self.inward[0] = price;
        for slot in self.inward[1..len].iter_mut() {
            price = exponential_step(price, self.config.delta, outward)?;
            *slot = price;
        }
        self.inward_len = len;
        Ok(())
    }
}

impl Iterator for CurveWalk<'_> {
    type Item = Result<u64, AmmError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let offset = self.next_offset;
        let point = match self.point_at(offset) {
            Ok(Some(price)) => price,
            Ok(None) => {
                self.done = true;
                return None;
            }
            Err(e) => {
                self.done = true;
                return Some(Err(e));
            }
        };

        let advanced = match self.direction {
            Direction::Up => offset.checked_add(1),
            Direction::Down => offset.checked_sub(1),
        };
        match advanced {
            Some(next) => self.next_offset = next,
            None => self.done = true,
        }
        self.last = Some((offset, point));
        Some(Ok(point))
    }
}

/// Sum of `n` consecutive price points starting at `start_offset`.
///
/// Stops early when a Linear curve runs out; `count` tells the caller how
/// many points were actually summed.
pub fn sum_of_n_points(
    config: &PoolConfig,
    start_offset: i32,
    n: u32,
    direction: Direction,
) -> Result<PointSum, AmmError> {
    sum_points_with(config, start_offset, n, direction, Ok)
}

/// Like `sum_of_n_points`, mapping every raw point through `price_of` first.
pub fn sum_points_with<F>(
    config: &PoolConfig,
    start_offset: i32,
    n: u32,
    direction: Direction,
    mut price_of: F,
) -> Result<PointSum, AmmError>
where
    F: FnMut(u64) -> Result<u64, AmmError>,
{
    let mut sum = PointSum::default();
    for point in CurveWalk::new(config, start_offset, direction).take(n as usize) {
        let price = price_of(point?)?;
        sum.total = checked_add(sum.total, price)?;
        sum.count += 1;
    }
    Ok(sum)
}
