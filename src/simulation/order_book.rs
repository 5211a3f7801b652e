// Order book snapshot
// One immutable capture of the bid/ask ladder as delivered by the feed

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single (price, size) level of the ladder
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceLevel {
    pub price: f64,
    pub size: f64,
}

impl PriceLevel {
    pub fn new(price: f64, size: f64) -> Self {
        Self { price, size }
    }
}

impl From<(f64, f64)> for PriceLevel {
    fn from((price, size): (f64, f64)) -> Self {
        Self { price, size }
    }
}

/// Order book snapshot (full state)
///
/// Bids are expected best-first (descending price) and asks best-first
/// (ascending price). The feed delivers them sorted; nothing here re-sorts,
/// so element 0 of each side is treated as the top of book.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBookSnapshot {
    symbol: String,
    bids: Vec<PriceLevel>,
    asks: Vec<PriceLevel>,
    captured_at: DateTime<Utc>,
}

impl OrderBookSnapshot {
    pub fn new(
        symbol: impl Into<String>,
        bids: Vec<PriceLevel>,
        asks: Vec<PriceLevel>,
        captured_at: DateTime<Utc>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            bids,
            asks,
            captured_at,
        }
    }

    /// Build a snapshot stamped with the current time
    pub fn captured_now(symbol: impl Into<String>, bids: Vec<PriceLevel>, asks: Vec<PriceLevel>) -> Self {
        Self::new(symbol, bids, asks, Utc::now())
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn bids(&self) -> &[PriceLevel] {
        &self.bids
    }

    pub fn asks(&self) -> &[PriceLevel] {
        &self.asks
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    /// Get best bid (first bid level)
    pub fn best_bid(&self) -> Option<&PriceLevel> {
        self.bids.first()
    }

    /// Get best ask (first ask level)
    pub fn best_ask(&self) -> Option<&PriceLevel> {
        self.asks.first()
    }

    /// Both sides carry at least one level
    pub fn is_two_sided(&self) -> bool {
        !self.bids.is_empty() && !self.asks.is_empty()
    }

    /// Get bid-ask spread
    pub fn spread(&self) -> Option<f64> {
        match (self.best_ask(), self.best_bid()) {
            (Some(ask), Some(bid)) => Some(ask.price - bid.price),
            _ => None,
        }
    }

    /// Get mid price
    pub fn mid_price(&self) -> Option<f64> {
        match (self.best_ask(), self.best_bid()) {
            (Some(ask), Some(bid)) => Some((ask.price + bid.price) / 2.0),
            _ => None,
        }
    }

    /// Total visible size on the bid side
    pub fn bid_depth(&self) -> f64 {
        self.bids.iter().map(|level| level.size).sum()
    }

    /// Total visible size on the ask side
    pub fn ask_depth(&self) -> f64 {
        self.asks.iter().map(|level| level.size).sum()
    }
}
