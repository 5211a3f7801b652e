// Transaction cost models
// Ask-side fill walk, Almgren-Chriss style market impact and the maker/taker logistic model

use serde::{Deserialize, Serialize};

use crate::simulation::order_book::PriceLevel;

/// Result of walking the ask side for a market buy
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AskFill {
    /// Notional paid for the filled part
    pub cost: f64,
    /// Quantity actually filled from visible depth
    pub filled: f64,
    /// Number of levels touched
    pub levels: usize,
}

impl AskFill {
    pub fn is_complete(&self, quantity: f64) -> bool {
        self.filled >= quantity
    }
}

/// Walk the asks best to worst, taking liquidity until `quantity` is filled
/// or the visible levels run out.
pub fn walk_asks(quantity: f64, asks: &[PriceLevel]) -> AskFill {
    let mut fill = AskFill::default();
    let mut remaining = quantity;

    for level in asks {
        if remaining <= 0.0 {
            break;
        }

        let take = remaining.min(level.size);
        fill.cost += take * level.price;
        fill.filled += take;
        fill.levels += 1;
        remaining -= take;
    }

    fill
}

/// Expected slippage per unit against the best bid.
///
/// The fill cost is divided by the full requested quantity even when the book
/// could not fill it, so thin books report a lower figure than a full fill would.
pub fn slippage_per_unit(quantity: f64, fill: &AskFill, best_bid: f64) -> f64 {
    fill.cost / quantity - best_bid
}

/// Flat notional fee
pub fn flat_fee(quantity: f64, fee_tier: f64) -> f64 {
    quantity * fee_tier
}

/// Simplified Almgren-Chriss impact model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImpactModel {
    /// Temporary impact coefficient
    pub eta: f64,
    /// Permanent impact coefficient
    pub gamma: f64,
    /// Execution horizon in seconds
    pub horizon_secs: f64,
}

impl Default for ImpactModel {
    fn default() -> Self {
        Self {
            eta: 0.01,
            gamma: 0.0001,
            horizon_secs: 1.0,
        }
    }
}

impl ImpactModel {
    /// `eta*q + gamma*q^2 + volatility*sqrt(q)/sqrt(T)`
    pub fn market_impact(&self, quantity: f64, volatility: f64) -> f64 {
        let temporary = self.eta * quantity;
        let permanent = self.gamma * quantity * quantity;
        let risk = volatility * quantity.sqrt() / self.horizon_secs.sqrt();

        temporary + permanent + risk
    }
}

/// Logistic maker/taker split: `1 / (1 + exp(-(a*q - b*vol + c)))`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MakerTakerModel {
    pub a: f64,
    pub b: f64,
    pub c: f64,
}

impl Default for MakerTakerModel {
    fn default() -> Self {
        Self {
            a: 0.005,
            b: 0.1,
            c: 2.0,
        }
    }
}

impl MakerTakerModel {
    pub fn ratio(&self, quantity: f64, volatility: f64) -> f64 {
        let z = self.a * quantity - self.b * volatility + self.c;
        1.0 / (1.0 + (-z).exp())
    }
}
