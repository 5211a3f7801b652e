// Simulation Engine
// Turns one order book snapshot plus order parameters into a cost estimate

use std::time::Instant;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error};

use crate::error::ValidationError;
use crate::simulation::cost_models::{self, ImpactModel, MakerTakerModel};
use crate::simulation::order_book::OrderBookSnapshot;

/// Parameters of the hypothetical market order
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrderParams {
    pub quantity: f64,
    pub volatility: f64,
    pub fee_tier: f64,
}

impl OrderParams {
    /// Build validated order parameters
    pub fn new(quantity: f64, volatility: f64, fee_tier: f64) -> Result<Self, ValidationError> {
        let params = Self {
            quantity,
            volatility,
            fee_tier,
        };
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(self.quantity.is_finite() && self.quantity > 0.0) {
            return Err(ValidationError::Quantity(self.quantity));
        }
        if !(self.volatility.is_finite() && self.volatility >= 0.0) {
            return Err(ValidationError::Volatility(self.volatility));
        }
        if !(0.0..=1.0).contains(&self.fee_tier) {
            return Err(ValidationError::FeeTier(self.fee_tier));
        }
        Ok(())
    }
}

/// Cost estimate for one simulated order
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SimulationResult {
    pub slippage_per_unit: f64,
    pub fees: f64,
    pub market_impact: f64,
    /// `slippage_per_unit + fees + market_impact`; the maker/taker ratio is not part of it
    pub net_cost: f64,
    pub maker_taker_ratio: f64,
    /// Engine compute time in whole milliseconds. Sub-millisecond runs report 0.
    pub compute_latency_ms: f64,
}

impl SimulationResult {
    pub fn is_zero(&self) -> bool {
        *self == Self::default()
    }

    fn is_finite(&self) -> bool {
        [
            self.slippage_per_unit,
            self.fees,
            self.market_impact,
            self.net_cost,
            self.maker_taker_ratio,
        ]
        .iter()
        .all(|v| v.is_finite())
    }
}

/// Unexpected failure inside a computation. Never leaves the engine.
#[derive(Debug, Error)]
enum ComputeError {
    #[error("non-finite {0} computed")]
    NonFinite(&'static str),

    #[error("book lost a side during computation")]
    MissingSide,
}

/// Cost model configuration for the engine
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SimulationConfig {
    pub impact: ImpactModel,
    pub maker_taker: MakerTakerModel,
}

/// Stateless cost estimator
#[derive(Debug, Clone, Default)]
pub struct SimulationEngine {
    config: SimulationConfig,
}

impl SimulationEngine {
    pub fn new(config: SimulationConfig) -> Self {
        Self { config }
    }

    /// Create simulation engine with default model constants
    pub fn with_default_config() -> Self {
        Self::new(SimulationConfig::default())
    }

    /// Estimate the cost of a market buy of `quantity` against `snapshot`.
    ///
    /// Invalid parameters are the only error. A missing or one-sided book gives
    /// the zero result, and so does any internal failure (logged).
    pub fn compute(
        &self,
        quantity: f64,
        volatility: f64,
        fee_tier: f64,
        snapshot: Option<&OrderBookSnapshot>,
    ) -> Result<SimulationResult, ValidationError> {
        let params = OrderParams::new(quantity, volatility, fee_tier)?;
        Ok(self.compute_order(&params, snapshot))
    }

    fn compute_order(&self, params: &OrderParams, snapshot: Option<&OrderBookSnapshot>) -> SimulationResult {
        let Some(book) = snapshot.filter(|book| book.is_two_sided()) else {
            debug!("No two-sided book available, returning zero estimate");
            return SimulationResult::default();
        };

        let started = Instant::now();
        match self.try_compute(params, book) {
            Ok(mut result) => {
                result.compute_latency_ms = started.elapsed().as_millis() as f64;
                result
            }
            Err(e) => {
                error!("❌ Trade simulation error for {}: {}", book.symbol(), e);
                SimulationResult::default()
            }
        }
    }

    fn try_compute(&self, params: &OrderParams, book: &OrderBookSnapshot) -> Result<SimulationResult, ComputeError> {
        let best_bid = book.best_bid().ok_or(ComputeError::MissingSide)?.price;
        let fill = cost_models::walk_asks(params.quantity, book.asks());

        if !fill.is_complete(params.quantity) {
            debug!(
                "Visible ask depth {:.4} below order quantity {:.4} for {}",
                fill.filled,
                params.quantity,
                book.symbol()
            );
        }

        let slippage_per_unit = cost_models::slippage_per_unit(params.quantity, &fill, best_bid);
        let fees = cost_models::flat_fee(params.quantity, params.fee_tier);
        let market_impact = self.config.impact.market_impact(params.quantity, params.volatility);
        let maker_taker_ratio = self.config.maker_taker.ratio(params.quantity, params.volatility);

        let result = SimulationResult {
            slippage_per_unit,
            fees,
            market_impact,
            net_cost: slippage_per_unit + fees + market_impact,
            maker_taker_ratio,
            compute_latency_ms: 0.0,
        };

        if !result.is_finite() {
            let field = [
                ("slippage", slippage_per_unit),
                ("fees", fees),
                ("market impact", market_impact),
                ("maker/taker ratio", maker_taker_ratio),
            ]
            .iter()
            .find(|(_, v)| !v.is_finite())
            .map(|(name, _)| *name)
            .unwrap_or("net cost");
            return Err(ComputeError::NonFinite(field));
        }

        Ok(result)
    }
}
