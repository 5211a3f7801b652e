// Simulation Module
// Order book snapshots and the cost estimation engine

pub mod order_book;
pub mod cost_models;
pub mod simulation_engine;

pub use order_book::{OrderBookSnapshot, PriceLevel};
pub use cost_models::{walk_asks, AskFill, ImpactModel, MakerTakerModel};
pub use simulation_engine::{OrderParams, SimulationConfig, SimulationEngine, SimulationResult};
