// Trade Cost Simulator Library
//
// Streams a live order book, keeps a bounded history and continuously estimates the
// cost of a market order against the freshest book

pub mod core;
pub mod clients;
pub mod config;
pub mod display;     // Console dashboard rendering
pub mod error;       // Unified error handling
pub mod logging;
pub mod simulation;

// Re-export pipeline components
pub use crate::core::{OrderBookHistory, ResultPublisher, SimulationWorker, Wake, WakeSignal};

// Re-export error types
pub use error::{ProtocolError, SimulatorError, SimulatorResult, ValidationError};

// Re-export client types
pub use clients::{parse_book_message, FeedIngestor, FeedSettings, FeedStatsSnapshot};

// Re-export configuration
pub use config::{Config, ConfigError, LoggingConfig};

// Re-export simulation components
pub use simulation::{
    OrderBookSnapshot, OrderParams, PriceLevel, SimulationConfig, SimulationEngine, SimulationResult,
};
