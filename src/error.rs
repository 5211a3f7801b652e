//! Error handling for the trade cost simulator
//!
//! Every failure the pipeline can hit is one of four kinds: connection problems
//! (retried forever by the feed), protocol problems (frame dropped), validation
//! problems (surfaced to the caller) and internal compute problems (collapsed into
//! a zero result inside the engine). `SimulatorError` is the umbrella type used at
//! the crate boundary.

use std::io;

use thiserror::Error;

use crate::config::ConfigError;

/// Invalid order parameters passed to the simulation engine.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ValidationError {
    #[error("quantity must be a positive finite number, got {0}")]
    Quantity(f64),

    #[error("volatility must be a non-negative finite number, got {0}")]
    Volatility(f64),

    #[error("fee tier must be between 0 and 1, got {0}")]
    FeeTier(f64),
}

impl ValidationError {
    /// Name of the offending parameter
    pub fn parameter(&self) -> &'static str {
        match self {
            ValidationError::Quantity(_) => "quantity",
            ValidationError::Volatility(_) => "volatility",
            ValidationError::FeeTier(_) => "fee_tier",
        }
    }
}

/// A feed frame that could not be turned into a snapshot.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProtocolError {
    #[error("frame is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("frame is not a JSON object")]
    NotAnObject,

    #[error("missing required field '{0}'")]
    MissingField(&'static str),

    #[error("field '{field}' is malformed: {reason}")]
    MalformedField { field: &'static str, reason: String },
}

/// Main error type for the simulator
#[derive(Debug, Error)]
pub enum SimulatorError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl SimulatorError {
    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(self, SimulatorError::Connection(_))
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            SimulatorError::Connection(_) => "connection",
            SimulatorError::Protocol(_) => "protocol",
            SimulatorError::Validation(_) => "validation",
            SimulatorError::Config(_) => "config",
            SimulatorError::Io(_) => "io",
        }
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for SimulatorError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        SimulatorError::Connection(err.to_string())
    }
}

impl From<serde_json::Error> for SimulatorError {
    fn from(err: serde_json::Error) -> Self {
        SimulatorError::Protocol(ProtocolError::InvalidJson(err.to_string()))
    }
}

/// Result type alias using SimulatorError
pub type SimulatorResult<T> = Result<T, SimulatorError>;
