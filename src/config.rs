// Configuration management for the trade cost simulator

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::ValidationError;
use crate::simulation::{ImpactModel, MakerTakerModel, OrderParams, SimulationConfig};

pub const DEFAULT_ENDPOINT: &str = "wss://gomarket-cpp.goquant.io:443/ws/l2-orderbook/okx/BTC-USDT-SWAP";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    pub endpoint: String,
    pub exchange: String,
    pub asset: String,
    pub retry_interval_secs: u64,
    pub heartbeat_interval_secs: u64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            exchange: "OKX".to_string(),
            asset: "BTC-USDT-SWAP".to_string(),
            retry_interval_secs: 5,
            heartbeat_interval_secs: 20,
        }
    }
}

impl FeedConfig {
    pub fn retry_interval(&self) -> Duration {
        Duration::from_secs(self.retry_interval_secs)
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    pub capacity: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self { capacity: 1000 }
    }
}

/// Order simulated on every worker cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationDefaults {
    pub quantity: f64,
    pub volatility: f64,
    pub fee_tier: f64,
}

impl Default for SimulationDefaults {
    fn default() -> Self {
        Self {
            quantity: 100.0,
            volatility: 0.02,
            fee_tier: 0.001,
        }
    }
}

impl SimulationDefaults {
    pub fn order_params(&self) -> Result<OrderParams, ValidationError> {
        OrderParams::new(self.quantity, self.volatility, self.fee_tier)
    }

    /// Order parameters with command-line values taking precedence
    pub fn with_overrides(
        &self,
        quantity: Option<f64>,
        volatility: Option<f64>,
        fee_tier: Option<f64>,
    ) -> Result<OrderParams, ValidationError> {
        OrderParams::new(
            quantity.unwrap_or(self.quantity),
            volatility.unwrap_or(self.volatility),
            fee_tier.unwrap_or(self.fee_tier),
        )
    }
}

/// Cost model constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub eta: f64,           // Temporary impact coefficient
    pub gamma: f64,         // Permanent impact coefficient
    pub horizon_secs: f64,  // Execution horizon
    pub maker_taker_a: f64,
    pub maker_taker_b: f64,
    pub maker_taker_c: f64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        let impact = ImpactModel::default();
        let maker_taker = MakerTakerModel::default();
        Self {
            eta: impact.eta,
            gamma: impact.gamma,
            horizon_secs: impact.horizon_secs,
            maker_taker_a: maker_taker.a,
            maker_taker_b: maker_taker.b,
            maker_taker_c: maker_taker.c,
        }
    }
}

impl ModelConfig {
    pub fn simulation_config(&self) -> SimulationConfig {
        SimulationConfig {
            impact: ImpactModel {
                eta: self.eta,
                gamma: self.gamma,
                horizon_secs: self.horizon_secs,
            },
            maker_taker: MakerTakerModel {
                a: self.maker_taker_a,
                b: self.maker_taker_b,
                c: self.maker_taker_c,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub refresh_interval_ms: u64,
    pub max_latency_ms: f64,  // Latency above this is flagged on screen
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            refresh_interval_ms: 200,
            max_latency_ms: 100.0,
        }
    }
}

impl DisplayConfig {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// Append logs here instead of stderr. Omit the key to log to stderr.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_file: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub feed: FeedConfig,
    pub history: HistoryConfig,
    pub simulation: SimulationDefaults,
    pub model: ModelConfig,
    pub display: DisplayConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)
            .map_err(|e| ConfigError::FileRead(e.to_string()))?;

        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)
            .map_err(|e| ConfigError::Parse(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::Serialize(e.to_string()))?;

        fs::write(path, content)
            .map_err(|e| ConfigError::FileWrite(e.to_string()))?;

        Ok(())
    }

    /// Load configuration from file, or create default if file doesn't exist
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            Self::from_file(path)
        } else {
            let config = Self::default();
            config.to_file(&path)?;
            println!("📁 Created default config file: {}", path.as_ref().display());
            Ok(config)
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        let endpoint = self.feed.endpoint.as_str();
        if !(endpoint.starts_with("ws://") || endpoint.starts_with("wss://")) {
            return Err(ConfigError::Validation(format!(
                "feed.endpoint must be a ws:// or wss:// URL, got '{}'",
                endpoint
            )));
        }

        if self.feed.retry_interval_secs == 0 {
            return Err(ConfigError::Validation("retry_interval_secs must be greater than 0".to_string()));
        }

        if self.feed.heartbeat_interval_secs == 0 {
            return Err(ConfigError::Validation("heartbeat_interval_secs must be greater than 0".to_string()));
        }

        if self.history.capacity == 0 {
            return Err(ConfigError::Validation("history capacity must be greater than 0".to_string()));
        }

        self.simulation
            .order_params()
            .map_err(|e| ConfigError::Validation(format!("simulation.{}", e)))?;

        if !(self.model.horizon_secs.is_finite() && self.model.horizon_secs > 0.0) {
            return Err(ConfigError::Validation("model.horizon_secs must be positive".to_string()));
        }

        let coefficients = [
            self.model.eta,
            self.model.gamma,
            self.model.maker_taker_a,
            self.model.maker_taker_b,
            self.model.maker_taker_c,
        ];
        if coefficients.iter().any(|c| !c.is_finite()) {
            return Err(ConfigError::Validation("model coefficients must be finite".to_string()));
        }

        if self.display.refresh_interval_ms == 0 {
            return Err(ConfigError::Validation("refresh_interval_ms must be greater than 0".to_string()));
        }

        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(String),

    #[error("Failed to write config file: {0}")]
    FileWrite(String),

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Failed to serialize config: {0}")]
    Serialize(String),

    #[error("Configuration validation error: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.history.capacity, 1000);
        assert_eq!(config.feed.retry_interval(), Duration::from_secs(5));
        assert_eq!(config.feed.heartbeat_interval(), Duration::from_secs(20));
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config = Config::from_toml_str(
            r#"
            [history]
            capacity = 5

            [simulation]
            quantity = 7.0
            "#,
        )
        .unwrap();

        assert_eq!(config.history.capacity, 5);
        assert_eq!(config.simulation.quantity, 7.0);
        assert_eq!(config.simulation.fee_tier, 0.001);
        assert_eq!(config.feed.endpoint, DEFAULT_ENDPOINT);
    }

    #[test]
    fn test_model_config_maps_to_engine_constants() {
        let sim = ModelConfig::default().simulation_config();
        assert_eq!(sim, SimulationConfig::default());
    }

    #[test]
    fn test_invalid_fee_tier_rejected() {
        let err = Config::from_toml_str("[simulation]\nfee_tier = 1.5\n").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(msg) if msg.contains("fee tier")));
    }

    #[test]
    fn test_overrides_take_precedence() {
        let defaults = SimulationDefaults::default();

        let params = defaults.with_overrides(Some(7.0), None, Some(0.002)).unwrap();
        assert_eq!(params.quantity, 7.0);
        assert_eq!(params.volatility, 0.02);
        assert_eq!(params.fee_tier, 0.002);

        assert!(matches!(
            defaults.with_overrides(None, Some(-1.0), None),
            Err(ValidationError::Volatility(_))
        ));
    }

    #[test]
    fn test_invalid_endpoint_rejected() {
        let err = Config::from_toml_str("[feed]\nendpoint = \"http://example.com\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let mut config = Config::default();
        config.history.capacity = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_log_file_is_optional() {
        let config = Config::from_toml_str("[logging]\nlevel = \"debug\"\n").unwrap();
        assert_eq!(config.logging.log_file, None);

        let config = Config::from_toml_str("[logging]\nlog_file = \"sim.log\"\n").unwrap();
        assert_eq!(config.logging.log_file.as_deref(), Some("sim.log"));
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_console_logging_survives_save_and_load() {
        let config = Config::default();
        let text = toml::to_string_pretty(&config).unwrap();

        assert!(!text.contains("log_file"));
        assert_eq!(Config::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn test_parse_error() {
        let err = Config::from_toml_str("[history\ncapacity = ").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
