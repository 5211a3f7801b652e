// Logging setup
// Installs the global tracing subscriber, writing to a file when one is configured

use std::fs::OpenOptions;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;
use crate::error::{SimulatorError, SimulatorResult};

/// Filter directive for the configured level. `RUST_LOG` wins over both.
pub fn filter_directive(config: &LoggingConfig, verbose: bool) -> String {
    if verbose {
        "debug".to_string()
    } else {
        config.level.clone()
    }
}

fn env_filter(config: &LoggingConfig, verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directive(config, verbose)))
}

/// Install the subscriber. Calling this again after a subscriber is set is a no-op.
pub fn init_logging(config: &LoggingConfig, verbose: bool) -> SimulatorResult<()> {
    let filter = env_filter(config, verbose);

    let installed = match &config.log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(SimulatorError::Io)?;

            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_thread_names(true)
                .with_writer(Mutex::new(file))
                .try_init()
        }
        None => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_thread_names(true)
            .with_writer(std::io::stderr)
            .try_init(),
    };

    if installed.is_err() {
        tracing::debug!("Logging already initialized");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbose_forces_debug() {
        let config = LoggingConfig {
            level: "warn".to_string(),
            log_file: None,
        };

        assert_eq!(filter_directive(&config, false), "warn");
        assert_eq!(filter_directive(&config, true), "debug");
    }

    #[test]
    fn test_init_is_idempotent() {
        let config = LoggingConfig {
            level: "info".to_string(),
            log_file: None,
        };

        assert!(init_logging(&config, false).is_ok());
        assert!(init_logging(&config, true).is_ok());
    }

    #[test]
    fn test_unwritable_log_file_is_an_error() {
        let config = LoggingConfig {
            level: "info".to_string(),
            log_file: Some("/nonexistent-dir/simulator.log".to_string()),
        };

        assert!(matches!(init_logging(&config, false), Err(SimulatorError::Io(_))));
    }
}
