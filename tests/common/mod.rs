// Common test utilities and helpers
#![allow(dead_code)]

use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use tempfile::TempDir;
use trade_cost_simulator::{OrderBookSnapshot, PriceLevel};

/// Frame from the feed with one bid at `best_bid` and two ask levels (101 x 5, 102 x 10)
pub fn book_frame(best_bid: f64) -> String {
    format!(
        r#"{{"timestamp":"2025-05-04T10:39:13Z","exchange":"OKX","symbol":"BTC-USDT-SWAP","bids":[["{}","10"]],"asks":[["101","5"],["102","10"]]}}"#,
        best_bid
    )
}

/// The reference book used across tests: bids [(100, 10)], asks [(101, 5), (102, 10)]
pub fn reference_book() -> OrderBookSnapshot {
    OrderBookSnapshot::captured_now(
        "BTC-USDT-SWAP",
        vec![PriceLevel::new(100.0, 10.0)],
        vec![PriceLevel::new(101.0, 5.0), PriceLevel::new(102.0, 10.0)],
    )
}

/// Write `contents` to a config file inside a fresh temporary directory
pub fn write_temp_config(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let path = temp_dir.path().join("config.toml");
    std::fs::write(&path, contents).expect("Failed to write config file");
    (temp_dir, path)
}

/// Poll `condition` until it holds, panicking after `timeout`
pub fn wait_until<F: Fn() -> bool>(timeout: Duration, what: &str, condition: F) {
    let deadline = std::time::Instant::now() + timeout;
    while !condition() {
        assert!(std::time::Instant::now() < deadline, "timed out waiting for {}", what);
        std::thread::sleep(Duration::from_millis(5));
    }
}

/// Async variant of `wait_until` for tests running on the tokio runtime
pub async fn wait_until_async<F: Fn() -> bool>(timeout: Duration, what: &str, condition: F) {
    let deadline = tokio::time::Instant::now() + timeout;
    while !condition() {
        assert!(tokio::time::Instant::now() < deadline, "timed out waiting for {}", what);
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

/// Await `future`, failing the test if it does not finish in time
pub async fn within<T>(timeout: Duration, what: &str, future: impl Future<Output = T>) -> T {
    match tokio::time::timeout(timeout, future).await {
        Ok(value) => value,
        Err(_) => panic!("timed out waiting for {}", what),
    }
}
