// Simulation worker
// Dedicated thread that re-estimates costs whenever the feed delivers a new book

use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::{debug, error, info};

use crate::core::history::OrderBookHistory;
use crate::core::publisher::ResultPublisher;
use crate::core::wake::{Wake, WakeSignal};
use crate::error::ValidationError;
use crate::simulation::{OrderParams, SimulationEngine, SimulationResult};

pub const WORKER_THREAD_NAME: &str = "simulation-worker";

/// Orchestrates one engine run per wake against the latest snapshot.
///
/// Snapshots that arrive while a cycle is running are not simulated one by one;
/// the next cycle only sees whatever is latest by then.
pub struct SimulationWorker {
    engine: SimulationEngine,
    params: OrderParams,
    history: Arc<OrderBookHistory>,
    publisher: Arc<ResultPublisher>,
    wake: Arc<WakeSignal>,
}

impl SimulationWorker {
    pub fn new(
        engine: SimulationEngine,
        params: OrderParams,
        history: Arc<OrderBookHistory>,
        publisher: Arc<ResultPublisher>,
        wake: Arc<WakeSignal>,
    ) -> Result<Self, ValidationError> {
        params.validate()?;
        Ok(Self {
            engine,
            params,
            history,
            publisher,
            wake,
        })
    }

    pub fn params(&self) -> &OrderParams {
        &self.params
    }

    /// Loop until shutdown; returns the number of completed cycles
    pub fn run(&self) -> u64 {
        info!(
            "🧮 Simulation worker started (qty {}, vol {}, fee tier {})",
            self.params.quantity, self.params.volatility, self.params.fee_tier
        );

        let mut last_seen = 0;
        let mut cycles = 0;

        loop {
            match self.wake.wait_for_data(last_seen) {
                Wake::Shutdown => break,
                Wake::Data { generation } => last_seen = generation,
            }

            if self.wake.is_shutdown() {
                break;
            }

            self.run_cycle();
            cycles += 1;
        }

        info!("✅ Simulation worker stopped after {} cycles", cycles);
        cycles
    }

    /// Simulate against the latest snapshot and publish the result
    pub fn run_cycle(&self) -> SimulationResult {
        let snapshot = self.history.latest();

        let result = match self.engine.compute(
            self.params.quantity,
            self.params.volatility,
            self.params.fee_tier,
            snapshot.as_deref(),
        ) {
            Ok(result) => result,
            Err(e) => {
                error!("Simulation worker error: {}", e);
                return self.publisher.get();
            }
        };

        self.publisher.set(result);
        debug!(
            "Published estimate: net cost {:.6}, latency {} ms",
            result.net_cost, result.compute_latency_ms
        );
        result
    }

    /// Run the worker on its own named thread
    pub fn spawn(self) -> io::Result<JoinHandle<u64>> {
        thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || self.run())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::{OrderBookSnapshot, PriceLevel};
    use std::time::{Duration, Instant};

    struct Fixture {
        history: Arc<OrderBookHistory>,
        publisher: Arc<ResultPublisher>,
        wake: Arc<WakeSignal>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                history: Arc::new(OrderBookHistory::new(8)),
                publisher: Arc::new(ResultPublisher::new()),
                wake: Arc::new(WakeSignal::new()),
            }
        }

        fn worker(&self, params: OrderParams) -> Result<SimulationWorker, ValidationError> {
            SimulationWorker::new(
                SimulationEngine::with_default_config(),
                params,
                Arc::clone(&self.history),
                Arc::clone(&self.publisher),
                Arc::clone(&self.wake),
            )
        }

        fn ingest(&self, best_bid: f64) {
            self.history.append(OrderBookSnapshot::captured_now(
                "BTC-USDT-SWAP",
                vec![PriceLevel::new(best_bid, 10.0)],
                vec![PriceLevel::new(101.0, 5.0), PriceLevel::new(102.0, 10.0)],
            ));
            self.wake.notify_data();
        }

        fn wait_for_publishes(&self, count: u64) {
            let deadline = Instant::now() + Duration::from_secs(5);
            while self.publisher.publish_count() < count {
                assert!(Instant::now() < deadline, "worker did not publish in time");
                thread::sleep(Duration::from_millis(5));
            }
        }
    }

    fn default_params() -> OrderParams {
        OrderParams {
            quantity: 7.0,
            volatility: 0.01,
            fee_tier: 0.001,
        }
    }

    #[test]
    fn test_invalid_params_rejected_at_construction() {
        let fixture = Fixture::new();
        let params = OrderParams {
            quantity: 0.0,
            volatility: 0.01,
            fee_tier: 0.001,
        };

        assert!(matches!(fixture.worker(params), Err(ValidationError::Quantity(_))));
    }

    #[test]
    fn test_run_cycle_publishes_latest() {
        let fixture = Fixture::new();
        let worker = fixture.worker(default_params()).unwrap();
        fixture.ingest(90.0);
        fixture.ingest(100.0);

        let result = worker.run_cycle();

        assert!((result.slippage_per_unit - (709.0 / 7.0 - 100.0)).abs() < 1e-9);
        assert_eq!(fixture.publisher.get(), result);
    }

    #[test]
    fn test_run_cycle_on_empty_history_publishes_zero() {
        let fixture = Fixture::new();
        let worker = fixture.worker(default_params()).unwrap();

        assert!(worker.run_cycle().is_zero());
        assert_eq!(fixture.publisher.publish_count(), 1);
    }

    #[test]
    fn test_worker_wakes_on_data_and_stops_on_shutdown() {
        let fixture = Fixture::new();
        let handle = fixture.worker(default_params()).unwrap().spawn().unwrap();

        fixture.ingest(100.0);
        fixture.wait_for_publishes(1);
        assert!(fixture.publisher.get().net_cost > 0.0);

        fixture.ingest(100.0);
        fixture.wait_for_publishes(2);

        fixture.wake.request_shutdown();
        assert_eq!(handle.join().unwrap(), 2);
    }

    #[test]
    fn test_backlog_is_one_cycle() {
        let fixture = Fixture::new();
        for _ in 0..5 {
            fixture.ingest(100.0);
        }

        let handle = fixture.worker(default_params()).unwrap().spawn().unwrap();
        fixture.wait_for_publishes(1);
        fixture.wake.request_shutdown();

        assert_eq!(handle.join().unwrap(), 1);
        assert_eq!(fixture.publisher.publish_count(), 1);
    }

    #[test]
    fn test_idle_worker_exits_on_shutdown() {
        let fixture = Fixture::new();
        let handle = fixture.worker(default_params()).unwrap().spawn().unwrap();

        thread::sleep(Duration::from_millis(20));
        fixture.wake.request_shutdown();

        assert_eq!(handle.join().unwrap(), 0);
        assert_eq!(fixture.publisher.publish_count(), 0);
    }
}
