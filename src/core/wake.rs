// Wake condition and cooperative shutdown flag
// Shared by the feed (producer), the simulation worker (consumer) and the renderer

use parking_lot::{Condvar, Mutex};
use tracing::info;

/// Why a waiter returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wake {
    /// New data arrived; `generation` is the count of data notifications so far
    Data { generation: u64 },
    Shutdown,
}

/// Condition variable guarding a data generation counter and the shutdown flag.
///
/// The producer bumps the generation once per ingested snapshot. A waiter passes
/// the last generation it processed and returns once the counter moved past it
/// or shutdown was requested. A non-zero generation implies the history is
/// non-empty. Shutdown takes priority over pending data.
#[derive(Debug, Default)]
pub struct WakeSignal {
    state: Mutex<WakeState>,
    condvar: Condvar,
}

#[derive(Debug, Default)]
struct WakeState {
    generation: u64,
    shutdown: bool,
}

impl WakeSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal that one more snapshot is available
    pub fn notify_data(&self) -> u64 {
        let generation = {
            let mut state = self.state.lock();
            state.generation += 1;
            state.generation
        };
        self.condvar.notify_all();
        generation
    }

    /// Set the shutdown flag and wake every waiter. Idempotent.
    pub fn request_shutdown(&self) {
        let first = {
            let mut state = self.state.lock();
            let first = !state.shutdown;
            state.shutdown = true;
            first
        };
        if first {
            info!("🛑 Shutdown requested");
        }
        self.condvar.notify_all();
    }

    pub fn is_shutdown(&self) -> bool {
        self.state.lock().shutdown
    }

    pub fn generation(&self) -> u64 {
        self.state.lock().generation
    }

    /// Block until data newer than `last_seen` exists or shutdown is requested.
    /// The predicate is re-evaluated after every wakeup, spurious ones included.
    pub fn wait_for_data(&self, last_seen: u64) -> Wake {
        let mut state = self.state.lock();
        self.condvar
            .wait_while(&mut state, |s| !s.shutdown && s.generation == last_seen);

        if state.shutdown {
            Wake::Shutdown
        } else {
            Wake::Data {
                generation: state.generation,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_pending_data_returns_immediately() {
        let wake = WakeSignal::new();
        wake.notify_data();
        wake.notify_data();

        assert_eq!(wake.wait_for_data(0), Wake::Data { generation: 2 });
    }

    #[test]
    fn test_shutdown_wins_over_data() {
        let wake = WakeSignal::new();
        wake.notify_data();
        wake.request_shutdown();

        assert_eq!(wake.wait_for_data(0), Wake::Shutdown);
        assert!(wake.is_shutdown());
    }

    #[test]
    fn test_blocked_waiter_woken_by_data() {
        let wake = Arc::new(WakeSignal::new());

        let waiter = {
            let wake = Arc::clone(&wake);
            thread::spawn(move || wake.wait_for_data(0))
        };

        thread::sleep(Duration::from_millis(20));
        wake.notify_data();

        assert_eq!(waiter.join().unwrap(), Wake::Data { generation: 1 });
    }

    #[test]
    fn test_blocked_waiter_woken_by_shutdown() {
        let wake = Arc::new(WakeSignal::new());
        wake.notify_data();

        let waiter = {
            let wake = Arc::clone(&wake);
            // Already saw generation 1, so this blocks
            thread::spawn(move || wake.wait_for_data(1))
        };

        thread::sleep(Duration::from_millis(20));
        wake.request_shutdown();
        wake.request_shutdown();

        assert_eq!(waiter.join().unwrap(), Wake::Shutdown);
    }
}
