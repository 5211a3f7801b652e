// Result publisher
// Single-slot holder for the latest simulation result

use parking_lot::Mutex;

use crate::simulation::SimulationResult;

/// Latest published result behind its own lock, independent of the history lock
#[derive(Debug, Default)]
pub struct ResultPublisher {
    slot: Mutex<PublishedSlot>,
}

#[derive(Debug, Default)]
struct PublishedSlot {
    result: SimulationResult,
    publish_count: u64,
}

impl ResultPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the published result as a whole
    pub fn set(&self, result: SimulationResult) {
        let mut slot = self.slot.lock();
        slot.result = result;
        slot.publish_count += 1;
    }

    /// Copy of the latest result (all zeros before the first publish)
    pub fn get(&self) -> SimulationResult {
        self.slot.lock().result
    }

    pub fn publish_count(&self) -> u64 {
        self.slot.lock().publish_count
    }
}
