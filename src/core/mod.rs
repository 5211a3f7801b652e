// Core pipeline components: shared state and the simulation worker

pub mod history;
pub mod publisher;
pub mod wake;
pub mod worker;

// Re-export commonly used types
pub use history::OrderBookHistory;
pub use publisher::ResultPublisher;
pub use wake::{Wake, WakeSignal};
pub use worker::SimulationWorker;
