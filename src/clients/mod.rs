// Order book feed clients

pub mod book_message;
pub mod feed_ingestor;

// Re-export client types
pub use book_message::{parse_book_message, parse_book_value};
pub use feed_ingestor::{FeedIngestor, FeedSettings, FeedStatsSnapshot};
