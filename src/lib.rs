pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod services;
pub mod utils;

// Re-export commonly used items
pub use api::extractor::{ContentExtractor, HttpExtractor};
pub use config::{FeedConfig, RetryPolicy, SourceConfig};
pub use error::{FeedError, Result};
pub use models::event::FeedEvent;
pub use models::period::Period;
pub use models::request::FetchRequest;
pub use services::feed_service::FeedService;
pub use services::scheduler::Scheduler;
pub use services::worker::WorkerPool;
