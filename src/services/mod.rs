pub mod cache_store;
pub mod feed_service;
pub mod fetcher;
pub mod queue;
pub mod scheduler;
pub mod worker;
