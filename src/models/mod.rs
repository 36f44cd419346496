pub mod cache;
pub mod event;
pub mod period;
pub mod request;
