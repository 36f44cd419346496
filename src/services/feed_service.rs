use crate::api::extractor::ContentExtractor;
use crate::config::FeedConfig;
use crate::models::cache::{cache_key, CacheEntry};
use crate::models::event::FeedEvent;
use crate::models::period::Period;
use crate::models::request::FetchRequest;
use crate::services::cache_store::CacheStore;
use crate::services::fetcher::RetryingFetcher;
use crate::services::queue::RequestQueue;
use crate::services::worker::{WorkerContext, WorkerPool};
use crate::utils::clock::Clock;
use chrono::{DateTime, Local};
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{info, warn};

/// Owns the cache, the request queue and the fetcher.
///
/// Handed to the [`Scheduler`](crate::services::scheduler::Scheduler) and to
/// the presentation layer instead of living in globals.
pub struct FeedService {
    config: Arc<FeedConfig>,
    clock: Arc<Clock>,
    cache: Arc<CacheStore>,
    queue: Arc<RequestQueue>,
    fetcher: Arc<RetryingFetcher>,
    events: UnboundedSender<FeedEvent>,
}

impl FeedService {
    /// Loads the cache from `config.cache_path` and wires the components.
    /// Events are delivered on the returned receiver.
    pub fn new(
        config: FeedConfig,
        extractor: Arc<dyn ContentExtractor>,
    ) -> (Self, UnboundedReceiver<FeedEvent>) {
        let clock = Arc::new(Clock::new());
        let cache = Arc::new(CacheStore::load(config.cache_path.clone(), clock.clone()));
        let fetcher = Arc::new(RetryingFetcher::new(extractor, config.retry.clone()));
        let (events, rx) = mpsc::unbounded_channel();

        let service = Self {
            config: Arc::new(config),
            clock,
            cache,
            queue: Arc::new(RequestQueue::new()),
            fetcher,
            events,
        };
        (service, rx)
    }

    /// Spawns the worker pool. Requests enqueued before this call are kept
    /// and served once the pool is running.
    pub fn start(&self) -> WorkerPool {
        let ctx = WorkerContext {
            cache: self.cache.clone(),
            fetcher: self.fetcher.clone(),
            events: self.events.clone(),
            cache_duration: self.config.cache_duration,
            cooldown: self.config.cooldown,
        };
        WorkerPool::spawn(self.config.pool_size, self.queue.clone(), ctx)
    }

    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    pub fn queue(&self) -> &RequestQueue {
        &self.queue
    }

    pub fn enqueue(&self, request: FetchRequest) {
        self.queue.enqueue(request);
    }

    /// Enqueues the Cartesian product of `categories` × `periods`.
    ///
    /// Unknown names are logged and skipped; they never reach the queue.
    /// Returns the number of requests enqueued.
    pub fn request_refresh<C, P>(&self, categories: &[C], periods: &[P]) -> usize
    where
        C: AsRef<str>,
        P: AsRef<str>,
    {
        let categories: Vec<String> = categories
            .iter()
            .filter_map(|c| match self.config.resolve_category(c.as_ref()) {
                Ok(c) => Some(c),
                Err(e) => {
                    warn!(error = %e, "Ignoring refresh request");
                    None
                }
            })
            .collect();
        let periods: Vec<Period> = periods
            .iter()
            .filter_map(|p| match self.config.resolve_period(p.as_ref()) {
                Ok(p) => Some(p),
                Err(e) => {
                    warn!(error = %e, "Ignoring refresh request");
                    None
                }
            })
            .collect();

        let mut count = 0;
        for category in &categories {
            for period in &periods {
                self.enqueue(FetchRequest::new(category.clone(), *period));
                count += 1;
            }
        }
        info!(count, "Refresh requested");
        count
    }

    /// Enqueues every configured (category, period) pair.
    pub fn refresh_all(&self) -> usize {
        for category in &self.config.categories {
            for period in &self.config.periods {
                self.enqueue(FetchRequest::new(category.clone(), *period));
            }
        }
        let count = self.config.categories.len() * self.config.periods.len();
        info!(count, "Full refresh enqueued");
        count
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
        if self.events.send(FeedEvent::CacheCleared).is_err() {
            warn!("No event listener for cache clear");
        }
    }

    pub fn set_simulated_clock(&self, date: Option<DateTime<Local>>) {
        self.clock.set_simulated(date);
    }

    /// Cached entry for a pair, fresh or not.
    pub fn cached(&self, category: &str, period: Period) -> Option<CacheEntry> {
        self.cache.get(&cache_key(category, period))
    }

    pub fn is_fresh(&self, entry: &CacheEntry) -> bool {
        self.cache.is_fresh(entry, self.config.cache_duration)
    }
}
