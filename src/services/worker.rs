use crate::models::event::FeedEvent;
use crate::models::request::FetchRequest;
use crate::services::cache_store::CacheStore;
use crate::services::fetcher::RetryingFetcher;
use crate::services::queue::RequestQueue;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Everything a worker needs to serve one request.
#[derive(Clone)]
pub(crate) struct WorkerContext {
    pub cache: Arc<CacheStore>,
    pub fetcher: Arc<RetryingFetcher>,
    pub events: UnboundedSender<FeedEvent>,
    pub cache_duration: Duration,
    pub cooldown: Duration,
}

/// How an attempt was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Outcome {
    CacheHit,
    Fetched,
    Failed,
}

/// Fixed set of tasks draining a [`RequestQueue`].
///
/// Each task owns one slot and serves a single request at a time, so at most
/// `size` attempts are ever in flight.
pub struct WorkerPool {
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    pub(crate) fn spawn(size: usize, queue: Arc<RequestQueue>, ctx: WorkerContext) -> Self {
        let handles = (0..size)
            .map(|slot| {
                let queue = queue.clone();
                let ctx = ctx.clone();
                tokio::spawn(async move { run_slot(slot, queue, ctx).await })
            })
            .collect();
        info!(size, "Worker pool started");
        Self { handles }
    }

    pub fn size(&self) -> usize {
        self.handles.len()
    }

    /// Stops all slots. In-flight attempts are abandoned.
    pub fn shutdown(self) {
        for handle in &self.handles {
            handle.abort();
        }
        info!("Worker pool stopped");
    }
}

async fn run_slot(slot: usize, queue: Arc<RequestQueue>, ctx: WorkerContext) {
    loop {
        let request = queue.pop().await;
        debug!(slot, %request, "Dispatched");
        let outcome = serve(&ctx, request).await;
        debug!(slot, ?outcome, "Attempt finished");

        // Every attempt, cache hits included, is followed by the cooldown.
        if !ctx.cooldown.is_zero() {
            tokio::time::sleep(ctx.cooldown).await;
        }
    }
}

/// Serves one request: fresh cache hit, or fetch with retry and write-through.
pub(crate) async fn serve(ctx: &WorkerContext, request: FetchRequest) -> Outcome {
    let key = request.cache_key();

    if let Some(entry) = ctx.cache.get_fresh(&key, ctx.cache_duration) {
        debug!(key, "Cache hit");
        emit(
            ctx,
            FeedEvent::FetchSucceeded {
                category: request.category,
                period: request.period,
                text: entry.value,
                from_cache: true,
            },
        );
        return Outcome::CacheHit;
    }

    debug!(key, "Cache miss");
    match ctx.fetcher.fetch(&request.category, request.period).await {
        Ok(text) => {
            ctx.cache.put(&key, text.clone());
            info!(key, "Fetched");
            emit(
                ctx,
                FeedEvent::FetchSucceeded {
                    category: request.category,
                    period: request.period,
                    text,
                    from_cache: false,
                },
            );
            Outcome::Fetched
        }
        Err(e) => {
            warn!(key, error = %e, "Fetch failed");
            emit(
                ctx,
                FeedEvent::FetchFailed {
                    category: request.category,
                    period: request.period,
                    error_message: e.to_string(),
                },
            );
            Outcome::Failed
        }
    }
}

fn emit(ctx: &WorkerContext, event: FeedEvent) {
    if ctx.events.send(event).is_err() {
        debug!("No event listener, dropping event");
    }
}
