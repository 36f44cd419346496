use crate::models::request::FetchRequest;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};
use tokio::sync::Notify;
use tracing::trace;

/// FIFO backlog of fetch requests shared by the worker pool.
///
/// Duplicates are kept: the same pair enqueued twice is fetched twice.
#[derive(Default)]
pub struct RequestQueue {
    backlog: Mutex<VecDeque<FetchRequest>>,
    notify: Notify,
}

impl RequestQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends to the tail and wakes one idle worker. Never blocks.
    pub fn enqueue(&self, request: FetchRequest) {
        trace!(%request, "Enqueued");
        self.lock().push_back(request);
        self.notify.notify_one();
    }

    /// Removes and returns the head, if any.
    pub fn try_pop(&self) -> Option<FetchRequest> {
        self.lock().pop_front()
    }

    /// Waits until a request is available and takes it.
    pub async fn pop(&self) -> FetchRequest {
        loop {
            if let Some(request) = self.try_pop() {
                return request;
            }
            self.notify.notified().await;
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<FetchRequest>> {
        self.backlog.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
