//! Deduplicated, back-off aware reconcile work queue (spec §5: "a dedup
//! work queue keyed by `(kind, namespace, name)`").
//!
//! A key already in the queue is never enqueued twice; a key currently
//! being processed that is re-enqueued is remembered and redelivered once
//! processing finishes, matching level-triggered reconciliation semantics
//! (the newest desired state always wins over a stale in-flight run).

use std::collections::{HashSet, VecDeque};
use std::hash::Hash;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tokio::time::sleep;

use super::backoff::delay_for_attempt;

#[derive(Debug, Default)]
struct Inner<K> {
    queued: HashSet<K>,
    order: VecDeque<K>,
    in_flight: HashSet<K>,
    requeue_after_flight: HashSet<K>,
    attempts: std::collections::HashMap<K, u32>,
}

/// A generic, dedup work queue keyed by `K` (typically `(kind, namespace,
/// name)`). Safe to share across reconciler worker tasks via `Arc`.
pub struct WorkQueue<K> {
    inner: Mutex<Inner<K>>,
}

impl<K: Eq + Hash + Clone> WorkQueue<K> {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                queued: HashSet::new(),
                order: VecDeque::new(),
                in_flight: HashSet::new(),
                requeue_after_flight: HashSet::new(),
                attempts: std::collections::HashMap::new(),
            }),
        }
    }

    /// Enqueues `key` immediately unless it is already queued. If `key` is
    /// currently being processed, it is marked to be redelivered once that
    /// run completes instead of being queued twice.
    pub async fn enqueue(&self, key: K) {
        let mut inner = self.inner.lock().await;
        if inner.in_flight.contains(&key) {
            inner.requeue_after_flight.insert(key);
            return;
        }
        if inner.queued.insert(key.clone()) {
            inner.order.push_back(key);
        }
    }

    /// Pops the next key to process, marking it in-flight. Returns `None`
    /// if the queue is empty.
    pub async fn dequeue(&self) -> Option<K> {
        let mut inner = self.inner.lock().await;
        let key = inner.order.pop_front()?;
        inner.queued.remove(&key);
        inner.in_flight.insert(key.clone());
        Some(key)
    }

    /// Marks `key`'s processing as complete. If a reconcile attempt for
    /// `key` was requested while it was in-flight, it is re-queued now;
    /// the attempt counter resets so the next run starts at back-off zero.
    pub async fn complete(&self, key: &K) {
        let mut inner = self.inner.lock().await;
        inner.in_flight.remove(key);
        inner.attempts.remove(key);
        if inner.requeue_after_flight.remove(key) && inner.queued.insert(key.clone()) {
            inner.order.push_back(key.clone());
        }
    }

    /// Marks `key`'s processing as failed, waits out the exponential
    /// back-off delay for its attempt count, then re-queues it.
    pub async fn fail_and_reschedule(&self, key: K) {
        let attempt = {
            let mut inner = self.inner.lock().await;
            inner.in_flight.remove(&key);
            let entry = inner.attempts.entry(key.clone()).or_insert(0);
            let attempt = *entry;
            *entry += 1;
            attempt
        };
        sleep(delay_for_attempt(attempt)).await;
        self.enqueue(key).await;
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.order.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl<K: Eq + Hash + Clone> Default for WorkQueue<K> {
    fn default() -> Self {
        Self::new()
    }
}

/// Measures how long a `fail_and_reschedule` round actually waited, used by
/// tests that assert back-off grows rather than asserting exact wall time.
pub async fn timed<F: std::future::Future<Output = ()>>(fut: F) -> Duration {
    let start = Instant::now();
    fut.await;
    start.elapsed()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn dedups_repeated_enqueues_of_an_idle_key() {
        let queue: WorkQueue<&str> = WorkQueue::new();
        queue.enqueue("cell/default/a").await;
        queue.enqueue("cell/default/a").await;
        assert_eq!(queue.len().await, 1);
    }

    #[tokio::test]
    async fn redelivers_after_in_flight_completes() {
        let queue: WorkQueue<&str> = WorkQueue::new();
        queue.enqueue("cell/default/a").await;
        let key = queue.dequeue().await.unwrap();
        // A fresh event arrives while the first run is still in-flight.
        queue.enqueue(key).await;
        assert_eq!(queue.len().await, 0);
        queue.complete(&key).await;
        assert_eq!(queue.len().await, 1);
    }

    #[tokio::test]
    async fn fail_and_reschedule_requeues_the_key() {
        let queue: WorkQueue<&str> = WorkQueue::new();
        queue.enqueue("mission/default/m").await;
        let key = queue.dequeue().await.unwrap();
        queue.fail_and_reschedule(key).await;
        assert_eq!(queue.len().await, 1);
    }
}
