//! Reconcile driver: turns cluster-gateway watch streams into work-queue
//! entries and drains them with a fixed pool of reconciler workers (spec
//! §5 "Concurrency & Resource Model").
//!
//! One [`run`] call per resource kind. Each watch event enqueues
//! `(namespace, name)`; workers dequeue, re-read current state (watch
//! events only ever carry a trigger, never authoritative state — the
//! reconciler always re-fetches), and call the reconciler. A `NotFound`
//! from the re-fetch means the object was deleted between the event and
//! the dequeue and is treated as nothing left to do, matching the
//! level-triggered model in spec §4.1.

use std::future::Future;
use std::sync::Arc;

use futures::StreamExt;
use tracing::{error, info, warn};

use crate::domain::errors::GatewayError;
use crate::services::work_queue::WorkQueue;

pub type ReconcileKey = (String, String);

/// Drives `workers` concurrent reconcile loops over `queue`, fed by
/// `watch_stream`. `watch_stream` yields the `(namespace, name)` key a
/// watch event names — callers discard the event's own payload since a
/// reconciler always re-fetches current state rather than trusting what a
/// watch event happened to carry (spec §4.1). `fetch_and_reconcile`
/// re-reads the object for `key` and runs the reconciler; `Ok(())`
/// completes the key, `Err` backs off and retries unless the error is a
/// permanent `NotFound`.
pub async fn run<F, Fut>(
    kind: &'static str,
    queue: Arc<WorkQueue<ReconcileKey>>,
    mut watch_stream: futures::stream::BoxStream<'static, Result<ReconcileKey, GatewayError>>,
    workers: usize,
    fetch_and_reconcile: F,
) where
    F: Fn(ReconcileKey) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), GatewayError>> + Send,
{
    let fetch_and_reconcile = Arc::new(fetch_and_reconcile);

    let feeder = {
        let queue = queue.clone();
        async move {
            while let Some(event) = watch_stream.next().await {
                match event {
                    Ok(key) => queue.enqueue(key).await,
                    Err(err) => warn!(kind, %err, "watch stream error"),
                }
            }
        }
    };

    let workers: Vec<_> = (0..workers)
        .map(|worker_id| {
            let queue = queue.clone();
            let fetch_and_reconcile = fetch_and_reconcile.clone();
            tokio::spawn(async move {
                loop {
                    let Some(key) = queue.dequeue().await else {
                        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
                        continue;
                    };
                    let (namespace, name) = key.clone();
                    match fetch_and_reconcile(key.clone()).await {
                        Ok(()) => {
                            queue.complete(&key).await;
                        }
                        Err(GatewayError::NotFound(_)) => {
                            info!(kind, worker_id, namespace, name, "object deleted before reconcile, dropping");
                            queue.complete(&key).await;
                        }
                        Err(err) => {
                            error!(kind, worker_id, namespace, name, %err, "reconcile failed, backing off");
                            queue.fail_and_reschedule(key).await;
                        }
                    }
                }
            })
        })
        .collect();

    tokio::select! {
        _ = feeder => {}
        _ = futures::future::join_all(workers) => {}
    }
}
