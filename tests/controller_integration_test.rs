//! Exercises the reconcile driver (`services::controller::run`) against the
//! in-memory cluster gateway: a watch event must result in the reconciler
//! actually running and writing status back, with no real cluster involved.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use kais_operator::adapters::memory::InMemoryClusterGateway;
use kais_operator::domain::errors::GatewayError;
use kais_operator::domain::models::{CellPhase, CellSpec, MindSpec, ObjectMeta};
use kais_operator::domain::models::Cell;
use kais_operator::services::controller::{self, ReconcileKey};
use kais_operator::services::work_queue::WorkQueue;
use kais_operator::services::CellReconciler;

fn sample_cell(name: &str) -> Cell {
    Cell {
        metadata: ObjectMeta::new(name, "default"),
        spec: CellSpec {
            mind: MindSpec {
                provider: "anthropic".into(),
                model: "sonnet".into(),
                system_prompt: "assist".into(),
                temperature: None,
                max_tokens: None,
            },
            tools: Vec::new(),
            resources: None,
            parent_ref: None,
            formation_ref: None,
        },
        status: None,
    }
}

#[tokio::test]
async fn watch_event_drives_reconcile_and_writes_status() {
    let gateway = Arc::new(InMemoryClusterGateway::new());
    let reconciler = Arc::new(CellReconciler::new(gateway.clone()));
    let queue = Arc::new(WorkQueue::<ReconcileKey>::new());

    let watch_stream: futures::stream::BoxStream<'static, Result<ReconcileKey, GatewayError>> =
        Box::pin(gateway.watch_cells("default").map(|event| {
            event.map(|e| {
                let cell = e.into_inner();
                (cell.metadata.namespace, cell.metadata.name)
            })
        }));

    let driver = {
        let gateway = gateway.clone();
        let reconciler = reconciler.clone();
        tokio::spawn(controller::run(
            "Cell",
            queue,
            watch_stream,
            2,
            move |(namespace, name)| {
                let gateway = gateway.clone();
                let reconciler = reconciler.clone();
                async move {
                    let cell = gateway.get_cell(&namespace, &name).await?;
                    reconciler
                        .reconcile(&cell)
                        .await
                        .map_err(|e| GatewayError::Fatal(e.to_string()))
                }
            },
        ))
    };

    gateway.create_cell(&sample_cell("researcher")).await.unwrap();

    // The reconciler runs asynchronously off the watch event; poll briefly
    // for the pod and status it should create.
    let mut observed = None;
    for _ in 0..50 {
        let cell = gateway.get_cell("default", "researcher").await.unwrap();
        if let Some(status) = cell.status {
            observed = Some(status);
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    driver.abort();

    let status = observed.expect("reconciler should have written a status within the poll window");
    assert_eq!(status.phase, CellPhase::Pending);
    assert!(gateway
        .get_pod("default", "cell-researcher")
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn deletion_between_event_and_reconcile_is_not_an_error() {
    let gateway = Arc::new(InMemoryClusterGateway::new());
    let reconciler = Arc::new(CellReconciler::new(gateway.clone()));
    let queue = Arc::new(WorkQueue::<ReconcileKey>::new());

    // No watch stream events at all; enqueue a key for an object that was
    // never created to simulate "deleted before the worker got to it".
    let empty_stream: futures::stream::BoxStream<'static, Result<ReconcileKey, GatewayError>> =
        Box::pin(futures::stream::empty());

    queue.enqueue(("default".to_string(), "ghost".to_string())).await;

    let driver = {
        let gateway = gateway.clone();
        let reconciler = reconciler.clone();
        tokio::spawn(controller::run(
            "Cell",
            queue.clone(),
            empty_stream,
            1,
            move |(namespace, name)| {
                let gateway = gateway.clone();
                let reconciler = reconciler.clone();
                async move {
                    let cell = gateway.get_cell(&namespace, &name).await?;
                    reconciler
                        .reconcile(&cell)
                        .await
                        .map_err(|e| GatewayError::Fatal(e.to_string()))
                }
            },
        ))
    };

    for _ in 0..20 {
        if queue.is_empty().await {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    driver.abort();
    assert!(queue.is_empty().await);
}
