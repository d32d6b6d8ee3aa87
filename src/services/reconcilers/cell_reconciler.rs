//! Cell reconciler (C3, spec §4.3) — drives one Cell toward a running pod
//! that reflects its spec, and synthesizes status from the observed pod.

use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::errors::{DomainResult, GatewayError};
use crate::domain::models::{
    canonical_json, Cell, CellPhase, CellStatus, EventRecord, InvolvedObject, OwnerReference,
    PodPhase, PodRef,
};
use crate::domain::models::metadata::{LABEL_CELL, LABEL_ROLE, ROLE_CELL};
use crate::domain::ports::ClusterGateway;

const CELL_SPEC_ENV: &str = "CELL_SPEC";
const CELL_NAME_ENV: &str = "CELL_NAME";
const CELL_NAMESPACE_ENV: &str = "CELL_NAMESPACE";

pub struct CellReconciler {
    gateway: Arc<dyn ClusterGateway>,
}

impl CellReconciler {
    pub fn new(gateway: Arc<dyn ClusterGateway>) -> Self {
        Self { gateway }
    }

    /// Runs one reconcile pass for `cell` (spec §4.3 steps 1–5).
    pub async fn reconcile(&self, cell: &Cell) -> DomainResult<()> {
        let pod_name = cell.pod_name();
        let existing = match self.gateway.get_pod(&cell.metadata.namespace, &pod_name).await {
            Ok(pod) => pod,
            Err(GatewayError::NotFound(_)) => None,
            Err(err) => return Err(err.into()),
        };

        match existing {
            None => self.create_pod(cell, &pod_name).await,
            Some(pod) if matches!(pod.phase, PodPhase::Failed | PodPhase::Unknown) => {
                self.fail_cell(cell, &pod_name).await
            }
            Some(pod) if self.has_drifted(cell, &pod) => self.restart_for_drift(cell, &pod_name).await,
            Some(pod) => self.synthesize_status(cell, &pod).await,
        }
    }

    fn has_drifted(&self, cell: &Cell, pod: &PodRef) -> bool {
        let embedded = pod.env.get(CELL_SPEC_ENV);
        let current = canonical_json(&cell.spec).ok();
        match (embedded, current.as_ref()) {
            (Some(embedded), Some(current)) => embedded != current,
            _ => true,
        }
    }

    async fn create_pod(&self, cell: &Cell, pod_name: &str) -> DomainResult<()> {
        let owner = OwnerReference::controller(
            "Cell",
            cell.metadata.name.clone(),
            cell.metadata.uid.clone().unwrap_or_default(),
        );
        let spec_json = canonical_json(&cell.spec)?;
        let metadata = crate::domain::models::ObjectMeta::new(pod_name, &cell.metadata.namespace)
            .with_label(LABEL_CELL, &cell.metadata.name)
            .with_label(LABEL_ROLE, ROLE_CELL)
            .with_owner(owner);
        let pod = PodRef::new(metadata, PodPhase::Pending)
            .with_env(CELL_SPEC_ENV, spec_json)
            .with_env(CELL_NAME_ENV, &cell.metadata.name)
            .with_env(CELL_NAMESPACE_ENV, &cell.metadata.namespace);

        self.gateway.create_pod(&pod).await?;

        let mut status = cell.status.clone().unwrap_or_default();
        status.phase = CellPhase::Pending;
        status.pod_name = Some(pod_name.to_string());
        self.write_status(cell, status).await?;

        self.emit(cell, "CellCreated", "PodCreated").await;
        info!(cell = %cell.metadata.name, pod = %pod_name, "created cell pod");
        Ok(())
    }

    async fn fail_cell(&self, cell: &Cell, pod_name: &str) -> DomainResult<()> {
        self.gateway.delete_pod(&cell.metadata.namespace, pod_name).await?;

        let mut status = cell.status.clone().unwrap_or_default();
        status.phase = CellPhase::Failed;
        status.message = Some(format!("pod {pod_name} entered a failed or unknown phase"));
        self.write_status(cell, status).await?;

        self.emit(cell, "CellFailed", "pod failed").await;
        warn!(cell = %cell.metadata.name, pod = %pod_name, "cell pod failed");
        Ok(())
    }

    async fn restart_for_drift(&self, cell: &Cell, pod_name: &str) -> DomainResult<()> {
        self.gateway.delete_pod(&cell.metadata.namespace, pod_name).await?;
        self.emit(cell, "SpecChanged", "spec drifted from running pod; restarting").await;
        info!(cell = %cell.metadata.name, "spec drift detected, pod deleted for rolling restart");
        Ok(())
    }

    async fn synthesize_status(&self, cell: &Cell, pod: &PodRef) -> DomainResult<()> {
        let phase = match pod.phase {
            PodPhase::Pending => CellPhase::Pending,
            PodPhase::Running => CellPhase::Running,
            PodPhase::Succeeded => CellPhase::Completed,
            PodPhase::Failed | PodPhase::Unknown => CellPhase::Failed,
        };
        let mut status = cell.status.clone().unwrap_or_default();
        status.phase = phase;
        status.pod_name = Some(pod.metadata.name.clone());
        self.write_status(cell, status).await
    }

    async fn write_status(&self, cell: &Cell, status: CellStatus) -> DomainResult<()> {
        let mut updated = cell.clone();
        updated.status = Some(status);
        self.gateway.update_cell_status(&updated).await?;
        Ok(())
    }

    async fn emit(&self, cell: &Cell, reason: &str, message: &str) {
        self.gateway
            .emit_event(EventRecord::normal(
                reason,
                message,
                InvolvedObject {
                    kind: "Cell".into(),
                    namespace: cell.metadata.namespace.clone(),
                    name: cell.metadata.name.clone(),
                    uid: cell.metadata.uid.clone(),
                },
            ))
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryClusterGateway;
    use crate::domain::models::{CellSpec, MindSpec, ObjectMeta};

    fn sample_cell(model: &str) -> Cell {
        Cell {
            metadata: ObjectMeta::new("researcher", "default"),
            spec: CellSpec {
                mind: MindSpec {
                    provider: "anthropic".into(),
                    model: model.into(),
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
    async fn creates_pod_when_absent() {
        let gateway = Arc::new(InMemoryClusterGateway::new());
        let reconciler = CellReconciler::new(gateway.clone());
        let cell = sample_cell("sonnet");
        gateway.create_cell(&cell).await.unwrap();

        reconciler.reconcile(&cell).await.unwrap();

        let pod = gateway.get_pod("default", "cell-researcher").await.unwrap();
        assert!(pod.is_some());
        let updated = gateway.get_cell("default", "researcher").await.unwrap();
        assert_eq!(updated.status.unwrap().phase, CellPhase::Pending);
    }

    #[tokio::test]
    async fn steady_state_does_not_recreate_pod() {
        let gateway = Arc::new(InMemoryClusterGateway::new());
        let reconciler = CellReconciler::new(gateway.clone());
        let cell = sample_cell("sonnet");
        gateway.create_cell(&cell).await.unwrap();

        reconciler.reconcile(&cell).await.unwrap();
        let refreshed = gateway.get_cell("default", "researcher").await.unwrap();
        reconciler.reconcile(&refreshed).await.unwrap();
        reconciler.reconcile(&refreshed).await.unwrap();

        let pod = gateway.get_pod("default", "cell-researcher").await.unwrap().unwrap();
        assert_eq!(pod.env.get(CELL_SPEC_ENV), Some(&canonical_json(&cell.spec).unwrap()));
    }

    #[tokio::test]
    async fn drift_deletes_pod_without_recreating() {
        let gateway = Arc::new(InMemoryClusterGateway::new());
        let reconciler = CellReconciler::new(gateway.clone());
        let cell = sample_cell("sonnet");
        gateway.create_cell(&cell).await.unwrap();
        reconciler.reconcile(&cell).await.unwrap();

        let mut changed = gateway.get_cell("default", "researcher").await.unwrap();
        changed.spec.mind.model = "opus".into();
        gateway.update_cell(&changed).await.unwrap();

        reconciler.reconcile(&changed).await.unwrap();

        let pod = gateway.get_pod("default", "cell-researcher").await.unwrap();
        assert!(pod.is_none());
    }
}
