//! Spawn queue service (spec §4.9).
//!
//! Applies [`recursion_validator::evaluate`] to an incoming
//! [`SpawnChildRequest`] and records the outcome in the [`SpawnStore`]:
//! allowed requests are recorded already-approved (the caller still has to
//! actually create the Cell); rejected requests are recorded rejected with
//! a reason; requests needing approval are recorded pending for an operator
//! to later approve or reject via [`SpawnQueueService::decide`].

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    CellTreeNode, RecursionSpec, SpawnChildRequest, SpawnDecision, SpawnRequest, SpawnRequestStatus,
};
use crate::domain::ports::{SpawnStore, TreeStore};

use super::recursion_validator;

pub struct SpawnQueueService {
    spawn_store: Arc<dyn SpawnStore>,
    tree_store: Arc<dyn TreeStore>,
}

impl SpawnQueueService {
    pub fn new(spawn_store: Arc<dyn SpawnStore>, tree_store: Arc<dyn TreeStore>) -> Self {
        Self { spawn_store, tree_store }
    }

    /// Evaluates and records a spawn request from `requestor_cell_id`,
    /// returning both the stored request and the decision the caller
    /// should act on.
    pub async fn submit(
        &self,
        namespace: &str,
        requestor_cell_id: &str,
        requested_spec: SpawnChildRequest,
        recursion: &RecursionSpec,
    ) -> DomainResult<(SpawnRequest, SpawnDecision)> {
        let requestor_node: CellTreeNode = self
            .tree_store
            .get(requestor_cell_id)
            .await?
            .ok_or_else(|| DomainError::Validation(format!("unknown requestor cell {requestor_cell_id}")))?;
        let descendant_count = self.tree_store.descendant_count(requestor_cell_id).await?;

        let decision = recursion_validator::evaluate(&requestor_node, descendant_count, recursion);

        let (status, rejection_reason) = match &decision {
            SpawnDecision::Allowed => (SpawnRequestStatus::Approved, None),
            SpawnDecision::Rejected { reason } => (SpawnRequestStatus::Rejected, Some(reason.clone())),
            SpawnDecision::Pending { .. } => (SpawnRequestStatus::Pending, None),
        };

        let request = SpawnRequest {
            id: Uuid::new_v4(),
            name: requested_spec.name.clone(),
            namespace: namespace.to_string(),
            requestor_cell_id: requestor_cell_id.to_string(),
            requested_spec,
            reason: match &decision {
                SpawnDecision::Allowed => "within recursion limits".to_string(),
                SpawnDecision::Rejected { reason } | SpawnDecision::Pending { reason } => reason.clone(),
            },
            status,
            decided_by: None,
            decided_at: if status == SpawnRequestStatus::Pending { None } else { Some(Utc::now()) },
            rejection_reason,
            created_at: Utc::now(),
        };

        let stored = self.spawn_store.enqueue(request).await?;
        Ok((stored, decision))
    }

    /// Resolves a pending spawn request following operator review.
    pub async fn decide(
        &self,
        id: Uuid,
        approve: bool,
        decided_by: impl Into<String>,
        rejection_reason: Option<String>,
    ) -> DomainResult<SpawnRequest> {
        let status = if approve {
            SpawnRequestStatus::Approved
        } else {
            SpawnRequestStatus::Rejected
        };
        self.spawn_store
            .update_status(id, status, Some(decided_by.into()), rejection_reason)
            .await
    }

    pub async fn pending(&self) -> DomainResult<Vec<SpawnRequest>> {
        self.spawn_store.list_by_status(SpawnRequestStatus::Pending).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{InMemorySpawnStore, InMemoryTreeStore};
    use crate::domain::models::SpawnPolicy;

    async fn service_with_root() -> (SpawnQueueService, Arc<InMemoryTreeStore>) {
        let tree = Arc::new(InMemoryTreeStore::new());
        tree.insert(CellTreeNode::root("lead-0", "default")).await.unwrap();
        let spawn = Arc::new(InMemorySpawnStore::new());
        (SpawnQueueService::new(spawn, tree.clone()), tree)
    }

    fn child_request(name: &str) -> SpawnChildRequest {
        SpawnChildRequest {
            name: name.to_string(),
            system_prompt: "help out".into(),
            budget: Some(1.0),
            blueprint_ref: None,
        }
    }

    #[tokio::test]
    async fn open_policy_auto_approves() {
        let (svc, _tree) = service_with_root().await;
        let recursion = RecursionSpec { max_depth: 3, max_descendants: 5, spawn_policy: SpawnPolicy::Open };
        let (stored, decision) = svc
            .submit("default", "lead-0", child_request("helper-0"), &recursion)
            .await
            .unwrap();
        assert!(decision.is_allowed());
        assert_eq!(stored.status, SpawnRequestStatus::Approved);
    }

    #[tokio::test]
    async fn approval_required_leaves_request_pending() {
        let (svc, _tree) = service_with_root().await;
        let recursion = RecursionSpec {
            max_depth: 3,
            max_descendants: 5,
            spawn_policy: SpawnPolicy::ApprovalRequired,
        };
        let (stored, decision) = svc
            .submit("default", "lead-0", child_request("helper-0"), &recursion)
            .await
            .unwrap();
        assert!(matches!(decision, SpawnDecision::Pending { .. }));
        assert_eq!(stored.status, SpawnRequestStatus::Pending);

        let decided = svc.decide(stored.id, true, "operator", None).await.unwrap();
        assert_eq!(decided.status, SpawnRequestStatus::Approved);
    }
}
