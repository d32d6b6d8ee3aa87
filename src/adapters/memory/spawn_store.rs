//! In-memory [`SpawnStore`] — backs tests and `--local` mode.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{SpawnRequest, SpawnRequestStatus};
use crate::domain::ports::SpawnStore;

#[derive(Default)]
pub struct InMemorySpawnStore {
    requests: RwLock<HashMap<Uuid, SpawnRequest>>,
}

impl InMemorySpawnStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SpawnStore for InMemorySpawnStore {
    async fn enqueue(&self, request: SpawnRequest) -> DomainResult<SpawnRequest> {
        let mut requests = self.requests.write().await;
        requests.insert(request.id, request.clone());
        Ok(request)
    }

    async fn get(&self, id: Uuid) -> DomainResult<Option<SpawnRequest>> {
        Ok(self.requests.read().await.get(&id).cloned())
    }

    async fn list_by_status(&self, status: SpawnRequestStatus) -> DomainResult<Vec<SpawnRequest>> {
        Ok(self
            .requests
            .read()
            .await
            .values()
            .filter(|r| r.status == status)
            .cloned()
            .collect())
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: SpawnRequestStatus,
        decided_by: Option<String>,
        rejection_reason: Option<String>,
    ) -> DomainResult<SpawnRequest> {
        let mut requests = self.requests.write().await;
        let request = requests
            .get_mut(&id)
            .ok_or_else(|| DomainError::Validation(format!("unknown spawn request {id}")))?;
        request.status = status;
        request.decided_by = decided_by;
        request.rejection_reason = rejection_reason;
        request.decided_at = Some(Utc::now());
        Ok(request.clone())
    }
}
