//! Spawn-request persistence port (spec §4.9 "C9 Recursion validator &
//! spawn queue").

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::{SpawnRequest, SpawnRequestStatus};

#[async_trait]
pub trait SpawnStore: Send + Sync {
    async fn enqueue(&self, request: SpawnRequest) -> DomainResult<SpawnRequest>;

    async fn get(&self, id: uuid::Uuid) -> DomainResult<Option<SpawnRequest>>;

    async fn list_by_status(&self, status: SpawnRequestStatus) -> DomainResult<Vec<SpawnRequest>>;

    async fn update_status(
        &self,
        id: uuid::Uuid,
        status: SpawnRequestStatus,
        decided_by: Option<String>,
        rejection_reason: Option<String>,
    ) -> DomainResult<SpawnRequest>;
}
