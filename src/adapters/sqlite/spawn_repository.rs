//! SQLite [`SpawnStore`] — production persistence for pending and decided
//! spawn requests (spec §4.9).

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{SpawnChildRequest, SpawnRequest, SpawnRequestStatus};
use crate::domain::ports::SpawnStore;

pub struct SqliteSpawnStore {
    pool: SqlitePool,
}

impl SqliteSpawnStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn status_to_str(status: SpawnRequestStatus) -> &'static str {
    match status {
        SpawnRequestStatus::Pending => "Pending",
        SpawnRequestStatus::Approved => "Approved",
        SpawnRequestStatus::Rejected => "Rejected",
    }
}

fn status_from_str(s: &str) -> DomainResult<SpawnRequestStatus> {
    match s {
        "Pending" => Ok(SpawnRequestStatus::Pending),
        "Approved" => Ok(SpawnRequestStatus::Approved),
        "Rejected" => Ok(SpawnRequestStatus::Rejected),
        other => Err(DomainError::Storage(format!("unknown spawn request status {other}"))),
    }
}

fn row_to_request(row: &sqlx::sqlite::SqliteRow) -> DomainResult<SpawnRequest> {
    let id: String = row.get("id");
    let requested_spec: String = row.get("requested_spec");
    let created_at: String = row.get("created_at");
    let decided_at: Option<String> = row.get("decided_at");

    Ok(SpawnRequest {
        id: Uuid::parse_str(&id).map_err(|e| DomainError::Storage(e.to_string()))?,
        name: row.get("name"),
        namespace: row.get("namespace"),
        requestor_cell_id: row.get("requestor_cell_id"),
        requested_spec: serde_json::from_str::<SpawnChildRequest>(&requested_spec)
            .map_err(DomainError::Serialization)?,
        reason: row.get("reason"),
        status: status_from_str(&row.get::<String, _>("status"))?,
        decided_by: row.get("decided_by"),
        decided_at: decided_at
            .map(|s| s.parse())
            .transpose()
            .map_err(|e| DomainError::Storage(format!("invalid decided_at: {e}")))?,
        rejection_reason: row.get("rejection_reason"),
        created_at: created_at
            .parse()
            .map_err(|e| DomainError::Storage(format!("invalid created_at: {e}")))?,
    })
}

#[async_trait]
impl SpawnStore for SqliteSpawnStore {
    async fn enqueue(&self, request: SpawnRequest) -> DomainResult<SpawnRequest> {
        let requested_spec = serde_json::to_string(&request.requested_spec).map_err(DomainError::Serialization)?;
        let created_at = request.created_at.to_rfc3339();
        let status = status_to_str(request.status);

        sqlx::query(
            r#"
            INSERT INTO spawn_requests (
                id, name, namespace, requestor_cell_id, requested_spec,
                reason, status, decided_by, decided_at, rejection_reason, created_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(request.id.to_string())
        .bind(&request.name)
        .bind(&request.namespace)
        .bind(&request.requestor_cell_id)
        .bind(&requested_spec)
        .bind(&request.reason)
        .bind(status)
        .bind(&request.decided_by)
        .bind(request.decided_at.map(|d| d.to_rfc3339()))
        .bind(&request.rejection_reason)
        .bind(&created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::Storage(e.to_string()))?;

        Ok(request)
    }

    async fn get(&self, id: Uuid) -> DomainResult<Option<SpawnRequest>> {
        let row = sqlx::query("SELECT * FROM spawn_requests WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::Storage(e.to_string()))?;

        row.as_ref().map(row_to_request).transpose()
    }

    async fn list_by_status(&self, status: SpawnRequestStatus) -> DomainResult<Vec<SpawnRequest>> {
        let rows = sqlx::query("SELECT * FROM spawn_requests WHERE status = ? ORDER BY created_at ASC")
            .bind(status_to_str(status))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DomainError::Storage(e.to_string()))?;

        rows.iter().map(row_to_request).collect()
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: SpawnRequestStatus,
        decided_by: Option<String>,
        rejection_reason: Option<String>,
    ) -> DomainResult<SpawnRequest> {
        let decided_at = Utc::now().to_rfc3339();
        let result = sqlx::query(
            r#"
            UPDATE spawn_requests SET
                status = ?,
                decided_by = ?,
                decided_at = ?,
                rejection_reason = ?
            WHERE id = ?
            "#,
        )
        .bind(status_to_str(status))
        .bind(&decided_by)
        .bind(&decided_at)
        .bind(&rejection_reason)
        .bind(id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::Storage(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::Validation(format!("unknown spawn request {id}")));
        }

        self.get(id)
            .await?
            .ok_or_else(|| DomainError::Storage(format!("spawn request {id} vanished after update")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::connection::DatabaseConnection;

    async fn pool() -> SqlitePool {
        let db = DatabaseConnection::connect("sqlite::memory:", 5).await.unwrap();
        db.migrate().await.unwrap();
        db.pool().clone()
    }

    fn request() -> SpawnRequest {
        SpawnRequest {
            id: Uuid::new_v4(),
            name: "helper".into(),
            namespace: "default".into(),
            requestor_cell_id: "researcher".into(),
            requested_spec: SpawnChildRequest {
                name: "helper".into(),
                system_prompt: "assist".into(),
                budget: Some(5.0),
                blueprint_ref: None,
            },
            reason: "need a hand".into(),
            status: SpawnRequestStatus::Pending,
            decided_by: None,
            decided_at: None,
            rejection_reason: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn enqueue_then_get_round_trips() {
        let store = SqliteSpawnStore::new(pool().await);
        let req = request();
        store.enqueue(req.clone()).await.unwrap();

        let fetched = store.get(req.id).await.unwrap().unwrap();
        assert_eq!(fetched.name, "helper");
        assert_eq!(fetched.status, SpawnRequestStatus::Pending);
    }

    #[tokio::test]
    async fn update_status_sets_decision_fields() {
        let store = SqliteSpawnStore::new(pool().await);
        let req = request();
        store.enqueue(req.clone()).await.unwrap();

        let updated = store
            .update_status(req.id, SpawnRequestStatus::Approved, Some("admin".into()), None)
            .await
            .unwrap();
        assert_eq!(updated.status, SpawnRequestStatus::Approved);
        assert_eq!(updated.decided_by.as_deref(), Some("admin"));
        assert!(updated.decided_at.is_some());
    }

    #[tokio::test]
    async fn list_by_status_filters() {
        let store = SqliteSpawnStore::new(pool().await);
        let pending = request();
        let mut approved = request();
        approved.id = Uuid::new_v4();
        approved.status = SpawnRequestStatus::Approved;
        store.enqueue(pending.clone()).await.unwrap();
        store.enqueue(approved).await.unwrap();

        let pending_list = store.list_by_status(SpawnRequestStatus::Pending).await.unwrap();
        assert_eq!(pending_list.len(), 1);
        assert_eq!(pending_list[0].id, pending.id);
    }
}
