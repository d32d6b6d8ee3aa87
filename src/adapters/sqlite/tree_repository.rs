//! SQLite [`TreeStore`] — production persistence for the materialized-path
//! cell tree (spec §4.7).

use async_trait::async_trait;
use sqlx::{Row, SqlitePool};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::CellTreeNode;
use crate::domain::ports::TreeStore;

pub struct SqliteTreeStore {
    pool: SqlitePool,
}

impl SqliteTreeStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn row_to_node(row: &sqlx::sqlite::SqliteRow) -> CellTreeNode {
    CellTreeNode {
        cell_id: row.get("cell_id"),
        parent_id: row.get("parent_id"),
        root_id: row.get("root_id"),
        depth: row.get::<i64, _>("depth") as u32,
        path: row.get("path"),
        descendant_count: 0,
        namespace: row.get("namespace"),
    }
}

#[async_trait]
impl TreeStore for SqliteTreeStore {
    async fn insert(&self, node: CellTreeNode) -> DomainResult<CellTreeNode> {
        sqlx::query(
            r#"
            INSERT INTO cell_tree_nodes (cell_id, parent_id, root_id, depth, path, namespace)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(cell_id) DO UPDATE SET
                parent_id = excluded.parent_id,
                root_id = excluded.root_id,
                depth = excluded.depth,
                path = excluded.path,
                namespace = excluded.namespace
            "#,
        )
        .bind(&node.cell_id)
        .bind(&node.parent_id)
        .bind(&node.root_id)
        .bind(node.depth as i64)
        .bind(&node.path)
        .bind(&node.namespace)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::Storage(e.to_string()))?;

        Ok(node)
    }

    async fn get(&self, cell_id: &str) -> DomainResult<Option<CellTreeNode>> {
        let row = sqlx::query("SELECT * FROM cell_tree_nodes WHERE cell_id = ?")
            .bind(cell_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::Storage(e.to_string()))?;

        Ok(row.as_ref().map(row_to_node))
    }

    async fn subtree(&self, cell_id: &str) -> DomainResult<Vec<CellTreeNode>> {
        let Some(root) = self.get(cell_id).await? else {
            return Ok(Vec::new());
        };

        let rows = sqlx::query(
            r#"
            SELECT * FROM cell_tree_nodes
            WHERE cell_id = ? OR path LIKE ?
            ORDER BY path ASC
            "#,
        )
        .bind(&root.cell_id)
        .bind(format!("{}/%", root.path))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::Storage(e.to_string()))?;

        Ok(rows.iter().map(row_to_node).collect())
    }

    async fn descendant_count(&self, cell_id: &str) -> DomainResult<u32> {
        let Some(root) = self.get(cell_id).await? else {
            return Ok(0);
        };

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM cell_tree_nodes WHERE path LIKE ?")
            .bind(format!("{}/%", root.path))
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DomainError::Storage(e.to_string()))?;

        Ok(count as u32)
    }

    async fn remove_subtree(&self, cell_id: &str) -> DomainResult<()> {
        let Some(root) = self.get(cell_id).await? else {
            return Ok(());
        };

        sqlx::query("DELETE FROM cell_tree_nodes WHERE cell_id = ? OR path LIKE ?")
            .bind(&root.cell_id)
            .bind(format!("{}/%", root.path))
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::Storage(e.to_string()))?;

        Ok(())
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

    #[tokio::test]
    async fn subtree_and_descendant_count_use_materialized_path() {
        let store = SqliteTreeStore::new(pool().await);
        store.insert(CellTreeNode::root("r", "default")).await.unwrap();
        store
            .insert(CellTreeNode {
                cell_id: "c1".into(),
                parent_id: Some("r".into()),
                root_id: "r".into(),
                depth: 1,
                path: "r/c1".into(),
                descendant_count: 0,
                namespace: "default".into(),
            })
            .await
            .unwrap();
        store
            .insert(CellTreeNode {
                cell_id: "c10".into(),
                parent_id: None,
                root_id: "c10".into(),
                depth: 0,
                path: "c10".into(),
                descendant_count: 0,
                namespace: "default".into(),
            })
            .await
            .unwrap();

        assert_eq!(store.descendant_count("r").await.unwrap(), 1);
        let subtree = store.subtree("r").await.unwrap();
        assert_eq!(subtree.len(), 2);
        assert!(subtree.iter().all(|n| n.cell_id != "c10"));
    }

    #[tokio::test]
    async fn remove_subtree_deletes_only_descendants() {
        let store = SqliteTreeStore::new(pool().await);
        store.insert(CellTreeNode::root("r", "default")).await.unwrap();
        store
            .insert(CellTreeNode {
                cell_id: "c1".into(),
                parent_id: Some("r".into()),
                root_id: "r".into(),
                depth: 1,
                path: "r/c1".into(),
                descendant_count: 0,
                namespace: "default".into(),
            })
            .await
            .unwrap();

        store.remove_subtree("r").await.unwrap();
        assert!(store.get("r").await.unwrap().is_none());
        assert!(store.get("c1").await.unwrap().is_none());
    }
}
