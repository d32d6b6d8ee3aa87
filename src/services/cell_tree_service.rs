//! Cell tree service (spec §4.7 "C7 Cell tree").
//!
//! Maintains the materialized-path tree of spawned cells behind a
//! [`TreeStore`] and derives the queries the recursion validator and
//! reconcilers need: descendant counts, subtree listing, and subtree
//! removal on cascade delete.

use std::sync::Arc;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::CellTreeNode;
use crate::domain::ports::TreeStore;

pub struct CellTreeService {
    store: Arc<dyn TreeStore>,
}

impl CellTreeService {
    pub fn new(store: Arc<dyn TreeStore>) -> Self {
        Self { store }
    }

    /// Registers `cell_id` as a root cell with no parent.
    pub async fn register_root(&self, cell_id: &str, namespace: &str) -> DomainResult<CellTreeNode> {
        self.store.insert(CellTreeNode::root(cell_id, namespace)).await
    }

    /// Registers `cell_id` as a child of `parent_id`, deriving `depth`,
    /// `root_id`, and `path` from the parent's node (spec §4.7, §9
    /// "materialized path").
    pub async fn register_child(
        &self,
        cell_id: &str,
        parent_id: &str,
        namespace: &str,
    ) -> DomainResult<CellTreeNode> {
        let parent = self
            .store
            .get(parent_id)
            .await?
            .ok_or_else(|| DomainError::Validation(format!("unknown parent cell {parent_id}")))?;
        let node = CellTreeNode {
            cell_id: cell_id.to_string(),
            parent_id: Some(parent_id.to_string()),
            root_id: parent.root_id.clone(),
            depth: parent.depth + 1,
            path: format!("{}/{cell_id}", parent.path),
            descendant_count: 0,
            namespace: namespace.to_string(),
        };
        self.store.insert(node).await
    }

    pub async fn get(&self, cell_id: &str) -> DomainResult<Option<CellTreeNode>> {
        self.store.get(cell_id).await
    }

    pub async fn descendant_count(&self, cell_id: &str) -> DomainResult<u32> {
        self.store.descendant_count(cell_id).await
    }

    pub async fn subtree(&self, cell_id: &str) -> DomainResult<Vec<CellTreeNode>> {
        self.store.subtree(cell_id).await
    }

    /// Removes `cell_id` and every descendant, used when a root or
    /// intermediate cell is deleted (spec §4.3 cascade delete).
    pub async fn remove_subtree(&self, cell_id: &str) -> DomainResult<()> {
        self.store.remove_subtree(cell_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryTreeStore;

    fn service() -> CellTreeService {
        CellTreeService::new(Arc::new(InMemoryTreeStore::new()))
    }

    #[tokio::test]
    async fn child_inherits_root_and_increments_depth() {
        let svc = service();
        svc.register_root("r", "default").await.unwrap();
        let child = svc.register_child("c1", "r", "default").await.unwrap();
        assert_eq!(child.root_id, "r");
        assert_eq!(child.depth, 1);
        assert_eq!(child.path, "r/c1");
    }

    #[tokio::test]
    async fn descendant_count_reflects_full_subtree() {
        let svc = service();
        svc.register_root("r", "default").await.unwrap();
        svc.register_child("c1", "r", "default").await.unwrap();
        svc.register_child("c2", "r", "default").await.unwrap();
        svc.register_child("g1", "c1", "default").await.unwrap();
        assert_eq!(svc.descendant_count("r").await.unwrap(), 3);
        assert_eq!(svc.descendant_count("c1").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn remove_subtree_drops_descendants_only() {
        let svc = service();
        svc.register_root("r", "default").await.unwrap();
        svc.register_child("c1", "r", "default").await.unwrap();
        svc.register_child("c2", "r", "default").await.unwrap();
        svc.remove_subtree("c1").await.unwrap();
        assert!(svc.get("c1").await.unwrap().is_none());
        assert!(svc.get("c2").await.unwrap().is_some());
        assert_eq!(svc.descendant_count("r").await.unwrap(), 1);
    }
}
