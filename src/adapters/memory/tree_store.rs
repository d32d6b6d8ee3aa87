//! In-memory [`TreeStore`] — backs tests and `--local` mode.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::errors::DomainResult;
use crate::domain::models::CellTreeNode;
use crate::domain::ports::TreeStore;

#[derive(Default)]
pub struct InMemoryTreeStore {
    nodes: RwLock<HashMap<String, CellTreeNode>>,
}

impl InMemoryTreeStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TreeStore for InMemoryTreeStore {
    async fn insert(&self, node: CellTreeNode) -> DomainResult<CellTreeNode> {
        let mut nodes = self.nodes.write().await;
        nodes.insert(node.cell_id.clone(), node.clone());
        Ok(node)
    }

    async fn get(&self, cell_id: &str) -> DomainResult<Option<CellTreeNode>> {
        Ok(self.nodes.read().await.get(cell_id).cloned())
    }

    async fn subtree(&self, cell_id: &str) -> DomainResult<Vec<CellTreeNode>> {
        let nodes = self.nodes.read().await;
        let Some(root) = nodes.get(cell_id) else {
            return Ok(Vec::new());
        };
        let mut result: Vec<CellTreeNode> = nodes
            .values()
            .filter(|n| n.cell_id == root.cell_id || root.is_strict_ancestor_of(n))
            .cloned()
            .collect();
        result.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(result)
    }

    async fn descendant_count(&self, cell_id: &str) -> DomainResult<u32> {
        let nodes = self.nodes.read().await;
        let Some(root) = nodes.get(cell_id) else {
            return Ok(0);
        };
        Ok(nodes.values().filter(|n| root.is_strict_ancestor_of(n)).count() as u32)
    }

    async fn remove_subtree(&self, cell_id: &str) -> DomainResult<()> {
        let mut nodes = self.nodes.write().await;
        let Some(root) = nodes.get(cell_id).cloned() else {
            return Ok(());
        };
        nodes.retain(|_, n| n.cell_id != root.cell_id && !root.is_strict_ancestor_of(n));
        Ok(())
    }
}
