//! Cell-tree persistence port (spec §4.7 "C7 Cell tree").

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::CellTreeNode;

/// Materialized-path tree of spawned cells (spec §3, §9 "materialized
/// path"). Subtree queries are prefix queries over `path`, which is what
/// makes them O(matching rows) rather than requiring recursive joins.
#[async_trait]
pub trait TreeStore: Send + Sync {
    async fn insert(&self, node: CellTreeNode) -> DomainResult<CellTreeNode>;

    async fn get(&self, cell_id: &str) -> DomainResult<Option<CellTreeNode>>;

    /// All nodes whose path is `node.path` or a descendant of it,
    /// including `node` itself.
    async fn subtree(&self, cell_id: &str) -> DomainResult<Vec<CellTreeNode>>;

    /// Count of strict descendants of `cell_id` (used by the recursion
    /// validator's `maxDescendants` check, spec §4.9).
    async fn descendant_count(&self, cell_id: &str) -> DomainResult<u32>;

    /// Removes `cell_id` and every descendant from the tree.
    async fn remove_subtree(&self, cell_id: &str) -> DomainResult<()>;
}
