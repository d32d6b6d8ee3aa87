//! Cell-tree node — row in the recursive spawn hierarchy (spec §3, §4.7).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellTreeNode {
    pub cell_id: String,
    pub parent_id: Option<String>,
    pub root_id: String,
    pub depth: u32,
    /// `/`-joined ancestor ids ending at `cell_id` (spec §3 invariant).
    pub path: String,
    pub descendant_count: u32,
    pub namespace: String,
}

impl CellTreeNode {
    pub fn root(cell_id: impl Into<String>, namespace: impl Into<String>) -> Self {
        let cell_id = cell_id.into();
        Self {
            path: cell_id.clone(),
            root_id: cell_id.clone(),
            cell_id,
            parent_id: None,
            depth: 0,
            descendant_count: 0,
            namespace: namespace.into(),
        }
    }

    pub const fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Whether `self` is a strict ancestor of `other`, determined purely
    /// from the materialized path (spec §4.7, §9 "materialized path").
    pub fn is_strict_ancestor_of(&self, other: &Self) -> bool {
        other.path.len() > self.path.len() && other.path.starts_with(&format!("{}/", self.path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_has_expected_invariants() {
        let r = CellTreeNode::root("r1", "default");
        assert_eq!(r.depth, 0);
        assert!(r.parent_id.is_none());
        assert_eq!(r.root_id, "r1");
        assert_eq!(r.path, "r1");
    }

    #[test]
    fn ancestor_prefix_match_requires_separator() {
        let r = CellTreeNode::root("r1", "default");
        let sibling = CellTreeNode {
            cell_id: "r10".into(),
            parent_id: None,
            root_id: "r10".into(),
            depth: 0,
            path: "r10".into(),
            descendant_count: 0,
            namespace: "default".into(),
        };
        assert!(!r.is_strict_ancestor_of(&sibling));
    }
}
