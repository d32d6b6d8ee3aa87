//! Recursion validator (spec §4.9 "C9 Recursion validator & spawn queue").
//!
//! Pure decision function: given a requesting cell's tree position, its
//! [`RecursionSpec`], and the spawn policy, decides whether a spawn request
//! is immediately allowed, rejected, or needs to go through the approval
//! queue. Has no side effects; the spawn queue service is responsible for
//! acting on the decision.

use crate::domain::models::{CellTreeNode, RecursionSpec, SpawnDecision, SpawnPolicy};

/// Evaluates a spawn request from `requestor`, which sits at
/// `requestor_node` in the tree and has `descendant_count` existing
/// descendants.
pub fn evaluate(
    requestor_node: &CellTreeNode,
    descendant_count: u32,
    recursion: &RecursionSpec,
) -> SpawnDecision {
    if matches!(recursion.spawn_policy, SpawnPolicy::Disabled) {
        return SpawnDecision::Rejected {
            reason: "spawning is disabled for this cell".to_string(),
        };
    }

    let next_depth = requestor_node.depth + 1;
    if next_depth > recursion.max_depth {
        return SpawnDecision::Rejected {
            reason: format!(
                "spawn would exceed max depth {} (requestor is at depth {})",
                recursion.max_depth, requestor_node.depth
            ),
        };
    }

    if descendant_count >= recursion.max_descendants {
        return SpawnDecision::Rejected {
            reason: format!(
                "spawn would exceed max descendants {} (requestor already has {descendant_count})",
                recursion.max_descendants
            ),
        };
    }

    match recursion.spawn_policy {
        SpawnPolicy::Disabled => unreachable!("handled above"),
        SpawnPolicy::Open => SpawnDecision::Allowed,
        SpawnPolicy::ApprovalRequired => SpawnDecision::Pending {
            reason: "spawn requires operator approval".to_string(),
        },
        SpawnPolicy::BlueprintOnly => SpawnDecision::Pending {
            reason: "spawn requires a registered blueprint approval".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(depth: u32) -> CellTreeNode {
        CellTreeNode {
            cell_id: "r".into(),
            parent_id: None,
            root_id: "r".into(),
            depth,
            path: "r".into(),
            descendant_count: 0,
            namespace: "default".into(),
        }
    }

    fn recursion(max_depth: u32, max_descendants: u32, policy: SpawnPolicy) -> RecursionSpec {
        RecursionSpec {
            max_depth,
            max_descendants,
            spawn_policy: policy,
        }
    }

    #[test]
    fn disabled_policy_always_rejects() {
        let decision = evaluate(&node(0), 0, &recursion(5, 5, SpawnPolicy::Disabled));
        assert!(!decision.is_allowed());
    }

    #[test]
    fn exceeding_max_depth_rejects() {
        let decision = evaluate(&node(3), 0, &recursion(3, 10, SpawnPolicy::Open));
        assert!(matches!(decision, SpawnDecision::Rejected { .. }));
    }

    #[test]
    fn exceeding_max_descendants_rejects() {
        let decision = evaluate(&node(0), 10, &recursion(5, 10, SpawnPolicy::Open));
        assert!(matches!(decision, SpawnDecision::Rejected { .. }));
    }

    #[test]
    fn open_policy_within_limits_is_allowed() {
        let decision = evaluate(&node(0), 1, &recursion(5, 10, SpawnPolicy::Open));
        assert!(decision.is_allowed());
    }

    #[test]
    fn approval_required_within_limits_is_pending() {
        let decision = evaluate(&node(0), 1, &recursion(5, 10, SpawnPolicy::ApprovalRequired));
        assert!(matches!(decision, SpawnDecision::Pending { .. }));
    }
}
