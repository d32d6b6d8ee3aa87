//! Topology generation (spec §4.2 "C2 Topology generator").
//!
//! A pure function turning a [`TopologySpec`] and the set of cell names a
//! Formation expands to into a [`RouteTable`]. No I/O, no cluster
//! dependency — the Formation reconciler calls this and writes the result
//! into the route ConfigMap.

use std::collections::BTreeMap;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{RouteTable, TopologySpec};

/// Generates the route table for `cell_names` under `topology`.
///
/// `cell_names` should be the Formation's desired cell names
/// ([`FormationSpec::desired_cell_names`](crate::domain::models::FormationSpec::desired_cell_names));
/// order does not affect the result since the table is keyed by name.
pub fn generate(topology: &TopologySpec, cell_names: &[String]) -> DomainResult<RouteTable> {
    match topology {
        TopologySpec::FullMesh => Ok(full_mesh(cell_names)),
        TopologySpec::Hierarchy { root } => hierarchy(cell_names, root),
        TopologySpec::Star { hub } => star(cell_names, hub),
        TopologySpec::Ring => Ok(ring(cell_names)),
        TopologySpec::Stigmergy { .. } => Ok(stigmergy(cell_names)),
        TopologySpec::Custom { routes } => custom(cell_names, routes),
    }
}

/// Every cell may address every other cell.
fn full_mesh(cell_names: &[String]) -> RouteTable {
    let mut table = RouteTable::new();
    for name in cell_names {
        let peers = cell_names.iter().filter(|n| *n != name).cloned().collect();
        table.insert(name.clone(), peers);
    }
    table
}

/// `root` names a cell *template*, not a single cell: every cell whose name
/// expands from that template (`{root}-0`, `{root}-1`, ...) is a root. Every
/// root may address every non-root cell; every non-root cell may address
/// every root (spec §4.2, §8 scenario 4).
fn hierarchy(cell_names: &[String], root: &str) -> DomainResult<RouteTable> {
    let roots = expand_root_cells(cell_names, root);
    if roots.is_empty() {
        return Err(DomainError::Validation(format!(
            "hierarchy root template {root} matches no cells in the formation"
        )));
    }
    let root_set: std::collections::BTreeSet<&str> = roots.iter().map(String::as_str).collect();
    let others: Vec<String> = cell_names
        .iter()
        .filter(|n| !root_set.contains(n.as_str()))
        .cloned()
        .collect();

    let mut table = RouteTable::new();
    for root_cell in &roots {
        table.insert(root_cell.clone(), others.clone());
    }
    for other in &others {
        table.insert(other.clone(), roots.clone());
    }
    Ok(table)
}

/// `hub` addresses and is addressed by every spoke; spokes cannot address
/// each other directly. Same template-expansion rule as `hierarchy`.
fn star(cell_names: &[String], hub: &str) -> DomainResult<RouteTable> {
    hierarchy(cell_names, hub)
}

/// Every cell whose name expands from `template` (`{template}-0`,
/// `{template}-1`, ...).
fn expand_root_cells(cell_names: &[String], template: &str) -> Vec<String> {
    let prefix = format!("{template}-");
    cell_names.iter().filter(|n| n.starts_with(&prefix)).cloned().collect()
}

/// Each cell addresses its successor and predecessor, wrapping around,
/// so the route table is symmetric: `b ∈ route[a] ⇔ a ∈ route[b]` (spec
/// §4.2, §8).
fn ring(cell_names: &[String]) -> RouteTable {
    let mut table = RouteTable::new();
    let n = cell_names.len();
    for (i, name) in cell_names.iter().enumerate() {
        let peers = match n {
            0 | 1 => Vec::new(),
            2 => vec![cell_names[(i + 1) % n].clone()],
            _ => {
                let successor = cell_names[(i + 1) % n].clone();
                let predecessor = cell_names[(i + n - 1) % n].clone();
                vec![successor, predecessor]
            }
        };
        table.insert(name.clone(), peers);
    }
    table
}

/// No direct cell-to-cell routes are established; coordination happens
/// through the shared blackboard subject instead of routed messages (spec
/// §4.2: "all target lists empty").
fn stigmergy(cell_names: &[String]) -> RouteTable {
    cell_names.iter().map(|name| (name.clone(), Vec::new())).collect()
}

/// Explicit `from -> [to...]` routes, as declared.
fn custom(cell_names: &[String], routes: &[crate::domain::models::CustomRoute]) -> DomainResult<RouteTable> {
    let known: std::collections::BTreeSet<&str> = cell_names.iter().map(String::as_str).collect();
    let mut table: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for route in routes {
        if !known.contains(route.from.as_str()) {
            return Err(DomainError::Validation(format!(
                "custom route references unknown cell {}",
                route.from
            )));
        }
        for to in &route.to {
            if !known.contains(to.as_str()) {
                return Err(DomainError::Validation(format!(
                    "custom route references unknown cell {to}"
                )));
            }
        }
        table.entry(route.from.clone()).or_default().extend(route.to.clone());
    }
    for name in cell_names {
        table.entry(name.clone()).or_default();
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::CustomRoute;

    fn names(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("worker-{i}")).collect()
    }

    #[test]
    fn full_mesh_excludes_self() {
        let table = generate(&TopologySpec::FullMesh, &names(3)).unwrap();
        assert_eq!(table["worker-0"], vec!["worker-1", "worker-2"]);
    }

    /// Spec §8 scenario 4: a `lead` root template with two replicas plus two
    /// worker cells. Every worker can reach every lead; every lead can reach
    /// every worker, but not its co-lead.
    #[test]
    fn hierarchy_root_template_expands_to_multiple_roots() {
        let cells = vec!["lead-0".to_string(), "lead-1".to_string(), "worker-0".to_string(), "worker-1".to_string()];
        let table = generate(&TopologySpec::Hierarchy { root: "lead".into() }, &cells).unwrap();
        assert_eq!(table["worker-0"], vec!["lead-0", "lead-1"]);
        assert_eq!(table["lead-0"], vec!["worker-0", "worker-1"]);
        assert!(!table["lead-0"].contains(&"lead-1".to_string()));
    }

    #[test]
    fn hierarchy_single_root_routes_spokes_through_it() {
        let cells = names(3);
        let table = generate(&TopologySpec::Hierarchy { root: "worker-0".into() }, &cells).unwrap();
        assert_eq!(table["worker-1"], vec!["worker-0"]);
        assert_eq!(table["worker-0"], vec!["worker-1", "worker-2"]);
    }

    #[test]
    fn hierarchy_rejects_root_template_matching_no_cells() {
        let err = generate(&TopologySpec::Hierarchy { root: "ghost".into() }, &names(2));
        assert!(err.is_err());
    }

    #[test]
    fn ring_is_symmetric_for_three_cells() {
        let table = generate(&TopologySpec::Ring, &names(3)).unwrap();
        assert_eq!(table["worker-0"], vec!["worker-1", "worker-2"]);
        assert_eq!(table["worker-2"], vec!["worker-0", "worker-1"]);
        for a in names(3) {
            for b in table[&a].clone() {
                assert!(table[&b].contains(&a), "route[{b}] should contain {a}");
            }
        }
    }

    #[test]
    fn ring_two_cells_dedups_successor_and_predecessor() {
        let table = generate(&TopologySpec::Ring, &names(2)).unwrap();
        assert_eq!(table["worker-0"], vec!["worker-1"]);
        assert_eq!(table["worker-1"], vec!["worker-0"]);
    }

    #[test]
    fn ring_single_cell_has_no_peers() {
        let table = generate(&TopologySpec::Ring, &names(1)).unwrap();
        assert!(table["worker-0"].is_empty());
    }

    #[test]
    fn stigmergy_leaves_every_target_list_empty() {
        let table = generate(
            &TopologySpec::Stigmergy {
                blackboard: crate::domain::models::BlackboardSpec { decay_minutes: 5 },
            },
            &names(2),
        )
        .unwrap();
        assert!(table["worker-0"].is_empty());
        assert!(table["worker-1"].is_empty());
    }

    #[test]
    fn custom_routes_as_declared_and_fills_missing_senders() {
        let cells = names(2);
        let routes = vec![CustomRoute {
            from: "worker-0".into(),
            to: vec!["worker-1".into()],
        }];
        let table = generate(&TopologySpec::Custom { routes }, &cells).unwrap();
        assert_eq!(table["worker-0"], vec!["worker-1"]);
        assert!(table["worker-1"].is_empty());
    }

    #[test]
    fn custom_rejects_unknown_peer() {
        let cells = names(1);
        let routes = vec![CustomRoute {
            from: "worker-0".into(),
            to: vec!["ghost".into()],
        }];
        assert!(generate(&TopologySpec::Custom { routes }, &cells).is_err());
    }

    /// A route table is a pure function of its inputs (spec §8 testable
    /// property): generating twice from identical inputs must be identical.
    #[test]
    fn generation_is_deterministic() {
        let cells = names(4);
        let a = generate(&TopologySpec::FullMesh, &cells).unwrap();
        let b = generate(&TopologySpec::FullMesh, &cells).unwrap();
        assert_eq!(a, b);
    }
}
