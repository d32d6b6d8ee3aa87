//! Formation reconciler (C4, spec §4.4) — expands templates into child
//! Cells, rolls updates, scales down, publishes the route table, and
//! enforces formation-level budget.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::errors::DomainResult;
use crate::domain::models::metadata::{LABEL_FORMATION, LABEL_ROLE, ROLE_CELL};
use crate::domain::models::{
    canonical_eq, Cell, CellPhase, CellSpec, CellStatus, ChildCellStatus, ConfigMapRef,
    EventRecord, Formation, FormationPhase, FormationStatus, InvolvedObject, ObjectMeta,
    OwnerReference, PersistentVolumeClaimRef,
};
use crate::domain::ports::ClusterGateway;
use crate::services::topology;

pub struct FormationReconciler {
    gateway: Arc<dyn ClusterGateway>,
}

impl FormationReconciler {
    pub fn new(gateway: Arc<dyn ClusterGateway>) -> Self {
        Self { gateway }
    }

    /// Runs one reconcile pass for `formation` (spec §4.4 steps 1–7).
    pub async fn reconcile(&self, formation: &Formation) -> DomainResult<()> {
        self.ensure_workspace(formation).await?;

        let desired = self.desired_children(formation);
        let existing = self
            .gateway
            .list_cells(&formation.metadata.namespace)
            .await?
            .into_iter()
            .filter(|c| c.metadata.label(LABEL_FORMATION) == Some(formation.metadata.name.as_str()))
            .collect::<Vec<_>>();
        let existing_by_name = existing
            .iter()
            .map(|c| (c.metadata.name.clone(), c.clone()))
            .collect::<BTreeMap<_, _>>();

        for (name, wanted_spec) in &desired {
            match existing_by_name.get(name) {
                None => self.create_child(formation, name, wanted_spec.clone()).await?,
                Some(child) if child.status.as_ref().map(|s| s.phase) == Some(CellPhase::Failed) => {
                    self.recreate_child(formation, child).await?;
                }
                Some(child) if !canonical_eq(&child.spec, wanted_spec) => {
                    self.update_child_spec(child, wanted_spec.clone()).await?;
                }
                Some(_) => {}
            }
        }

        // Scale-down: highest-indexed replicas first is already the
        // ordering `desired_cell_names` produces, so a plain set
        // difference over `existing_by_name` preserves the tie-break.
        let desired_names: HashSet<&String> = desired.keys().collect();
        let mut to_delete = existing_by_name
            .keys()
            .filter(|name| !desired_names.contains(name))
            .cloned()
            .collect::<Vec<_>>();
        to_delete.sort();
        for name in &to_delete {
            self.gateway.delete_cell(&formation.metadata.namespace, name).await?;
        }
        if !to_delete.is_empty() {
            self.emit(
                formation,
                "ScaleDown",
                &format!("removed cells: {}", to_delete.join(", ")),
            )
            .await;
        }

        let route_table = topology::generate(&formation.spec.topology, &desired.keys().cloned().collect::<Vec<_>>())?;
        self.publish_routes(formation, &route_table).await?;

        let children = self
            .gateway
            .list_cells(&formation.metadata.namespace)
            .await?
            .into_iter()
            .filter(|c| c.metadata.label(LABEL_FORMATION) == Some(formation.metadata.name.as_str()))
            .collect::<Vec<_>>();

        let total_cost: f64 = children
            .iter()
            .filter_map(|c| c.status.as_ref())
            .map(|s| s.total_cost)
            .sum();

        let budget_tripped = formation
            .spec
            .budget
            .as_ref()
            .and_then(|b| b.max_total_cost)
            .is_some_and(|max| total_cost >= max);

        if budget_tripped {
            self.pause_running_children(&children).await?;
            self.emit(formation, "BudgetExceeded", "formation total cost reached its budget limit")
                .await;
            warn!(formation = %formation.metadata.name, total_cost, "budget exceeded, children paused");
        }

        self.aggregate_status(formation, &children, total_cost, budget_tripped).await
    }

    fn desired_children(&self, formation: &Formation) -> BTreeMap<String, CellSpec> {
        let mut out = BTreeMap::new();
        for template in &formation.spec.cells {
            for name in template.expand_names() {
                let mut spec = template.cell_spec.clone();
                spec.formation_ref = Some(formation.metadata.name.clone());
                out.insert(name, spec);
            }
        }
        out
    }

    async fn ensure_workspace(&self, formation: &Formation) -> DomainResult<()> {
        let pvc_name = formation.workspace_pvc_name();
        if self.gateway.get_pvc(&formation.metadata.namespace, &pvc_name).await?.is_none() {
            let owner = OwnerReference::controller(
                "Formation",
                formation.metadata.name.clone(),
                formation.metadata.uid.clone().unwrap_or_default(),
            );
            let metadata = ObjectMeta::new(pvc_name, &formation.metadata.namespace).with_owner(owner);
            self.gateway
                .create_pvc(&PersistentVolumeClaimRef { metadata })
                .await?;
        }
        Ok(())
    }

    async fn create_child(&self, formation: &Formation, name: &str, spec: CellSpec) -> DomainResult<()> {
        let owner = OwnerReference::controller(
            "Formation",
            formation.metadata.name.clone(),
            formation.metadata.uid.clone().unwrap_or_default(),
        );
        let metadata = ObjectMeta::new(name, &formation.metadata.namespace)
            .with_label(LABEL_FORMATION, &formation.metadata.name)
            .with_label(LABEL_ROLE, ROLE_CELL)
            .with_owner(owner);
        let cell = Cell {
            metadata,
            spec,
            status: Some(CellStatus::default()),
        };
        self.gateway.create_cell(&cell).await?;
        self.emit(formation, "CellCreated", &format!("created child cell {name}")).await;
        Ok(())
    }

    async fn recreate_child(&self, formation: &Formation, child: &Cell) -> DomainResult<()> {
        self.gateway.delete_cell(&child.metadata.namespace, &child.metadata.name).await?;
        self.emit(
            formation,
            "CellFailed",
            &format!("child cell {} failed and was deleted for recreation", child.metadata.name),
        )
        .await;
        Ok(())
    }

    async fn update_child_spec(&self, child: &Cell, spec: CellSpec) -> DomainResult<()> {
        let mut updated = child.clone();
        updated.spec = spec;
        self.gateway.update_cell(&updated).await?;
        Ok(())
    }

    async fn publish_routes(
        &self,
        formation: &Formation,
        routes: &crate::domain::models::RouteTable,
    ) -> DomainResult<()> {
        let owner = OwnerReference::controller(
            "Formation",
            formation.metadata.name.clone(),
            formation.metadata.uid.clone().unwrap_or_default(),
        );
        let metadata =
            ObjectMeta::new(formation.route_configmap_name(), &formation.metadata.namespace).with_owner(owner);
        let data = BTreeMap::from([("routes.json".to_string(), serde_json::to_string(routes)?)]);
        self.gateway.apply_configmap(&ConfigMapRef { metadata, data }).await?;
        Ok(())
    }

    async fn pause_running_children(&self, children: &[Cell]) -> DomainResult<()> {
        for child in children {
            let is_running = child.status.as_ref().map(|s| s.phase) == Some(CellPhase::Running);
            if !is_running {
                continue;
            }
            let mut updated = child.clone();
            let mut status = updated.status.clone().unwrap_or_default();
            status.phase = CellPhase::Paused;
            status.message = Some("Budget exceeded".to_string());
            updated.status = Some(status);
            self.gateway.update_cell_status(&updated).await?;
        }
        Ok(())
    }

    async fn aggregate_status(
        &self,
        formation: &Formation,
        children: &[Cell],
        total_cost: f64,
        budget_tripped: bool,
    ) -> DomainResult<()> {
        let total_cells = children.len() as u32;
        let ready_cells = children
            .iter()
            .filter(|c| c.status.as_ref().map(|s| s.phase) == Some(CellPhase::Running))
            .count() as u32;
        let all_completed = total_cells > 0
            && children
                .iter()
                .all(|c| c.status.as_ref().map(|s| s.phase) == Some(CellPhase::Completed));
        let any_failed = children
            .iter()
            .any(|c| c.status.as_ref().map(|s| s.phase) == Some(CellPhase::Failed));
        let any_running = ready_cells > 0;

        let phase = if budget_tripped {
            FormationPhase::Paused
        } else if all_completed {
            FormationPhase::Completed
        } else if any_failed {
            FormationPhase::Failed
        } else if any_running {
            FormationPhase::Running
        } else {
            FormationPhase::Pending
        };

        let cells = children
            .iter()
            .map(|c| ChildCellStatus {
                name: c.metadata.name.clone(),
                phase: c.status.as_ref().map(|s| s.phase).unwrap_or(CellPhase::Pending),
                cost: c.status.as_ref().map(|s| s.total_cost).unwrap_or(0.0),
            })
            .collect();

        let status = FormationStatus {
            phase,
            ready_cells,
            total_cells,
            total_cost,
            cells,
        };

        let mut updated = formation.clone();
        updated.status = Some(status);
        self.gateway.update_formation_status(&updated).await?;
        Ok(())
    }

    async fn emit(&self, formation: &Formation, reason: &str, message: &str) {
        self.gateway
            .emit_event(EventRecord::normal(
                reason,
                message,
                InvolvedObject {
                    kind: "Formation".into(),
                    namespace: formation.metadata.namespace.clone(),
                    name: formation.metadata.name.clone(),
                    uid: formation.metadata.uid.clone(),
                },
            ))
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryClusterGateway;
    use crate::domain::models::{CellTemplate, FormationSpec, MindSpec, TopologySpec};

    fn worker_template(replicas: u32) -> CellTemplate {
        CellTemplate {
            template_name: "worker".into(),
            replicas,
            cell_spec: CellSpec {
                mind: MindSpec {
                    provider: "anthropic".into(),
                    model: "sonnet".into(),
                    system_prompt: "work".into(),
                    temperature: None,
                    max_tokens: None,
                },
                tools: Vec::new(),
                resources: None,
                parent_ref: None,
                formation_ref: None,
            },
        }
    }

    fn sample_formation(replicas: u32) -> Formation {
        Formation {
            metadata: ObjectMeta::new("swarm", "default"),
            spec: FormationSpec {
                cells: vec![worker_template(replicas)],
                topology: TopologySpec::FullMesh,
                budget: None,
            },
            status: None,
        }
    }

    #[tokio::test]
    async fn expands_templates_into_child_cells() {
        let gateway = Arc::new(InMemoryClusterGateway::new());
        let reconciler = FormationReconciler::new(gateway.clone());
        let formation = sample_formation(3);
        gateway.create_formation(&formation).await.unwrap();

        reconciler.reconcile(&formation).await.unwrap();

        let children = gateway.list_cells("default").await.unwrap();
        let mut names: Vec<_> = children.iter().map(|c| c.metadata.name.clone()).collect();
        names.sort();
        assert_eq!(names, vec!["worker-0", "worker-1", "worker-2"]);
    }

    #[tokio::test]
    async fn scale_down_removes_highest_indexed_first() {
        let gateway = Arc::new(InMemoryClusterGateway::new());
        let reconciler = FormationReconciler::new(gateway.clone());
        let formation = sample_formation(3);
        gateway.create_formation(&formation).await.unwrap();
        reconciler.reconcile(&formation).await.unwrap();

        let mut scaled_down = sample_formation(2);
        scaled_down.metadata = formation.metadata.clone();
        reconciler.reconcile(&scaled_down).await.unwrap();

        let children = gateway.list_cells("default").await.unwrap();
        let mut names: Vec<_> = children.iter().map(|c| c.metadata.name.clone()).collect();
        names.sort();
        assert_eq!(names, vec!["worker-0", "worker-1"]);
    }

    #[tokio::test]
    async fn publishes_route_configmap() {
        let gateway = Arc::new(InMemoryClusterGateway::new());
        let reconciler = FormationReconciler::new(gateway.clone());
        let formation = sample_formation(2);
        gateway.create_formation(&formation).await.unwrap();

        reconciler.reconcile(&formation).await.unwrap();

        let configmap = gateway
            .get_configmap("default", &formation.route_configmap_name())
            .await
            .unwrap();
        assert!(configmap.is_some());
        assert!(configmap.unwrap().data.contains_key("routes.json"));
    }
}
