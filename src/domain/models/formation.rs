//! Formation — a group template (spec §3 "Formation", §4.4).

use serde::{Deserialize, Serialize};

use super::cell::{CellPhase, CellSpec};
use super::metadata::ObjectMeta;
use super::topology::TopologySpec;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellTemplate {
    pub template_name: String,
    pub replicas: u32,
    pub cell_spec: CellSpec,
}

impl CellTemplate {
    /// Expands this template into its desired child cell names:
    /// `{templateName}-0 .. {templateName}-(replicas-1)` (spec §3 invariant,
    /// §8 "Formation expansion"). `replicas = 0` yields no names, which is
    /// how scale-to-zero is expressed (spec §9 Open Questions).
    pub fn expand_names(&self) -> Vec<String> {
        (0..self.replicas)
            .map(|i| format!("{}-{i}", self.template_name))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BudgetSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_total_cost: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_cost_per_hour: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allocation: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormationSpec {
    pub cells: Vec<CellTemplate>,
    pub topology: TopologySpec,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget: Option<BudgetSpec>,
}

impl FormationSpec {
    /// The full desired set of child cell names across all templates.
    pub fn desired_cell_names(&self) -> Vec<String> {
        self.cells.iter().flat_map(CellTemplate::expand_names).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum FormationPhase {
    Pending,
    Running,
    Paused,
    Completed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChildCellStatus {
    pub name: String,
    pub phase: CellPhase,
    pub cost: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormationStatus {
    pub phase: FormationPhase,
    pub ready_cells: u32,
    pub total_cells: u32,
    pub total_cost: f64,
    pub cells: Vec<ChildCellStatus>,
}

impl Default for FormationStatus {
    fn default() -> Self {
        Self {
            phase: FormationPhase::Pending,
            ready_cells: 0,
            total_cells: 0,
            total_cost: 0.0,
            cells: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Formation {
    pub metadata: ObjectMeta,
    pub spec: FormationSpec,
    pub status: Option<FormationStatus>,
}

impl Formation {
    pub fn route_configmap_name(&self) -> String {
        format!("topology-{}", self.metadata.name)
    }

    pub fn workspace_pvc_name(&self) -> String {
        format!("workspace-{}", self.metadata.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expand_names_zero_replicas_is_empty() {
        let tpl = CellTemplate {
            template_name: "worker".into(),
            replicas: 0,
            cell_spec: sample_spec(),
        };
        assert!(tpl.expand_names().is_empty());
    }

    #[test]
    fn expand_names_indexes_from_zero() {
        let tpl = CellTemplate {
            template_name: "worker".into(),
            replicas: 3,
            cell_spec: sample_spec(),
        };
        assert_eq!(tpl.expand_names(), vec!["worker-0", "worker-1", "worker-2"]);
    }

    fn sample_spec() -> CellSpec {
        use super::super::cell::MindSpec;
        CellSpec {
            mind: MindSpec {
                provider: "anthropic".into(),
                model: "claude".into(),
                system_prompt: "you are a worker".into(),
                temperature: None,
                max_tokens: None,
            },
            tools: Vec::new(),
            resources: None,
            parent_ref: None,
            formation_ref: None,
        }
    }
}
