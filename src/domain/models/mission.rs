//! Mission — a goal with completion criteria (spec §3 "Mission", §4.5).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::checks::{CheckResult, CheckSpec};
use super::metadata::ObjectMeta;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntrypointSpec {
    pub cell: String,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ReviewSpec {
    #[serde(default)]
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionSpec {
    pub checks: Vec<CheckSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review: Option<ReviewSpec>,
    pub max_attempts: u32,
    /// Raw duration literal (spec §6 grammar); parsed via
    /// [`crate::domain::models::duration::parse_timeout`].
    pub timeout: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MissionBudgetSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_cost: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissionSpec {
    pub objective: String,
    /// Exactly one of `formation_ref` / `cell_ref` must be set (spec §3);
    /// see [`MissionSpec::target`] and [`MissionSpec::validate`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formation_ref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cell_ref: Option<String>,
    pub entrypoint: EntrypointSpec,
    pub completion: CompletionSpec,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget: Option<MissionBudgetSpec>,
}

/// Resolved reference to the Mission's target, once `validate` has run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MissionTarget<'a> {
    Formation(&'a str),
    Cell(&'a str),
}

impl MissionSpec {
    /// Validates the "exactly one of `formationRef` or `cellRef`" invariant
    /// (spec §3). The wire schema permits both fields to be present
    /// simultaneously (neither is rejected by upstream JSON-schema
    /// validation, which is out of this core's scope per spec §1), so the
    /// core itself enforces "exactly one populated" and surfaces a
    /// `Validation` error otherwise — see DESIGN.md for this Open Question.
    pub fn target(&self) -> Result<MissionTarget<'_>, crate::domain::errors::DomainError> {
        match (&self.formation_ref, &self.cell_ref) {
            (Some(f), None) => Ok(MissionTarget::Formation(f)),
            (None, Some(c)) => Ok(MissionTarget::Cell(c)),
            (None, None) => Err(crate::domain::errors::DomainError::Validation(
                "mission must set exactly one of formationRef or cellRef".into(),
            )),
            (Some(_), Some(_)) => Err(crate::domain::errors::DomainError::Validation(
                "mission must set exactly one of formationRef or cellRef, not both".into(),
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum MissionPhase {
    Pending,
    Running,
    Succeeded,
    Failed,
}

impl MissionPhase {
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum ReviewStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewOutcome {
    pub status: ReviewStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
}

/// One completed attempt, appended to `history` when an attempt fails
/// (spec §4.5).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub attempt: u32,
    pub results: Vec<CheckResult>,
    pub cost: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissionStatus {
    pub phase: MissionPhase,
    pub attempt: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    pub cost: f64,
    #[serde(default)]
    pub results: Vec<CheckResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review: Option<ReviewOutcome>,
    #[serde(default)]
    pub history: Vec<AttemptRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Default for MissionStatus {
    fn default() -> Self {
        Self {
            phase: MissionPhase::Pending,
            attempt: 0,
            started_at: None,
            cost: 0.0,
            results: Vec::new(),
            review: None,
            history: Vec::new(),
            message: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mission {
    pub metadata: ObjectMeta,
    pub spec: MissionSpec,
    pub status: Option<MissionStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_spec(formation_ref: Option<&str>, cell_ref: Option<&str>) -> MissionSpec {
        MissionSpec {
            objective: "ship it".into(),
            formation_ref: formation_ref.map(String::from),
            cell_ref: cell_ref.map(String::from),
            entrypoint: EntrypointSpec {
                cell: "lead-0".into(),
                message: "go".into(),
            },
            completion: CompletionSpec {
                checks: Vec::new(),
                review: None,
                max_attempts: 3,
                timeout: "30m".into(),
            },
            budget: None,
        }
    }

    #[test]
    fn target_requires_exactly_one_ref() {
        assert!(base_spec(None, None).target().is_err());
        assert!(base_spec(Some("f"), Some("c")).target().is_err());
        assert_eq!(base_spec(Some("f"), None).target().unwrap(), MissionTarget::Formation("f"));
        assert_eq!(base_spec(None, Some("c")).target().unwrap(), MissionTarget::Cell("c"));
    }
}
