//! Structured event emission (spec §4.1 "structured event emission scoped
//! to an owning object").

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum EventKind {
    Normal,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvolvedObject {
    pub kind: String,
    pub namespace: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
}

/// One event, e.g. `CellCreated`, `PodCreated`, `SpecChanged`, `ScaleDown`,
/// `BudgetExceeded`, `MissionStarted` (named throughout spec §4.3–§4.5).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub reason: String,
    pub message: String,
    pub kind: EventKind,
    pub involved_object: InvolvedObject,
    pub timestamp: DateTime<Utc>,
}

impl EventRecord {
    pub fn normal(
        reason: impl Into<String>,
        message: impl Into<String>,
        involved_object: InvolvedObject,
    ) -> Self {
        Self {
            reason: reason.into(),
            message: message.into(),
            kind: EventKind::Normal,
            involved_object,
            timestamp: Utc::now(),
        }
    }

    pub fn warning(
        reason: impl Into<String>,
        message: impl Into<String>,
        involved_object: InvolvedObject,
    ) -> Self {
        Self {
            reason: reason.into(),
            message: message.into(),
            kind: EventKind::Warning,
            involved_object,
            timestamp: Utc::now(),
        }
    }
}
