//! Domain models
//!
//! Pure domain entities with business logic and validation rules.
//! These models are framework-agnostic and contain no infrastructure concerns.

pub mod budget;
pub mod cell;
pub mod checks;
pub mod duration;
pub mod events;
pub mod formation;
pub mod metadata;
pub mod mission;
pub mod spawn;
pub mod topology;
pub mod tree;
pub mod workload;

pub use budget::{BudgetBalance, LedgerEntry, LedgerOperation};
pub use cell::{Cell, CellPhase, CellSpec, CellStatus, MindSpec, ResourceSpec};
pub use checks::{CheckResult, CheckSpec, CheckStatus, ComparisonOperator};
pub use duration::parse_timeout;
pub use events::{EventKind, EventRecord, InvolvedObject};
pub use formation::{
    BudgetSpec, CellTemplate, ChildCellStatus, Formation, FormationPhase, FormationSpec,
    FormationStatus,
};
pub use metadata::{canonical_eq, canonical_json, ObjectMeta, OwnerReference};
pub use mission::{
    AttemptRecord, CompletionSpec, EntrypointSpec, Mission, MissionBudgetSpec, MissionPhase,
    MissionSpec, MissionStatus, MissionTarget, ReviewOutcome, ReviewSpec, ReviewStatus,
};
pub use spawn::{
    RecursionSpec, SpawnChildRequest, SpawnDecision, SpawnPolicy, SpawnRequest,
    SpawnRequestStatus,
};
pub use topology::{BlackboardSpec, CustomRoute, RouteTable, TopologySpec};
pub use tree::CellTreeNode;
pub use workload::{ConfigMapRef, PersistentVolumeClaimRef, PodPhase, PodRef, WatchEvent};
