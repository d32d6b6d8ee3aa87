//! Domain-level mirrors of the workload resources the gateway (C1) manages
//! directly: Pods, ConfigMaps, and persistent-volume claims.
//!
//! These are intentionally thin compared to the real Kubernetes API types —
//! reconcilers only ever need phase, name, owner, labels, and a handful of
//! data fields. The `kube` adapter is responsible for translating to and
//! from `k8s_openapi` types; keeping the port's vocabulary minimal is what
//! lets the in-memory adapter exist at all.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::metadata::ObjectMeta;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum PodPhase {
    Pending,
    Running,
    Succeeded,
    Failed,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PodRef {
    pub metadata: ObjectMeta,
    pub phase: PodPhase,
    /// Environment variables set on the `mind` container, including
    /// `CELL_SPEC`, `CELL_NAME`, `CELL_NAMESPACE` (spec §4.3, §6).
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

impl PodRef {
    pub fn new(metadata: ObjectMeta, phase: PodPhase) -> Self {
        Self {
            metadata,
            phase,
            env: BTreeMap::new(),
        }
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigMapRef {
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub data: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistentVolumeClaimRef {
    pub metadata: ObjectMeta,
}

/// Change event delivered by a watch stream (spec §4.1: "watch streams
/// delivering `(added | updated | deleted, object)` events").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WatchEvent<T> {
    Added(T),
    Updated(T),
    Deleted(T),
}

impl<T> WatchEvent<T> {
    pub fn into_inner(self) -> T {
        match self {
            Self::Added(t) | Self::Updated(t) | Self::Deleted(t) => t,
        }
    }
}
