//! Shared metadata embedded in every custom resource (spec §6).

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// `kais.io/cell={cell}` label applied to workload pods and, transitively,
/// used as a list selector by the Cell reconciler's pod watch.
pub const LABEL_CELL: &str = "kais.io/cell";
/// `kais.io/role=cell` label applied to workload pods.
pub const LABEL_ROLE: &str = "kais.io/role";
/// `kais.io/formation={formation}` label applied to child Cells.
pub const LABEL_FORMATION: &str = "kais.io/formation";

pub const ROLE_CELL: &str = "cell";
pub const API_VERSION: &str = "kais.io/v1";

/// Standard metadata carried by every resource kind (spec §6).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectMeta {
    pub name: String,
    pub namespace: String,
    pub uid: Option<String>,
    pub resource_version: Option<String>,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    #[serde(default)]
    pub owner_references: Vec<OwnerReference>,
    pub creation_timestamp: Option<DateTime<Utc>>,
    pub deletion_timestamp: Option<DateTime<Utc>>,
}

impl ObjectMeta {
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            ..Default::default()
        }
    }

    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    pub fn with_owner(mut self, owner: OwnerReference) -> Self {
        self.owner_references.push(owner);
        self
    }

    pub fn is_deleting(&self) -> bool {
        self.deletion_timestamp.is_some()
    }

    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels.get(key).map(String::as_str)
    }
}

/// A reference to the object that owns this one (spec §4.3: the Cell
/// reconciler sets this on pods; §4.4: the Formation reconciler sets it on
/// child Cells, the route ConfigMap, and the workspace PVC).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OwnerReference {
    pub api_version: String,
    pub kind: String,
    pub name: String,
    pub uid: String,
    pub controller: bool,
    pub block_owner_deletion: bool,
}

impl OwnerReference {
    pub fn controller(kind: impl Into<String>, name: impl Into<String>, uid: impl Into<String>) -> Self {
        Self {
            api_version: API_VERSION.to_string(),
            kind: kind.into(),
            name: name.into(),
            uid: uid.into(),
            controller: true,
            block_owner_deletion: true,
        }
    }
}

/// Canonical JSON serialization used for drift detection (spec §4.3, §4.4,
/// §6). Struct fields always serialize in declaration order, which is
/// already deterministic; the only source of non-determinism would be an
/// unordered map, so every dynamic-key field in this crate's specs (labels,
/// pod env) uses `BTreeMap` rather than `HashMap`. Two structurally equal
/// values therefore always serialize to byte-identical strings.
pub fn canonical_json<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string(value)
}

/// Whether two values are identical once canonicalized. Used by drift
/// detection in the Cell and Formation reconcilers.
pub fn canonical_eq<T: Serialize>(a: &T, b: &T) -> bool {
    match (canonical_json(a), canonical_json(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_json_round_trips() {
        let meta = ObjectMeta::new("researcher", "default")
            .with_label(LABEL_CELL, "researcher")
            .with_label(LABEL_ROLE, ROLE_CELL);
        let json = canonical_json(&meta).unwrap();
        let parsed: ObjectMeta = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, meta);
        assert_eq!(canonical_json(&meta).unwrap(), json);
    }

    #[test]
    fn canonical_eq_ignores_construction_order() {
        let a = ObjectMeta::new("x", "ns").with_label("b", "1").with_label("a", "2");
        let b = ObjectMeta::new("x", "ns").with_label("a", "2").with_label("b", "1");
        assert!(canonical_eq(&a, &b));
    }
}
