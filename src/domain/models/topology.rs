//! Topology specification and route table (spec §3 "Route table", §4.2).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One of the six topology kinds a Formation can declare (spec §3, §4.2).
/// A tagged-variant enum replaces the duck-typed shape inference of the
/// original (spec §9 "Dynamic typing in the source").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TopologySpec {
    FullMesh,
    Hierarchy { root: String },
    Star { hub: String },
    Ring,
    Stigmergy { blackboard: BlackboardSpec },
    Custom { routes: Vec<CustomRoute> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlackboardSpec {
    pub decay_minutes: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomRoute {
    pub from: String,
    pub to: Vec<String>,
}

/// Derived view for a Formation: `cellName -> [allowed peer cell names]`
/// (spec §3 "Route table"). A `BTreeMap` keeps iteration and JSON
/// serialization order deterministic, which is required for the
/// route-table purity property in spec §8.
pub type RouteTable = BTreeMap<String, Vec<String>>;
