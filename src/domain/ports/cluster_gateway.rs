//! Cluster gateway port (spec §4.1 "C1 Cluster gateway").
//!
//! A single trait fronting every interaction the reconcilers have with the
//! substrate that actually runs workloads: CRUD on the four custom
//! resources, CRUD on the Pod/ConfigMap/PVC workload objects it spawns on
//! their behalf, event emission, and watch subscriptions. Production code
//! talks to a real cluster through the `kube` adapter; tests and the
//! `--local` CLI mode talk to the in-memory adapter. Neither the
//! reconcilers nor the services above this port know which one they have.

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::domain::errors::GatewayResult;
use crate::domain::models::{
    Cell, ConfigMapRef, EventRecord, Formation, Mission, PersistentVolumeClaimRef, PodRef,
    WatchEvent,
};

/// Gateway to the substrate that hosts Cells, Formations, Missions, and the
/// Pods/ConfigMaps/PVCs reconcilers create on their behalf (spec §4.1).
#[async_trait]
pub trait ClusterGateway: Send + Sync {
    async fn get_cell(&self, namespace: &str, name: &str) -> GatewayResult<Cell>;
    async fn create_cell(&self, cell: &Cell) -> GatewayResult<Cell>;
    async fn update_cell(&self, cell: &Cell) -> GatewayResult<Cell>;
    async fn update_cell_status(&self, cell: &Cell) -> GatewayResult<Cell>;
    async fn delete_cell(&self, namespace: &str, name: &str) -> GatewayResult<()>;
    async fn list_cells(&self, namespace: &str) -> GatewayResult<Vec<Cell>>;
    fn watch_cells(&self, namespace: &str) -> BoxStream<'static, GatewayResult<WatchEvent<Cell>>>;

    async fn get_formation(&self, namespace: &str, name: &str) -> GatewayResult<Formation>;
    async fn create_formation(&self, formation: &Formation) -> GatewayResult<Formation>;
    async fn update_formation(&self, formation: &Formation) -> GatewayResult<Formation>;
    async fn update_formation_status(&self, formation: &Formation) -> GatewayResult<Formation>;
    async fn delete_formation(&self, namespace: &str, name: &str) -> GatewayResult<()>;
    async fn list_formations(&self, namespace: &str) -> GatewayResult<Vec<Formation>>;
    fn watch_formations(
        &self,
        namespace: &str,
    ) -> BoxStream<'static, GatewayResult<WatchEvent<Formation>>>;

    async fn get_mission(&self, namespace: &str, name: &str) -> GatewayResult<Mission>;
    async fn create_mission(&self, mission: &Mission) -> GatewayResult<Mission>;
    async fn update_mission(&self, mission: &Mission) -> GatewayResult<Mission>;
    async fn update_mission_status(&self, mission: &Mission) -> GatewayResult<Mission>;
    async fn delete_mission(&self, namespace: &str, name: &str) -> GatewayResult<()>;
    async fn list_missions(&self, namespace: &str) -> GatewayResult<Vec<Mission>>;
    fn watch_missions(
        &self,
        namespace: &str,
    ) -> BoxStream<'static, GatewayResult<WatchEvent<Mission>>>;

    async fn get_pod(&self, namespace: &str, name: &str) -> GatewayResult<Option<PodRef>>;
    async fn create_pod(&self, pod: &PodRef) -> GatewayResult<PodRef>;
    async fn delete_pod(&self, namespace: &str, name: &str) -> GatewayResult<()>;
    async fn list_pods_by_label(
        &self,
        namespace: &str,
        label_key: &str,
        label_value: &str,
    ) -> GatewayResult<Vec<PodRef>>;
    fn watch_pods(&self, namespace: &str) -> BoxStream<'static, GatewayResult<WatchEvent<PodRef>>>;

    async fn get_configmap(
        &self,
        namespace: &str,
        name: &str,
    ) -> GatewayResult<Option<ConfigMapRef>>;
    async fn apply_configmap(&self, configmap: &ConfigMapRef) -> GatewayResult<ConfigMapRef>;
    async fn delete_configmap(&self, namespace: &str, name: &str) -> GatewayResult<()>;

    async fn get_pvc(
        &self,
        namespace: &str,
        name: &str,
    ) -> GatewayResult<Option<PersistentVolumeClaimRef>>;
    async fn create_pvc(
        &self,
        pvc: &PersistentVolumeClaimRef,
    ) -> GatewayResult<PersistentVolumeClaimRef>;
    async fn delete_pvc(&self, namespace: &str, name: &str) -> GatewayResult<()>;

    /// Records a structured event against the given owning object (spec
    /// §4.1). Never propagates a failure back to the caller's reconcile
    /// loop; implementations log and drop event-write errors.
    async fn emit_event(&self, event: EventRecord);
}
