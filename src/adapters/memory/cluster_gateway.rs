//! In-memory [`ClusterGateway`] — backs reconciler unit tests and the CLI's
//! `--local` mode, where there is no real cluster to talk to.
//!
//! Watches replay every subsequent write as a [`WatchEvent`] broadcast to
//! every currently-subscribed stream; a watcher that subscribes after a
//! write simply never sees it, matching a real watch's "from now" semantics
//! (spec §4.1).

use std::collections::HashMap;
use std::sync::Mutex as SyncMutex;

use async_trait::async_trait;
use futures::stream::BoxStream;
use tokio::sync::{mpsc, RwLock};
use tokio_stream::wrappers::UnboundedReceiverStream;

use crate::domain::errors::{GatewayError, GatewayResult};
use crate::domain::models::{
    Cell, ConfigMapRef, EventRecord, Formation, Mission, PersistentVolumeClaimRef, PodRef,
    WatchEvent,
};
use crate::domain::ports::ClusterGateway;

type Key = (String, String);

#[derive(Default)]
struct Watchers<T> {
    senders: Vec<mpsc::UnboundedSender<GatewayResult<WatchEvent<T>>>>,
}

impl<T: Clone + Send + 'static> Watchers<T> {
    fn subscribe(&mut self) -> BoxStream<'static, GatewayResult<WatchEvent<T>>> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.senders.push(tx);
        Box::pin(UnboundedReceiverStream::new(rx))
    }

    fn notify(&mut self, event: WatchEvent<T>) {
        self.senders.retain(|tx| tx.send(Ok(event.clone())).is_ok());
    }
}

#[derive(Default)]
pub struct InMemoryClusterGateway {
    cells: RwLock<HashMap<Key, Cell>>,
    formations: RwLock<HashMap<Key, Formation>>,
    missions: RwLock<HashMap<Key, Mission>>,
    pods: RwLock<HashMap<Key, PodRef>>,
    configmaps: RwLock<HashMap<Key, ConfigMapRef>>,
    pvcs: RwLock<HashMap<Key, PersistentVolumeClaimRef>>,
    events: RwLock<Vec<EventRecord>>,

    cell_watchers: SyncMutex<Watchers<Cell>>,
    formation_watchers: SyncMutex<Watchers<Formation>>,
    mission_watchers: SyncMutex<Watchers<Mission>>,
    pod_watchers: SyncMutex<Watchers<PodRef>>,
}

impl InMemoryClusterGateway {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(namespace: &str, name: &str) -> Key {
        (namespace.to_string(), name.to_string())
    }

    /// Test/inspection helper: every event recorded so far.
    pub async fn recorded_events(&self) -> Vec<EventRecord> {
        self.events.read().await.clone()
    }
}

macro_rules! crud_impl {
    (
        $get:ident, $create:ident, $update:ident, $update_status:ident, $delete:ident, $list:ident, $watch:ident,
        $map:ident, $watchers:ident, $ty:ty, $kind:literal
    ) => {
        async fn $get(&self, namespace: &str, name: &str) -> GatewayResult<$ty> {
            self.$map
                .read()
                .await
                .get(&Self::key(namespace, name))
                .cloned()
                .ok_or_else(|| GatewayError::NotFound(format!("{} {}/{} not found", $kind, namespace, name)))
        }

        async fn $create(&self, value: &$ty) -> GatewayResult<$ty> {
            let key = Self::key(&value.metadata.namespace, &value.metadata.name);
            let mut map = self.$map.write().await;
            if map.contains_key(&key) {
                return Err(GatewayError::Conflict(format!(
                    "{} {}/{} already exists",
                    $kind, value.metadata.namespace, value.metadata.name
                )));
            }
            map.insert(key, value.clone());
            drop(map);
            self.$watchers.lock().unwrap().notify(WatchEvent::Added(value.clone()));
            Ok(value.clone())
        }

        async fn $update(&self, value: &$ty) -> GatewayResult<$ty> {
            let key = Self::key(&value.metadata.namespace, &value.metadata.name);
            let mut map = self.$map.write().await;
            if !map.contains_key(&key) {
                return Err(GatewayError::NotFound(format!(
                    "{} {}/{} not found",
                    $kind, value.metadata.namespace, value.metadata.name
                )));
            }
            map.insert(key, value.clone());
            drop(map);
            self.$watchers.lock().unwrap().notify(WatchEvent::Updated(value.clone()));
            Ok(value.clone())
        }

        async fn $update_status(&self, value: &$ty) -> GatewayResult<$ty> {
            self.$update(value).await
        }

        async fn $delete(&self, namespace: &str, name: &str) -> GatewayResult<()> {
            let key = Self::key(namespace, name);
            let mut map = self.$map.write().await;
            let removed = map.remove(&key).ok_or_else(|| {
                GatewayError::NotFound(format!("{} {}/{} not found", $kind, namespace, name))
            })?;
            drop(map);
            self.$watchers.lock().unwrap().notify(WatchEvent::Deleted(removed));
            Ok(())
        }

        async fn $list(&self, namespace: &str) -> GatewayResult<Vec<$ty>> {
            Ok(self
                .$map
                .read()
                .await
                .values()
                .filter(|v| v.metadata.namespace == namespace)
                .cloned()
                .collect())
        }

        fn $watch(&self, _namespace: &str) -> BoxStream<'static, GatewayResult<WatchEvent<$ty>>> {
            self.$watchers.lock().unwrap().subscribe()
        }
    };
}

#[async_trait]
impl ClusterGateway for InMemoryClusterGateway {
    crud_impl!(
        get_cell, create_cell, update_cell, update_cell_status, delete_cell, list_cells, watch_cells,
        cells, cell_watchers, Cell, "cell"
    );
    crud_impl!(
        get_formation, create_formation, update_formation, update_formation_status, delete_formation,
        list_formations, watch_formations, formations, formation_watchers, Formation, "formation"
    );
    crud_impl!(
        get_mission, create_mission, update_mission, update_mission_status, delete_mission, list_missions,
        watch_missions, missions, mission_watchers, Mission, "mission"
    );

    async fn get_pod(&self, namespace: &str, name: &str) -> GatewayResult<Option<PodRef>> {
        Ok(self.pods.read().await.get(&Self::key(namespace, name)).cloned())
    }

    async fn create_pod(&self, pod: &PodRef) -> GatewayResult<PodRef> {
        let key = Self::key(&pod.metadata.namespace, &pod.metadata.name);
        self.pods.write().await.insert(key, pod.clone());
        self.pod_watchers.lock().unwrap().notify(WatchEvent::Added(pod.clone()));
        Ok(pod.clone())
    }

    async fn delete_pod(&self, namespace: &str, name: &str) -> GatewayResult<()> {
        let key = Self::key(namespace, name);
        if let Some(removed) = self.pods.write().await.remove(&key) {
            self.pod_watchers.lock().unwrap().notify(WatchEvent::Deleted(removed));
        }
        Ok(())
    }

    async fn list_pods_by_label(
        &self,
        namespace: &str,
        label_key: &str,
        label_value: &str,
    ) -> GatewayResult<Vec<PodRef>> {
        Ok(self
            .pods
            .read()
            .await
            .values()
            .filter(|p| p.metadata.namespace == namespace && p.metadata.label(label_key) == Some(label_value))
            .cloned()
            .collect())
    }

    fn watch_pods(&self, _namespace: &str) -> BoxStream<'static, GatewayResult<WatchEvent<PodRef>>> {
        self.pod_watchers.lock().unwrap().subscribe()
    }

    async fn get_configmap(&self, namespace: &str, name: &str) -> GatewayResult<Option<ConfigMapRef>> {
        Ok(self.configmaps.read().await.get(&Self::key(namespace, name)).cloned())
    }

    async fn apply_configmap(&self, configmap: &ConfigMapRef) -> GatewayResult<ConfigMapRef> {
        let key = Self::key(&configmap.metadata.namespace, &configmap.metadata.name);
        self.configmaps.write().await.insert(key, configmap.clone());
        Ok(configmap.clone())
    }

    async fn delete_configmap(&self, namespace: &str, name: &str) -> GatewayResult<()> {
        self.configmaps.write().await.remove(&Self::key(namespace, name));
        Ok(())
    }

    async fn get_pvc(
        &self,
        namespace: &str,
        name: &str,
    ) -> GatewayResult<Option<PersistentVolumeClaimRef>> {
        Ok(self.pvcs.read().await.get(&Self::key(namespace, name)).cloned())
    }

    async fn create_pvc(&self, pvc: &PersistentVolumeClaimRef) -> GatewayResult<PersistentVolumeClaimRef> {
        let key = Self::key(&pvc.metadata.namespace, &pvc.metadata.name);
        self.pvcs.write().await.insert(key, pvc.clone());
        Ok(pvc.clone())
    }

    async fn delete_pvc(&self, namespace: &str, name: &str) -> GatewayResult<()> {
        self.pvcs.write().await.remove(&Self::key(namespace, name));
        Ok(())
    }

    async fn emit_event(&self, event: EventRecord) {
        self.events.write().await.push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{CellSpec, MindSpec, ObjectMeta};

    fn sample_cell(name: &str) -> Cell {
        Cell {
            metadata: ObjectMeta::new(name, "default"),
            spec: CellSpec {
                mind: MindSpec {
                    provider: "anthropic".into(),
                    model: "claude".into(),
                    system_prompt: "assist".into(),
                    temperature: None,
                    max_tokens: None,
                },
                tools: Vec::new(),
                resources: None,
                parent_ref: None,
                formation_ref: None,
            },
            status: None,
        }
    }

    #[tokio::test]
    async fn create_then_get_round_trips() {
        let gw = InMemoryClusterGateway::new();
        gw.create_cell(&sample_cell("researcher")).await.unwrap();
        let fetched = gw.get_cell("default", "researcher").await.unwrap();
        assert_eq!(fetched.metadata.name, "researcher");
    }

    #[tokio::test]
    async fn creating_duplicate_is_a_conflict() {
        let gw = InMemoryClusterGateway::new();
        gw.create_cell(&sample_cell("researcher")).await.unwrap();
        let err = gw.create_cell(&sample_cell("researcher")).await.unwrap_err();
        assert!(matches!(err, GatewayError::Conflict(_)));
    }

    #[tokio::test]
    async fn deleting_missing_cell_is_not_found() {
        let gw = InMemoryClusterGateway::new();
        let err = gw.delete_cell("default", "ghost").await.unwrap_err();
        assert!(matches!(err, GatewayError::NotFound(_)));
    }

    #[tokio::test]
    async fn watch_observes_subsequent_writes() {
        use futures::StreamExt;
        let gw = InMemoryClusterGateway::new();
        let mut stream = gw.watch_cells("default");
        gw.create_cell(&sample_cell("researcher")).await.unwrap();
        let event = stream.next().await.unwrap().unwrap();
        match event {
            WatchEvent::Added(cell) => assert_eq!(cell.metadata.name, "researcher"),
            _ => panic!("expected Added"),
        }
    }

    #[tokio::test]
    async fn events_are_recorded() {
        let gw = InMemoryClusterGateway::new();
        gw.emit_event(EventRecord::normal(
            "CellCreated",
            "cell created",
            crate::domain::models::InvolvedObject {
                kind: "Cell".into(),
                namespace: "default".into(),
                name: "researcher".into(),
                uid: None,
            },
        ))
        .await;
        assert_eq!(gw.recorded_events().await.len(), 1);
    }
}
