//! Production [`ClusterGateway`] backed by a real Kubernetes API server.

use std::collections::BTreeMap;

use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use k8s_openapi::api::core::v1::{
    ConfigMap as K8sConfigMap, PersistentVolumeClaim as K8sPvc, Pod as K8sPod,
};
use kube::api::{Api, ListParams, Patch, PatchParams, PostParams};
use kube::runtime::watcher;
use kube::Client;

use crate::domain::errors::{GatewayError, GatewayResult};
use crate::domain::models::{
    Cell, ConfigMapRef, EventRecord, Formation, Mission, ObjectMeta, PersistentVolumeClaimRef,
    PodPhase, PodRef, WatchEvent,
};
use crate::domain::ports::ClusterGateway;

use super::resources::{Cell as CellCrd, Formation as FormationCrd, Mission as MissionCrd};

pub struct KubeClusterGateway {
    client: Client,
}

impl KubeClusterGateway {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn cells(&self, namespace: &str) -> Api<CellCrd> {
        Api::namespaced(self.client.clone(), namespace)
    }

    fn formations(&self, namespace: &str) -> Api<FormationCrd> {
        Api::namespaced(self.client.clone(), namespace)
    }

    fn missions(&self, namespace: &str) -> Api<MissionCrd> {
        Api::namespaced(self.client.clone(), namespace)
    }

    fn pods(&self, namespace: &str) -> Api<K8sPod> {
        Api::namespaced(self.client.clone(), namespace)
    }

    fn configmaps(&self, namespace: &str) -> Api<K8sConfigMap> {
        Api::namespaced(self.client.clone(), namespace)
    }

    fn pvcs(&self, namespace: &str) -> Api<K8sPvc> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

fn map_kube_error(err: kube::Error) -> GatewayError {
    match &err {
        kube::Error::Api(resp) if resp.code == 404 => GatewayError::NotFound(resp.message.clone()),
        kube::Error::Api(resp) if resp.code == 409 => GatewayError::Conflict(resp.message.clone()),
        kube::Error::Api(resp) if resp.code == 403 => GatewayError::Forbidden(resp.message.clone()),
        kube::Error::Api(resp) if resp.code >= 500 => GatewayError::Transient(resp.message.clone()),
        _ => GatewayError::Transient(err.to_string()),
    }
}

fn pod_phase(pod: &K8sPod) -> PodPhase {
    match pod.status.as_ref().and_then(|s| s.phase.as_deref()) {
        Some("Pending") => PodPhase::Pending,
        Some("Running") => PodPhase::Running,
        Some("Succeeded") => PodPhase::Succeeded,
        Some("Failed") => PodPhase::Failed,
        _ => PodPhase::Unknown,
    }
}

fn pod_to_domain(pod: K8sPod) -> GatewayResult<PodRef> {
    let meta = &pod.metadata;
    let name = meta
        .name
        .clone()
        .ok_or_else(|| GatewayError::Validation("pod is missing metadata.name".to_string()))?;
    let namespace = meta
        .namespace
        .clone()
        .ok_or_else(|| GatewayError::Validation("pod is missing metadata.namespace".to_string()))?;
    let labels: BTreeMap<String, String> = meta.labels.clone().unwrap_or_default().into_iter().collect();
    let env = pod
        .spec
        .as_ref()
        .and_then(|s| s.containers.first())
        .and_then(|c| c.env.as_ref())
        .map(|vars| {
            vars.iter()
                .filter_map(|v| v.value.clone().map(|val| (v.name.clone(), val)))
                .collect()
        })
        .unwrap_or_default();

    let mut metadata = ObjectMeta::new(name, namespace);
    metadata.labels = labels;
    metadata.uid = meta.uid.clone();
    metadata.resource_version = meta.resource_version.clone();

    let phase = pod_phase(&pod);
    Ok(PodRef { metadata, phase, env })
}

#[async_trait]
impl ClusterGateway for KubeClusterGateway {
    async fn get_cell(&self, namespace: &str, name: &str) -> GatewayResult<Cell> {
        let crd = self.cells(namespace).get(name).await.map_err(map_kube_error)?;
        crd.try_into().map_err(|e: crate::domain::errors::DomainError| GatewayError::Fatal(e.to_string()))
    }

    async fn create_cell(&self, cell: &Cell) -> GatewayResult<Cell> {
        let crd: CellCrd = cell.clone().into();
        let created = self
            .cells(&cell.metadata.namespace)
            .create(&PostParams::default(), &crd)
            .await
            .map_err(map_kube_error)?;
        created.try_into().map_err(|e: crate::domain::errors::DomainError| GatewayError::Fatal(e.to_string()))
    }

    async fn update_cell(&self, cell: &Cell) -> GatewayResult<Cell> {
        let crd: CellCrd = cell.clone().into();
        let updated = self
            .cells(&cell.metadata.namespace)
            .replace(&cell.metadata.name, &PostParams::default(), &crd)
            .await
            .map_err(map_kube_error)?;
        updated.try_into().map_err(|e: crate::domain::errors::DomainError| GatewayError::Fatal(e.to_string()))
    }

    async fn update_cell_status(&self, cell: &Cell) -> GatewayResult<Cell> {
        let patch = serde_json::json!({ "status": cell.status });
        let updated = self
            .cells(&cell.metadata.namespace)
            .patch_status(&cell.metadata.name, &PatchParams::default(), &Patch::Merge(patch))
            .await
            .map_err(map_kube_error)?;
        updated.try_into().map_err(|e: crate::domain::errors::DomainError| GatewayError::Fatal(e.to_string()))
    }

    async fn delete_cell(&self, namespace: &str, name: &str) -> GatewayResult<()> {
        self.cells(namespace)
            .delete(name, &Default::default())
            .await
            .map_err(map_kube_error)?;
        Ok(())
    }

    async fn list_cells(&self, namespace: &str) -> GatewayResult<Vec<Cell>> {
        let list = self.cells(namespace).list(&ListParams::default()).await.map_err(map_kube_error)?;
        list.items
            .into_iter()
            .map(|c| c.try_into().map_err(|e: crate::domain::errors::DomainError| GatewayError::Fatal(e.to_string())))
            .collect()
    }

    fn watch_cells(&self, namespace: &str) -> BoxStream<'static, GatewayResult<WatchEvent<Cell>>> {
        let api = self.cells(namespace);
        Box::pin(watcher(api, watcher::Config::default()).filter_map(|event| async move {
            match event {
                Ok(watcher::Event::Apply(obj)) => Some(to_event(obj, true)),
                Ok(watcher::Event::Delete(obj)) => Some(to_event(obj, false)),
                Ok(watcher::Event::Init | watcher::Event::InitApply(_) | watcher::Event::InitDone) => None,
                Err(err) => Some(Err(GatewayError::Transient(err.to_string()))),
            }
        }))
    }

    async fn get_formation(&self, namespace: &str, name: &str) -> GatewayResult<Formation> {
        let crd = self.formations(namespace).get(name).await.map_err(map_kube_error)?;
        crd.try_into().map_err(|e: crate::domain::errors::DomainError| GatewayError::Fatal(e.to_string()))
    }

    async fn create_formation(&self, formation: &Formation) -> GatewayResult<Formation> {
        let crd: FormationCrd = formation.clone().into();
        let created = self
            .formations(&formation.metadata.namespace)
            .create(&PostParams::default(), &crd)
            .await
            .map_err(map_kube_error)?;
        created.try_into().map_err(|e: crate::domain::errors::DomainError| GatewayError::Fatal(e.to_string()))
    }

    async fn update_formation(&self, formation: &Formation) -> GatewayResult<Formation> {
        let crd: FormationCrd = formation.clone().into();
        let updated = self
            .formations(&formation.metadata.namespace)
            .replace(&formation.metadata.name, &PostParams::default(), &crd)
            .await
            .map_err(map_kube_error)?;
        updated.try_into().map_err(|e: crate::domain::errors::DomainError| GatewayError::Fatal(e.to_string()))
    }

    async fn update_formation_status(&self, formation: &Formation) -> GatewayResult<Formation> {
        let patch = serde_json::json!({ "status": formation.status });
        let updated = self
            .formations(&formation.metadata.namespace)
            .patch_status(&formation.metadata.name, &PatchParams::default(), &Patch::Merge(patch))
            .await
            .map_err(map_kube_error)?;
        updated.try_into().map_err(|e: crate::domain::errors::DomainError| GatewayError::Fatal(e.to_string()))
    }

    async fn delete_formation(&self, namespace: &str, name: &str) -> GatewayResult<()> {
        self.formations(namespace)
            .delete(name, &Default::default())
            .await
            .map_err(map_kube_error)?;
        Ok(())
    }

    async fn list_formations(&self, namespace: &str) -> GatewayResult<Vec<Formation>> {
        let list = self.formations(namespace).list(&ListParams::default()).await.map_err(map_kube_error)?;
        list.items
            .into_iter()
            .map(|f| f.try_into().map_err(|e: crate::domain::errors::DomainError| GatewayError::Fatal(e.to_string())))
            .collect()
    }

    fn watch_formations(
        &self,
        namespace: &str,
    ) -> BoxStream<'static, GatewayResult<WatchEvent<Formation>>> {
        let api = self.formations(namespace);
        Box::pin(watcher(api, watcher::Config::default()).filter_map(|event| async move {
            match event {
                Ok(watcher::Event::Apply(obj)) => Some(to_event(obj, true)),
                Ok(watcher::Event::Delete(obj)) => Some(to_event(obj, false)),
                Ok(watcher::Event::Init | watcher::Event::InitApply(_) | watcher::Event::InitDone) => None,
                Err(err) => Some(Err(GatewayError::Transient(err.to_string()))),
            }
        }))
    }

    async fn get_mission(&self, namespace: &str, name: &str) -> GatewayResult<Mission> {
        let crd = self.missions(namespace).get(name).await.map_err(map_kube_error)?;
        crd.try_into().map_err(|e: crate::domain::errors::DomainError| GatewayError::Fatal(e.to_string()))
    }

    async fn create_mission(&self, mission: &Mission) -> GatewayResult<Mission> {
        let crd: MissionCrd = mission.clone().into();
        let created = self
            .missions(&mission.metadata.namespace)
            .create(&PostParams::default(), &crd)
            .await
            .map_err(map_kube_error)?;
        created.try_into().map_err(|e: crate::domain::errors::DomainError| GatewayError::Fatal(e.to_string()))
    }

    async fn update_mission(&self, mission: &Mission) -> GatewayResult<Mission> {
        let crd: MissionCrd = mission.clone().into();
        let updated = self
            .missions(&mission.metadata.namespace)
            .replace(&mission.metadata.name, &PostParams::default(), &crd)
            .await
            .map_err(map_kube_error)?;
        updated.try_into().map_err(|e: crate::domain::errors::DomainError| GatewayError::Fatal(e.to_string()))
    }

    async fn update_mission_status(&self, mission: &Mission) -> GatewayResult<Mission> {
        let patch = serde_json::json!({ "status": mission.status });
        let updated = self
            .missions(&mission.metadata.namespace)
            .patch_status(&mission.metadata.name, &PatchParams::default(), &Patch::Merge(patch))
            .await
            .map_err(map_kube_error)?;
        updated.try_into().map_err(|e: crate::domain::errors::DomainError| GatewayError::Fatal(e.to_string()))
    }

    async fn delete_mission(&self, namespace: &str, name: &str) -> GatewayResult<()> {
        self.missions(namespace)
            .delete(name, &Default::default())
            .await
            .map_err(map_kube_error)?;
        Ok(())
    }

    async fn list_missions(&self, namespace: &str) -> GatewayResult<Vec<Mission>> {
        let list = self.missions(namespace).list(&ListParams::default()).await.map_err(map_kube_error)?;
        list.items
            .into_iter()
            .map(|m| m.try_into().map_err(|e: crate::domain::errors::DomainError| GatewayError::Fatal(e.to_string())))
            .collect()
    }

    fn watch_missions(
        &self,
        namespace: &str,
    ) -> BoxStream<'static, GatewayResult<WatchEvent<Mission>>> {
        let api = self.missions(namespace);
        Box::pin(watcher(api, watcher::Config::default()).filter_map(|event| async move {
            match event {
                Ok(watcher::Event::Apply(obj)) => Some(to_event(obj, true)),
                Ok(watcher::Event::Delete(obj)) => Some(to_event(obj, false)),
                Ok(watcher::Event::Init | watcher::Event::InitApply(_) | watcher::Event::InitDone) => None,
                Err(err) => Some(Err(GatewayError::Transient(err.to_string()))),
            }
        }))
    }

    async fn get_pod(&self, namespace: &str, name: &str) -> GatewayResult<Option<PodRef>> {
        match self.pods(namespace).get(name).await {
            Ok(pod) => pod_to_domain(pod).map(Some),
            Err(kube::Error::Api(resp)) if resp.code == 404 => Ok(None),
            Err(err) => Err(map_kube_error(err)),
        }
    }

    async fn create_pod(&self, pod: &PodRef) -> GatewayResult<PodRef> {
        let k8s_pod = K8sPod {
            metadata: k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta {
                name: Some(pod.metadata.name.clone()),
                namespace: Some(pod.metadata.namespace.clone()),
                labels: Some(pod.metadata.labels.clone().into_iter().collect()),
                owner_references: Some(
                    pod.metadata
                        .owner_references
                        .iter()
                        .map(|o| k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference {
                            api_version: o.api_version.clone(),
                            kind: o.kind.clone(),
                            name: o.name.clone(),
                            uid: o.uid.clone(),
                            controller: Some(o.controller),
                            block_owner_deletion: Some(o.block_owner_deletion),
                        })
                        .collect(),
                ),
                ..Default::default()
            },
            spec: Some(k8s_openapi::api::core::v1::PodSpec {
                containers: vec![k8s_openapi::api::core::v1::Container {
                    name: "mind".to_string(),
                    env: Some(
                        pod.env
                            .iter()
                            .map(|(k, v)| k8s_openapi::api::core::v1::EnvVar {
                                name: k.clone(),
                                value: Some(v.clone()),
                                ..Default::default()
                            })
                            .collect(),
                    ),
                    ..Default::default()
                }],
                restart_policy: Some("Never".to_string()),
                ..Default::default()
            }),
            status: None,
        };
        let created = self
            .pods(&pod.metadata.namespace)
            .create(&PostParams::default(), &k8s_pod)
            .await
            .map_err(map_kube_error)?;
        pod_to_domain(created)
    }

    async fn delete_pod(&self, namespace: &str, name: &str) -> GatewayResult<()> {
        match self.pods(namespace).delete(name, &Default::default()).await {
            Ok(_) => Ok(()),
            Err(kube::Error::Api(resp)) if resp.code == 404 => Ok(()),
            Err(err) => Err(map_kube_error(err)),
        }
    }

    async fn list_pods_by_label(
        &self,
        namespace: &str,
        label_key: &str,
        label_value: &str,
    ) -> GatewayResult<Vec<PodRef>> {
        let params = ListParams::default().labels(&format!("{label_key}={label_value}"));
        let list = self.pods(namespace).list(&params).await.map_err(map_kube_error)?;
        list.items.into_iter().map(pod_to_domain).collect()
    }

    fn watch_pods(&self, namespace: &str) -> BoxStream<'static, GatewayResult<WatchEvent<PodRef>>> {
        let api = self.pods(namespace);
        Box::pin(watcher(api, watcher::Config::default()).filter_map(|event| async move {
            match event {
                Ok(watcher::Event::Apply(pod)) => Some(pod_to_domain(pod).map(WatchEvent::Added)),
                Ok(watcher::Event::Delete(pod)) => Some(pod_to_domain(pod).map(WatchEvent::Deleted)),
                Ok(watcher::Event::Init | watcher::Event::InitApply(_) | watcher::Event::InitDone) => None,
                Err(err) => Some(Err(GatewayError::Transient(err.to_string()))),
            }
        }))
    }

    async fn get_configmap(&self, namespace: &str, name: &str) -> GatewayResult<Option<ConfigMapRef>> {
        match self.configmaps(namespace).get(name).await {
            Ok(cm) => Ok(Some(configmap_to_domain(cm)?)),
            Err(kube::Error::Api(resp)) if resp.code == 404 => Ok(None),
            Err(err) => Err(map_kube_error(err)),
        }
    }

    async fn apply_configmap(&self, configmap: &ConfigMapRef) -> GatewayResult<ConfigMapRef> {
        let k8s_cm = K8sConfigMap {
            metadata: k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta {
                name: Some(configmap.metadata.name.clone()),
                namespace: Some(configmap.metadata.namespace.clone()),
                labels: Some(configmap.metadata.labels.clone().into_iter().collect()),
                owner_references: Some(
                    configmap
                        .metadata
                        .owner_references
                        .iter()
                        .map(|o| k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference {
                            api_version: o.api_version.clone(),
                            kind: o.kind.clone(),
                            name: o.name.clone(),
                            uid: o.uid.clone(),
                            controller: Some(o.controller),
                            block_owner_deletion: Some(o.block_owner_deletion),
                        })
                        .collect(),
                ),
                ..Default::default()
            },
            data: Some(configmap.data.clone().into_iter().collect()),
            ..Default::default()
        };
        let applied = self
            .configmaps(&configmap.metadata.namespace)
            .patch(
                &configmap.metadata.name,
                &PatchParams::apply("kais-operator"),
                &Patch::Apply(&k8s_cm),
            )
            .await
            .map_err(map_kube_error)?;
        configmap_to_domain(applied)
    }

    async fn delete_configmap(&self, namespace: &str, name: &str) -> GatewayResult<()> {
        match self.configmaps(namespace).delete(name, &Default::default()).await {
            Ok(_) => Ok(()),
            Err(kube::Error::Api(resp)) if resp.code == 404 => Ok(()),
            Err(err) => Err(map_kube_error(err)),
        }
    }

    async fn get_pvc(
        &self,
        namespace: &str,
        name: &str,
    ) -> GatewayResult<Option<PersistentVolumeClaimRef>> {
        match self.pvcs(namespace).get(name).await {
            Ok(pvc) => Ok(Some(pvc_to_domain(pvc)?)),
            Err(kube::Error::Api(resp)) if resp.code == 404 => Ok(None),
            Err(err) => Err(map_kube_error(err)),
        }
    }

    async fn create_pvc(
        &self,
        pvc: &PersistentVolumeClaimRef,
    ) -> GatewayResult<PersistentVolumeClaimRef> {
        let k8s_pvc = K8sPvc {
            metadata: k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta {
                name: Some(pvc.metadata.name.clone()),
                namespace: Some(pvc.metadata.namespace.clone()),
                owner_references: Some(
                    pvc.metadata
                        .owner_references
                        .iter()
                        .map(|o| k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference {
                            api_version: o.api_version.clone(),
                            kind: o.kind.clone(),
                            name: o.name.clone(),
                            uid: o.uid.clone(),
                            controller: Some(o.controller),
                            block_owner_deletion: Some(o.block_owner_deletion),
                        })
                        .collect(),
                ),
                ..Default::default()
            },
            spec: Some(k8s_openapi::api::core::v1::PersistentVolumeClaimSpec {
                access_modes: Some(vec!["ReadWriteOnce".to_string()]),
                resources: Some(k8s_openapi::api::core::v1::VolumeResourceRequirements {
                    requests: Some(BTreeMap::from([(
                        "storage".to_string(),
                        k8s_openapi::apimachinery::pkg::api::resource::Quantity("1Gi".to_string()),
                    )])),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            status: None,
        };
        let created = self
            .pvcs(&pvc.metadata.namespace)
            .create(&PostParams::default(), &k8s_pvc)
            .await
            .map_err(map_kube_error)?;
        pvc_to_domain(created)
    }

    async fn delete_pvc(&self, namespace: &str, name: &str) -> GatewayResult<()> {
        match self.pvcs(namespace).delete(name, &Default::default()).await {
            Ok(_) => Ok(()),
            Err(kube::Error::Api(resp)) if resp.code == 404 => Ok(()),
            Err(err) => Err(map_kube_error(err)),
        }
    }

    async fn emit_event(&self, event: EventRecord) {
        // A real implementation publishes to the `events.k8s.io` API scoped
        // to `event.involved_object`; failures are logged, never propagated
        // (spec §4.1).
        tracing::info!(
            reason = %event.reason,
            kind = %event.involved_object.kind,
            object = %event.involved_object.name,
            "{}",
            event.message
        );
    }
}

fn to_event<T: Clone + TryInto<D>, D>(obj: T, added: bool) -> GatewayResult<WatchEvent<D>>
where
    T::Error: std::fmt::Display,
{
    let domain = obj
        .try_into()
        .map_err(|e: T::Error| GatewayError::Fatal(e.to_string()))?;
    Ok(if added {
        WatchEvent::Updated(domain)
    } else {
        WatchEvent::Deleted(domain)
    })
}

fn configmap_to_domain(cm: K8sConfigMap) -> GatewayResult<ConfigMapRef> {
    let meta = &cm.metadata;
    let name = meta
        .name
        .clone()
        .ok_or_else(|| GatewayError::Validation("configmap is missing metadata.name".to_string()))?;
    let namespace = meta
        .namespace
        .clone()
        .ok_or_else(|| GatewayError::Validation("configmap is missing metadata.namespace".to_string()))?;
    Ok(ConfigMapRef {
        metadata: ObjectMeta::new(name, namespace),
        data: cm.data.unwrap_or_default().into_iter().collect(),
    })
}

fn pvc_to_domain(pvc: K8sPvc) -> GatewayResult<PersistentVolumeClaimRef> {
    let meta = &pvc.metadata;
    let name = meta
        .name
        .clone()
        .ok_or_else(|| GatewayError::Validation("pvc is missing metadata.name".to_string()))?;
    let namespace = meta
        .namespace
        .clone()
        .ok_or_else(|| GatewayError::Validation("pvc is missing metadata.namespace".to_string()))?;
    Ok(PersistentVolumeClaimRef {
        metadata: ObjectMeta::new(name, namespace),
    })
}
