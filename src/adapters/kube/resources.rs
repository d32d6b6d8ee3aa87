//! Kubernetes custom resource wrapper types and domain conversions.
//!
//! `kube-rs`'s `CustomResource` derive generates the `Api<T>`-compatible
//! struct plus its own `ObjectMeta`; the `From`/`TryFrom` impls below are
//! the only place that translates between that representation and this
//! crate's gateway-agnostic domain models (spec §4.1, §6).

use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference as K8sOwnerReference;
use kube::{CustomResource, Resource};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    Cell as DomainCell, CellSpec, CellStatus, Formation as DomainFormation, FormationSpec,
    FormationStatus, Mission as DomainMission, MissionSpec, MissionStatus, ObjectMeta,
    OwnerReference,
};

#[derive(CustomResource, Clone, Debug, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "kais.io",
    version = "v1",
    kind = "Cell",
    namespaced,
    status = "CellStatus",
    derive = "PartialEq"
)]
pub struct CellCrdSpec(pub CellSpec);

#[derive(CustomResource, Clone, Debug, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "kais.io",
    version = "v1",
    kind = "Formation",
    namespaced,
    status = "FormationStatus",
    derive = "PartialEq"
)]
pub struct FormationCrdSpec(pub FormationSpec);

#[derive(CustomResource, Clone, Debug, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "kais.io",
    version = "v1",
    kind = "Mission",
    namespaced,
    status = "MissionStatus",
    derive = "PartialEq"
)]
pub struct MissionCrdSpec(pub MissionSpec);

fn domain_meta<K: Resource<DynamicType = ()>>(obj: &K) -> DomainResult<ObjectMeta> {
    let meta = obj.meta();
    let name = meta
        .name
        .clone()
        .ok_or_else(|| DomainError::Validation("resource is missing metadata.name".to_string()))?;
    let namespace = meta
        .namespace
        .clone()
        .ok_or_else(|| DomainError::Validation("resource is missing metadata.namespace".to_string()))?;

    Ok(ObjectMeta {
        name,
        namespace,
        uid: meta.uid.clone(),
        resource_version: meta.resource_version.clone(),
        labels: meta.labels.clone().unwrap_or_default().into_iter().collect(),
        owner_references: meta
            .owner_references
            .clone()
            .unwrap_or_default()
            .iter()
            .map(owner_reference_from_k8s)
            .collect(),
        creation_timestamp: meta.creation_timestamp.as_ref().map(|t| t.0),
        deletion_timestamp: meta.deletion_timestamp.as_ref().map(|t| t.0),
    })
}

fn owner_reference_from_k8s(owner: &K8sOwnerReference) -> OwnerReference {
    OwnerReference {
        api_version: owner.api_version.clone(),
        kind: owner.kind.clone(),
        name: owner.name.clone(),
        uid: owner.uid.clone(),
        controller: owner.controller.unwrap_or(false),
        block_owner_deletion: owner.block_owner_deletion.unwrap_or(false),
    }
}

fn owner_reference_to_k8s(owner: &OwnerReference) -> K8sOwnerReference {
    K8sOwnerReference {
        api_version: owner.api_version.clone(),
        kind: owner.kind.clone(),
        name: owner.name.clone(),
        uid: owner.uid.clone(),
        controller: Some(owner.controller),
        block_owner_deletion: Some(owner.block_owner_deletion),
    }
}

impl TryFrom<Cell> for DomainCell {
    type Error = DomainError;

    fn try_from(value: Cell) -> Result<Self, Self::Error> {
        Ok(Self {
            metadata: domain_meta(&value)?,
            spec: value.spec.0,
            status: value.status,
        })
    }
}

impl From<DomainCell> for Cell {
    fn from(value: DomainCell) -> Self {
        let mut cell = Cell::new(&value.metadata.name, CellCrdSpec(value.spec));
        apply_domain_meta(cell.meta_mut(), &value.metadata);
        cell.status = value.status;
        cell
    }
}

impl TryFrom<Formation> for DomainFormation {
    type Error = DomainError;

    fn try_from(value: Formation) -> Result<Self, Self::Error> {
        Ok(Self {
            metadata: domain_meta(&value)?,
            spec: value.spec.0,
            status: value.status,
        })
    }
}

impl From<DomainFormation> for Formation {
    fn from(value: DomainFormation) -> Self {
        let mut formation = Formation::new(&value.metadata.name, FormationCrdSpec(value.spec));
        apply_domain_meta(formation.meta_mut(), &value.metadata);
        formation.status = value.status;
        formation
    }
}

impl TryFrom<Mission> for DomainMission {
    type Error = DomainError;

    fn try_from(value: Mission) -> Result<Self, Self::Error> {
        Ok(Self {
            metadata: domain_meta(&value)?,
            spec: value.spec.0,
            status: value.status,
        })
    }
}

impl From<DomainMission> for Mission {
    fn from(value: DomainMission) -> Self {
        let mut mission = Mission::new(&value.metadata.name, MissionCrdSpec(value.spec));
        apply_domain_meta(mission.meta_mut(), &value.metadata);
        mission.status = value.status;
        mission
    }
}

fn apply_domain_meta(meta: &mut kube::api::ObjectMeta, domain: &ObjectMeta) {
    meta.namespace = Some(domain.namespace.clone());
    meta.uid = domain.uid.clone();
    meta.resource_version = domain.resource_version.clone();
    meta.labels = Some(domain.labels.clone().into_iter().collect());
    meta.owner_references = Some(domain.owner_references.iter().map(owner_reference_to_k8s).collect());
}
