//! Production [`ClusterGateway`](crate::domain::ports::ClusterGateway)
//! backed by a real Kubernetes API server via `kube-rs`.

pub mod gateway;
pub mod resources;

pub use gateway::KubeClusterGateway;
