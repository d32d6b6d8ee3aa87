//! Domain ports (interfaces) for the kais control plane.

pub mod cluster_gateway;
pub mod ledger_store;
pub mod message_bus;
pub mod spawn_store;
pub mod tree_store;

pub use cluster_gateway::ClusterGateway;
pub use ledger_store::LedgerStore;
pub use message_bus::{decode_payload, publish_json, request_json, BusMessage, MessageBus};
pub use spawn_store::SpawnStore;
pub use tree_store::TreeStore;
