//! In-memory adapters backing unit tests and the CLI's `--local` mode.

pub mod cluster_gateway;
pub mod ledger_store;
pub mod message_bus;
pub mod spawn_store;
pub mod tree_store;

pub use cluster_gateway::InMemoryClusterGateway;
pub use ledger_store::InMemoryLedgerStore;
pub use message_bus::InMemoryMessageBus;
pub use spawn_store::InMemorySpawnStore;
pub use tree_store::InMemoryTreeStore;
