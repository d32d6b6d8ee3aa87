//! SQLite adapters backing the ledger, tree, and spawn-queue ports.

pub mod connection;
pub mod ledger_repository;
pub mod spawn_repository;
pub mod tree_repository;

pub use connection::DatabaseConnection;
pub use ledger_repository::SqliteLedgerStore;
pub use spawn_repository::SqliteSpawnStore;
pub use tree_repository::SqliteTreeStore;
