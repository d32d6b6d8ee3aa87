//! Configuration management infrastructure.
//!
//! Hierarchical configuration using figment: programmatic defaults, an
//! optional YAML file, then `KAIS_`-prefixed environment overrides.

pub mod loader;

pub use loader::{ConfigError, ConfigLoader};

use serde::{Deserialize, Serialize};

/// Top-level configuration for the control plane binary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub cluster: ClusterConfig,
    #[serde(default)]
    pub ledger: LedgerConfig,
    #[serde(default)]
    pub message_bus: MessageBusConfig,
    #[serde(default)]
    pub reconciler: ReconcilerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// How the cluster gateway talks to Kubernetes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterConfig {
    /// Namespace the reconcilers watch; empty means all namespaces.
    pub namespace: String,
    /// Use the in-memory gateway instead of a real cluster connection.
    pub local: bool,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            namespace: String::new(),
            local: false,
        }
    }
}

/// SQLite connection settings for the ledger/tree/spawn repositories.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerConfig {
    pub database_path: String,
    pub max_connections: u32,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            database_path: "kais.db".to_string(),
            max_connections: 5,
        }
    }
}

/// NATS connection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageBusConfig {
    pub url: String,
}

impl Default for MessageBusConfig {
    fn default() -> Self {
        Self {
            url: "nats://127.0.0.1:4222".to_string(),
        }
    }
}

/// Work-queue sizing and back-off bounds (spec §5).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReconcilerConfig {
    pub cell_workers: u32,
    pub formation_workers: u32,
    pub mission_workers: u32,
    pub cell_deadline_seconds: u64,
    pub formation_deadline_seconds: u64,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            cell_workers: 4,
            formation_workers: 2,
            mission_workers: 4,
            cell_deadline_seconds: 30,
            formation_deadline_seconds: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
    pub log_dir: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
            log_dir: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Pretty,
}
