use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use super::Config;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid log level: {0} (must be trace, debug, info, warn, or error)")]
    InvalidLogLevel(String),

    #[error("reconciler worker count must be at least 1, got {0}")]
    InvalidWorkerCount(u32),

    #[error("ledger database_path cannot be empty")]
    EmptyDatabasePath,
}

/// Configuration loader with hierarchical merging.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging.
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults
    /// 2. `config.yaml` in the current directory (optional)
    /// 3. `KAIS_*` environment variables, `__`-nested
    pub fn load() -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file("config.yaml"))
            .merge(Env::prefixed("KAIS_").split("__"))
            .extract()
            .context("failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .merge(Env::prefixed("KAIS_").split("__"))
            .extract()
            .with_context(|| format!("failed to load config from {}", path.as_ref().display()))?;

        Self::validate(&config)?;
        Ok(config)
    }

    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        for workers in [
            config.reconciler.cell_workers,
            config.reconciler.formation_workers,
            config.reconciler.mission_workers,
        ] {
            if workers == 0 {
                return Err(ConfigError::InvalidWorkerCount(workers));
            }
        }

        if config.ledger.database_path.is_empty() {
            return Err(ConfigError::EmptyDatabasePath);
        }

        Ok(())
    }
}
