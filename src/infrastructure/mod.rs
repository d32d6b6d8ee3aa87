//! Infrastructure: configuration and logging. No domain logic lives here.

pub mod config;
pub mod logging;

pub use config::{Config, ConfigLoader};
pub use logging::LoggerImpl;
