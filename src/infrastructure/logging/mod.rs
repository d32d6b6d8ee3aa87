//! Structured logging infrastructure built on `tracing`/`tracing-subscriber`.

pub mod logger;

pub use logger::LoggerImpl;
