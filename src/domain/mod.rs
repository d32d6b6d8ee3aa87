//! Domain layer for the kais control plane.
//!
//! This module contains core business logic and domain models: the Cell,
//! Formation, and Mission resource types, topology generation, the budget
//! ledger, the spawn tree, and the error kinds reconcilers match on. Pure
//! Rust; no `kube`, `sqlx`, or `async-nats` types leak in here — those
//! belong to the adapters behind the ports this module declares.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{DomainError, DomainResult, GatewayError, GatewayResult};
