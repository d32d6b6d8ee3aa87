//! kais-operator - Kubernetes control plane for Cell/Formation/Mission
//! custom resources.
//!
//! A hexagonal crate: [`domain`] holds the pure business logic and the
//! ports it talks through, [`services`] orchestrates that logic into
//! reconcile loops, [`adapters`] implement the ports against real or
//! in-memory backends, and [`infrastructure`] carries the ambient config
//! and logging concerns. [`cli`] wires all of it into a runnable binary.

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

pub use infrastructure::{Config, ConfigLoader};
