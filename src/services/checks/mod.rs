//! Completion-check implementations for the Mission reconciler.
//!
//! The domain layer (`domain::models::checks`) defines the [`CheckSpec`]
//! enum and [`CheckStatus`]/[`CheckResult`] types. This service layer
//! provides the concrete, executable [`Check`] per kind and the
//! [`CheckRunner`] that builds and drives them from a Mission spec.

pub mod command;
pub mod coverage;
pub mod file_exists;
pub mod nats_response;
pub mod runner;
pub mod traits;

pub use runner::CheckRunner;
pub use traits::{Check, CheckContext};
