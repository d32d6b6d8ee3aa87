//! Check execution trait (spec §4.6 "C6 Check runner").
//!
//! Each completion-check kind gets its own [`Check`] implementation, mirroring
//! the one-struct-per-overseer layout the convergence-engine overseers use.
//! A check never throws: every implementation returns an `Ok(CheckResult)`
//! even on failure, reserving `Err` for bugs in the runner itself.

use async_trait::async_trait;

use crate::domain::models::CheckResult;

/// Context a check needs beyond its own spec: the namespace it runs in and
/// a handle to the message bus, for `natsResponse` checks.
pub struct CheckContext<'a> {
    pub namespace: &'a str,
    pub bus: &'a dyn crate::domain::ports::MessageBus,
}

#[async_trait]
pub trait Check: Send + Sync {
    fn name(&self) -> &str;

    /// Executes the check, never returning `Err` for a check-level failure
    /// (spec §4.6) — failures are reported via `CheckStatus::Failed` or
    /// `CheckStatus::Error` inside the `Ok` result.
    async fn run(&self, ctx: &CheckContext<'_>) -> CheckResult;
}
