//! Exponential back-off schedule (spec §5 "Concurrency & Resource Model").
//!
//! Base 1s, factor 2, capped at 60s — shared by the reconciler work queue
//! and the Mission message-bus request retries.

use std::time::Duration;

const BASE: Duration = Duration::from_secs(1);
const FACTOR: u32 = 2;
const CAP: Duration = Duration::from_secs(60);

/// Delay before the `attempt`-th retry (0-indexed: `attempt = 0` is the
/// first retry after an initial failure).
pub fn delay_for_attempt(attempt: u32) -> Duration {
    let scaled = FACTOR.checked_pow(attempt).unwrap_or(u32::MAX);
    BASE.checked_mul(scaled).unwrap_or(CAP).min(CAP)
}
