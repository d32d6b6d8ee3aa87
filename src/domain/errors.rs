//! Domain-wide error types.
//!
//! [`GatewayError`] is the Rust encoding of the error-kind table in spec
//! §7 (NotFound/Conflict/Forbidden/Transient/Validation/Fatal). Reconcilers
//! match on these variants to decide whether to requeue, back off, or give
//! up; they never invent their own retry policy on top of a generic
//! `anyhow::Error`.

use thiserror::Error;

/// Errors surfaced by the cluster gateway (C1) and propagated by
/// reconcilers, per spec §7.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The object was not found. Reconcilers treat this as a deletion event.
    #[error("not found: {0}")]
    NotFound(String),

    /// A write was rejected because the caller's `resourceVersion` was
    /// stale. Reconcilers re-read and requeue.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The caller is not authorized to perform the operation. Reported once
    /// as an event; not retried.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// A network or 5xx-class failure. Retried with exponential back-off.
    #[error("transient error: {0}")]
    Transient(String),

    /// The resource is malformed. Status is written with an explanation;
    /// not retried.
    #[error("validation failed: {0}")]
    Validation(String),

    /// An invariant was violated. The reconcile halts and an event is
    /// emitted; a supervisor may escalate.
    #[error("fatal error: {0}")]
    Fatal(String),
}

impl GatewayError {
    /// Whether this error should trigger an exponential-back-off requeue
    /// (spec §7: only `Transient` does; `Conflict` re-reads immediately).
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }

    /// Whether this error should trigger an immediate re-read-and-retry
    /// rather than a back-off.
    pub const fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}

pub type GatewayResult<T> = Result<T, GatewayError>;

/// Errors surfaced above the gateway layer: budget operations, message-bus
/// protocol violations, and duration/spec parsing.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// A `spend` or `allocate` operation exceeded the cell's available
    /// budget (spec §4.8, §7).
    #[error("budget exhausted for cell {cell_id}: requested {requested}, available {available}")]
    BudgetExhausted {
        cell_id: String,
        requested: f64,
        available: f64,
    },

    /// A message received over the bus violated the expected protocol
    /// (spec §7 `ProtocolViolation`).
    #[error("protocol violation: {0}")]
    ProtocolViolation(String),

    /// A duration literal did not match the grammar in spec §6, or
    /// parsed to zero.
    #[error("invalid duration literal: {0}")]
    InvalidDuration(String),

    /// A resource spec failed structural validation (e.g. a Mission naming
    /// neither `formationRef` nor `cellRef`, or a Formation topology
    /// missing a required parameter).
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A persistence operation against the ledger, tree, or spawn store
    /// failed (spec §4.7, §4.8, §4.9).
    #[error("storage error: {0}")]
    Storage(String),
}

pub type DomainResult<T> = Result<T, DomainError>;
