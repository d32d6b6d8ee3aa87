//! Budget ledger persistence port (spec §4.8 "C8 Budget ledger").

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::{BudgetBalance, LedgerEntry};

/// Append-only ledger plus a derived balance view, per cell (spec §3
/// "Budget balance & ledger"). The sqlite adapter is the production
/// implementation; an in-memory adapter backs tests.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Appends `entry` and returns the entry with its assigned id.
    async fn append(&self, entry: LedgerEntry) -> DomainResult<LedgerEntry>;

    /// Current balance for `cell_id`, or `None` if the ledger has never
    /// been initialized for that cell.
    async fn balance(&self, cell_id: &str) -> DomainResult<Option<BudgetBalance>>;

    /// Full entry history for `cell_id`, oldest first.
    async fn history(&self, cell_id: &str) -> DomainResult<Vec<LedgerEntry>>;
}
