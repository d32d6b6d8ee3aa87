//! In-memory [`LedgerStore`] — backs tests and `--local` mode.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::errors::DomainResult;
use crate::domain::models::{BudgetBalance, LedgerEntry};
use crate::domain::ports::LedgerStore;

#[derive(Default)]
pub struct InMemoryLedgerStore {
    entries: RwLock<HashMap<String, Vec<LedgerEntry>>>,
    next_id: RwLock<u64>,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn append(&self, mut entry: LedgerEntry) -> DomainResult<LedgerEntry> {
        let mut next_id = self.next_id.write().await;
        *next_id += 1;
        entry.id = *next_id;

        let mut entries = self.entries.write().await;
        entries.entry(entry.cell_id.clone()).or_default().push(entry.clone());
        Ok(entry)
    }

    async fn balance(&self, cell_id: &str) -> DomainResult<Option<BudgetBalance>> {
        let entries = self.entries.read().await;
        Ok(entries.get(cell_id).and_then(|v| v.last()).map(|e| e.post_balance))
    }

    async fn history(&self, cell_id: &str) -> DomainResult<Vec<LedgerEntry>> {
        let entries = self.entries.read().await;
        Ok(entries.get(cell_id).cloned().unwrap_or_default())
    }
}
