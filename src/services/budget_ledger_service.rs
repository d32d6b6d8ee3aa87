//! Budget ledger service (spec §4.8 "C8 Budget ledger").
//!
//! Wraps a [`LedgerStore`] with the operations a reconciler actually calls:
//! `init`, `allocate`, `topUp`, `spend`, `reclaim`. Every operation appends
//! a [`LedgerEntry`] and returns the resulting [`BudgetBalance`]; the store
//! itself never mutates a balance in place; each entry carries its own
//! `post_balance` snapshot so history replays deterministically.
//!
//! `allocate` and `reclaim` are two-cell operations: they move budget
//! between a parent and a child balance, each side recording its own ledger
//! entry with the other as `counterparty`.

use std::sync::Arc;

use chrono::Utc;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{BudgetBalance, LedgerEntry, LedgerOperation};
use crate::domain::ports::LedgerStore;

pub struct BudgetLedgerService {
    store: Arc<dyn LedgerStore>,
}

impl BudgetLedgerService {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    async fn next_balance(&self, cell_id: &str) -> DomainResult<BudgetBalance> {
        Ok(self.store.balance(cell_id).await?.unwrap_or_default())
    }

    async fn append(
        &self,
        cell_id: &str,
        operation: LedgerOperation,
        amount: f64,
        counterparty: Option<String>,
        post_balance: BudgetBalance,
        reason: Option<String>,
    ) -> DomainResult<BudgetBalance> {
        let entry = LedgerEntry {
            id: 0,
            cell_id: cell_id.to_string(),
            operation,
            amount,
            counterparty,
            post_balance,
            reason,
            timestamp: Utc::now(),
        };
        let stored = self.store.append(entry).await?;
        Ok(stored.post_balance)
    }

    /// Creates the ledger for a newly-created cell with a zero balance,
    /// idempotently: if a balance already exists this is a no-op returning
    /// the existing balance (spec §4.3 "reconcile is idempotent").
    pub async fn init(&self, cell_id: &str) -> DomainResult<BudgetBalance> {
        if let Some(existing) = self.store.balance(cell_id).await? {
            return Ok(existing);
        }
        self.append(cell_id, LedgerOperation::Init, 0.0, None, BudgetBalance::zero(), None)
            .await
    }

    /// Delegates `amount` from `parent_id`'s available budget to `child_id`
    /// (spec §4.8): the parent's `delegated` rises and the child's
    /// `allocated` rises by the same amount, so the child can spend or
    /// delegate further out of it in turn. Each side appends its own ledger
    /// entry naming the other as `counterparty`; the returned balance is the
    /// parent's.
    pub async fn allocate(&self, parent_id: &str, child_id: &str, amount: f64) -> DomainResult<BudgetBalance> {
        let mut parent_balance = self.next_balance(parent_id).await?;
        if amount > parent_balance.available() {
            return Err(DomainError::BudgetExhausted {
                cell_id: parent_id.to_string(),
                requested: amount,
                available: parent_balance.available(),
            });
        }
        parent_balance.delegated += amount;
        let parent_result = self
            .append(
                parent_id,
                LedgerOperation::Allocate,
                amount,
                Some(child_id.to_string()),
                parent_balance,
                None,
            )
            .await?;

        let mut child_balance = self.next_balance(child_id).await?;
        child_balance.allocated += amount;
        self.append(
            child_id,
            LedgerOperation::Allocate,
            amount,
            Some(parent_id.to_string()),
            child_balance,
            None,
        )
        .await?;

        Ok(parent_result)
    }

    /// Increases `cell_id`'s allocated budget, e.g. from a top-level
    /// Formation/Mission budget or an operator action.
    pub async fn top_up(&self, cell_id: &str, amount: f64, reason: Option<String>) -> DomainResult<BudgetBalance> {
        let mut balance = self.next_balance(cell_id).await?;
        balance.allocated += amount;
        self.append(cell_id, LedgerOperation::TopUp, amount, None, balance, reason)
            .await
    }

    /// Records `amount` spent by `cell_id`. Fails with
    /// [`DomainError::BudgetExhausted`] if it would drive `available`
    /// negative (spec §7).
    pub async fn spend(&self, cell_id: &str, amount: f64) -> DomainResult<BudgetBalance> {
        let mut balance = self.next_balance(cell_id).await?;
        if amount > balance.available() {
            return Err(DomainError::BudgetExhausted {
                cell_id: cell_id.to_string(),
                requested: amount,
                available: balance.available(),
            });
        }
        balance.spent += amount;
        self.append(cell_id, LedgerOperation::Spend, amount, None, balance, None)
            .await
    }

    /// Reclaims whatever `child_id` has not spent or delegated further back
    /// to `parent_id` (spec §4.8), e.g. when a child cell completes without
    /// spending its full allocation. The reclaimed amount is the child's own
    /// `available()` at the time of the call, not a caller-supplied figure:
    /// it decrements the child's `allocated` to zero-out that leftover and
    /// decrements the parent's `delegated` by the same amount, appending a
    /// ledger entry on each side. Returns the amount reclaimed.
    pub async fn reclaim(&self, parent_id: &str, child_id: &str) -> DomainResult<f64> {
        let mut child_balance = self.next_balance(child_id).await?;
        let reclaimed = child_balance.available();
        if reclaimed == 0.0 {
            return Ok(0.0);
        }
        child_balance.allocated -= reclaimed;
        self.append(
            child_id,
            LedgerOperation::Reclaim,
            reclaimed,
            Some(parent_id.to_string()),
            child_balance,
            None,
        )
        .await?;

        let mut parent_balance = self.next_balance(parent_id).await?;
        parent_balance.delegated = (parent_balance.delegated - reclaimed).max(0.0);
        self.append(
            parent_id,
            LedgerOperation::Reclaim,
            reclaimed,
            Some(child_id.to_string()),
            parent_balance,
            None,
        )
        .await?;

        Ok(reclaimed)
    }

    pub async fn balance(&self, cell_id: &str) -> DomainResult<BudgetBalance> {
        self.next_balance(cell_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryLedgerStore;

    fn service() -> BudgetLedgerService {
        BudgetLedgerService::new(Arc::new(InMemoryLedgerStore::new()))
    }

    #[tokio::test]
    async fn init_is_idempotent() {
        let svc = service();
        let first = svc.init("cell-a").await.unwrap();
        svc.top_up("cell-a", 5.0, None).await.unwrap();
        let second = svc.init("cell-a").await.unwrap();
        assert_eq!(first, BudgetBalance::zero());
        assert_eq!(second.allocated, 5.0);
    }

    #[tokio::test]
    async fn spend_beyond_available_is_rejected() {
        let svc = service();
        svc.init("cell-a").await.unwrap();
        svc.top_up("cell-a", 10.0, None).await.unwrap();
        assert!(svc.spend("cell-a", 11.0).await.is_err());
        let balance = svc.spend("cell-a", 4.0).await.unwrap();
        assert_eq!(balance.available(), 6.0);
    }

    #[tokio::test]
    async fn allocate_and_reclaim_round_trip() {
        let svc = service();
        svc.init("parent").await.unwrap();
        svc.top_up("parent", 20.0, None).await.unwrap();
        let after_alloc = svc.allocate("parent", "child-0", 8.0).await.unwrap();
        assert_eq!(after_alloc.available(), 12.0);
        let child_balance = svc.balance("child-0").await.unwrap();
        assert_eq!(child_balance.allocated, 8.0);
        assert_eq!(child_balance.available(), 8.0);

        let reclaimed = svc.reclaim("parent", "child-0").await.unwrap();
        assert_eq!(reclaimed, 8.0);
        let parent_balance = svc.balance("parent").await.unwrap();
        assert_eq!(parent_balance.available(), 20.0);
        let child_balance = svc.balance("child-0").await.unwrap();
        assert_eq!(child_balance.available(), 0.0);
    }

    /// Spec §8 scenario 6: a child that received an allocation can delegate
    /// part of it further to a grandchild, which was structurally impossible
    /// when `allocate` only touched the parent's side of the ledger.
    #[tokio::test]
    async fn allocated_child_can_delegate_to_a_grandchild() {
        let svc = service();
        svc.init("parent").await.unwrap();
        svc.top_up("parent", 50.0, None).await.unwrap();
        svc.allocate("parent", "child-0", 50.0).await.unwrap();

        let grandchild_alloc = svc.allocate("child-0", "grandchild-0", 20.0).await.unwrap();
        assert_eq!(grandchild_alloc.available(), 30.0);
        let grandchild_balance = svc.balance("grandchild-0").await.unwrap();
        assert_eq!(grandchild_balance.allocated, 20.0);
    }

    #[tokio::test]
    async fn reclaim_with_nothing_available_is_a_no_op() {
        let svc = service();
        svc.init("parent").await.unwrap();
        svc.top_up("parent", 10.0, None).await.unwrap();
        svc.allocate("parent", "child-0", 10.0).await.unwrap();
        svc.spend("child-0", 10.0).await.unwrap();

        let reclaimed = svc.reclaim("parent", "child-0").await.unwrap();
        assert_eq!(reclaimed, 0.0);
        let parent_balance = svc.balance("parent").await.unwrap();
        assert_eq!(parent_balance.delegated, 10.0);
    }
}
