//! SQLite [`LedgerStore`] — production persistence for the budget ledger
//! (spec §4.8).

use async_trait::async_trait;
use sqlx::{Row, SqlitePool};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{BudgetBalance, LedgerEntry, LedgerOperation};
use crate::domain::ports::LedgerStore;

pub struct SqliteLedgerStore {
    pool: SqlitePool,
}

impl SqliteLedgerStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn operation_to_str(op: LedgerOperation) -> &'static str {
    match op {
        LedgerOperation::Init => "init",
        LedgerOperation::Allocate => "allocate",
        LedgerOperation::TopUp => "top_up",
        LedgerOperation::Spend => "spend",
        LedgerOperation::Reclaim => "reclaim",
    }
}

fn operation_from_str(s: &str) -> DomainResult<LedgerOperation> {
    match s {
        "init" => Ok(LedgerOperation::Init),
        "allocate" => Ok(LedgerOperation::Allocate),
        "top_up" => Ok(LedgerOperation::TopUp),
        "spend" => Ok(LedgerOperation::Spend),
        "reclaim" => Ok(LedgerOperation::Reclaim),
        other => Err(DomainError::Storage(format!("unknown ledger operation {other}"))),
    }
}

fn row_to_entry(row: &sqlx::sqlite::SqliteRow) -> DomainResult<LedgerEntry> {
    let timestamp: String = row.get("timestamp");
    Ok(LedgerEntry {
        id: row.get::<i64, _>("id") as u64,
        cell_id: row.get("cell_id"),
        operation: operation_from_str(&row.get::<String, _>("operation"))?,
        amount: row.get("amount"),
        counterparty: row.get("counterparty"),
        post_balance: BudgetBalance {
            allocated: row.get("balance_allocated"),
            spent: row.get("balance_spent"),
            delegated: row.get("balance_delegated"),
        },
        reason: row.get("reason"),
        timestamp: timestamp
            .parse()
            .map_err(|e| DomainError::Storage(format!("invalid timestamp: {e}")))?,
    })
}

#[async_trait]
impl LedgerStore for SqliteLedgerStore {
    async fn append(&self, entry: LedgerEntry) -> DomainResult<LedgerEntry> {
        let operation = operation_to_str(entry.operation);
        let timestamp = entry.timestamp.to_rfc3339();
        let row = sqlx::query(
            r#"
            INSERT INTO ledger_entries (
                cell_id, operation, amount, counterparty,
                balance_allocated, balance_spent, balance_delegated,
                reason, timestamp
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(&entry.cell_id)
        .bind(operation)
        .bind(entry.amount)
        .bind(&entry.counterparty)
        .bind(entry.post_balance.allocated)
        .bind(entry.post_balance.spent)
        .bind(entry.post_balance.delegated)
        .bind(&entry.reason)
        .bind(&timestamp)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DomainError::Storage(e.to_string()))?;

        Ok(LedgerEntry {
            id: row.get::<i64, _>("id") as u64,
            ..entry
        })
    }

    async fn balance(&self, cell_id: &str) -> DomainResult<Option<BudgetBalance>> {
        let row = sqlx::query(
            r#"
            SELECT balance_allocated, balance_spent, balance_delegated
            FROM ledger_entries
            WHERE cell_id = ?
            ORDER BY id DESC
            LIMIT 1
            "#,
        )
        .bind(cell_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::Storage(e.to_string()))?;

        Ok(row.map(|r| BudgetBalance {
            allocated: r.get("balance_allocated"),
            spent: r.get("balance_spent"),
            delegated: r.get("balance_delegated"),
        }))
    }

    async fn history(&self, cell_id: &str) -> DomainResult<Vec<LedgerEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM ledger_entries
            WHERE cell_id = ?
            ORDER BY id ASC
            "#,
        )
        .bind(cell_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::Storage(e.to_string()))?;

        rows.iter().map(row_to_entry).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::connection::DatabaseConnection;
    use chrono::Utc;

    async fn pool() -> SqlitePool {
        let db = DatabaseConnection::connect("sqlite::memory:", 5).await.unwrap();
        db.migrate().await.unwrap();
        db.pool().clone()
    }

    fn entry(cell_id: &str, op: LedgerOperation, amount: f64, balance: BudgetBalance) -> LedgerEntry {
        LedgerEntry {
            id: 0,
            cell_id: cell_id.to_string(),
            operation: op,
            amount,
            counterparty: None,
            post_balance: balance,
            reason: None,
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn append_assigns_increasing_ids_and_tracks_balance() {
        let store = SqliteLedgerStore::new(pool().await);
        let first = store
            .append(entry(
                "researcher",
                LedgerOperation::Init,
                100.0,
                BudgetBalance { allocated: 100.0, spent: 0.0, delegated: 0.0 },
            ))
            .await
            .unwrap();
        let second = store
            .append(entry(
                "researcher",
                LedgerOperation::Spend,
                20.0,
                BudgetBalance { allocated: 100.0, spent: 20.0, delegated: 0.0 },
            ))
            .await
            .unwrap();
        assert!(second.id > first.id);

        let balance = store.balance("researcher").await.unwrap().unwrap();
        assert_eq!(balance.spent, 20.0);

        let history = store.history("researcher").await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].id, first.id);
    }

    #[tokio::test]
    async fn balance_is_none_for_unknown_cell() {
        let store = SqliteLedgerStore::new(pool().await);
        assert!(store.balance("missing").await.unwrap().is_none());
    }
}
