//! Budget balance & ledger (spec §3, §4.8).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BudgetBalance {
    pub allocated: f64,
    pub spent: f64,
    pub delegated: f64,
}

impl BudgetBalance {
    pub const fn zero() -> Self {
        Self {
            allocated: 0.0,
            spent: 0.0,
            delegated: 0.0,
        }
    }

    /// `available = allocated − spent − delegated ≥ 0` (spec §3 invariant).
    /// Floating-point rounding can push the raw subtraction a hair below
    /// zero even when every caller respected `available` at call time;
    /// clamping keeps the invariant exact rather than "approximately true".
    pub fn available(&self) -> f64 {
        (self.allocated - self.spent - self.delegated).max(0.0)
    }
}

impl Default for BudgetBalance {
    fn default() -> Self {
        Self::zero()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerOperation {
    Init,
    Allocate,
    TopUp,
    Spend,
    Reclaim,
}

/// One append-only ledger entry (spec §3 "Budget balance & ledger").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: u64,
    pub cell_id: String,
    pub operation: LedgerOperation,
    pub amount: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub counterparty: Option<String>,
    pub post_balance: BudgetBalance,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub timestamp: DateTime<Utc>,
}
