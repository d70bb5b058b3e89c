//! Domain model for ledger transactions.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::MonthKey;

/// Transaction description width in bytes in the persisted record.
pub const DESC_LEN: usize = 64;

/// A single expense or income entry, owned by the month shard its date
/// falls in. Entries never move between shards; only the category index
/// may be rewritten, when a category is removed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    pub expense: bool,
    pub amount: f64,
    /// Slot index into the owning month's categories; `None` is
    /// uncategorized.
    pub category: Option<u32>,
    pub description: String,
    pub date: NaiveDate,
}

impl Transaction {
    pub fn new(
        expense: bool,
        amount: f64,
        category: Option<u32>,
        description: impl Into<String>,
        date: NaiveDate,
    ) -> Self {
        Self {
            expense,
            amount,
            category,
            description: description.into(),
            date,
        }
    }

    /// The amount as it applies to a `spent` accumulator: expenses add,
    /// income subtracts.
    pub fn signed_amount(&self) -> f64 {
        if self.expense {
            self.amount
        } else {
            -self.amount
        }
    }

    pub fn month(&self) -> MonthKey {
        MonthKey::of(self.date)
    }
}
