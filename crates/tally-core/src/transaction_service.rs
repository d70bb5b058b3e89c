//! Insert and removal over the persisted transaction array.
//!
//! Each logical change is several independent writes. They run in a fixed
//! order — derived accumulator, then count, then payload (and the
//! truncate last on removal) — so an interrupted sequence leaves the
//! count understating reality instead of pointing past written data.

use tally_domain::Transaction;

use crate::index::Removal;
use crate::ledger::Ledger;
use crate::storage::ShardDefaults;
use crate::CoreError;

pub struct TransactionService;

impl TransactionService {
    /// Persists a transaction into the shard its date falls in, which
    /// need not be the loaded month. The loaded month's views and
    /// accumulators are updated only when they are the target.
    pub fn insert(ledger: &mut Ledger, txn: Transaction) -> Result<(), CoreError> {
        let month = txn.month();
        let loaded = ledger.month == Some(month);

        let defaults = ShardDefaults {
            budget: ledger.default_budget,
            category_count: ledger.default_category_count,
            categories: &ledger.default_categories,
        };
        ledger.shards.open_or_init(month, defaults)?;

        match txn.category {
            Some(slot) => {
                let slot = slot as usize;
                let mut category = if loaded {
                    ledger
                        .categories
                        .get(slot)
                        .cloned()
                        .ok_or(CoreError::IndexOutOfRange(slot))?
                } else {
                    let (_, slots) = ledger.shards.read_categories(month)?;
                    slots
                        .get(slot)
                        .cloned()
                        .ok_or(CoreError::IndexOutOfRange(slot))?
                };
                category.spent += txn.signed_amount();
                ledger.shards.write_category(month, slot, &category)?;
                if loaded {
                    ledger.categories[slot] = category;
                }
            }
            None => {
                let current = if loaded {
                    ledger.uncategorized_spent
                } else {
                    ledger.shards.read_uncategorized(month)?
                };
                let updated = current + txn.signed_amount();
                ledger.shards.write_uncategorized(month, updated)?;
                if loaded {
                    ledger.uncategorized_spent = updated;
                }
            }
        }

        let count = ledger.shards.read_transaction_count(month)?;
        ledger.shards.write_transaction_count(month, count + 1)?;
        ledger.shards.write_transaction(month, count as usize, &txn)?;

        if loaded {
            ledger.index.push_back(txn, count as usize)?;
        }
        Ok(())
    }

    /// Removes the loaded month's transaction at `sorted_index`,
    /// relocating the physical tail record into the vacated slot so the
    /// array stays dense with a single record write.
    pub fn remove(ledger: &mut Ledger, sorted_index: usize) -> Result<Transaction, CoreError> {
        let month = ledger
            .month
            .ok_or_else(|| CoreError::Validation("no month loaded".into()))?;
        let txn = ledger
            .index
            .by_sorted_index(sorted_index)
            .cloned()
            .ok_or(CoreError::IndexOutOfRange(sorted_index))?;

        match txn.category {
            Some(slot) => {
                let slot = slot as usize;
                let mut category = ledger
                    .categories
                    .get(slot)
                    .cloned()
                    .ok_or(CoreError::IndexOutOfRange(slot))?;
                category.spent -= txn.signed_amount();
                ledger.shards.write_category(month, slot, &category)?;
                ledger.categories[slot] = category;
            }
            None => {
                let updated = ledger.uncategorized_spent - txn.signed_amount();
                ledger.shards.write_uncategorized(month, updated)?;
                ledger.uncategorized_spent = updated;
            }
        }

        let new_count = ledger.index.len() as u32 - 1;
        ledger.shards.write_transaction_count(month, new_count)?;

        let (removed, outcome) = ledger.index.remove_sorted(sorted_index)?;
        if let Removal::Relocated { id, slot } = outcome {
            let moved = ledger
                .index
                .get(id)
                .cloned()
                .ok_or(CoreError::IndexOutOfRange(id))?;
            ledger.shards.write_transaction(month, slot, &moved)?;
        }
        ledger.shards.truncate_transactions(month, new_count)?;
        Ok(removed)
    }
}
