//! Catch-up engine that materializes recurring subscriptions.

use tally_domain::{Category, MonthKey, Transaction, MAX_CATEGORIES};

use crate::ledger::Ledger;
use crate::resolver::{CategoryChoice, CategoryPicker};
use crate::storage::{self, ShardDefaults};
use crate::transaction_service::TransactionService;
use crate::CoreError;

pub struct SubscriptionService;

impl SubscriptionService {
    /// Runs [`SubscriptionService::catch_up`] for every subscription.
    /// Returns the number of transactions materialized.
    pub fn catch_up_all(
        ledger: &mut Ledger,
        picker: &mut dyn CategoryPicker,
    ) -> Result<usize, CoreError> {
        let mut created = 0;
        for index in 0..ledger.subscriptions.len() {
            created += Self::catch_up(ledger, index, picker)?;
        }
        Ok(created)
    }

    /// Walks the subscription's cursor forward, materializing one
    /// transaction per missed occurrence into whichever month shard the
    /// occurrence falls in. Stops once the next occurrence is in the
    /// future, then persists the cursor as today.
    pub fn catch_up(
        ledger: &mut Ledger,
        index: usize,
        picker: &mut dyn CategoryPicker,
    ) -> Result<usize, CoreError> {
        let sub = ledger
            .subscriptions
            .get(index)
            .cloned()
            .ok_or(CoreError::IndexOutOfRange(index))?;
        let today = ledger.clock.today();
        if today < sub.start {
            return Ok(0);
        }
        if let Some(end) = sub.end {
            if today > end {
                return Ok(0);
            }
        }

        let mut cursor = sub.last_updated;
        let mut created = 0;
        loop {
            let next = sub.period.next_occurrence(cursor);
            if next > today {
                break;
            }
            let month = MonthKey::of(next);
            let defaults = ShardDefaults {
                budget: ledger.default_budget,
                category_count: ledger.default_category_count,
                categories: &ledger.default_categories,
            };
            let category = match storage::category_index_by_name(
                ledger.shards.as_mut(),
                month,
                &sub.category,
                defaults,
            )? {
                Some(slot) => Some(slot),
                None => match picker.pick(month, &sub.name, Some(&sub.category))? {
                    CategoryChoice::Existing(slot) => Some(slot),
                    CategoryChoice::Create(category) => {
                        Some(create_in_shard(ledger, month, category)?)
                    }
                    CategoryChoice::Uncategorized => None,
                },
            };

            let txn = Transaction::new(sub.expense, sub.amount, category, sub.name.clone(), next);
            TransactionService::insert(ledger, txn)?;
            cursor = next;
            created += 1;
        }

        ledger.global.write_subscription_cursor(index, today)?;
        ledger.subscriptions[index].last_updated = today;
        if created > 0 {
            tracing::debug!(subscription = %sub.name, created, "materialized recurring transactions");
        }
        Ok(created)
    }
}

/// Adds a category directly to an arbitrary month's shard, which need not
/// be the loaded one. Returns the slot, reusing an existing live slot of
/// the same name.
fn create_in_shard(
    ledger: &mut Ledger,
    month: MonthKey,
    category: Category,
) -> Result<u32, CoreError> {
    let (count, slots) = ledger.shards.read_categories(month)?;
    let mut vacant = None;
    for (slot, existing) in slots.iter().enumerate() {
        if existing.is_vacant() {
            if vacant.is_none() {
                vacant = Some(slot);
            }
        } else if existing.name == category.name {
            return Ok(slot as u32);
        }
    }
    let slot = vacant
        .ok_or_else(|| CoreError::Validation("every category slot is already in use".into()))?;
    debug_assert!(slot < MAX_CATEGORIES);

    ledger.shards.write_category(month, slot, &category)?;
    ledger.shards.write_category_count(month, count + 1)?;

    if ledger.month == Some(month) {
        ledger.categories[slot] = category;
        ledger.category_count = count + 1;
        if ledger.is_current_month() {
            ledger.persist_defaults()?;
        }
    }
    Ok(slot as u32)
}
