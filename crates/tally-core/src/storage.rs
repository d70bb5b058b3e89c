//! Abstractions over the persistence backend.
//!
//! The core never touches files directly; a backend crate implements
//! these traits over whatever medium it likes. Month shards hold one
//! month's budget, category slots, and transaction array; the global
//! store holds the default snapshot and the subscriptions.

use chrono::NaiveDate;

use tally_domain::{Category, MonthKey, Subscription, Transaction};

use crate::CoreError;

/// Seed values for a month shard created on first touch.
#[derive(Debug, Clone, Copy)]
pub struct ShardDefaults<'a> {
    pub budget: f64,
    pub category_count: u32,
    /// Positional slots, already padded to the full slot count.
    pub categories: &'a [Category],
}

/// In-memory mirror of the global store.
#[derive(Debug, Clone, Default)]
pub struct GlobalState {
    pub default_budget: f64,
    pub default_category_count: u32,
    /// Positional slots; always `MAX_CATEGORIES` entries.
    pub default_categories: Vec<Category>,
    pub subscriptions: Vec<Subscription>,
}

/// Month-shard persistence.
///
/// Callers must `open_or_init` a month before reading from or writing to
/// it; the remaining operations address fields of an existing shard.
pub trait ShardStore: Send {
    /// Opens the shard, seeding a fresh one with the defaults. Idempotent.
    fn open_or_init(&mut self, month: MonthKey, defaults: ShardDefaults<'_>)
        -> Result<(), CoreError>;

    fn read_budget(&mut self, month: MonthKey) -> Result<f64, CoreError>;
    fn write_budget(&mut self, month: MonthKey, budget: f64) -> Result<(), CoreError>;

    /// Returns the live count plus every positional slot.
    fn read_categories(&mut self, month: MonthKey) -> Result<(u32, Vec<Category>), CoreError>;
    fn write_category(
        &mut self,
        month: MonthKey,
        slot: usize,
        category: &Category,
    ) -> Result<(), CoreError>;
    fn write_category_count(&mut self, month: MonthKey, count: u32) -> Result<(), CoreError>;
    /// Rewrites the count and the whole positional block in one pass.
    fn write_category_block(
        &mut self,
        month: MonthKey,
        count: u32,
        categories: &[Category],
    ) -> Result<(), CoreError>;

    fn read_uncategorized(&mut self, month: MonthKey) -> Result<f64, CoreError>;
    fn write_uncategorized(&mut self, month: MonthKey, spent: f64) -> Result<(), CoreError>;

    fn read_transaction_count(&mut self, month: MonthKey) -> Result<u32, CoreError>;
    fn write_transaction_count(&mut self, month: MonthKey, count: u32) -> Result<(), CoreError>;
    fn read_transaction(&mut self, month: MonthKey, slot: usize)
        -> Result<Transaction, CoreError>;
    fn write_transaction(
        &mut self,
        month: MonthKey,
        slot: usize,
        txn: &Transaction,
    ) -> Result<(), CoreError>;
    /// Shrinks the shard to exactly `count` transaction records.
    fn truncate_transactions(&mut self, month: MonthKey, count: u32) -> Result<(), CoreError>;

    /// Best-effort pre-open of recently used shards. Default: no-op.
    fn warm(&mut self, _today: MonthKey) {}

    /// Flushes and releases whatever the backend holds open. Default: no-op.
    fn shutdown(&mut self) {}
}

/// Global-store persistence: the default snapshot and the subscriptions.
pub trait GlobalStore: Send {
    /// Opens (creating if needed) and validates the global store,
    /// returning its in-memory mirror.
    fn load(&mut self) -> Result<GlobalState, CoreError>;

    fn write_defaults(
        &mut self,
        budget: f64,
        count: u32,
        categories: &[Category],
    ) -> Result<(), CoreError>;

    /// Rewrites the whole subscription section.
    fn write_subscriptions(&mut self, subscriptions: &[Subscription]) -> Result<(), CoreError>;

    /// Rewrites one subscription's `last_updated` cursor in place.
    fn write_subscription_cursor(&mut self, index: usize, date: NaiveDate)
        -> Result<(), CoreError>;

    /// Flushes and releases whatever the backend holds open. Default: no-op.
    fn shutdown(&mut self) {}
}

/// Looks up a live category slot by name in an arbitrary month, lazily
/// initializing the shard if it does not exist yet.
pub fn category_index_by_name(
    store: &mut dyn ShardStore,
    month: MonthKey,
    name: &str,
    defaults: ShardDefaults<'_>,
) -> Result<Option<u32>, CoreError> {
    store.open_or_init(month, defaults)?;
    let (_, slots) = store.read_categories(month)?;
    Ok(slots
        .iter()
        .position(|c| !c.is_vacant() && c.name == name)
        .map(|slot| slot as u32))
}
