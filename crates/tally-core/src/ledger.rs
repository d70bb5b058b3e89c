//! The ledger aggregate: global mirror plus the loaded month.

use chrono::NaiveDate;

use tally_domain::{Category, MonthKey, Subscription, Transaction, MAX_CATEGORIES};

use crate::index::TransactionIndex;
use crate::storage::{GlobalStore, ShardDefaults, ShardStore};
use crate::time::Clock;
use crate::CoreError;

/// Owns the persistence backends, the in-memory mirror of the global
/// store, and the state of the one currently loaded month.
///
/// Mutations go through the service modules; this type carries state and
/// the plain getter/setter surface the frontend consumes.
pub struct Ledger {
    pub(crate) shards: Box<dyn ShardStore>,
    pub(crate) global: Box<dyn GlobalStore>,
    pub(crate) clock: Box<dyn Clock>,

    pub(crate) default_budget: f64,
    pub(crate) default_category_count: u32,
    pub(crate) default_categories: Vec<Category>,
    pub(crate) subscriptions: Vec<Subscription>,

    pub(crate) month: Option<MonthKey>,
    pub(crate) budget: f64,
    pub(crate) category_count: u32,
    pub(crate) categories: Vec<Category>,
    pub(crate) uncategorized_spent: f64,
    pub(crate) index: TransactionIndex,
}

impl Ledger {
    /// Loads and validates the global store and warms the shard backend.
    /// No month is loaded yet.
    pub fn open(
        mut shards: Box<dyn ShardStore>,
        mut global: Box<dyn GlobalStore>,
        clock: Box<dyn Clock>,
    ) -> Result<Self, CoreError> {
        let state = global.load()?;
        shards.warm(MonthKey::of(clock.today()));
        Ok(Self {
            shards,
            global,
            clock,
            default_budget: state.default_budget,
            default_category_count: state.default_category_count,
            default_categories: state.default_categories,
            subscriptions: state.subscriptions,
            month: None,
            budget: 0.0,
            category_count: 0,
            categories: vec![Category::default(); MAX_CATEGORIES],
            uncategorized_spent: 0.0,
            index: TransactionIndex::new(),
        })
    }

    /// Replaces the loaded month: releases the previous index, lazily
    /// initializes the shard, and rebuilds both transaction views from
    /// the records in slot order.
    pub fn load_month(&mut self, month: MonthKey) -> Result<(), CoreError> {
        self.index.clear();
        self.month = None;

        let defaults = ShardDefaults {
            budget: self.default_budget,
            category_count: self.default_category_count,
            categories: &self.default_categories,
        };
        self.shards.open_or_init(month, defaults)?;
        self.budget = self.shards.read_budget(month)?;
        let (count, slots) = self.shards.read_categories(month)?;
        self.category_count = count;
        self.categories = slots;
        self.uncategorized_spent = self.shards.read_uncategorized(month)?;

        let txn_count = self.shards.read_transaction_count(month)?;
        for slot in 0..txn_count as usize {
            let txn = self.shards.read_transaction(month, slot)?;
            self.index.push_back(txn, slot)?;
        }

        self.month = Some(month);
        tracing::debug!(%month, transactions = txn_count, "loaded month");
        if month == MonthKey::of(self.clock.today()) {
            self.refresh_default_mirror();
        }
        Ok(())
    }

    /// Whether the loaded month is the real-world current month.
    pub fn is_current_month(&self) -> bool {
        self.month == Some(MonthKey::of(self.clock.today()))
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub fn month(&self) -> Option<MonthKey> {
        self.month
    }

    pub fn budget(&self) -> f64 {
        self.budget
    }

    pub fn category_count(&self) -> u32 {
        self.category_count
    }

    /// Live category slots with their indices, in slot order.
    pub fn categories(&self) -> impl Iterator<Item = (usize, &Category)> + '_ {
        self.categories
            .iter()
            .enumerate()
            .filter(|(_, c)| !c.is_vacant())
    }

    pub fn category(&self, slot: usize) -> Option<&Category> {
        self.categories.get(slot).filter(|c| !c.is_vacant())
    }

    /// Display ordering: live slots sorted by budget, largest first. The
    /// positional array never reorders; transactions index into it.
    pub fn categories_by_budget(&self) -> Vec<(usize, &Category)> {
        let mut view: Vec<(usize, &Category)> = self.categories().collect();
        view.sort_by(|(_, a), (_, b)| b.budget.total_cmp(&a.budget));
        view
    }

    pub fn uncategorized_spent(&self) -> f64 {
        self.uncategorized_spent
    }

    /// Loaded transactions in date-descending order.
    pub fn transactions(&self) -> impl Iterator<Item = &Transaction> + '_ {
        self.index
            .sorted_ids()
            .iter()
            .filter_map(move |&id| self.index.get(id))
    }

    pub fn transaction(&self, sorted_index: usize) -> Option<&Transaction> {
        self.index.by_sorted_index(sorted_index)
    }

    pub fn transaction_count(&self) -> usize {
        self.index.len()
    }

    pub fn subscriptions(&self) -> &[Subscription] {
        &self.subscriptions
    }

    /// The frontend edits subscriptions in place (including adding and
    /// removing them) and then persists via [`Ledger::persist_subscriptions`].
    pub fn subscriptions_mut(&mut self) -> &mut Vec<Subscription> {
        &mut self.subscriptions
    }

    pub fn persist_subscriptions(&mut self) -> Result<(), CoreError> {
        self.global.write_subscriptions(&self.subscriptions)
    }

    pub fn default_budget(&self) -> f64 {
        self.default_budget
    }

    pub fn default_categories(&self) -> &[Category] {
        &self.default_categories
    }

    pub fn default_category_count(&self) -> u32 {
        self.default_category_count
    }

    /// Flushes and releases both backends.
    pub fn close(&mut self) {
        self.shards.shutdown();
        self.global.shutdown();
    }

    /// Snapshots the loaded month as the seed for future months. `spent`
    /// starts over in a fresh month, so the snapshot zeroes it.
    pub(crate) fn refresh_default_mirror(&mut self) {
        self.default_budget = self.budget;
        self.default_category_count = self.category_count;
        self.default_categories = self
            .categories
            .iter()
            .map(|c| Category {
                spent: 0.0,
                ..c.clone()
            })
            .collect();
    }

    /// Refreshes the default mirror and writes it through.
    pub(crate) fn persist_defaults(&mut self) -> Result<(), CoreError> {
        self.refresh_default_mirror();
        self.global.write_defaults(
            self.default_budget,
            self.default_category_count,
            &self.default_categories,
        )
    }
}
