//! Shared in-memory test doubles: storage backends, clock, and picker.
#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, NaiveDate, Utc};

use tally_core::{
    CategoryChoice, CategoryPicker, Clock, CoreError, GlobalState, GlobalStore, Ledger,
    ShardDefaults, ShardStore,
};
use tally_domain::{Category, MonthKey, Subscription, Transaction, MAX_CATEGORIES};

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

#[derive(Debug, Clone, Default)]
pub struct MemShard {
    pub budget: f64,
    pub category_count: u32,
    pub categories: Vec<Category>,
    pub uncategorized: f64,
    pub txn_count: u32,
    pub txns: Vec<Transaction>,
}

/// Shard backend over a shared map so tests can inspect state the ledger
/// owns a handle to.
#[derive(Clone, Default)]
pub struct SharedShards(pub Arc<Mutex<HashMap<MonthKey, MemShard>>>);

impl SharedShards {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self, month: MonthKey) -> MemShard {
        self.0
            .lock()
            .unwrap()
            .get(&month)
            .cloned()
            .expect("shard exists")
    }

    pub fn contains(&self, month: MonthKey) -> bool {
        self.0.lock().unwrap().contains_key(&month)
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<MonthKey, MemShard>> {
        self.0.lock().unwrap()
    }
}

fn shard_mut(
    map: &mut HashMap<MonthKey, MemShard>,
    month: MonthKey,
) -> Result<&mut MemShard, CoreError> {
    map.get_mut(&month)
        .ok_or_else(|| CoreError::ShardNotFound(month.to_string()))
}

impl ShardStore for SharedShards {
    fn open_or_init(
        &mut self,
        month: MonthKey,
        defaults: ShardDefaults<'_>,
    ) -> Result<(), CoreError> {
        self.lock().entry(month).or_insert_with(|| {
            let mut categories = defaults.categories.to_vec();
            categories.resize(MAX_CATEGORIES, Category::default());
            MemShard {
                budget: defaults.budget,
                category_count: defaults.category_count,
                categories,
                uncategorized: 0.0,
                txn_count: 0,
                txns: Vec::new(),
            }
        });
        Ok(())
    }

    fn read_budget(&mut self, month: MonthKey) -> Result<f64, CoreError> {
        Ok(shard_mut(&mut self.lock(), month)?.budget)
    }

    fn write_budget(&mut self, month: MonthKey, budget: f64) -> Result<(), CoreError> {
        shard_mut(&mut self.lock(), month)?.budget = budget;
        Ok(())
    }

    fn read_categories(&mut self, month: MonthKey) -> Result<(u32, Vec<Category>), CoreError> {
        let mut map = self.lock();
        let shard = shard_mut(&mut map, month)?;
        Ok((shard.category_count, shard.categories.clone()))
    }

    fn write_category(
        &mut self,
        month: MonthKey,
        slot: usize,
        category: &Category,
    ) -> Result<(), CoreError> {
        if slot >= MAX_CATEGORIES {
            return Err(CoreError::IndexOutOfRange(slot));
        }
        shard_mut(&mut self.lock(), month)?.categories[slot] = category.clone();
        Ok(())
    }

    fn write_category_count(&mut self, month: MonthKey, count: u32) -> Result<(), CoreError> {
        shard_mut(&mut self.lock(), month)?.category_count = count;
        Ok(())
    }

    fn write_category_block(
        &mut self,
        month: MonthKey,
        count: u32,
        categories: &[Category],
    ) -> Result<(), CoreError> {
        let mut map = self.lock();
        let shard = shard_mut(&mut map, month)?;
        shard.category_count = count;
        let mut slots = categories.to_vec();
        slots.resize(MAX_CATEGORIES, Category::default());
        shard.categories = slots;
        Ok(())
    }

    fn read_uncategorized(&mut self, month: MonthKey) -> Result<f64, CoreError> {
        Ok(shard_mut(&mut self.lock(), month)?.uncategorized)
    }

    fn write_uncategorized(&mut self, month: MonthKey, spent: f64) -> Result<(), CoreError> {
        shard_mut(&mut self.lock(), month)?.uncategorized = spent;
        Ok(())
    }

    fn read_transaction_count(&mut self, month: MonthKey) -> Result<u32, CoreError> {
        Ok(shard_mut(&mut self.lock(), month)?.txn_count)
    }

    fn write_transaction_count(&mut self, month: MonthKey, count: u32) -> Result<(), CoreError> {
        shard_mut(&mut self.lock(), month)?.txn_count = count;
        Ok(())
    }

    fn read_transaction(
        &mut self,
        month: MonthKey,
        slot: usize,
    ) -> Result<Transaction, CoreError> {
        let mut map = self.lock();
        let shard = shard_mut(&mut map, month)?;
        shard
            .txns
            .get(slot)
            .cloned()
            .ok_or(CoreError::IndexOutOfRange(slot))
    }

    fn write_transaction(
        &mut self,
        month: MonthKey,
        slot: usize,
        txn: &Transaction,
    ) -> Result<(), CoreError> {
        let mut map = self.lock();
        let shard = shard_mut(&mut map, month)?;
        if slot == shard.txns.len() {
            shard.txns.push(txn.clone());
        } else if slot < shard.txns.len() {
            shard.txns[slot] = txn.clone();
        } else {
            return Err(CoreError::IndexOutOfRange(slot));
        }
        Ok(())
    }

    fn truncate_transactions(&mut self, month: MonthKey, count: u32) -> Result<(), CoreError> {
        shard_mut(&mut self.lock(), month)?.txns.truncate(count as usize);
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemGlobal {
    pub default_budget: f64,
    pub default_category_count: u32,
    pub default_categories: Vec<Category>,
    pub subscriptions: Vec<Subscription>,
}

/// Global backend over shared state, mirroring [`SharedShards`].
#[derive(Clone, Default)]
pub struct SharedGlobal(pub Arc<Mutex<MemGlobal>>);

impl SharedGlobal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_defaults(budget: f64, categories: Vec<Category>) -> Self {
        let store = Self::default();
        {
            let mut state = store.0.lock().unwrap();
            state.default_budget = budget;
            state.default_category_count = categories.len() as u32;
            state.default_categories = categories;
        }
        store
    }

    pub fn push_subscription(&self, sub: Subscription) {
        self.0.lock().unwrap().subscriptions.push(sub);
    }

    pub fn snapshot(&self) -> MemGlobal {
        self.0.lock().unwrap().clone()
    }
}

impl GlobalStore for SharedGlobal {
    fn load(&mut self) -> Result<GlobalState, CoreError> {
        let state = self.0.lock().unwrap();
        let mut default_categories = state.default_categories.clone();
        default_categories.resize(MAX_CATEGORIES, Category::default());
        Ok(GlobalState {
            default_budget: state.default_budget,
            default_category_count: state.default_category_count,
            default_categories,
            subscriptions: state.subscriptions.clone(),
        })
    }

    fn write_defaults(
        &mut self,
        budget: f64,
        count: u32,
        categories: &[Category],
    ) -> Result<(), CoreError> {
        let mut state = self.0.lock().unwrap();
        state.default_budget = budget;
        state.default_category_count = count;
        state.default_categories = categories.to_vec();
        Ok(())
    }

    fn write_subscriptions(&mut self, subscriptions: &[Subscription]) -> Result<(), CoreError> {
        self.0.lock().unwrap().subscriptions = subscriptions.to_vec();
        Ok(())
    }

    fn write_subscription_cursor(
        &mut self,
        index: usize,
        date: NaiveDate,
    ) -> Result<(), CoreError> {
        let mut state = self.0.lock().unwrap();
        let sub = state
            .subscriptions
            .get_mut(index)
            .ok_or(CoreError::IndexOutOfRange(index))?;
        sub.last_updated = date;
        Ok(())
    }
}

/// Clock pinned to a fixed date.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0.and_hms_opt(12, 0, 0).unwrap().and_utc()
    }
}

/// Picker that replays scripted answers and records every request.
#[derive(Default)]
pub struct ScriptedPicker {
    answers: VecDeque<CategoryChoice>,
    pub calls: Vec<(MonthKey, String, Option<String>)>,
}

impl ScriptedPicker {
    pub fn new(answers: Vec<CategoryChoice>) -> Self {
        Self {
            answers: answers.into(),
            calls: Vec::new(),
        }
    }
}

impl CategoryPicker for ScriptedPicker {
    fn pick(
        &mut self,
        month: MonthKey,
        subject: &str,
        missing: Option<&str>,
    ) -> Result<CategoryChoice, CoreError> {
        self.calls
            .push((month, subject.to_string(), missing.map(str::to_string)));
        self.answers
            .pop_front()
            .ok_or_else(|| CoreError::Validation("no scripted answer left".into()))
    }
}

pub fn open_ledger(shards: &SharedShards, global: &SharedGlobal, today: NaiveDate) -> Ledger {
    Ledger::open(
        Box::new(shards.clone()),
        Box::new(global.clone()),
        Box::new(FixedClock(today)),
    )
    .expect("open ledger")
}
