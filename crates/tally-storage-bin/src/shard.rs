//! Month-shard accessor over the bounded handle cache.

use std::fs::{self, File};
use std::io::{Read, Seek, SeekFrom, Write};

use tracing::{debug, warn};

use tally_core::{CoreError, ShardDefaults, ShardStore};
use tally_domain::{Category, MonthKey, Transaction, MAX_CATEGORIES};

use crate::codec::{self, CATEGORY_RECORD_LEN, TXN_RECORD_LEN};
use crate::handle_cache::{FileCache, HANDLE_CAPACITY};
use crate::layout;
use crate::paths::{shard_file_name, StoragePaths};

/// Binary month-shard store. One file per touched month, reached through
/// the handle cache; every field update seeks to its computed offset.
pub struct BinShardStore {
    cache: FileCache,
}

impl BinShardStore {
    pub fn new(paths: &StoragePaths) -> Result<Self, CoreError> {
        fs::create_dir_all(&paths.data_root)?;
        Ok(Self {
            cache: FileCache::new(paths.data_root.clone()),
        })
    }

    fn file(&mut self, month: MonthKey, create: bool) -> Result<&mut File, CoreError> {
        self.cache.acquire(&shard_file_name(month), create)
    }

    fn read_at(&mut self, month: MonthKey, offset: u64, buf: &mut [u8]) -> Result<(), CoreError> {
        let file = self.file(month, false)?;
        file.seek(SeekFrom::Start(offset))?;
        file.read_exact(buf)?;
        Ok(())
    }

    fn write_at(&mut self, month: MonthKey, offset: u64, buf: &[u8]) -> Result<(), CoreError> {
        let file = self.file(month, false)?;
        file.seek(SeekFrom::Start(offset))?;
        file.write_all(buf)?;
        Ok(())
    }
}

impl ShardStore for BinShardStore {
    fn open_or_init(
        &mut self,
        month: MonthKey,
        defaults: ShardDefaults<'_>,
    ) -> Result<(), CoreError> {
        {
            let file = self.file(month, true)?;
            if file.metadata()?.len() > 0 {
                return Ok(());
            }
        }
        debug!(%month, "initializing month shard");

        let mut buf = vec![0u8; layout::SHARD_HEADER_LEN as usize];
        buf[0..8].copy_from_slice(&defaults.budget.to_le_bytes());
        buf[8..12].copy_from_slice(&(defaults.category_count as i32).to_le_bytes());
        for (slot, category) in defaults.categories.iter().take(MAX_CATEGORIES).enumerate() {
            let record = codec::encode_category(category);
            let at = layout::shard_category_offset(slot) as usize;
            buf[at..at + CATEGORY_RECORD_LEN].copy_from_slice(&record);
        }
        // Uncategorized accumulator and transaction count stay zero.
        let file = self.file(month, true)?;
        file.seek(SeekFrom::Start(0))?;
        file.write_all(&buf)?;
        Ok(())
    }

    fn read_budget(&mut self, month: MonthKey) -> Result<f64, CoreError> {
        let mut buf = [0u8; 8];
        self.read_at(month, layout::SHARD_BUDGET_OFFSET, &mut buf)?;
        Ok(f64::from_le_bytes(buf))
    }

    fn write_budget(&mut self, month: MonthKey, budget: f64) -> Result<(), CoreError> {
        self.write_at(month, layout::SHARD_BUDGET_OFFSET, &budget.to_le_bytes())
    }

    fn read_categories(&mut self, month: MonthKey) -> Result<(u32, Vec<Category>), CoreError> {
        let mut buf = vec![0u8; 4 + MAX_CATEGORIES * CATEGORY_RECORD_LEN];
        self.read_at(month, layout::SHARD_CATEGORY_COUNT_OFFSET, &mut buf)?;
        let count = codec::get_i32(&buf, 0);
        if count < 0 || count as usize > MAX_CATEGORIES {
            return Err(CoreError::Corrupt(format!("bad category count {count}")));
        }
        let mut slots = Vec::with_capacity(MAX_CATEGORIES);
        for slot in 0..MAX_CATEGORIES {
            let at = 4 + slot * CATEGORY_RECORD_LEN;
            let mut record = [0u8; CATEGORY_RECORD_LEN];
            record.copy_from_slice(&buf[at..at + CATEGORY_RECORD_LEN]);
            slots.push(codec::decode_category(&record));
        }
        Ok((count as u32, slots))
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
        let record = codec::encode_category(category);
        self.write_at(month, layout::shard_category_offset(slot), &record)
    }

    fn write_category_count(&mut self, month: MonthKey, count: u32) -> Result<(), CoreError> {
        self.write_at(
            month,
            layout::SHARD_CATEGORY_COUNT_OFFSET,
            &(count as i32).to_le_bytes(),
        )
    }

    fn write_category_block(
        &mut self,
        month: MonthKey,
        count: u32,
        categories: &[Category],
    ) -> Result<(), CoreError> {
        let mut buf = vec![0u8; 4 + MAX_CATEGORIES * CATEGORY_RECORD_LEN];
        buf[0..4].copy_from_slice(&(count as i32).to_le_bytes());
        for slot in 0..MAX_CATEGORIES {
            let record = match categories.get(slot) {
                Some(category) => codec::encode_category(category),
                None => codec::encode_category(&Category::default()),
            };
            let at = 4 + slot * CATEGORY_RECORD_LEN;
            buf[at..at + CATEGORY_RECORD_LEN].copy_from_slice(&record);
        }
        self.write_at(month, layout::SHARD_CATEGORY_COUNT_OFFSET, &buf)
    }

    fn read_uncategorized(&mut self, month: MonthKey) -> Result<f64, CoreError> {
        let mut buf = [0u8; 8];
        self.read_at(month, layout::SHARD_UNCATEGORIZED_OFFSET, &mut buf)?;
        Ok(f64::from_le_bytes(buf))
    }

    fn write_uncategorized(&mut self, month: MonthKey, spent: f64) -> Result<(), CoreError> {
        self.write_at(
            month,
            layout::SHARD_UNCATEGORIZED_OFFSET,
            &spent.to_le_bytes(),
        )
    }

    fn read_transaction_count(&mut self, month: MonthKey) -> Result<u32, CoreError> {
        let mut buf = [0u8; 4];
        self.read_at(month, layout::SHARD_TXN_COUNT_OFFSET, &mut buf)?;
        let count = i32::from_le_bytes(buf);
        if count < 0 {
            return Err(CoreError::Corrupt(format!("bad transaction count {count}")));
        }
        Ok(count as u32)
    }

    fn write_transaction_count(&mut self, month: MonthKey, count: u32) -> Result<(), CoreError> {
        self.write_at(
            month,
            layout::SHARD_TXN_COUNT_OFFSET,
            &(count as i32).to_le_bytes(),
        )
    }

    fn read_transaction(
        &mut self,
        month: MonthKey,
        slot: usize,
    ) -> Result<Transaction, CoreError> {
        let mut buf = [0u8; TXN_RECORD_LEN];
        self.read_at(month, layout::shard_transaction_offset(slot), &mut buf)?;
        codec::decode_transaction(&buf)
    }

    fn write_transaction(
        &mut self,
        month: MonthKey,
        slot: usize,
        txn: &Transaction,
    ) -> Result<(), CoreError> {
        let record = codec::encode_transaction(txn);
        self.write_at(month, layout::shard_transaction_offset(slot), &record)
    }

    fn truncate_transactions(&mut self, month: MonthKey, count: u32) -> Result<(), CoreError> {
        let file = self.file(month, false)?;
        file.set_len(layout::shard_len(count))?;
        Ok(())
    }

    fn warm(&mut self, today: MonthKey) {
        let mut month = today;
        for _ in 0..HANDLE_CAPACITY {
            match self.cache.acquire(&shard_file_name(month), false) {
                Ok(_) | Err(CoreError::ShardNotFound(_)) => {}
                Err(err) => warn!(%month, %err, "failed to warm shard handle"),
            }
            month = month.prev();
        }
    }

    fn shutdown(&mut self) {
        self.cache.shutdown();
    }
}
