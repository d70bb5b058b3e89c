//! Global-file accessor: the default snapshot plus the subscriptions.

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::PathBuf;

use tracing::warn;

use tally_core::{CoreError, GlobalState, GlobalStore};
use tally_domain::{Category, Subscription, MAX_CATEGORIES, NAME_LEN};

use crate::codec::{self, CATEGORY_RECORD_LEN, DATE_LEN, SUB_RECORD_LEN};
use crate::layout;
use crate::paths::StoragePaths;

/// Binary global store. The file's two format constants must match the
/// running build bit for bit; there is no migration path.
pub struct BinGlobalStore {
    path: PathBuf,
    file: Option<File>,
}

impl BinGlobalStore {
    pub fn new(paths: &StoragePaths) -> Result<Self, CoreError> {
        fs::create_dir_all(&paths.data_root)?;
        Ok(Self {
            path: paths.global_file(),
            file: None,
        })
    }

    fn file(&mut self) -> Result<&mut File, CoreError> {
        if self.file.is_none() {
            let file = OpenOptions::new()
                .read(true)
                .write(true)
                .create(true)
                .open(&self.path)?;
            self.file = Some(file);
        }
        Ok(self.file.as_mut().expect("just opened"))
    }

    fn write_at(&mut self, offset: u64, buf: &[u8]) -> Result<(), CoreError> {
        let file = self.file()?;
        file.seek(SeekFrom::Start(offset))?;
        file.write_all(buf)?;
        Ok(())
    }

    fn init_fresh(&mut self) -> Result<GlobalState, CoreError> {
        let mut buf = vec![0u8; layout::GLOBAL_SUB_BLOCK_OFFSET as usize];
        buf[0..4].copy_from_slice(&layout::MAGIC);
        buf[4..8].copy_from_slice(&layout::FORMAT_VERSION.to_le_bytes());
        buf[8..12].copy_from_slice(&(MAX_CATEGORIES as i32).to_le_bytes());
        buf[12..16].copy_from_slice(&(NAME_LEN as i32).to_le_bytes());
        // Defaults and subscription count stay zero.
        self.write_at(0, &buf)?;
        Ok(GlobalState {
            default_budget: 0.0,
            default_category_count: 0,
            default_categories: vec![Category::default(); MAX_CATEGORIES],
            subscriptions: Vec::new(),
        })
    }
}

impl GlobalStore for BinGlobalStore {
    fn load(&mut self) -> Result<GlobalState, CoreError> {
        let len = self.file()?.metadata()?.len();
        if len == 0 {
            return self.init_fresh();
        }

        let mut header = vec![0u8; layout::GLOBAL_SUB_BLOCK_OFFSET as usize];
        {
            let file = self.file()?;
            file.seek(SeekFrom::Start(0))?;
            file.read_exact(&mut header)?;
        }
        if header[0..4] != layout::MAGIC {
            return Err(CoreError::Incompatible("unrecognized signature".into()));
        }
        let version = codec::get_i32(&header, 4);
        if version != layout::FORMAT_VERSION as i32 {
            return Err(CoreError::Incompatible(format!(
                "format version {version}, this build reads {}",
                layout::FORMAT_VERSION
            )));
        }
        let max_categories = codec::get_i32(&header, 8);
        if max_categories != MAX_CATEGORIES as i32 {
            return Err(CoreError::Incompatible(format!(
                "file has {max_categories} category slots, this build uses {MAX_CATEGORIES}"
            )));
        }
        let name_len = codec::get_i32(&header, 12);
        if name_len != NAME_LEN as i32 {
            return Err(CoreError::Incompatible(format!(
                "file has {name_len}-byte names, this build uses {NAME_LEN}"
            )));
        }

        let default_budget = codec::get_f64(&header, 16);
        let default_count = codec::get_i32(&header, 24);
        if default_count < 0 || default_count as usize > MAX_CATEGORIES {
            return Err(CoreError::Corrupt(format!(
                "bad default category count {default_count}"
            )));
        }
        let mut default_categories = Vec::with_capacity(MAX_CATEGORIES);
        for slot in 0..MAX_CATEGORIES {
            let at = layout::GLOBAL_DEFAULT_BLOCK_OFFSET as usize + slot * CATEGORY_RECORD_LEN;
            let mut record = [0u8; CATEGORY_RECORD_LEN];
            record.copy_from_slice(&header[at..at + CATEGORY_RECORD_LEN]);
            default_categories.push(codec::decode_category(&record));
        }

        let sub_count = codec::get_i32(&header, layout::GLOBAL_SUB_COUNT_OFFSET as usize);
        if sub_count < 0 {
            return Err(CoreError::Corrupt(format!(
                "bad subscription count {sub_count}"
            )));
        }
        let mut subscriptions = Vec::with_capacity(sub_count as usize);
        {
            let file = self.file()?;
            file.seek(SeekFrom::Start(layout::GLOBAL_SUB_BLOCK_OFFSET))?;
            for _ in 0..sub_count {
                let mut record = [0u8; SUB_RECORD_LEN];
                file.read_exact(&mut record)?;
                subscriptions.push(codec::decode_subscription(&record)?);
            }
        }

        Ok(GlobalState {
            default_budget,
            default_category_count: default_count as u32,
            default_categories,
            subscriptions,
        })
    }

    fn write_defaults(
        &mut self,
        budget: f64,
        count: u32,
        categories: &[Category],
    ) -> Result<(), CoreError> {
        let mut buf = vec![0u8; 8 + 4 + MAX_CATEGORIES * CATEGORY_RECORD_LEN];
        buf[0..8].copy_from_slice(&budget.to_le_bytes());
        buf[8..12].copy_from_slice(&(count as i32).to_le_bytes());
        for slot in 0..MAX_CATEGORIES {
            let record = match categories.get(slot) {
                Some(category) => codec::encode_category(category),
                None => codec::encode_category(&Category::default()),
            };
            let at = 12 + slot * CATEGORY_RECORD_LEN;
            buf[at..at + CATEGORY_RECORD_LEN].copy_from_slice(&record);
        }
        self.write_at(layout::GLOBAL_DEFAULT_BUDGET_OFFSET, &buf)
    }

    fn write_subscriptions(&mut self, subscriptions: &[Subscription]) -> Result<(), CoreError> {
        let mut buf = vec![0u8; 4 + subscriptions.len() * SUB_RECORD_LEN];
        buf[0..4].copy_from_slice(&(subscriptions.len() as i32).to_le_bytes());
        for (i, sub) in subscriptions.iter().enumerate() {
            let at = 4 + i * SUB_RECORD_LEN;
            buf[at..at + SUB_RECORD_LEN].copy_from_slice(&codec::encode_subscription(sub));
        }
        self.write_at(layout::GLOBAL_SUB_COUNT_OFFSET, &buf)?;
        // Drop trailing records left over from a longer previous section.
        let file = self.file()?;
        file.set_len(layout::global_len(subscriptions.len() as u32))?;
        Ok(())
    }

    fn write_subscription_cursor(
        &mut self,
        index: usize,
        date: chrono::NaiveDate,
    ) -> Result<(), CoreError> {
        let mut buf = [0u8; DATE_LEN];
        codec::put_date(&mut buf, date);
        self.write_at(layout::global_subscription_cursor_offset(index), &buf)
    }

    fn shutdown(&mut self) {
        if let Some(file) = self.file.take() {
            if let Err(err) = file.sync_all() {
                warn!(%err, "failed to flush global file during shutdown");
            }
        }
    }
}
