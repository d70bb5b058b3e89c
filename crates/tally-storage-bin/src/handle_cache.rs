//! Bounded cache of open shard file handles.

use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::path::PathBuf;

use tracing::{debug, warn};

use tally_core::CoreError;

/// Maximum number of simultaneously open shard handles.
pub const HANDLE_CAPACITY: usize = 12;

struct Entry {
    file: File,
    last_used: u64,
}

/// Keeps up to [`HANDLE_CAPACITY`] files open, keyed by path relative to
/// the data root. When a new path needs a slot, the least recently used
/// handle is flushed and dropped first.
pub struct FileCache {
    root: PathBuf,
    entries: HashMap<String, Entry>,
    capacity: usize,
    tick: u64,
}

impl FileCache {
    pub fn new(root: PathBuf) -> Self {
        Self::with_capacity(root, HANDLE_CAPACITY)
    }

    pub fn with_capacity(root: PathBuf, capacity: usize) -> Self {
        Self {
            root,
            entries: HashMap::new(),
            capacity: capacity.max(1),
            tick: 0,
        }
    }

    /// Returns the open handle for `rel`, opening (and optionally
    /// creating) the file on a miss. A missing file without `create` is
    /// [`CoreError::ShardNotFound`].
    pub fn acquire(&mut self, rel: &str, create: bool) -> Result<&mut File, CoreError> {
        self.tick += 1;
        let tick = self.tick;

        if self.entries.contains_key(rel) {
            let entry = self.entries.get_mut(rel).expect("present");
            entry.last_used = tick;
            return Ok(&mut entry.file);
        }

        let path = self.root.join(rel);
        if !create && !path.exists() {
            return Err(CoreError::ShardNotFound(rel.to_string()));
        }
        if self.entries.len() >= self.capacity {
            self.evict_lru()?;
        }
        if create {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(create)
            .open(&path)?;
        let entry = self
            .entries
            .entry(rel.to_string())
            .or_insert(Entry { file, last_used: tick });
        Ok(&mut entry.file)
    }

    fn evict_lru(&mut self) -> Result<(), CoreError> {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|(_, entry)| entry.last_used)
            .map(|(key, _)| key.clone());
        if let Some(key) = oldest {
            let entry = self.entries.remove(&key).expect("present");
            // Surface close-time failures before the handle drops.
            entry.file.sync_all()?;
            debug!(file = %key, "evicted shard handle");
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, rel: &str) -> bool {
        self.entries.contains_key(rel)
    }

    /// Flushes and drops every handle. Failures are reported but never
    /// abort the rest of the teardown.
    pub fn shutdown(&mut self) {
        for (key, entry) in self.entries.drain() {
            if let Err(err) = entry.file.sync_all() {
                warn!(file = %key, %err, "failed to flush shard handle during shutdown");
            }
        }
    }
}

impl Drop for FileCache {
    fn drop(&mut self) {
        self.shutdown();
    }
}
