//! tally-storage-bin
//!
//! Fixed-offset binary persistence for the ledger: one global file plus
//! one shard file per touched month, fronted by a bounded cache of open
//! handles. Implements the storage traits from tally-core.

pub mod codec;
pub mod global;
pub mod handle_cache;
pub mod layout;
pub mod paths;
pub mod shard;

pub use global::BinGlobalStore;
pub use handle_cache::{FileCache, HANDLE_CAPACITY};
pub use paths::{shard_file_name, StoragePaths, GLOBAL_FILE_NAME};
pub use shard::BinShardStore;
