//! Closed-form byte offsets for the global file and the month shards.
//!
//! The category block is positional and fixed-size — slots are addressed
//! by index and rewritten in place — while the transaction array is
//! append-only with a truncate-on-delete tail. Every partial update seeks
//! straight to an offset computed here.

use tally_domain::MAX_CATEGORIES;

use crate::codec::{CATEGORY_RECORD_LEN, SUB_RECORD_LEN, SUB_CURSOR_OFFSET, TXN_RECORD_LEN};

pub const MAGIC: [u8; 4] = *b"TLYB";
pub const FORMAT_VERSION: u32 = 1;

// Month shard: budget, category count, category block, uncategorized
// accumulator, transaction count, transaction array.
pub const SHARD_BUDGET_OFFSET: u64 = 0;
pub const SHARD_CATEGORY_COUNT_OFFSET: u64 = 8;
pub const SHARD_CATEGORY_BLOCK_OFFSET: u64 = 12;
pub const SHARD_UNCATEGORIZED_OFFSET: u64 =
    SHARD_CATEGORY_BLOCK_OFFSET + (MAX_CATEGORIES * CATEGORY_RECORD_LEN) as u64;
pub const SHARD_TXN_COUNT_OFFSET: u64 = SHARD_UNCATEGORIZED_OFFSET + 8;
pub const SHARD_HEADER_LEN: u64 = SHARD_TXN_COUNT_OFFSET + 4;

pub fn shard_category_offset(slot: usize) -> u64 {
    SHARD_CATEGORY_BLOCK_OFFSET + (slot * CATEGORY_RECORD_LEN) as u64
}

pub fn shard_transaction_offset(slot: usize) -> u64 {
    SHARD_HEADER_LEN + (slot * TXN_RECORD_LEN) as u64
}

/// Exact byte length of a shard holding `count` transactions.
pub fn shard_len(count: u32) -> u64 {
    SHARD_HEADER_LEN + count as u64 * TXN_RECORD_LEN as u64
}

// Global file: signature, version, the two compatibility constants, the
// default snapshot, then the subscription section.
pub const GLOBAL_MAGIC_OFFSET: u64 = 0;
pub const GLOBAL_VERSION_OFFSET: u64 = 4;
pub const GLOBAL_MAX_CATEGORIES_OFFSET: u64 = 8;
pub const GLOBAL_NAME_LEN_OFFSET: u64 = 12;
pub const GLOBAL_DEFAULT_BUDGET_OFFSET: u64 = 16;
pub const GLOBAL_DEFAULT_COUNT_OFFSET: u64 = 24;
pub const GLOBAL_DEFAULT_BLOCK_OFFSET: u64 = 28;
pub const GLOBAL_SUB_COUNT_OFFSET: u64 =
    GLOBAL_DEFAULT_BLOCK_OFFSET + (MAX_CATEGORIES * CATEGORY_RECORD_LEN) as u64;
pub const GLOBAL_SUB_BLOCK_OFFSET: u64 = GLOBAL_SUB_COUNT_OFFSET + 4;

pub fn global_subscription_offset(index: usize) -> u64 {
    GLOBAL_SUB_BLOCK_OFFSET + (index * SUB_RECORD_LEN) as u64
}

pub fn global_subscription_cursor_offset(index: usize) -> u64 {
    global_subscription_offset(index) + SUB_CURSOR_OFFSET as u64
}

/// Exact byte length of a global file holding `count` subscriptions.
pub fn global_len(count: u32) -> u64 {
    GLOBAL_SUB_BLOCK_OFFSET + count as u64 * SUB_RECORD_LEN as u64
}
