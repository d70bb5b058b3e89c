use std::io;

use thiserror::Error;

use tally_domain::MonthKey;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("incompatible data file: {0}")]
    Incompatible(String),

    #[error("shard not found: {0}")]
    ShardNotFound(String),

    #[error("month {0} is not the loaded month")]
    WrongMonth(MonthKey),

    #[error("index {0} out of range")]
    IndexOutOfRange(usize),

    #[error("duplicate category: {0}")]
    DuplicateCategory(String),

    #[error("index allocation failed: {0}")]
    Allocation(String),

    #[error("corrupt record: {0}")]
    Corrupt(String),

    #[error("validation failed: {0}")]
    Validation(String),
}
