//! tally-core
//!
//! Business logic and services for the month-sharded budget ledger.
//! Depends on tally-domain. No CLI, no terminal I/O; persistence is
//! reached only through the storage traits in [`storage`].

pub mod category_service;
pub mod error;
pub mod index;
pub mod ledger;
pub mod resolver;
pub mod storage;
pub mod subscription_service;
pub mod time;
pub mod transaction_service;

pub use category_service::CategoryService;
pub use error::CoreError;
pub use index::TransactionIndex;
pub use ledger::Ledger;
pub use resolver::{CategoryChoice, CategoryPicker};
pub use storage::{category_index_by_name, GlobalState, GlobalStore, ShardDefaults, ShardStore};
pub use subscription_service::SubscriptionService;
pub use time::{Clock, SystemClock};
pub use transaction_service::TransactionService;
