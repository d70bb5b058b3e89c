//! tally-domain
//!
//! Pure domain models (Category, Transaction, Subscription, MonthKey) and
//! the calendar arithmetic behind recurring entries.
//! No I/O, no storage. Only data types and core enums.

pub mod category;
pub mod month;
pub mod subscription;
pub mod transaction;

pub use category::*;
pub use month::*;
pub use subscription::*;
pub use transaction::*;
