//! Category resolution capability supplied by the frontend.

use tally_domain::{Category, MonthKey};

use crate::CoreError;

/// Answer to a category-resolution request.
#[derive(Debug, Clone, PartialEq)]
pub enum CategoryChoice {
    /// Use this existing slot.
    Existing(u32),
    /// Create this category in the target month and use its slot.
    Create(Category),
    /// Leave the affected transactions uncategorized.
    Uncategorized,
}

/// Decides which category to use when the core cannot: a subscription
/// replaying into a month that lacks its category, or transactions left
/// behind by a removed category. Interactive frontends prompt the user;
/// tests script the answers.
pub trait CategoryPicker {
    /// `subject` names what triggered the request (a subscription or a
    /// removed category); `missing` is the category name that failed to
    /// resolve, when there is one.
    fn pick(
        &mut self,
        month: MonthKey,
        subject: &str,
        missing: Option<&str>,
    ) -> Result<CategoryChoice, CoreError>;
}
