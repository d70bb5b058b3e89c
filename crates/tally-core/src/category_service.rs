//! Category and budget mutations, scoped to the loaded month.

use tally_domain::{Category, MonthKey, NAME_LEN};

use crate::ledger::Ledger;
use crate::resolver::{CategoryChoice, CategoryPicker};
use crate::CoreError;

pub struct CategoryService;

impl CategoryService {
    /// Adds a category, recycling the lowest vacant slot before extending
    /// past the live count. Returns the chosen slot.
    pub fn add(ledger: &mut Ledger, category: Category, month: MonthKey) -> Result<u32, CoreError> {
        Self::require_loaded(ledger, month)?;
        if category.name.trim().is_empty() {
            return Err(CoreError::Validation("category name is empty".into()));
        }
        if category.name.len() > NAME_LEN {
            return Err(CoreError::Validation(format!(
                "category name exceeds {NAME_LEN} bytes"
            )));
        }

        let mut vacant = None;
        for (slot, existing) in ledger.categories.iter().enumerate() {
            if existing.is_vacant() {
                if vacant.is_none() {
                    vacant = Some(slot);
                }
            } else if existing.name == category.name {
                return Err(CoreError::DuplicateCategory(category.name));
            }
        }
        let slot = vacant.ok_or_else(|| {
            CoreError::Validation("every category slot is already in use".into())
        })?;

        ledger.shards.write_category(month, slot, &category)?;
        let count = ledger.category_count + 1;
        ledger.shards.write_category_count(month, count)?;
        ledger.category_count = count;
        ledger.categories[slot] = category;

        if ledger.is_current_month() {
            ledger.persist_defaults()?;
        }
        Ok(slot as u32)
    }

    /// Removes the category at `index`, reassigning its transactions to
    /// the picker's choice and folding its `spent` into the target
    /// accumulator.
    pub fn remove(
        ledger: &mut Ledger,
        index: usize,
        month: MonthKey,
        picker: &mut dyn CategoryPicker,
    ) -> Result<(), CoreError> {
        Self::require_loaded(ledger, month)?;
        let removed = ledger
            .categories
            .get(index)
            .filter(|c| !c.is_vacant())
            .cloned()
            .ok_or(CoreError::IndexOutOfRange(index))?;

        let mut replacement = None;
        if !ledger.index.is_empty() {
            replacement = match picker.pick(month, &removed.name, None)? {
                CategoryChoice::Existing(slot) => {
                    let slot = slot as usize;
                    if slot == index {
                        return Err(CoreError::Validation(
                            "replacement is the category being removed".into(),
                        ));
                    }
                    ledger
                        .categories
                        .get(slot)
                        .filter(|c| !c.is_vacant())
                        .ok_or(CoreError::IndexOutOfRange(slot))?;
                    Some(slot as u32)
                }
                CategoryChoice::Create(category) => {
                    Some(Self::add(ledger, category, month)?)
                }
                CategoryChoice::Uncategorized => None,
            };
        }

        // Repoint every transaction carried by the removed slot.
        let affected: Vec<(usize, usize)> = ledger
            .index
            .iter()
            .filter(|(_, _, t)| t.category == Some(index as u32))
            .map(|(id, slot, _)| (id, slot))
            .collect();
        for (id, slot) in affected {
            let updated = {
                let t = ledger.index.txn_mut(id);
                t.category = replacement;
                t.clone()
            };
            ledger.shards.write_transaction(month, slot, &updated)?;
        }

        match replacement {
            Some(slot) => ledger.categories[slot as usize].spent += removed.spent,
            None => ledger.uncategorized_spent += removed.spent,
        }

        ledger.categories[index] = Category::default();
        ledger.category_count -= 1;
        ledger.shards.write_category_block(
            month,
            ledger.category_count,
            &ledger.categories,
        )?;
        ledger
            .shards
            .write_uncategorized(month, ledger.uncategorized_spent)?;

        if ledger.is_current_month() {
            ledger.persist_defaults()?;
        }
        Ok(())
    }

    /// Overwrites the month's budget.
    pub fn set_budget(ledger: &mut Ledger, amount: f64, month: MonthKey) -> Result<(), CoreError> {
        Self::require_loaded(ledger, month)?;
        ledger.shards.write_budget(month, amount)?;
        ledger.budget = amount;
        if ledger.is_current_month() {
            ledger.persist_defaults()?;
        }
        Ok(())
    }

    fn require_loaded(ledger: &Ledger, month: MonthKey) -> Result<(), CoreError> {
        if ledger.month != Some(month) {
            return Err(CoreError::WrongMonth(month));
        }
        Ok(())
    }
}
