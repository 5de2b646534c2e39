//! Backfilling of aggregate categories from their subcategories.
//!
//! Models report technologies at different levels of detail: one may report `wind` while another
//! reports `wind_on` and `wind_off`. So that all models can be compared at the aggregate level,
//! a category which wasn't reported is calculated as the sum of its reported subcategories.
use super::{PassContext, Rows, reported_entries};
use crate::config::SubcategoryRule;
use crate::table::{CanonicalTable, Entry, Key, Slot};
use log::debug;

/// Calculate the value of a category at a slot, if it needs to be backfilled.
///
/// Returns `None` if the category was reported (reported values take precedence) or if none of
/// its subcategories were reported. Otherwise, subcategories which weren't reported count as
/// zero.
fn backfill_category(
    table: &CanonicalTable,
    slot: &Slot,
    rule: &SubcategoryRule,
) -> Option<(Key, Entry)> {
    let key = slot.key(&rule.variable, &rule.category);
    if table.contains(&key) {
        return None;
    }

    let entries = reported_entries(table, slot, &rule.variable, &rule.subcategories);
    let unit = entries.first()?.unit;
    let value = entries.iter().map(|entry| entry.value).sum();

    Some((key, Entry { value, unit }))
}

/// Backfill a category for every model, scenario and timestamp the rule applies to.
///
/// Running this again on its own output adds nothing, as the backfilled categories are then
/// present.
pub fn backfill_rule(table: &CanonicalTable, ctx: &PassContext, rule: &SubcategoryRule) -> Rows {
    let rows: Rows = ctx
        .slots(rule.time_resolution)
        .iter()
        .filter_map(|slot| backfill_category(table, slot, rule))
        .collect();

    debug!(
        "Backfilled {} values of {} for {}",
        rows.len(),
        rule.category,
        rule.variable
    );

    rows
}
