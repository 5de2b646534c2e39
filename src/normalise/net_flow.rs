//! Net flows between opposing supply and demand components.
//!
//! For instance, a model may report both imports and exports of electricity in the same year.
//! These are replaced for comparison purposes by a net import (under supply) and a net export
//! (under consumption), at most one of which is nonzero.
use super::{PassContext, Rows, reported_entries};
use crate::config::NetFlowRule;
use crate::table::{CanonicalTable, Entry};
use crate::units::CanonicalUnit;
use log::debug;

/// Split a balance into its non-negative positive and negative parts
pub fn split_net_flow(net: f64) -> (f64, f64) {
    if net >= 0.0 { (net, 0.0) } else { (0.0, -net) }
}

/// Calculate net flows for every model, scenario and timestamp the rule applies to.
///
/// A net flow is only calculated where at least one of the rule's components was reported.
/// Components which weren't reported count as zero.
pub fn net_flow_rule(table: &CanonicalTable, ctx: &PassContext, rule: &NetFlowRule) -> Rows {
    let suffixes = &ctx.config().variable_suffixes;

    let mut rows = Rows::new();
    for &resolution in &rule.time_resolutions {
        let supply_variable = suffixes.variable_at(&rule.supply_variable, resolution);
        let demand_variable = suffixes.variable_at(&rule.demand_variable, resolution);

        for slot in ctx.slots(resolution) {
            let supply = reported_entries(table, &slot, &supply_variable, &rule.supply_components);
            let demand = reported_entries(table, &slot, &demand_variable, &rule.demand_components);
            let Some(first) = supply.iter().chain(demand.iter()).next() else {
                continue;
            };
            let unit: CanonicalUnit = first.unit;

            let supply_sum: f64 = supply.iter().map(|entry| entry.value).sum();
            let demand_sum: f64 = demand.iter().map(|entry| entry.value).sum();
            let (positive, negative) = split_net_flow(supply_sum - demand_sum);

            rows.push((
                slot.key(&supply_variable, &rule.net_positive),
                Entry {
                    value: positive,
                    unit,
                },
            ));
            rows.push((
                slot.key(&demand_variable, &rule.net_negative),
                Entry {
                    value: negative,
                    unit,
                },
            ));
        }
    }

    debug!(
        "Calculated {} values of {} and {}",
        rows.len(),
        rule.net_positive,
        rule.net_negative
    );

    rows
}
