//! The total supply aggregate.
use super::{PassContext, Rows, reported_entries};
use crate::config::TotalRule;
use crate::id::ComponentID;
use crate::table::{CanonicalTable, Entry};
use crate::time_resolution::TimeResolution;
use itertools::Itertools;
use log::{debug, warn};

/// The component under which totals are stored
pub const TOTAL_COMPONENT: &str = "total";

/// Calculate the total of the rule's components for every model, scenario and year.
///
/// Components which weren't reported are skipped. If none were reported, no total is written.
pub fn total_rule(table: &CanonicalTable, ctx: &PassContext, rule: &TotalRule) -> Rows {
    let total = ComponentID::new(TOTAL_COMPONENT);
    if rule.components.contains(&total) {
        warn!("Ignoring {TOTAL_COMPONENT} in the components of the total");
    }
    let components: Vec<&ComponentID> = rule
        .components
        .iter()
        .filter(|component| **component != total)
        .unique()
        .collect();

    let rows: Rows = ctx
        .slots(TimeResolution::Annual)
        .iter()
        .filter_map(|slot| {
            let entries =
                reported_entries(table, slot, &rule.variable, components.iter().copied());
            let unit = entries.first()?.unit;
            let value = entries.iter().map(|entry| entry.value).sum();
            Some((slot.key(&rule.variable, &total), Entry { value, unit }))
        })
        .collect();

    debug!("Calculated {} totals of {}", rows.len(), rule.variable);

    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NormalisationConfig;
    use crate::fixture::{annual_key, loaded, rules_config};
    use crate::table::{Key, Value};
    use rstest::{fixture, rstest};

    #[fixture]
    fn supply_rule() -> TotalRule {
        TotalRule {
            variable: "electricity_supply".into(),
            components: vec!["hydro_dam".into(), "spv".into(), "wind".into()],
        }
    }

    fn total_of(config: &NormalisationConfig, rule: &TotalRule, rows: &[(Key, f64)]) -> Value {
        let mut data = loaded(rows);
        let ctx = PassContext::new(config, &data.index);
        let new_rows = total_rule(&data.table, &ctx, rule);
        data.table.merge(new_rows);
        data.table
            .value(&annual_key("A", "electricity_supply", TOTAL_COMPONENT, 2050))
    }

    #[rstest]
    fn test_total_skips_absent(rules_config: NormalisationConfig, supply_rule: TotalRule) {
        let total = total_of(
            &rules_config,
            &supply_rule,
            &[
                (annual_key("A", "electricity_supply", "hydro_dam", 2050), 10.0),
                (annual_key("A", "electricity_supply", "spv", 2050), 5.0),
                (annual_key("A", "electricity_supply", "gas", 2050), 100.0),
            ],
        );
        assert_eq!(total, Value::Reported(15.0));
    }

    #[rstest]
    fn test_total_nothing_reported(rules_config: NormalisationConfig, supply_rule: TotalRule) {
        let total = total_of(
            &rules_config,
            &supply_rule,
            &[(annual_key("A", "electricity_supply", "gas", 2050), 100.0)],
        );
        assert_eq!(total, Value::Absent);
    }

    #[rstest]
    fn test_total_ignores_itself_and_duplicates(
        rules_config: NormalisationConfig,
        mut supply_rule: TotalRule,
    ) {
        supply_rule.components.push("spv".into());
        supply_rule.components.push(TOTAL_COMPONENT.into());
        let total = total_of(
            &rules_config,
            &supply_rule,
            &[
                (annual_key("A", "electricity_supply", "spv", 2050), 5.0),
                (annual_key("A", "electricity_supply", TOTAL_COMPONENT, 2050), 50.0),
            ],
        );
        assert_eq!(total, Value::Reported(5.0));
    }

    #[rstest]
    fn test_total_idempotent(rules_config: NormalisationConfig, supply_rule: TotalRule) {
        let mut data = loaded(&[
            (annual_key("A", "electricity_supply", "hydro_dam", 2050), 10.0),
            (annual_key("A", "electricity_supply", "wind", 2050), 2.0),
        ]);
        let ctx = PassContext::new(&rules_config, &data.index);
        let first = total_rule(&data.table, &ctx, &supply_rule);
        data.table.merge(first.clone());

        assert_eq!(total_rule(&data.table, &ctx, &supply_rule), first);
    }
}
