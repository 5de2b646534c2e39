//! Normalisation of loaded model results.
//!
//! The canonical table is built in a fixed sequence of passes:
//!
//! 1. Unit conversion, done while the results are loaded
//! 2. Backfilling of aggregate categories from their subcategories
//! 3. Net flows (e.g. net imports/exports)
//! 4. Total supply
//!
//! Later passes consume the output of earlier ones (e.g. total supply includes net imports), so
//! the order cannot be changed. Each pass is a pure function of the table so far, returning the
//! rows to add to it. Once all passes have run, the table is frozen in a [`NormalisedData`].
use crate::config::{ModelInfo, NormalisationConfig};
use crate::id::{ComponentID, ModelID, ScenarioKey, VariableID};
use crate::input::{LoadedData, load_results};
use crate::table::{CanonicalTable, Entry, Key, ReportedIndex, Slot, Value};
use crate::time_resolution::{TimeResolution, Timestamp};
use anyhow::Result;
use log::{info, warn};
use std::collections::BTreeSet;
use std::path::Path;

pub mod backfill;
pub mod net_flow;
pub mod total;

/// The rows produced by a pass
pub type Rows = Vec<(Key, Entry)>;

/// What a pass needs to know about the models besides their results
pub struct PassContext<'a> {
    config: &'a NormalisationConfig,
    index: &'a ReportedIndex,
}

impl<'a> PassContext<'a> {
    /// Create a new [`PassContext`]
    pub fn new(config: &'a NormalisationConfig, index: &'a ReportedIndex) -> Self {
        Self { config, index }
    }

    /// The configuration
    pub fn config(&self) -> &'a NormalisationConfig {
        self.config
    }

    /// The timestamps for which a pass computes values for a model.
    ///
    /// For annual values these are the years the model reported. For typical days they are the
    /// hours of the model's representative days together with any other hours the model
    /// reported. For hourly values they are the timestamps the model reported.
    fn timestamps(&self, model: &ModelID, resolution: TimeResolution) -> BTreeSet<Timestamp> {
        let reported = self.index.sub_annual_timestamps(model, resolution);
        match resolution {
            TimeResolution::Annual => self.index.years(model).map(Timestamp::Year).collect(),
            TimeResolution::TypicalDay => self
                .config
                .model(model)
                .map(ModelInfo::representative_hours)
                .unwrap_or_default()
                .into_iter()
                .chain(reported)
                .collect(),
            TimeResolution::Hourly => reported.collect(),
        }
    }

    /// Every combination of model, scenario and timestamp a pass considers at a resolution
    pub fn slots(&self, resolution: TimeResolution) -> Vec<Slot<'a>> {
        let index = self.index;
        let mut slots = Vec::new();
        for model in index.models_at(resolution) {
            let timestamps = self.timestamps(model, resolution);
            for scenario in index.scenarios_at(model, resolution) {
                slots.extend(timestamps.iter().map(|timestamp| Slot {
                    model,
                    scenario,
                    resolution,
                    timestamp: *timestamp,
                }));
            }
        }

        slots
    }
}

/// Gets the reported entries for components of a variable at a slot
pub(crate) fn reported_entries<'t, 'c>(
    table: &'t CanonicalTable,
    slot: &Slot,
    variable: &VariableID,
    components: impl IntoIterator<Item = &'c ComponentID>,
) -> Vec<&'t Entry> {
    components
        .into_iter()
        .filter_map(|component| table.get(&slot.key(variable, component)))
        .collect()
}

/// Applies the normalisation passes to loaded results
pub struct Normaliser {
    config: NormalisationConfig,
}

impl Normaliser {
    /// Create a new [`Normaliser`] with the given configuration
    pub fn new(config: NormalisationConfig) -> Self {
        Self { config }
    }

    /// Load results files and normalise them
    pub fn load_and_normalise<P: AsRef<Path>>(self, file_paths: &[P]) -> Result<NormalisedData> {
        let loaded = load_results(file_paths)?;
        Ok(self.normalise(loaded))
    }

    /// Run the backfill, net flow and total passes over loaded results
    pub fn normalise(self, loaded: LoadedData) -> NormalisedData {
        let LoadedData { mut table, index } = loaded;
        self.check_models(&index);

        let ctx = PassContext::new(&self.config, &index);

        // Rules are applied one at a time so that later rules see earlier rules' categories
        let mut backfilled = 0;
        for rule in &self.config.subcategories {
            let rows = backfill::backfill_rule(&table, &ctx, rule);
            backfilled += rows.len();
            table.merge(rows);
        }
        info!("Backfilled {backfilled} category values from subcategories");

        let mut net_flows = 0;
        for rule in &self.config.net_flows {
            let rows = net_flow::net_flow_rule(&table, &ctx, rule);
            net_flows += rows.len();
            table.merge(rows);
        }
        info!("Calculated {net_flows} net flow values");

        if let Some(rule) = &self.config.total_supply {
            let rows = total::total_rule(&table, &ctx, rule);
            info!("Calculated {} total {} values", rows.len(), rule.variable);
            table.merge(rows);
        }

        table.sort();
        NormalisedData {
            table,
            index,
            config: self.config,
        }
    }

    /// Warn about models with results but no entry in the model registry
    fn check_models(&self, index: &ReportedIndex) {
        if self.config.models.is_empty() {
            return;
        }

        for model in index.models() {
            if self.config.model(model).is_none() {
                warn!("Model {model} has results but is not in the model registry");
            }
        }
    }
}

/// Normalised results, ready to be queried by chart builders
#[derive(Debug)]
pub struct NormalisedData {
    table: CanonicalTable,
    index: ReportedIndex,
    config: NormalisationConfig,
}

impl NormalisedData {
    /// The canonical table
    pub fn table(&self) -> &CanonicalTable {
        &self.table
    }

    /// The configuration used for normalisation
    pub fn config(&self) -> &NormalisationConfig {
        &self.config
    }

    /// Look up a value by key
    pub fn lookup(&self, key: &Key) -> Value {
        self.table.value(key)
    }

    /// Look up a value.
    ///
    /// Returns [`Value::Absent`] if nothing was reported or derived for this combination.
    pub fn lookup_value(
        &self,
        scenario: &ScenarioKey,
        model: &ModelID,
        variable: &VariableID,
        component: &ComponentID,
        resolution: TimeResolution,
        timestamp: Timestamp,
    ) -> Value {
        let slot = Slot {
            model,
            scenario,
            resolution,
            timestamp,
        };
        self.lookup(&slot.key(variable, component))
    }

    /// The models which reported annual results
    pub fn models(&self) -> impl Iterator<Item = &ModelID> {
        self.index.models()
    }

    /// The years for which a model reported annual results, in ascending order
    pub fn reported_years(&self, model: &ModelID) -> impl Iterator<Item = u32> {
        self.index.years(model)
    }

    /// The scenario variants for which a model reported annual results, in order
    pub fn reported_scenarios(&self, model: &ModelID) -> impl Iterator<Item = &ScenarioKey> {
        self.index.scenarios(model)
    }

    /// The scenario variants of a model to show in charts.
    ///
    /// If scenario labels are configured, these are the labelled variants the model reported.
    /// Otherwise all reported variants are used.
    pub fn selected_scenarios(&self, model: &ModelID) -> Vec<&ScenarioKey> {
        self.reported_scenarios(model)
            .filter(|scenario| {
                self.config.scenarios.is_empty() || self.config.scenario_label(scenario).is_some()
            })
            .collect()
    }

    /// The display label for a scenario variant, falling back on the scenario ID
    pub fn scenario_label(&self, scenario: &ScenarioKey) -> String {
        self.config
            .scenario_label(scenario)
            .map_or_else(|| scenario.0.to_string(), str::to_string)
    }

    /// Information from the model registry, if the model is registered
    pub fn model_info(&self, model: &ModelID) -> Option<&ModelInfo> {
        self.config.model(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{annual_key, loaded, rules_config, typical_day_key};
    use crate::id::ScenarioID;
    use chrono::NaiveDate;
    use float_cmp::assert_approx_eq;
    use rstest::rstest;

    fn scenario() -> ScenarioKey {
        ("s".into(), "ref".into())
    }

    #[rstest]
    fn test_normalise_end_to_end(rules_config: NormalisationConfig) {
        let data = Normaliser::new(rules_config).normalise(loaded(&[
            (annual_key("A", "electricity_supply", "hydro_dam", 2050), 10.0),
            (annual_key("A", "electricity_supply", "wind_on", 2050), 3.0),
            (annual_key("A", "electricity_supply", "imports", 2050), 12.0),
            (annual_key("A", "electricity_consumption", "exports", 2050), 5.0),
        ]));

        let lookup = |variable: &str, component: &str| {
            data.lookup(&annual_key("A", variable, component, 2050))
        };
        assert_eq!(lookup("electricity_supply", "wind"), Value::Reported(3.0));
        assert_eq!(lookup("electricity_supply", "net_imports"), Value::Reported(7.0));
        assert_eq!(
            lookup("electricity_consumption", "net_exports"),
            Value::Reported(0.0)
        );

        // hydro_dam + wind (backfilled) + net_imports (derived)
        let Value::Reported(total) = lookup("electricity_supply", "total") else {
            panic!("Total should have been calculated");
        };
        assert_approx_eq!(f64, total, 20.0);
    }

    #[rstest]
    fn test_normalise_idempotent(rules_config: NormalisationConfig) {
        let rows = [
            (annual_key("A", "electricity_supply", "spv", 2050), 5.0),
            (annual_key("A", "electricity_supply", "wind_off", 2050), 4.0),
            (annual_key("A", "electricity_supply", "imports", 2050), 1.0),
        ];
        let once = Normaliser::new(rules_config.clone()).normalise(loaded(&rows));
        let table = once.table().clone();
        let index = ReportedIndex::from_table(&table);
        let twice = Normaliser::new(rules_config).normalise(LoadedData { table, index });
        assert_eq!(once.table(), twice.table());
    }

    #[rstest]
    fn test_lookup_value_missing(rules_config: NormalisationConfig) {
        let data = Normaliser::new(rules_config).normalise(loaded(&[(
            annual_key("A", "electricity_supply", "spv", 2050),
            5.0,
        )]));
        assert_eq!(
            data.lookup_value(
                &scenario(),
                &"A".into(),
                &"electricity_supply".into(),
                &"spv".into(),
                TimeResolution::Annual,
                Timestamp::Year(2050)
            ),
            Value::Reported(5.0)
        );
        assert_eq!(
            data.lookup_value(
                &scenario(),
                &"B".into(),
                &"electricity_supply".into(),
                &"spv".into(),
                TimeResolution::Annual,
                Timestamp::Year(2050)
            ),
            Value::Absent
        );
    }

    #[rstest]
    fn test_typical_day_uses_representative_hours(mut rules_config: NormalisationConfig) {
        rules_config.models = vec![ModelInfo {
            id: "A".into(),
            name: "Model A".into(),
            color: String::new(),
            summer: "Typical day".into(),
            summer_day: NaiveDate::from_ymd_opt(2050, 7, 1),
            winter: "Typical day".into(),
            winter_day: None,
        }];
        let day_key = |component, hour| {
            typical_day_key("A", "electricity_supply_typical_day", component, 1, 7, hour)
        };

        let data = Normaliser::new(rules_config).normalise(loaded(&[
            (annual_key("A", "electricity_supply", "spv", 2050), 5.0),
            (day_key("wind_on", 12), 0.5),
            (day_key("wind_off", 13), 0.25),
        ]));

        assert_eq!(data.lookup(&day_key("wind", 12)), Value::Reported(0.5));
        assert_eq!(data.lookup(&day_key("wind", 13)), Value::Reported(0.25));
        assert_eq!(data.lookup(&day_key("wind", 14)), Value::Absent);
    }

    #[rstest]
    fn test_selected_scenarios(mut rules_config: NormalisationConfig) {
        let rows = [
            (annual_key("A", "electricity_supply", "spv", 2050), 5.0),
            (
                Key {
                    scenario: "t".into(),
                    ..annual_key("A", "electricity_supply", "spv", 2050)
                },
                5.0,
            ),
        ];
        let data = Normaliser::new(rules_config.clone()).normalise(loaded(&rows));
        assert_eq!(data.selected_scenarios(&"A".into()).len(), 2);
        assert_eq!(data.scenario_label(&scenario()), "s");

        rules_config.scenarios = vec![crate::config::ScenarioLabel {
            scenario: "t".into(),
            variant: None,
            label: "Scenario T".into(),
        }];
        let data = Normaliser::new(rules_config).normalise(loaded(&rows));
        let selected = data.selected_scenarios(&"A".into());
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].0, ScenarioID::new("t"));
        assert_eq!(data.scenario_label(selected[0]), "Scenario T");
    }
}
