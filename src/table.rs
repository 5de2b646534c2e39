//! The canonical table of normalised observations.
//!
//! Each value is identified by a [`Key`] made up of scenario, variant, model, variable,
//! component, time resolution and timestamp. There is at most one value per key.
use crate::id::{ComponentID, ModelID, ScenarioID, ScenarioKey, VariableID, VariantID};
use crate::time_resolution::{TimeResolution, Timestamp};
use crate::units::CanonicalUnit;
use indexmap::{IndexMap, IndexSet};
use std::collections::BTreeSet;
use std::fmt;

/// A value which may or may not have been reported.
///
/// "Not reported" is different from a reported zero: absent values are skipped when summing,
/// whereas zeros are added.
#[derive(PartialEq, Copy, Clone, Debug, Default)]
pub enum Value {
    /// A value reported by a model (or derived from reported values)
    Reported(f64),
    /// No value was reported
    #[default]
    Absent,
}

impl Value {
    /// The reported value, if any
    pub fn reported(self) -> Option<f64> {
        match self {
            Self::Reported(value) => Some(value),
            Self::Absent => None,
        }
    }

    /// The reported value, or zero if absent
    pub fn or_zero(self) -> f64 {
        self.reported().unwrap_or(0.0)
    }
}

impl From<Option<f64>> for Value {
    fn from(value: Option<f64>) -> Self {
        value.map_or(Self::Absent, Self::Reported)
    }
}

/// Sum the reported values, skipping absent ones.
///
/// If no value is reported the sum is [`Value::Absent`] rather than zero.
pub fn sum_reported<I>(values: I) -> Value
where
    I: IntoIterator<Item = Value>,
{
    values
        .into_iter()
        .filter_map(Value::reported)
        .reduce(|acc, value| acc + value)
        .into()
}

/// Identifies a single value in the canonical table
#[derive(PartialEq, Eq, Hash, PartialOrd, Ord, Clone, Debug)]
pub struct Key {
    /// The scenario the value belongs to
    pub scenario: ScenarioID,
    /// The scenario variant
    pub variant: VariantID,
    /// The model which reported the value
    pub model: ModelID,
    /// The reported variable (e.g. `electricity_supply`)
    pub variable: VariableID,
    /// The technology, fuel or use within the variable (e.g. `hydro_dam`)
    pub component: ComponentID,
    /// The time resolution of the value
    pub resolution: TimeResolution,
    /// The point in time the value refers to
    pub timestamp: Timestamp,
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}/{}/{}/{}",
            self.scenario,
            self.variant,
            self.model,
            self.variable,
            self.component,
            self.resolution,
            self.timestamp
        )
    }
}

/// The position of a value within a model's results, without its variable and component.
///
/// Passes compute derived values for every slot of a model, combining the values of different
/// variables and components at that slot.
#[derive(PartialEq, Eq, Hash, Clone, Debug)]
pub struct Slot<'a> {
    /// The model
    pub model: &'a ModelID,
    /// The scenario and variant
    pub scenario: &'a ScenarioKey,
    /// The time resolution
    pub resolution: TimeResolution,
    /// The timestamp
    pub timestamp: Timestamp,
}

impl Slot<'_> {
    /// The key for the given variable and component at this slot
    pub fn key(&self, variable: &VariableID, component: &ComponentID) -> Key {
        Key {
            scenario: self.scenario.0.clone(),
            variant: self.scenario.1.clone(),
            model: self.model.clone(),
            variable: variable.clone(),
            component: component.clone(),
            resolution: self.resolution,
            timestamp: self.timestamp,
        }
    }
}

/// A normalised value together with its unit
#[derive(PartialEq, Copy, Clone, Debug)]
pub struct Entry {
    /// The value, expressed in `unit`
    pub value: f64,
    /// The canonical unit of the value
    pub unit: CanonicalUnit,
}

/// The canonical table of normalised values
#[derive(PartialEq, Clone, Debug, Default)]
pub struct CanonicalTable {
    entries: IndexMap<Key, Entry>,
}

impl CanonicalTable {
    /// Create a new, empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// The number of values in the table
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get the entry for a key, if present
    pub fn get(&self, key: &Key) -> Option<&Entry> {
        self.entries.get(key)
    }

    /// Get the value for a key
    pub fn value(&self, key: &Key) -> Value {
        self.get(key).map(|entry| entry.value).into()
    }

    /// Whether a value is present for the key
    pub fn contains(&self, key: &Key) -> bool {
        self.entries.contains_key(key)
    }

    /// Insert an entry, returning the entry it replaced, if any
    pub fn insert(&mut self, key: Key, entry: Entry) -> Option<Entry> {
        self.entries.insert(key, entry)
    }

    /// Merge rows computed by a pass into the table, overwriting existing values
    pub fn merge<I>(&mut self, rows: I)
    where
        I: IntoIterator<Item = (Key, Entry)>,
    {
        self.entries.extend(rows);
    }

    /// Iterate over keys and entries
    pub fn iter(&self) -> impl Iterator<Item = (&Key, &Entry)> {
        self.entries.iter()
    }

    /// Sort the table by key, so that iteration order is reproducible
    pub fn sort(&mut self) {
        self.entries.sort_unstable_keys();
    }
}

/// The scenario variants and timestamps of a model's values at one sub-annual resolution
#[derive(PartialEq, Clone, Debug, Default)]
struct SubAnnualReport {
    scenarios: BTreeSet<ScenarioKey>,
    timestamps: BTreeSet<Timestamp>,
}

/// Indices of what each model reported.
///
/// The years and scenario variants of a model come from its annual values. The sub-annual values
/// are indexed separately per resolution, as some models report typical days for scenarios or
/// days which have no annual counterpart.
#[derive(PartialEq, Clone, Debug, Default)]
pub struct ReportedIndex {
    years: IndexMap<ModelID, BTreeSet<u32>>,
    scenarios: IndexMap<ModelID, BTreeSet<ScenarioKey>>,
    sub_annual: IndexMap<(ModelID, TimeResolution), SubAnnualReport>,
}

impl ReportedIndex {
    /// Build the index from the values in `table`
    pub fn from_table(table: &CanonicalTable) -> Self {
        let mut index = Self::default();
        for (key, _) in table.iter() {
            let scenario = (key.scenario.clone(), key.variant.clone());
            match key.timestamp {
                Timestamp::Year(year) => {
                    index
                        .years
                        .entry(key.model.clone())
                        .or_default()
                        .insert(year);
                    index
                        .scenarios
                        .entry(key.model.clone())
                        .or_default()
                        .insert(scenario);
                }
                Timestamp::Hour(_) => {
                    let report = index
                        .sub_annual
                        .entry((key.model.clone(), key.resolution))
                        .or_default();
                    report.scenarios.insert(scenario);
                    report.timestamps.insert(key.timestamp);
                }
            }
        }

        index
    }

    /// The models with annual values
    pub fn models(&self) -> impl Iterator<Item = &ModelID> {
        self.years.keys()
    }

    /// The years for which a model reported annual values, in ascending order
    pub fn years(&self, model: &ModelID) -> impl Iterator<Item = u32> {
        self.years.get(model).into_iter().flatten().copied()
    }

    /// The scenario/variant pairs for which a model reported annual values, in order
    pub fn scenarios(&self, model: &ModelID) -> impl Iterator<Item = &ScenarioKey> {
        self.scenarios.get(model).into_iter().flatten()
    }

    /// The models with values at a resolution.
    ///
    /// For sub-annual resolutions, models with annual values come first, followed by those which
    /// only reported at this resolution.
    pub fn models_at(&self, resolution: TimeResolution) -> IndexSet<&ModelID> {
        let mut models: IndexSet<_> = self.models().collect();
        if resolution.is_sub_annual() {
            models.extend(
                self.sub_annual
                    .keys()
                    .filter(|(_, res)| *res == resolution)
                    .map(|(model, _)| model),
            );
        }

        models
    }

    /// The scenario/variant pairs of a model at a resolution, in order.
    ///
    /// For sub-annual resolutions these include the scenario variants the model reported annual
    /// values for.
    pub fn scenarios_at(
        &self,
        model: &ModelID,
        resolution: TimeResolution,
    ) -> BTreeSet<&ScenarioKey> {
        let mut scenarios: BTreeSet<_> = self.scenarios(model).collect();
        if let Some(report) = self.sub_annual_report(model, resolution) {
            scenarios.extend(report.scenarios.iter());
        }

        scenarios
    }

    /// The timestamps a model reported at a sub-annual resolution, in order
    pub fn sub_annual_timestamps(
        &self,
        model: &ModelID,
        resolution: TimeResolution,
    ) -> impl Iterator<Item = Timestamp> {
        self.sub_annual_report(model, resolution)
            .into_iter()
            .flat_map(|report| report.timestamps.iter().copied())
    }

    fn sub_annual_report(
        &self,
        model: &ModelID,
        resolution: TimeResolution,
    ) -> Option<&SubAnnualReport> {
        if !resolution.is_sub_annual() {
            return None;
        }

        self.sub_annual.get(&(model.clone(), resolution))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{annual_key, energy, typical_day_key};
    use rstest::rstest;

    #[rstest]
    #[case(vec![], Value::Absent)]
    #[case(vec![Value::Absent, Value::Absent], Value::Absent)]
    #[case(vec![Value::Reported(0.0), Value::Absent], Value::Reported(0.0))]
    #[case(vec![Value::Reported(10.0), Value::Absent, Value::Reported(5.0)], Value::Reported(15.0))]
    fn test_sum_reported(#[case] values: Vec<Value>, #[case] expected: Value) {
        assert_eq!(sum_reported(values), expected);
    }

    #[test]
    fn test_value_or_zero() {
        assert_eq!(Value::Absent.or_zero(), 0.0);
        assert_eq!(Value::Reported(2.5).or_zero(), 2.5);
    }

    #[test]
    fn test_table_lookup() {
        let mut table = CanonicalTable::new();
        let key = annual_key("A", "electricity_supply", "hydro_dam", 2050);
        assert_eq!(table.value(&key), Value::Absent);

        assert!(table.insert(key.clone(), energy(10.0)).is_none());
        assert_eq!(table.value(&key), Value::Reported(10.0));
        assert_eq!(table.insert(key.clone(), energy(12.0)), Some(energy(10.0)));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_reported_index() {
        let mut table = CanonicalTable::new();
        table.insert(annual_key("A", "electricity_supply", "spv", 2050), energy(1.0));
        table.insert(annual_key("A", "electricity_supply", "spv", 2030), energy(1.0));
        table.insert(annual_key("B", "electricity_supply", "spv", 2040), energy(1.0));

        let index = ReportedIndex::from_table(&table);
        let model_a = ModelID::new("A");
        assert_eq!(index.years(&model_a).collect::<Vec<_>>(), [2030, 2050]);
        assert_eq!(index.years(&"C".into()).count(), 0);
        assert_eq!(
            index.scenarios(&model_a).cloned().collect::<Vec<_>>(),
            [(ScenarioID::new("s"), VariantID::new("ref"))]
        );
        assert_eq!(index.models().count(), 2);
    }

    #[test]
    fn test_reported_index_sub_annual() {
        let mut table = CanonicalTable::new();
        table.insert(annual_key("A", "electricity_supply", "spv", 2050), energy(1.0));
        let day_key = |model, day| typical_day_key(model, "electricity_supply", "spv", day, 7, 12);
        table.insert(day_key("A", 2), energy(1.0));
        table.insert(
            Key {
                scenario: "t".into(),
                ..day_key("B", 1)
            },
            energy(1.0),
        );

        let index = ReportedIndex::from_table(&table);

        // Only annual values count towards the reported years and scenarios
        assert_eq!(index.models().count(), 1);
        assert_eq!(index.years(&"B".into()).count(), 0);

        let models: Vec<_> = index
            .models_at(TimeResolution::TypicalDay)
            .into_iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(models, ["A", "B"]);
        assert_eq!(index.models_at(TimeResolution::Annual).len(), 1);
        assert_eq!(index.models_at(TimeResolution::Hourly).len(), 1);

        let model_b = ModelID::new("B");
        assert_eq!(
            index
                .scenarios_at(&model_b, TimeResolution::TypicalDay)
                .into_iter()
                .cloned()
                .collect::<Vec<_>>(),
            [(ScenarioID::new("t"), VariantID::new("ref"))]
        );
        assert!(
            index
                .scenarios_at(&model_b, TimeResolution::Annual)
                .is_empty()
        );
        assert_eq!(
            index
                .sub_annual_timestamps(&"A".into(), TimeResolution::TypicalDay)
                .collect::<Vec<_>>(),
            [day_key("A", 2).timestamp]
        );
    }

    #[test]
    fn test_sort() {
        let mut table = CanonicalTable::new();
        table.insert(annual_key("B", "electricity_supply", "spv", 2050), energy(1.0));
        table.insert(annual_key("A", "electricity_supply", "spv", 2050), energy(2.0));
        table.sort();
        let models: Vec<_> = table.iter().map(|(key, _)| key.model.to_string()).collect();
        assert_eq!(models, ["A", "B"]);
    }
}
