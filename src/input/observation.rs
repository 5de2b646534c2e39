//! Code for reading model results from long-format CSV files.
use super::input_err_msg;
use crate::id::{ComponentID, ModelID, ScenarioID, VariableID, VariantID, intern};
use crate::table::{CanonicalTable, Entry, Key, ReportedIndex};
use crate::time_resolution::{TimeResolution, Timestamp};
use crate::units::{CanonicalUnit, find_conversion};
use anyhow::{Context, Result, bail, ensure};
use log::{debug, info, warn};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

/// A row of a results file, as read from disk.
///
/// Columns not listed here (e.g. `scenario_group`, `uploaded_by`, `uploaded_at`, `country`) are
/// ignored.
#[derive(PartialEq, Debug, Deserialize)]
struct ObservationRaw {
    scenario_name: String,
    #[serde(default)]
    scenario_variant: Option<String>,
    model: String,
    variable: String,
    #[serde(default)]
    use_technology_fuel: String,
    time_resolution: TimeResolution,
    timestamp: String,
    value: String,
    unit: String,
}

/// A single reported value, converted to its canonical unit
#[derive(PartialEq, Clone, Debug)]
pub struct Observation {
    /// Where the value belongs in the canonical table
    pub key: Key,
    /// The converted value
    pub value: f64,
    /// The unit of `value`
    pub unit: CanonicalUnit,
    /// The unit the value was reported in
    pub reported_unit: String,
}

impl Observation {
    /// The table entry for this observation
    pub fn entry(&self) -> Entry {
        Entry {
            value: self.value,
            unit: self.unit,
        }
    }
}

/// What became of a row read from a results file
#[derive(PartialEq, Debug)]
enum RowOutcome {
    /// The row holds a usable value
    Observed(Observation),
    /// The value cell is empty or NaN
    NotReported,
    /// The value is in a unit which can't be converted
    UnknownUnit(String),
}

/// Shared copies of the IDs seen so far
#[derive(Default)]
struct IDStore {
    scenarios: HashSet<ScenarioID>,
    variants: HashSet<VariantID>,
    models: HashSet<ModelID>,
    variables: HashSet<VariableID>,
    components: HashSet<ComponentID>,
}

/// Parse a value cell, returning `None` if no value was reported
fn parse_value(s: &str) -> Result<Option<f64>> {
    let s = s.trim();
    if s.is_empty() {
        return Ok(None);
    }

    let Ok(value) = s.parse::<f64>() else {
        bail!("Invalid value '{s}': not a number");
    };
    if value.is_nan() {
        return Ok(None);
    }
    ensure!(value.is_finite(), "Invalid value '{s}': must be finite");

    Ok(Some(value))
}

impl ObservationRaw {
    /// Validate the row and convert its value
    fn into_outcome(self, ids: &mut IDStore) -> Result<RowOutcome> {
        let resolution = self.time_resolution;
        let timestamp = Timestamp::parse(&self.timestamp, resolution)?;
        let Some(value) = parse_value(&self.value)? else {
            return Ok(RowOutcome::NotReported);
        };
        let Some(conversion) = find_conversion(resolution, &self.unit) else {
            return Ok(RowOutcome::UnknownUnit(self.unit));
        };

        let variant = match self.scenario_variant.as_deref().map(str::trim) {
            Some(variant) if !variant.is_empty() => intern(&mut ids.variants, variant),
            _ => VariantID::default(),
        };
        let key = Key {
            scenario: intern(&mut ids.scenarios, self.scenario_name.trim()),
            variant,
            model: intern(&mut ids.models, self.model.trim()),
            variable: intern(&mut ids.variables, self.variable.trim()),
            component: intern(&mut ids.components, self.use_technology_fuel.trim()),
            resolution,
            timestamp,
        };

        Ok(RowOutcome::Observed(Observation {
            key,
            value: value * conversion.factor,
            unit: conversion.unit,
            reported_unit: self.unit,
        }))
    }
}

/// Read observations from a results file.
///
/// Rows without a value are skipped. Rows in unrecognised units are also skipped, with a single
/// warning for the whole file, as their values cannot be compared with other models' results.
///
/// # Arguments
///
/// * `file_path` - Path to the CSV file
///
/// # Returns
///
/// The observations in the order they appear in the file, or an error if any row is malformed.
pub fn read_observations(file_path: &Path) -> Result<Vec<Observation>> {
    read_observations_with_ids(file_path, &mut IDStore::default())
}

fn read_observations_with_ids(file_path: &Path, ids: &mut IDStore) -> Result<Vec<Observation>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(file_path)
        .with_context(|| input_err_msg(file_path))?;
    let headers = reader
        .headers()
        .with_context(|| input_err_msg(file_path))?
        .clone();

    let mut observations = Vec::new();
    let mut not_reported = 0usize;
    let mut unknown_units = HashSet::new();
    let mut unknown_unit_rows = 0usize;
    for record in reader.records() {
        let record = record.with_context(|| input_err_msg(file_path))?;
        let line = record.position().map_or(0, csv::Position::line);
        let row_err_msg = || format!("{}: line {line}", input_err_msg(file_path));

        let raw: ObservationRaw = record.deserialize(Some(&headers)).with_context(row_err_msg)?;
        match raw.into_outcome(ids).with_context(row_err_msg)? {
            RowOutcome::Observed(observation) => observations.push(observation),
            RowOutcome::NotReported => {
                debug!("{}: no value reported", row_err_msg());
                not_reported += 1;
            }
            RowOutcome::UnknownUnit(unit) => {
                debug!("{}: unknown unit '{unit}'", row_err_msg());
                unknown_unit_rows += 1;
                unknown_units.insert(unit);
            }
        }
    }

    if unknown_unit_rows > 0 {
        let mut units: Vec<_> = unknown_units.into_iter().collect();
        units.sort();
        warn!(
            "{}: ignored {unknown_unit_rows} rows with unrecognised units ({})",
            file_path.display(),
            units.join(", ")
        );
    }
    if not_reported > 0 {
        debug!(
            "{}: {not_reported} rows had no value",
            file_path.display()
        );
    }

    Ok(observations)
}

/// The canonical table built from results files, before any derived values are added
#[derive(PartialEq, Debug, Default)]
pub struct LoadedData {
    /// Converted values
    pub table: CanonicalTable,
    /// The years and scenarios reported by each model
    pub index: ReportedIndex,
}

/// Insert observations into a table.
///
/// If the same key is reported more than once, the last value wins. A warning is issued if the
/// values differ.
pub fn insert_observations<I>(table: &mut CanonicalTable, observations: I)
where
    I: IntoIterator<Item = Observation>,
{
    for observation in observations {
        let entry = observation.entry();
        if let Some(old) = table.insert(observation.key.clone(), entry) {
            if old == entry {
                debug!("Duplicate entry for {}", observation.key);
            } else {
                warn!(
                    "Duplicate entry for {}: replacing {} {} with {} {}",
                    observation.key, old.value, old.unit, entry.value, entry.unit
                );
            }
        }
    }
}

/// Load results from one or more CSV files into a canonical table.
///
/// # Arguments
///
/// * `file_paths` - Paths to the results files, read in order
///
/// # Returns
///
/// The converted values and the index of years and scenarios reported by each model.
pub fn load_results<P: AsRef<Path>>(file_paths: &[P]) -> Result<LoadedData> {
    ensure!(!file_paths.is_empty(), "No results files provided");

    let mut ids = IDStore::default();
    let mut table = CanonicalTable::new();
    for file_path in file_paths {
        let file_path = file_path.as_ref();
        let observations = read_observations_with_ids(file_path, &mut ids)?;
        info!(
            "Read {} values from {}",
            observations.len(),
            file_path.display()
        );
        insert_observations(&mut table, observations);
    }

    let index = ReportedIndex::from_table(&table);
    Ok(LoadedData { table, index })
}
