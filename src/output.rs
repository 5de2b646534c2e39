//! The module responsible for writing normalised results to disk.
use crate::table::{CanonicalTable, Key};
use crate::time_resolution::TimeResolution;
use anyhow::{Context, Result, ensure};
use serde::Serialize;
use std::fs;
use std::path::Path;

/// The output file name for the normalised results
pub const OUTPUT_FILE_NAME: &str = "normalised.csv";

/// Create the output directory.
///
/// # Arguments
///
/// * `output_dir` - The directory to create
/// * `allow_overwrite` - Whether to delete the contents of the directory if it already exists
pub fn create_output_directory(output_dir: &Path, allow_overwrite: bool) -> Result<()> {
    if output_dir.is_dir() {
        let is_empty = output_dir
            .read_dir()
            .with_context(|| format!("Could not read {}", output_dir.display()))?
            .next()
            .is_none();
        if is_empty {
            return Ok(());
        }

        ensure!(
            allow_overwrite,
            "Output folder {} already exists and is not empty. Use --overwrite to replace it.",
            output_dir.display()
        );
        fs::remove_dir_all(output_dir)?;
    }

    // Try to create the directory, with parents
    fs::create_dir_all(output_dir)?;

    Ok(())
}

/// Represents a row in the normalised results CSV file.
///
/// The columns are a subset of those in the results files, so the output can be read back in.
#[derive(Serialize, Debug, PartialEq)]
struct NormalisedRow {
    scenario_name: String,
    scenario_variant: String,
    model: String,
    variable: String,
    use_technology_fuel: String,
    time_resolution: TimeResolution,
    timestamp: String,
    value: f64,
    unit: String,
}

impl NormalisedRow {
    /// Create a new [`NormalisedRow`]
    fn new(key: &Key, value: f64, unit: String) -> Self {
        Self {
            scenario_name: key.scenario.to_string(),
            scenario_variant: key.variant.to_string(),
            model: key.model.to_string(),
            variable: key.variable.to_string(),
            use_technology_fuel: key.component.to_string(),
            time_resolution: key.resolution,
            timestamp: key.timestamp.to_string(),
            value,
            unit,
        }
    }
}

/// Write a canonical table to a CSV file, in the table's order
pub fn write_table(table: &CanonicalTable, file_path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(file_path)
        .with_context(|| format!("Could not create {}", file_path.display()))?;
    for (key, entry) in table.iter() {
        writer.serialize(NormalisedRow::new(key, entry.value, entry.unit.to_string()))?;
    }
    writer.flush()?;

    Ok(())
}
