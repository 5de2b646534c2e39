//! Normalisation of results from multiple energy-system models, so that they can be compared.
//!
//! Results are read from long-format CSV files into a canonical table, converted to common units
//! and completed with derived values (aggregate categories, net flows and total supply). The
//! normalised results can then be queried to build comparison charts.
#![warn(missing_docs)]
use std::path::PathBuf;

pub mod aggregate;
pub mod cli;
pub mod config;
pub mod id;
pub mod input;
pub mod log;
pub mod normalise;
pub mod output;
pub mod settings;
pub mod table;
pub mod time_resolution;
pub mod units;

#[cfg(test)]
mod fixture;

/// Get the config folder for the program.
///
/// This is where the settings file is read from.
pub fn get_config_dir() -> PathBuf {
    let Some(mut config_dir) = dirs::config_dir() else {
        panic!("Could not get path to config dir")
    };

    config_dir.push("cross_compare");
    config_dir
}
