//! Conversion of reported values into the common units used for comparison.
//!
//! Models report results in a variety of units (`GWh`, `MWh`, `GJ`, ...). Annual values are
//! converted to `TWh`, `MtCO2`, `GW`, `BCHF` or `CHF/tCO2` and sub-annual values to `GW`. Units
//! are matched case-insensitively.
use crate::table::Value;
use crate::time_resolution::TimeResolution;
use derive_more::Display;
use unicase::UniCase;

/// A unit in which normalised values are expressed
#[derive(PartialEq, Eq, Hash, Copy, Clone, Debug, Display)]
pub enum CanonicalUnit {
    /// Energy
    #[display("TWh")]
    TerawattHours,
    /// Emissions
    #[display("MtCO2")]
    MegatonnesCO2,
    /// Power or capacity
    #[display("GW")]
    Gigawatts,
    /// Costs
    #[display("BCHF")]
    BillionCHF,
    /// Intensive prices, passed through unchanged
    #[display("CHF/tCO2")]
    CHFPerTonneCO2,
}

/// How to convert a reported unit into its canonical unit
#[derive(PartialEq, Copy, Clone, Debug)]
pub struct Conversion {
    /// Multiplier to apply to the reported value
    pub factor: f64,
    /// The unit of the converted value
    pub unit: CanonicalUnit,
}

const fn conversion(factor: f64, unit: CanonicalUnit) -> Conversion {
    Conversion { factor, unit }
}

/// Units recognised for annual values
const ANNUAL_CONVERSIONS: [(&str, Conversion); 11] = [
    ("TWh", conversion(1.0, CanonicalUnit::TerawattHours)),
    ("GWh", conversion(1e-3, CanonicalUnit::TerawattHours)),
    ("MWh", conversion(1e-6, CanonicalUnit::TerawattHours)),
    ("GJ", conversion(1.0 / 3.6, CanonicalUnit::TerawattHours)),
    ("MtCO2", conversion(1.0, CanonicalUnit::MegatonnesCO2)),
    ("GtCO2", conversion(1000.0, CanonicalUnit::MegatonnesCO2)),
    ("GW", conversion(1.0, CanonicalUnit::Gigawatts)),
    ("MW", conversion(1e-3, CanonicalUnit::Gigawatts)),
    ("BCHF", conversion(1.0, CanonicalUnit::BillionCHF)),
    ("MCHF", conversion(1e-3, CanonicalUnit::BillionCHF)),
    ("CHF/tCO2", conversion(1.0, CanonicalUnit::CHFPerTonneCO2)),
];

/// Units recognised for typical-day and hourly values
const SUB_ANNUAL_CONVERSIONS: [(&str, Conversion); 4] = [
    ("GW", conversion(1.0, CanonicalUnit::Gigawatts)),
    ("GWh/h", conversion(1.0, CanonicalUnit::Gigawatts)),
    ("MW", conversion(1e-3, CanonicalUnit::Gigawatts)),
    ("MWh/h", conversion(1e-3, CanonicalUnit::Gigawatts)),
];

/// Look up how to convert `unit` at the given time resolution.
///
/// Returns `None` if the unit is not recognised for this resolution, in which case values
/// reported in it cannot be used.
pub fn find_conversion(resolution: TimeResolution, unit: &str) -> Option<Conversion> {
    let table: &[(&str, Conversion)] = match resolution {
        TimeResolution::Annual => &ANNUAL_CONVERSIONS,
        TimeResolution::TypicalDay | TimeResolution::Hourly => &SUB_ANNUAL_CONVERSIONS,
    };

    let unit = UniCase::new(unit.trim());
    table
        .iter()
        .find(|(label, _)| UniCase::new(*label) == unit)
        .map(|(_, conversion)| *conversion)
}

/// The multiplier which converts values in `unit` to the canonical unit
pub fn conversion_factor(resolution: TimeResolution, unit: &str) -> Option<f64> {
    find_conversion(resolution, unit).map(|conversion| conversion.factor)
}

/// Convert a reported value, giving [`Value::Absent`] if the unit is unrecognised
pub fn convert(value: f64, resolution: TimeResolution, unit: &str) -> Value {
    match conversion_factor(resolution, unit) {
        Some(factor) => Value::Reported(value * factor),
        None => Value::Absent,
    }
}
