//! Fixtures for tests

use crate::config::NormalisationConfig;
use crate::input::LoadedData;
use crate::table::{CanonicalTable, Entry, Key, ReportedIndex};
use crate::time_resolution::{TimeResolution, Timestamp};
use crate::units::CanonicalUnit;
use chrono::NaiveDate;
use rstest::fixture;

/// Assert that an error with the given message occurs
macro_rules! assert_error {
    ($result:expr, $msg:expr) => {
        assert_eq!(
            $result.unwrap_err().chain().next().unwrap().to_string(),
            $msg
        );
    };
}
pub(crate) use assert_error;

/// The key of an annual value for scenario `s`, variant `ref`
pub fn annual_key(model: &str, variable: &str, component: &str, year: u32) -> Key {
    Key {
        scenario: "s".into(),
        variant: "ref".into(),
        model: model.into(),
        variable: variable.into(),
        component: component.into(),
        resolution: TimeResolution::Annual,
        timestamp: Timestamp::Year(year),
    }
}

/// The key of a typical-day value in 2050 for scenario `s`, variant `ref`
pub fn typical_day_key(
    model: &str,
    variable: &str,
    component: &str,
    day: u32,
    month: u32,
    hour: u32,
) -> Key {
    let timestamp = NaiveDate::from_ymd_opt(2050, month, day)
        .and_then(|date| date.and_hms_opt(hour, 0, 0))
        .unwrap();

    Key {
        resolution: TimeResolution::TypicalDay,
        timestamp: Timestamp::Hour(timestamp),
        ..annual_key(model, variable, component, 2050)
    }
}

/// An energy value in `TWh`
pub fn energy(value: f64) -> Entry {
    Entry {
        value,
        unit: CanonicalUnit::TerawattHours,
    }
}

/// Build loaded data from already converted values.
///
/// Annual values are in `TWh` and sub-annual values in `GW`.
pub fn loaded(rows: &[(Key, f64)]) -> LoadedData {
    let mut table = CanonicalTable::new();
    for (key, value) in rows {
        let unit = if key.resolution.is_sub_annual() {
            CanonicalUnit::Gigawatts
        } else {
            CanonicalUnit::TerawattHours
        };
        table.insert(key.clone(), Entry { value: *value, unit });
    }

    let index = ReportedIndex::from_table(&table);
    LoadedData { table, index }
}

/// A small set of rules without the built-in defaults
#[fixture]
pub fn rules_config() -> NormalisationConfig {
    NormalisationConfig::from_toml_str(
        r#"
        default_rules = false

        [[subcategories]]
        variable = "electricity_supply"
        time_resolution = "annual"
        category = "wind"
        subcategories = ["wind_on", "wind_off"]

        [[subcategories]]
        variable = "electricity_supply_typical_day"
        time_resolution = "typical-day"
        category = "wind"
        subcategories = ["wind_on", "wind_off"]

        [[net_flows]]
        supply_variable = "electricity_supply"
        supply_components = ["imports"]
        demand_variable = "electricity_consumption"
        demand_components = ["exports"]
        net_positive = "net_imports"
        net_negative = "net_exports"

        [total_supply]
        components = ["hydro_dam", "spv", "wind", "net_imports"]
        "#,
    )
    .unwrap()
}
