//! Defines the [`NormalisationConfig`] struct, which describes the models being compared and the
//! rules used to normalise their results.
use crate::id::{ComponentID, ModelID, ScenarioID, ScenarioKey, VariableID, VariantID};
use crate::input::{input_err_msg, read_toml};
use crate::time_resolution::{TimeResolution, Timestamp, hours_of_day, parse_day};
use anyhow::{Context, Result, ensure};
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};
use std::collections::HashSet;
use std::path::Path;

/// The rules used when no configuration file is given
const DEFAULT_CONFIG: &str = include_str!("../data/default_config.toml");

/// A representative day reported by the models
#[derive(PartialEq, Eq, Hash, Copy, Clone, Debug)]
pub enum Season {
    /// The summer representative day
    Summer,
    /// The winter representative day
    Winter,
}

/// Read an optional representative day in `dd.mm.YYYY` format
fn deserialise_day<'de, D>(deserialiser: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let s: Option<String> = Deserialize::deserialize(deserialiser)?;
    s.map(|s| parse_day(&s).map_err(serde::de::Error::custom))
        .transpose()
}

/// A model taking part in the comparison
#[derive(PartialEq, Clone, Debug, Deserialize)]
pub struct ModelInfo {
    /// The ID used for the model in results files
    pub id: ModelID,
    /// The name displayed for the model
    pub name: String,
    /// The colour used for the model in charts
    #[serde(default)]
    pub color: String,
    /// How the model describes its summer representative day
    #[serde(default)]
    pub summer: String,
    /// The date of the summer representative day
    #[serde(default, deserialize_with = "deserialise_day")]
    pub summer_day: Option<NaiveDate>,
    /// How the model describes its winter representative day
    #[serde(default)]
    pub winter: String,
    /// The date of the winter representative day
    #[serde(default, deserialize_with = "deserialise_day")]
    pub winter_day: Option<NaiveDate>,
}

impl ModelInfo {
    /// The date of the representative day for a season, if known
    pub fn day(&self, season: Season) -> Option<NaiveDate> {
        match season {
            Season::Summer => self.summer_day,
            Season::Winter => self.winter_day,
        }
    }

    /// The label of the representative day for a season
    pub fn day_label(&self, season: Season) -> &str {
        match season {
            Season::Summer => &self.summer,
            Season::Winter => &self.winter,
        }
    }

    /// The hourly timestamps of the model's representative days (summer, then winter).
    ///
    /// Empty if the model has no representative days configured.
    pub fn representative_hours(&self) -> Vec<Timestamp> {
        [self.summer_day, self.winter_day]
            .into_iter()
            .flatten()
            .flat_map(hours_of_day)
            .collect()
    }
}

/// The label displayed for a scenario (or one of its variants)
#[derive(PartialEq, Clone, Debug, Deserialize)]
pub struct ScenarioLabel {
    /// The scenario
    pub scenario: ScenarioID,
    /// The variant. If omitted, the label applies to every variant of the scenario.
    #[serde(default)]
    pub variant: Option<VariantID>,
    /// The label to display
    pub label: String,
}

/// A rule for deriving a category from its subcategories when the category wasn't reported
#[derive(PartialEq, Clone, Debug, Deserialize)]
pub struct SubcategoryRule {
    /// The variable the category belongs to
    pub variable: VariableID,
    /// The resolution the rule applies to
    pub time_resolution: TimeResolution,
    /// The aggregate category (e.g. `wind`)
    pub category: ComponentID,
    /// The components summed to give the category (e.g. `wind_on`, `wind_off`)
    pub subcategories: Vec<ComponentID>,
}

/// A rule for splitting the balance of two opposing flows into non-negative net flows
#[derive(PartialEq, Clone, Debug, Deserialize)]
pub struct NetFlowRule {
    /// The variable of the supply side (e.g. `electricity_supply`)
    pub supply_variable: VariableID,
    /// The components on the supply side (e.g. `imports`)
    pub supply_components: Vec<ComponentID>,
    /// The variable of the demand side (e.g. `electricity_consumption`)
    pub demand_variable: VariableID,
    /// The components on the demand side (e.g. `exports`)
    pub demand_components: Vec<ComponentID>,
    /// The component holding a positive balance, under the supply variable
    pub net_positive: ComponentID,
    /// The component holding a negative balance, under the demand variable
    pub net_negative: ComponentID,
    /// The resolutions the rule applies to
    #[serde(default = "default_net_flow_resolutions")]
    pub time_resolutions: Vec<TimeResolution>,
}

fn default_net_flow_resolutions() -> Vec<TimeResolution> {
    vec![TimeResolution::Annual]
}

/// The components summed to give total supply
#[derive(PartialEq, Clone, Debug, Deserialize)]
pub struct TotalRule {
    /// The variable to total
    #[serde(default = "default_total_variable")]
    pub variable: VariableID,
    /// The components included in the total
    pub components: Vec<ComponentID>,
}

fn default_total_variable() -> VariableID {
    "electricity_supply".into()
}

/// Suffixes which models append to variable names for sub-annual values
#[derive(PartialEq, Clone, Debug, Deserialize)]
pub struct VariableSuffixes {
    /// Suffix for typical-day variables
    #[serde(default = "default_typical_day_suffix")]
    pub typical_day: String,
    /// Suffix for hourly variables
    #[serde(default)]
    pub hourly: String,
}

fn default_typical_day_suffix() -> String {
    "_typical_day".to_string()
}

impl Default for VariableSuffixes {
    fn default() -> Self {
        Self {
            typical_day: default_typical_day_suffix(),
            hourly: String::new(),
        }
    }
}

impl VariableSuffixes {
    /// The name of `variable` at the given resolution
    pub fn variable_at(&self, variable: &VariableID, resolution: TimeResolution) -> VariableID {
        let suffix = match resolution {
            TimeResolution::Annual => "",
            TimeResolution::TypicalDay => &self.typical_day,
            TimeResolution::Hourly => &self.hourly,
        };

        if suffix.is_empty() {
            variable.clone()
        } else {
            format!("{variable}{suffix}").into()
        }
    }
}

/// Represents the contents of a normalisation configuration file
#[derive(PartialEq, Clone, Debug, Deserialize)]
pub struct NormalisationConfig {
    /// The models being compared
    #[serde(default)]
    pub models: Vec<ModelInfo>,
    /// Display labels for scenarios. If empty, all reported scenarios are used.
    #[serde(default)]
    pub scenarios: Vec<ScenarioLabel>,
    /// Rules for backfilling categories from their subcategories
    #[serde(default)]
    pub subcategories: Vec<SubcategoryRule>,
    /// Rules for computing net flows
    #[serde(default)]
    pub net_flows: Vec<NetFlowRule>,
    /// The components summed to give total supply, if any
    #[serde(default)]
    pub total_supply: Option<TotalRule>,
    /// Suffixes of sub-annual variable names
    #[serde(default)]
    pub variable_suffixes: VariableSuffixes,
    /// Whether to use the built-in rules for kinds of rule not given in the file
    #[serde(default = "default_use_default_rules")]
    pub default_rules: bool,
}

fn default_use_default_rules() -> bool {
    true
}

impl Default for NormalisationConfig {
    fn default() -> Self {
        // The embedded file is checked by the tests
        toml::from_str(DEFAULT_CONFIG).expect("Invalid default normalisation config")
    }
}

impl NormalisationConfig {
    /// Read a configuration file.
    ///
    /// # Arguments
    ///
    /// * `file_path` - Path to the TOML file
    ///
    /// # Returns
    ///
    /// The validated configuration or an error if the file is invalid
    pub fn from_path(file_path: &Path) -> Result<Self> {
        let mut config: Self = read_toml(file_path)?;
        config.finish().with_context(|| input_err_msg(file_path))?;

        Ok(config)
    }

    /// Parse a configuration from a TOML string
    pub fn from_toml_str(toml_str: &str) -> Result<Self> {
        let mut config: Self = toml::from_str(toml_str)?;
        config.finish()?;

        Ok(config)
    }

    /// Fill in default rules where requested, then validate
    fn finish(&mut self) -> Result<()> {
        if self.default_rules {
            self.fill_default_rules();
        }

        self.validate()
    }

    /// Use the built-in rules for any kind of rule the file doesn't specify
    fn fill_default_rules(&mut self) {
        let defaults = Self::default();
        if self.subcategories.is_empty() {
            self.subcategories = defaults.subcategories;
        }
        if self.net_flows.is_empty() {
            self.net_flows = defaults.net_flows;
        }
        if self.total_supply.is_none() {
            self.total_supply = defaults.total_supply;
        }
    }

    /// Check that the configuration is consistent
    fn validate(&self) -> Result<()> {
        let mut model_ids = HashSet::new();
        for model in &self.models {
            ensure!(
                model_ids.insert(&model.id),
                "Duplicate model ID: {}",
                model.id
            );
        }

        let mut labelled = HashSet::new();
        for label in &self.scenarios {
            ensure!(
                labelled.insert((&label.scenario, &label.variant)),
                "Duplicate label for scenario {}",
                label.scenario
            );
        }

        for rule in &self.subcategories {
            ensure!(
                !rule.subcategories.is_empty(),
                "No subcategories given for category {} of {}",
                rule.category,
                rule.variable
            );
            ensure!(
                !rule.subcategories.contains(&rule.category),
                "Category {} of {} cannot be one of its own subcategories",
                rule.category,
                rule.variable
            );
        }

        for rule in &self.net_flows {
            ensure!(
                !rule.time_resolutions.is_empty(),
                "No time resolutions given for net flow {}",
                rule.net_positive
            );
            ensure!(
                rule.net_positive != rule.net_negative,
                "Net flow components must differ (both are {})",
                rule.net_positive
            );
        }

        Ok(())
    }

    /// Look up a model by ID
    pub fn model(&self, id: &ModelID) -> Option<&ModelInfo> {
        self.models.iter().find(|model| &model.id == id)
    }

    /// The display label for a scenario variant.
    ///
    /// A label given for the exact variant takes precedence over one given for the whole
    /// scenario.
    pub fn scenario_label(&self, scenario: &ScenarioKey) -> Option<&str> {
        let (scenario_id, variant_id) = scenario;
        let matches = |label: &&ScenarioLabel| &label.scenario == scenario_id;
        self.scenarios
            .iter()
            .filter(matches)
            .find(|label| label.variant.as_ref() == Some(variant_id))
            .or_else(|| {
                self.scenarios
                    .iter()
                    .filter(matches)
                    .find(|label| label.variant.is_none())
            })
            .map(|label| label.label.as_str())
    }
}
