//! Aggregations of normalised results used to build comparison charts.
//!
//! Charts group related components together (e.g. all thermal power plants). Category totals
//! give annual values per group for bar and distribution charts; stacked profiles give the
//! hourly values per group of a representative day, with supply stacked above zero and
//! consumption below.
use crate::config::Season;
use crate::id::{ComponentID, ModelID, ScenarioKey, VariableID};
use crate::normalise::NormalisedData;
use crate::table::{Value, sum_reported};
use crate::time_resolution::{TimeResolution, Timestamp, hours_of_day};
use log::warn;

/// A named group of components shown as one category in a chart
#[derive(PartialEq, Clone, Debug)]
pub struct ComponentGroup {
    /// The name of the group (e.g. `Thermal`)
    pub name: String,
    /// The components belonging to the group
    pub components: Vec<ComponentID>,
}

impl ComponentGroup {
    /// Create a new [`ComponentGroup`]
    pub fn new<I, C>(name: &str, components: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<ComponentID>,
    {
        Self {
            name: name.to_string(),
            components: components.into_iter().map(Into::into).collect(),
        }
    }
}

/// The annual value of a group of components for one model and scenario variant
#[derive(PartialEq, Clone, Debug)]
pub struct CategoryTotal {
    /// The scenario and variant
    pub scenario: ScenarioKey,
    /// The model
    pub model: ModelID,
    /// The name of the group
    pub group: String,
    /// The sum of the group's reported components, absent if none were reported
    pub value: Value,
}

/// Sum groups of components of a variable in a given year.
///
/// Values are given for each model with results and each of its selected scenario variants.
pub fn category_totals(
    data: &NormalisedData,
    variable: &VariableID,
    year: u32,
    groups: &[ComponentGroup],
) -> Vec<CategoryTotal> {
    let mut totals = Vec::new();
    for model in data.models() {
        for scenario in data.selected_scenarios(model) {
            for group in groups {
                let value = sum_reported(group.components.iter().map(|component| {
                    data.lookup_value(
                        scenario,
                        model,
                        variable,
                        component,
                        TimeResolution::Annual,
                        Timestamp::Year(year),
                    )
                }));
                totals.push(CategoryTotal {
                    scenario: scenario.clone(),
                    model: model.clone(),
                    group: group.name.clone(),
                    value,
                });
            }
        }
    }

    totals
}

/// The value of a group in one hour of a representative day
#[derive(PartialEq, Clone, Debug)]
pub struct ProfilePoint {
    /// The scenario and variant
    pub scenario: ScenarioKey,
    /// The model
    pub model: ModelID,
    /// The name of the group
    pub group: String,
    /// The hour of the day (0 to 23)
    pub hour: u32,
    /// The value, negative for consumption groups
    pub value: f64,
}

/// The groups stacked on one side of a profile, together with the variable they belong to
#[derive(Clone, Copy, Debug)]
pub struct StackedSide<'a> {
    /// The annual name of the variable (e.g. `electricity_supply`)
    pub variable: &'a VariableID,
    /// The groups on this side
    pub groups: &'a [ComponentGroup],
}

/// Build the hourly stacked profile of a season's representative day.
///
/// Supply groups give the sum of their components and consumption groups the negated sum.
/// Components which weren't reported count as zero. Models with no representative day
/// configured for the season are left out.
pub fn stacked_profile(
    data: &NormalisedData,
    season: Season,
    supply: StackedSide,
    consumption: StackedSide,
) -> Vec<ProfilePoint> {
    let suffixes = &data.config().variable_suffixes;
    let sides = [(supply, 1.0), (consumption, -1.0)].map(|(side, sign)| {
        (
            suffixes.variable_at(side.variable, TimeResolution::TypicalDay),
            side.groups,
            sign,
        )
    });

    let mut points = Vec::new();
    for model in data.models() {
        let Some(day) = data.model_info(model).and_then(|info| info.day(season)) else {
            warn!("No {season:?} representative day configured for model {model}");
            continue;
        };

        for scenario in data.selected_scenarios(model) {
            for (variable, groups, sign) in &sides {
                for group in *groups {
                    for (hour, timestamp) in (0..).zip(hours_of_day(day)) {
                        let value: f64 = group
                            .components
                            .iter()
                            .map(|component| {
                                data.lookup_value(
                                    scenario,
                                    model,
                                    variable,
                                    component,
                                    TimeResolution::TypicalDay,
                                    timestamp,
                                )
                                .or_zero()
                            })
                            .sum();
                        points.push(ProfilePoint {
                            scenario: scenario.clone(),
                            model: model.clone(),
                            group: group.name.clone(),
                            hour,
                            value: sign * value,
                        });
                    }
                }
            }
        }
    }

    points
}
