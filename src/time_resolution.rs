//! Time resolutions and the timestamps reported at each of them.
//!
//! Annual results are reported once per year, while sub-annual results are reported per hour of a
//! representative ("typical") day or per hour of the year.
use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use serde_string_enum::{DeserializeLabeledStringEnum, SerializeLabeledStringEnum};
use std::fmt;

/// The format of a representative day, e.g. `02.07.2050`
pub const DATE_FORMAT: &str = "%d.%m.%Y";

/// The format of a sub-annual timestamp, e.g. `02.07.2050 13:00`
pub const DATE_TIME_FORMAT: &str = "%d.%m.%Y %H:%M";

/// The number of hourly timestamps in a representative day
pub const HOURS_PER_DAY: i64 = 24;

/// The granularity at which a value is reported
#[derive(
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Copy,
    Clone,
    Debug,
    SerializeLabeledStringEnum,
    DeserializeLabeledStringEnum,
)]
pub enum TimeResolution {
    /// One value per year
    #[string = "annual"]
    Annual,
    /// One value per hour of a representative day
    #[string = "typical-day"]
    TypicalDay,
    /// One value per hour of the year
    #[string = "hourly"]
    Hourly,
}

impl TimeResolution {
    /// Whether values at this resolution are reported more often than once a year
    pub fn is_sub_annual(self) -> bool {
        self != Self::Annual
    }
}

/// The point in time a value refers to
#[derive(PartialEq, Eq, Hash, PartialOrd, Ord, Copy, Clone, Debug)]
pub enum Timestamp {
    /// A calendar year, used for annual values
    Year(u32),
    /// An hour within the year, used for sub-annual values
    Hour(NaiveDateTime),
}

impl Timestamp {
    /// Parse a timestamp as written in a results file.
    ///
    /// Annual timestamps are years. Sub-annual timestamps are dates with an optional time of day
    /// (e.g. `02.07.2050` or `02.07.2050 13:00`); a bare date refers to its first hour.
    ///
    /// # Arguments
    ///
    /// * `s` - The timestamp string
    /// * `resolution` - The resolution of the value the timestamp belongs to
    pub fn parse(s: &str, resolution: TimeResolution) -> Result<Self> {
        let s = s.trim();
        if resolution == TimeResolution::Annual {
            let year = s
                .parse()
                .with_context(|| format!("Invalid year for annual value: '{s}'"))?;
            return Ok(Self::Year(year));
        }

        if let Ok(hour) = NaiveDateTime::parse_from_str(s, DATE_TIME_FORMAT) {
            return Ok(Self::Hour(hour));
        }

        let date = NaiveDate::parse_from_str(s, DATE_FORMAT)
            .with_context(|| format!("Invalid timestamp for {resolution} value: '{s}'"))?;
        Ok(Self::Hour(date.and_time(chrono::NaiveTime::MIN)))
    }

    /// The year, if this is an annual timestamp
    pub fn year(&self) -> Option<u32> {
        match self {
            Self::Year(year) => Some(*year),
            Self::Hour(_) => None,
        }
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Year(year) => write!(f, "{year}"),
            Self::Hour(hour) => write!(f, "{}", hour.format(DATE_TIME_FORMAT)),
        }
    }
}

/// Parse a representative day (e.g. `02.07.2050`)
pub fn parse_day(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
        .with_context(|| format!("Invalid representative day '{s}': expected dd.mm.YYYY"))
}

/// Iterate over the hourly timestamps of a representative day
pub fn hours_of_day(day: NaiveDate) -> impl Iterator<Item = Timestamp> {
    let start = day.and_time(chrono::NaiveTime::MIN);
    (0..HOURS_PER_DAY).map(move |hour| Timestamp::Hour(start + TimeDelta::hours(hour)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::assert_error;
    use rstest::rstest;

    fn hour(day: u32, month: u32, h: u32) -> Timestamp {
        Timestamp::Hour(
            NaiveDate::from_ymd_opt(2050, month, day)
                .unwrap()
                .and_hms_opt(h, 0, 0)
                .unwrap(),
        )
    }

    #[rstest]
    #[case("2050", TimeResolution::Annual, Timestamp::Year(2050))]
    #[case(" 2035 ", TimeResolution::Annual, Timestamp::Year(2035))]
    #[case("02.07.2050 13:00", TimeResolution::TypicalDay, hour(2, 7, 13))]
    #[case("02.07.2050", TimeResolution::TypicalDay, hour(2, 7, 0))]
    #[case("08.02.2050 23:00", TimeResolution::Hourly, hour(8, 2, 23))]
    fn test_timestamp_parse(
        #[case] input: &str,
        #[case] resolution: TimeResolution,
        #[case] expected: Timestamp,
    ) {
        assert_eq!(Timestamp::parse(input, resolution).unwrap(), expected);
    }

    #[rstest]
    #[case("20x0", TimeResolution::Annual, "Invalid year for annual value: '20x0'")]
    #[case(
        "2050",
        TimeResolution::TypicalDay,
        "Invalid timestamp for typical-day value: '2050'"
    )]
    fn test_timestamp_parse_invalid(
        #[case] input: &str,
        #[case] resolution: TimeResolution,
        #[case] msg: &str,
    ) {
        assert_error!(Timestamp::parse(input, resolution), msg);
    }

    #[test]
    fn test_timestamp_display_round_trip() {
        let ts = hour(2, 7, 13);
        assert_eq!(ts.to_string(), "02.07.2050 13:00");
        assert_eq!(
            Timestamp::parse(&ts.to_string(), TimeResolution::TypicalDay).unwrap(),
            ts
        );
        assert_eq!(Timestamp::Year(2050).to_string(), "2050");
    }

    #[rstest]
    #[case(TimeResolution::Annual, "annual")]
    #[case(TimeResolution::TypicalDay, "typical-day")]
    #[case(TimeResolution::Hourly, "hourly")]
    fn test_time_resolution_display(#[case] resolution: TimeResolution, #[case] label: &str) {
        assert_eq!(resolution.to_string(), label);
    }

    #[test]
    fn test_hours_of_day() {
        let hours: Vec<_> = hours_of_day(parse_day("02.07.2050").unwrap()).collect();
        assert_eq!(hours.len(), 24);
        assert_eq!(hours[0], hour(2, 7, 0));
        assert_eq!(hours[23], hour(2, 7, 23));
    }

    #[test]
    fn test_parse_day_invalid() {
        assert_error!(
            parse_day("Jul 02"),
            "Invalid representative day 'Jul 02': expected dd.mm.YYYY"
        );
    }
}
