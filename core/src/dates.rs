//! Date and time arguments as the Fitbit API expects them.
//!
//! Dates go over the wire as `YYYY-MM-DD`, times as `HH:mm`. Callers may pass
//! chrono values, the tokens `today` / `tomorrow` / `yesterday`, or strings
//! already in wire form. Sentinels are resolved against the local calendar
//! when the request is built.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Days, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ApiError;

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M";

/// A calendar date, either explicit or relative to today.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateSpecifier {
    Today,
    Tomorrow,
    Yesterday,
    On(NaiveDate),
}

impl DateSpecifier {
    /// Resolve against an explicit "today".
    pub fn resolve_on(self, today: NaiveDate) -> NaiveDate {
        match self {
            DateSpecifier::Today => today,
            DateSpecifier::Tomorrow => today + Days::new(1),
            DateSpecifier::Yesterday => today - Days::new(1),
            DateSpecifier::On(date) => date,
        }
    }

    /// Resolve against the local clock.
    pub fn resolve(self) -> NaiveDate {
        self.resolve_on(Local::now().date_naive())
    }

    /// `YYYY-MM-DD`, resolved against the local clock.
    pub fn formatted(self) -> String {
        self.resolve().format(DATE_FORMAT).to_string()
    }

    pub fn format_on(self, today: NaiveDate) -> String {
        self.resolve_on(today).format(DATE_FORMAT).to_string()
    }
}

impl FromStr for DateSpecifier {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s {
            "today" => return Ok(DateSpecifier::Today),
            "tomorrow" => return Ok(DateSpecifier::Tomorrow),
            "yesterday" => return Ok(DateSpecifier::Yesterday),
            _ => {}
        }
        // chrono's %Y happily reads "202" as a year, so check the shape first.
        let bytes = s.as_bytes();
        let well_formed = bytes.len() == 10
            && bytes.iter().enumerate().all(|(i, b)| match i {
                4 | 7 => *b == b'-',
                _ => b.is_ascii_digit(),
            });
        if !well_formed {
            return Err(ApiError::invalid(format!(
                "invalid date {s:?}: expected YYYY-MM-DD, today, tomorrow or yesterday"
            )));
        }
        NaiveDate::parse_from_str(s, DATE_FORMAT)
            .map(DateSpecifier::On)
            .map_err(|e| ApiError::invalid(format!("invalid date {s:?}: {e}")))
    }
}

impl fmt::Display for DateSpecifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateSpecifier::Today => f.write_str("today"),
            DateSpecifier::Tomorrow => f.write_str("tomorrow"),
            DateSpecifier::Yesterday => f.write_str("yesterday"),
            DateSpecifier::On(date) => write!(f, "{}", date.format(DATE_FORMAT)),
        }
    }
}

impl Serialize for DateSpecifier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DateSpecifier {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

/// A time of day, sent as `HH:mm`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSpecifier(pub NaiveTime);

impl FromStr for TimeSpecifier {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        NaiveTime::parse_from_str(s, TIME_FORMAT)
            .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
            .map(|t| TimeSpecifier(t.with_second(0).unwrap_or(t)))
            .map_err(|_| ApiError::invalid(format!("invalid time {s:?}: expected HH:mm")))
    }
}

impl fmt::Display for TimeSpecifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(TIME_FORMAT))
    }
}

impl Serialize for TimeSpecifier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TimeSpecifier {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

/// Anything a build method accepts in a date position.
pub trait IntoDateSpecifier {
    fn into_date_specifier(self) -> Result<DateSpecifier, ApiError>;
}

impl IntoDateSpecifier for DateSpecifier {
    fn into_date_specifier(self) -> Result<DateSpecifier, ApiError> {
        Ok(self)
    }
}

impl IntoDateSpecifier for &DateSpecifier {
    fn into_date_specifier(self) -> Result<DateSpecifier, ApiError> {
        Ok(*self)
    }
}

impl IntoDateSpecifier for &str {
    fn into_date_specifier(self) -> Result<DateSpecifier, ApiError> {
        self.parse()
    }
}

impl IntoDateSpecifier for String {
    fn into_date_specifier(self) -> Result<DateSpecifier, ApiError> {
        self.parse()
    }
}

impl IntoDateSpecifier for &String {
    fn into_date_specifier(self) -> Result<DateSpecifier, ApiError> {
        self.parse()
    }
}

impl IntoDateSpecifier for NaiveDate {
    fn into_date_specifier(self) -> Result<DateSpecifier, ApiError> {
        Ok(DateSpecifier::On(self))
    }
}

impl IntoDateSpecifier for NaiveDateTime {
    fn into_date_specifier(self) -> Result<DateSpecifier, ApiError> {
        Ok(DateSpecifier::On(self.date()))
    }
}

impl<Tz: TimeZone> IntoDateSpecifier for DateTime<Tz> {
    fn into_date_specifier(self) -> Result<DateSpecifier, ApiError> {
        Ok(DateSpecifier::On(self.date_naive()))
    }
}

/// Anything a build method accepts in a time position.
pub trait IntoTimeSpecifier {
    fn into_time_specifier(self) -> Result<TimeSpecifier, ApiError>;
}

impl IntoTimeSpecifier for TimeSpecifier {
    fn into_time_specifier(self) -> Result<TimeSpecifier, ApiError> {
        Ok(self)
    }
}

impl IntoTimeSpecifier for &str {
    fn into_time_specifier(self) -> Result<TimeSpecifier, ApiError> {
        self.parse()
    }
}

impl IntoTimeSpecifier for String {
    fn into_time_specifier(self) -> Result<TimeSpecifier, ApiError> {
        self.parse()
    }
}

impl IntoTimeSpecifier for NaiveTime {
    fn into_time_specifier(self) -> Result<TimeSpecifier, ApiError> {
        Ok(TimeSpecifier(self))
    }
}

impl IntoTimeSpecifier for NaiveDateTime {
    fn into_time_specifier(self) -> Result<TimeSpecifier, ApiError> {
        Ok(TimeSpecifier(self.time()))
    }
}

/// Resolve and render a date argument as `YYYY-MM-DD`.
pub fn format_date(date: impl IntoDateSpecifier) -> Result<String, ApiError> {
    Ok(date.into_date_specifier()?.formatted())
}

/// Render a time argument as `HH:mm`.
pub fn format_time(time: impl IntoTimeSpecifier) -> Result<String, ApiError> {
    Ok(time.into_time_specifier()?.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn explicit_date_is_returned_unchanged() {
        assert_eq!(format_date("2020-03-21").unwrap(), "2020-03-21");
        assert_eq!(format_date(day(2019, 12, 31)).unwrap(), "2019-12-31");
    }

    #[test]
    fn sentinels_resolve_relative_to_today() {
        let today = day(2024, 3, 1);
        assert_eq!(DateSpecifier::Today.format_on(today), "2024-03-01");
        assert_eq!(DateSpecifier::Yesterday.format_on(today), "2024-02-29");
        assert_eq!(DateSpecifier::Tomorrow.format_on(today), "2024-03-02");
    }

    #[test]
    fn sentinel_tokens_parse() {
        assert_eq!("today".parse::<DateSpecifier>().unwrap(), DateSpecifier::Today);
        assert_eq!(" yesterday ".parse::<DateSpecifier>().unwrap(), DateSpecifier::Yesterday);
        assert_eq!("tomorrow".parse::<DateSpecifier>().unwrap(), DateSpecifier::Tomorrow);
    }

    #[test]
    fn format_date_today_uses_local_clock() {
        let expected = Local::now().date_naive().format("%Y-%m-%d").to_string();
        assert_eq!(format_date("today").unwrap(), expected);
    }

    #[test]
    fn short_year_is_rejected() {
        let err = "202-03-21".parse::<DateSpecifier>().unwrap_err();
        assert!(matches!(err, ApiError::InvalidArgument(_)));
    }

    #[test]
    fn impossible_date_is_rejected() {
        assert!(matches!(
            format_date("2021-02-30").unwrap_err(),
            ApiError::InvalidArgument(_)
        ));
        assert!(format_date("last tuesday").is_err());
    }

    #[test]
    fn datetime_uses_its_date_part() {
        let dt = day(2021, 6, 5).and_hms_opt(23, 59, 0).unwrap();
        assert_eq!(format_date(dt).unwrap(), "2021-06-05");
    }

    #[test]
    fn time_formats_as_hours_and_minutes() {
        assert_eq!(format_time("07:05").unwrap(), "07:05");
        assert_eq!(format_time("07:05:59").unwrap(), "07:05");
        assert_eq!(format_time(NaiveTime::from_hms_opt(22, 30, 0).unwrap()).unwrap(), "22:30");
        assert!(format_time("25:00").is_err());
    }

    #[test]
    fn date_specifier_deserializes_from_json_string() {
        let d: DateSpecifier = serde_json::from_str(r#""2020-01-02""#).unwrap();
        assert_eq!(d, DateSpecifier::On(day(2020, 1, 2)));
        assert!(serde_json::from_str::<DateSpecifier>(r#""01/02/2020""#).is_err());
    }
}
