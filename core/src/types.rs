//! Option sets, request payloads and response shapes.
//!
//! # Design
//! Each endpoint takes its own struct listing exactly the options it
//! understands. All of them deserialize from a JSON object so callers holding
//! an option map can convert with `serde_json::from_value`. Structs that feed
//! validated endpoints reject unknown keys; `SleepLogFilter` is a whitelist
//! and silently drops them.
//!
//! Required fields of `HeartRateLog` and `SleepLogQuery` are modelled as
//! `Option` so that a missing field is reported by the build step as
//! `ApiError::InvalidArgument` rather than by the deserializer. Converting
//! with `TryFrom<Value>` instead of `serde_json::from_value` also reports a
//! malformed value (an unknown key, `"sort": "up"`) as `InvalidArgument`.

use std::fmt;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::dates::{DateSpecifier, TimeSpecifier};
use crate::error::ApiError;

/// Whose data a path refers to.
///
/// Fitbit accepts `-` as "the user the access token belongs to".
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum UserScope {
    #[default]
    CurrentUser,
    ExplicitId(String),
}

impl UserScope {
    pub fn as_path_segment(&self) -> &str {
        match self {
            UserScope::CurrentUser => "-",
            UserScope::ExplicitId(id) => id,
        }
    }
}

impl fmt::Display for UserScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_path_segment())
    }
}

impl From<&str> for UserScope {
    fn from(s: &str) -> Self {
        match s.trim() {
            "" | "-" => UserScope::CurrentUser,
            id => UserScope::ExplicitId(id.to_string()),
        }
    }
}

/// Sort direction for the paginated sleep log list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

impl FromStr for SortOrder {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(ApiError::invalid(format!(
                "sort must be \"asc\" or \"desc\", got {other:?}"
            ))),
        }
    }
}

impl Serialize for SortOrder {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for SortOrder {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

/// Resolution of intraday heart rate data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DetailLevel {
    #[serde(rename = "1sec")]
    OneSecond,
    #[serde(rename = "1min")]
    OneMinute,
}

impl DetailLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            DetailLevel::OneSecond => "1sec",
            DetailLevel::OneMinute => "1min",
        }
    }
}

/// Options for `heart_rate_on_intraday`. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IntradayOptions {
    pub start_date: Option<DateSpecifier>,
    pub end_date: Option<DateSpecifier>,
    pub detail_level: Option<DetailLevel>,
    pub start_time: Option<TimeSpecifier>,
    pub end_time: Option<TimeSpecifier>,
}

/// A heart rate measurement to log. `tracker`, `heart_rate` and `date` are
/// required.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HeartRateLog {
    /// Predefined or custom tracker name, as shown on the Fitbit website.
    pub tracker: Option<String>,
    pub heart_rate: Option<u32>,
    pub date: Option<DateSpecifier>,
    pub time: Option<TimeSpecifier>,
}

impl HeartRateLog {
    pub fn new(tracker: impl Into<String>, heart_rate: u32, date: DateSpecifier) -> Self {
        Self {
            tracker: Some(tracker.into()),
            heart_rate: Some(heart_rate),
            date: Some(date),
            time: None,
        }
    }

    pub fn at(mut self, time: TimeSpecifier) -> Self {
        self.time = Some(time);
        self
    }
}

/// Validated query for the paginated sleep log list (API 1.2).
///
/// One of `before_date` / `after_date`, plus `sort` and `limit` are required.
/// The offset is always sent as 0.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct SleepLogQuery {
    pub before_date: Option<DateSpecifier>,
    pub after_date: Option<DateSpecifier>,
    pub sort: Option<SortOrder>,
    pub limit: Option<u32>,
}

/// Unvalidated filter for the sleep log list. Keys other than these are
/// dropped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SleepLogFilter {
    #[serde(alias = "beforeDate")]
    pub before_date: Option<DateSpecifier>,
    #[serde(alias = "afterDate")]
    pub after_date: Option<DateSpecifier>,
    pub sort: Option<SortOrder>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl SleepLogFilter {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

macro_rules! try_from_options {
    ($($ty:ty),*) => {$(
        impl TryFrom<Value> for $ty {
            type Error = ApiError;

            fn try_from(value: Value) -> Result<Self, Self::Error> {
                serde_json::from_value(value).map_err(|e| ApiError::invalid(e.to_string()))
            }
        }
    )*};
}

try_from_options!(IntradayOptions, HeartRateLog, SleepLogQuery, SleepLogFilter, SleepLog);

/// A sleep period to log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SleepLog {
    #[serde(alias = "start_time")]
    pub start_time: TimeSpecifier,
    /// Milliseconds.
    pub duration: u64,
    pub date: DateSpecifier,
}

/// Daily heart rate logs: per-tracker averages and the individual entries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HeartRateDay {
    #[serde(default)]
    pub average: Vec<HeartRateAverage>,
    #[serde(default)]
    pub heart: Vec<HeartRateEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeartRateAverage {
    pub heart_rate: f64,
    pub tracker: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeartRateEntry {
    pub heart_rate: f64,
    pub log_id: u64,
    pub tracker: String,
    #[serde(default)]
    pub time: Option<String>,
}

/// One page of the sleep log list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SleepLogPage {
    #[serde(default)]
    pub sleep: Vec<Value>,
    #[serde(default)]
    pub pagination: Option<Value>,
    #[serde(default)]
    pub meta: Option<SleepLogMeta>,
}

impl SleepLogPage {
    /// True while Fitbit is still processing logs that belong in this page.
    pub fn is_pending(&self) -> bool {
        self.meta.as_ref().is_some_and(SleepLogMeta::is_pending)
    }
}

/// Processing status attached to a sleep log page. Fitbit may add fields at
/// any time; they are kept in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SleepLogMeta {
    /// Milliseconds to wait before asking again.
    pub retry_duration: Option<u64>,
    pub state: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SleepLogMeta {
    pub fn is_pending(&self) -> bool {
        self.state.as_deref() == Some("pending")
    }
}
