//! Request builder for the Fitbit heart rate and sleep endpoints.
//!
//! # Overview
//! Builds `HttpRequest` values and parses `HttpResponse` values without
//! touching the network (host-does-IO pattern). Authentication, signing and
//! transport belong to an `HttpDelegate` supplied by the caller.
//!
//! # Design
//! - `FitbitClient` is stateless: base URL, user scope and default API
//!   version are fixed at construction.
//! - Each endpoint is split into `build_*` (validate, produce request) and
//!   `parse_*` (consume response). `FitbitApi` joins the two around a
//!   delegate for callers who want one call per endpoint.
//! - Option maps are replaced by one struct per endpoint; dates accept
//!   chrono values, `YYYY-MM-DD` strings and `today`/`tomorrow`/`yesterday`.

pub mod api;
pub mod client;
pub mod config;
pub mod dates;
pub mod error;
pub mod http;
pub mod types;

pub use api::FitbitApi;
pub use client::FitbitClient;
pub use config::FitbitConfig;
pub use dates::{format_date, format_time, DateSpecifier, TimeSpecifier};
pub use error::ApiError;
pub use http::{ApiVersion, HttpDelegate, HttpMethod, HttpRequest, HttpResponse};
pub use types::{
    DetailLevel, HeartRateDay, HeartRateLog, IntradayOptions, SleepLog, SleepLogFilter,
    SleepLogMeta, SleepLogPage, SleepLogQuery, SortOrder, UserScope,
};
