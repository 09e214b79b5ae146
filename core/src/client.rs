//! Stateless request builder and response parser for the Fitbit heart rate
//! and sleep endpoints.
//!
//! # Design
//! `FitbitClient` holds the base URL, the user scope and the default API
//! version, and nothing that changes between calls. Each endpoint is split
//! into a `build_*` method that validates the arguments and produces an
//! `HttpRequest`, and a `parse_*` method that consumes the `HttpResponse`.
//! Validation happens entirely inside `build_*`, so a rejected call never
//! reaches the network.
//!
//! Write endpoints send `application/x-www-form-urlencoded` bodies; query
//! strings use the same encoding.

use log::debug;
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::form_urlencoded;

use crate::config::FitbitConfig;
use crate::dates::IntoDateSpecifier;
use crate::error::ApiError;
use crate::http::{ApiVersion, HttpMethod, HttpRequest, HttpResponse};
use crate::types::{
    HeartRateDay, HeartRateLog, IntradayOptions, SleepLog, SleepLogFilter, SleepLogPage,
    SleepLogQuery, UserScope,
};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Synchronous, stateless client for the heart rate and sleep endpoints.
#[derive(Debug, Clone)]
pub struct FitbitClient {
    base_url: String,
    user: UserScope,
    api_version: ApiVersion,
}

impl Default for FitbitClient {
    fn default() -> Self {
        Self::from_config(&FitbitConfig::default())
    }
}

impl FitbitClient {
    /// Client for the token owner (`-`) at `base_url`.
    pub fn new(base_url: &str) -> Self {
        Self::from_config(&FitbitConfig::new().with_base_url(base_url))
    }

    pub fn from_config(config: &FitbitConfig) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            user: config.user.clone(),
            api_version: config.api_version,
        }
    }

    pub fn with_user(mut self, user: UserScope) -> Self {
        self.user = user;
        self
    }

    pub fn user(&self) -> &UserScope {
        &self.user
    }

    pub fn api_version(&self) -> ApiVersion {
        self.api_version
    }

    // -----------------------------------------------------------------------
    // Heart rate
    // -----------------------------------------------------------------------

    /// `GET /user/{user}/heart/date/{date}.json`
    pub fn build_heart_rate_on_date(
        &self,
        date: impl IntoDateSpecifier,
    ) -> Result<HttpRequest, ApiError> {
        let date = date.into_date_specifier()?.formatted();
        let path = format!("/user/{}/heart/date/{date}.json", self.user);
        Ok(self.request(HttpMethod::Get, self.api_version, path, None))
    }

    /// `GET /user/{user}/heart/date/{segments}.json`
    ///
    /// Segments are appended in the order start date, end date, detail level,
    /// then `time/{start}/{end}` when both times are set. With no options the
    /// path ends in `/heart/date/.json`.
    pub fn build_heart_rate_on_intraday(&self, opts: &IntradayOptions) -> HttpRequest {
        let mut segments = Vec::new();
        if let Some(start_date) = opts.start_date {
            segments.push(start_date.formatted());
        }
        if let Some(end_date) = opts.end_date {
            segments.push(end_date.formatted());
        }
        if let Some(detail_level) = opts.detail_level {
            segments.push(detail_level.as_str().to_string());
        }
        if let (Some(start), Some(end)) = (opts.start_time, opts.end_time) {
            segments.push(format!("time/{start}/{end}"));
        }
        let path = format!("/user/{}/heart/date/{}.json", self.user, segments.join("/"));
        self.request(HttpMethod::Get, self.api_version, path, None)
    }

    /// `POST /user/{user}/heart.json`
    ///
    /// An empty tracker name counts as missing.
    pub fn build_log_heart_rate(&self, entry: &HeartRateLog) -> Result<HttpRequest, ApiError> {
        let (Some(tracker), Some(heart_rate), Some(date)) = (
            entry.tracker.as_deref().filter(|t| !t.is_empty()),
            entry.heart_rate,
            entry.date,
        ) else {
            return Err(ApiError::invalid(
                "must include tracker, heart_rate and date in order to log heart rate data",
            ));
        };
        let mut form = vec![
            ("tracker", tracker.to_string()),
            ("heartRate", heart_rate.to_string()),
            ("date", date.formatted()),
        ];
        if let Some(time) = entry.time {
            form.push(("time", time.to_string()));
        }
        let path = format!("/user/{}/heart.json", self.user);
        Ok(self.request(HttpMethod::Post, self.api_version, path, Some(form.as_slice())))
    }

    /// `DELETE /user/-/heart/{id}.json`
    ///
    /// Always addressed to the token owner, whatever scope the client has.
    pub fn build_delete_heart_rate_log(&self, heart_rate_log_id: u64) -> HttpRequest {
        let path = format!(
            "/user/{}/heart/{heart_rate_log_id}.json",
            UserScope::CurrentUser
        );
        self.request(HttpMethod::Delete, self.api_version, path, None)
    }

    pub fn parse_heart_rate_on_date(&self, response: HttpResponse) -> Result<HeartRateDay, ApiError> {
        parse_json(&response, 200)
    }

    pub fn parse_heart_rate_on_intraday(&self, response: HttpResponse) -> Result<Value, ApiError> {
        parse_json(&response, 200)
    }

    pub fn parse_log_heart_rate(&self, response: HttpResponse) -> Result<Value, ApiError> {
        parse_json(&response, 201)
    }

    pub fn parse_delete_heart_rate_log(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response, 204)
    }

    // -----------------------------------------------------------------------
    // Sleep
    // -----------------------------------------------------------------------

    /// `GET /user/{user}/sleep/date/{date}.json`
    pub fn build_sleep_on_date(&self, date: impl IntoDateSpecifier) -> Result<HttpRequest, ApiError> {
        let date = date.into_date_specifier()?.formatted();
        let path = format!("/user/{}/sleep/date/{date}.json", self.user);
        Ok(self.request(HttpMethod::Get, self.api_version, path, None))
    }

    /// `GET /user/{user}/sleep/date/{start}/{end}.json`
    pub fn build_sleep_on_date_range(
        &self,
        base_date: impl IntoDateSpecifier,
        end_date: impl IntoDateSpecifier,
    ) -> Result<HttpRequest, ApiError> {
        let base_date = base_date.into_date_specifier()?.formatted();
        let end_date = end_date.into_date_specifier()?.formatted();
        let path = format!("/user/{}/sleep/date/{base_date}/{end_date}.json", self.user);
        Ok(self.request(HttpMethod::Get, self.api_version, path, None))
    }

    /// `GET /user/{user}/sleep/list.json?...` against API 1.2.
    ///
    /// Requires a before or after date, a sort order and a limit. The offset
    /// is always 0. Fitbit may answer with `meta.state == "pending"` while it
    /// is still processing logs; see `SleepLogPage::is_pending`.
    pub fn build_sleep_logs(&self, query: &SleepLogQuery) -> Result<HttpRequest, ApiError> {
        if query.before_date.is_none() && query.after_date.is_none() {
            return Err(ApiError::invalid("must specify either beforeDate or afterDate"));
        }
        let Some(sort) = query.sort else {
            return Err(ApiError::invalid(
                "must specify sort order, one of \"asc\" or \"desc\"",
            ));
        };
        let Some(limit) = query.limit else {
            return Err(ApiError::invalid("must specify limit"));
        };

        let mut pairs = Vec::new();
        if let Some(date) = query.before_date {
            pairs.push(("beforeDate", date.formatted()));
        }
        if let Some(date) = query.after_date {
            pairs.push(("afterDate", date.formatted()));
        }
        pairs.push(("sort", sort.as_str().to_string()));
        pairs.push(("limit", limit.to_string()));
        pairs.push(("offset", "0".to_string()));

        let path = format!("/user/{}/sleep/list.json?{}", self.user, encode_pairs(&pairs));
        Ok(self.request(HttpMethod::Get, ApiVersion::V1_2, path, None))
    }

    /// `GET /user/{user}/sleep/list.json[?...]` with whatever filters are set
    /// and no validation, at the client's default API version.
    /// `before_date`/`after_date` go on the wire as `beforeDate`/`afterDate`.
    pub fn build_sleep_logs_lenient(&self, filter: &SleepLogFilter) -> HttpRequest {
        let mut pairs = Vec::new();
        if let Some(date) = filter.before_date {
            pairs.push(("beforeDate", date.formatted()));
        }
        if let Some(date) = filter.after_date {
            pairs.push(("afterDate", date.formatted()));
        }
        if let Some(sort) = filter.sort {
            pairs.push(("sort", sort.as_str().to_string()));
        }
        if let Some(limit) = filter.limit {
            pairs.push(("limit", limit.to_string()));
        }
        if let Some(offset) = filter.offset {
            pairs.push(("offset", offset.to_string()));
        }

        let mut path = format!("/user/{}/sleep/list.json", self.user);
        if !pairs.is_empty() {
            path.push('?');
            path.push_str(&encode_pairs(&pairs));
        }
        self.request(HttpMethod::Get, self.api_version, path, None)
    }

    /// `POST /user/{user}/sleep.json`
    pub fn build_log_sleep(&self, entry: &SleepLog) -> HttpRequest {
        let form = [
            ("startTime", entry.start_time.to_string()),
            ("duration", entry.duration.to_string()),
            ("date", entry.date.formatted()),
        ];
        let path = format!("/user/{}/sleep.json", self.user);
        self.request(HttpMethod::Post, self.api_version, path, Some(&form[..]))
    }

    /// `DELETE /user/{user}/sleep/{id}.json`
    pub fn build_delete_sleep_log(&self, sleep_log_id: u64) -> HttpRequest {
        let path = format!("/user/{}/sleep/{sleep_log_id}.json", self.user);
        self.request(HttpMethod::Delete, self.api_version, path, None)
    }

    pub fn parse_sleep_on_date(&self, response: HttpResponse) -> Result<Value, ApiError> {
        parse_json(&response, 200)
    }

    pub fn parse_sleep_on_date_range(&self, response: HttpResponse) -> Result<Value, ApiError> {
        parse_json(&response, 200)
    }

    pub fn parse_sleep_logs(&self, response: HttpResponse) -> Result<SleepLogPage, ApiError> {
        parse_json(&response, 200)
    }

    pub fn parse_log_sleep(&self, response: HttpResponse) -> Result<Value, ApiError> {
        parse_json(&response, 201)
    }

    pub fn parse_delete_sleep_log(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response, 204)
    }

    fn request(
        &self,
        method: HttpMethod,
        api_version: ApiVersion,
        path: String,
        form: Option<&[(&str, String)]>,
    ) -> HttpRequest {
        let (headers, body) = match form {
            Some(pairs) => (
                vec![("content-type".to_string(), FORM_CONTENT_TYPE.to_string())],
                Some(encode_pairs(pairs)),
            ),
            None => (Vec::new(), None),
        };
        let url = format!("{}/{api_version}{path}", self.base_url);
        debug!("built {method} {url}");
        HttpRequest {
            method,
            api_version,
            path,
            url,
            headers,
            body,
        }
    }
}

/// `key=value` pairs joined with `&`, percent-encoded, in the given order.
fn encode_pairs(pairs: &[(&str, String)]) -> String {
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs.iter().map(|(k, v)| (*k, v.as_str())))
        .finish()
}

fn parse_json<T: DeserializeOwned>(response: &HttpResponse, expected: u16) -> Result<T, ApiError> {
    check_status(response, expected)?;
    serde_json::from_str(&response.body).map_err(|e| ApiError::DeserializationError(e.to_string()))
}

/// Map non-success status codes to the appropriate `ApiError` variant.
fn check_status(response: &HttpResponse, expected: u16) -> Result<(), ApiError> {
    if response.status == expected {
        return Ok(());
    }
    if response.status == 404 {
        return Err(ApiError::NotFound);
    }
    Err(ApiError::HttpError {
        status: response.status,
        body: response.body.clone(),
    })
}

#[cfg(test)]
mod tests {
    use chrono::{Days, Local, NaiveDate, NaiveTime};

    use super::*;
    use crate::dates::{DateSpecifier, TimeSpecifier};
    use crate::types::{DetailLevel, SortOrder};

    fn client() -> FitbitClient {
        FitbitClient::new("http://localhost:3000")
    }

    fn on(y: i32, m: u32, d: u32) -> DateSpecifier {
        DateSpecifier::On(NaiveDate::from_ymd_opt(y, m, d).unwrap())
    }

    fn hm(h: u32, m: u32) -> TimeSpecifier {
        TimeSpecifier(NaiveTime::from_hms_opt(h, m, 0).unwrap())
    }

    fn form(req: &HttpRequest) -> Vec<(String, String)> {
        form_urlencoded::parse(req.body.as_deref().unwrap().as_bytes())
            .into_owned()
            .collect()
    }

    fn response(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            headers: Vec::new(),
            body: body.to_string(),
        }
    }

    #[test]
    fn heart_rate_on_date_produces_correct_request() {
        let req = client().build_heart_rate_on_date("2020-03-21").unwrap();
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.path, "/user/-/heart/date/2020-03-21.json");
        assert_eq!(req.url, "http://localhost:3000/1/user/-/heart/date/2020-03-21.json");
        assert_eq!(req.api_version, ApiVersion::V1);
        assert!(req.body.is_none());
        assert!(req.headers.is_empty());
    }

    #[test]
    fn heart_rate_on_date_rejects_bad_date() {
        let err = client().build_heart_rate_on_date("2020-3-21").unwrap_err();
        assert!(matches!(err, ApiError::InvalidArgument(_)));
    }

    #[test]
    fn intraday_with_no_options_keeps_empty_segment() {
        let req = client().build_heart_rate_on_intraday(&IntradayOptions::default());
        assert_eq!(req.path, "/user/-/heart/date/.json");
    }

    #[test]
    fn intraday_appends_segments_in_order() {
        let opts = IntradayOptions {
            start_date: Some(on(2021, 1, 1)),
            end_date: Some(on(2021, 1, 2)),
            detail_level: Some(DetailLevel::OneMinute),
            start_time: Some(hm(8, 0)),
            end_time: Some(hm(9, 30)),
        };
        let req = client().build_heart_rate_on_intraday(&opts);
        assert_eq!(
            req.path,
            "/user/-/heart/date/2021-01-01/2021-01-02/1min/time/08:00/09:30.json"
        );
    }

    #[test]
    fn intraday_skips_time_window_unless_both_ends_set() {
        let opts = IntradayOptions {
            start_date: Some(on(2021, 1, 1)),
            detail_level: Some(DetailLevel::OneSecond),
            start_time: Some(hm(8, 0)),
            ..IntradayOptions::default()
        };
        let req = client().build_heart_rate_on_intraday(&opts);
        assert_eq!(req.path, "/user/-/heart/date/2021-01-01/1sec.json");
    }

    #[test]
    fn log_heart_rate_renames_and_formats_fields() {
        let entry = HeartRateLog::new("Resting Heart Rate", 62, on(2020, 5, 1)).at(hm(7, 15));
        let req = client().build_log_heart_rate(&entry).unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.path, "/user/-/heart.json");
        assert_eq!(
            req.headers,
            vec![(
                "content-type".to_string(),
                "application/x-www-form-urlencoded".to_string()
            )]
        );
        assert_eq!(
            form(&req),
            vec![
                ("tracker".to_string(), "Resting Heart Rate".to_string()),
                ("heartRate".to_string(), "62".to_string()),
                ("date".to_string(), "2020-05-01".to_string()),
                ("time".to_string(), "07:15".to_string()),
            ]
        );
    }

    #[test]
    fn log_heart_rate_requires_tracker_heart_rate_and_date() {
        let full = HeartRateLog::new("Normal", 70, DateSpecifier::Today);
        for entry in [
            HeartRateLog { tracker: None, ..full.clone() },
            HeartRateLog { tracker: Some(String::new()), ..full.clone() },
            HeartRateLog { heart_rate: None, ..full.clone() },
            HeartRateLog { date: None, ..full.clone() },
        ] {
            let err = client().build_log_heart_rate(&entry).unwrap_err();
            assert!(matches!(err, ApiError::InvalidArgument(_)), "{entry:?}");
        }
    }

    #[test]
    fn delete_heart_rate_log_always_targets_current_user() {
        let client = client().with_user(UserScope::ExplicitId("ABC".into()));
        let req = client.build_delete_heart_rate_log(42);
        assert_eq!(req.method, HttpMethod::Delete);
        assert_eq!(req.path, "/user/-/heart/42.json");
    }

    #[test]
    fn delete_sleep_log_targets_configured_user() {
        let client = client().with_user(UserScope::ExplicitId("ABC".into()));
        let req = client.build_delete_sleep_log(42);
        assert_eq!(req.method, HttpMethod::Delete);
        assert_eq!(req.path, "/user/ABC/sleep/42.json");
    }

    #[test]
    fn sleep_on_date_range_produces_correct_request() {
        let req = client()
            .build_sleep_on_date_range("2020-03-21", "2020-04-21")
            .unwrap();
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.path, "/user/-/sleep/date/2020-03-21/2020-04-21.json");
    }

    #[test]
    fn sleep_on_date_range_resolves_sentinels() {
        let today = Local::now().date_naive();
        let yesterday = today - Days::new(1);
        let req = client().build_sleep_on_date_range("yesterday", "today").unwrap();
        assert_eq!(
            req.path,
            format!(
                "/user/-/sleep/date/{}/{}.json",
                yesterday.format("%Y-%m-%d"),
                today.format("%Y-%m-%d")
            )
        );
    }

    #[test]
    fn sleep_on_date_range_rejects_bad_dates() {
        let c = client();
        assert!(matches!(
            c.build_sleep_on_date_range("202-03-21", "2020-04-21").unwrap_err(),
            ApiError::InvalidArgument(_)
        ));
        assert!(matches!(
            c.build_sleep_on_date_range("2020-03-21", "202-04-21").unwrap_err(),
            ApiError::InvalidArgument(_)
        ));
    }

    #[test]
    fn sleep_logs_forces_offset_and_version() {
        let query = SleepLogQuery {
            before_date: Some(on(2020, 1, 1)),
            sort: Some(SortOrder::Desc),
            limit: Some(10),
            ..SleepLogQuery::default()
        };
        let req = client().build_sleep_logs(&query).unwrap();
        assert_eq!(req.api_version, ApiVersion::V1_2);
        assert_eq!(
            req.path,
            "/user/-/sleep/list.json?beforeDate=2020-01-01&sort=desc&limit=10&offset=0"
        );
        assert!(req.url.starts_with("http://localhost:3000/1.2/user/-/"));
    }

    #[test]
    fn sleep_logs_does_not_change_client_version() {
        let c = client();
        let query = SleepLogQuery {
            after_date: Some(on(2020, 1, 1)),
            sort: Some(SortOrder::Asc),
            limit: Some(5),
            ..SleepLogQuery::default()
        };
        c.build_sleep_logs(&query).unwrap();
        assert_eq!(c.api_version(), ApiVersion::V1);
        let req = c.build_sleep_on_date("2020-01-01").unwrap();
        assert_eq!(req.api_version, ApiVersion::V1);
    }

    #[test]
    fn sleep_logs_requires_date_sort_and_limit() {
        let valid = SleepLogQuery {
            after_date: Some(on(2020, 1, 1)),
            sort: Some(SortOrder::Asc),
            limit: Some(5),
            ..SleepLogQuery::default()
        };
        for query in [
            SleepLogQuery { after_date: None, ..valid.clone() },
            SleepLogQuery { sort: None, ..valid.clone() },
            SleepLogQuery { limit: None, ..valid.clone() },
        ] {
            let err = client().build_sleep_logs(&query).unwrap_err();
            assert!(matches!(err, ApiError::InvalidArgument(_)), "{query:?}");
        }
    }

    #[test]
    fn sleep_logs_lenient_without_filters_has_no_query() {
        let req = client().build_sleep_logs_lenient(&SleepLogFilter::default());
        assert_eq!(req.path, "/user/-/sleep/list.json");
        assert_eq!(req.api_version, ApiVersion::V1);
    }

    #[test]
    fn sleep_logs_lenient_passes_offset_through() {
        let filter = SleepLogFilter {
            after_date: Some(on(2020, 2, 2)),
            offset: Some(20),
            ..SleepLogFilter::default()
        };
        let req = client().build_sleep_logs_lenient(&filter);
        assert_eq!(req.path, "/user/-/sleep/list.json?afterDate=2020-02-02&offset=20");
    }

    #[test]
    fn sleep_logs_lenient_sends_camel_case_date_keys() {
        let filter: SleepLogFilter =
            serde_json::from_value(serde_json::json!({"before_date": "2020-01-01"})).unwrap();
        let req = client().build_sleep_logs_lenient(&filter);
        assert_eq!(req.path, "/user/-/sleep/list.json?beforeDate=2020-01-01");
    }

    #[test]
    fn log_sleep_sends_entry_as_form() {
        let entry = SleepLog {
            start_time: hm(23, 0),
            duration: 28_800_000,
            date: on(2020, 5, 1),
        };
        let req = client().build_log_sleep(&entry);
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.path, "/user/-/sleep.json");
        assert_eq!(
            req.body.as_deref(),
            Some("startTime=23%3A00&duration=28800000&date=2020-05-01")
        );
    }

    #[test]
    fn explicit_user_is_used_in_paths() {
        let c = client().with_user(UserScope::ExplicitId("22ABCD".into()));
        let req = c.build_sleep_on_date("2020-01-01").unwrap();
        assert_eq!(req.path, "/user/22ABCD/sleep/date/2020-01-01.json");
    }

    #[test]
    fn trailing_slash_is_stripped() {
        let c = FitbitClient::new("http://localhost:3000/");
        let req = c.build_delete_sleep_log(1);
        assert_eq!(req.url, "http://localhost:3000/1/user/-/sleep/1.json");
    }

    #[test]
    fn parse_heart_rate_on_date_success() {
        let body = r#"{"average":[{"heartRate":61.5,"tracker":"Resting Heart Rate"}],
            "heart":[{"heartRate":60,"logId":7,"time":"07:00","tracker":"Resting Heart Rate"}]}"#;
        let day = client().parse_heart_rate_on_date(response(200, body)).unwrap();
        assert_eq!(day.average.len(), 1);
        assert_eq!(day.heart[0].log_id, 7);
    }

    #[test]
    fn parse_sleep_logs_reports_pending() {
        let body = r#"{"meta":{"retryDuration":3000,"state":"pending"}}"#;
        let page = client().parse_sleep_logs(response(200, body)).unwrap();
        assert!(page.is_pending());
        assert!(page.sleep.is_empty());
    }

    #[test]
    fn parse_delete_not_found() {
        let err = client()
            .parse_delete_sleep_log(response(404, ""))
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound));
    }

    #[test]
    fn parse_log_heart_rate_wrong_status() {
        let err = client()
            .parse_log_heart_rate(response(401, r#"{"errors":[]}"#))
            .unwrap_err();
        assert!(matches!(err, ApiError::HttpError { status: 401, .. }));
    }

    #[test]
    fn parse_sleep_on_date_bad_json() {
        let err = client()
            .parse_sleep_on_date(response(200, "not json"))
            .unwrap_err();
        assert!(matches!(err, ApiError::DeserializationError(_)));
    }
}
