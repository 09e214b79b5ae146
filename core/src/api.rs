//! One-call wrappers pairing `FitbitClient` with an `HttpDelegate`.
//!
//! Each method builds the request, hands it to the delegate and parses the
//! response. Argument errors surface before the delegate is touched;
//! delegate errors are returned unchanged.

use log::{debug, warn};
use serde_json::Value;

use crate::client::FitbitClient;
use crate::dates::IntoDateSpecifier;
use crate::error::ApiError;
use crate::http::{HttpDelegate, HttpRequest, HttpResponse};
use crate::types::{
    HeartRateDay, HeartRateLog, IntradayOptions, SleepLog, SleepLogFilter, SleepLogPage,
    SleepLogQuery,
};

#[derive(Debug, Clone)]
pub struct FitbitApi<D> {
    client: FitbitClient,
    delegate: D,
}

impl<D: HttpDelegate> FitbitApi<D> {
    pub fn new(client: FitbitClient, delegate: D) -> Self {
        Self { client, delegate }
    }

    pub fn client(&self) -> &FitbitClient {
        &self.client
    }

    fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let response = self.delegate.execute(&request)?;
        debug!("{} {} -> {}", request.method, request.url, response.status);
        Ok(response)
    }

    pub fn heart_rate_on_date(&self, date: impl IntoDateSpecifier) -> Result<HeartRateDay, ApiError> {
        let request = self.client.build_heart_rate_on_date(date)?;
        self.client.parse_heart_rate_on_date(self.send(request)?)
    }

    pub fn heart_rate_on_intraday(&self, opts: &IntradayOptions) -> Result<Value, ApiError> {
        let request = self.client.build_heart_rate_on_intraday(opts);
        self.client.parse_heart_rate_on_intraday(self.send(request)?)
    }

    pub fn log_heart_rate(&self, entry: &HeartRateLog) -> Result<Value, ApiError> {
        let request = self.client.build_log_heart_rate(entry)?;
        self.client.parse_log_heart_rate(self.send(request)?)
    }

    pub fn delete_heart_rate_log(&self, heart_rate_log_id: u64) -> Result<(), ApiError> {
        let request = self.client.build_delete_heart_rate_log(heart_rate_log_id);
        self.client.parse_delete_heart_rate_log(self.send(request)?)
    }

    pub fn sleep_on_date(&self, date: impl IntoDateSpecifier) -> Result<Value, ApiError> {
        let request = self.client.build_sleep_on_date(date)?;
        self.client.parse_sleep_on_date(self.send(request)?)
    }

    pub fn sleep_on_date_range(
        &self,
        base_date: impl IntoDateSpecifier,
        end_date: impl IntoDateSpecifier,
    ) -> Result<Value, ApiError> {
        let request = self.client.build_sleep_on_date_range(base_date, end_date)?;
        self.client.parse_sleep_on_date_range(self.send(request)?)
    }

    pub fn sleep_logs(&self, query: &SleepLogQuery) -> Result<SleepLogPage, ApiError> {
        let request = self.client.build_sleep_logs(query)?;
        let page = self.client.parse_sleep_logs(self.send(request)?)?;
        warn_if_pending(&page);
        Ok(page)
    }

    pub fn sleep_logs_lenient(&self, filter: &SleepLogFilter) -> Result<SleepLogPage, ApiError> {
        let request = self.client.build_sleep_logs_lenient(filter);
        let page = self.client.parse_sleep_logs(self.send(request)?)?;
        warn_if_pending(&page);
        Ok(page)
    }

    pub fn log_sleep(&self, entry: &SleepLog) -> Result<Value, ApiError> {
        let request = self.client.build_log_sleep(entry);
        self.client.parse_log_sleep(self.send(request)?)
    }

    pub fn delete_sleep_log(&self, sleep_log_id: u64) -> Result<(), ApiError> {
        let request = self.client.build_delete_sleep_log(sleep_log_id);
        self.client.parse_delete_sleep_log(self.send(request)?)
    }
}

fn warn_if_pending(page: &SleepLogPage) {
    if let Some(meta) = page.meta.as_ref().filter(|m| m.is_pending()) {
        warn!(
            "sleep logs still processing, retry in {} ms",
            meta.retry_duration.unwrap_or_default()
        );
    }
}
