//! HTTP transport types for the host-does-IO pattern.
//!
//! # Design
//! Requests and responses are plain data. The core builds `HttpRequest`
//! values and parses `HttpResponse` values; an `HttpDelegate` supplied by the
//! host performs authentication and the actual network round-trip.
//!
//! The Fitbit API version travels on each request instead of living as a
//! mutable flag on the client, so a 1.2-only endpoint cannot leak its version
//! into calls that happen to run next to it.

use std::fmt;

use crate::error::ApiError;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Delete,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Revision of the Fitbit request/response contract, rendered as the first
/// URL path segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ApiVersion {
    #[default]
    V1,
    V1_2,
}

impl ApiVersion {
    pub fn as_str(self) -> &'static str {
        match self {
            ApiVersion::V1 => "1",
            ApiVersion::V1_2 => "1.2",
        }
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ApiVersion {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1" => Ok(ApiVersion::V1),
            "1.2" => Ok(ApiVersion::V1_2),
            other => Err(ApiError::invalid(format!("unsupported API version {other:?}"))),
        }
    }
}

/// An HTTP request described as plain data.
///
/// `path` is the resource path relative to the versioned API root, e.g.
/// `/user/-/sleep/date/2020-03-21.json`. `url` is the absolute location
/// `{base_url}/{api_version}{path}`.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub api_version: ApiVersion,
    pub path: String,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

/// The host side of the boundary: signs and sends a request.
///
/// Implementations must be safe to call from several threads at once if the
/// caller shares them; the core keeps no state between calls. Transport
/// failures are reported as `ApiError::Transport`, non-2xx responses are
/// returned as data so the parse step can classify them.
pub trait HttpDelegate {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError>;
}

impl<D: HttpDelegate + ?Sized> HttpDelegate for &D {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        (**self).execute(request)
    }
}
