//! Client configuration.
//!
//! Defaults target the public Fitbit API on behalf of the token's own user.
//! Each value can be overridden through the environment.

use std::env::var;

use log::warn;

use crate::http::ApiVersion;
use crate::types::UserScope;

pub const DEFAULT_BASE_URL: &str = "https://api.fitbit.com";

/// Settings for `FitbitClient`.
#[derive(Debug, Clone, PartialEq)]
pub struct FitbitConfig {
    pub base_url: String,
    pub user: UserScope,
    /// Version used by every endpoint that does not pin its own.
    pub api_version: ApiVersion,
}

impl Default for FitbitConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user: UserScope::CurrentUser,
            api_version: ApiVersion::V1,
        }
    }
}

impl FitbitConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overlay `FITBIT_API_ENDPOINT`, `FITBIT_USER_ID` and
    /// `FITBIT_API_VERSION` when set. An unparseable version is ignored.
    pub fn from_env(mut self) -> Self {
        if let Ok(base_url) = var("FITBIT_API_ENDPOINT") {
            self.base_url = base_url;
        }
        if let Ok(user_id) = var("FITBIT_USER_ID") {
            self.user = UserScope::from(user_id.as_str());
        }
        if let Ok(version) = var("FITBIT_API_VERSION") {
            match version.parse() {
                Ok(v) => self.api_version = v,
                Err(e) => warn!("ignoring FITBIT_API_VERSION: {e}"),
            }
        }
        self
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.to_string();
        self
    }

    pub fn with_user(mut self, user: UserScope) -> Self {
        self.user = user;
        self
    }
}
