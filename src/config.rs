//! Configuration options for the Rentdesk client

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// API base URL used when none is configured
pub const DEFAULT_API_URL: &str = "http://localhost:8000/api";

/// Configuration options for the Rentdesk client
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Base URL of the REST API, including any path prefix
    pub api_url: String,

    /// Whether to refresh an expired access token and retry the request
    pub auto_refresh_token: bool,

    /// Where to persist the token pair; `None` keeps it in memory only
    pub session_file: Option<PathBuf>,

    /// The request timeout
    pub request_timeout: Option<Duration>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            auto_refresh_token: true,
            session_file: None,
            request_timeout: Some(Duration::from_secs(30)),
        }
    }
}

impl ClientOptions {
    /// Read options from the environment, loading a `.env` file first if
    /// one exists.
    ///
    /// | variable | option |
    /// |---|---|
    /// | `RENTDESK_API_URL` | `api_url` |
    /// | `RENTDESK_SESSION_FILE` | `session_file` |
    /// | `RENTDESK_REQUEST_TIMEOUT_SECS` | `request_timeout` (`0` disables) |
    /// | `RENTDESK_AUTO_REFRESH` | `auto_refresh_token` |
    ///
    /// Unset or unparsable values keep their defaults.
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();
        Self::default().apply_vars(|name| env::var(name).ok())
    }

    fn apply_vars<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("RENTDESK_API_URL").filter(|v| !v.trim().is_empty()) {
            self.api_url = url.trim().to_string();
        }

        if let Some(file) = lookup("RENTDESK_SESSION_FILE").filter(|v| !v.trim().is_empty()) {
            self.session_file = Some(PathBuf::from(file));
        }

        if let Some(secs) = lookup("RENTDESK_REQUEST_TIMEOUT_SECS") {
            match secs.trim().parse::<u64>() {
                Ok(0) => self.request_timeout = None,
                Ok(secs) => self.request_timeout = Some(Duration::from_secs(secs)),
                Err(_) => log::warn!("Ignoring invalid RENTDESK_REQUEST_TIMEOUT_SECS: {}", secs),
            }
        }

        if let Some(flag) = lookup("RENTDESK_AUTO_REFRESH") {
            match flag.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => self.auto_refresh_token = true,
                "0" | "false" | "no" | "off" => self.auto_refresh_token = false,
                _ => log::warn!("Ignoring invalid RENTDESK_AUTO_REFRESH: {}", flag),
            }
        }

        self
    }

    /// Set the API base URL
    pub fn with_api_url(mut self, value: &str) -> Self {
        self.api_url = value.to_string();
        self
    }

    /// Set whether to automatically refresh the token
    pub fn with_auto_refresh_token(mut self, value: bool) -> Self {
        self.auto_refresh_token = value;
        self
    }

    /// Persist the session in a JSON file
    pub fn with_session_file(mut self, value: impl Into<PathBuf>) -> Self {
        self.session_file = Some(value.into());
        self
    }

    /// Set the request timeout
    pub fn with_request_timeout(mut self, value: Option<Duration>) -> Self {
        self.request_timeout = value;
        self
    }
}
