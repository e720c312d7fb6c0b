//! Portal endpoint configuration.
//!
//! The base URL defaults to the local development backend and can be
//! overridden with the `DISHA_BASE_URL` environment variable.

use std::env;

const DEFAULT_BASE_URL: &str = "http://localhost:5000/api";

/// Where the portal backend lives.
#[derive(Debug, Clone)]
pub struct PortalConfig {
    base_url: String,
}

impl PortalConfig {
    /// Uses an explicit base URL. A trailing slash is stripped so
    /// endpoint paths can always be joined with a leading slash.
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self { base_url }
    }

    /// Reads `DISHA_BASE_URL`, falling back to the default local
    /// backend.
    pub fn from_env() -> Self {
        let base_url = env::var("DISHA_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.into());
        Self::new(base_url)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Joins an endpoint path (with leading slash) onto the base URL.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}
