use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};

/// Endpoint used when nothing else is configured.
pub const DEFAULT_ENDPOINT: &str = "127.0.0.1:2379";

/// Dial/keepalive timeout used when nothing else is configured.
pub const DEFAULT_TIMEOUT_SECS: u64 = 5;

/// Environment variable that overrides the default endpoint list.
pub const ENDPOINTS_ENV: &str = "ETCD_LISTEN_CLIENT_URLS";

/// Store connection settings, built once at startup.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub endpoints: Vec<String>,
    pub timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoints: vec![DEFAULT_ENDPOINT.to_string()],
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl ClientConfig {
    /// Parse a TOML document. Missing fields take their defaults.
    pub fn from_toml_str(text: &str) -> StoreResult<Self> {
        let config: Self = toml::from_str(text).map_err(|e| StoreError::Config(e.to_string()))?;
        if config.timeout_secs == 0 {
            return Err(StoreError::Config("timeout_secs must be at least 1".into()));
        }
        Ok(config)
    }

    /// Load a TOML config file.
    pub fn load(path: &Path) -> StoreResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Replace the endpoint list with a comma-separated one.
    ///
    /// Blank items are dropped; an entirely blank list leaves the config
    /// untouched.
    pub fn with_endpoint_list(mut self, list: &str) -> Self {
        let endpoints = split_endpoints(list);
        if !endpoints.is_empty() {
            self.endpoints = endpoints;
        }
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Connection (dial) timeout.
    pub fn dial_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Keepalive probe interval.
    pub fn keepalive_interval(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Upper bound for one whole request, three times the dial timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.saturating_mul(3))
    }
}

fn split_endpoints(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
