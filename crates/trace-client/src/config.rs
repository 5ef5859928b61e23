// Connection settings for the journaling backend

use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:3001";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendConfig {
    pub base_url: String,
    /// Per-request timeout. `None` leaves requests unbounded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<Duration>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: None,
        }
    }
}

impl BackendConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Base URL without trailing slashes
    pub fn normalized_base_url(&self) -> String {
        self.base_url.trim().trim_end_matches('/').to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_points_at_local_backend() {
        let config = BackendConfig::default();
        assert_eq!(config.base_url, "http://localhost:3001");
        assert!(config.timeout.is_none());
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let config = BackendConfig::new("https://journal.example.com//");
        assert_eq!(config.normalized_base_url(), "https://journal.example.com");
    }
}
