//! Process-wide configuration
//!
//! Credentials are read from the environment exactly once at startup and
//! injected by reference into every provider client. Missing provider keys
//! degrade the matching capability wrappers (warn, do not crash); wrappers
//! that hard-require a key fail with a ConfigurationError when called.

use crate::error::{AgentError, Result};
use std::env;
use std::time::Duration;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct Config {
    pub alpha_vantage_api_key: Option<String>,
    pub finnhub_api_key: Option<String>,
    pub newsapi_api_key: Option<String>,
    pub gemini_api_key: Option<String>,
    /// Request timeout applied to every outbound HTTP call.
    pub request_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            alpha_vantage_api_key: None,
            finnhub_api_key: None,
            newsapi_api_key: None,
            gemini_api_key: None,
            request_timeout: Duration::from_secs(30),
        }
    }
}

fn env_key(name: &str) -> Option<String> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => Some(value),
        _ => {
            warn!("{} is missing or empty; dependent capabilities are degraded", name);
            None
        }
    }
}

impl Config {
    /// Build from the process environment, warning once per missing key.
    pub fn from_env() -> Self {
        Self {
            alpha_vantage_api_key: env_key("ALPHA_VANTAGE_API_KEY"),
            finnhub_api_key: env_key("FINNHUB_API_KEY"),
            newsapi_api_key: env_key("NEWSAPI_API_KEY"),
            gemini_api_key: env_key("GEMINI_API_KEY"),
            request_timeout: Duration::from_secs(30),
        }
    }

    /// Resolve a key that a wrapper hard-requires.
    pub fn require(key: &Option<String>, name: &str) -> Result<String> {
        key.clone().ok_or_else(|| {
            AgentError::Configuration(format!("{} is not configured", name))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn require_reports_the_missing_key_name() {
        let err = Config::require(&None, "NEWSAPI_API_KEY").unwrap_err();
        assert!(err.to_string().contains("NEWSAPI_API_KEY"));
    }

    #[test]
    fn require_passes_through_a_present_key() {
        let key = Some("abc123".to_string());
        assert_eq!(Config::require(&key, "FINNHUB_API_KEY").unwrap(), "abc123");
    }
}
