//! World Bank client for country and region indicators
//!
//! No API key required.

use crate::config::Config;
use crate::error::{AgentError, Result};
use crate::providers::{build_http_client, get_json};
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

const BASE_URL: &str = "https://api.worldbank.org/v2";

pub struct WorldBankClient {
    client: Client,
}

impl WorldBankClient {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            client: build_http_client(config.request_timeout)?,
        })
    }

    /// Economic and financial indicators for a two-letter ISO country code;
    /// opaque record.
    pub async fn country_indicators(&self, country_code: &str) -> Result<Value> {
        let url = format!("{}/country/{}", BASE_URL, country_code);

        debug!(country = country_code, "World Bank country lookup");
        let data = get_json(&self.client, &url, &[("format", "json")]).await?;
        check_country_response(&data, country_code)?;
        Ok(data)
    }
}

/// The World Bank API reports unknown codes as a message object instead of
/// an HTTP error.
fn check_country_response(data: &Value, country_code: &str) -> Result<()> {
    let has_message = data
        .get(0)
        .map(|header| header.get("message").is_some())
        .unwrap_or(false);

    if has_message {
        return Err(AgentError::NotFound(format!(
            "no country data for code {}",
            country_code
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unknown_country_code_is_not_found() {
        let data = json!([
            { "message": [{ "id": "120", "value": "Invalid value" }] }
        ]);
        assert!(matches!(
            check_country_response(&data, "ZZ").unwrap_err(),
            AgentError::NotFound(_)
        ));
    }

    #[test]
    fn valid_country_payload_passes() {
        let data = json!([
            { "page": 1, "pages": 1, "per_page": "50", "total": 1 },
            [{ "id": "USA", "name": "United States" }]
        ]);
        assert!(check_country_response(&data, "US").is_ok());
    }
}
