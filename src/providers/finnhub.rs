//! Finnhub client for company, equity, and peer research

use crate::config::Config;
use crate::error::Result;
use crate::providers::{build_http_client, get_json};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

const BASE_URL: &str = "https://finnhub.io/api/v1";

/// Marker for a leadership field the provider did not supply.
const UNAVAILABLE: &str = "N/A";

/// Key company facts with unavailable fields defaulted, never failing on
/// partial data.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Leadership {
    pub ceo: String,
    pub company_name: String,
    pub industry: String,
    pub sector: String,
    pub employee_count: String,
    pub website: String,
}

pub struct FinnhubClient {
    client: Client,
    api_key: Option<String>,
}

impl FinnhubClient {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            client: build_http_client(config.request_timeout)?,
            api_key: config.finnhub_api_key.clone(),
        })
    }

    fn key(&self) -> Result<String> {
        Config::require(&self.api_key, "FINNHUB_API_KEY")
    }

    /// Company profile for a symbol; opaque record.
    pub async fn company_profile(&self, symbol: &str) -> Result<Value> {
        let key = self.key()?;
        let url = format!("{}/stock/profile2", BASE_URL);

        debug!(symbol, "Finnhub company profile lookup");
        get_json(&self.client, &url, &[("symbol", symbol), ("token", &key)]).await
    }

    /// Analyst recommendation data for a symbol; opaque record.
    pub async fn equity_recommendations(&self, symbol: &str) -> Result<Value> {
        let key = self.key()?;
        let url = format!("{}/stock/recommendation", BASE_URL);

        debug!(symbol, "Finnhub recommendation lookup");
        get_json(&self.client, &url, &[("symbol", symbol), ("token", &key)]).await
    }

    /// Peer companies for an industry/sector code; opaque record.
    pub async fn industry_peers(&self, industry_code: &str) -> Result<Value> {
        let key = self.key()?;
        let url = format!("{}/stock/peers", BASE_URL);

        debug!(industry = industry_code, "Finnhub peer lookup");
        get_json(
            &self.client,
            &url,
            &[("symbol", industry_code), ("token", &key)],
        )
        .await
    }

    /// Leadership and key company facts for a ticker.
    ///
    /// Fields missing from the underlying profile are reported as "N/A"
    /// rather than failing the lookup.
    pub async fn leadership(&self, ticker: &str) -> Result<Leadership> {
        let profile = self.company_profile(ticker).await?;
        Ok(leadership_from_profile(&profile))
    }
}

fn profile_field(profile: &Value, key: &str) -> String {
    match profile.get(key) {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => UNAVAILABLE.to_string(),
    }
}

fn leadership_from_profile(profile: &Value) -> Leadership {
    Leadership {
        ceo: profile_field(profile, "ceo"),
        company_name: profile_field(profile, "name"),
        industry: profile_field(profile, "finnhubIndustry"),
        sector: profile_field(profile, "sector"),
        employee_count: profile_field(profile, "employeeTotal"),
        website: profile_field(profile, "weburl"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn leadership_maps_available_fields() {
        let profile = json!({
            "name": "Salesforce Inc",
            "finnhubIndustry": "Technology",
            "weburl": "https://www.salesforce.com/",
            "employeeTotal": 72000
        });

        let leadership = leadership_from_profile(&profile);
        assert_eq!(leadership.company_name, "Salesforce Inc");
        assert_eq!(leadership.industry, "Technology");
        assert_eq!(leadership.employee_count, "72000");
        assert_eq!(leadership.website, "https://www.salesforce.com/");
    }

    #[test]
    fn leadership_defaults_missing_fields_to_unavailable() {
        let profile = json!({ "name": "Salesforce Inc" });

        let leadership = leadership_from_profile(&profile);
        assert_eq!(leadership.ceo, "N/A");
        assert_eq!(leadership.sector, "N/A");
        assert_eq!(leadership.employee_count, "N/A");
        assert_eq!(leadership.company_name, "Salesforce Inc");
    }

    #[test]
    fn leadership_treats_empty_strings_as_unavailable() {
        let profile = json!({ "name": "", "weburl": "" });

        let leadership = leadership_from_profile(&profile);
        assert_eq!(leadership.company_name, "N/A");
        assert_eq!(leadership.website, "N/A");
    }
}
