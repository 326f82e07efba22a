//! Google Trends client for consumer-interest time series
//!
//! Uses the unofficial two-step explore/widgetdata flow: the explore call
//! yields a per-widget token, the widgetdata call yields the interest-over-
//! time series. No API key required. Both endpoints prefix their JSON with
//! an anti-hijacking garbage line that must be stripped.

use crate::config::Config;
use crate::error::{AgentError, Result};
use crate::providers::build_http_client;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::debug;

const EXPLORE_URL: &str = "https://trends.google.com/trends/api/explore";
const WIDGET_URL: &str = "https://trends.google.com/trends/api/widgetdata/multiline";

pub struct TrendsClient {
    client: Client,
}

impl TrendsClient {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            client: build_http_client(config.request_timeout)?,
        })
    }

    /// Interest-over-time series for a keyword across the past 12 months;
    /// opaque time series.
    pub async fn consumer_trend(&self, keyword: &str) -> Result<Value> {
        let explore_req = json!({
            "comparisonItem": [{ "keyword": keyword, "geo": "", "time": "today 12-m" }],
            "category": 0,
            "property": ""
        })
        .to_string();

        debug!(keyword, "Google Trends explore");
        let explore = self
            .fetch_prefixed_json(EXPLORE_URL, &[("hl", "en-US"), ("tz", "360"), ("req", &explore_req)])
            .await?;

        let widget = timeseries_widget(&explore)
            .ok_or_else(|| AgentError::NotFound(format!("no trend data for {}", keyword)))?;

        let token = widget
            .get("token")
            .and_then(Value::as_str)
            .ok_or_else(|| AgentError::Provider("trends widget missing token".to_string()))?
            .to_string();
        let widget_req = widget
            .get("request")
            .ok_or_else(|| AgentError::Provider("trends widget missing request".to_string()))?
            .to_string();

        debug!(keyword, "Google Trends widget data");
        let data = self
            .fetch_prefixed_json(
                WIDGET_URL,
                &[("hl", "en-US"), ("tz", "360"), ("req", &widget_req), ("token", &token)],
            )
            .await?;

        data.pointer("/default/timelineData")
            .cloned()
            .ok_or_else(|| AgentError::NotFound(format!("no trend data for {}", keyword)))
    }

    async fn fetch_prefixed_json(&self, url: &str, params: &[(&str, &str)]) -> Result<Value> {
        let response = self
            .client
            .get(url)
            .query(params)
            .send()
            .await
            .map_err(|e| AgentError::Provider(format!("trends request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AgentError::Provider(format!(
                "Google Trends returned {}",
                status
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| AgentError::Provider(format!("trends body read failed: {}", e)))?;

        parse_prefixed_json(&body)
    }
}

/// Strip the `)]}'` anti-hijacking prefix and parse what remains.
fn parse_prefixed_json(body: &str) -> Result<Value> {
    let start = body
        .find(['{', '['])
        .ok_or_else(|| AgentError::Provider("trends response had no JSON payload".to_string()))?;

    serde_json::from_str(&body[start..])
        .map_err(|e| AgentError::Provider(format!("invalid trends JSON: {}", e)))
}

fn timeseries_widget(explore: &Value) -> Option<&Value> {
    explore
        .get("widgets")
        .and_then(Value::as_array)?
        .iter()
        .find(|w| w.get("id").and_then(Value::as_str) == Some("TIMESERIES"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefixed_json_is_stripped_and_parsed() {
        let body = ")]}'\n{\"widgets\": []}";
        let parsed = parse_prefixed_json(body).unwrap();
        assert!(parsed.get("widgets").is_some());
    }

    #[test]
    fn garbage_without_json_is_provider_error() {
        assert!(matches!(
            parse_prefixed_json(")]}'").unwrap_err(),
            AgentError::Provider(_)
        ));
    }

    #[test]
    fn timeseries_widget_is_selected_by_id() {
        let explore = serde_json::json!({
            "widgets": [
                { "id": "RELATED_QUERIES", "token": "a" },
                { "id": "TIMESERIES", "token": "b", "request": {} }
            ]
        });

        let widget = timeseries_widget(&explore).unwrap();
        assert_eq!(widget.get("token").unwrap(), "b");
    }
}
