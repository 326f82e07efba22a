//! Alpha Vantage client for quote and price-history data

use crate::config::Config;
use crate::error::{AgentError, Result};
use crate::providers::{build_http_client, get_json};
use chrono::NaiveDate;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

const BASE_URL: &str = "https://www.alphavantage.co/query";

/// Best symbol match for a company-name search.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SymbolMatch {
    pub symbol: String,
    pub name: String,
    pub kind: String,
    pub region: String,
    pub currency: String,
}

/// One day of closing-price history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub price: f64,
}

pub struct AlphaVantageClient {
    client: Client,
    api_key: Option<String>,
}

impl AlphaVantageClient {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            client: build_http_client(config.request_timeout)?,
            api_key: config.alpha_vantage_api_key.clone(),
        })
    }

    fn key(&self) -> Result<String> {
        Config::require(&self.api_key, "ALPHA_VANTAGE_API_KEY")
    }

    /// Search for a stock symbol given a company name.
    pub async fn search_symbol(&self, company_name: &str) -> Result<SymbolMatch> {
        let key = self.key()?;

        debug!(company = company_name, "Alpha Vantage symbol search");
        let data = get_json(
            &self.client,
            BASE_URL,
            &[
                ("function", "SYMBOL_SEARCH"),
                ("keywords", company_name),
                ("apikey", &key),
            ],
        )
        .await?;

        parse_symbol_search(&data, company_name)
    }

    /// Current price for a symbol.
    pub async fn current_price(&self, symbol: &str) -> Result<f64> {
        let key = self.key()?;

        debug!(symbol, "Alpha Vantage quote lookup");
        let data = get_json(
            &self.client,
            BASE_URL,
            &[
                ("function", "GLOBAL_QUOTE"),
                ("symbol", symbol),
                ("apikey", &key),
            ],
        )
        .await?;

        parse_quote(&data)
    }

    /// Daily closing prices between `start` and `end`, ascending by date.
    pub async fn historical_prices(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PricePoint>> {
        let key = self.key()?;

        debug!(symbol, %start, %end, "Alpha Vantage daily series lookup");
        let data = get_json(
            &self.client,
            BASE_URL,
            &[
                ("function", "TIME_SERIES_DAILY"),
                ("symbol", symbol),
                ("outputsize", "full"),
                ("apikey", &key),
            ],
        )
        .await?;

        filter_daily_series(&data, symbol, start, end)
    }
}

fn check_api_error(data: &Value) -> Result<()> {
    if let Some(message) = data.get("Error Message").and_then(Value::as_str) {
        return Err(AgentError::Provider(format!("Alpha Vantage: {}", message)));
    }
    if data.get("Note").is_some() {
        return Err(AgentError::Provider(
            "Alpha Vantage rate limit reached".to_string(),
        ));
    }
    Ok(())
}

fn parse_symbol_search(data: &Value, company_name: &str) -> Result<SymbolMatch> {
    check_api_error(data)?;

    let best = data
        .get("bestMatches")
        .and_then(Value::as_array)
        .and_then(|matches| matches.first())
        .ok_or_else(|| {
            AgentError::NotFound(format!("no stock symbol found for {}", company_name))
        })?;

    let field = |key: &str| -> Result<String> {
        best.get(key)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| {
                AgentError::Provider(format!("symbol search result missing {}", key))
            })
    };

    Ok(SymbolMatch {
        symbol: field("1. symbol")?,
        name: field("2. name")?,
        kind: field("3. type")?,
        region: field("4. region")?,
        currency: field("8. currency")?,
    })
}

fn parse_quote(data: &Value) -> Result<f64> {
    check_api_error(data)?;

    data.get("Global Quote")
        .and_then(|quote| quote.get("05. price"))
        .and_then(Value::as_str)
        .and_then(|price| price.parse::<f64>().ok())
        .ok_or_else(|| AgentError::Provider("malformed quote response".to_string()))
}

fn filter_daily_series(
    data: &Value,
    symbol: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<PricePoint>> {
    check_api_error(data)?;

    let series = data
        .get("Time Series (Daily)")
        .and_then(Value::as_object)
        .ok_or_else(|| {
            AgentError::Provider(format!("no daily time series for {}", symbol))
        })?;

    let mut points = Vec::new();
    for (date_str, values) in series {
        let Ok(date) = date_str.parse::<NaiveDate>() else {
            continue;
        };
        if date < start || date > end {
            continue;
        }

        let price = values
            .get("4. close")
            .and_then(Value::as_str)
            .and_then(|close| close.parse::<f64>().ok())
            .ok_or_else(|| {
                AgentError::Provider(format!("malformed close price on {}", date_str))
            })?;

        points.push(PricePoint { date, price });
    }

    if points.is_empty() {
        return Err(AgentError::NotFound(format!(
            "no historical prices for {} between {} and {}",
            symbol, start, end
        )));
    }

    points.sort_by_key(|p| p.date);
    Ok(points)
}
