//! Research capability wrappers
//!
//! One client per external data provider, each a stateless adapter over that
//! provider's REST endpoints. Clients are built from the injected `Config`
//! and carry no retry policy of their own; the shared HTTP client supplies
//! the timeout.

pub mod alpha_vantage;
pub mod finnhub;
pub mod news;
pub mod trends;
pub mod world_bank;

pub use alpha_vantage::{AlphaVantageClient, PricePoint, SymbolMatch};
pub use finnhub::{FinnhubClient, Leadership};
pub use news::{Article, NewsClient};
pub use trends::TrendsClient;
pub use world_bank::WorldBankClient;

use crate::config::Config;
use crate::error::{AgentError, Result};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

/// Every provider client, built once from config and shared by the agents.
#[derive(Clone)]
pub struct Providers {
    pub alpha_vantage: Arc<AlphaVantageClient>,
    pub finnhub: Arc<FinnhubClient>,
    pub world_bank: Arc<WorldBankClient>,
    pub trends: Arc<TrendsClient>,
    pub news: Arc<NewsClient>,
}

impl Providers {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            alpha_vantage: Arc::new(AlphaVantageClient::new(config)?),
            finnhub: Arc::new(FinnhubClient::new(config)?),
            world_bank: Arc::new(WorldBankClient::new(config)?),
            trends: Arc::new(TrendsClient::new(config)?),
            news: Arc::new(NewsClient::new(config)?),
        })
    }
}

/// Build the pooled HTTP client shared by a provider.
pub(crate) fn build_http_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .pool_idle_timeout(Duration::from_secs(60))
        .pool_max_idle_per_host(8)
        .timeout(timeout)
        .build()
        .map_err(AgentError::Http)
}

/// GET a JSON document, mapping transport and status failures to
/// provider errors.
pub(crate) async fn get_json(
    client: &Client,
    url: &str,
    params: &[(&str, &str)],
) -> Result<serde_json::Value> {
    let response = client
        .get(url)
        .query(params)
        .send()
        .await
        .map_err(|e| AgentError::Provider(format!("request failed: {}", e)))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(AgentError::Provider(format!(
            "upstream returned {}: {}",
            status, body
        )));
    }

    response
        .json::<serde_json::Value>()
        .await
        .map_err(|e| AgentError::Provider(format!("invalid JSON response: {}", e)))
}
