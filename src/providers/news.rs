//! NewsAPI client for recent articles

use crate::config::Config;
use crate::error::{AgentError, Result};
use crate::providers::{build_http_client, get_json};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

const BASE_URL: &str = "https://newsapi.org/v2";

/// One article from a news search.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Article {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub published_at: Option<String>,
}

pub struct NewsClient {
    client: Client,
    api_key: Option<String>,
}

impl NewsClient {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            client: build_http_client(config.request_timeout)?,
            api_key: config.newsapi_api_key.clone(),
        })
    }

    fn key(&self) -> Result<String> {
        Config::require(&self.api_key, "NEWSAPI_API_KEY")
    }

    /// Up to 100 of the most recently published English-language articles
    /// matching a free-text query.
    pub async fn recent_articles(&self, query: &str) -> Result<Vec<Article>> {
        let key = self.key()?;
        let url = format!("{}/everything", BASE_URL);

        debug!(query, "NewsAPI article search");
        let data = get_json(
            &self.client,
            &url,
            &[
                ("q", query),
                ("language", "en"),
                ("sortBy", "publishedAt"),
                ("pageSize", "100"),
                ("apiKey", &key),
            ],
        )
        .await?;

        parse_articles(&data, query)
    }

    /// Latest headlines mentioning a ticker symbol.
    pub async fn latest_news(&self, symbol: &str) -> Result<Vec<Article>> {
        self.recent_articles(symbol).await
    }
}

fn parse_articles(data: &Value, query: &str) -> Result<Vec<Article>> {
    if data.get("status").and_then(Value::as_str) == Some("error") {
        let message = data
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("unknown error");
        return Err(AgentError::Provider(format!("NewsAPI: {}", message)));
    }

    let raw = data
        .get("articles")
        .and_then(Value::as_array)
        .ok_or_else(|| AgentError::Provider("malformed NewsAPI response".to_string()))?;

    let articles: Vec<Article> = raw
        .iter()
        .filter_map(|entry| {
            Some(Article {
                title: entry.get("title")?.as_str()?.to_string(),
                description: entry
                    .get("description")
                    .and_then(Value::as_str)
                    .map(str::to_string),
                source: entry
                    .pointer("/source/name")
                    .and_then(Value::as_str)
                    .map(str::to_string),
                url: entry
                    .get("url")
                    .and_then(Value::as_str)
                    .map(str::to_string),
                published_at: entry
                    .get("publishedAt")
                    .and_then(Value::as_str)
                    .map(str::to_string),
            })
        })
        .collect();

    if articles.is_empty() {
        return Err(AgentError::NotFound(format!(
            "no recent news for {}",
            query
        )));
    }

    Ok(articles)
}
