//! Stock lookup agent
//!
//! Resolves company names to tickers and answers price questions via the
//! Alpha Vantage wrapper. Completing with a payload records the ticker for
//! the rest of the conversation.

use crate::agents::{string_param, text_completion, Agent};
use crate::error::{AgentError, Result};
use crate::llm::ChatBackend;
use crate::models::{AgentName, Completion};
use crate::providers::AlphaVantageClient;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::Value;
use std::sync::Arc;

const PROMPT: &str = "\
You are a stock lookup agent. You find ticker symbols and stock prices.

Tools:
- lookup_symbol, params {\"company\": string}: find the best ticker match for a company name
- current_price, params {\"symbol\": string}: latest price for a ticker
- historical_prices, params {\"symbol\": string, \"start\": \"YYYY-MM-DD\", \"end\": \"YYYY-MM-DD\"}: daily closes in a date range

Respond with exactly one JSON object per turn:
- {\"action\":\"call\",\"tool\":\"...\",\"params\":{...}} to use a tool
- {\"action\":\"done\",\"payload\":\"TICKER\",\"text\":\"answer for the user\"} when you have resolved the ticker the user asked about
- {\"action\":\"done\",\"payload\":null,\"text\":\"...\"} if the request is not about stock symbols or prices
- {\"action\":\"reply\",\"text\":\"...\"} to answer or ask a clarifying question while staying on the task";

pub struct StockLookupAgent {
    backend: Arc<dyn ChatBackend>,
    alpha_vantage: Arc<AlphaVantageClient>,
}

impl StockLookupAgent {
    pub fn new(backend: Arc<dyn ChatBackend>, alpha_vantage: Arc<AlphaVantageClient>) -> Self {
        Self {
            backend,
            alpha_vantage,
        }
    }
}

fn date_param(params: &Value, key: &str) -> Result<NaiveDate> {
    string_param(params, key)?
        .parse::<NaiveDate>()
        .map_err(|e| AgentError::Provider(format!("bad {} date: {}", key, e)))
}

#[async_trait]
impl Agent for StockLookupAgent {
    fn name(&self) -> AgentName {
        AgentName::StockLookup
    }

    fn backend(&self) -> &Arc<dyn ChatBackend> {
        &self.backend
    }

    fn system_prompt(&self) -> &'static str {
        PROMPT
    }

    async fn execute_tool(&self, tool: &str, params: &Value) -> Result<String> {
        match tool {
            "lookup_symbol" => {
                let company = string_param(params, "company")?;
                let matched = self.alpha_vantage.search_symbol(&company).await?;
                Ok(serde_json::to_string(&matched)?)
            }
            "current_price" => {
                let symbol = string_param(params, "symbol")?;
                let price = self.alpha_vantage.current_price(&symbol).await?;
                Ok(format!("{} trades at {}", symbol, price))
            }
            "historical_prices" => {
                let symbol = string_param(params, "symbol")?;
                let start = date_param(params, "start")?;
                let end = date_param(params, "end")?;
                let points = self
                    .alpha_vantage
                    .historical_prices(&symbol, start, end)
                    .await?;
                Ok(serde_json::to_string(&points)?)
            }
            other => Err(AgentError::NotFound(format!("unknown tool: {}", other))),
        }
    }

    fn completion_for(&self, payload: &Value) -> Completion {
        text_completion(payload, Completion::Ticker)
    }
}
