//! Industry research agent
//!
//! Peer groups via Finnhub and country-level economic context via the World
//! Bank.

use crate::agents::{string_param, text_completion, Agent};
use crate::error::{AgentError, Result};
use crate::llm::ChatBackend;
use crate::models::{AgentName, Completion};
use crate::providers::{FinnhubClient, WorldBankClient};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

const PROMPT: &str = "\
You are an industry research agent. You research industries, sectors, and the
economic context of the regions they operate in.

Tools:
- industry_peers, params {\"symbol\": string}: peer companies for a ticker's industry
- country_indicators, params {\"country\": string}: World Bank data for a two-letter country code

Respond with exactly one JSON object per turn:
- {\"action\":\"call\",\"tool\":\"...\",\"params\":{...}} to use a tool
- {\"action\":\"done\",\"payload\":\"research summary\",\"text\":\"answer for the user\"} when the research question is answered
- {\"action\":\"done\",\"payload\":null,\"text\":\"...\"} if the request is not about industries or regions
- {\"action\":\"reply\",\"text\":\"...\"} to clarify while staying on the task";

pub struct IndustryResearchAgent {
    backend: Arc<dyn ChatBackend>,
    finnhub: Arc<FinnhubClient>,
    world_bank: Arc<WorldBankClient>,
}

impl IndustryResearchAgent {
    pub fn new(
        backend: Arc<dyn ChatBackend>,
        finnhub: Arc<FinnhubClient>,
        world_bank: Arc<WorldBankClient>,
    ) -> Self {
        Self {
            backend,
            finnhub,
            world_bank,
        }
    }
}

#[async_trait]
impl Agent for IndustryResearchAgent {
    fn name(&self) -> AgentName {
        AgentName::IndustryResearch
    }

    fn backend(&self) -> &Arc<dyn ChatBackend> {
        &self.backend
    }

    fn system_prompt(&self) -> &'static str {
        PROMPT
    }

    async fn execute_tool(&self, tool: &str, params: &Value) -> Result<String> {
        match tool {
            "industry_peers" => {
                let symbol = string_param(params, "symbol")?;
                let peers = self.finnhub.industry_peers(&symbol).await?;
                Ok(peers.to_string())
            }
            "country_indicators" => {
                let country = string_param(params, "country")?;
                let indicators = self.world_bank.country_indicators(&country).await?;
                Ok(indicators.to_string())
            }
            other => Err(AgentError::NotFound(format!("unknown tool: {}", other))),
        }
    }

    fn completion_for(&self, payload: &Value) -> Completion {
        text_completion(payload, Completion::IndustryResearch)
    }
}
