//! Company research agent
//!
//! Profiles, analyst recommendations, leadership, and recent news for a
//! single company, via the Finnhub and NewsAPI wrappers.

use crate::agents::{string_param, text_completion, Agent};
use crate::error::{AgentError, Result};
use crate::llm::ChatBackend;
use crate::models::{AgentName, Completion};
use crate::providers::{FinnhubClient, NewsClient};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

const PROMPT: &str = "\
You are a company research agent. You research individual companies by ticker.

Tools:
- company_profile, params {\"symbol\": string}: company profile
- equity_recommendations, params {\"symbol\": string}: analyst recommendation trends
- leadership, params {\"symbol\": string}: CEO and key company facts
- latest_news, params {\"symbol\": string}: recent headlines for the company

Respond with exactly one JSON object per turn:
- {\"action\":\"call\",\"tool\":\"...\",\"params\":{...}} to use a tool
- {\"action\":\"done\",\"payload\":\"research summary\",\"text\":\"answer for the user\"} when the research question is answered
- {\"action\":\"done\",\"payload\":null,\"text\":\"...\"} if the request is not about a specific company
- {\"action\":\"reply\",\"text\":\"...\"} to ask for the ticker or clarify while staying on the task";

pub struct CompanyResearchAgent {
    backend: Arc<dyn ChatBackend>,
    finnhub: Arc<FinnhubClient>,
    news: Arc<NewsClient>,
}

impl CompanyResearchAgent {
    pub fn new(
        backend: Arc<dyn ChatBackend>,
        finnhub: Arc<FinnhubClient>,
        news: Arc<NewsClient>,
    ) -> Self {
        Self {
            backend,
            finnhub,
            news,
        }
    }
}

#[async_trait]
impl Agent for CompanyResearchAgent {
    fn name(&self) -> AgentName {
        AgentName::CompanyResearch
    }

    fn backend(&self) -> &Arc<dyn ChatBackend> {
        &self.backend
    }

    fn system_prompt(&self) -> &'static str {
        PROMPT
    }

    async fn execute_tool(&self, tool: &str, params: &Value) -> Result<String> {
        let symbol = string_param(params, "symbol")?;
        match tool {
            "company_profile" => {
                let profile = self.finnhub.company_profile(&symbol).await?;
                Ok(profile.to_string())
            }
            "equity_recommendations" => {
                let recommendations = self.finnhub.equity_recommendations(&symbol).await?;
                Ok(recommendations.to_string())
            }
            "leadership" => {
                let leadership = self.finnhub.leadership(&symbol).await?;
                Ok(serde_json::to_string(&leadership)?)
            }
            "latest_news" => {
                let articles = self.news.latest_news(&symbol).await?;
                let headlines: Vec<&str> =
                    articles.iter().take(10).map(|a| a.title.as_str()).collect();
                Ok(headlines.join("; "))
            }
            other => Err(AgentError::NotFound(format!("unknown tool: {}", other))),
        }
    }

    fn completion_for(&self, payload: &Value) -> Completion {
        text_completion(payload, Completion::CompanyResearch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::llm::ScriptedBackend;
    use crate::memory::ConversationHistory;
    use crate::models::ConversationState;

    #[tokio::test]
    async fn done_payload_becomes_company_research_completion() {
        let config = Config::default();
        let agent = CompanyResearchAgent::new(
            Arc::new(ScriptedBackend::new([
                r#"{"action":"done","payload":"Salesforce: CRM software leader, buy-rated.","text":"Salesforce is a CRM software leader rated buy by most analysts."}"#,
            ])),
            Arc::new(FinnhubClient::new(&config).unwrap()),
            Arc::new(NewsClient::new(&config).unwrap()),
        );

        let reply = agent
            .respond(
                &ConversationState::new(),
                &ConversationHistory::new(),
                "Research CRM for me",
            )
            .await
            .unwrap();

        assert_eq!(
            reply.completion,
            Some(Completion::CompanyResearch(
                "Salesforce: CRM software leader, buy-rated.".into()
            ))
        );
    }
}
