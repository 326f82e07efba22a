//! Consumer research agent
//!
//! Consumer interest over time via Google Trends and market mood via news
//! sentiment.

use crate::agents::{string_param, text_completion, Agent};
use crate::error::{AgentError, Result};
use crate::llm::ChatBackend;
use crate::models::{AgentName, Completion};
use crate::providers::{NewsClient, TrendsClient};
use crate::sentiment;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

const PROMPT: &str = "\
You are a consumer research agent. You measure consumer interest and public
sentiment around companies, products, and topics.

Tools:
- consumer_trend, params {\"keyword\": string}: 12 months of search-interest data
- sentiment, params {\"query\": string}: aggregate sentiment of recent news

Respond with exactly one JSON object per turn:
- {\"action\":\"call\",\"tool\":\"...\",\"params\":{...}} to use a tool
- {\"action\":\"done\",\"payload\":\"research summary\",\"text\":\"answer for the user\"} when the research question is answered
- {\"action\":\"done\",\"payload\":null,\"text\":\"...\"} if the request is not about consumer interest or sentiment
- {\"action\":\"reply\",\"text\":\"...\"} to clarify while staying on the task";

pub struct ConsumerResearchAgent {
    backend: Arc<dyn ChatBackend>,
    trends: Arc<TrendsClient>,
    news: Arc<NewsClient>,
}

impl ConsumerResearchAgent {
    pub fn new(
        backend: Arc<dyn ChatBackend>,
        trends: Arc<TrendsClient>,
        news: Arc<NewsClient>,
    ) -> Self {
        Self {
            backend,
            trends,
            news,
        }
    }
}

#[async_trait]
impl Agent for ConsumerResearchAgent {
    fn name(&self) -> AgentName {
        AgentName::ConsumerResearch
    }

    fn backend(&self) -> &Arc<dyn ChatBackend> {
        &self.backend
    }

    fn system_prompt(&self) -> &'static str {
        PROMPT
    }

    async fn execute_tool(&self, tool: &str, params: &Value) -> Result<String> {
        match tool {
            "consumer_trend" => {
                let keyword = string_param(params, "keyword")?;
                let series = self.trends.consumer_trend(&keyword).await?;
                Ok(series.to_string())
            }
            "sentiment" => {
                let query = string_param(params, "query")?;
                let report = sentiment::sentiment(&self.news, &query).await?;
                Ok(format!(
                    "{} mood ({:.3} mean over {} articles: {} positive, {} neutral, {} negative)",
                    report.mood(),
                    report.overall_sentiment,
                    report.article_count,
                    report.positive_articles,
                    report.neutral_articles,
                    report.negative_articles,
                ))
            }
            other => Err(AgentError::NotFound(format!("unknown tool: {}", other))),
        }
    }

    fn completion_for(&self, payload: &Value) -> Completion {
        text_completion(payload, Completion::ConsumerResearch)
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
    async fn done_payload_becomes_consumer_research_completion() {
        let config = Config::default();
        let agent = ConsumerResearchAgent::new(
            Arc::new(ScriptedBackend::new([
                r#"{"action":"done","payload":"Interest in Salesforce is steady; news mood is positive.","text":"Consumer interest in Salesforce is steady and news sentiment is positive."}"#,
            ])),
            Arc::new(TrendsClient::new(&config).unwrap()),
            Arc::new(NewsClient::new(&config).unwrap()),
        );

        let reply = agent
            .respond(
                &ConversationState::new(),
                &ConversationHistory::new(),
                "How do consumers feel about Salesforce?",
            )
            .await
            .unwrap();

        assert_eq!(
            reply.completion,
            Some(Completion::ConsumerResearch(
                "Interest in Salesforce is steady; news mood is positive.".into()
            ))
        );
    }
}
