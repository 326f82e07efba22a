//! Concierge agent
//!
//! Greets, explains what the assistant can do, and asks clarifying
//! questions. Purely conversational: it never calls a tool and never signals
//! completion, so it overrides the default action loop with a single chat
//! call.

use crate::agents::Agent;
use crate::error::{AgentError, Result};
use crate::llm::ChatBackend;
use crate::memory::ConversationHistory;
use crate::models::{AgentName, AgentReply, Completion, ConversationState};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

const PROMPT: &str = "\
You are the concierge of a financial research assistant. Greet the user,
answer small talk briefly, and explain what the assistant can do:
- look up stock tickers and prices
- research companies (profiles, analyst ratings, leadership, news)
- research industries and regional economies
- measure consumer interest and news sentiment

If the user seems to want research, ask one short question to pin down what
they need. Keep replies to a few sentences.";

pub struct ConciergeAgent {
    backend: Arc<dyn ChatBackend>,
}

impl ConciergeAgent {
    pub fn new(backend: Arc<dyn ChatBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl Agent for ConciergeAgent {
    fn name(&self) -> AgentName {
        AgentName::Concierge
    }

    fn backend(&self) -> &Arc<dyn ChatBackend> {
        &self.backend
    }

    fn system_prompt(&self) -> &'static str {
        PROMPT
    }

    async fn execute_tool(&self, tool: &str, _params: &Value) -> Result<String> {
        Err(AgentError::NotFound(format!(
            "concierge has no tool named {}",
            tool
        )))
    }

    fn completion_for(&self, _payload: &Value) -> Completion {
        Completion::Nothing
    }

    async fn respond(
        &self,
        _state: &ConversationState,
        history: &ConversationHistory,
        message: &str,
    ) -> Result<AgentReply> {
        let text = self.backend.chat(PROMPT, message, history).await?;
        Ok(AgentReply::conversational(text.trim().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ScriptedBackend;

    #[tokio::test]
    async fn concierge_never_completes() {
        let agent = ConciergeAgent::new(Arc::new(ScriptedBackend::new([
            "Hi! I can look up tickers, research companies and industries, and gauge consumer sentiment. What would you like to dig into?",
        ])));

        let reply = agent
            .respond(
                &ConversationState::new(),
                &ConversationHistory::new(),
                "hello",
            )
            .await
            .unwrap();

        assert_eq!(reply.completion, None);
        assert!(reply.text.contains("tickers"));
    }
}
