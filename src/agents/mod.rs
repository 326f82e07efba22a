//! Specialized research agents
//!
//! Each agent owns one research domain and a small set of capability tools.
//! Agents share the same activation shape: the LLM backend is asked for one
//! JSON action per step (call a tool, finish with a payload, or reply in
//! plain text), tool observations are fed back, and the loop is bounded so a
//! confused backend can never spin forever.

pub mod company;
pub mod concierge;
pub mod consumer;
pub mod industry;
pub mod stock;

pub use company::CompanyResearchAgent;
pub use concierge::ConciergeAgent;
pub use consumer::ConsumerResearchAgent;
pub use industry::IndustryResearchAgent;
pub use stock::StockLookupAgent;

use crate::error::{AgentError, Result};
use crate::llm::ChatBackend;
use crate::memory::ConversationHistory;
use crate::models::{AgentName, AgentReply, Completion, ConversationState};
use crate::providers::Providers;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Tool calls one activation may make before the agent must answer.
const MAX_AGENT_STEPS: usize = 4;

/// One agent in the system.
///
/// `respond` has a default implementation running the bounded action loop;
/// purely conversational agents override it.
#[async_trait]
pub trait Agent: Send + Sync {
    fn name(&self) -> AgentName;

    fn backend(&self) -> &Arc<dyn ChatBackend>;

    /// Domain instructions handed to the backend, including the tool list
    /// and the action JSON contract.
    fn system_prompt(&self) -> &'static str;

    /// Run one named tool. Unknown tool names are a `NotFound` the loop
    /// feeds back as an observation.
    async fn execute_tool(&self, tool: &str, params: &Value) -> Result<String>;

    /// Map a `done` payload onto this agent's completion signal. A null
    /// payload is the out-of-domain release.
    fn completion_for(&self, payload: &Value) -> Completion;

    async fn respond(
        &self,
        state: &ConversationState,
        history: &ConversationHistory,
        message: &str,
    ) -> Result<AgentReply> {
        let prompt = format!(
            "{}\n\nConversation progress: {}",
            self.system_prompt(),
            state.summary()
        );

        let mut observations: Vec<String> = Vec::new();

        for step in 0..MAX_AGENT_STEPS {
            let turn_input = if observations.is_empty() {
                message.to_string()
            } else {
                format!(
                    "{}\n\nTool results so far:\n{}",
                    message,
                    observations.join("\n")
                )
            };

            let raw = self.backend().chat(&prompt, &turn_input, history).await?;

            let action = match parse_action(&raw) {
                Some(action) => action,
                // Not an action document; take it as the agent's answer.
                None => return Ok(AgentReply::conversational(raw.trim().to_string())),
            };

            match action {
                AgentAction::Reply { text } => {
                    return Ok(AgentReply::conversational(text));
                }
                AgentAction::Done { payload, text } => {
                    let completion = self.completion_for(&payload);
                    let reply_text = text.unwrap_or_else(|| summarize_payload(&payload));
                    return Ok(AgentReply::finished(reply_text, completion));
                }
                AgentAction::Call { tool, params } => {
                    debug!(agent = %self.name(), tool = tool.as_str(), step, "tool call");
                    match self.execute_tool(&tool, &params).await {
                        Ok(observation) => {
                            observations.push(format!("{}: {}", tool, observation));
                        }
                        // The backend gets the failure as text and decides
                        // how to proceed.
                        Err(err) => {
                            warn!(agent = %self.name(), tool = tool.as_str(), error = %err, "tool failed");
                            observations.push(format!("{} failed: {}", tool, err));
                        }
                    }
                }
            }
        }

        // Step budget spent without a terminal action.
        if observations.is_empty() {
            Ok(AgentReply::conversational(
                "I couldn't complete that request. Could you rephrase it?",
            ))
        } else {
            Ok(AgentReply::conversational(format!(
                "Here is what I found so far:\n{}",
                observations.join("\n")
            )))
        }
    }
}

//
// ================= Action protocol =================
//

#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
enum AgentAction {
    Call {
        tool: String,
        #[serde(default)]
        params: Value,
    },
    Done {
        #[serde(default)]
        payload: Value,
        #[serde(default)]
        text: Option<String>,
    },
    Reply {
        text: String,
    },
}

/// Extract one action document from a backend reply, tolerating code fences
/// and surrounding prose. `None` means the reply carried no action at all.
fn parse_action(raw: &str) -> Option<AgentAction> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end < start {
        return None;
    }

    serde_json::from_str(&raw[start..=end]).ok()
}

fn summarize_payload(payload: &Value) -> String {
    match payload {
        Value::Null => "That's outside what I can help with.".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Read a required string parameter from a tool call.
pub(crate) fn string_param(params: &Value, key: &str) -> Result<String> {
    params
        .get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| AgentError::Provider(format!("missing tool parameter: {}", key)))
}

/// Standard string-or-release payload mapping shared by the research agents.
pub(crate) fn text_completion(payload: &Value, wrap: fn(String) -> Completion) -> Completion {
    match payload {
        Value::Null => Completion::Nothing,
        Value::String(s) if s.is_empty() => Completion::Nothing,
        Value::String(s) => wrap(s.clone()),
        other => wrap(other.to_string()),
    }
}

//
// ================= Registry =================
//

/// All agents keyed by name, sharing one backend and one provider set.
pub struct AgentRegistry {
    agents: HashMap<AgentName, Arc<dyn Agent>>,
}

impl AgentRegistry {
    pub fn new(backend: Arc<dyn ChatBackend>, providers: &Providers) -> Self {
        let mut agents: HashMap<AgentName, Arc<dyn Agent>> = HashMap::new();

        agents.insert(
            AgentName::StockLookup,
            Arc::new(StockLookupAgent::new(
                backend.clone(),
                providers.alpha_vantage.clone(),
            )),
        );
        agents.insert(
            AgentName::CompanyResearch,
            Arc::new(CompanyResearchAgent::new(
                backend.clone(),
                providers.finnhub.clone(),
                providers.news.clone(),
            )),
        );
        agents.insert(
            AgentName::IndustryResearch,
            Arc::new(IndustryResearchAgent::new(
                backend.clone(),
                providers.finnhub.clone(),
                providers.world_bank.clone(),
            )),
        );
        agents.insert(
            AgentName::ConsumerResearch,
            Arc::new(ConsumerResearchAgent::new(
                backend.clone(),
                providers.trends.clone(),
                providers.news.clone(),
            )),
        );
        agents.insert(
            AgentName::Concierge,
            Arc::new(ConciergeAgent::new(backend)),
        );

        Self { agents }
    }

    pub fn get(&self, name: AgentName) -> Option<Arc<dyn Agent>> {
        self.agents.get(&name).cloned()
    }
}
