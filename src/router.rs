//! Routing layer
//!
//! Decides which agent handles the next user message. A pinned agent keeps
//! the floor without consulting the LLM; otherwise the orchestrator prompt
//! asks the backend to pick one name from the closed list, and anything the
//! backend says outside that list is reported as invalid rather than guessed
//! around.

use crate::llm::ChatBackend;
use crate::memory::ConversationHistory;
use crate::models::{AgentName, ConversationState, RouteDecision};
use crate::Result;
use std::sync::Arc;
use tracing::{debug, info, warn};

const ORCHESTRATOR_PROMPT: &str = "\
You are the orchestrator of a financial research assistant. Read the user's \
message and pick exactly one agent to handle it.

Agents:
- stock_lookup: find ticker symbols, current prices, historical prices
- company_research: company profiles, analyst recommendations, leadership, company news
- industry_research: industry peers, country and regional economic indicators
- consumer_research: consumer interest trends, news sentiment
- concierge: greetings, small talk, questions about what this assistant can do

If no research agent clearly fits, pick concierge.

Respond with only the agent name, nothing else.";

pub struct Router {
    backend: Arc<dyn ChatBackend>,
}

impl Router {
    pub fn new(backend: Arc<dyn ChatBackend>) -> Self {
        Self { backend }
    }

    /// Pick the agent for the next message.
    ///
    /// An agent that holds the floor keeps it until it signals completion;
    /// the LLM is only consulted when no agent is pinned.
    pub async fn decide(
        &self,
        state: &ConversationState,
        history: &ConversationHistory,
        message: &str,
    ) -> Result<RouteDecision> {
        if let Some(current) = state.current_agent {
            debug!(agent = %current, "routing to pinned agent");
            return Ok(RouteDecision::Agent(current));
        }

        let prompt = format!(
            "{}\n\nConversation progress: {}",
            ORCHESTRATOR_PROMPT,
            state.summary()
        );

        let raw = self.backend.chat(&prompt, message, history).await?;
        let decision = parse_route_reply(&raw);

        match decision {
            RouteDecision::Agent(agent) => info!(agent = %agent, "routed"),
            RouteDecision::Invalid => {
                warn!(reply = raw.as_str(), "router reply outside agent list")
            }
        }

        Ok(decision)
    }
}

/// Map a raw backend reply onto the closed agent list.
///
/// Tolerates fenced or quoted replies, but a name outside the routable set
/// (including `orchestrator` itself) is invalid.
fn parse_route_reply(raw: &str) -> RouteDecision {
    let cleaned = raw
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim()
        .trim_matches('"')
        .trim()
        .to_lowercase();

    match cleaned.parse::<AgentName>() {
        Ok(agent) if AgentName::routable().contains(&agent) => RouteDecision::Agent(agent),
        _ => RouteDecision::Invalid,
    }
}
