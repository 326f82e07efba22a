//! Core data models for the research agent system

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

//
// ================= Agent Names =================
//

/// Closed enumeration of every agent in the system.
///
/// Used both as routing target and as state tag; there is no dynamic
/// extension at runtime. The serde tags match the wire strings the router
/// expects back from the LLM backend.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AgentName {
    StockLookup,
    CompanyResearch,
    IndustryResearch,
    ConsumerResearch,
    Concierge,
    Orchestrator,
}

impl AgentName {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentName::StockLookup => "stock_lookup",
            AgentName::CompanyResearch => "company_research",
            AgentName::IndustryResearch => "industry_research",
            AgentName::ConsumerResearch => "consumer_research",
            AgentName::Concierge => "concierge",
            AgentName::Orchestrator => "orchestrator",
        }
    }

    /// The five names the router may select between (orchestrator excluded).
    pub fn routable() -> &'static [AgentName] {
        &[
            AgentName::StockLookup,
            AgentName::CompanyResearch,
            AgentName::IndustryResearch,
            AgentName::ConsumerResearch,
            AgentName::Concierge,
        ]
    }
}

impl fmt::Display for AgentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AgentName {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim() {
            "stock_lookup" => Ok(AgentName::StockLookup),
            "company_research" => Ok(AgentName::CompanyResearch),
            "industry_research" => Ok(AgentName::IndustryResearch),
            "consumer_research" => Ok(AgentName::ConsumerResearch),
            "concierge" => Ok(AgentName::Concierge),
            "orchestrator" => Ok(AgentName::Orchestrator),
            _ => Err(()),
        }
    }
}

//
// ================= Completion Signal =================
//

/// Structured result an agent hands back when it releases control.
///
/// `Nothing` is the out-of-domain release: it writes no result field but
/// still frees the floor so the router can pick a better agent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Completion {
    Ticker(String),
    CompanyResearch(String),
    IndustryResearch(String),
    ConsumerResearch(String),
    Nothing,
}

//
// ================= Conversation State =================
//

/// Single mutable record tracking progress across turns.
///
/// One instance per conversation, owned by the driver loop and passed by
/// mutable reference to whichever agent is active.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversationState {
    pub ticker: Option<String>,
    pub company_research: Option<String>,
    pub industry_research: Option<String>,
    pub consumer_research: Option<String>,
    pub current_agent: Option<AgentName>,
    pub just_finished: bool,
}

impl ConversationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Full reset for a new conversation topic.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Apply an agent's completion signal.
    ///
    /// The owned result field, `current_agent`, and `just_finished` change
    /// together in this one call so the router never observes a half-applied
    /// completion. Result fields are append-only within a conversation: a
    /// field that is already set keeps its value.
    pub fn mark_done(&mut self, completion: Completion) {
        match completion {
            Completion::Ticker(ticker) => {
                if self.ticker.is_none() {
                    self.ticker = Some(ticker);
                }
            }
            Completion::CompanyResearch(result) => {
                if self.company_research.is_none() {
                    self.company_research = Some(result);
                }
            }
            Completion::IndustryResearch(result) => {
                if self.industry_research.is_none() {
                    self.industry_research = Some(result);
                }
            }
            Completion::ConsumerResearch(result) => {
                if self.consumer_research.is_none() {
                    self.consumer_research = Some(result);
                }
            }
            Completion::Nothing => {}
        }

        self.current_agent = None;
        self.just_finished = true;
    }

    /// Consume the just-finished flag once the driver has acted on it.
    pub fn clear_just_finished(&mut self) {
        self.just_finished = false;
    }

    pub fn has_ticker(&self) -> bool {
        self.ticker.is_some()
    }

    pub fn has_company_research(&self) -> bool {
        self.ticker.is_some() && self.company_research.is_some()
    }

    pub fn has_industry_research(&self) -> bool {
        self.industry_research.is_some()
    }

    pub fn has_consumer_research(&self) -> bool {
        self.consumer_research.is_some()
    }

    /// Compact rendering for LLM prompts and logs.
    pub fn summary(&self) -> String {
        format!(
            "ticker={:?} has_ticker={} has_company_research={} \
             has_industry_research={} has_consumer_research={} \
             current_agent={:?} just_finished={}",
            self.ticker,
            self.has_ticker(),
            self.has_company_research(),
            self.has_industry_research(),
            self.has_consumer_research(),
            self.current_agent.map(|a| a.as_str()),
            self.just_finished,
        )
    }
}

//
// ================= Agent Reply =================
//

/// What an agent hands back from one activation.
#[derive(Debug, Clone)]
pub struct AgentReply {
    pub text: String,
    pub completion: Option<Completion>,
}

impl AgentReply {
    pub fn conversational(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            completion: None,
        }
    }

    pub fn finished(text: impl Into<String>, completion: Completion) -> Self {
        Self {
            text: text.into(),
            completion: Some(completion),
        }
    }
}

//
// ================= Routing =================
//

/// Outcome of one router decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    Agent(AgentName),
    /// The decision mechanism produced something outside the closed
    /// enumeration; the driver retries within its budget.
    Invalid,
}

//
// ================= Tests =================
//
