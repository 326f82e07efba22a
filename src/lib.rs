//! Financial Research Agents
//!
//! A multi-agent conversational assistant for financial and business
//! research:
//! - Four specialized agents (stock lookup, company research, industry
//!   research, consumer research) plus a concierge
//! - An orchestrating router with turn affinity and a closed agent list
//! - A driver state machine chaining agents via post-completion evaluation
//! - Thin wrappers over Alpha Vantage, Finnhub, World Bank, Google Trends,
//!   and NewsAPI
//! - The LLM isolated behind one narrow trait, so everything around it is
//!   deterministic and testable with a scripted backend
//!
//! LOOP: INPUT → ROUTE → DISPATCH → COMPLETE? → EVALUATE → REROUTE? → AWAIT

pub mod agents;
pub mod api;
pub mod config;
pub mod driver;
pub mod error;
pub mod eval;
pub mod llm;
pub mod memory;
pub mod models;
pub mod providers;
pub mod router;
pub mod sentiment;

pub use error::{AgentError, Result};

// Re-export common types
pub use config::Config;
pub use models::*;
