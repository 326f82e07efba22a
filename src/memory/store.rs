//! Conversation history storage
//!
//! Stores conversation messages with timestamps and metadata, capped by an
//! approximate token budget so LLM prompts stay bounded.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use uuid::Uuid;

/// Token budget for one conversation's prompt context.
pub const TOKEN_LIMIT: usize = 8000;

/// Role of a message sender
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Agent,
    System,
}

/// Where a message entering the router's input slot came from.
///
/// Real user input and driver-synthesized text (greeting, re-route
/// instruction, evaluation follow-up) flow through the same slot but stay
/// distinguishable in history.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageSource {
    User,
    Driver,
}

/// A single message in the conversation history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub message_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub role: MessageRole,
    pub content: String,
    /// Approximate token count for context window management
    pub token_count: usize,
    pub source: MessageSource,
}

impl ConversationMessage {
    pub fn new(role: MessageRole, content: String, source: MessageSource) -> Self {
        let token_count = (content.len() + 3) / 4;

        Self {
            message_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            role,
            content,
            token_count,
            source,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content.into(), MessageSource::User)
    }

    pub fn agent(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Agent, content.into(), MessageSource::Driver)
    }

    pub fn synthetic(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content.into(), MessageSource::Driver)
    }
}

/// Conversation history for a single conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationHistory {
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    messages: VecDeque<ConversationMessage>,
    total_tokens: usize,
    token_limit: usize,
}

impl ConversationHistory {
    pub fn new() -> Self {
        Self::with_token_limit(TOKEN_LIMIT)
    }

    pub fn with_token_limit(token_limit: usize) -> Self {
        Self {
            created_at: Utc::now(),
            updated_at: Utc::now(),
            messages: VecDeque::new(),
            total_tokens: 0,
            token_limit,
        }
    }

    /// Add a message, evicting the oldest messages past the token budget.
    pub fn add_message(&mut self, message: ConversationMessage) {
        self.total_tokens += message.token_count;
        self.messages.push_back(message);

        while self.total_tokens > self.token_limit && self.messages.len() > 1 {
            if let Some(evicted) = self.messages.pop_front() {
                self.total_tokens = self.total_tokens.saturating_sub(evicted.token_count);
            }
        }

        self.updated_at = Utc::now();
    }

    pub fn messages(&self) -> impl Iterator<Item = &ConversationMessage> {
        self.messages.iter()
    }

    pub fn total_tokens(&self) -> usize {
        self.total_tokens
    }

    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Render the history for inclusion in an LLM prompt.
    pub fn render_for_prompt(&self) -> String {
        let mut context = String::new();

        for msg in &self.messages {
            let role_str = match msg.role {
                MessageRole::User => "User",
                MessageRole::Agent => "Agent",
                MessageRole::System => "System",
            };
            context.push_str(&format!("{}: {}\n", role_str, msg.content));
        }

        context
    }

    pub fn clear(&mut self) {
        self.messages.clear();
        self.total_tokens = 0;
        self.updated_at = Utc::now();
    }
}

impl Default for ConversationHistory {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_creation_counts_tokens() {
        let msg = ConversationMessage::user("What's Salesforce's stock price?");
        assert_eq!(msg.role, MessageRole::User);
        assert_eq!(msg.source, MessageSource::User);
        assert!(msg.token_count > 0);
    }

    #[test]
    fn synthetic_messages_stay_distinguishable() {
        let msg = ConversationMessage::synthetic("Pick one agent.");
        assert_eq!(msg.role, MessageRole::User);
        assert_eq!(msg.source, MessageSource::Driver);
    }

    #[test]
    fn history_trims_to_token_budget() {
        let mut history = ConversationHistory::with_token_limit(20);

        for i in 0..10 {
            history.add_message(ConversationMessage::user(format!(
                "message number {} with some padding text",
                i
            )));
        }

        assert!(history.total_tokens() <= 20 || history.message_count() == 1);
        assert!(history.message_count() < 10);
    }

    #[test]
    fn prompt_rendering_includes_roles() {
        let mut history = ConversationHistory::new();
        history.add_message(ConversationMessage::user("hello"));
        history.add_message(ConversationMessage::agent("hi, how can I help?"));

        let rendered = history.render_for_prompt();
        assert!(rendered.contains("User: hello"));
        assert!(rendered.contains("Agent: hi"));
    }
}
