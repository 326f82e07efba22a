//! Conversation memory
//!
//! Per-conversation chat history shared between the router, the active
//! agent, and the quality evaluator. In-process only; the core mandates no
//! persistent state.

pub mod store;

pub use store::{ConversationHistory, ConversationMessage, MessageRole, MessageSource};
