//! Error types for the research agent system

use thiserror::Error;

/// Result type alias for agent operations
pub type Result<T> = std::result::Result<T, AgentError>;

#[derive(Error, Debug)]
pub enum AgentError {

    // =============================
    // Capability Wrapper Errors
    // =============================

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    // =============================
    // Orchestration Errors
    // =============================

    #[error("Routing produced no valid agent: {0}")]
    RoutingInvalid(String),

    #[error("LLM error: {0}")]
    Llm(String),

    // =============================
    // External Library Conversions
    // =============================

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AgentError {
    /// Whether the agent boundary should absorb this error into a
    /// conversational reply instead of letting it reach the driver.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AgentError::NotFound(_)
                | AgentError::Provider(_)
                | AgentError::Configuration(_)
                | AgentError::Llm(_)
                | AgentError::Http(_)
        )
    }
}
