//! LLM chat backend
//!
//! The core depends only on the `ChatBackend` contract, not on any vendor.
//! `GeminiChat` is the production implementation; `ScriptedBackend` keeps the
//! system functional and testable without an LLM dependency.

use crate::error::AgentError;
use crate::memory::ConversationHistory;
use crate::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, error};

/// Narrow interface to the external language model.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Produce a reply for `message` given a system prompt and the
    /// conversation so far.
    async fn chat(
        &self,
        system_prompt: &str,
        message: &str,
        history: &ConversationHistory,
    ) -> Result<String>;
}

//
// ================= Gemini =================
//

const GEMINI_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent";

/// Reusable Gemini client (connection-pooled)
pub struct GeminiChat {
    client: Client,
    api_key: String,
    base_url: String,
}

impl GeminiChat {
    pub fn new(api_key: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(8)
            .timeout(timeout)
            .build()
            .map_err(AgentError::Http)?;

        Ok(Self {
            client,
            api_key,
            base_url: GEMINI_URL.to_string(),
        })
    }
}

#[async_trait]
impl ChatBackend for GeminiChat {
    async fn chat(
        &self,
        system_prompt: &str,
        message: &str,
        history: &ConversationHistory,
    ) -> Result<String> {
        if self.api_key.is_empty() {
            return Err(AgentError::Configuration(
                "GEMINI_API_KEY is not configured".to_string(),
            ));
        }

        let url = format!("{}?key={}", self.base_url, self.api_key);

        let user_text = if history.is_empty() {
            message.to_string()
        } else {
            format!(
                "Conversation so far:\n{}\n---\n{}",
                history.render_for_prompt(),
                message
            )
        };

        let request = GeminiRequest {
            contents: vec![Content {
                parts: vec![Part { text: user_text }],
            }],
            generation_config: GenerationConfig {
                temperature: 0.2,
                top_p: 0.9,
                top_k: 40,
                max_output_tokens: 1024,
            },
            system_instruction: SystemInstruction {
                parts: vec![Part {
                    text: system_prompt.to_string(),
                }],
            },
        };

        debug!("Calling Gemini API");

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!("Gemini API request failed: {}", e);
                AgentError::Llm(format!("Gemini API error: {}", e))
            })?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("Gemini API error response: {}", error_text);
            return Err(AgentError::Llm(format!("Gemini API error: {}", error_text)));
        }

        let gemini_response: GeminiResponse = response
            .json()
            .await
            .map_err(|e| AgentError::Llm(format!("Gemini parse error: {}", e)))?;

        let answer = gemini_response
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.clone())
            .ok_or_else(|| AgentError::Llm("Empty response from Gemini".to_string()))?;

        Ok(answer)
    }
}

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
    system_instruction: SystemInstruction,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
    top_p: f32,
    top_k: i32,
    max_output_tokens: i32,
}

#[derive(Debug, Serialize)]
struct SystemInstruction {
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Content,
}

//
// ================= Scripted backend =================
//

/// Backend that replays a fixed queue of replies.
///
/// Keeps routing and agent logic testable without an LLM dependency, in the
/// same spirit as a mock planner.
pub struct ScriptedBackend {
    replies: Mutex<VecDeque<String>>,
}

impl ScriptedBackend {
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: Mutex::new(replies.into_iter().map(Into::into).collect()),
        }
    }

    pub fn remaining(&self) -> usize {
        self.replies.lock().map(|q| q.len()).unwrap_or(0)
    }
}

#[async_trait]
impl ChatBackend for ScriptedBackend {
    async fn chat(
        &self,
        _system_prompt: &str,
        _message: &str,
        _history: &ConversationHistory,
    ) -> Result<String> {
        let mut queue = self
            .replies
            .lock()
            .map_err(|_| AgentError::Llm("scripted backend poisoned".to_string()))?;

        queue
            .pop_front()
            .ok_or_else(|| AgentError::Llm("scripted backend exhausted".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_serialization_carries_the_query() {
        let request = GeminiRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: "What is Salesforce's ticker?".to_string(),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: 0.2,
                top_p: 0.9,
                top_k: 40,
                max_output_tokens: 1024,
            },
            system_instruction: SystemInstruction {
                parts: vec![Part {
                    text: "You are a research assistant".to_string(),
                }],
            },
        };

        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("What is Salesforce's ticker?"));
    }

    #[tokio::test]
    async fn scripted_backend_replays_in_order() {
        let backend = ScriptedBackend::new(["first", "second"]);
        let history = ConversationHistory::new();

        assert_eq!(backend.chat("", "x", &history).await.unwrap(), "first");
        assert_eq!(backend.chat("", "x", &history).await.unwrap(), "second");
        assert!(backend.chat("", "x", &history).await.is_err());
    }
}
