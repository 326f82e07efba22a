//! Post-completion quality evaluation
//!
//! After an agent finishes, the evaluator judges whether the user's original
//! request is fully addressed. Unfinished work comes back as a restated
//! follow-up request that the driver feeds to the router as a synthetic
//! message, which is how multi-part queries chain across agents without the
//! user repeating themselves.

use crate::llm::ChatBackend;
use crate::memory::ConversationHistory;
use crate::models::ConversationState;
use crate::Result;
use std::sync::Arc;
use tracing::debug;

/// Sentinel the evaluator must emit when nothing remains to do.
pub const NO_FURTHER_TASK: &str = "no_further_task";

const PROMPT: &str = "\
You are a quality evaluator for a financial research assistant. An agent has
just finished part of the user's request. Decide whether the original request
is now fully addressed.

If it is fully addressed, respond with exactly: no_further_task
If something remains, respond with one short instruction restating only the
remaining work, phrased as a new request. Do not add anything else.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Evaluation {
    NoFurtherTask,
    FollowUp(String),
}

pub struct QualityEvaluator {
    backend: Arc<dyn ChatBackend>,
}

impl QualityEvaluator {
    pub fn new(backend: Arc<dyn ChatBackend>) -> Self {
        Self { backend }
    }

    pub async fn evaluate(
        &self,
        state: &ConversationState,
        history: &ConversationHistory,
    ) -> Result<Evaluation> {
        let question = format!(
            "Research progress: {}\nIs the user's request fully addressed?",
            state.summary()
        );

        let reply = self.backend.chat(PROMPT, &question, history).await?;
        let evaluation = parse_evaluation(&reply);
        debug!(?evaluation, "quality evaluation");
        Ok(evaluation)
    }
}

/// A reply carrying the sentinel anywhere counts as done; anything else is
/// the follow-up text verbatim.
fn parse_evaluation(reply: &str) -> Evaluation {
    if reply.contains(NO_FURTHER_TASK) {
        Evaluation::NoFurtherTask
    } else {
        Evaluation::FollowUp(reply.trim().to_string())
    }
}
