//! Conversation driver
//!
//! Top-level loop tying user input, the router, the agents, and memory
//! together. One turn runs dispatch, completion handling, and the
//! post-completion evaluation chain; both caps are fixed so a confused
//! backend can only waste a bounded number of calls.
//!
//! States: first turn (synthesized greeting), await user (fresh state, real
//! input), dispatch (route and run one agent), retry routing (corrective
//! synthetic message), post-dispatch eval (chain follow-up work).

use crate::agents::AgentRegistry;
use crate::error::AgentError;
use crate::eval::{Evaluation, QualityEvaluator};
use crate::llm::ChatBackend;
use crate::memory::{ConversationHistory, ConversationMessage};
use crate::models::{AgentName, ConversationState, RouteDecision};
use crate::providers::Providers;
use crate::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::{info, warn};

/// Invalid routing decisions tolerated before a turn is abandoned.
pub const MAX_ROUTING_RETRIES: usize = 2;

/// Evaluation rounds allowed per turn before control returns to the user.
pub const MAX_EVAL_ROUNDS: usize = 5;

const GREETING: &str = "Hello";
const REROUTE_INSTRUCTION: &str = "That's not right, try again. Pick one agent.";

/// Source of user messages, injected so the loop runs against scripted input
/// in tests and stdin in the CLI.
#[async_trait]
pub trait InputSource: Send {
    /// Next user message, or `None` at end of input.
    async fn next_message(&mut self) -> Result<Option<String>>;
}

/// Line-per-message stdin source for the CLI binary.
pub struct StdinSource {
    lines: Lines<BufReader<Stdin>>,
}

impl StdinSource {
    pub fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }
}

impl Default for StdinSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl InputSource for StdinSource {
    async fn next_message(&mut self) -> Result<Option<String>> {
        Ok(self.lines.next_line().await?)
    }
}

pub struct Driver {
    router: crate::router::Router,
    agents: AgentRegistry,
    evaluator: QualityEvaluator,
    state: ConversationState,
    history: ConversationHistory,
}

impl Driver {
    pub fn new(backend: Arc<dyn ChatBackend>, providers: &Providers) -> Self {
        Self {
            router: crate::router::Router::new(backend.clone()),
            agents: AgentRegistry::new(backend.clone(), providers),
            evaluator: QualityEvaluator::new(backend),
            state: ConversationState::new(),
            history: ConversationHistory::new(),
        }
    }

    pub fn state(&self) -> &ConversationState {
        &self.state
    }

    /// First turn: a synthesized greeting stands in for user input so the
    /// concierge opens the conversation.
    pub async fn greeting_turn(&mut self) -> Result<Vec<String>> {
        self.history
            .add_message(ConversationMessage::synthetic(GREETING));
        self.run_turn(GREETING.to_string()).await
    }

    /// One full turn for a real user message. A fresh message means a fresh
    /// topic, so research state resets; history is kept for context.
    pub async fn user_turn(&mut self, message: &str) -> Result<Vec<String>> {
        self.state.reset();
        self.history.add_message(ConversationMessage::user(message));
        self.run_turn(message.to_string()).await
    }

    /// Dispatch/eval cycle for one router input. Returns every agent reply
    /// the turn produced, in order.
    async fn run_turn(&mut self, message: String) -> Result<Vec<String>> {
        let mut replies = Vec::new();
        let mut message = message;
        let mut eval_rounds = 0;

        loop {
            let agent_name = self.route_with_retries(&message).await?;

            let agent = self.agents.get(agent_name).ok_or_else(|| {
                AgentError::RoutingInvalid(format!("no agent registered for {}", agent_name))
            })?;

            // The dispatched agent holds the floor until it signals
            // completion or the next user message resets the state. The
            // concierge never completes, so only the reset unpins it.
            self.state.current_agent = Some(agent_name);
            info!(agent = %agent_name, "dispatching");

            let reply = agent.respond(&self.state, &self.history, &message).await?;
            self.history
                .add_message(ConversationMessage::agent(reply.text.clone()));
            if let Some(completion) = reply.completion {
                self.state.mark_done(completion);
            }
            replies.push(reply.text);

            if !self.state.just_finished || eval_rounds >= MAX_EVAL_ROUNDS {
                self.state.clear_just_finished();
                return Ok(replies);
            }

            eval_rounds += 1;
            self.state.clear_just_finished();

            match self.evaluator.evaluate(&self.state, &self.history).await? {
                Evaluation::NoFurtherTask => return Ok(replies),
                Evaluation::FollowUp(follow_up) => {
                    info!(follow_up = follow_up.as_str(), "chaining follow-up work");
                    self.history
                        .add_message(ConversationMessage::synthetic(follow_up.clone()));
                    message = follow_up;
                }
            }
        }
    }

    async fn route_with_retries(&mut self, message: &str) -> Result<AgentName> {
        let mut input = message.to_string();
        let mut retries = 0;

        loop {
            match self
                .router
                .decide(&self.state, &self.history, &input)
                .await?
            {
                RouteDecision::Agent(agent) => return Ok(agent),
                RouteDecision::Invalid if retries < MAX_ROUTING_RETRIES => {
                    retries += 1;
                    warn!(retries, "invalid routing decision, reprompting");
                    self.history
                        .add_message(ConversationMessage::synthetic(REROUTE_INSTRUCTION));
                    input = format!("{}\n{}", REROUTE_INSTRUCTION, message);
                }
                RouteDecision::Invalid => {
                    return Err(AgentError::RoutingInvalid(format!(
                        "no valid agent after {} retries",
                        retries
                    )));
                }
            }
        }
    }

    /// Run the full conversation loop until the input source is exhausted.
    ///
    /// Turn-level failures, greeting included, are reported through `emit`
    /// and the loop keeps going; only unrecoverable errors stop it.
    pub async fn run<I, F>(&mut self, input: &mut I, mut emit: F) -> Result<()>
    where
        I: InputSource,
        F: FnMut(&str) + Send,
    {
        let greeting = self.greeting_turn().await;
        deliver(greeting, &mut emit)?;

        while let Some(message) = input.next_message().await? {
            if message.trim().is_empty() {
                continue;
            }

            let turn = self.user_turn(&message).await;
            deliver(turn, &mut emit)?;
        }

        Ok(())
    }
}

/// Report one turn's outcome, absorbing turn-level failures so the loop
/// returns to user input.
fn deliver<F>(result: Result<Vec<String>>, emit: &mut F) -> Result<()>
where
    F: FnMut(&str) + Send,
{
    match result {
        Ok(replies) => {
            for reply in replies {
                emit(&reply);
            }
            Ok(())
        }
        Err(err @ AgentError::RoutingInvalid(_)) => {
            warn!(error = %err, "turn abandoned");
            emit("Sorry, I couldn't work out how to help with that. Could you rephrase?");
            Ok(())
        }
        Err(err) if err.is_recoverable() => {
            warn!(error = %err, "turn failed");
            emit("Something went wrong handling that. Please try again.");
            Ok(())
        }
        Err(err) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::llm::ScriptedBackend;

    fn driver_with(replies: &[&str]) -> (Driver, Arc<ScriptedBackend>) {
        let backend = Arc::new(ScriptedBackend::new(replies.iter().copied()));
        let providers = Providers::new(&Config::default()).unwrap();
        (Driver::new(backend.clone(), &providers), backend)
    }

    #[tokio::test]
    async fn stock_turn_completes_and_stops_on_no_further_task() {
        let (mut driver, backend) = driver_with(&[
            // router
            "stock_lookup",
            // stock agent
            r#"{"action":"done","payload":"CRM","text":"Salesforce trades as CRM at $250."}"#,
            // evaluator
            "no_further_task",
        ]);

        let replies = driver
            .user_turn("What's Salesforce's stock price?")
            .await
            .unwrap();

        assert_eq!(replies, vec!["Salesforce trades as CRM at $250."]);
        assert_eq!(driver.state().ticker.as_deref(), Some("CRM"));
        assert_eq!(driver.state().current_agent, None);
        assert!(!driver.state().just_finished);
        assert_eq!(backend.remaining(), 0);
    }

    #[tokio::test]
    async fn evaluation_follow_up_chains_a_second_agent() {
        let (mut driver, backend) = driver_with(&[
            // router picks the stock agent
            "stock_lookup",
            r#"{"action":"done","payload":"CRM","text":"Salesforce trades as CRM."}"#,
            // evaluator restates the remaining work
            "Research the software industry around CRM.",
            // router picks the industry agent for the follow-up
            "industry_research",
            r#"{"action":"done","payload":"CRM peers: MSFT, ORCL, SAP.","text":"CRM's peers are MSFT, ORCL, and SAP."}"#,
            "no_further_task",
        ]);

        let replies = driver
            .user_turn("Find Salesforce's ticker and research its industry")
            .await
            .unwrap();

        assert_eq!(replies.len(), 2);
        assert_eq!(driver.state().ticker.as_deref(), Some("CRM"));
        assert_eq!(
            driver.state().industry_research.as_deref(),
            Some("CRM peers: MSFT, ORCL, SAP.")
        );
        assert_eq!(backend.remaining(), 0);
    }

    #[tokio::test]
    async fn routing_retries_are_bounded() {
        let (mut driver, backend) = driver_with(&[
            "portfolio_wizard",
            "still_not_an_agent",
            "nope",
        ]);

        let err = driver.user_turn("do something").await.unwrap_err();
        assert!(matches!(err, AgentError::RoutingInvalid(_)));
        // Abandoned on the third invalid reply, no further backend calls.
        assert_eq!(backend.remaining(), 0);
    }

    #[tokio::test]
    async fn pinned_agent_answers_follow_up_without_rerouting() {
        let (mut driver, _backend) = driver_with(&[
            // first turn routes to company research, which keeps the floor
            "company_research",
            r#"{"action":"reply","text":"Which company? Give me a ticker."}"#,
            // second turn: no router call, agent answers directly
            r#"{"action":"done","payload":"CRM profile researched.","text":"Done: CRM profile."}"#,
            "no_further_task",
        ]);

        let first = driver.user_turn("Research a company for me").await.unwrap();
        assert_eq!(first, vec!["Which company? Give me a ticker."]);
        assert_eq!(
            driver.state().current_agent,
            Some(AgentName::CompanyResearch)
        );

        // Follow-up within the sub-task must not reset the pinned agent, so
        // it goes through the turn-affinity path.
        driver
            .history
            .add_message(ConversationMessage::user("CRM"));
        let second = driver.run_turn("CRM".to_string()).await.unwrap();
        assert_eq!(second, vec!["Done: CRM profile."]);
        assert_eq!(driver.state().current_agent, None);
    }

    #[tokio::test]
    async fn greeting_turn_opens_via_concierge() {
        let (mut driver, _backend) = driver_with(&[
            "concierge",
            "Hi! I can research stocks, companies, industries, and consumer sentiment.",
        ]);

        let replies = driver.greeting_turn().await.unwrap();
        assert_eq!(replies.len(), 1);
        assert!(replies[0].contains("research"));
        // The concierge holds the floor until the next user message resets
        // the state.
        assert_eq!(driver.state().current_agent, Some(AgentName::Concierge));

        driver.state.reset();
        assert_eq!(driver.state().current_agent, None);
    }

    #[tokio::test]
    async fn run_loop_reports_abandoned_turns_and_continues() {
        struct Script(Vec<&'static str>);

        #[async_trait]
        impl InputSource for Script {
            async fn next_message(&mut self) -> Result<Option<String>> {
                Ok(if self.0.is_empty() {
                    None
                } else {
                    Some(self.0.remove(0).to_string())
                })
            }
        }

        let (mut driver, _backend) = driver_with(&[
            // greeting
            "concierge",
            "Hello! What would you like to research?",
            // first user turn: routing never resolves
            "garbage",
            "garbage",
            "garbage",
            // second user turn succeeds
            "stock_lookup",
            r#"{"action":"done","payload":"AAPL","text":"Apple trades as AAPL."}"#,
            "no_further_task",
        ]);

        let mut seen = Vec::new();
        let mut input = Script(vec!["do something weird", "What's Apple's ticker?"]);
        driver
            .run(&mut input, |reply| seen.push(reply.to_string()))
            .await
            .unwrap();

        assert_eq!(seen.len(), 3);
        assert!(seen[1].contains("rephrase"));
        assert_eq!(seen[2], "Apple trades as AAPL.");
    }

    #[tokio::test]
    async fn run_loop_survives_a_failed_greeting_turn() {
        struct Script(Vec<&'static str>);

        #[async_trait]
        impl InputSource for Script {
            async fn next_message(&mut self) -> Result<Option<String>> {
                Ok(if self.0.is_empty() {
                    None
                } else {
                    Some(self.0.remove(0).to_string())
                })
            }
        }

        let (mut driver, backend) = driver_with(&[
            // greeting routing never resolves
            "garbage",
            "garbage",
            "garbage",
            // the pending user turn still gets served
            "stock_lookup",
            r#"{"action":"done","payload":"AAPL","text":"Apple trades as AAPL."}"#,
            "no_further_task",
        ]);

        let mut seen = Vec::new();
        let mut input = Script(vec!["What's Apple's ticker?"]);
        driver
            .run(&mut input, |reply| seen.push(reply.to_string()))
            .await
            .unwrap();

        assert_eq!(seen.len(), 2);
        assert!(seen[0].contains("rephrase"));
        assert_eq!(seen[1], "Apple trades as AAPL.");
        assert_eq!(backend.remaining(), 0);
    }
}
