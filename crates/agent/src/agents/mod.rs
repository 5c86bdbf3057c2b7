//! Step-selection agents.
//!
//! An [`Agent`] looks at the input and the steps taken so far and decides
//! what happens next: call a tool, or finish. The executor owns the loop;
//! agents only plan.

pub mod autonomous;
pub mod react;

pub use autonomous::AutonomousAgent;
pub use react::ReactAgent;

use agentry_core::error::{Error, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;
use crate::output_parser::ParseError;

/// A tool invocation proposed by the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentAction {
    pub tool: String,
    pub tool_input: String,
    /// Raw model text the action was parsed from.
    pub log: String,
}

/// The model's final answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentFinish {
    pub answer: String,
    pub log: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentDecision {
    Act(AgentAction),
    Finish(AgentFinish),
}

/// One completed step of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgentStep {
    pub thought: String,
    pub tool: String,
    pub tool_input: String,
    pub observation: String,
    #[serde(skip)]
    pub log: String,
}

impl AgentStep {
    pub fn new(action: AgentAction, observation: impl Into<String>) -> Self {
        Self {
            thought: thought_of(&action.log),
            tool: action.tool,
            tool_input: action.tool_input,
            observation: observation.into(),
            log: action.log,
        }
    }
}

/// The reasoning that precedes the action in a model response.
fn thought_of(log: &str) -> String {
    let end = if log.trim_start().starts_with("Action:") {
        0
    } else {
        log.find("\nAction:").unwrap_or(log.len())
    };
    let thought = log[..end].trim();
    thought.strip_prefix("Thought:").unwrap_or(thought).trim().to_string()
}

/// Why planning did not yield a decision.
#[derive(Debug)]
pub enum PlanError {
    /// Malformed output; the executor feeds a correction back.
    Parse(ParseError),
    Fatal(Error),
}

impl From<Error> for PlanError {
    fn from(error: Error) -> Self {
        Self::Fatal(error)
    }
}

impl From<ParseError> for PlanError {
    fn from(error: ParseError) -> Self {
        Self::Parse(error)
    }
}

/// Built-in reasoning strategies selectable by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AgentStrategy {
    ZeroShotReact,
    ChatZeroShotReact,
    ConversationalReact,
    SelfAskWithSearch,
    /// Persona-driven JSON command loop; not selectable by name.
    Autonomous,
}

impl AgentStrategy {
    /// Strategies accepted by [`FromStr`].
    pub const SELECTABLE: [AgentStrategy; 4] = [
        Self::ZeroShotReact,
        Self::ChatZeroShotReact,
        Self::ConversationalReact,
        Self::SelfAskWithSearch,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::ZeroShotReact => "zero-shot-react-description",
            Self::ChatZeroShotReact => "chat-zero-shot-react-description",
            Self::ConversationalReact => "conversational-react-description",
            Self::SelfAskWithSearch => "self-ask-with-search",
            Self::Autonomous => "autonomous",
        }
    }
}

impl fmt::Display for AgentStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgentStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::SELECTABLE
            .into_iter()
            .find(|strategy| strategy.as_str() == s)
            .ok_or_else(|| Error::UnsupportedStrategy {
                strategy: s.to_string(),
                supported: Self::SELECTABLE
                    .iter()
                    .map(|s| s.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }
}

#[async_trait]
pub trait Agent: Send + Sync {
    fn strategy(&self) -> AgentStrategy;

    /// Prompt text the agent plans with, placeholders included.
    fn prompt_text(&self) -> &str;

    /// Tools this agent may call.
    fn allowed_tools(&self) -> &BTreeSet<String>;

    /// Extra input variables this agent reads (memory keys, for example).
    fn input_keys(&self) -> Vec<String> {
        vec!["input".into()]
    }

    /// Decide the next action from the input and the steps so far.
    async fn plan(
        &self,
        inputs: &HashMap<String, String>,
        steps: &[AgentStep],
    ) -> std::result::Result<AgentDecision, PlanError>;

    /// One last model pass asking for an answer from the steps so far.
    async fn finish_early(
        &self,
        inputs: &HashMap<String, String>,
        steps: &[AgentStep],
    ) -> Result<AgentFinish>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_round_trips_through_names() {
        for strategy in AgentStrategy::SELECTABLE {
            assert_eq!(strategy.as_str().parse::<AgentStrategy>().unwrap(), strategy);
        }
    }

    #[test]
    fn unknown_strategy_lists_supported_ones() {
        let err = "plan-and-execute".parse::<AgentStrategy>().unwrap_err();
        match err {
            Error::UnsupportedStrategy { strategy, supported } => {
                assert_eq!(strategy, "plan-and-execute");
                assert!(supported.contains("self-ask-with-search"));
                assert!(!supported.contains("autonomous"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!("autonomous".parse::<AgentStrategy>().is_err());
    }

    #[test]
    fn step_extracts_thought() {
        let step = AgentStep::new(
            AgentAction {
                tool: "calculator".into(),
                tool_input: "2+2".into(),
                log: " I need to add.\nAction: calculator\nAction Input: 2+2".into(),
            },
            "4",
        );
        assert_eq!(step.thought, "I need to add.");
        assert_eq!(step.observation, "4");
    }

    #[test]
    fn thought_keeps_words_that_start_with_action() {
        let action = |log: &str| AgentAction {
            tool: "search".into(),
            tool_input: "x".into(),
            log: log.into(),
        };
        let step = AgentStep::new(
            action("Thought: Actionable plan first, then an Action item.\nAction: search\nAction Input: x"),
            "found",
        );
        assert_eq!(step.thought, "Actionable plan first, then an Action item.");

        let step = AgentStep::new(action("Action: search\nAction Input: x"), "found");
        assert_eq!(step.thought, "");
    }
}
