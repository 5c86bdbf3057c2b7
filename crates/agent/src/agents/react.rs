//! ReAct pattern: Thought → Action → Observation, rendered as text.
//!
//! The model sees the assembled prompt with a scratchpad of earlier steps
//! appended, written the same way the model itself writes them:
//!
//! ```text
//! Thought: I should look at the tables.
//! Action: sql_db_list_tables
//! Action Input:
//! Observation: orders, customers
//! Thought:
//! ```
//!
//! Generation stops before the model invents its own observation. One type
//! covers the zero-shot, chat, conversational and self-ask flavours; they
//! differ only in prompt, parser, prefixes and stop sequence.

use agentry_core::chain::LlmChain;
use agentry_core::error::{Error, Result};
use agentry_core::message::Message;
use agentry_core::prompt::PromptTemplate;
use agentry_core::provider::LanguageModel;
use agentry_core::tool::Tool;
use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::debug;

use super::{Agent, AgentDecision, AgentFinish, AgentStep, AgentStrategy, PlanError};
use crate::output_parser::{
    ChatOutputParser, ConversationalOutputParser, INTERMEDIATE_ANSWER, MrklOutputParser,
    OutputParser, SelfAskOutputParser,
};
use crate::prompt::{PromptParts, assemble};
use crate::templates;

const CHAT_SCRATCHPAD_INTRO: &str = "This was your previous work \
(but I haven't seen any of it! I only see what you return as final answer):\n";

enum Mode {
    /// The rendered prompt is sent as one user message.
    Completion,
    /// The assembled prompt is the system message; `human` renders the user turn.
    Chat { human: PromptTemplate },
}

pub struct ReactAgent {
    strategy: AgentStrategy,
    chain: LlmChain,
    mode: Mode,
    prompt_text: String,
    parser: Box<dyn OutputParser>,
    observation_prefix: String,
    llm_prefix: String,
    stop: Vec<String>,
    allowed: BTreeSet<String>,
    /// Inputs rendered as empty text when the caller has none (e.g. no memory).
    optional_inputs: Vec<String>,
}

fn allowed_names(tools: &[Arc<dyn Tool>]) -> BTreeSet<String> {
    tools.iter().map(|t| t.name().to_string()).collect()
}

impl ReactAgent {
    fn with_prompt(
        strategy: AgentStrategy,
        llm: LanguageModel,
        prompt: PromptTemplate,
        parser: Box<dyn OutputParser>,
        allowed: BTreeSet<String>,
    ) -> Self {
        Self {
            strategy,
            prompt_text: prompt.template().to_string(),
            chain: LlmChain::new(llm, prompt),
            mode: Mode::Completion,
            parser,
            observation_prefix: "Observation: ".into(),
            llm_prefix: "Thought:".into(),
            stop: vec!["\nObservation:".into()],
            allowed,
            optional_inputs: Vec::new(),
        }
    }

    /// Zero-shot ReAct over `tools` with the given prompt layout.
    pub fn zero_shot(llm: LanguageModel, tools: &[Arc<dyn Tool>], parts: &PromptParts) -> Result<Self> {
        let prompt = assemble(tools, parts)?;
        Ok(Self::with_prompt(
            AgentStrategy::ZeroShotReact,
            llm,
            prompt.template().clone(),
            Box::new(MrklOutputParser),
            allowed_names(tools),
        ))
    }

    /// ReAct for chat models: instructions in a system message, actions as JSON blobs.
    pub fn chat_zero_shot(llm: LanguageModel, tools: &[Arc<dyn Tool>]) -> Result<Self> {
        let parts = PromptParts::zero_shot(templates::CHAT_PREFIX)
            .with_format_instructions(templates::CHAT_FORMAT_INSTRUCTIONS)
            .with_suffix(templates::CHAT_SUFFIX);
        let system = assemble(tools, &parts)?;
        let human = PromptTemplate::new(
            templates::CHAT_HUMAN_MESSAGE,
            vec!["input".into(), "agent_scratchpad".into()],
        )?;

        let mut agent = Self::with_prompt(
            AgentStrategy::ChatZeroShotReact,
            llm,
            system.template().clone(),
            Box::new(ChatOutputParser),
            allowed_names(tools),
        );
        agent.prompt_text = format!("{}\n\n{}", system.text(), human.template());
        agent.mode = Mode::Chat { human };
        agent.stop = vec!["Observation:".into()];
        Ok(agent)
    }

    /// ReAct that keeps a conversation going; answers are prefixed with `ai_prefix`.
    pub fn conversational(
        llm: LanguageModel,
        tools: &[Arc<dyn Tool>],
        ai_prefix: &str,
    ) -> Result<Self> {
        let parts = PromptParts::zero_shot(templates::CONVERSATIONAL_PREFIX)
            .with_format_instructions(
                templates::CONVERSATIONAL_FORMAT_INSTRUCTIONS.replace("{ai_prefix}", ai_prefix),
            )
            .with_suffix(templates::CONVERSATIONAL_SUFFIX)
            .with_input_variables(["input", "chat_history", "agent_scratchpad"])
            .with_tool_bullet("> ");
        let prompt = assemble(tools, &parts)?;

        let mut agent = Self::with_prompt(
            AgentStrategy::ConversationalReact,
            llm,
            prompt.template().clone(),
            Box::new(ConversationalOutputParser::new(ai_prefix)),
            allowed_names(tools),
        );
        agent.optional_inputs = vec!["chat_history".into()];
        Ok(agent)
    }

    /// Self-ask: the model asks follow-up questions answered by one search tool.
    ///
    /// Requires exactly one tool, named `Intermediate Answer`.
    pub fn self_ask(llm: LanguageModel, tools: &[Arc<dyn Tool>]) -> Result<Self> {
        match tools {
            [tool] if tool.name() == INTERMEDIATE_ANSWER => {}
            _ => {
                return Err(Error::InvalidToolset {
                    strategy: AgentStrategy::SelfAskWithSearch.to_string(),
                    reason: format!(
                        "exactly one tool named '{INTERMEDIATE_ANSWER}' is required, got [{}]",
                        tools.iter().map(|t| t.name()).collect::<Vec<_>>().join(", ")
                    ),
                });
            }
        }
        let prompt = PromptTemplate::new(
            templates::SELF_ASK_PROMPT,
            vec!["input".into(), "agent_scratchpad".into()],
        )?;

        let mut agent = Self::with_prompt(
            AgentStrategy::SelfAskWithSearch,
            llm,
            prompt,
            Box::new(SelfAskOutputParser),
            allowed_names(tools),
        );
        agent.observation_prefix = "Intermediate answer: ".into();
        agent.llm_prefix = String::new();
        agent.stop = vec!["\nIntermediate answer:".into()];
        Ok(agent)
    }

    /// Stop sequences sent with every model call.
    pub fn stop(&self) -> &[String] {
        &self.stop
    }

    /// Earlier steps rendered the way the model writes them.
    fn scratchpad(&self, steps: &[AgentStep]) -> String {
        let mut thoughts = String::new();
        for step in steps {
            thoughts.push_str(&step.log);
            thoughts.push('\n');
            thoughts.push_str(&self.observation_prefix);
            thoughts.push_str(&step.observation);
            thoughts.push('\n');
            thoughts.push_str(&self.llm_prefix);
        }
        if matches!(self.mode, Mode::Chat { .. }) && !thoughts.is_empty() {
            thoughts.insert_str(0, CHAT_SCRATCHPAD_INTRO);
        }
        thoughts
    }

    async fn predict(&self, inputs: &HashMap<String, String>, scratchpad: String) -> Result<String> {
        let mut values = inputs.clone();
        for name in &self.optional_inputs {
            values.entry(name.clone()).or_default();
        }
        values.insert("agent_scratchpad".into(), scratchpad);

        match &self.mode {
            Mode::Completion => self.chain.predict(&values, &self.stop).await,
            Mode::Chat { human } => {
                let messages = vec![
                    Message::system(self.chain.prompt().format(&values)?),
                    Message::user(human.format(&values)?),
                ];
                Ok(self.chain.llm().chat(messages, &self.stop).await?)
            }
        }
    }
}

#[async_trait]
impl Agent for ReactAgent {
    fn strategy(&self) -> AgentStrategy {
        self.strategy
    }

    fn prompt_text(&self) -> &str {
        &self.prompt_text
    }

    fn allowed_tools(&self) -> &BTreeSet<String> {
        &self.allowed
    }

    fn input_keys(&self) -> Vec<String> {
        let mut keys = vec!["input".to_string()];
        keys.extend(self.optional_inputs.iter().cloned());
        keys
    }

    async fn plan(
        &self,
        inputs: &HashMap<String, String>,
        steps: &[AgentStep],
    ) -> std::result::Result<AgentDecision, PlanError> {
        let text = self.predict(inputs, self.scratchpad(steps)).await?;
        debug!(strategy = %self.strategy, chars = text.len(), "Model step");
        Ok(self.parser.parse(&text)?)
    }

    async fn finish_early(
        &self,
        inputs: &HashMap<String, String>,
        steps: &[AgentStep],
    ) -> Result<AgentFinish> {
        let mut scratchpad = self.scratchpad(steps);
        scratchpad.push_str(templates::GENERATE_FINAL_ANSWER);
        let text = self.predict(inputs, scratchpad).await?;
        match self.parser.parse(&text) {
            Ok(AgentDecision::Finish(finish)) => Ok(finish),
            _ => Ok(AgentFinish {
                answer: text.clone(),
                log: text,
            }),
        }
    }
}
