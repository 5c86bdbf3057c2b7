use agentry_core::agent::{AgentKind, ExecutorLimits};
use agentry_core::error::{Error, Result};
use agentry_core::provider::LanguageModel;
use async_trait::async_trait;

use super::{AgentOptions, AgentRecipe, build_executor, require};
use crate::agents::{AgentStrategy, ReactAgent};
use crate::executor::AgentExecutor;
use crate::prompt::PromptParts;
use crate::templates;

/// Prefix conversational agents answer with.
const AI_PREFIX: &str = "AI";

fn unsupported(strategy: AgentStrategy) -> Error {
    Error::UnsupportedStrategy {
        strategy: strategy.to_string(),
        supported: AgentStrategy::SELECTABLE
            .iter()
            .map(|s| s.as_str())
            .collect::<Vec<_>>()
            .join(", "),
    }
}

/// Builds a generic agent over caller-supplied tools from a strategy name.
///
/// Always returns intermediate steps. `memory`, when given, is loaded before
/// and saved after every run.
pub struct AgentInitializerRecipe;

#[async_trait]
impl AgentRecipe for AgentInitializerRecipe {
    fn describe(&self) -> AgentKind {
        "AgentInitializer".into()
    }

    fn summary(&self) -> &'static str {
        "Generic agent over the given tools, built from a named strategy"
    }

    fn required_options(&self) -> &'static [&'static str] {
        &["agent"]
    }

    async fn construct(&self, llm: LanguageModel, options: AgentOptions) -> Result<AgentExecutor> {
        let kind = self.describe();
        let strategy: AgentStrategy = require(options.strategy.as_deref(), &kind, "agent")?.parse()?;
        let tools = options.tools.clone();

        let agent = match strategy {
            AgentStrategy::ZeroShotReact => {
                ReactAgent::zero_shot(llm, &tools, &PromptParts::zero_shot(templates::PREFIX))?
            }
            AgentStrategy::ChatZeroShotReact => ReactAgent::chat_zero_shot(llm, &tools)?,
            AgentStrategy::ConversationalReact => ReactAgent::conversational(llm, &tools, AI_PREFIX)?,
            AgentStrategy::SelfAskWithSearch => ReactAgent::self_ask(llm, &tools)?,
            AgentStrategy::Autonomous => return Err(unsupported(strategy)),
        };

        let mut executor = build_executor(kind, agent, tools, ExecutorLimits::default(), &options)?
            .with_return_intermediate_steps(true);
        if let Some(memory) = &options.memory {
            executor = executor.with_memory(memory.clone());
        }
        Ok(executor)
    }
}
