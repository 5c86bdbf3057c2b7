use agentry_core::agent::{AgentKind, ExecutorLimits, Persona};
use agentry_core::error::Result;
use agentry_core::provider::LanguageModel;
use async_trait::async_trait;

use super::{AgentOptions, AgentRecipe, build_executor, require};
use crate::agents::AutonomousAgent;
use crate::executor::AgentExecutor;

/// Autonomous persona agent over caller-supplied tools.
///
/// Runs return the answer only; steps are never included.
pub struct AutoGptAgentRecipe;

#[async_trait]
impl AgentRecipe for AutoGptAgentRecipe {
    fn describe(&self) -> AgentKind {
        "AutoGPTAgent".into()
    }

    fn summary(&self) -> &'static str {
        "Autonomous agent with a name and role that works toward the input goal"
    }

    fn required_options(&self) -> &'static [&'static str] {
        &["ai_name", "ai_role"]
    }

    async fn construct(&self, llm: LanguageModel, options: AgentOptions) -> Result<AgentExecutor> {
        let kind = self.describe();
        let persona = Persona {
            name: require(options.ai_name.clone(), &kind, "ai_name")?,
            role: require(options.ai_role.clone(), &kind, "ai_role")?,
        };
        let tools = options.tools.clone();
        let agent = AutonomousAgent::new(llm, persona, &tools);

        // TODO: decide whether autonomous runs should also expose the command
        // transcript on the run result; for now they return the answer alone.
        let mut executor = build_executor(kind, agent, tools, ExecutorLimits::default(), &options)?
            .with_return_intermediate_steps(false);
        if let Some(memory) = &options.memory {
            executor = executor.with_memory(memory.clone());
        }
        Ok(executor)
    }
}
