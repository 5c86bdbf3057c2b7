use agentry_core::agent::{AgentKind, ExecutorLimits};
use agentry_core::error::Result;
use agentry_core::provider::LanguageModel;
use agentry_core::tool::Toolkit;
use agentry_tools::{JsonSpec, JsonToolkit};
use async_trait::async_trait;
use tracing::debug;

use super::{AgentOptions, AgentRecipe, build_executor, require};
use crate::agents::ReactAgent;
use crate::executor::AgentExecutor;
use crate::prompt::PromptParts;
use crate::templates;

/// Explores a JSON document by listing keys and reading values.
///
/// Reads `json` when given, otherwise loads the document from `path`.
pub struct JsonAgentRecipe;

#[async_trait]
impl AgentRecipe for JsonAgentRecipe {
    fn describe(&self) -> AgentKind {
        "JsonAgent".into()
    }

    fn summary(&self) -> &'static str {
        "Answers questions about a JSON document by navigating its keys"
    }

    fn required_options(&self) -> &'static [&'static str] {
        &["path"]
    }

    async fn construct(&self, llm: LanguageModel, options: AgentOptions) -> Result<AgentExecutor> {
        let kind = self.describe();
        let spec = match &options.json {
            Some(value) => JsonSpec::new(value.clone()),
            None => JsonSpec::from_path(require(options.path.as_ref(), &kind, "path")?)?,
        };
        let tools = JsonToolkit::new(spec).tools();
        debug!(kind = %kind, tools = tools.len(), "Constructing JSON agent");

        let parts = PromptParts::zero_shot(templates::JSON_PREFIX).with_suffix(templates::JSON_SUFFIX);
        let agent = ReactAgent::zero_shot(llm, &tools, &parts)?;
        build_executor(kind, agent, tools, ExecutorLimits::default(), &options)
    }
}
