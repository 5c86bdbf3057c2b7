use agentry_core::agent::{AgentKind, ExecutorLimits};
use agentry_core::error::Result;
use agentry_core::provider::LanguageModel;
use agentry_core::tool::Toolkit;
use agentry_tools::{VectorStoreRouterToolkit, VectorStoreToolkit};
use async_trait::async_trait;
use tracing::warn;

use super::{AgentOptions, AgentRecipe, build_executor, missing, require};
use crate::agents::ReactAgent;
use crate::executor::AgentExecutor;
use crate::prompt::PromptParts;
use crate::templates;

/// Question answering over a single vector store, with or without sources.
pub struct VectorStoreAgentRecipe;

#[async_trait]
impl AgentRecipe for VectorStoreAgentRecipe {
    fn describe(&self) -> AgentKind {
        "VectorStoreAgent".into()
    }

    fn summary(&self) -> &'static str {
        "Answers questions from one document collection, optionally citing sources"
    }

    fn required_options(&self) -> &'static [&'static str] {
        &["vectorstoreinfo"]
    }

    async fn construct(&self, llm: LanguageModel, options: AgentOptions) -> Result<AgentExecutor> {
        let kind = self.describe();
        let info = require(options.vector_stores.first().cloned(), &kind, "vectorstoreinfo")?;
        if options.vector_stores.len() > 1 {
            warn!(kind = %kind, stores = options.vector_stores.len(), "Only the first vector store is used");
        }

        let tools = VectorStoreToolkit::new(info, llm.clone()).tools();
        let agent = ReactAgent::zero_shot(llm, &tools, &PromptParts::zero_shot(templates::VECTORSTORE_PREFIX))?;
        build_executor(kind, agent, tools, ExecutorLimits::default(), &options)
    }
}

/// Routes each question to the relevant store among several.
pub struct VectorStoreRouterAgentRecipe;

#[async_trait]
impl AgentRecipe for VectorStoreRouterAgentRecipe {
    fn describe(&self) -> AgentKind {
        "VectorStoreRouterAgent".into()
    }

    fn summary(&self) -> &'static str {
        "Routes questions between several document collections"
    }

    fn required_options(&self) -> &'static [&'static str] {
        &["vectorstoreinfo"]
    }

    async fn construct(&self, llm: LanguageModel, options: AgentOptions) -> Result<AgentExecutor> {
        let kind = self.describe();
        if options.vector_stores.is_empty() {
            return Err(missing(&kind, "vectorstoreinfo"));
        }

        let tools = VectorStoreRouterToolkit::new(options.vector_stores.clone(), llm.clone()).tools();
        let parts = PromptParts::zero_shot(templates::VECTORSTORE_ROUTER_PREFIX);
        let agent = ReactAgent::zero_shot(llm, &tools, &parts)?;
        build_executor(kind, agent, tools, ExecutorLimits::default(), &options)
    }
}
