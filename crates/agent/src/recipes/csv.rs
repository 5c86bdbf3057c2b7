use agentry_core::agent::{AgentKind, ExecutorLimits};
use agentry_core::error::Result;
use agentry_core::provider::LanguageModel;
use agentry_core::tool::Tool;
use agentry_tools::{Table, TableQueryTool};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

use super::{AgentOptions, AgentRecipe, build_executor, require};
use crate::agents::ReactAgent;
use crate::executor::AgentExecutor;
use crate::prompt::PromptParts;
use crate::templates;

/// Rows shown to the model as `df.head()`.
const PREVIEW_ROWS: usize = 5;

/// Loads a CSV file as `df` and answers questions with dataframe expressions.
pub struct CsvAgentRecipe;

#[async_trait]
impl AgentRecipe for CsvAgentRecipe {
    fn describe(&self) -> AgentKind {
        "CSVAgent".into()
    }

    fn summary(&self) -> &'static str {
        "Answers questions about a CSV file loaded as the dataframe `df`"
    }

    fn required_options(&self) -> &'static [&'static str] {
        &["path"]
    }

    async fn construct(&self, llm: LanguageModel, options: AgentOptions) -> Result<AgentExecutor> {
        let kind = self.describe();
        let path = require(options.path.as_ref(), &kind, "path")?;
        let table = Table::from_path(path, &options.csv_options)?;
        info!(path = %path.display(), rows = table.len(), columns = table.columns().len(), "CSV loaded");

        let parts = PromptParts::zero_shot(templates::TABLE_PREFIX)
            .with_suffix(templates::TABLE_SUFFIX_WITH_DF)
            .with_input_variables(["df", "input", "agent_scratchpad"])
            .with_partial("df", table.head(PREVIEW_ROWS));
        let tools: Vec<Arc<dyn Tool>> = vec![Arc::new(TableQueryTool::new(Arc::new(table)))];
        let agent = ReactAgent::zero_shot(llm, &tools, &parts)?;
        build_executor(kind, agent, tools, ExecutorLimits::default(), &options)
    }
}
