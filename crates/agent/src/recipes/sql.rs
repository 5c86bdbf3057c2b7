use agentry_core::agent::{AgentKind, EarlyStopping, ExecutorLimits};
use agentry_core::error::Result;
use agentry_core::prompt::PromptTemplate;
use agentry_core::provider::LanguageModel;
use agentry_core::tool::Toolkit;
use agentry_tools::{SqlDatabase, SqlDatabaseToolkit};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

use super::{AgentOptions, AgentRecipe, build_executor, require};
use crate::agents::ReactAgent;
use crate::executor::AgentExecutor;
use crate::prompt::PromptParts;
use crate::templates;

/// Answers questions by exploring and querying a SQL database.
///
/// The four tools share one connection pool; it closes when the executor
/// (and with it the last tool) is dropped.
pub struct SqlAgentRecipe;

#[async_trait]
impl AgentRecipe for SqlAgentRecipe {
    fn describe(&self) -> AgentKind {
        "SQLAgent".into()
    }

    fn summary(&self) -> &'static str {
        "Answers questions by listing, describing and querying a SQL database"
    }

    fn required_options(&self) -> &'static [&'static str] {
        &["database_uri"]
    }

    async fn construct(&self, llm: LanguageModel, options: AgentOptions) -> Result<AgentExecutor> {
        let kind = self.describe();
        let uri = require(options.database_uri.as_deref(), &kind, "database_uri")?;
        let db = Arc::new(SqlDatabase::from_uri(uri).await?);
        let toolkit = SqlDatabaseToolkit::new(db, llm.clone());

        let values = HashMap::from([
            ("dialect".to_string(), toolkit.dialect().to_string()),
            ("top_k".to_string(), templates::SQL_TOP_K.to_string()),
        ]);
        let prefix = PromptTemplate::from_template(templates::SQL_PREFIX).format(&values)?;
        let parts = PromptParts::zero_shot(prefix).with_suffix(templates::SQL_SUFFIX);

        let tools = toolkit.tools();
        let agent = ReactAgent::zero_shot(llm, &tools, &parts)?;
        let limits = ExecutorLimits::default()
            .with_max_iterations(15)
            .with_early_stopping(EarlyStopping::Force);
        build_executor(kind, agent, tools, limits, &options)
    }
}
