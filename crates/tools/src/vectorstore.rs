//! Question answering over vector stores.
//!
//! Each QA tool retrieves the closest documents for the question and asks the
//! model to answer from them.

use async_trait::async_trait;
use agentry_core::chain::LlmChain;
use agentry_core::error::ToolError;
use agentry_core::memory::{Document, VectorStoreInfo};
use agentry_core::prompt::PromptTemplate;
use agentry_core::provider::LanguageModel;
use agentry_core::tool::{Tool, Toolkit};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Documents retrieved per question.
const RETRIEVED_DOCUMENTS: usize = 4;

pub const QA_PROMPT: &str = "Use the following pieces of context to answer the question at the end. \
If you don't know the answer, say that you don't know instead of making one up.

{context}

Question: {question}
Helpful Answer:";

/// Answers questions from one vector store, optionally citing sources.
pub struct VectorStoreQaTool {
    name: String,
    description: String,
    info: VectorStoreInfo,
    chain: LlmChain,
    with_sources: bool,
}

impl VectorStoreQaTool {
    pub fn new(info: VectorStoreInfo, llm: LanguageModel) -> Self {
        let description = format!(
            "Useful for when you need to answer questions about {}. Whenever you need \
             information about {} you should ALWAYS use this. Input should be a fully formed question.",
            info.name, info.description
        );
        Self {
            name: info.name.clone(),
            description,
            info,
            chain: LlmChain::new(llm, PromptTemplate::from_template(QA_PROMPT)),
            with_sources: false,
        }
    }

    /// The `{name}_with_sources` variant, answering with JSON `{answer, sources}`.
    pub fn with_sources(info: VectorStoreInfo, llm: LanguageModel) -> Self {
        let description = format!(
            "Useful for when you need to answer questions about {} and the sources used to \
             construct the answer. Whenever you need information about {} you should ALWAYS use \
             this. Input should be a fully formed question. Output is a json serialized dictionary \
             with keys `answer` and `sources`. Only use this tool if the user explicitly asks for sources.",
            info.name, info.description
        );
        Self {
            name: format!("{}_with_sources", info.name),
            description,
            info,
            chain: LlmChain::new(llm, PromptTemplate::from_template(QA_PROMPT)),
            with_sources: true,
        }
    }

    async fn answer(&self, question: &str, documents: &[Document]) -> Result<String, ToolError> {
        let context = documents
            .iter()
            .map(|d| d.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");
        let values = HashMap::from([
            ("context".to_string(), context),
            ("question".to_string(), question.to_string()),
        ]);
        let answer = self
            .chain
            .predict(&values, &[])
            .await
            .map_err(|e| ToolError::ExecutionFailed {
                tool_name: self.name.clone(),
                reason: e.to_string(),
            })?;
        Ok(answer.trim().to_string())
    }
}

#[async_trait]
impl Tool for VectorStoreQaTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    async fn call(&self, input: &str) -> Result<String, ToolError> {
        let documents = self
            .info
            .store
            .similarity_search(input, RETRIEVED_DOCUMENTS)
            .await
            .map_err(|e| ToolError::ExecutionFailed {
                tool_name: self.name.clone(),
                reason: e.to_string(),
            })?;
        debug!(tool = %self.name, retrieved = documents.len(), "Vector store retrieval");

        let answer = self.answer(input, &documents).await?;
        if !self.with_sources {
            return Ok(answer);
        }

        let mut sources: Vec<&str> = Vec::new();
        for source in documents.iter().filter_map(Document::source) {
            if !sources.contains(&source) {
                sources.push(source);
            }
        }
        Ok(serde_json::json!({
            "answer": answer,
            "sources": sources.join(", "),
        })
        .to_string())
    }
}

/// QA and QA-with-sources tools over a single store.
pub struct VectorStoreToolkit {
    info: VectorStoreInfo,
    llm: LanguageModel,
}

impl VectorStoreToolkit {
    pub fn new(info: VectorStoreInfo, llm: LanguageModel) -> Self {
        Self { info, llm }
    }

    pub fn info(&self) -> &VectorStoreInfo {
        &self.info
    }
}

impl Toolkit for VectorStoreToolkit {
    fn tools(&self) -> Vec<Arc<dyn Tool>> {
        vec![
            Arc::new(VectorStoreQaTool::new(self.info.clone(), self.llm.clone())),
            Arc::new(VectorStoreQaTool::with_sources(
                self.info.clone(),
                self.llm.clone(),
            )),
        ]
    }
}

/// One QA tool per store, letting the agent route questions between them.
pub struct VectorStoreRouterToolkit {
    stores: Vec<VectorStoreInfo>,
    llm: LanguageModel,
}

impl VectorStoreRouterToolkit {
    pub fn new(stores: Vec<VectorStoreInfo>, llm: LanguageModel) -> Self {
        Self { stores, llm }
    }

    pub fn stores(&self) -> &[VectorStoreInfo] {
        &self.stores
    }
}

impl Toolkit for VectorStoreRouterToolkit {
    fn tools(&self) -> Vec<Arc<dyn Tool>> {
        self.stores
            .iter()
            .map(|info| {
                Arc::new(VectorStoreQaTool::new(info.clone(), self.llm.clone())) as Arc<dyn Tool>
            })
            .collect()
    }
}
