//! LLM chain: a language model bound to a prompt template.

use std::collections::HashMap;
use tracing::debug;
use crate::error::Result;
use crate::prompt::PromptTemplate;
use crate::provider::LanguageModel;

/// Formats its prompt with the given values and asks the model to complete it.
#[derive(Debug, Clone)]
pub struct LlmChain {
    llm: LanguageModel,
    prompt: PromptTemplate,
}

impl LlmChain {
    pub fn new(llm: LanguageModel, prompt: PromptTemplate) -> Self {
        Self { llm, prompt }
    }

    pub fn prompt(&self) -> &PromptTemplate {
        &self.prompt
    }

    pub fn llm(&self) -> &LanguageModel {
        &self.llm
    }

    /// Render the prompt and return the model's completion.
    pub async fn predict(&self, values: &HashMap<String, String>, stop: &[String]) -> Result<String> {
        let text = self.prompt.format(values)?;
        debug!(model = %self.llm.model(), prompt_chars = text.len(), "LlmChain predict");
        Ok(self.llm.predict(&text, stop).await?)
    }
}
