//! Scripted language models for the end-to-end tests.

#![allow(dead_code)]

use agentry_core::error::ProviderError;
use agentry_core::message::Message;
use agentry_core::provider::{LanguageModel, Provider, ProviderRequest, ProviderResponse, Usage};
use std::sync::{Arc, Mutex};

/// Returns scripted completions in order, then keeps repeating the last one.
pub struct ScriptedProvider {
    responses: Vec<String>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    pub fn new(responses: &[&str]) -> Self {
        Self {
            responses: responses.iter().map(|r| r.to_string()).collect(),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    /// Every message of call `n`, joined.
    pub fn prompt(&self, n: usize) -> String {
        self.prompts.lock().unwrap()[n].clone()
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "e2e_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let mut prompts = self.prompts.lock().unwrap();
        let text = request
            .messages
            .iter()
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");
        prompts.push(text);

        let index = (prompts.len() - 1).min(self.responses.len().saturating_sub(1));
        let reply = self.responses.get(index).cloned().unwrap_or_default();
        Ok(ProviderResponse {
            message: Message::assistant(reply),
            usage: Some(Usage {
                prompt_tokens: 10,
                completion_tokens: 5,
                total_tokens: 15,
            }),
            model: request.model,
        })
    }
}

/// Never answers; used to exercise cancellation.
pub struct StalledProvider;

#[async_trait::async_trait]
impl Provider for StalledProvider {
    fn name(&self) -> &str {
        "stalled"
    }

    async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        std::future::pending().await
    }
}

pub fn scripted(responses: &[&str]) -> (Arc<ScriptedProvider>, LanguageModel) {
    let provider = Arc::new(ScriptedProvider::new(responses));
    let llm = LanguageModel::new(provider.clone(), "mock-model");
    (provider, llm)
}

pub fn write_file(dir: &tempfile::TempDir, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, contents).unwrap();
    path
}
