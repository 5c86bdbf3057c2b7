//! Shared test helpers for agent and executor tests.

use agentry_core::error::ProviderError;
use agentry_core::message::Message;
use agentry_core::provider::{LanguageModel, Provider, ProviderRequest, ProviderResponse, Usage};
use std::sync::{Arc, Mutex};

/// A mock provider that returns a sequence of scripted completions.
///
/// Each call to `complete` returns the next response in the queue and
/// records the request. Panics if more calls are made than responses provided.
pub struct SequentialMockProvider {
    responses: Vec<String>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl SequentialMockProvider {
    pub fn new<S: Into<String>>(responses: impl IntoIterator<Item = S>) -> Self {
        Self {
            responses: responses.into_iter().map(Into::into).collect(),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Text of the last message of request `n`.
    pub fn prompt(&self, n: usize) -> String {
        let requests = self.requests.lock().unwrap();
        requests[n].messages.last().map(|m| m.content.clone()).unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl Provider for SequentialMockProvider {
    fn name(&self) -> &str {
        "sequential_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let mut requests = self.requests.lock().unwrap();
        let count = requests.len();
        if count >= self.responses.len() {
            panic!(
                "SequentialMockProvider: no more responses (call #{}, have {})",
                count,
                self.responses.len()
            );
        }
        requests.push(request);
        Ok(make_text_response(&self.responses[count]))
    }
}

/// Create a simple text response.
pub fn make_text_response(text: &str) -> ProviderResponse {
    ProviderResponse {
        message: Message::assistant(text),
        usage: Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }),
        model: "mock-model".into(),
    }
}

/// A scripted provider plus a language model bound to it.
pub fn mock_llm(responses: &[&str]) -> (Arc<SequentialMockProvider>, LanguageModel) {
    let provider = Arc::new(SequentialMockProvider::new(responses.iter().copied()));
    let llm = LanguageModel::new(provider.clone(), "mock-model");
    (provider, llm)
}
