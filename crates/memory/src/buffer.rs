//! Conversation buffer memory.
//!
//! Keeps the whole exchange history and renders it as a transcript under a
//! single prompt variable, `chat_history` by default.

use async_trait::async_trait;
use agentry_core::error::MemoryError;
use agentry_core::memory::ConversationMemory;
use agentry_core::message::{Conversation, Message, Role};
use std::collections::HashMap;
use tokio::sync::RwLock;

pub struct BufferMemory {
    conversation: RwLock<Conversation>,
    memory_key: String,
    human_prefix: String,
    ai_prefix: String,
    /// Only the last `window` exchanges are rendered when set.
    window: Option<usize>,
}

impl BufferMemory {
    pub fn new() -> Self {
        Self {
            conversation: RwLock::new(Conversation::new()),
            memory_key: "chat_history".into(),
            human_prefix: "Human".into(),
            ai_prefix: "AI".into(),
            window: None,
        }
    }

    pub fn with_memory_key(mut self, key: impl Into<String>) -> Self {
        self.memory_key = key.into();
        self
    }

    pub fn with_prefixes(mut self, human: impl Into<String>, ai: impl Into<String>) -> Self {
        self.human_prefix = human.into();
        self.ai_prefix = ai.into();
        self
    }

    pub fn with_window(mut self, exchanges: usize) -> Self {
        self.window = Some(exchanges);
        self
    }

    pub fn memory_key(&self) -> &str {
        &self.memory_key
    }

    /// Number of recorded messages.
    pub async fn len(&self) -> usize {
        self.conversation.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.conversation.read().await.is_empty()
    }

    fn render(&self, messages: &[Message]) -> String {
        let skip = match self.window {
            Some(w) => messages.len().saturating_sub(w * 2),
            None => 0,
        };
        messages[skip..]
            .iter()
            .map(|m| {
                let prefix = match m.role {
                    Role::User => self.human_prefix.as_str(),
                    Role::Assistant => self.ai_prefix.as_str(),
                    Role::System => "System",
                };
                format!("{prefix}: {}", m.content)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Default for BufferMemory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConversationMemory for BufferMemory {
    fn memory_variables(&self) -> Vec<String> {
        vec![self.memory_key.clone()]
    }

    async fn load(&self) -> Result<HashMap<String, String>, MemoryError> {
        let conversation = self.conversation.read().await;
        let mut vars = HashMap::new();
        vars.insert(self.memory_key.clone(), self.render(&conversation.messages));
        Ok(vars)
    }

    async fn save_context(&self, input: &str, output: &str) -> Result<(), MemoryError> {
        let mut conversation = self.conversation.write().await;
        conversation.push(Message::user(input));
        conversation.push(Message::assistant(output));
        Ok(())
    }

    async fn clear(&self) -> Result<(), MemoryError> {
        self.conversation.write().await.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn empty_memory_renders_empty_history() {
        let memory = BufferMemory::new();
        let vars = memory.load().await.unwrap();
        assert_eq!(vars["chat_history"], "");
        assert_eq!(memory.memory_variables(), vec!["chat_history"]);
    }

    #[tokio::test]
    async fn saves_exchanges_as_transcript() {
        let memory = BufferMemory::new();
        memory.save_context("hi, I'm Sam", "Hello Sam!").await.unwrap();
        memory.save_context("what's my name?", "Sam.").await.unwrap();

        let vars = memory.load().await.unwrap();
        assert_eq!(
            vars["chat_history"],
            "Human: hi, I'm Sam\nAI: Hello Sam!\nHuman: what's my name?\nAI: Sam."
        );
        assert_eq!(memory.len().await, 4);
    }

    #[tokio::test]
    async fn window_keeps_latest_exchanges() {
        let memory = BufferMemory::new().with_window(1).with_memory_key("history");
        memory.save_context("one", "1").await.unwrap();
        memory.save_context("two", "2").await.unwrap();

        let vars = memory.load().await.unwrap();
        assert_eq!(vars["history"], "Human: two\nAI: 2");
    }

    #[tokio::test]
    async fn clear_forgets_everything() {
        let memory = BufferMemory::new().with_prefixes("User", "Bot");
        memory.save_context("a", "b").await.unwrap();
        memory.clear().await.unwrap();
        assert!(memory.is_empty().await);
    }
}
