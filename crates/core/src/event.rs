//! Run events and observers.
//!
//! Executors report what happens during a run to a list of [`RunCallback`]s
//! passed to `run`. [`EventBus`] is a callback that rebroadcasts every event
//! so any number of subscribers can follow a run without being passed in.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::broadcast;
use crate::agent::ExecutorState;

/// Something that happened during an executor run.
#[derive(Debug, Clone, Serialize)]
pub enum AgentEvent {
    /// The executor moved to a new lifecycle state
    StateChanged {
        agent: String,
        state: ExecutorState,
        timestamp: DateTime<Utc>,
    },

    /// The model proposed a tool invocation
    ActionProposed {
        agent: String,
        tool: String,
        tool_input: String,
        timestamp: DateTime<Utc>,
    },

    /// A tool returned an observation
    ToolFinished {
        agent: String,
        tool: String,
        observation: String,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },

    /// Malformed model output was answered with a corrective observation
    ParseErrorRecovered {
        agent: String,
        error: String,
        timestamp: DateTime<Utc>,
    },

    /// The run produced its answer
    Finished {
        agent: String,
        answer: String,
        iterations: u32,
        timestamp: DateTime<Utc>,
    },
}

/// Observer of executor runs.
pub trait RunCallback: Send + Sync {
    fn on_event(&self, event: &AgentEvent);
}

/// Callbacks attached to a single run.
pub type Callbacks = Vec<Arc<dyn RunCallback>>;

/// A broadcast-based event bus for run events.
///
/// Uses `tokio::sync::broadcast` for multi-consumer pub/sub.
pub struct EventBus {
    sender: broadcast::Sender<Arc<AgentEvent>>,
}

impl EventBus {
    /// Create a new event bus with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all subscribers.
    pub fn publish(&self, event: AgentEvent) {
        // No subscribers is fine.
        let _ = self.sender.send(Arc::new(event));
    }

    /// Subscribe to receive events.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<AgentEvent>> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

impl RunCallback for EventBus {
    fn on_event(&self, event: &AgentEvent) {
        self.publish(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn event_bus_publish_subscribe() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();

        bus.on_event(&AgentEvent::ToolFinished {
            agent: "SQLAgent".into(),
            tool: "sql_db_list_tables".into(),
            observation: "users".into(),
            duration_ms: 3,
            timestamp: Utc::now(),
        });

        let event = rx.recv().await.unwrap();
        match event.as_ref() {
            AgentEvent::ToolFinished { tool, observation, .. } => {
                assert_eq!(tool, "sql_db_list_tables");
                assert_eq!(observation, "users");
            }
            _ => panic!("Expected ToolFinished event"),
        }
    }

    #[test]
    fn event_bus_no_subscribers_doesnt_panic() {
        let bus = EventBus::new(16);
        bus.publish(AgentEvent::StateChanged {
            agent: "JsonAgent".into(),
            state: ExecutorState::Running,
            timestamp: Utc::now(),
        });
    }
}
