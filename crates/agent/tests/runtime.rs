//! Executor behaviour across runs: memory, early stopping, cancellation and
//! the blocking wrapper.

mod common;

use agentry_agent::templates::PREFIX;
use agentry_agent::{AgentExecutor, AgentOptions, AgentRegistry, PromptParts, ReactAgent};
use agentry_core::agent::{EarlyStopping, ExecutorLimits, ExecutorState};
use agentry_core::error::{Error, ToolError};
use agentry_core::event::{AgentEvent, EventBus, RunCallback};
use agentry_core::memory::ConversationMemory;
use agentry_core::provider::LanguageModel;
use agentry_core::tool::{FnTool, Tool, ToolRegistry};
use agentry_memory::BufferMemory;
use agentry_tools::CalculatorTool;
use common::{StalledProvider, scripted};
use std::sync::Arc;
use std::time::Duration;

fn calculator() -> Arc<dyn Tool> {
    Arc::new(CalculatorTool)
}

#[tokio::test]
async fn conversational_agent_remembers_previous_exchange() {
    let (provider, llm) = scripted(&[
        "Do I need to use a tool? No\nAI: Hello Bob, nice to meet you.",
        "Do I need to use a tool? No\nAI: Your name is Bob.",
    ]);
    let memory = Arc::new(BufferMemory::new());
    let executor = AgentRegistry::global()
        .construct(
            "AgentInitializer",
            llm,
            AgentOptions::new()
                .with_strategy("conversational-react-description")
                .with_tools(calculator())
                .with_memory(memory.clone()),
        )
        .await
        .unwrap();

    let first = executor.run("hi, I am Bob", &[]).await.unwrap();
    assert_eq!(first.answer, "Hello Bob, nice to meet you.");
    assert!(!provider.prompt(0).contains("Human: hi, I am Bob"));

    let second = executor.run("what is my name?", &[]).await.unwrap();
    assert_eq!(second.answer, "Your name is Bob.");
    assert!(provider.prompt(1).contains("Human: hi, I am Bob\nAI: Hello Bob, nice to meet you."));
    assert_eq!(memory.len().await, 2);
}

#[tokio::test]
async fn autogpt_recalls_previous_runs_from_memory() {
    let (provider, llm) = scripted(&[
        r#"{"command": {"name": "finish", "args": {"response": "Hello Bob"}}}"#,
        r#"{"command": {"name": "finish", "args": {"response": "Your name is Bob"}}}"#,
    ]);
    let memory = Arc::new(BufferMemory::new());
    let executor = AgentRegistry::global()
        .construct(
            "AutoGPTAgent",
            llm,
            AgentOptions::new()
                .with_persona("Tom", "assistant")
                .with_tools(calculator())
                .with_memory(memory.clone()),
        )
        .await
        .unwrap();

    let first = executor.run("my name is Bob", &[]).await.unwrap();
    assert_eq!(first.answer, "Hello Bob");
    assert!(!provider.prompt(0).contains("Human:"));

    let second = executor.run("what is my name?", &[]).await.unwrap();
    assert_eq!(second.answer, "Your name is Bob");
    let prompt = provider.prompt(1);
    assert!(prompt.contains("This reminds you of these events from your past:\nHuman: my name is Bob\nAI: Hello Bob"));
    assert!(prompt.contains("1. what is my name?"));
    assert_eq!(memory.len().await, 4);
}

#[tokio::test]
async fn failed_run_leaves_memory_untouched() {
    let (_, llm) = scripted(&[" Let me look it up.\nAction: lookup\nAction Input: Bob"]);
    let broken = FnTool::new("lookup", "Looks up a person", |_: &str| {
        Err(ToolError::ExecutionFailed {
            tool_name: "lookup".into(),
            reason: "directory offline".into(),
        })
    })
    .shared();
    let memory = Arc::new(BufferMemory::new());
    let executor = AgentRegistry::global()
        .construct(
            "AgentInitializer",
            llm,
            AgentOptions::new()
                .with_strategy("zero-shot-react-description")
                .with_tools(broken)
                .with_memory(memory.clone()),
        )
        .await
        .unwrap();

    let failure = executor.run("who is Bob?", &[]).await.unwrap_err();
    assert!(matches!(failure.error, Error::ToolInvocation(_)));
    assert!(failure.steps.is_empty());
    assert!(memory.load().await.unwrap()["chat_history"].is_empty());
}

#[tokio::test]
async fn generate_early_stopping_asks_for_a_final_answer() {
    let (provider, llm) = scripted(&[
        " Add them.\nAction: calculator\nAction Input: 1 + 1",
        " I now know the final answer\nFinal Answer: 2",
    ]);
    let limits = ExecutorLimits::default()
        .with_max_iterations(1)
        .with_early_stopping(EarlyStopping::Generate);
    let executor = AgentRegistry::global()
        .construct(
            "AgentInitializer",
            llm,
            AgentOptions::new()
                .with_strategy("zero-shot-react-description")
                .with_tools(calculator())
                .with_limits(limits),
        )
        .await
        .unwrap();

    let result = executor.run("what is 1 + 1", &[]).await.unwrap();
    assert_eq!(result.state, ExecutorState::StoppedByLimit);
    assert_eq!(result.answer, "2");
    assert_eq!(result.iterations, 1);
    assert_eq!(provider.calls(), 2);
    assert!(provider.prompt(1).contains("Observation: 2"));
}

#[tokio::test]
async fn malformed_output_becomes_an_exception_step() {
    let (_, llm) = scripted(&[
        "I am not sure what to do.",
        " I now know the final answer\nFinal Answer: done",
    ]);
    let executor = AgentRegistry::global()
        .construct(
            "AgentInitializer",
            llm,
            AgentOptions::new()
                .with_strategy("zero-shot-react-description")
                .with_tools(calculator()),
        )
        .await
        .unwrap();

    let result = executor.run("anything", &[]).await.unwrap();
    assert_eq!(result.answer, "done");
    assert_eq!(result.iterations, 2);
    assert_eq!(result.steps.len(), 1);
    assert_eq!(result.steps[0].tool, "_Exception");
}

#[tokio::test]
async fn run_events_reach_subscribers() {
    let (_, llm) = scripted(&[
        " Add.\nAction: calculator\nAction Input: 2 + 3",
        " I now know the final answer\nFinal Answer: 5",
    ]);
    let executor = AgentRegistry::global()
        .construct(
            "AgentInitializer",
            llm,
            AgentOptions::new()
                .with_strategy("zero-shot-react-description")
                .with_tools(calculator()),
        )
        .await
        .unwrap();

    let bus = Arc::new(EventBus::new(32));
    let mut rx = bus.subscribe();
    let callbacks: Vec<Arc<dyn RunCallback>> = vec![bus.clone()];
    executor.run("2 + 3", &callbacks).await.unwrap();

    let mut seen = Vec::new();
    while let Ok(event) = rx.try_recv() {
        seen.push(event);
    }
    assert!(seen.iter().any(|e| matches!(
        e.as_ref(),
        AgentEvent::ToolFinished { tool, observation, .. } if tool == "calculator" && observation == "5"
    )));
    assert!(matches!(
        seen.last().map(|e| e.as_ref()),
        Some(AgentEvent::StateChanged { state: ExecutorState::Succeeded, .. })
    ));
}

#[tokio::test]
async fn cancelled_run_fails_with_cancelled() {
    let llm = LanguageModel::new(Arc::new(StalledProvider), "stalled-model");
    let executor = AgentRegistry::global()
        .construct(
            "AgentInitializer",
            llm,
            AgentOptions::new()
                .with_strategy("zero-shot-react-description")
                .with_tools(calculator()),
        )
        .await
        .unwrap();

    let failure = executor
        .run_until_cancelled("hang", &[], tokio::time::sleep(Duration::from_millis(20)))
        .await
        .unwrap_err();
    assert!(matches!(failure.error, Error::Cancelled));
    assert!(failure.steps.is_empty());
}

#[test]
fn blocking_executor_runs_without_a_runtime() {
    let (provider, llm) = scripted(&[
        " Multiply.\nAction: calculator\nAction Input: 6 * 7",
        " I now know the final answer\nFinal Answer: 42",
    ]);
    let tools = vec![calculator()];
    let agent = ReactAgent::zero_shot(llm, &tools, &PromptParts::zero_shot(PREFIX)).unwrap();
    let executor = AgentExecutor::new(
        "Multiplier".into(),
        Box::new(agent),
        ToolRegistry::from_tools(tools).unwrap(),
    )
    .unwrap()
    .with_return_intermediate_steps(true)
    .into_blocking()
    .unwrap();

    let result = executor.run("6 times 7", &[]).unwrap();
    assert_eq!(result.answer, "42");
    assert_eq!(result.steps[0].observation, "42");
    assert_eq!(provider.calls(), 2);
    assert_eq!(executor.executor().kind().as_str(), "Multiplier");
}
