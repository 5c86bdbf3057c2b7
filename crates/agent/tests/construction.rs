//! Construction-time behaviour shared by every recipe.

mod common;

use agentry_agent::{AgentOptions, AgentRegistry, AgentStrategy};
use agentry_core::error::Error;
use agentry_core::memory::VectorStoreInfo;
use agentry_core::tool::{FnTool, Tool};
use agentry_memory::InMemoryVectorStore;
use agentry_tools::CalculatorTool;
use common::{scripted, write_file};
use serde_json::json;
use std::path::Path;
use std::sync::Arc;

fn calculator() -> Arc<dyn Tool> {
    Arc::new(CalculatorTool)
}

fn store(name: &str) -> VectorStoreInfo {
    VectorStoreInfo::new(name, format!("documents about {name}"), Arc::new(InMemoryVectorStore::new()))
}

/// One working set of options for every built-in kind.
fn builtin_cases(csv: &Path) -> Vec<(&'static str, AgentOptions)> {
    vec![
        ("JsonAgent", AgentOptions::new().with_json(json!({"openapi": "3.0.0"}))),
        ("CSVAgent", AgentOptions::new().with_path(csv)),
        ("VectorStoreAgent", AgentOptions::new().with_vector_store(store("sotu"))),
        (
            "VectorStoreRouterAgent",
            AgentOptions::new().with_vector_store(store("sotu")).with_vector_store(store("ruff")),
        ),
        ("SQLAgent", AgentOptions::new().with_database_uri("sqlite::memory:")),
        (
            "AgentInitializer",
            AgentOptions::new().with_strategy("zero-shot-react-description").with_tools(calculator()),
        ),
        ("AutoGPTAgent", AgentOptions::new().with_persona("Tom", "assistant").with_tools(calculator())),
    ]
}

#[tokio::test]
async fn construction_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let csv = write_file(&dir, "values.csv", "id,value\n1,10\n2,20\n");
    let registry = AgentRegistry::global();
    let (_, llm) = scripted(&["Final Answer: 30"]);

    let cases = builtin_cases(&csv);
    assert_eq!(cases.len(), 7);
    for (kind, options) in cases {
        let first = registry.construct(kind, llm.clone(), options.clone()).await.unwrap();
        let second = registry.construct(kind, llm.clone(), options).await.unwrap();
        assert_eq!(first.allowed_tools(), second.allowed_tools(), "{kind} tools differ");
        assert_eq!(first.prompt_text(), second.prompt_text(), "{kind} prompt differs");
        if kind == "CSVAgent" {
            assert!(first.prompt_text().contains("{df}"));
        }
    }
}

#[tokio::test]
async fn every_builtin_kind_constructs() {
    let dir = tempfile::tempdir().unwrap();
    let csv = write_file(&dir, "values.csv", "id,value\n1,10\n");
    let registry = AgentRegistry::global();
    let (_, llm) = scripted(&["Final Answer: ok"]);
    let (_, autonomous_llm) =
        scripted(&[r#"{"command": {"name": "finish", "args": {"response": "ok"}}}"#]);

    for (kind, options) in builtin_cases(&csv) {
        let model = if kind == "AutoGPTAgent" { autonomous_llm.clone() } else { llm.clone() };
        let executor = registry.construct(kind, model, options).await.unwrap();
        assert_eq!(executor.kind().as_str(), kind);
        let result = executor.run("anything", &[]).await.unwrap();
        assert!(!result.answer.is_empty(), "{kind} produced an empty answer");
    }
}

#[tokio::test]
async fn recipes_build_verbose_executors_by_default() {
    let dir = tempfile::tempdir().unwrap();
    let csv = write_file(&dir, "values.csv", "id,value\n1,10\n");
    let registry = AgentRegistry::global();
    let (_, llm) = scripted(&["Final Answer: ok"]);

    for (kind, options) in builtin_cases(&csv) {
        let executor = registry.construct(kind, llm.clone(), options).await.unwrap();
        assert!(executor.is_verbose(), "{kind} is quiet by default");
    }

    let quiet = registry
        .construct("CSVAgent", llm, AgentOptions::new().with_path(&csv).with_verbose(false))
        .await
        .unwrap();
    assert!(!quiet.is_verbose());
}

#[tokio::test]
async fn json_agent_tools_and_prompt() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(&dir, "spec.json", r#"{"paths": {"/pets": {}}}"#);
    let (_, llm) = scripted(&[]);
    let executor = AgentRegistry::global()
        .construct("JsonAgent", llm, AgentOptions::new().with_path(&path))
        .await
        .unwrap();

    let allowed: Vec<&str> = executor.allowed_tools().iter().map(String::as_str).collect();
    assert_eq!(allowed, vec!["json_spec_get_value", "json_spec_list_keys"]);
    assert!(executor.prompt_text().starts_with("You are an agent designed to interact with JSON."));
    assert!(executor.prompt_text().contains("one of [json_spec_list_keys, json_spec_get_value]"));
}

#[tokio::test]
async fn sql_prompt_is_rendered_for_the_dialect() {
    let (_, llm) = scripted(&[]);
    let executor = AgentRegistry::global()
        .construct("SQLAgent", llm, AgentOptions::new().with_database_uri("sqlite::memory:"))
        .await
        .unwrap();
    let prompt = executor.prompt_text();
    assert!(prompt.contains("create a syntactically correct sqlite query"));
    assert!(prompt.contains("at most 10 results"));
    assert!(!prompt.contains("{dialect}"));
    assert_eq!(executor.allowed_tools().len(), 4);
}

#[tokio::test]
async fn missing_options_are_reported() {
    let registry = AgentRegistry::global();
    let (_, llm) = scripted(&[]);

    for (kind, option) in [
        ("CSVAgent", "path"),
        ("JsonAgent", "path"),
        ("SQLAgent", "database_uri"),
        ("VectorStoreAgent", "vectorstoreinfo"),
        ("VectorStoreRouterAgent", "vectorstoreinfo"),
        ("AgentInitializer", "agent"),
        ("AutoGPTAgent", "ai_name"),
    ] {
        let err = registry.construct(kind, llm.clone(), AgentOptions::new()).await.unwrap_err();
        assert!(
            matches!(&err, Error::MissingOption { option: o, .. } if o == option),
            "{kind}: unexpected {err}"
        );
        assert!(err.is_construction_error());
    }
}

#[tokio::test]
async fn unreadable_data_fails_with_data_load() {
    let dir = tempfile::tempdir().unwrap();
    let (_, llm) = scripted(&[]);
    let registry = AgentRegistry::global();

    let missing = dir.path().join("nope.csv");
    let err = registry
        .construct("CSVAgent", llm.clone(), AgentOptions::new().with_path(&missing))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::DataLoad { .. }));

    let broken = write_file(&dir, "broken.json", "{\"a\": ");
    let err = registry
        .construct("JsonAgent", llm, AgentOptions::new().with_path(&broken))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::DataLoad { .. }));
}

#[tokio::test]
async fn non_sqlite_database_fails_to_open() {
    let (_, llm) = scripted(&[]);
    let err = AgentRegistry::global()
        .construct(
            "SQLAgent",
            llm,
            AgentOptions::new().with_database_uri("postgres://localhost/chinook"),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::ResourceOpen { .. }));
}

#[tokio::test]
async fn duplicate_tool_names_collide() {
    let (_, llm) = scripted(&[]);
    let twin = FnTool::new("calculator", "a second calculator", |_: &str| Ok("0".into())).shared();
    let err = AgentRegistry::global()
        .construct(
            "AgentInitializer",
            llm.clone(),
            AgentOptions::new()
                .with_strategy("zero-shot-react-description")
                .with_tools(vec![calculator(), twin.clone()]),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::ToolNameCollision(name) if name == "calculator"));

    let err = AgentRegistry::global()
        .construct(
            "AutoGPTAgent",
            llm,
            AgentOptions::new().with_persona("Tom", "assistant").with_tools(vec![calculator(), twin]),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::ToolNameCollision(_)));
}

#[tokio::test]
async fn initializer_strategies() {
    let registry = AgentRegistry::global();
    let (_, llm) = scripted(&[]);

    for strategy in AgentStrategy::SELECTABLE {
        let tools: Vec<Arc<dyn Tool>> = if strategy == AgentStrategy::SelfAskWithSearch {
            vec![FnTool::new("Intermediate Answer", "search", |q: &str| Ok(q.to_string())).shared()]
        } else {
            vec![calculator()]
        };
        let executor = registry
            .construct(
                "AgentInitializer",
                llm.clone(),
                AgentOptions::new().with_strategy(strategy.as_str()).with_tools(tools),
            )
            .await
            .unwrap();
        assert_eq!(executor.strategy(), strategy);
        assert!(executor.returns_intermediate_steps());
    }

    let err = registry
        .construct(
            "AgentInitializer",
            llm,
            AgentOptions::new().with_strategy("self-ask-with-search").with_tools(calculator()),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidToolset { .. }));
}
