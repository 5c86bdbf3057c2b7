//! `agentry run`: build an agent and answer one input, or chat interactively.

use agentry_agent::{AgentExecutor, AgentRegistry};
use agentry_config::{AgentDefinition, AppConfig};
use agentry_core::event::{AgentEvent, RunCallback};
use agentry_providers::language_model_from_config;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::warn;

use crate::options::{apply_option, build_options};

pub struct RunRequest {
    pub agent: String,
    pub input: Option<String>,
    pub options: Vec<String>,
    pub show_steps: bool,
    pub stream_events: bool,
}

/// Writes every run event to stderr as one JSON object per line.
struct JsonLines;

impl RunCallback for JsonLines {
    fn on_event(&self, event: &AgentEvent) {
        match serde_json::to_string(event) {
            Ok(line) => eprintln!("{line}"),
            Err(e) => warn!(error = %e, "Could not serialize run event"),
        }
    }
}

/// Look `name` up as a configured agent first, then as a registered kind,
/// and layer the command-line options on top.
fn resolve_definition(
    config: &AppConfig,
    registry: &AgentRegistry,
    name: &str,
    flags: &[String],
) -> Result<AgentDefinition, String> {
    let mut definition = match config.agent(name) {
        Some(definition) => definition.clone(),
        None if registry.contains(name) => AgentDefinition {
            kind: name.to_string(),
            ..AgentDefinition::default()
        },
        None => {
            return Err(format!(
                "'{name}' is neither a configured agent nor a registered kind (try `agentry kinds`)"
            ));
        }
    };
    for flag in flags {
        apply_option(&mut definition, flag)?;
    }
    Ok(definition)
}

pub async fn run(request: RunRequest) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let registry = AgentRegistry::global();
    let definition = resolve_definition(&config, registry, &request.agent, &request.options)?;

    if !config.has_api_key() {
        warn!(provider = %config.default_provider, "No API key configured; set AGENTRY_API_KEY or OPENAI_API_KEY");
    }
    let llm = language_model_from_config(&config)?;
    let options = build_options(&definition, &config, &llm).await?;

    let mut executor = registry.construct(&definition.kind, llm, options).await?;
    if request.show_steps {
        executor = executor.with_return_intermediate_steps(true);
    }

    let callbacks: Vec<Arc<dyn RunCallback>> = if request.stream_events {
        vec![Arc::new(JsonLines)]
    } else {
        Vec::new()
    };

    match request.input {
        Some(input) => answer(&executor, &input, &callbacks, request.show_steps).await,
        None => interactive(&executor, &callbacks, request.show_steps).await,
    }
}

async fn answer(
    executor: &AgentExecutor,
    input: &str,
    callbacks: &[Arc<dyn RunCallback>],
    show_steps: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let interrupted = async {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };

    match executor.run_until_cancelled(input, callbacks, interrupted).await {
        Ok(result) => {
            if show_steps {
                println!("{}", serde_json::to_string_pretty(&result.steps)?);
            }
            println!("{}", result.answer);
            Ok(())
        }
        Err(failure) => {
            if show_steps && !failure.steps.is_empty() {
                eprintln!("{}", serde_json::to_string_pretty(&failure.steps)?);
            }
            Err(failure.into())
        }
    }
}

async fn interactive(
    executor: &AgentExecutor,
    callbacks: &[Arc<dyn RunCallback>],
    show_steps: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    println!();
    println!("  Agent:  {}", executor.kind());
    println!("  Tools:  {}", executor.allowed_tools().iter().cloned().collect::<Vec<_>>().join(", "));
    println!();
    println!("  Type a question and press Enter. Type 'exit' to quit.");
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    prompt()?;
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if matches!(line, "exit" | "quit") {
            break;
        }
        if !line.is_empty()
            && let Err(e) = answer(executor, line, callbacks, show_steps).await
        {
            eprintln!("  [Error] {e}");
        }
        prompt()?;
    }
    Ok(())
}

fn prompt() -> std::io::Result<()> {
    use std::io::Write;
    print!("  You > ");
    std::io::stdout().flush()
}
