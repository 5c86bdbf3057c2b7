//! Turns config-file agent definitions and `--option key=value` flags into
//! construction options.

use agentry_agent::AgentOptions;
use agentry_config::{AgentDefinition, AppConfig, VectorStoreSettings};
use agentry_core::memory::VectorStoreInfo;
use agentry_core::provider::LanguageModel;
use agentry_memory::{BufferMemory, InMemoryVectorStore, load_documents};
use agentry_tools::{BUILTIN_TOOLS, CsvOptions, builtin_tool};
use std::sync::Arc;
use tracing::debug;

/// Apply one `key=value` flag on top of `definition`.
pub fn apply_option(definition: &mut AgentDefinition, raw: &str) -> Result<(), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("option '{raw}' is not of the form key=value"))?;
    let value = value.trim();

    match key.trim() {
        "path" => definition.path = Some(value.into()),
        "database_uri" | "db" => definition.database_uri = Some(value.into()),
        "agent" | "strategy" => definition.strategy = Some(value.into()),
        "ai_name" => definition.ai_name = Some(value.into()),
        "ai_role" => definition.ai_role = Some(value.into()),
        "tool" => definition.tools.push(value.into()),
        "tools" => definition
            .tools
            .extend(value.split(',').map(str::trim).filter(|t| !t.is_empty()).map(String::from)),
        "memory" => definition.memory = parse_bool(key, value)?,
        "has_headers" => definition.csv.has_headers = parse_bool(key, value)?,
        "delimiter" => {
            let mut chars = value.chars();
            definition.csv.delimiter = match (chars.next(), chars.next()) {
                (Some(c), None) => c,
                _ => return Err(format!("delimiter must be a single character, got '{value}'")),
            };
        }
        // name:description:path
        "vector_store" => {
            let mut parts = value.splitn(3, ':');
            match (parts.next(), parts.next(), parts.next()) {
                (Some(name), Some(description), Some(path)) if !name.is_empty() => {
                    definition.vector_stores.push(VectorStoreSettings {
                        name: name.into(),
                        description: description.into(),
                        path: path.into(),
                    });
                }
                _ => return Err(format!("vector_store must be name:description:path, got '{value}'")),
            }
        }
        other => return Err(format!("unknown option '{other}'")),
    }
    Ok(())
}

fn parse_bool(key: &str, value: &str) -> Result<bool, String> {
    value
        .parse()
        .map_err(|_| format!("option '{key}' expects true or false, got '{value}'"))
}

fn csv_options(definition: &AgentDefinition) -> Result<CsvOptions, String> {
    let delimiter = definition.csv.delimiter;
    if !delimiter.is_ascii() {
        return Err(format!("delimiter '{delimiter}' is not an ASCII character"));
    }
    Ok(CsvOptions {
        delimiter: delimiter as u8,
        has_headers: definition.csv.has_headers,
        ..CsvOptions::default()
    })
}

async fn vector_store(
    settings: &VectorStoreSettings,
    config: &AppConfig,
    llm: &LanguageModel,
) -> Result<VectorStoreInfo, Box<dyn std::error::Error>> {
    let documents = load_documents(&settings.path)?;
    let store = match &config.embedding_model {
        Some(model) => InMemoryVectorStore::with_embeddings(llm.provider().clone(), model.clone()),
        None => InMemoryVectorStore::new(),
    };
    let added = store.add_documents(documents).await?;
    debug!(store = %settings.name, documents = added, "Vector store loaded");
    Ok(VectorStoreInfo::new(
        settings.name.clone(),
        settings.description.clone(),
        Arc::new(store),
    ))
}

/// Build the recipe options for `definition`, loading any documents it names.
pub async fn build_options(
    definition: &AgentDefinition,
    config: &AppConfig,
    llm: &LanguageModel,
) -> Result<AgentOptions, Box<dyn std::error::Error>> {
    let mut options = AgentOptions::new()
        .with_csv_options(csv_options(definition)?)
        .with_limits(config.executor.limits())
        .with_verbose(config.executor.verbose);

    if let Some(path) = &definition.path {
        options = options.with_path(path);
    }
    if let Some(uri) = &definition.database_uri {
        options = options.with_database_uri(uri);
    }
    if let Some(strategy) = &definition.strategy {
        options = options.with_strategy(strategy);
    }
    options.ai_name = definition.ai_name.clone();
    options.ai_role = definition.ai_role.clone();

    for name in &definition.tools {
        let tool = builtin_tool(name).ok_or_else(|| {
            format!("unknown tool '{name}' (available: {})", BUILTIN_TOOLS.join(", "))
        })?;
        options = options.with_tools(tool);
    }

    for settings in &definition.vector_stores {
        options = options.with_vector_store(vector_store(settings, config, llm).await?);
    }

    if definition.memory {
        options = options.with_memory(Arc::new(BufferMemory::new()));
    }

    Ok(options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentry_providers::OpenAiCompatProvider;

    fn offline_llm() -> LanguageModel {
        let provider = OpenAiCompatProvider::new("ollama", "http://localhost:11434/v1", "").unwrap();
        LanguageModel::new(Arc::new(provider), "test-model")
    }

    fn definition(kind: &str) -> AgentDefinition {
        AgentDefinition {
            kind: kind.into(),
            ..AgentDefinition::default()
        }
    }

    #[test]
    fn flags_fill_the_definition() {
        let mut def = definition("AgentInitializer");
        for raw in [
            "agent=zero-shot-react-description",
            "tools=calculator, ",
            "memory=true",
            "delimiter=;",
            "vector_store=docs:Project docs:/tmp/docs",
        ] {
            apply_option(&mut def, raw).unwrap();
        }
        assert_eq!(def.strategy.as_deref(), Some("zero-shot-react-description"));
        assert_eq!(def.tools, vec!["calculator".to_string()]);
        assert!(def.memory);
        assert_eq!(def.csv.delimiter, ';');
        assert_eq!(def.vector_stores[0].description, "Project docs");
        assert_eq!(def.vector_stores[0].path.to_str(), Some("/tmp/docs"));
    }

    #[test]
    fn malformed_flags_are_rejected() {
        let mut def = definition("CSVAgent");
        assert!(apply_option(&mut def, "path").unwrap_err().contains("key=value"));
        assert!(apply_option(&mut def, "colour=red").unwrap_err().contains("unknown option"));
        assert!(apply_option(&mut def, "memory=yes").is_err());
        assert!(apply_option(&mut def, "delimiter=;;").is_err());
        assert!(apply_option(&mut def, "vector_store=docs").is_err());
    }

    #[tokio::test]
    async fn definition_maps_onto_options() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "First paragraph.\n\nSecond paragraph.").unwrap();

        let mut def = definition("VectorStoreAgent");
        def.path = Some("sales.csv".into());
        def.csv.delimiter = '\t';
        def.tools = vec!["calculator".into()];
        def.memory = true;
        def.vector_stores.push(VectorStoreSettings {
            name: "notes".into(),
            description: "Meeting notes".into(),
            path: dir.path().to_path_buf(),
        });

        let mut config = AppConfig::default();
        config.executor.max_iterations = 4;
        let options = build_options(&def, &config, &offline_llm()).await.unwrap();

        assert_eq!(options.csv_options.delimiter, b'\t');
        assert_eq!(options.tools[0].name(), "calculator");
        assert!(options.memory.is_some());
        assert_eq!(options.vector_stores[0].name, "notes");
        assert_eq!(options.limits.and_then(|l| l.max_iterations), Some(4));
    }

    #[tokio::test]
    async fn unknown_tool_is_an_error() {
        let mut def = definition("AgentInitializer");
        def.tools = vec!["shell".into()];
        let err = build_options(&def, &AppConfig::default(), &offline_llm()).await.unwrap_err();
        assert!(err.to_string().contains("unknown tool 'shell'"));
    }
}
