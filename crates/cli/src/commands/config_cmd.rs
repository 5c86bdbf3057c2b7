//! `agentry config`: configuration management commands.

use agentry_agent::AgentRegistry;
use agentry_config::AppConfig;

pub fn init() {
    println!("# Save as {}", AppConfig::config_dir().join("config.toml").display());
    print!("{}", AppConfig::default_toml());
}

pub fn validate() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    println!("Config parsed successfully");

    let registry = AgentRegistry::global();
    let mut warnings = Vec::new();
    if !config.has_api_key() {
        warnings.push("No API key set (AGENTRY_API_KEY or OPENAI_API_KEY)".to_string());
    }
    for (name, agent) in &config.agents {
        if !registry.contains(&agent.kind) {
            warnings.push(format!("agents.{name}: unknown kind '{}'", agent.kind));
        }
    }

    if warnings.is_empty() {
        println!("All checks passed ({} agents defined)", config.agents.len());
    } else {
        for warning in &warnings {
            println!("  warning: {warning}");
        }
    }
    Ok(())
}

pub fn show() -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AppConfig::load()?;
    if config.api_key.is_some() {
        config.api_key = Some("[REDACTED]".into());
    }
    for provider in config.providers.values_mut() {
        if provider.api_key.is_some() {
            provider.api_key = Some("[REDACTED]".into());
        }
    }
    print!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}
