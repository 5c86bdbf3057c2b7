//! `agentry kinds` and `agentry describe`: inspect the agent registry.

use agentry_agent::{AgentRegistry, AgentStrategy};

pub fn list() {
    let registry = AgentRegistry::global();
    println!("Registered agent kinds ({}):", registry.len());
    for kind in registry.kinds() {
        if let Ok(recipe) = registry.resolve(kind.as_str()) {
            println!("  {:<24} {}", kind.as_str(), recipe.summary());
        }
    }
}

pub fn describe(kind: &str) -> Result<(), Box<dyn std::error::Error>> {
    let recipe = AgentRegistry::global().resolve(kind)?;
    println!("{}", recipe.describe());
    println!("  {}", recipe.summary());

    let required = recipe.required_options();
    if required.is_empty() {
        println!("  Required options: none");
    } else {
        println!("  Required options: {}", required.join(", "));
    }

    if kind == "AgentInitializer" {
        let strategies: Vec<&str> = AgentStrategy::SELECTABLE.iter().map(|s| s.as_str()).collect();
        println!("  Strategies: {}", strategies.join(", "));
    }
    if matches!(kind, "AgentInitializer" | "AutoGPTAgent") {
        println!("  Built-in tools: {}", agentry_tools::BUILTIN_TOOLS.join(", "));
    }
    Ok(())
}
