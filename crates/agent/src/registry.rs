//! Lookup table from agent kind to construction recipe.

use agentry_core::agent::AgentKind;
use agentry_core::error::{Error, Result};
use agentry_core::provider::LanguageModel;
use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};
use tracing::debug;

use crate::executor::AgentExecutor;
use crate::recipes::{
    AgentInitializerRecipe, AgentOptions, AgentRecipe, AutoGptAgentRecipe, CsvAgentRecipe,
    JsonAgentRecipe, SqlAgentRecipe, VectorStoreAgentRecipe, VectorStoreRouterAgentRecipe,
};

#[derive(Clone, Default)]
pub struct AgentRegistry {
    recipes: BTreeMap<AgentKind, Arc<dyn AgentRecipe>>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every built-in recipe.
    pub fn builtin() -> Self {
        let recipes: [Arc<dyn AgentRecipe>; 7] = [
            Arc::new(JsonAgentRecipe),
            Arc::new(CsvAgentRecipe),
            Arc::new(VectorStoreAgentRecipe),
            Arc::new(VectorStoreRouterAgentRecipe),
            Arc::new(SqlAgentRecipe),
            Arc::new(AgentInitializerRecipe),
            Arc::new(AutoGptAgentRecipe),
        ];
        let mut registry = Self::new();
        for recipe in recipes {
            let kind = recipe.describe();
            registry.recipes.insert(kind, recipe);
        }
        registry
    }

    /// The process-wide built-in registry, created on first use.
    pub fn global() -> &'static AgentRegistry {
        static GLOBAL: OnceLock<AgentRegistry> = OnceLock::new();
        GLOBAL.get_or_init(Self::builtin)
    }

    /// Register `recipe` under the kind it describes.
    pub fn register(&mut self, recipe: Arc<dyn AgentRecipe>) -> Result<()> {
        let kind = recipe.describe();
        if self.recipes.contains_key(&kind) {
            return Err(Error::DuplicateKind(kind.to_string()));
        }
        debug!(kind = %kind, "Agent recipe registered");
        self.recipes.insert(kind, recipe);
        Ok(())
    }

    pub fn resolve(&self, kind: &str) -> Result<Arc<dyn AgentRecipe>> {
        self.recipes
            .get(kind)
            .cloned()
            .ok_or_else(|| Error::UnknownKind(kind.to_string()))
    }

    /// Resolve `kind` and construct an executor in one call.
    pub async fn construct(
        &self,
        kind: &str,
        llm: LanguageModel,
        options: AgentOptions,
    ) -> Result<AgentExecutor> {
        self.resolve(kind)?.construct(llm, options).await
    }

    /// Registered kinds, sorted.
    pub fn kinds(&self) -> Vec<&AgentKind> {
        self.recipes.keys().collect()
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.recipes.contains_key(kind)
    }

    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }
}

impl std::fmt::Debug for AgentRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentRegistry")
            .field("kinds", &self.kinds())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct DuplicateCsv;

    #[async_trait]
    impl AgentRecipe for DuplicateCsv {
        fn describe(&self) -> AgentKind {
            "CSVAgent".into()
        }

        fn summary(&self) -> &'static str {
            "a second CSV recipe"
        }

        async fn construct(&self, _llm: LanguageModel, _options: AgentOptions) -> Result<AgentExecutor> {
            Err(Error::Internal("never built".into()))
        }
    }

    #[test]
    fn builtin_has_every_kind() {
        let registry = AgentRegistry::builtin();
        let kinds: Vec<&str> = registry.kinds().into_iter().map(AgentKind::as_str).collect();
        assert_eq!(
            kinds,
            vec![
                "AgentInitializer",
                "AutoGPTAgent",
                "CSVAgent",
                "JsonAgent",
                "SQLAgent",
                "VectorStoreAgent",
                "VectorStoreRouterAgent"
            ]
        );
        for kind in kinds {
            assert_eq!(registry.resolve(kind).unwrap().describe().as_str(), kind);
        }
    }

    #[test]
    fn unknown_kind() {
        let err = AgentRegistry::global().resolve("PandasAgent").err().unwrap();
        assert!(matches!(err, Error::UnknownKind(kind) if kind == "PandasAgent"));
    }

    #[test]
    fn duplicate_kind() {
        let mut registry = AgentRegistry::builtin();
        let err = registry.register(Arc::new(DuplicateCsv)).unwrap_err();
        assert!(matches!(err, Error::DuplicateKind(kind) if kind == "CSVAgent"));

        let mut empty = AgentRegistry::new();
        empty.register(Arc::new(DuplicateCsv)).unwrap();
        assert!(empty.contains("CSVAgent"));
        assert_eq!(empty.len(), 1);
    }
}
