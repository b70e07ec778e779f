// ABOUTME: Wires configuration, data sources, and stores into a ready coordinator
// ABOUTME: Chooses Gemini or the offline backend, USDA or built-in foods, remote or built-in recipes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Platewise Contributors

use std::sync::Arc;

use platewise_providers::http_client::initialize_shared_client;
use platewise_providers::{
    FoodDataProvider, HttpRecipeProvider, RecipeDataProvider, StaticFoodTable,
    StaticRecipeCatalog, UsdaClientConfig, UsdaFoodProvider,
};
use tracing::info;

use super::Coordinator;
use crate::config::{ProviderConfig, ServerConfig};
use crate::errors::AppResult;
use crate::handlers::{
    HandlerDeps, NutritionHandler, RecipeHandler, RequestHandler, TrackingHandler,
};
use crate::history::BoundedHistory;
use crate::llm::{GeminiProvider, GeneratorConfig, LlmProvider, OfflineProvider};
use crate::stores::{ChatTurnStore, MealLogStore, UserProfileStore};

const CONNECT_TIMEOUT_SECS: u64 = 3;

/// Food and recipe sources handed to the handlers
#[derive(Clone)]
pub struct DataSources {
    /// Food lookups in priority order
    pub foods: Vec<Arc<dyn FoodDataProvider>>,
    /// USDA client used for free-text food search
    pub usda: Option<Arc<UsdaFoodProvider>>,
    /// Recipe sources searched in order
    pub recipes: Vec<Arc<dyn RecipeDataProvider>>,
}

impl DataSources {
    /// Built-in food table and recipe catalog only
    #[must_use]
    pub fn offline() -> Self {
        Self {
            foods: vec![Arc::new(StaticFoodTable::builtin())],
            usda: None,
            recipes: vec![Arc::new(StaticRecipeCatalog::builtin())],
        }
    }

    /// USDA ahead of the built-in table when a key is set; remote recipes when a URL is set
    #[must_use]
    pub fn from_config(config: &ProviderConfig) -> Self {
        let mut sources = Self::offline();
        if let Some(api_key) = &config.usda_api_key {
            let usda = Arc::new(UsdaFoodProvider::new(UsdaClientConfig {
                api_key: api_key.clone(),
                base_url: config.usda_base_url.clone(),
                ..UsdaClientConfig::default()
            }));
            sources.foods.insert(0, usda.clone());
            sources.usda = Some(usda);
        }
        if let Some(url) = &config.recipe_api_url {
            sources.recipes = vec![Arc::new(HttpRecipeProvider::new(url.clone()))];
        }
        sources
    }
}

/// Stores the coordinator and handlers read and write
#[derive(Clone)]
pub struct Stores {
    /// Profiles
    pub profiles: Arc<dyn UserProfileStore>,
    /// Meal log
    pub meals: Arc<dyn MealLogStore>,
    /// Chat turns
    pub chats: Arc<dyn ChatTurnStore>,
}

impl Stores {
    /// Use one store for every role
    pub fn shared<S>(store: Arc<S>) -> Self
    where
        S: UserProfileStore + MealLogStore + ChatTurnStore + 'static,
    {
        Self {
            profiles: store.clone(),
            meals: store.clone(),
            chats: store,
        }
    }
}

/// Handler dependencies from configuration
#[must_use]
pub fn handler_deps(config: &ServerConfig, stores: &Stores) -> HandlerDeps {
    let llm: Arc<dyn LlmProvider> = match (&config.llm.api_key, config.has_llm()) {
        (Some(api_key), true) => {
            Arc::new(GeminiProvider::new(api_key.clone()).with_default_model(&config.llm.model))
        }
        _ => Arc::new(OfflineProvider),
    };
    HandlerDeps {
        llm,
        history: Arc::new(BoundedHistory::new(config.llm.history_capacity)),
        generator: GeneratorConfig::from_llm_config(&config.llm),
        profiles: stores.profiles.clone(),
        meals: stores.meals.clone(),
        chats: stores.chats.clone(),
        policy: config.nutrition.clone(),
    }
}

impl Coordinator {
    /// Build the three handlers over `deps` and `sources`
    ///
    /// Synthesis runs through the nutrition handler's generator, so it is
    /// paced with that handler's own calls.
    ///
    /// # Errors
    ///
    /// Returns an error if a handler's built-in patterns fail to compile.
    pub fn with_sources(deps: &HandlerDeps, sources: DataSources) -> AppResult<Self> {
        let nutrition = Arc::new(NutritionHandler::new(deps, sources.foods, sources.usda)?);
        let synthesizer = nutrition.generator();
        let handlers: Vec<Arc<dyn RequestHandler>> = vec![
            nutrition,
            Arc::new(RecipeHandler::new(deps, sources.recipes)?),
            Arc::new(TrackingHandler::new(deps)?),
        ];
        Ok(Self::new(deps, handlers)
            .with_synthesizer(synthesizer)
            .with_chat_store(deps.chats.clone()))
    }

    /// Build everything from configuration
    ///
    /// # Errors
    ///
    /// Returns an error if a handler's built-in patterns fail to compile.
    pub fn from_config(config: &ServerConfig, stores: &Stores) -> AppResult<Self> {
        initialize_shared_client(config.providers.http_timeout_secs, CONNECT_TIMEOUT_SECS);
        let sources = if config.offline {
            DataSources::offline()
        } else {
            DataSources::from_config(&config.providers)
        };
        let deps = handler_deps(config, stores);
        info!(
            llm = deps.llm.name(),
            food_sources = sources.foods.len(),
            usda_search = sources.usda.is_some(),
            "Coordinator assembled"
        );
        Self::with_sources(&deps, sources)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usda_goes_first_when_configured() {
        let config = ProviderConfig {
            usda_api_key: Some("key".to_owned()),
            ..ProviderConfig::default()
        };
        let sources = DataSources::from_config(&config);
        assert_eq!(sources.foods.len(), 2);
        assert!(sources.usda.is_some());
        assert_eq!(sources.foods[0].name(), sources.usda.as_ref().unwrap().name());
    }

    #[test]
    fn test_offline_sources_are_builtin() {
        let sources = DataSources::offline();
        assert_eq!(sources.foods.len(), 1);
        assert!(sources.usda.is_none());
        assert_eq!(sources.recipes.len(), 1);
    }
}
