// ABOUTME: Recipe lookup contract with HTTP and built-in catalog implementations
// ABOUTME: Also extracts a recipe search query from free text with ordered patterns
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Platewise Contributors

use async_trait::async_trait;
use platewise_core::errors::{AppError, AppResult};
use platewise_core::models::{Recipe, RecipeSource};
use reqwest::Client;
use serde::Deserialize;
use tracing::warn;

use crate::extract::FirstMatch;
use crate::http_client::shared_client;

/// Source of recipes
#[async_trait]
pub trait RecipeDataProvider: Send + Sync {
    /// Provider name used in logs
    fn name(&self) -> &'static str;

    /// Search recipes matching `query`, returning at most `limit`
    ///
    /// A remote failure yields an empty list.
    ///
    /// # Errors
    ///
    /// Returns an error only for invalid queries.
    async fn search(&self, query: &str, limit: usize) -> AppResult<Vec<Recipe>>;
}

/// Recipe as returned by a remote recipe service
#[derive(Debug, Deserialize)]
struct RemoteRecipe {
    #[serde(alias = "title")]
    name: String,
    #[serde(default)]
    ingredients: Vec<String>,
    #[serde(default, alias = "prepTime", alias = "ready_in")]
    prep_time: Option<String>,
    #[serde(default)]
    calories: Option<f64>,
    #[serde(default)]
    difficulty: Option<String>,
    #[serde(default)]
    instructions: Option<String>,
    #[serde(default)]
    servings: Option<u32>,
}

impl From<RemoteRecipe> for Recipe {
    fn from(remote: RemoteRecipe) -> Self {
        Self {
            name: remote.name,
            source: RecipeSource::Web,
            ingredients: remote.ingredients,
            prep_time: remote.prep_time,
            calories: remote.calories,
            difficulty: remote.difficulty,
            instructions: remote.instructions,
            servings: remote.servings,
            score: 0.0,
        }
    }
}

/// Accepts either `{"recipes": [...]}` or a bare array
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RecipeSearchResponse {
    Wrapped { recipes: Vec<RemoteRecipe> },
    Bare(Vec<RemoteRecipe>),
}

impl RecipeSearchResponse {
    fn into_recipes(self) -> Vec<RemoteRecipe> {
        match self {
            Self::Wrapped { recipes } | Self::Bare(recipes) => recipes,
        }
    }
}

/// Recipe service reached over HTTP at `{base_url}/recipes/search`
#[derive(Debug, Clone)]
pub struct HttpRecipeProvider {
    base_url: String,
    http_client: Client,
}

impl HttpRecipeProvider {
    /// Create a provider using the shared HTTP client
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            http_client: shared_client().clone(),
        }
    }

    async fn fetch(&self, query: &str, limit: usize) -> AppResult<Vec<Recipe>> {
        let url = format!("{}/recipes/search", self.base_url);
        let response = self
            .http_client
            .get(&url)
            .query(&[("query", query), ("limit", &limit.to_string())])
            .send()
            .await
            .map_err(|e| AppError::external_unavailable("Recipe API", e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::external_service(
                "Recipe API",
                format!("HTTP {status}"),
            ));
        }

        let body: RecipeSearchResponse = response.json().await.map_err(|e| {
            AppError::external_service("Recipe API", format!("JSON parse error: {e}"))
        })?;

        Ok(body
            .into_recipes()
            .into_iter()
            .take(limit)
            .map(Recipe::from)
            .collect())
    }
}

#[async_trait]
impl RecipeDataProvider for HttpRecipeProvider {
    fn name(&self) -> &'static str {
        "http_recipes"
    }

    async fn search(&self, query: &str, limit: usize) -> AppResult<Vec<Recipe>> {
        if query.trim().is_empty() {
            return Err(AppError::invalid_input("Recipe query cannot be empty"));
        }
        match self.fetch(query, limit).await {
            Ok(recipes) => Ok(recipes),
            Err(e) => {
                warn!(error = %e, query, "recipe search failed; returning no results");
                Ok(Vec::new())
            }
        }
    }
}

/// Small built-in recipe catalog used offline
#[derive(Debug, Clone)]
pub struct StaticRecipeCatalog {
    recipes: Vec<Recipe>,
}

impl StaticRecipeCatalog {
    /// Catalog with the built-in recipes
    #[must_use]
    pub fn builtin() -> Self {
        let mut bowl = Recipe::named("Healthy Quinoa Bowl", RecipeSource::Web);
        bowl.ingredients = vec!["quinoa".to_owned(), "vegetables".to_owned(), "protein".to_owned()];
        bowl.prep_time = Some("30 minutes".to_owned());
        bowl.calories = Some(450.0);
        bowl.difficulty = Some("easy".to_owned());

        let mut salad = Recipe::named("Grilled Chicken Salad", RecipeSource::Web);
        salad.ingredients = vec![
            "chicken breast".to_owned(),
            "mixed greens".to_owned(),
            "vinaigrette".to_owned(),
        ];
        salad.prep_time = Some("25 minutes".to_owned());
        salad.calories = Some(350.0);
        salad.difficulty = Some("easy".to_owned());

        Self {
            recipes: vec![bowl, salad],
        }
    }

    /// Catalog with the given recipes
    #[must_use]
    pub const fn with_recipes(recipes: Vec<Recipe>) -> Self {
        Self { recipes }
    }
}

impl Default for StaticRecipeCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

#[async_trait]
impl RecipeDataProvider for StaticRecipeCatalog {
    fn name(&self) -> &'static str {
        "static_catalog"
    }

    // The catalog is small enough that every entry is a candidate; ranking
    // happens in the recipe handler.
    async fn search(&self, _query: &str, limit: usize) -> AppResult<Vec<Recipe>> {
        Ok(self.recipes.iter().take(limit).cloned().collect())
    }
}

const QUESTION_WORDS: &[&str] = &[
    "what", "how", "why", "when", "where", "which", "who", "can", "could", "should", "would",
    "is", "are", "do", "does",
];

/// Longest message, in words, accepted whole as a query
const MAX_BARE_QUERY_WORDS: usize = 6;

fn cleaned(captures: &regex::Captures<'_>) -> Option<String> {
    let text = captures.get(1)?.as_str().trim();
    (!text.is_empty()).then(|| text.to_owned())
}

/// Extracts a recipe search query from free text
#[derive(Debug)]
pub struct RecipeQueryExtractor {
    rules: FirstMatch<String>,
}

impl RecipeQueryExtractor {
    /// Build the ordered pattern list
    ///
    /// # Errors
    ///
    /// Returns an error if a built-in pattern fails to compile.
    pub fn new() -> AppResult<Self> {
        let rules = FirstMatch::new()
            .rule(
                r"recipes?\s+(?:for|with|using|containing)\s+([a-z][a-z ]*?)\s*(?:[?.!,]|$)",
                cleaned,
            )?
            .rule(
                r"(?:cook|make|prepare)\s+(?:with\s+|using\s+)?([a-z][a-z ]*?)\s*(?:[?.!,]|$)",
                cleaned,
            )?
            .rule(
                r"(?:ideas?|meals?|dishes)\s+(?:for|with)\s+([a-z][a-z ]*?)\s*(?:[?.!,]|$)",
                cleaned,
            )?
            .rule(r"([a-z]+(?: [a-z]+)?)\s+recipes?\b", |c| {
                cleaned(c).filter(|q| !matches!(q.as_str(), "a" | "some" | "any" | "the"))
            })?;
        Ok(Self { rules })
    }

    /// Extract a query, accepting short non-questions whole
    #[must_use]
    pub fn extract(&self, text: &str) -> Option<String> {
        let lower = text.trim().to_lowercase();
        if let Some(query) = self.rules.first(&lower) {
            return Some(query);
        }
        let words: Vec<&str> = lower.split_whitespace().collect();
        let is_question = lower.ends_with('?')
            || words
                .first()
                .is_some_and(|first| QUESTION_WORDS.contains(first));
        (!words.is_empty() && words.len() <= MAX_BARE_QUERY_WORDS && !is_question)
            .then(|| lower.trim_end_matches(['.', '!']).to_owned())
    }
}
