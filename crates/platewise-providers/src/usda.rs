// ABOUTME: USDA FoodData Central adapter for food search and nutrient lookup
// ABOUTME: Implements search, nutrient normalization, LRU/TTL caching, and per-minute rate limiting
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Platewise Contributors

//! USDA `FoodData` Central adapter
//!
//! Searches `/foods/search` and normalizes the first hit into the shared
//! nutrient schema. Search results carry their nutrients per 100 g, so a
//! lookup scales them by `quantity / 100`.
//!
//! # Features
//! - Search results cached in a bounded LRU with a TTL (24 hours by default)
//! - Sliding-window rate limiting (30 requests per minute by default)
//! - Remote failures degrade to "not found" instead of surfacing to callers
//!
//! # API Reference
//! USDA `FoodData` Central API: <https://fdc.nal.usda.gov/api-guide.html>

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use lru::LruCache;
use platewise_core::constants::{reference_amounts, usda_nutrients};
use platewise_core::errors::{AppError, AppResult};
use platewise_core::models::{DataSource, FoodRecord, NutrientProfile};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::food::{FoodDataProvider, FoodQuery, FoodReference};
use crate::http_client::shared_client;

const SERVICE: &str = "USDA API";

/// Public USDA `FoodData` Central endpoint
pub const DEFAULT_BASE_URL: &str = "https://api.nal.usda.gov/fdc/v1";

/// USDA adapter configuration
#[derive(Debug, Clone)]
pub struct UsdaClientConfig {
    /// USDA API key (free from <https://fdc.nal.usda.gov/api-key-signup.html>)
    pub api_key: String,
    /// Base URL for USDA API (default: <https://api.nal.usda.gov/fdc/v1>)
    pub base_url: String,
    /// Cache TTL in seconds (default: 86400 = 24 hours)
    pub cache_ttl_secs: u64,
    /// Rate limit per minute (default: 30)
    pub rate_limit_per_minute: u32,
    /// Maximum cached searches (default: 256)
    pub max_cache_items: usize,
}

impl Default for UsdaClientConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_owned(),
            cache_ttl_secs: 86400,
            rate_limit_per_minute: 30,
            max_cache_items: 256,
        }
    }
}

/// Summary of one search hit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoodSearchResult {
    /// `FoodData` Central ID
    pub fdc_id: u64,
    /// Food description
    pub description: String,
    /// Brand owner (branded foods only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    /// Food category
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Data type (e.g., "Foundation", "SR Legacy", "Branded")
    pub data_type: String,
}

/// One food from a search response, with nutrients per 100 g
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsdaFood {
    fdc_id: u64,
    description: String,
    #[serde(default)]
    data_type: String,
    #[serde(default)]
    brand_owner: Option<String>,
    #[serde(default)]
    food_category: Option<String>,
    #[serde(default)]
    food_nutrients: Vec<UsdaNutrient>,
}

impl UsdaFood {
    fn summary(&self) -> FoodSearchResult {
        FoodSearchResult {
            fdc_id: self.fdc_id,
            description: self.description.clone(),
            brand: self.brand_owner.clone(),
            category: self.food_category.clone(),
            data_type: self.data_type.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsdaNutrient {
    nutrient_id: u32,
    #[serde(default, alias = "amount")]
    value: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    foods: Vec<UsdaFood>,
}

/// Map USDA nutrient entries onto the fixed schema, zero-filling omissions
fn normalize_nutrients(nutrients: &[UsdaNutrient]) -> NutrientProfile {
    let mut profile = NutrientProfile::default();
    for nutrient in nutrients {
        let value = nutrient.value.unwrap_or(0.0);
        match nutrient.nutrient_id {
            usda_nutrients::ENERGY_KCAL => profile.calories = value,
            usda_nutrients::PROTEIN => profile.protein = value,
            usda_nutrients::CARBOHYDRATE => profile.carbs = value,
            usda_nutrients::TOTAL_FAT => profile.fat = value,
            usda_nutrients::FIBER => profile.fiber = value,
            usda_nutrients::SUGARS => profile.sugar = value,
            usda_nutrients::SODIUM => profile.sodium = value,
            _ => {}
        }
    }
    profile
}

/// Cache entry with expiration
#[derive(Debug, Clone)]
struct CacheEntry<T> {
    data: T,
    expires_at: Instant,
}

/// Sliding-window request limiter
#[derive(Debug)]
struct RateLimiter {
    requests: Vec<Instant>,
    limit: u32,
    window: Duration,
}

impl RateLimiter {
    const fn new(limit: u32, window: Duration) -> Self {
        Self {
            requests: Vec::new(),
            limit,
            window,
        }
    }

    fn can_request(&mut self) -> bool {
        let now = Instant::now();
        self.requests.retain(|&t| now.duration_since(t) < self.window);
        self.requests.len() < self.limit as usize
    }

    fn record_request(&mut self) {
        self.requests.push(Instant::now());
    }

    async fn wait_if_needed(&mut self) {
        while !self.can_request() {
            sleep(Duration::from_secs(1)).await;
        }
    }
}

/// USDA `FoodData` Central adapter
pub struct UsdaFoodProvider {
    config: UsdaClientConfig,
    http_client: Client,
    search_cache: Arc<Mutex<LruCache<String, CacheEntry<Vec<UsdaFood>>>>>,
    rate_limiter: Arc<RwLock<RateLimiter>>,
}

impl UsdaFoodProvider {
    /// Create an adapter using the shared HTTP client
    #[must_use]
    pub fn new(config: UsdaClientConfig) -> Self {
        let rate_limiter = RateLimiter::new(config.rate_limit_per_minute, Duration::from_secs(60));
        let capacity = NonZeroUsize::new(config.max_cache_items).unwrap_or(NonZeroUsize::MIN);

        Self {
            config,
            http_client: shared_client().clone(),
            search_cache: Arc::new(Mutex::new(LruCache::new(capacity))),
            rate_limiter: Arc::new(RwLock::new(rate_limiter)),
        }
    }

    /// Whether an API key is configured
    #[must_use]
    pub fn is_configured(&self) -> bool {
        !self.config.api_key.is_empty()
    }

    async fn search_raw(&self, query: &str, page_size: u32) -> AppResult<Vec<UsdaFood>> {
        if query.trim().is_empty() {
            return Err(AppError::invalid_input("Search query cannot be empty"));
        }

        if page_size == 0 || page_size > 200 {
            return Err(AppError::invalid_input(
                "Page size must be between 1 and 200",
            ));
        }

        let cache_key = format!("{}:{page_size}", query.to_lowercase());
        {
            let mut cache = self.search_cache.lock().await;
            if let Some(entry) = cache.get(&cache_key) {
                if Instant::now() < entry.expires_at {
                    debug!(query, "USDA search cache hit");
                    return Ok(entry.data.clone());
                }
            }
        }

        {
            let mut limiter = self.rate_limiter.write().await;
            limiter.wait_if_needed().await;
            limiter.record_request();
        }

        let url = format!("{}/foods/search", self.config.base_url);
        let response = self
            .http_client
            .get(&url)
            .query(&[
                ("query", query),
                ("pageSize", &page_size.to_string()),
                ("api_key", &self.config.api_key),
            ])
            .send()
            .await
            .map_err(|e| AppError::external_unavailable(SERVICE, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::external_service(
                SERVICE,
                format!("HTTP {}: {}", status, response.text().await.unwrap_or_default()),
            ));
        }

        let search_response: SearchResponse = response
            .json()
            .await
            .map_err(|e| AppError::external_service(SERVICE, format!("JSON parse error: {e}")))?;

        self.search_cache.lock().await.put(
            cache_key,
            CacheEntry {
                data: search_response.foods.clone(),
                expires_at: Instant::now() + Duration::from_secs(self.config.cache_ttl_secs),
            },
        );

        Ok(search_response.foods)
    }

    /// Search foods by free text
    ///
    /// A remote failure yields an empty list.
    ///
    /// # Errors
    ///
    /// Returns an error if `query` is empty or `page_size` is outside 1..=200.
    pub async fn search(&self, query: &str, page_size: u32) -> AppResult<Vec<FoodSearchResult>> {
        match self.search_raw(query, page_size).await {
            Ok(foods) => Ok(foods.iter().map(UsdaFood::summary).collect()),
            Err(e) if e.code.http_status() == 400 => Err(e),
            Err(e) => {
                warn!(error = %e, query, "USDA search failed; returning no results");
                Ok(Vec::new())
            }
        }
    }

    /// Clear the search cache
    pub async fn clear_caches(&self) {
        self.search_cache.lock().await.clear();
    }

    /// Number of cached searches
    pub async fn cache_stats(&self) -> usize {
        self.search_cache.lock().await.len()
    }
}

#[async_trait]
impl FoodDataProvider for UsdaFoodProvider {
    fn name(&self) -> &'static str {
        "usda"
    }

    async fn lookup(&self, query: &FoodQuery) -> AppResult<Option<FoodRecord>> {
        let foods = match self.search_raw(&query.food_name, 5).await {
            Ok(foods) => foods,
            Err(e) if e.code.http_status() == 400 => return Err(e),
            Err(e) => {
                warn!(error = %e, food = %query.food_name, "USDA lookup failed; treating as not found");
                return Ok(None);
            }
        };

        Ok(foods
            .into_iter()
            .find(|food| !food.food_nutrients.is_empty())
            .map(|food| {
                let reference = FoodReference {
                    name: query.food_name.clone(),
                    reference_amount: reference_amounts::PER_100_GRAMS,
                    nutrients: normalize_nutrients(&food.food_nutrients),
                };
                reference.scale_to(query.quantity, DataSource::Usda, Some(food.fdc_id))
            }))
    }
}
