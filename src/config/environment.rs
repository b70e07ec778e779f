// ABOUTME: Environment-based configuration for backends, providers, and generator limits
// ABOUTME: Reads GEMINI_*, USDA_*, RECIPE_API_URL, LLM_* and HTTP_TIMEOUT_SECS into typed structs
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Platewise Contributors

use std::env;
use std::time::Duration;

use anyhow::{Context, Result};
use platewise_providers::usda::DEFAULT_BASE_URL;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::error::ConfigError;
use super::nutrition::NutritionPolicyConfig;
use crate::history::DEFAULT_HISTORY_CAPACITY;
use crate::llm::DEFAULT_MODEL;

/// Text-generation backend settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Gemini API key; `None` runs the agents offline
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Model name
    pub model: String,
    /// Minimum gap between two generation calls of one agent
    pub min_interval_ms: u64,
    /// History turns embedded in each prompt
    pub history_turns: usize,
    /// History turns kept per user
    pub history_capacity: usize,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_owned(),
            min_interval_ms: 1000,
            history_turns: 5,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
        }
    }
}

impl LlmConfig {
    /// Minimum interval as a `Duration`
    #[must_use]
    pub const fn min_interval(&self) -> Duration {
        Duration::from_millis(self.min_interval_ms)
    }
}

/// Food and recipe data source settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// USDA `FoodData` Central API key; `None` skips USDA lookups
    #[serde(skip_serializing)]
    pub usda_api_key: Option<String>,
    /// USDA base URL
    pub usda_base_url: String,
    /// Remote recipe service; `None` uses the built-in catalog
    pub recipe_api_url: Option<String>,
    /// Request timeout for remote lookups
    pub http_timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            usda_api_key: None,
            usda_base_url: DEFAULT_BASE_URL.to_owned(),
            recipe_api_url: None,
            http_timeout_secs: 8,
        }
    }
}

/// Complete runtime configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Text-generation backend
    pub llm: LlmConfig,
    /// Data sources
    pub providers: ProviderConfig,
    /// Nutrition policy constants
    pub nutrition: NutritionPolicyConfig,
    /// Ignore every remote backend and use built-in data only
    pub offline: bool,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if a numeric variable cannot be parsed.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let llm = LlmConfig {
            api_key: non_empty_var("GEMINI_API_KEY"),
            model: env_var_or("GEMINI_MODEL", &defaults.llm.model),
            min_interval_ms: env_var_or(
                "LLM_MIN_INTERVAL_MS",
                &defaults.llm.min_interval_ms.to_string(),
            )
            .parse()
            .context("Invalid LLM_MIN_INTERVAL_MS value")?,
            history_turns: env_var_or(
                "LLM_HISTORY_TURNS",
                &defaults.llm.history_turns.to_string(),
            )
            .parse()
            .context("Invalid LLM_HISTORY_TURNS value")?,
            history_capacity: env_var_or(
                "LLM_HISTORY_CAPACITY",
                &defaults.llm.history_capacity.to_string(),
            )
            .parse()
            .context("Invalid LLM_HISTORY_CAPACITY value")?,
        };

        let providers = ProviderConfig {
            usda_api_key: non_empty_var("USDA_API_KEY"),
            usda_base_url: env_var_or("USDA_BASE_URL", &defaults.providers.usda_base_url),
            recipe_api_url: non_empty_var("RECIPE_API_URL"),
            http_timeout_secs: env_var_or(
                "HTTP_TIMEOUT_SECS",
                &defaults.providers.http_timeout_secs.to_string(),
            )
            .parse()
            .context("Invalid HTTP_TIMEOUT_SECS value")?,
        };

        let config = Self {
            llm,
            providers,
            nutrition: NutritionPolicyConfig::default(),
            offline: false,
        };
        config.validate().context("Invalid configuration")?;
        Ok(config)
    }

    /// Validate limits and the nutrition policy
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` describing the first invalid value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.llm.history_capacity == 0 {
            return Err(ConfigError::ValueOutOfRange(
                "LLM_HISTORY_CAPACITY must be at least 1".to_owned(),
            ));
        }
        if self.llm.history_turns > self.llm.history_capacity {
            return Err(ConfigError::InvalidRange(
                "LLM_HISTORY_TURNS must not exceed LLM_HISTORY_CAPACITY",
            ));
        }
        if !(1..=60).contains(&self.providers.http_timeout_secs) {
            return Err(ConfigError::ValueOutOfRange(format!(
                "HTTP_TIMEOUT_SECS must be between 1 and 60, got {}",
                self.providers.http_timeout_secs
            )));
        }
        self.nutrition.validate()
    }

    /// Whether a text-generation backend is usable
    #[must_use]
    pub const fn has_llm(&self) -> bool {
        !self.offline && self.llm.api_key.is_some()
    }

    /// Log a summary without secrets
    pub fn log_summary(&self) {
        info!(
            model = %self.llm.model,
            llm_configured = self.has_llm(),
            usda_configured = !self.offline && self.providers.usda_api_key.is_some(),
            recipe_api = self.providers.recipe_api_url.as_deref().unwrap_or("builtin"),
            min_interval_ms = self.llm.min_interval_ms,
            offline = self.offline,
            "Configuration loaded"
        );
    }
}

fn env_var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_owned())
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}
