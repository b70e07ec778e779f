// ABOUTME: Integration tests for environment configuration loading and validation
// ABOUTME: Runs serially because every test mutates process environment variables
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Platewise Contributors

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use std::env;
use std::time::Duration;

use platewise::config::{ConfigError, ServerConfig};
use serial_test::serial;

const VARS: &[&str] = &[
    "GEMINI_API_KEY",
    "GEMINI_MODEL",
    "LLM_MIN_INTERVAL_MS",
    "LLM_HISTORY_TURNS",
    "LLM_HISTORY_CAPACITY",
    "USDA_API_KEY",
    "USDA_BASE_URL",
    "RECIPE_API_URL",
    "HTTP_TIMEOUT_SECS",
];

fn clear_env() {
    for var in VARS {
        env::remove_var(var);
    }
}

#[test]
#[serial]
fn test_defaults_without_environment() {
    clear_env();
    let config = ServerConfig::from_env().unwrap();

    assert!(config.llm.api_key.is_none());
    assert!(!config.has_llm());
    assert_eq!(config.llm.min_interval(), Duration::from_secs(1));
    assert_eq!(config.llm.history_capacity, 50);
    assert!(config.providers.usda_api_key.is_none());
    assert!(config.providers.recipe_api_url.is_none());
    assert_eq!(config.providers.http_timeout_secs, 8);
}

#[test]
#[serial]
fn test_environment_overrides() {
    clear_env();
    env::set_var("GEMINI_API_KEY", "  key-123  ");
    env::set_var("LLM_MIN_INTERVAL_MS", "250");
    env::set_var("USDA_API_KEY", "");
    env::set_var("RECIPE_API_URL", "http://localhost:9000/recipes");

    let config = ServerConfig::from_env().unwrap();
    assert_eq!(config.llm.api_key.as_deref(), Some("key-123"));
    assert!(config.has_llm());
    assert_eq!(config.llm.min_interval(), Duration::from_millis(250));
    assert!(config.providers.usda_api_key.is_none());
    assert_eq!(
        config.providers.recipe_api_url.as_deref(),
        Some("http://localhost:9000/recipes")
    );

    let offline = ServerConfig {
        offline: true,
        ..config
    };
    assert!(!offline.has_llm());
    clear_env();
}

#[test]
#[serial]
fn test_secrets_are_not_serialized() {
    clear_env();
    env::set_var("GEMINI_API_KEY", "secret-gemini");
    env::set_var("USDA_API_KEY", "secret-usda");

    let config = ServerConfig::from_env().unwrap();
    let json = serde_json::to_string(&config).unwrap();
    assert!(!json.contains("secret"));
    clear_env();
}

#[test]
#[serial]
fn test_unparsable_number_is_rejected() {
    clear_env();
    env::set_var("LLM_MIN_INTERVAL_MS", "soon");
    let error = ServerConfig::from_env().unwrap_err();
    assert!(error.to_string().contains("LLM_MIN_INTERVAL_MS"));
    clear_env();
}

#[test]
#[serial]
fn test_out_of_range_values_fail_validation() {
    clear_env();
    env::set_var("HTTP_TIMEOUT_SECS", "0");
    assert!(ServerConfig::from_env().is_err());

    clear_env();
    env::set_var("LLM_HISTORY_TURNS", "10");
    env::set_var("LLM_HISTORY_CAPACITY", "5");
    assert!(ServerConfig::from_env().is_err());
    clear_env();
}

#[test]
fn test_validate_reports_first_problem() {
    let mut config = ServerConfig::default();
    assert!(config.validate().is_ok());

    config.llm.history_capacity = 0;
    assert!(matches!(
        config.validate(),
        Err(ConfigError::ValueOutOfRange(message)) if message.contains("LLM_HISTORY_CAPACITY")
    ));

    let mut config = ServerConfig::default();
    config.nutrition.goals.weight_loss_offset = 200.0;
    assert!(matches!(
        config.validate(),
        Err(ConfigError::ValueOutOfRange(message)) if message.contains("weight_loss_offset")
    ));

    let mut config = ServerConfig::default();
    config.nutrition.goals.on_target_low = 1.2;
    assert_eq!(
        config.validate(),
        Err(ConfigError::InvalidRange("on_target_low must be < on_target_high"))
    );
}
