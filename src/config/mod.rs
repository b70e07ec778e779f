// ABOUTME: Configuration module for runtime settings and nutrition policy
// ABOUTME: Environment-driven server config plus validated nutrition policy constants
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Platewise Contributors

//! Configuration module for Platewise
//!
//! - **Environment**: backend keys, endpoints, and generator limits from environment variables
//! - **Nutrition**: BMR coefficients, activity factors, goal policy, insight thresholds
//! - **Error**: validation errors shared by every section

/// Environment and server configuration
pub mod environment;
/// Configuration validation errors
pub mod error;
/// Nutrition policy configuration
pub mod nutrition;

pub use environment::{LlmConfig, ProviderConfig, ServerConfig};
pub use error::ConfigError;
pub use nutrition::{
    ActivityFactorsConfig, BmrConfig, DefaultTargets, GoalPolicyConfig, HarrisBenedictTerms,
    InsightThresholds, MacroDistribution, NutritionPolicyConfig,
};
