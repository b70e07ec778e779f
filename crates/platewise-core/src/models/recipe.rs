// ABOUTME: Recipe model returned by recipe providers and generated suggestions
// ABOUTME: Recipe and RecipeSource definitions with relevance score
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Platewise Contributors

use serde::{Deserialize, Serialize};

/// Origin of a recipe
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecipeSource {
    /// Remote recipe service or built-in catalog
    #[default]
    Web,
    /// Parsed from structured text-generation output
    Ai,
    /// Recovered from unstructured text-generation output
    AiGenerated,
}

/// A recipe as exchanged between handlers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    /// Recipe name
    pub name: String,
    /// Origin; recipes supplied by a user count as web recipes
    #[serde(default)]
    pub source: RecipeSource,
    /// Ingredient lines ("2 cups rice", "chicken breast")
    #[serde(default)]
    pub ingredients: Vec<String>,
    /// Free-text preparation time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prep_time: Option<String>,
    /// Calories per serving
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calories: Option<f64>,
    /// Difficulty label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<String>,
    /// Cooking instructions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    /// Number of servings the ingredients make
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub servings: Option<u32>,
    /// Relevance score assigned during ranking
    #[serde(default)]
    pub score: f64,
}

impl Recipe {
    /// Create a recipe with only a name and source
    pub fn named(name: impl Into<String>, source: RecipeSource) -> Self {
        Self {
            name: name.into(),
            source,
            ingredients: Vec::new(),
            prep_time: None,
            calories: None,
            difficulty: None,
            instructions: None,
            servings: None,
            score: 0.0,
        }
    }
}
