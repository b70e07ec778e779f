// ABOUTME: Food and recipe data provider adapters for the Platewise diet assistant
// ABOUTME: Remote and static lookups normalized to one nutrient schema, plus text extraction helpers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Platewise Contributors

#![deny(unsafe_code)]

//! # Platewise Providers
//!
//! Knowledge adapters consumed by the agent handlers:
//!
//! - **food**: `FoodDataProvider` trait, quantity scaling, and the static food table
//! - **usda**: USDA `FoodData` Central client with TTL cache and request throttling
//! - **recipe**: `RecipeDataProvider` trait with HTTP and catalog implementations
//! - **extract**: ordered "first match wins" pattern combinator
//! - **quantity**: natural-language quantity and food-name extraction
//!
//! Remote adapters never surface transport failures to callers: a non-2xx
//! status or a timeout becomes "not found" so handlers can fall back.

/// Ordered pattern/extractor combinator
pub mod extract;

/// Food lookup contract, scaling, and static table
pub mod food;

/// Shared HTTP client for remote adapters
pub mod http_client;

/// Quantity and food-name extraction from free text
pub mod quantity;

/// Recipe lookup contract and implementations
pub mod recipe;

/// USDA `FoodData` Central adapter
pub mod usda;

pub use extract::FirstMatch;
pub use food::{FoodDataProvider, FoodQuery, FoodReference, StaticFoodTable};
pub use quantity::{FoodNameExtractor, NameMatch, ParsedQuantity, QuantityKind, QuantityParser};
pub use recipe::{
    HttpRecipeProvider, RecipeDataProvider, RecipeQueryExtractor, StaticRecipeCatalog,
};
pub use usda::{FoodSearchResult, UsdaClientConfig, UsdaFoodProvider};
