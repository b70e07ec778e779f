// ABOUTME: Core data models for the Platewise diet assistant
// ABOUTME: Re-exports nutrient, recipe, profile, meal log, and chat turn types
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Platewise Contributors

mod chat;
mod nutrition;
mod profile;
mod recipe;

pub use chat::ChatTurn;
pub use nutrition::{DataSource, FoodRecord, MealLogEntry, MealType, NutrientProfile};
pub use profile::{ActivityLevel, Sex, UserProfile};
pub use recipe::{Recipe, RecipeSource};
