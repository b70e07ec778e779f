// ABOUTME: Handler-specific response payloads carried inside the shared HandlerResponse envelope
// ABOUTME: One tagged union per handler, each variant holding one local subtype's result
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Platewise Contributors

use std::collections::BTreeMap;
use std::slice;

use chrono::NaiveDate;
use platewise_providers::FoodSearchResult;
use serde::Serialize;

use super::recipe::RecipeCriteria;
use crate::intelligence::{
    DailyTotal, GoalProgress, MacroBreakdown, MealSummary, NutritionTargets, TrendReport,
    WeekSummary,
};
use crate::models::{FoodRecord, MealType, NutrientProfile, Recipe};

/// Payload of a handler response
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum HandlerPayload {
    /// Nutrition handler results
    Nutrition(NutritionPayload),
    /// Recipe handler results
    Recipe(RecipePayload),
    /// Tracking handler results
    Tracking(TrackingPayload),
    /// No payload (failures)
    Empty,
}

impl HandlerPayload {
    /// The analyzed food record, if this is a nutrition analysis
    #[must_use]
    pub const fn food_record(&self) -> Option<&FoodRecord> {
        match self {
            Self::Nutrition(NutritionPayload::Analysis { record, .. }) => Some(record),
            _ => None,
        }
    }

    /// Recipes carried by a recipe payload
    #[must_use]
    pub fn recipes(&self) -> &[Recipe] {
        match self {
            Self::Recipe(
                RecipePayload::Found { recipes, .. } | RecipePayload::GoalBased { recipes, .. },
            ) => recipes,
            Self::Recipe(RecipePayload::RecipeAnalysis { recipe, .. }) => {
                slice::from_ref(recipe)
            }
            _ => &[],
        }
    }
}

/// Nutrition handler results
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NutritionPayload {
    /// One analyzed food
    Analysis {
        /// Scaled food record
        record: FoodRecord,
        /// Macro calorie shares and flags
        macros: MacroBreakdown,
    },
    /// Food database search
    Search {
        /// Search text
        query: String,
        /// Top results
        results: Vec<FoodSearchResult>,
        /// Generated suggestions when the search found nothing
        #[serde(skip_serializing_if = "Option::is_none")]
        suggestions: Option<String>,
    },
    /// Nutrition of a whole recipe
    Recipe {
        /// Recipe name
        recipe: String,
        /// Servings the totals are divided by
        servings: u32,
        /// Sum over resolved ingredients
        total: NutrientProfile,
        /// `total / servings`
        per_serving: NutrientProfile,
        /// Resolved ingredients
        ingredients: Vec<FoodRecord>,
        /// Ingredients no data source knew
        unresolved: Vec<String>,
    },
    /// A day of eating, from a supplied food log or today's meal log
    DailyAnalysis {
        /// Items analyzed
        entries: usize,
        /// Sum over all items
        totals: NutrientProfile,
        /// Macro calorie shares of the totals
        macros: MacroBreakdown,
        /// Calories and items per meal slot
        meals: BTreeMap<MealType, MealSummary>,
        /// Generated review of the day; empty when there was nothing to review
        insights: String,
    },
    /// Free-form answer
    General {
        /// Generated answer
        answer: String,
    },
}

/// Recipe handler results
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RecipePayload {
    /// Ranked search results
    Found {
        /// Criteria used for ranking
        criteria: RecipeCriteria,
        /// Top recipes, best first
        recipes: Vec<Recipe>,
        /// Candidates considered before truncation
        total_found: usize,
    },
    /// Recipes suggested for a health goal
    GoalBased {
        /// Goal the suggestions target
        goal: String,
        /// Suggested recipes
        recipes: Vec<Recipe>,
    },
    /// Ingredient substitutions
    Substitutes {
        /// Ingredient being replaced
        ingredient: String,
        /// Generated suggestions
        suggestions: String,
    },
    /// Review of one supplied recipe
    RecipeAnalysis {
        /// The recipe reviewed
        recipe: Recipe,
        /// Generated review
        analysis: String,
    },
    /// Multi-day meal plan
    MealPlan {
        /// Days covered
        days: u32,
        /// Meals per day
        meals_per_day: u32,
        /// Daily calorie target
        target_calories: f64,
        /// Preferences respected by the plan
        dietary_preferences: Vec<String>,
        /// Generated plan
        plan: String,
    },
    /// Free-form answer
    General {
        /// Generated answer
        answer: String,
    },
}

/// Tracking handler results
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TrackingPayload {
    /// Today at a glance plus the 7-day average
    Overview {
        /// Today's totals
        today: NutrientProfile,
        /// Entries logged today
        today_entries: usize,
        /// Average per tracked day over the last week
        week_average: NutrientProfile,
        /// Days with entries in the last week
        days_tracked: usize,
    },
    /// Today's report
    Daily {
        /// Calendar day (UTC)
        date: NaiveDate,
        /// Today's totals
        totals: NutrientProfile,
        /// Entries logged today
        entries: usize,
        /// Today minus yesterday, when yesterday has entries
        #[serde(skip_serializing_if = "Option::is_none")]
        change_from_yesterday: Option<NutrientProfile>,
        /// Calories and items per meal slot
        meals: BTreeMap<MealType, MealSummary>,
    },
    /// Last seven days
    Weekly {
        /// Per-day totals, oldest first
        days: Vec<DailyTotal>,
        /// Average per tracked day
        average: NutrientProfile,
        /// "n/7 days"
        consistency: String,
    },
    /// Last thirty days
    Monthly {
        /// Entries logged
        entries: usize,
        /// Days with entries
        days_tracked: usize,
        /// Average per tracked day
        average: NutrientProfile,
        /// Seven-day window summaries
        weekly_trend: Vec<WeekSummary>,
    },
    /// Averages against targets
    Goals {
        /// Targets in effect
        targets: NutritionTargets,
        /// Per-nutrient progress; empty without logs
        progress: Vec<GoalProgress>,
    },
    /// Eating patterns over two weeks
    Trends {
        /// Entries per meal slot
        meal_distribution: BTreeMap<MealType, usize>,
        /// Calorie trend
        trend: TrendReport,
    },
    /// How to log food
    LoggingGuide {
        /// Meal slots an entry can be filed under
        meal_types: Vec<MealType>,
    },
    /// Free-form answer
    General {
        /// Generated answer
        answer: String,
    },
}
