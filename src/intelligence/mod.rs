// ABOUTME: Nutrition intelligence used by the handlers: energy targets, macro insights, and trends
// ABOUTME: Pure computations over profiles, nutrient profiles, and meal log entries
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Platewise Contributors

//! # Intelligence Module
//!
//! Deterministic analytics the handlers embed in their responses and in the
//! prompts they send for prose insights.
//!
//! - **energy**: Harris-Benedict BMR, maintenance calories, personalized daily targets, goal progress
//! - **insights**: calorie share of each macro and threshold flags
//! - **trends**: per-day totals, averages, meal distribution, calorie trends

/// BMR, maintenance calories, and daily targets
pub mod energy;
/// Macro calorie shares and insight flags
pub mod insights;
/// Day-keyed aggregation and trend detection
pub mod trends;

pub use energy::{
    basal_metabolic_rate, daily_targets, goal_progress, maintenance_calories,
    personalized_targets, BodyMetrics, GoalProgress, NutritionTargets, TargetStatus,
};
pub use insights::{InsightFlags, MacroBreakdown};
pub use trends::{
    average_per_day, calorie_trend, daily_totals, meal_breakdown, meal_distribution,
    weekly_summaries, DailyTotal, MealSummary, TrendReport, WeekComparison, WeekSummary,
};
