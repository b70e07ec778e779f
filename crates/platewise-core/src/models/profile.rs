// ABOUTME: User profile model consumed by goal calculation and recipe filtering
// ABOUTME: Body metrics, activity level, dietary preferences, allergies, and health goals
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Platewise Contributors

use serde::{Deserialize, Serialize};

/// Biological sex used by the BMR equation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    /// Male constant in the BMR equation
    Male,
    /// Female constant in the BMR equation
    Female,
}

/// Activity level for TDEE calculation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityLevel {
    /// Little or no exercise
    Sedentary,
    /// Light exercise 1-3 days/week
    LightlyActive,
    /// Moderate exercise 3-5 days/week
    ModeratelyActive,
    /// Hard exercise 6-7 days/week
    VeryActive,
    /// Very hard exercise, physical job, or training twice per day
    ExtraActive,
}

/// Profile fields the agents read; every field is optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserProfile {
    /// Age in years
    pub age: Option<u32>,
    /// Biological sex
    #[serde(alias = "gender")]
    pub sex: Option<Sex>,
    /// Body weight in kg
    #[serde(alias = "weight")]
    pub weight_kg: Option<f64>,
    /// Height in cm
    #[serde(alias = "height")]
    pub height_cm: Option<f64>,
    /// Activity level
    pub activity_level: Option<ActivityLevel>,
    /// Dietary preferences (vegetarian, vegan, keto, ...)
    pub dietary_preferences: Vec<String>,
    /// Food allergies
    pub allergies: Vec<String>,
    /// Health goals (`weight_loss`, `muscle_gain`, `maintenance`, ...)
    pub health_goals: Vec<String>,
}

impl UserProfile {
    /// Whether the profile carries every metric the energy equations need
    #[must_use]
    pub const fn has_body_metrics(&self) -> bool {
        self.age.is_some()
            && self.sex.is_some()
            && self.weight_kg.is_some()
            && self.height_cm.is_some()
    }

    /// Case-insensitive check for a health goal
    #[must_use]
    pub fn has_goal(&self, goal: &str) -> bool {
        self.health_goals
            .iter()
            .any(|g| g.eq_ignore_ascii_case(goal))
    }
}
