// ABOUTME: Nutrition policy configuration for energy targets, goal offsets, and insight thresholds
// ABOUTME: BMR coefficients, activity factors, macro splits, default targets, and macro insight limits
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Platewise Contributors

//! Nutrition Policy Configuration
//!
//! # Scientific References
//!
//! - BMR: Roza & Shizgal (1984), revised Harris-Benedict equations,
//!   DOI: 10.1093/ajcn/40.1.168
//! - Activity factors: `McArdle`, Katch & Katch (2010), Exercise Physiology

use serde::{Deserialize, Serialize};

use super::error::ConfigError;
use crate::models::ActivityLevel;

/// Nutrition policy bundle used by the nutrition and tracking handlers
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NutritionPolicyConfig {
    /// Basal Metabolic Rate (BMR) equation terms
    pub bmr: BmrConfig,
    /// Activity factor multipliers for TDEE calculation
    pub activity_factors: ActivityFactorsConfig,
    /// Goal offsets, macro splits, and fallback targets
    pub goals: GoalPolicyConfig,
    /// Thresholds for macro insight flags
    pub insights: InsightThresholds,
}

impl NutritionPolicyConfig {
    /// Validate every section
    ///
    /// # Errors
    ///
    /// Returns the first section error found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.bmr.validate()?;
        self.activity_factors.validate()?;
        self.goals.validate()?;
        self.insights.validate()
    }
}

/// One sex's terms of the revised Harris-Benedict equation
///
/// `BMR = constant + per_kg * weight + per_cm * height - per_year * age`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HarrisBenedictTerms {
    /// Intercept (kcal/day)
    pub constant: f64,
    /// kcal per kilogram of body weight
    pub per_kg: f64,
    /// kcal per centimeter of height
    pub per_cm: f64,
    /// kcal subtracted per year of age
    pub per_year: f64,
}

/// BMR equation terms and the floor for computed calorie targets
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BmrConfig {
    /// Terms used for male profiles
    pub male: HarrisBenedictTerms,
    /// Terms used for female profiles
    pub female: HarrisBenedictTerms,
    /// Lowest daily calorie target ever reported (kcal/day)
    pub minimum_target_calories: f64,
}

impl Default for BmrConfig {
    fn default() -> Self {
        Self {
            male: HarrisBenedictTerms {
                constant: 88.362,
                per_kg: 13.397,
                per_cm: 4.799,
                per_year: 5.677,
            },
            female: HarrisBenedictTerms {
                constant: 447.593,
                per_kg: 9.247,
                per_cm: 3.098,
                per_year: 4.330,
            },
            minimum_target_calories: 1000.0,
        }
    }
}

impl BmrConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        for terms in [&self.male, &self.female] {
            if terms.per_kg <= 0.0 || terms.per_cm <= 0.0 || terms.per_year < 0.0 {
                return Err(ConfigError::ValueOutOfRange(
                    "BMR weight and height terms must be positive, age term not negative"
                        .to_owned(),
                ));
            }
        }
        if self.minimum_target_calories < 0.0 {
            return Err(ConfigError::ValueOutOfRange(
                "minimum_target_calories must not be negative".to_owned(),
            ));
        }
        Ok(())
    }
}

/// Activity factor multipliers for TDEE calculation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityFactorsConfig {
    /// Sedentary (little/no exercise): 1.2
    pub sedentary: f64,
    /// Lightly active (1-3 days/week): 1.375
    pub lightly_active: f64,
    /// Moderately active (3-5 days/week): 1.55
    pub moderately_active: f64,
    /// Very active (6-7 days/week): 1.725
    pub very_active: f64,
    /// Extra active (hard training 2x/day): 1.9
    pub extra_active: f64,
}

impl Default for ActivityFactorsConfig {
    fn default() -> Self {
        Self {
            sedentary: 1.2,
            lightly_active: 1.375,
            moderately_active: 1.55,
            very_active: 1.725,
            extra_active: 1.9,
        }
    }
}

impl ActivityFactorsConfig {
    /// Multiplier for `level`
    #[must_use]
    pub const fn factor(&self, level: ActivityLevel) -> f64 {
        match level {
            ActivityLevel::Sedentary => self.sedentary,
            ActivityLevel::LightlyActive => self.lightly_active,
            ActivityLevel::ModeratelyActive => self.moderately_active,
            ActivityLevel::VeryActive => self.very_active,
            ActivityLevel::ExtraActive => self.extra_active,
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let factors = [
            self.sedentary,
            self.lightly_active,
            self.moderately_active,
            self.very_active,
            self.extra_active,
        ];
        if factors.iter().any(|f| !(1.0..=2.5).contains(f)) {
            return Err(ConfigError::ValueOutOfRange(
                "activity factors must be between 1.0 and 2.5".to_owned(),
            ));
        }
        if factors.windows(2).any(|w| w[0] > w[1]) {
            return Err(ConfigError::InvalidRange(
                "activity factors must not decrease with activity level",
            ));
        }
        Ok(())
    }
}

/// Macro distribution as calorie percentages (protein%, carbs%, fat%)
///
/// All percentages must sum to 100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacroDistribution {
    /// Protein percentage (0-100)
    pub protein_pct: u8,
    /// Carbohydrate percentage (0-100)
    pub carbs_pct: u8,
    /// Fat percentage (0-100)
    pub fat_pct: u8,
}

impl MacroDistribution {
    /// Create a new macro distribution
    ///
    /// # Panics
    ///
    /// Panics in debug mode if percentages don't sum to 100
    #[must_use]
    pub const fn new(protein_pct: u8, carbs_pct: u8, fat_pct: u8) -> Self {
        debug_assert!(
            protein_pct
                .saturating_add(carbs_pct)
                .saturating_add(fat_pct)
                == 100,
            "Macro percentages must sum to 100"
        );
        Self {
            protein_pct,
            carbs_pct,
            fat_pct,
        }
    }

    /// Get as a tuple (protein, carbs, fat)
    #[must_use]
    pub const fn as_tuple(&self) -> (u8, u8, u8) {
        (self.protein_pct, self.carbs_pct, self.fat_pct)
    }

    fn sum(self) -> u8 {
        self.protein_pct
            .saturating_add(self.carbs_pct)
            .saturating_add(self.fat_pct)
    }
}

/// Daily targets used when no personalized goal can be computed
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DefaultTargets {
    /// Calories (kcal)
    pub calories: f64,
    /// Protein (g)
    pub protein: f64,
    /// Carbohydrates (g)
    pub carbs: f64,
    /// Fat (g)
    pub fat: f64,
    /// Fiber (g)
    pub fiber: f64,
}

impl Default for DefaultTargets {
    fn default() -> Self {
        Self {
            calories: 2000.0,
            protein: 150.0,
            carbs: 250.0,
            fat: 65.0,
            fiber: 25.0,
        }
    }
}

/// Goal-dependent calorie offsets and macro splits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoalPolicyConfig {
    /// Calorie offset for a weight-loss goal (kcal/day)
    pub weight_loss_offset: f64,
    /// Calorie offset for weight-gain or muscle-gain goals (kcal/day)
    pub weight_gain_offset: f64,
    /// Split used without a muscle-gain goal
    pub balanced_split: MacroDistribution,
    /// Split used with a muscle-gain goal
    pub muscle_gain_split: MacroDistribution,
    /// Targets used without body metrics
    pub default_targets: DefaultTargets,
    /// Fiber target in grams, applied to personalized goals too
    pub fiber_target: f64,
    /// Lower bound of the on-target band, as a fraction of the goal
    pub on_target_low: f64,
    /// Upper bound of the on-target band, as a fraction of the goal
    pub on_target_high: f64,
}

impl Default for GoalPolicyConfig {
    fn default() -> Self {
        Self {
            weight_loss_offset: -500.0,
            weight_gain_offset: 300.0,
            balanced_split: MacroDistribution::new(30, 40, 30),
            muscle_gain_split: MacroDistribution::new(35, 40, 25),
            default_targets: DefaultTargets::default(),
            fiber_target: 25.0,
            on_target_low: 0.9,
            on_target_high: 1.1,
        }
    }
}

impl GoalPolicyConfig {
    /// Validate offsets, splits, and the on-target band
    ///
    /// # Errors
    ///
    /// Returns an error if a split does not sum to 100, an offset has the wrong
    /// sign, or the on-target band is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, split) in [
            ("balanced_split", self.balanced_split),
            ("muscle_gain_split", self.muscle_gain_split),
        ] {
            let sum = split.sum();
            if sum != 100 {
                return Err(ConfigError::InvalidWeights(format!(
                    "{name} macro percentages must sum to 100, got {sum}"
                )));
            }
        }
        if self.weight_loss_offset > 0.0 {
            return Err(ConfigError::ValueOutOfRange(format!(
                "weight_loss_offset must not be positive, got {}",
                self.weight_loss_offset
            )));
        }
        if self.weight_gain_offset < 0.0 {
            return Err(ConfigError::ValueOutOfRange(format!(
                "weight_gain_offset must not be negative, got {}",
                self.weight_gain_offset
            )));
        }
        if self.on_target_low >= self.on_target_high {
            return Err(ConfigError::InvalidRange(
                "on_target_low must be < on_target_high",
            ));
        }
        Ok(())
    }
}

/// Thresholds for the macro insight flags
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsightThresholds {
    /// Protein share of calories above which a food is high-protein (%)
    pub high_protein_pct: f64,
    /// Fat share of calories above which a food is high-fat (%)
    pub high_fat_pct: f64,
    /// Carbohydrate share of calories above which a food is high-carb (%)
    pub high_carb_pct: f64,
    /// Sodium above which a food is high-sodium (mg)
    pub high_sodium_mg: f64,
    /// Fiber at or above which a food is a good fiber source (g)
    pub good_fiber_g: f64,
}

impl Default for InsightThresholds {
    fn default() -> Self {
        Self {
            high_protein_pct: 30.0,
            high_fat_pct: 35.0,
            high_carb_pct: 60.0,
            high_sodium_mg: 600.0,
            good_fiber_g: 5.0,
        }
    }
}

impl InsightThresholds {
    fn validate(&self) -> Result<(), ConfigError> {
        for (name, pct) in [
            ("high_protein_pct", self.high_protein_pct),
            ("high_fat_pct", self.high_fat_pct),
            ("high_carb_pct", self.high_carb_pct),
        ] {
            if !(0.0..=100.0).contains(&pct) {
                return Err(ConfigError::ValueOutOfRange(format!(
                    "{name} must be between 0 and 100, got {pct}"
                )));
            }
        }
        if self.high_sodium_mg < 0.0 || self.good_fiber_g < 0.0 {
            return Err(ConfigError::ValueOutOfRange(
                "sodium and fiber thresholds must not be negative".to_owned(),
            ));
        }
        Ok(())
    }
}
