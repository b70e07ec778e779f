// ABOUTME: Energy expenditure and daily nutrition targets from body metrics and goals
// ABOUTME: Harris-Benedict BMR, activity-scaled maintenance, goal offsets, macro splits, and progress
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Platewise Contributors

//! Energy and target calculations
//!
//! Basal metabolic rate comes from the revised Harris-Benedict equations
//! (Roza & Shizgal, 1984). Maintenance calories are BMR times the activity
//! factor. Personalized targets need the four body metrics and an activity
//! level; anything less falls back to the default targets.

use serde::{Deserialize, Serialize};

use crate::config::{
    ActivityFactorsConfig, BmrConfig, DefaultTargets, GoalPolicyConfig, MacroDistribution,
    NutritionPolicyConfig,
};
use crate::constants::energy::{KCAL_PER_GRAM_CARBS, KCAL_PER_GRAM_FAT, KCAL_PER_GRAM_PROTEIN};
use crate::errors::{AppError, AppResult};
use crate::models::{ActivityLevel, NutrientProfile, Sex, UserProfile};

/// Body metrics the BMR equation needs
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyMetrics {
    /// Body weight (kg)
    pub weight_kg: f64,
    /// Height (cm)
    pub height_cm: f64,
    /// Age in years
    pub age: u32,
    /// Sex selecting the equation terms
    pub sex: Sex,
}

impl BodyMetrics {
    /// Metrics from a profile, or `None` if any of them is missing
    #[must_use]
    pub fn from_profile(profile: &UserProfile) -> Option<Self> {
        match (profile.weight_kg, profile.height_cm, profile.age, profile.sex) {
            (Some(weight_kg), Some(height_cm), Some(age), Some(sex)) => Some(Self {
                weight_kg,
                height_cm,
                age,
                sex,
            }),
            _ => None,
        }
    }

    fn check(&self) -> AppResult<()> {
        if self.weight_kg <= 0.0 || self.weight_kg > 300.0 {
            return Err(AppError::invalid_input("weight must be in (0, 300] kg"));
        }
        if self.height_cm <= 0.0 || self.height_cm > 300.0 {
            return Err(AppError::invalid_input("height must be in (0, 300] cm"));
        }
        if !(1..=120).contains(&self.age) {
            return Err(AppError::invalid_input("age must be 1 to 120 years"));
        }
        Ok(())
    }
}

/// Basal metabolic rate in kcal/day
///
/// # Errors
///
/// Returns an invalid-input error for implausible metrics.
pub fn basal_metabolic_rate(metrics: &BodyMetrics, config: &BmrConfig) -> AppResult<f64> {
    metrics.check()?;
    let terms = match metrics.sex {
        Sex::Male => &config.male,
        Sex::Female => &config.female,
    };
    let age_term = terms.per_year.mul_add(-f64::from(metrics.age), terms.constant);
    Ok(terms
        .per_kg
        .mul_add(metrics.weight_kg, terms.per_cm.mul_add(metrics.height_cm, age_term)))
}

/// Calories that keep weight stable at `level`
#[must_use]
pub fn maintenance_calories(
    bmr: f64,
    level: ActivityLevel,
    factors: &ActivityFactorsConfig,
) -> f64 {
    bmr * factors.factor(level)
}

/// Daily calorie and macro targets
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NutritionTargets {
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
    /// Whether the targets were computed from the user's body metrics
    pub personalized: bool,
}

impl NutritionTargets {
    /// Fixed fallback targets
    #[must_use]
    pub const fn from_defaults(defaults: &DefaultTargets) -> Self {
        Self {
            calories: defaults.calories,
            protein: defaults.protein,
            carbs: defaults.carbs,
            fat: defaults.fat,
            fiber: defaults.fiber,
            personalized: false,
        }
    }

    /// Split `calories` into grams with `split`
    #[must_use]
    pub fn from_calories(calories: f64, split: MacroDistribution, fiber: f64) -> Self {
        let (protein_pct, carbs_pct, fat_pct) = split.as_tuple();
        let grams = |pct: u8, kcal_per_gram: f64| {
            (calories * f64::from(pct) / 100.0 / kcal_per_gram).round()
        };
        Self {
            calories: calories.round(),
            protein: grams(protein_pct, KCAL_PER_GRAM_PROTEIN),
            carbs: grams(carbs_pct, KCAL_PER_GRAM_CARBS),
            fat: grams(fat_pct, KCAL_PER_GRAM_FAT),
            fiber,
            personalized: true,
        }
    }

    /// Targets as `(nutrient, value)` pairs
    #[must_use]
    pub const fn fields(&self) -> [(&'static str, f64); 5] {
        [
            ("calories", self.calories),
            ("protein", self.protein),
            ("carbs", self.carbs),
            ("fat", self.fat),
            ("fiber", self.fiber),
        ]
    }
}

/// Calorie offset implied by the profile's health goals
#[must_use]
pub fn goal_offset(profile: &UserProfile, goals: &GoalPolicyConfig) -> f64 {
    if profile.has_goal("weight_loss") {
        goals.weight_loss_offset
    } else if profile.has_goal("weight_gain") || profile.has_goal("muscle_gain") {
        goals.weight_gain_offset
    } else {
        0.0
    }
}

/// Macro split implied by the profile's health goals
#[must_use]
pub fn macro_split(profile: &UserProfile, goals: &GoalPolicyConfig) -> MacroDistribution {
    if profile.has_goal("muscle_gain") {
        goals.muscle_gain_split
    } else {
        goals.balanced_split
    }
}

/// Targets computed from the profile, or `None` when a body metric or the
/// activity level is missing
///
/// # Errors
///
/// Returns an error if a body metric is implausible.
pub fn personalized_targets(
    profile: &UserProfile,
    policy: &NutritionPolicyConfig,
) -> AppResult<Option<NutritionTargets>> {
    let (Some(metrics), Some(activity)) =
        (BodyMetrics::from_profile(profile), profile.activity_level)
    else {
        return Ok(None);
    };

    let bmr = basal_metabolic_rate(&metrics, &policy.bmr)?;
    let maintenance = maintenance_calories(bmr, activity, &policy.activity_factors);
    let calories = (maintenance + goal_offset(profile, &policy.goals))
        .max(policy.bmr.minimum_target_calories);

    Ok(Some(NutritionTargets::from_calories(
        calories,
        macro_split(profile, &policy.goals),
        policy.goals.fiber_target,
    )))
}

/// Personalized targets when possible, default targets otherwise
#[must_use]
pub fn daily_targets(
    profile: Option<&UserProfile>,
    policy: &NutritionPolicyConfig,
) -> NutritionTargets {
    profile
        .and_then(|p| personalized_targets(p, policy).ok().flatten())
        .unwrap_or_else(|| NutritionTargets::from_defaults(&policy.goals.default_targets))
}

/// Position of an average relative to its target band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetStatus {
    /// Below the band
    Below,
    /// Inside the band
    OnTarget,
    /// Above the band
    Above,
}

/// One nutrient's average against its target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalProgress {
    /// Nutrient name
    pub nutrient: String,
    /// Daily average
    pub current: f64,
    /// Daily target
    pub target: f64,
    /// `current / target` as a percentage
    pub percentage: f64,
    /// Band classification
    pub status: TargetStatus,
}

/// Compare daily averages with targets
#[must_use]
pub fn goal_progress(
    averages: &NutrientProfile,
    targets: &NutritionTargets,
    goals: &GoalPolicyConfig,
) -> Vec<GoalProgress> {
    let low = goals.on_target_low * 100.0;
    let high = goals.on_target_high * 100.0;
    let current_of = |nutrient: &str| {
        averages
            .fields()
            .iter()
            .find(|(name, _)| *name == nutrient)
            .map_or(0.0, |(_, value)| *value)
    };

    targets
        .fields()
        .iter()
        .filter(|(_, target)| *target > 0.0)
        .map(|(nutrient, target)| {
            let current = current_of(nutrient);
            let percentage = current / target * 100.0;
            let status = if percentage < low {
                TargetStatus::Below
            } else if percentage > high {
                TargetStatus::Above
            } else {
                TargetStatus::OnTarget
            };
            GoalProgress {
                nutrient: (*nutrient).to_owned(),
                current,
                target: *target,
                percentage,
                status,
            }
        })
        .collect()
}
