// ABOUTME: Nutrition models for food composition records and logged meals
// ABOUTME: NutrientProfile, FoodRecord, DataSource, MealType, and MealLogEntry definitions
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Platewise Contributors

use std::ops::AddAssign;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Fixed nutrient schema every data source is normalized into
///
/// Energy in kcal, sodium in mg, everything else in grams.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NutrientProfile {
    /// Energy (kcal)
    #[serde(default)]
    pub calories: f64,
    /// Protein (g)
    #[serde(default)]
    pub protein: f64,
    /// Carbohydrates (g)
    #[serde(default)]
    pub carbs: f64,
    /// Fat (g)
    #[serde(default)]
    pub fat: f64,
    /// Dietary fiber (g)
    #[serde(default)]
    pub fiber: f64,
    /// Total sugars (g)
    #[serde(default)]
    pub sugar: f64,
    /// Sodium (mg)
    #[serde(default)]
    pub sodium: f64,
}

impl NutrientProfile {
    /// Build a profile from values in schema order
    #[must_use]
    pub const fn new(
        calories: f64,
        protein: f64,
        carbs: f64,
        fat: f64,
        fiber: f64,
        sugar: f64,
        sodium: f64,
    ) -> Self {
        Self {
            calories,
            protein,
            carbs,
            fat,
            fiber,
            sugar,
            sodium,
        }
    }

    /// Multiply every field by `factor`
    #[must_use]
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            calories: self.calories * factor,
            protein: self.protein * factor,
            carbs: self.carbs * factor,
            fat: self.fat * factor,
            fiber: self.fiber * factor,
            sugar: self.sugar * factor,
            sodium: self.sodium * factor,
        }
    }

    /// Round every field to `decimals` places
    #[must_use]
    pub fn rounded(&self, decimals: i32) -> Self {
        let unit = 10_f64.powi(decimals);
        let round = |value: f64| (value * unit).round() / unit;
        Self {
            calories: round(self.calories),
            protein: round(self.protein),
            carbs: round(self.carbs),
            fat: round(self.fat),
            fiber: round(self.fiber),
            sugar: round(self.sugar),
            sodium: round(self.sodium),
        }
    }

    /// Sum a sequence of profiles
    pub fn total<'a>(profiles: impl IntoIterator<Item = &'a Self>) -> Self {
        profiles.into_iter().fold(Self::default(), |mut acc, p| {
            acc += *p;
            acc
        })
    }

    /// Fields as `(name, value)` pairs in schema order
    #[must_use]
    pub const fn fields(&self) -> [(&'static str, f64); 7] {
        [
            ("calories", self.calories),
            ("protein", self.protein),
            ("carbs", self.carbs),
            ("fat", self.fat),
            ("fiber", self.fiber),
            ("sugar", self.sugar),
            ("sodium", self.sodium),
        ]
    }
}

impl AddAssign for NutrientProfile {
    fn add_assign(&mut self, rhs: Self) {
        self.calories += rhs.calories;
        self.protein += rhs.protein;
        self.carbs += rhs.carbs;
        self.fat += rhs.fat;
        self.fiber += rhs.fiber;
        self.sugar += rhs.sugar;
        self.sodium += rhs.sodium;
    }
}

/// Where a food record's values came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    /// USDA `FoodData` Central search result
    Usda,
    /// Built-in reference table
    Database,
    /// Values estimated by the text-generation backend
    AiEstimation,
    /// Fixed fallback values
    Default,
}

impl DataSource {
    /// Label used in prose responses
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Usda => "USDA FoodData Central",
            Self::Database => "built-in food table",
            Self::AiEstimation => "AI estimate",
            Self::Default => "typical default values",
        }
    }
}

/// A food's nutrients scaled to a requested quantity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodRecord {
    /// Display name of the food
    pub food_name: String,
    /// Requested quantity, in canonical units
    pub quantity: f64,
    /// Canonical unit of `quantity`
    pub unit: String,
    /// Amount the source values are expressed per
    pub reference_amount: f64,
    /// `quantity / reference_amount`
    pub scale_factor: f64,
    /// USDA identifier, when the record came from USDA
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fdc_id: Option<u64>,
    /// Origin of the values
    pub source: DataSource,
    /// Scaled nutrient values
    #[serde(flatten)]
    pub nutrients: NutrientProfile,
}

/// Type of meal
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum MealType {
    /// Breakfast meal
    Breakfast,
    /// Lunch meal
    Lunch,
    /// Dinner meal
    Dinner,
    /// Snack or unspecified
    #[default]
    Snack,
}

impl MealType {
    /// Parse meal type from string, defaulting to snack
    #[must_use]
    pub fn from_str_lossy(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "breakfast" => Self::Breakfast,
            "lunch" => Self::Lunch,
            "dinner" => Self::Dinner,
            _ => Self::Snack,
        }
    }

    /// Lowercase name
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Breakfast => "breakfast",
            Self::Lunch => "lunch",
            Self::Dinner => "dinner",
            Self::Snack => "snack",
        }
    }
}

/// One food a user ate, as stored by the meal log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealLogEntry {
    /// Entry identifier
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    /// Owner of the entry
    pub user_id: String,
    /// When the food was eaten
    pub logged_at: DateTime<Utc>,
    /// Food name
    pub food_name: String,
    /// Meal slot
    #[serde(default)]
    pub meal_type: MealType,
    /// Quantity in grams
    #[serde(default)]
    pub quantity_g: f64,
    /// Nutrients for the logged quantity
    #[serde(flatten)]
    pub nutrients: NutrientProfile,
}

impl MealLogEntry {
    /// Create an entry from a scaled food record
    #[must_use]
    pub fn from_record(
        user_id: impl Into<String>,
        record: &FoodRecord,
        meal_type: MealType,
        logged_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.into(),
            logged_at,
            food_name: record.food_name.clone(),
            meal_type,
            quantity_g: record.quantity,
            nutrients: record.nutrients,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scaled_is_linear() {
        let banana = NutrientProfile::new(89.0, 1.1, 23.0, 0.3, 2.6, 12.0, 1.0);
        let double = banana.scaled(2.0);
        assert!((double.calories - 178.0).abs() < f64::EPSILON);
        assert!((double.carbs - 46.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_total_sums_fields() {
        let a = NutrientProfile::new(100.0, 5.0, 10.0, 2.0, 1.0, 3.0, 40.0);
        let b = NutrientProfile::new(50.0, 1.0, 5.0, 1.0, 0.0, 1.0, 10.0);
        let total = NutrientProfile::total([&a, &b]);
        assert!((total.calories - 150.0).abs() < f64::EPSILON);
        assert!((total.sodium - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_food_record_serializes_flat_fat_field() {
        let record = FoodRecord {
            food_name: "egg".to_owned(),
            quantity: 100.0,
            unit: "g".to_owned(),
            reference_amount: 50.0,
            scale_factor: 2.0,
            fdc_id: None,
            source: DataSource::Database,
            nutrients: NutrientProfile::new(140.0, 12.0, 1.2, 10.0, 0.0, 1.2, 130.0),
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["fat"], 10.0);
        assert_eq!(json["source"], "database");
        assert!(json.get("fats").is_none());
    }

    #[test]
    fn test_meal_type_lossy_parse() {
        assert_eq!(MealType::from_str_lossy("Dinner"), MealType::Dinner);
        assert_eq!(MealType::from_str_lossy("brunch"), MealType::Snack);
    }
}
