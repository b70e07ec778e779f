// ABOUTME: Food lookup contract, reference-amount scaling, and the built-in food table
// ABOUTME: Every provider returns FoodRecord values normalized to one nutrient schema
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Platewise Contributors

use std::collections::HashMap;

use async_trait::async_trait;
use platewise_core::constants::{reference_amounts, unit_conversions};
use platewise_core::errors::AppResult;
use platewise_core::models::{DataSource, FoodRecord, NutrientProfile};
use serde::{Deserialize, Serialize};

use crate::quantity::{FoodNameExtractor, NameMatch, ParsedQuantity, QuantityKind, QuantityParser};

/// A food lookup request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodQuery {
    /// Canonical food name
    pub food_name: String,
    /// Requested quantity in grams
    pub quantity: f64,
    /// Item count when the quantity was given as a count
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<f64>,
    /// How the food name was found
    #[serde(default)]
    pub name_match: NameMatch,
    /// How the quantity was found
    #[serde(default = "stated_quantity")]
    pub quantity_kind: QuantityKind,
}

const fn stated_quantity() -> QuantityKind {
    QuantityKind::Measured
}

impl FoodQuery {
    /// Query for `quantity` grams of `food_name`
    pub fn new(food_name: impl Into<String>, quantity: f64) -> Self {
        Self {
            food_name: food_name.into(),
            quantity,
            count: None,
            name_match: NameMatch::Pattern,
            quantity_kind: stated_quantity(),
        }
    }

    /// Whether the text named neither a known food nor a quantity
    ///
    /// Such a query is usually a question that merely contains a word,
    /// as in "how many calories should I eat".
    #[must_use]
    pub fn is_guess(&self) -> bool {
        self.name_match == NameMatch::Word && self.quantity_kind == QuantityKind::Default
    }

    /// Build a query from free text, or `None` if no food is mentioned
    #[must_use]
    pub fn from_text(
        text: &str,
        foods: &FoodNameExtractor,
        quantities: &QuantityParser,
    ) -> Option<Self> {
        let (food_name, name_match) = foods.extract_with_match(text)?;
        let ParsedQuantity { grams, count, kind } = quantities.parse(text, &food_name);
        Some(Self {
            food_name,
            quantity: grams,
            count,
            name_match,
            quantity_kind: kind,
        })
    }
}

/// Nutrient values for a fixed reference amount of one food
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodReference {
    /// Canonical food name
    pub name: String,
    /// Grams the values are expressed per
    pub reference_amount: f64,
    /// Values for `reference_amount`
    pub nutrients: NutrientProfile,
}

impl FoodReference {
    /// Reference values per 100 g
    pub fn per_100g(name: impl Into<String>, nutrients: NutrientProfile) -> Self {
        Self {
            name: name.into(),
            reference_amount: reference_amounts::PER_100_GRAMS,
            nutrients,
        }
    }

    /// Reference values per single item of `item_grams`
    pub fn per_item(name: impl Into<String>, item_grams: f64, nutrients: NutrientProfile) -> Self {
        Self {
            name: name.into(),
            reference_amount: item_grams,
            nutrients,
        }
    }

    /// Scale the reference values linearly to `quantity` grams
    #[must_use]
    pub fn scale_to(&self, quantity: f64, source: DataSource, fdc_id: Option<u64>) -> FoodRecord {
        let scale_factor = if self.reference_amount > 0.0 {
            quantity / self.reference_amount
        } else {
            0.0
        };
        FoodRecord {
            food_name: self.name.clone(),
            quantity,
            unit: unit_conversions::CANONICAL_UNIT.to_owned(),
            reference_amount: self.reference_amount,
            scale_factor,
            fdc_id,
            source,
            nutrients: self.nutrients.scaled(scale_factor).rounded(1),
        }
    }
}

/// Source of food composition data
#[async_trait]
pub trait FoodDataProvider: Send + Sync {
    /// Provider name used in logs
    fn name(&self) -> &'static str;

    /// Look up a food and scale it to the requested quantity
    ///
    /// Returns `Ok(None)` when the food is unknown or the remote source fails.
    ///
    /// # Errors
    ///
    /// Returns an error only for invalid queries.
    async fn lookup(&self, query: &FoodQuery) -> AppResult<Option<FoodRecord>>;
}

/// Built-in reference values for common foods
#[derive(Debug, Clone)]
pub struct StaticFoodTable {
    entries: HashMap<String, FoodReference>,
}

impl StaticFoodTable {
    /// Table with the built-in entries
    #[must_use]
    pub fn builtin() -> Self {
        let entries = [
            FoodReference::per_item(
                "egg",
                reference_amounts::EGG_GRAMS,
                NutrientProfile::new(70.0, 6.0, 0.6, 5.0, 0.0, 0.6, 65.0),
            ),
            FoodReference::per_100g(
                "banana",
                NutrientProfile::new(89.0, 1.1, 23.0, 0.3, 2.6, 12.0, 1.0),
            ),
            FoodReference::per_100g(
                "apple",
                NutrientProfile::new(52.0, 0.3, 14.0, 0.2, 2.4, 10.0, 1.0),
            ),
            FoodReference::per_100g(
                "chicken",
                NutrientProfile::new(165.0, 31.0, 0.0, 3.6, 0.0, 0.0, 74.0),
            ),
            FoodReference::per_100g(
                "rice",
                NutrientProfile::new(130.0, 2.7, 28.0, 0.3, 0.4, 0.1, 1.0),
            ),
            FoodReference::per_100g(
                "bread",
                NutrientProfile::new(265.0, 9.0, 49.0, 3.2, 2.7, 5.0, 491.0),
            ),
            FoodReference::per_100g(
                "milk",
                NutrientProfile::new(42.0, 3.4, 5.0, 1.0, 0.0, 5.0, 44.0),
            ),
        ];
        Self {
            entries: entries.into_iter().map(|r| (r.name.clone(), r)).collect(),
        }
    }

    /// Add or replace an entry
    pub fn insert(&mut self, reference: FoodReference) {
        self.entries.insert(reference.name.clone(), reference);
    }

    /// Reference values for `name`
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FoodReference> {
        self.entries.get(&name.to_lowercase())
    }

    /// Number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for StaticFoodTable {
    fn default() -> Self {
        Self::builtin()
    }
}

#[async_trait]
impl FoodDataProvider for StaticFoodTable {
    fn name(&self) -> &'static str {
        "static_table"
    }

    async fn lookup(&self, query: &FoodQuery) -> AppResult<Option<FoodRecord>> {
        Ok(self
            .get(&query.food_name)
            .map(|reference| reference.scale_to(query.quantity, DataSource::Database, None)))
    }
}
