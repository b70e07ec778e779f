// ABOUTME: Natural-language quantity and food-name extraction from user messages
// ABOUTME: Converts "2 cups", "two eggs", or "150g" into canonical grams via ordered pattern rules
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Platewise Contributors

//! Quantity parsing runs one ordered rule list (see [`FirstMatch`]):
//!
//! 1. numerals with a mass or volume unit (cups, tablespoons, teaspoons,
//!    ounces, pounds, grams), converted to grams with fixed factors
//! 2. numerals with a piece word, then bare numerals, read as item counts;
//!    a numeral followed by `%` ("2% milk") is part of the food, not a count
//! 3. spelled-out small numbers ("one" .. "twelve"), read as item counts
//!
//! Item counts become grams through a per-food item mass. With no match the
//! result is one standard serving: 100 g, or one item for foods whose
//! reference amount is a single item.

use platewise_core::constants::{reference_amounts, unit_conversions};
use platewise_core::errors::AppResult;
use regex::Captures;
use serde::{Deserialize, Serialize};

use crate::extract::FirstMatch;

/// Foods whose reference amount is one item rather than 100 g
const UNIT_WEIGHTED_FOODS: &[&str] = &["egg"];

/// Foods with a medium-fruit item mass
const MEDIUM_FRUITS: &[&str] = &["banana", "apple", "orange"];

/// Spelled numbers recognized as counts
const SPELLED_NUMBERS: &[(&str, f64)] = &[
    ("one", 1.0),
    ("two", 2.0),
    ("three", 3.0),
    ("four", 4.0),
    ("five", 5.0),
    ("six", 6.0),
    ("seven", 7.0),
    ("eight", 8.0),
    ("nine", 9.0),
    ("ten", 10.0),
    ("eleven", 11.0),
    ("twelve", 12.0),
];

/// How a quantity was determined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuantityKind {
    /// Numeral with a mass or volume unit
    Measured,
    /// Item count from a numeral or spelled number
    Counted,
    /// Nothing detected; one standard serving
    Default,
}

/// Result of quantity extraction, always expressed in grams
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParsedQuantity {
    /// Quantity in grams
    pub grams: f64,
    /// Item count when the quantity was counted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<f64>,
    /// How the quantity was determined
    pub kind: QuantityKind,
}

impl ParsedQuantity {
    /// Canonical unit label
    #[must_use]
    pub const fn unit(&self) -> &'static str {
        unit_conversions::CANONICAL_UNIT
    }
}

/// Raw amount before applying a food's item mass
#[derive(Debug, Clone, Copy, PartialEq)]
enum Amount {
    Grams(f64),
    Count(f64),
}

/// Mass of one item of `food` in grams
#[must_use]
pub fn item_mass(food: &str) -> f64 {
    if UNIT_WEIGHTED_FOODS.contains(&food) {
        reference_amounts::EGG_GRAMS
    } else if MEDIUM_FRUITS.contains(&food) {
        reference_amounts::MEDIUM_FRUIT_GRAMS
    } else {
        reference_amounts::DEFAULT_PIECE_GRAMS
    }
}

/// Whether `food` is referenced per item rather than per 100 g
#[must_use]
pub fn is_unit_weighted(food: &str) -> bool {
    UNIT_WEIGHTED_FOODS.contains(&food)
}

fn numeral(captures: &Captures<'_>) -> Option<f64> {
    captures
        .get(1)
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .filter(|n| *n > 0.0)
}

fn measured(factor: f64) -> impl Fn(&Captures<'_>) -> Option<Amount> + Send + Sync + 'static {
    move |captures| numeral(captures).map(|n| Amount::Grams(n * factor))
}

/// Extracts a quantity in grams from free text
#[derive(Debug)]
pub struct QuantityParser {
    rules: FirstMatch<Amount>,
}

impl QuantityParser {
    /// Build the ordered rule list
    ///
    /// # Errors
    ///
    /// Returns an error if a built-in pattern fails to compile.
    pub fn new() -> AppResult<Self> {
        const NUM: &str = r"(\d+(?:\.\d+)?)\s*";
        let mut rules = FirstMatch::new()
            .rule(
                &format!(r"{NUM}cups?\b"),
                measured(unit_conversions::GRAMS_PER_CUP),
            )?
            .rule(
                &format!(r"{NUM}(?:tablespoons?|tbsps?)\b"),
                measured(unit_conversions::GRAMS_PER_TABLESPOON),
            )?
            .rule(
                &format!(r"{NUM}(?:teaspoons?|tsps?)\b"),
                measured(unit_conversions::GRAMS_PER_TEASPOON),
            )?
            .rule(
                &format!(r"{NUM}(?:ounces?|oz)\b"),
                measured(unit_conversions::GRAMS_PER_OUNCE),
            )?
            .rule(
                &format!(r"{NUM}(?:pounds?|lbs?)\b"),
                measured(unit_conversions::GRAMS_PER_POUND),
            )?
            .rule(&format!(r"{NUM}(?:grams?|g)\b"), measured(1.0))?
            .rule(&format!(r"{NUM}(?:pieces?|items?|units?|servings?)\b"), |c| {
                numeral(c).map(Amount::Count)
            })?
            .rule(r"(\d+(?:\.\d+)?)(?:\s*[^\s\d.%]|\s*$)", |c| {
                numeral(c).map(Amount::Count)
            })?;

        for (word, value) in SPELLED_NUMBERS {
            let value = *value;
            rules = rules.rule(&format!(r"\b{word}\b"), move |_| Some(Amount::Count(value)))?;
        }

        Ok(Self { rules })
    }

    /// Parse `text` for a quantity of `food`
    #[must_use]
    pub fn parse(&self, text: &str, food: &str) -> ParsedQuantity {
        let lower = text.to_lowercase();
        match self.rules.first(&lower) {
            Some(Amount::Grams(grams)) => ParsedQuantity {
                grams,
                count: None,
                kind: QuantityKind::Measured,
            },
            Some(Amount::Count(count)) => ParsedQuantity {
                grams: count * item_mass(food),
                count: Some(count),
                kind: QuantityKind::Counted,
            },
            None if is_unit_weighted(food) => ParsedQuantity {
                grams: item_mass(food),
                count: Some(1.0),
                kind: QuantityKind::Default,
            },
            None => ParsedQuantity {
                grams: reference_amounts::PER_100_GRAMS,
                count: None,
                kind: QuantityKind::Default,
            },
        }
    }
}

/// Ordered food patterns and their canonical names
const FOOD_PATTERNS: &[(&str, &str)] = &[
    (r"\bbananas?\b", "banana"),
    (r"\bapples?\b", "apple"),
    (r"\bchicken\b", "chicken"),
    (r"\brice\b", "rice"),
    (r"\bbread\b", "bread"),
    (r"\beggs?\b", "egg"),
    (r"\bmilk\b", "milk"),
    (r"\bcheese\b", "cheese"),
    (r"\bsalmon\b", "salmon"),
    (r"\bspinach\b", "spinach"),
    (r"\bbeef\b", "beef"),
    (r"\bpork\b", "pork"),
    (r"\bturkey\b", "turkey"),
    (r"\btuna\b", "tuna"),
    (r"\bbroccoli\b", "broccoli"),
    (r"\bcarrots?\b", "carrot"),
    (r"\bpotato(?:es)?\b", "potato"),
    (r"\btomato(?:es)?\b", "tomato"),
    (r"\boranges?\b", "orange"),
    (r"\bstrawberr(?:y|ies)\b", "strawberry"),
    (r"\bblueberr(?:y|ies)\b", "blueberry"),
    (r"\byogh?urt\b", "yogurt"),
    (r"\boats?\b", "oats"),
    (r"\bquinoa\b", "quinoa"),
    (r"\bpasta\b", "pasta"),
    (r"\bnuts?\b", "nuts"),
    (r"\balmonds?\b", "almond"),
    (r"\bavocados?\b", "avocado"),
];

/// Words never taken as a food name by the fallback
const STOP_WORDS: &[&str] = &[
    "the", "a", "an", "in", "of", "and", "for", "with", "about", "analyze", "analyse",
    "nutrition", "nutritional", "calculate", "calories", "nutrients", "breakdown", "how",
    "many", "much", "what", "whats", "does", "are", "is", "contain", "contains", "tell",
    "please", "some", "info", "information", "one", "two", "three", "four", "five", "six",
    "cup", "cups", "grams", "gram", "ounces", "ounce", "pounds", "pound", "pieces", "piece",
    "tablespoons", "tablespoon", "teaspoons", "teaspoon", "serving", "servings", "value",
    "values", "content", "facts", "search", "lookup", "find", "food", "my", "today", "daily",
    "track", "tracking", "log", "logged", "progress", "goal", "goals", "summary", "insight",
    "insights", "recipe", "recipes", "meal", "meals", "healthy", "weekly", "show", "give",
    "need", "want", "intake", "plan",
];

/// How a food name was found in the text
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NameMatch {
    /// One of the known food patterns matched
    #[default]
    Pattern,
    /// First meaningful word, taken when no pattern matched
    Word,
}

/// Extracts a canonical food name from free text
#[derive(Debug)]
pub struct FoodNameExtractor {
    rules: FirstMatch<&'static str>,
}

impl FoodNameExtractor {
    /// Build the ordered food pattern list
    ///
    /// # Errors
    ///
    /// Returns an error if a built-in pattern fails to compile.
    pub fn new() -> AppResult<Self> {
        let mut rules = FirstMatch::new();
        for (pattern, name) in FOOD_PATTERNS {
            let name: &'static str = name;
            rules = rules.rule(pattern, move |_| Some(name))?;
        }
        Ok(Self { rules })
    }

    /// Extract a food name, falling back to the first meaningful word
    #[must_use]
    pub fn extract(&self, text: &str) -> Option<String> {
        self.extract_with_match(text).map(|(name, _)| name)
    }

    /// Extract a food name along with how it was found
    #[must_use]
    pub fn extract_with_match(&self, text: &str) -> Option<(String, NameMatch)> {
        let lower = text.to_lowercase();
        if let Some(name) = self.rules.first(&lower) {
            return Some((name.to_owned(), NameMatch::Pattern));
        }
        lower
            .split_whitespace()
            .map(|word| word.trim_matches(|c: char| !c.is_alphanumeric()))
            .find(|word| {
                word.len() > 2
                    && !word.chars().any(|c| c.is_ascii_digit())
                    && !STOP_WORDS.contains(word)
            })
            .map(|word| (word.to_owned(), NameMatch::Word))
    }
}
